use crate::wbs::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A task with its ordered children, as rendered in the hierarchy view.
///
/// Building, walking and dropping a node are iterative, so parent chains of any depth
/// are safe there. The derived `Clone`, `Debug` and serde impls still recurse once per
/// level.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HierarchyNode {
    pub task: WbsTask,
    /// Depth from the root of its tree (roots are level 0)
    pub level: u32,
    pub children: Vec<HierarchyNode>,
}

/// Anomalies found while reconstructing the forest
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum HierarchyDiagnostic {
    /// `parent_id` names a task that is not in the snapshot; the task became a root
    OrphanedTask {
        task_id: TaskId,
        missing_parent_id: TaskId,
    },
    /// The task is only reachable through a parent cycle; it was promoted to a root
    ParentCycle { task_id: TaskId },
}

/// Rooted forest built from a flat task collection
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TaskHierarchy {
    pub roots: Vec<HierarchyNode>,
    pub diagnostics: Vec<HierarchyDiagnostic>,
}

impl TaskHierarchy {
    /// Build the forest from all tasks of a project.
    ///
    /// Tasks are grouped by parent once; children are attached from that index in
    /// ascending id order. Every input task appears exactly once in the output.
    pub fn build(tasks: &[WbsTask]) -> Self {
        let mut arena: Vec<&WbsTask> = tasks.iter().collect();
        arena.sort_by(|a, b| a.id.cmp(&b.id));

        let known: HashMap<&str, usize> = arena
            .iter()
            .enumerate()
            .map(|(idx, task)| (task.id.as_str(), idx))
            .collect();

        let mut children_of: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut root_indices = Vec::new();
        let mut diagnostics = Vec::new();

        for (idx, task) in arena.iter().enumerate() {
            match task.parent_id.as_deref() {
                None => root_indices.push(idx),
                Some(parent_id) if known.contains_key(parent_id) => {
                    children_of.entry(parent_id).or_default().push(idx);
                }
                Some(parent_id) => {
                    warn!(
                        "Task {} references missing parent {}; treating it as a root",
                        task.id, parent_id
                    );
                    diagnostics.push(HierarchyDiagnostic::OrphanedTask {
                        task_id: task.id.clone(),
                        missing_parent_id: parent_id.to_string(),
                    });
                    root_indices.push(idx);
                }
            }
        }

        let mut visited = vec![false; arena.len()];
        let mut roots = Vec::with_capacity(root_indices.len());
        for idx in root_indices {
            roots.push(build_tree(idx, &arena, &children_of, &mut visited));
        }

        // Whatever is left hangs off a parent cycle and was never reached from a root.
        for idx in 0..arena.len() {
            if visited[idx] {
                continue;
            }
            warn!(
                "Task {} is part of a parent cycle; promoting it to a root",
                arena[idx].id
            );
            diagnostics.push(HierarchyDiagnostic::ParentCycle {
                task_id: arena[idx].id.clone(),
            });
            roots.push(build_tree(idx, &arena, &children_of, &mut visited));
        }

        debug!(
            "Built hierarchy with {} roots from {} tasks",
            roots.len(),
            arena.len()
        );

        Self { roots, diagnostics }
    }

    /// Total number of nodes in the forest
    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    /// Task ids in depth-first pre-order
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.nodes().map(|node| node.task.id.clone()).collect()
    }

    /// Find a node anywhere in the forest
    pub fn find(&self, task_id: &str) -> Option<&HierarchyNode> {
        self.nodes().find(|node| node.task.id == task_id)
    }

    /// Every node of the forest in depth-first pre-order
    pub fn nodes(&self) -> impl Iterator<Item = &HierarchyNode> {
        self.roots.iter().flat_map(|root| root.preorder())
    }
}

impl HierarchyNode {
    pub fn subtree_size(&self) -> usize {
        self.preorder().count()
    }

    /// This node and its descendants in depth-first pre-order, children by ascending id
    pub fn preorder(&self) -> impl Iterator<Item = &HierarchyNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

// Deep parent chains must not unwind one stack frame per level.
impl Drop for HierarchyNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Builds the tree rooted at `root` without recursion.
///
/// A pre-order walk fixes levels and child lists, then nodes are assembled in reverse
/// so every child exists before its parent.
fn build_tree(
    root: usize,
    arena: &[&WbsTask],
    children_of: &HashMap<&str, Vec<usize>>,
    visited: &mut [bool],
) -> HierarchyNode {
    let mut order: Vec<(usize, u32)> = Vec::new();
    let mut child_lists: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut stack = vec![(root, 0u32)];
    visited[root] = true;

    while let Some((idx, level)) = stack.pop() {
        order.push((idx, level));
        let children: Vec<usize> = children_of
            .get(arena[idx].id.as_str())
            .into_iter()
            .flatten()
            .copied()
            .filter(|&child| !visited[child])
            .collect();
        for &child in children.iter().rev() {
            visited[child] = true;
            stack.push((child, level + 1));
        }
        child_lists.insert(idx, children);
    }

    let mut built: HashMap<usize, HierarchyNode> = HashMap::with_capacity(order.len());
    for &(idx, level) in order.iter().skip(1).rev() {
        let node = assemble(idx, level, arena, &mut child_lists, &mut built);
        built.insert(idx, node);
    }
    assemble(root, 0, arena, &mut child_lists, &mut built)
}

fn assemble(
    idx: usize,
    level: u32,
    arena: &[&WbsTask],
    child_lists: &mut HashMap<usize, Vec<usize>>,
    built: &mut HashMap<usize, HierarchyNode>,
) -> HierarchyNode {
    let children = child_lists
        .remove(&idx)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|child| built.remove(&child))
        .collect();

    HierarchyNode {
        task: arena[idx].clone(),
        level,
        children,
    }
}
