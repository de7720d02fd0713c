use crate::wbs::error::{WbsError, WbsResult};
use crate::wbs::types::*;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Directed dependency graph over task ids.
///
/// `prerequisites` is keyed by dependent id, `dependents` by prerequisite id.
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    prerequisites: HashMap<TaskId, Vec<TaskId>>,
    dependents: HashMap<TaskId, Vec<TaskId>>,
    edge_count: usize,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the adjacency index from a project's edges
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a DependencyEdge>) -> Self {
        let mut graph = Self::new();
        for edge in edges {
            graph.insert(&edge.dependent_id, &edge.prerequisite_id);
        }
        graph
    }

    fn insert(&mut self, dependent_id: &str, prerequisite_id: &str) {
        self.prerequisites
            .entry(dependent_id.to_string())
            .or_default()
            .push(prerequisite_id.to_string());
        self.dependents
            .entry(prerequisite_id.to_string())
            .or_default()
            .push(dependent_id.to_string());
        self.edge_count += 1;
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Direct prerequisites of a task
    pub fn prerequisites_of(&self, task_id: &str) -> &[TaskId] {
        self.prerequisites
            .get(task_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Tasks that directly depend on `task_id`
    pub fn dependents_of(&self, task_id: &str) -> &[TaskId] {
        self.dependents
            .get(task_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains_edge(&self, dependent_id: &str, prerequisite_id: &str) -> bool {
        self.prerequisites_of(dependent_id)
            .iter()
            .any(|id| id == prerequisite_id)
    }

    /// True iff every prerequisite of `task_id` is Completed.
    ///
    /// A prerequisite missing from `statuses` counts as unmet.
    pub fn can_start(&self, task_id: &str, statuses: &HashMap<&str, WbsTaskStatus>) -> bool {
        self.prerequisites_of(task_id).iter().all(|prereq| {
            statuses.get(prereq.as_str()).copied() == Some(WbsTaskStatus::Completed)
        })
    }

    /// NotStarted tasks whose every prerequisite is Completed, in ascending id order.
    ///
    /// One pass over the task list plus one lookup per incoming edge.
    pub fn ready_to_start<'a>(&self, tasks: &'a [WbsTask]) -> Vec<&'a WbsTask> {
        let statuses = status_index(tasks);
        let mut ready: Vec<&WbsTask> = tasks
            .iter()
            .filter(|task| task.is_not_started() && self.can_start(&task.id, &statuses))
            .collect();
        ready.sort_by(|a, b| a.id.cmp(&b.id));
        ready
    }

    /// Whether adding "`dependent_id` depends on `prerequisite_id`" would close a cycle.
    ///
    /// That happens exactly when `prerequisite_id` already (transitively) depends on
    /// `dependent_id`, or when both ids are the same task.
    pub fn would_create_cycle(&self, dependent_id: &str, prerequisite_id: &str) -> bool {
        if dependent_id == prerequisite_id {
            return true;
        }

        let mut stack = vec![prerequisite_id];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == dependent_id {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            for next in self.prerequisites_of(current) {
                stack.push(next.as_str());
            }
        }
        false
    }

    /// Validate a prospective edge without modifying the graph
    pub fn validate_new_edge(&self, dependent_id: &str, prerequisite_id: &str) -> WbsResult<()> {
        if dependent_id == prerequisite_id {
            return Err(WbsError::validation(
                "prerequisite_id",
                format!("task {} cannot depend on itself", dependent_id),
            ));
        }
        if self.contains_edge(dependent_id, prerequisite_id) {
            return Err(WbsError::validation(
                "prerequisite_id",
                format!(
                    "task {} already depends on {}",
                    dependent_id, prerequisite_id
                ),
            ));
        }
        if self.would_create_cycle(dependent_id, prerequisite_id) {
            warn!(
                "Rejected dependency {} -> {}: would create a cycle",
                dependent_id, prerequisite_id
            );
            return Err(WbsError::validation(
                "prerequisite_id",
                format!(
                    "dependency {} -> {} would create a cycle",
                    dependent_id, prerequisite_id
                ),
            ));
        }
        Ok(())
    }

    /// Validate then insert an edge; on error the graph is left unchanged
    pub fn try_add_edge(&mut self, dependent_id: &str, prerequisite_id: &str) -> WbsResult<()> {
        self.validate_new_edge(dependent_id, prerequisite_id)?;
        self.insert(dependent_id, prerequisite_id);
        debug!("Added dependency {} -> {}", dependent_id, prerequisite_id);
        Ok(())
    }

    /// Find one dependency cycle, if any, as the list of ids along it
    pub fn find_cycle(&self) -> Option<Vec<TaskId>> {
        // Deterministic start order keeps reports stable across runs.
        let mut starts: Vec<&str> = self.prerequisites.keys().map(String::as_str).collect();
        starts.sort_unstable();

        let mut done = HashSet::new();
        for start in starts {
            let mut path = Vec::new();
            let mut on_path = HashSet::new();
            if let Some(cycle) = self.cycle_from(start, &mut path, &mut on_path, &mut done) {
                return Some(cycle);
            }
        }
        None
    }

    fn cycle_from<'a>(
        &'a self,
        task_id: &'a str,
        path: &mut Vec<&'a str>,
        on_path: &mut HashSet<&'a str>,
        done: &mut HashSet<&'a str>,
    ) -> Option<Vec<TaskId>> {
        if on_path.contains(task_id) {
            let begin = path.iter().position(|id| *id == task_id).unwrap_or(0);
            let mut cycle: Vec<TaskId> = path[begin..].iter().map(|id| id.to_string()).collect();
            cycle.push(task_id.to_string());
            return Some(cycle);
        }
        if done.contains(task_id) {
            return None;
        }

        path.push(task_id);
        on_path.insert(task_id);
        for prereq in self.prerequisites_of(task_id) {
            if let Some(cycle) = self.cycle_from(prereq, path, on_path, done) {
                return Some(cycle);
            }
        }
        on_path.remove(task_id);
        path.pop();
        done.insert(task_id);
        None
    }
}

/// Status lookup by task id for a snapshot
pub fn status_index(tasks: &[WbsTask]) -> HashMap<&str, WbsTaskStatus> {
    tasks
        .iter()
        .map(|task| (task.id.as_str(), task.status))
        .collect()
}
