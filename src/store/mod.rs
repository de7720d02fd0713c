//! Task Store collaborator.
//!
//! The engine loads one project snapshot per operation and writes mutations back as
//! a single [`ChangeSet`]. Every snapshot carries the project's version; a commit
//! against a stale version is refused, so two concurrent mutations of the same
//! project never interleave.

pub mod file;
pub mod memory;


pub use file::*;
pub use memory::*;

use crate::wbs::types::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Store failures, surfaced to callers unchanged
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("project {project_id} changed concurrently (expected version {expected}, found {actual})")]
    VersionConflict {
        project_id: ProjectId,
        expected: u64,
        actual: u64,
    },

    #[error("project {0} is not registered")]
    UnknownProject(ProjectId),

    /// Task ids are unique across projects
    #[error("task {task_id} already exists in project {project_id}")]
    DuplicateTask {
        task_id: TaskId,
        project_id: ProjectId,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Immutable view of one project's tasks, edges and evidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub project_id: ProjectId,
    pub version: u64,
    pub tasks: Vec<WbsTask>,
    pub edges: Vec<DependencyEdge>,
    pub evidence: Vec<Evidence>,
}

impl ProjectSnapshot {
    pub fn task(&self, task_id: &str) -> Option<&WbsTask> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn children_of(&self, task_id: &str) -> impl Iterator<Item = &WbsTask> {
        self.tasks
            .iter()
            .filter(move |task| task.parent_id.as_deref() == Some(task_id))
    }

    pub fn has_children(&self, task_id: &str) -> bool {
        self.children_of(task_id).next().is_some()
    }

    pub fn evidence_for(&self, task_id: &str) -> impl Iterator<Item = &Evidence> {
        self.evidence
            .iter()
            .filter(move |evidence| evidence.task_id == task_id)
    }
}

/// A batch of mutations applied atomically by [`TaskStore::commit`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeSet {
    pub upsert_tasks: Vec<WbsTask>,
    pub delete_tasks: Vec<TaskId>,
    pub insert_edges: Vec<DependencyEdge>,
    pub delete_edges: Vec<Uuid>,
    pub insert_evidence: Vec<Evidence>,
    pub delete_evidence: Vec<Uuid>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.upsert_tasks.is_empty()
            && self.delete_tasks.is_empty()
            && self.insert_edges.is_empty()
            && self.delete_edges.is_empty()
            && self.insert_evidence.is_empty()
            && self.delete_evidence.is_empty()
    }
}

/// Persistence boundary consumed by the engine
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn has_project(&self, project_id: ProjectId) -> StoreResult<bool>;

    /// Load everything the engine needs for one project
    async fn load_project(&self, project_id: ProjectId) -> StoreResult<ProjectSnapshot>;

    /// Project owning `task_id`, if the task exists anywhere
    async fn locate_task(&self, task_id: &str) -> StoreResult<Option<ProjectId>>;

    /// Apply `changes` if the project is still at `expected_version`; returns the new version
    async fn commit(
        &self,
        project_id: ProjectId,
        expected_version: u64,
        changes: ChangeSet,
    ) -> StoreResult<u64>;
}

/// Per-project stored state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub version: u64,
    pub tasks: BTreeMap<TaskId, WbsTask>,
    pub edges: Vec<DependencyEdge>,
    pub evidence: Vec<Evidence>,
}

/// Whole-store state shared by the in-memory and file-backed stores
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreState {
    pub projects: BTreeMap<ProjectId, ProjectRecord>,
}

impl StoreState {
    /// Register a project; returns false if it already existed
    pub fn register_project(&mut self, project_id: ProjectId) -> bool {
        if self.projects.contains_key(&project_id) {
            return false;
        }
        self.projects.insert(project_id, ProjectRecord::default());
        true
    }

    pub fn snapshot(&self, project_id: ProjectId) -> StoreResult<ProjectSnapshot> {
        let record = self
            .projects
            .get(&project_id)
            .ok_or(StoreError::UnknownProject(project_id))?;
        Ok(ProjectSnapshot {
            project_id,
            version: record.version,
            tasks: record.tasks.values().cloned().collect(),
            edges: record.edges.clone(),
            evidence: record.evidence.clone(),
        })
    }

    pub fn locate_task(&self, task_id: &str) -> Option<ProjectId> {
        self.projects
            .iter()
            .find(|(_, record)| record.tasks.contains_key(task_id))
            .map(|(project_id, _)| *project_id)
    }

    pub fn commit(
        &mut self,
        project_id: ProjectId,
        expected_version: u64,
        changes: ChangeSet,
    ) -> StoreResult<u64> {
        let current_version = self
            .projects
            .get(&project_id)
            .ok_or(StoreError::UnknownProject(project_id))?
            .version;

        if current_version != expected_version {
            return Err(StoreError::VersionConflict {
                project_id,
                expected: expected_version,
                actual: current_version,
            });
        }
        if changes.is_empty() {
            return Ok(current_version);
        }

        for task in &changes.upsert_tasks {
            if let Some(owner) = self.locate_task(&task.id)
                && owner != project_id
            {
                return Err(StoreError::DuplicateTask {
                    task_id: task.id.clone(),
                    project_id: owner,
                });
            }
        }

        let record = self
            .projects
            .get_mut(&project_id)
            .ok_or(StoreError::UnknownProject(project_id))?;

        for task_id in &changes.delete_tasks {
            record.tasks.remove(task_id);
        }
        record
            .edges
            .retain(|edge| !changes.delete_edges.contains(&edge.id));
        record
            .evidence
            .retain(|evidence| !changes.delete_evidence.contains(&evidence.id));

        for task in changes.upsert_tasks {
            record.tasks.insert(task.id.clone(), task);
        }
        record.edges.extend(changes.insert_edges);
        record.evidence.extend(changes.insert_evidence);

        record.version += 1;
        Ok(record.version)
    }
}
