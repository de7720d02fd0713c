use crate::store::{ChangeSet, ProjectSnapshot, StoreError, TaskStore};
use crate::wbs::critical_path::{self, CriticalPath};
use crate::wbs::dependency::{DependencyGraph, status_index};
use crate::wbs::error::{WbsError, WbsResult};
use crate::wbs::hierarchy::{HierarchyDiagnostic, TaskHierarchy};
use crate::wbs::progress::{self, ProjectProgress};
use crate::wbs::types::*;
use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Task lifecycle manager and query facade over a [`TaskStore`]
pub struct WbsManager {
    store: Arc<dyn TaskStore>,
    config: WbsManagerConfig,
    event_handlers: Vec<Box<dyn WbsEventHandler + Send + Sync>>,
}

/// Configuration for the manager
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WbsManagerConfig {
    /// Refuse moving a task to InProgress while a prerequisite is not Completed
    pub enforce_dependencies_on_start: bool,
    /// Critical path duration for tasks with neither planned dates nor an estimate
    pub default_task_duration_hours: u32,
    /// Rounding applied to progress percentages
    pub progress_decimal_places: u32,
}

/// Events emitted after a mutation has been committed
#[derive(Debug, Clone)]
pub enum WbsEvent {
    TaskCreated {
        task_id: TaskId,
        project_id: ProjectId,
        parent_id: Option<TaskId>,
    },
    TaskUpdated {
        task_id: TaskId,
    },
    TaskStatusChanged {
        task_id: TaskId,
        old_status: WbsTaskStatus,
        new_status: WbsTaskStatus,
    },
    TaskDeleted {
        task_id: TaskId,
        removed_edges: usize,
        removed_evidence: usize,
    },
    DependencyAdded {
        dependent_id: TaskId,
        prerequisite_id: TaskId,
    },
    DependencyRemoved {
        dependent_id: TaskId,
        prerequisite_id: TaskId,
    },
    EvidenceAdded {
        task_id: TaskId,
        evidence_id: uuid::Uuid,
    },
}

/// Handler for manager events
pub trait WbsEventHandler {
    fn handle_event(&self, event: &WbsEvent) -> Result<()>;
}

/// Outcome of a task deletion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeletedTask {
    pub task_id: TaskId,
    pub removed_edges: usize,
    pub removed_evidence: usize,
}

const MAX_ID_LEN: usize = 50;
const MAX_NAME_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 1000;
const MAX_AREA_LEN: usize = 100;
const MAX_CRITERIA_LEN: usize = 500;
const MAX_EVIDENCE_TYPE_LEN: usize = 50;
const MAX_LOCATION_LEN: usize = 500;
const MAX_EVIDENCE_DESCRIPTION_LEN: usize = 500;

impl WbsManager {
    pub fn new(store: Arc<dyn TaskStore>, config: WbsManagerConfig) -> Self {
        Self {
            store,
            config,
            event_handlers: Vec::new(),
        }
    }

    pub fn config(&self) -> &WbsManagerConfig {
        &self.config
    }

    /// Add event handler
    pub fn add_event_handler(&mut self, handler: Box<dyn WbsEventHandler + Send + Sync>) {
        self.event_handlers.push(handler);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Tasks of a project ordered by id, optionally filtered by area and status
    pub async fn list_tasks(
        &self,
        project_id: ProjectId,
        filter: &TaskFilter,
    ) -> WbsResult<Vec<WbsTask>> {
        let snapshot = self.load(project_id).await?;
        let mut tasks: Vec<WbsTask> = snapshot
            .tasks
            .into_iter()
            .filter(|task| filter.matches(task))
            .collect();
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(tasks)
    }

    /// One task with its edges, evidence and child ids
    pub async fn get_task(&self, task_id: &str) -> WbsResult<TaskDetails> {
        let snapshot = self.load_for_task(task_id).await?;
        let task = require_task(&snapshot, task_id)?.clone();

        let prerequisites = snapshot
            .edges
            .iter()
            .filter(|edge| edge.dependent_id == task_id)
            .cloned()
            .collect();
        let dependents = snapshot
            .edges
            .iter()
            .filter(|edge| edge.prerequisite_id == task_id)
            .cloned()
            .collect();
        let mut children: Vec<TaskId> = snapshot
            .children_of(task_id)
            .map(|child| child.id.clone())
            .collect();
        children.sort();

        Ok(TaskDetails {
            task,
            prerequisites,
            dependents,
            evidence: newest_first(snapshot.evidence_for(task_id).cloned().collect()),
            children,
        })
    }

    /// Direct children of a task, ordered by id
    pub async fn get_children(&self, task_id: &str) -> WbsResult<Vec<WbsTask>> {
        let snapshot = self.load_for_task(task_id).await?;
        require_task(&snapshot, task_id)?;
        let mut children: Vec<WbsTask> = snapshot.children_of(task_id).cloned().collect();
        children.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(children)
    }

    /// The project's task forest
    pub async fn get_hierarchy(&self, project_id: ProjectId) -> WbsResult<TaskHierarchy> {
        let snapshot = self.load(project_id).await?;
        Ok(TaskHierarchy::build(&snapshot.tasks))
    }

    /// Weighted completion of a project
    pub async fn project_progress(&self, project_id: ProjectId) -> WbsResult<ProjectProgress> {
        let snapshot = self.load(project_id).await?;
        Ok(progress::calculate_progress(
            project_id,
            &snapshot.tasks,
            self.config.progress_decimal_places,
        ))
    }

    /// Whether every prerequisite of the task is Completed
    pub async fn can_start(&self, task_id: &str) -> WbsResult<bool> {
        let snapshot = self.load_for_task(task_id).await?;
        require_task(&snapshot, task_id)?;
        let graph = DependencyGraph::from_edges(&snapshot.edges);
        Ok(graph.can_start(task_id, &status_index(&snapshot.tasks)))
    }

    /// NotStarted tasks whose prerequisites are all Completed
    pub async fn ready_to_start(&self, project_id: ProjectId) -> WbsResult<Vec<WbsTask>> {
        let snapshot = self.load(project_id).await?;
        let graph = DependencyGraph::from_edges(&snapshot.edges);
        Ok(graph
            .ready_to_start(&snapshot.tasks)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Longest dependency chain and per-task slack
    pub async fn critical_path(&self, project_id: ProjectId) -> WbsResult<CriticalPath> {
        let snapshot = self.load(project_id).await?;
        let graph = DependencyGraph::from_edges(&snapshot.edges);
        critical_path::analyze(
            &snapshot.tasks,
            &graph,
            self.config.default_task_duration_hours,
        )
    }

    /// Evidence attached to a task, newest first
    pub async fn list_evidence(&self, task_id: &str) -> WbsResult<Vec<Evidence>> {
        let snapshot = self.load_for_task(task_id).await?;
        require_task(&snapshot, task_id)?;
        Ok(newest_first(
            snapshot.evidence_for(task_id).cloned().collect(),
        ))
    }

    /// Report structural problems in stored data
    pub async fn validate_integrity(&self, project_id: ProjectId) -> WbsResult<Vec<String>> {
        let snapshot = self.load(project_id).await?;
        let mut issues = Vec::new();

        for diagnostic in TaskHierarchy::build(&snapshot.tasks).diagnostics {
            match diagnostic {
                HierarchyDiagnostic::OrphanedTask {
                    task_id,
                    missing_parent_id,
                } => issues.push(format!(
                    "Task {} has non-existent parent {}",
                    task_id, missing_parent_id
                )),
                HierarchyDiagnostic::ParentCycle { task_id } => {
                    issues.push(format!("Task {} is part of a parent cycle", task_id))
                }
            }
        }

        let known: HashSet<&str> = snapshot.tasks.iter().map(|t| t.id.as_str()).collect();
        for edge in &snapshot.edges {
            for endpoint in [&edge.dependent_id, &edge.prerequisite_id] {
                if !known.contains(endpoint.as_str()) {
                    issues.push(format!(
                        "Dependency {} -> {} references non-existent task {}",
                        edge.dependent_id, edge.prerequisite_id, endpoint
                    ));
                }
            }
        }

        if let Some(cycle) = DependencyGraph::from_edges(&snapshot.edges).find_cycle() {
            issues.push(format!("Dependency cycle: {}", cycle.join(" -> ")));
        }

        for evidence in &snapshot.evidence {
            if !known.contains(evidence.task_id.as_str()) {
                issues.push(format!(
                    "Evidence {} references non-existent task {}",
                    evidence.id, evidence.task_id
                ));
            }
        }

        Ok(issues)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Create a NotStarted task, plus one finish-to-start edge per initial dependency
    pub async fn create_task(&self, spec: NewTask) -> WbsResult<WbsTask> {
        validate_new_task(&spec)?;

        if !self.store.has_project(spec.project_id).await? {
            return Err(WbsError::not_found("project", spec.project_id.to_string()));
        }
        if self.store.locate_task(&spec.id).await?.is_some() {
            return Err(WbsError::conflict(format!(
                "task {} already exists",
                spec.id
            )));
        }

        let snapshot = self.load(spec.project_id).await?;
        if let Some(parent_id) = spec.parent_id.as_deref()
            && snapshot.task(parent_id).is_none()
        {
            return Err(WbsError::not_found("parent task", parent_id));
        }

        let mut graph = DependencyGraph::from_edges(&snapshot.edges);
        let mut changes = ChangeSet::default();
        let mut seen = HashSet::new();
        for prerequisite_id in &spec.dependencies {
            if !seen.insert(prerequisite_id.as_str()) {
                continue;
            }
            if snapshot.task(prerequisite_id).is_none() {
                return Err(WbsError::not_found("prerequisite task", prerequisite_id));
            }
            graph.try_add_edge(&spec.id, prerequisite_id)?;
            changes.insert_edges.push(DependencyEdge::new(
                spec.id.clone(),
                prerequisite_id.clone(),
                DependencyType::FinishToStart,
            ));
        }

        let task = WbsTask::from_new(&spec);
        changes.upsert_tasks.push(task.clone());
        let edge_count = changes.insert_edges.len();
        self.commit(&snapshot, changes).await?;

        self.emit_event(WbsEvent::TaskCreated {
            task_id: task.id.clone(),
            project_id: task.project_id,
            parent_id: task.parent_id.clone(),
        });
        info!(
            "Created task {} in project {} with {} dependencies",
            task.id, task.project_id, edge_count
        );
        Ok(task)
    }

    /// Update descriptive and scheduling fields; a status change goes through the lifecycle rules
    pub async fn update_task(&self, task_id: &str, update: TaskUpdate) -> WbsResult<WbsTask> {
        validate_update(&update)?;

        let snapshot = self.load_for_task(task_id).await?;
        let mut task = require_task(&snapshot, task_id)?.clone();
        let old_status = task.status;
        let now = Utc::now();

        if let Some(status) = update.status
            && status != task.status
        {
            self.check_transition(&snapshot, &task, status)?;
            task.apply_status(status, now);
        }

        if let Some(name_en) = update.name_en {
            task.name_en = name_en;
        }
        if let Some(name_th) = update.name_th {
            task.name_th = name_th;
        }
        if let Some(description) = update.description {
            task.description = Some(description);
        }
        if let Some(weight) = update.weight_percent {
            task.weight_percent = weight;
        }
        if let Some(area) = update.installation_area {
            task.installation_area = Some(area);
        }
        if let Some(criteria) = update.acceptance_criteria {
            task.acceptance_criteria = Some(criteria);
        }
        if let Some(hours) = update.estimated_duration_hours {
            task.estimated_duration_hours = Some(hours);
        }
        if update.planned_start.is_some() {
            task.planned_start = update.planned_start;
        }
        if update.planned_end.is_some() {
            task.planned_end = update.planned_end;
        }
        if update.actual_start.is_some() {
            task.actual_start = update.actual_start;
        }
        if update.actual_end.is_some() {
            task.actual_end = update.actual_end;
        }
        if update.assigned_user_id.is_some() {
            task.assigned_user_id = update.assigned_user_id;
        }
        task.updated_by = update.updated_by.or(task.updated_by);
        task.updated_at = now;

        self.commit(
            &snapshot,
            ChangeSet {
                upsert_tasks: vec![task.clone()],
                ..Default::default()
            },
        )
        .await?;

        self.emit_event(WbsEvent::TaskUpdated {
            task_id: task.id.clone(),
        });
        if task.status != old_status {
            self.emit_event(WbsEvent::TaskStatusChanged {
                task_id: task.id.clone(),
                old_status,
                new_status: task.status,
            });
        }
        debug!("Updated task {}", task_id);
        Ok(task)
    }

    /// Move a task to `status`, stamping actual dates on first start and completion
    pub async fn set_status(&self, task_id: &str, status: WbsTaskStatus) -> WbsResult<WbsTask> {
        let snapshot = self.load_for_task(task_id).await?;
        let mut task = require_task(&snapshot, task_id)?.clone();
        let old_status = task.status;

        if old_status == status {
            debug!("Task {} already {}", task_id, status);
            return Ok(task);
        }

        self.check_transition(&snapshot, &task, status)?;
        task.apply_status(status, Utc::now());

        self.commit(
            &snapshot,
            ChangeSet {
                upsert_tasks: vec![task.clone()],
                ..Default::default()
            },
        )
        .await?;

        self.emit_event(WbsEvent::TaskStatusChanged {
            task_id: task.id.clone(),
            old_status,
            new_status: status,
        });
        info!("Task {} status: {} -> {}", task_id, old_status, status);
        Ok(task)
    }

    /// Delete a leaf task together with its evidence and incident edges
    pub async fn delete_task(&self, task_id: &str) -> WbsResult<DeletedTask> {
        let snapshot = self.load_for_task(task_id).await?;
        require_task(&snapshot, task_id)?;

        if snapshot.has_children(task_id) {
            warn!("Refusing to delete task {}: it has child tasks", task_id);
            return Err(WbsError::conflict(format!(
                "task {} has child tasks; delete them first",
                task_id
            )));
        }

        let delete_edges: Vec<uuid::Uuid> = snapshot
            .edges
            .iter()
            .filter(|edge| edge.touches(task_id))
            .map(|edge| edge.id)
            .collect();
        let delete_evidence: Vec<uuid::Uuid> = snapshot
            .evidence_for(task_id)
            .map(|evidence| evidence.id)
            .collect();
        let deleted = DeletedTask {
            task_id: task_id.to_string(),
            removed_edges: delete_edges.len(),
            removed_evidence: delete_evidence.len(),
        };

        self.commit(
            &snapshot,
            ChangeSet {
                delete_tasks: vec![task_id.to_string()],
                delete_edges,
                delete_evidence,
                ..Default::default()
            },
        )
        .await?;

        self.emit_event(WbsEvent::TaskDeleted {
            task_id: deleted.task_id.clone(),
            removed_edges: deleted.removed_edges,
            removed_evidence: deleted.removed_evidence,
        });
        info!(
            "Deleted task {} ({} edges, {} evidence)",
            task_id, deleted.removed_edges, deleted.removed_evidence
        );
        Ok(deleted)
    }

    /// Record that `dependent_id` cannot start before `prerequisite_id` completes
    pub async fn add_dependency(
        &self,
        dependent_id: &str,
        prerequisite_id: &str,
        dependency_type: DependencyType,
    ) -> WbsResult<DependencyEdge> {
        let snapshot = self.load_for_task(dependent_id).await?;
        require_task(&snapshot, dependent_id)?;
        if snapshot.task(prerequisite_id).is_none() {
            return Err(WbsError::not_found("prerequisite task", prerequisite_id));
        }

        DependencyGraph::from_edges(&snapshot.edges)
            .validate_new_edge(dependent_id, prerequisite_id)?;

        let edge = DependencyEdge::new(dependent_id, prerequisite_id, dependency_type);
        self.commit(
            &snapshot,
            ChangeSet {
                insert_edges: vec![edge.clone()],
                ..Default::default()
            },
        )
        .await?;

        self.emit_event(WbsEvent::DependencyAdded {
            dependent_id: dependent_id.to_string(),
            prerequisite_id: prerequisite_id.to_string(),
        });
        Ok(edge)
    }

    /// Remove the edge between two tasks
    pub async fn remove_dependency(&self, dependent_id: &str, prerequisite_id: &str) -> WbsResult<()> {
        let snapshot = self.load_for_task(dependent_id).await?;
        let delete_edges: Vec<uuid::Uuid> = snapshot
            .edges
            .iter()
            .filter(|edge| {
                edge.dependent_id == dependent_id && edge.prerequisite_id == prerequisite_id
            })
            .map(|edge| edge.id)
            .collect();

        if delete_edges.is_empty() {
            return Err(WbsError::not_found(
                "dependency",
                format!("{} -> {}", dependent_id, prerequisite_id),
            ));
        }

        self.commit(
            &snapshot,
            ChangeSet {
                delete_edges,
                ..Default::default()
            },
        )
        .await?;

        self.emit_event(WbsEvent::DependencyRemoved {
            dependent_id: dependent_id.to_string(),
            prerequisite_id: prerequisite_id.to_string(),
        });
        Ok(())
    }

    /// Append an immutable evidence record to a task
    pub async fn add_evidence(&self, task_id: &str, spec: NewEvidence) -> WbsResult<Evidence> {
        validate_evidence(&spec)?;
        let snapshot = self.load_for_task(task_id).await?;
        require_task(&snapshot, task_id)?;

        let evidence = Evidence::from_new(task_id, spec);
        self.commit(
            &snapshot,
            ChangeSet {
                insert_evidence: vec![evidence.clone()],
                ..Default::default()
            },
        )
        .await?;

        self.emit_event(WbsEvent::EvidenceAdded {
            task_id: task_id.to_string(),
            evidence_id: evidence.id,
        });
        Ok(evidence)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn check_transition(
        &self,
        snapshot: &ProjectSnapshot,
        task: &WbsTask,
        next: WbsTaskStatus,
    ) -> WbsResult<()> {
        if !task.status.can_transition_to(next) {
            return Err(WbsError::conflict(format!(
                "task {} cannot move from {} to {}",
                task.id, task.status, next
            )));
        }

        if next == WbsTaskStatus::InProgress && self.config.enforce_dependencies_on_start {
            let statuses = status_index(&snapshot.tasks);
            let graph = DependencyGraph::from_edges(&snapshot.edges);
            if !graph.can_start(&task.id, &statuses) {
                let unmet: Vec<&str> = graph
                    .prerequisites_of(&task.id)
                    .iter()
                    .filter(|id| {
                        statuses.get(id.as_str()).copied() != Some(WbsTaskStatus::Completed)
                    })
                    .map(String::as_str)
                    .collect();
                warn!(
                    "Task {} cannot start, unmet prerequisites: {:?}",
                    task.id, unmet
                );
                return Err(WbsError::conflict(format!(
                    "task {} has unmet prerequisites: {}",
                    task.id,
                    unmet.join(", ")
                )));
            }
        }
        Ok(())
    }

    async fn load(&self, project_id: ProjectId) -> WbsResult<ProjectSnapshot> {
        match self.store.load_project(project_id).await {
            Ok(snapshot) => Ok(snapshot),
            Err(StoreError::UnknownProject(id)) => Err(WbsError::not_found("project", id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_for_task(&self, task_id: &str) -> WbsResult<ProjectSnapshot> {
        let project_id = self
            .store
            .locate_task(task_id)
            .await?
            .ok_or_else(|| WbsError::not_found("task", task_id))?;
        self.load(project_id).await
    }

    async fn commit(&self, snapshot: &ProjectSnapshot, changes: ChangeSet) -> WbsResult<u64> {
        match self
            .store
            .commit(snapshot.project_id, snapshot.version, changes)
            .await
        {
            Ok(version) => Ok(version),
            Err(StoreError::DuplicateTask {
                task_id,
                project_id,
            }) => {
                warn!(
                    "Commit to project {} rejected: task {} exists in project {}",
                    snapshot.project_id, task_id, project_id
                );
                Err(WbsError::conflict(format!(
                    "task {} already exists in project {}",
                    task_id, project_id
                )))
            }
            Err(e) => {
                error!("Commit to project {} failed: {}", snapshot.project_id, e);
                Err(e.into())
            }
        }
    }

    fn emit_event(&self, event: WbsEvent) {
        for handler in &self.event_handlers {
            if let Err(e) = handler.handle_event(&event) {
                error!("Event handler error: {}", e);
            }
        }
    }
}

impl Default for WbsManagerConfig {
    fn default() -> Self {
        Self {
            enforce_dependencies_on_start: true,
            default_task_duration_hours: 8,
            progress_decimal_places: 2,
        }
    }
}

/// Simple event handler that logs events
pub struct LoggingEventHandler;

impl WbsEventHandler for LoggingEventHandler {
    fn handle_event(&self, event: &WbsEvent) -> Result<()> {
        match event {
            WbsEvent::TaskCreated {
                task_id,
                project_id,
                parent_id,
            } => {
                info!(
                    "Task created: {} in {} (parent: {:?})",
                    task_id, project_id, parent_id
                );
            }
            WbsEvent::TaskUpdated { task_id } => {
                debug!("Task updated: {}", task_id);
            }
            WbsEvent::TaskStatusChanged {
                task_id,
                old_status,
                new_status,
            } => {
                info!("Task {} status: {} -> {}", task_id, old_status, new_status);
            }
            WbsEvent::TaskDeleted {
                task_id,
                removed_edges,
                removed_evidence,
            } => {
                info!(
                    "Task deleted: {} ({} edges, {} evidence)",
                    task_id, removed_edges, removed_evidence
                );
            }
            WbsEvent::DependencyAdded {
                dependent_id,
                prerequisite_id,
            } => {
                info!("Dependency added: {} -> {}", dependent_id, prerequisite_id);
            }
            WbsEvent::DependencyRemoved {
                dependent_id,
                prerequisite_id,
            } => {
                info!("Dependency removed: {} -> {}", dependent_id, prerequisite_id);
            }
            WbsEvent::EvidenceAdded {
                task_id,
                evidence_id,
            } => {
                info!("Evidence {} added to task {}", evidence_id, task_id);
            }
        }
        Ok(())
    }
}

fn require_task<'a>(snapshot: &'a ProjectSnapshot, task_id: &str) -> WbsResult<&'a WbsTask> {
    snapshot
        .task(task_id)
        .ok_or_else(|| WbsError::not_found("task", task_id))
}

fn newest_first(mut evidence: Vec<Evidence>) -> Vec<Evidence> {
    evidence.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    evidence
}

fn require_text(field: &str, value: &str, max: usize) -> WbsResult<()> {
    if value.trim().is_empty() {
        return Err(WbsError::validation(field, "is required"));
    }
    check_len(field, Some(value), max)
}

fn check_len(field: &str, value: Option<&str>, max: usize) -> WbsResult<()> {
    match value {
        Some(text) if text.chars().count() > max => Err(WbsError::validation(
            field,
            format!("must be at most {} characters", max),
        )),
        _ => Ok(()),
    }
}

fn check_weight(weight: f64) -> WbsResult<()> {
    if !weight.is_finite() || !(0.0..=100.0).contains(&weight) {
        return Err(WbsError::validation(
            "weight_percent",
            format!("must be between 0 and 100, got {}", weight),
        ));
    }
    Ok(())
}

fn validate_new_task(spec: &NewTask) -> WbsResult<()> {
    require_text("id", &spec.id, MAX_ID_LEN)?;
    require_text("name_en", &spec.name_en, MAX_NAME_LEN)?;
    require_text("name_th", &spec.name_th, MAX_NAME_LEN)?;
    check_len("description", spec.description.as_deref(), MAX_DESCRIPTION_LEN)?;
    check_len(
        "installation_area",
        spec.installation_area.as_deref(),
        MAX_AREA_LEN,
    )?;
    check_len(
        "acceptance_criteria",
        spec.acceptance_criteria.as_deref(),
        MAX_CRITERIA_LEN,
    )?;
    check_weight(spec.weight_percent)?;
    if let Some(parent_id) = spec.parent_id.as_deref()
        && parent_id == spec.id
    {
        return Err(WbsError::validation("parent_id", "a task cannot be its own parent"));
    }
    if spec.dependencies.iter().any(|id| id == &spec.id) {
        return Err(WbsError::validation(
            "dependencies",
            format!("task {} cannot depend on itself", spec.id),
        ));
    }
    Ok(())
}

fn validate_update(update: &TaskUpdate) -> WbsResult<()> {
    if let Some(name_en) = update.name_en.as_deref() {
        require_text("name_en", name_en, MAX_NAME_LEN)?;
    }
    if let Some(name_th) = update.name_th.as_deref() {
        require_text("name_th", name_th, MAX_NAME_LEN)?;
    }
    check_len("description", update.description.as_deref(), MAX_DESCRIPTION_LEN)?;
    check_len(
        "installation_area",
        update.installation_area.as_deref(),
        MAX_AREA_LEN,
    )?;
    check_len(
        "acceptance_criteria",
        update.acceptance_criteria.as_deref(),
        MAX_CRITERIA_LEN,
    )?;
    if let Some(weight) = update.weight_percent {
        check_weight(weight)?;
    }
    Ok(())
}

fn validate_evidence(spec: &NewEvidence) -> WbsResult<()> {
    require_text("evidence_type", &spec.evidence_type, MAX_EVIDENCE_TYPE_LEN)?;
    require_text("location", &spec.location, MAX_LOCATION_LEN)?;
    check_len(
        "description",
        spec.description.as_deref(),
        MAX_EVIDENCE_DESCRIPTION_LEN,
    )
}
