use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a WBS task, conventionally dot-segmented (e.g. `"4.3.2.1"`)
pub type TaskId = String;

/// Identifier of the project owning a set of tasks
pub type ProjectId = Uuid;

/// Identifier of a user (assignee or audit actor)
pub type UserId = Uuid;

/// A unit of work in the breakdown structure.
///
/// Nesting is determined by `parent_id` only; the dotted id text is never parsed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WbsTask {
    pub id: TaskId,
    pub parent_id: Option<TaskId>,
    pub project_id: ProjectId,
    pub name_en: String,
    pub name_th: String,
    pub description: Option<String>,
    pub installation_area: Option<String>,
    pub acceptance_criteria: Option<String>,
    pub status: WbsTaskStatus,
    /// Share of total project completion. Weights are summed flatly over the whole
    /// project, so a parent must not also carry the sum of its children's weights.
    pub weight_percent: f64,
    /// Fallback duration for critical path analysis when planned dates are absent
    pub estimated_duration_hours: Option<u32>,
    pub planned_start: Option<DateTime<Utc>>,
    pub planned_end: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub assigned_user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
}

/// Task status
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WbsTaskStatus {
    NotStarted,
    InProgress,
    Completed,
    OnHold,
}

/// Kind of a dependency relationship
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DependencyType {
    #[default]
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

/// Directed relation: `dependent_id` depends on `prerequisite_id`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DependencyEdge {
    pub id: Uuid,
    pub dependent_id: TaskId,
    pub prerequisite_id: TaskId,
    pub dependency_type: DependencyType,
    pub created_at: DateTime<Utc>,
}

/// Immutable proof-of-completion attachment (photo, document, ...)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Evidence {
    pub id: Uuid,
    pub task_id: TaskId,
    pub evidence_type: String,
    /// URL or storage path of the uploaded file
    pub location: String,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub mime_type: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
}

/// Request shape for creating a task
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct NewTask {
    pub id: TaskId,
    pub parent_id: Option<TaskId>,
    pub project_id: ProjectId,
    pub name_en: String,
    pub name_th: String,
    pub description: Option<String>,
    pub installation_area: Option<String>,
    pub acceptance_criteria: Option<String>,
    pub weight_percent: f64,
    pub estimated_duration_hours: Option<u32>,
    pub planned_start: Option<DateTime<Utc>>,
    pub planned_end: Option<DateTime<Utc>>,
    pub assigned_user_id: Option<UserId>,
    /// Prerequisite task ids; each creates a finish-to-start edge
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    pub created_by: Option<UserId>,
}

/// Partial update of a task. `None` leaves a field untouched.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TaskUpdate {
    pub name_en: Option<String>,
    pub name_th: Option<String>,
    pub description: Option<String>,
    pub status: Option<WbsTaskStatus>,
    pub weight_percent: Option<f64>,
    pub installation_area: Option<String>,
    pub acceptance_criteria: Option<String>,
    pub estimated_duration_hours: Option<u32>,
    pub planned_start: Option<DateTime<Utc>>,
    pub planned_end: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub assigned_user_id: Option<UserId>,
    pub updated_by: Option<UserId>,
}

/// Request shape for attaching evidence
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct NewEvidence {
    pub evidence_type: String,
    pub location: String,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub mime_type: Option<String>,
    pub description: Option<String>,
    pub created_by: Option<UserId>,
}

/// Optional filters for listing tasks
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TaskFilter {
    pub installation_area: Option<String>,
    pub status: Option<WbsTaskStatus>,
}

/// A task together with its resolved edges, evidence and children
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TaskDetails {
    pub task: WbsTask,
    /// Edges where this task is the dependent
    pub prerequisites: Vec<DependencyEdge>,
    /// Edges where this task is the prerequisite
    pub dependents: Vec<DependencyEdge>,
    pub evidence: Vec<Evidence>,
    pub children: Vec<TaskId>,
}

impl WbsTask {
    /// Build a NotStarted task from a creation request
    pub fn from_new(spec: &NewTask) -> Self {
        let now = Utc::now();
        Self {
            id: spec.id.clone(),
            parent_id: spec.parent_id.clone(),
            project_id: spec.project_id,
            name_en: spec.name_en.clone(),
            name_th: spec.name_th.clone(),
            description: spec.description.clone(),
            installation_area: spec.installation_area.clone(),
            acceptance_criteria: spec.acceptance_criteria.clone(),
            status: WbsTaskStatus::NotStarted,
            weight_percent: spec.weight_percent,
            estimated_duration_hours: spec.estimated_duration_hours,
            planned_start: spec.planned_start,
            planned_end: spec.planned_end,
            actual_start: None,
            actual_end: None,
            assigned_user_id: spec.assigned_user_id,
            created_at: now,
            updated_at: now,
            created_by: spec.created_by,
            updated_by: spec.created_by,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == WbsTaskStatus::Completed
    }

    pub fn is_not_started(&self) -> bool {
        self.status == WbsTaskStatus::NotStarted
    }

    /// Apply a status change, stamping actual dates that are still unset.
    ///
    /// Transition legality is checked by the caller; this only records the effect.
    pub fn apply_status(&mut self, status: WbsTaskStatus, at: DateTime<Utc>) {
        match status {
            WbsTaskStatus::InProgress if self.actual_start.is_none() => {
                self.actual_start = Some(at);
            }
            WbsTaskStatus::Completed if self.actual_end.is_none() => {
                self.actual_end = Some(at);
            }
            _ => {}
        }
        self.status = status;
        self.updated_at = at;
    }
}

impl WbsTaskStatus {
    pub const ALL: [WbsTaskStatus; 4] = [
        WbsTaskStatus::NotStarted,
        WbsTaskStatus::InProgress,
        WbsTaskStatus::Completed,
        WbsTaskStatus::OnHold,
    ];

    /// Whether the lifecycle allows moving from `self` to `next`
    pub fn can_transition_to(self, next: WbsTaskStatus) -> bool {
        use WbsTaskStatus::*;
        matches!(
            (self, next),
            (NotStarted, InProgress)
                | (NotStarted, OnHold)
                | (InProgress, Completed)
                | (InProgress, OnHold)
                | (OnHold, InProgress)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WbsTaskStatus::NotStarted => "NotStarted",
            WbsTaskStatus::InProgress => "InProgress",
            WbsTaskStatus::Completed => "Completed",
            WbsTaskStatus::OnHold => "OnHold",
        }
    }
}

impl fmt::Display for WbsTaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WbsTaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "notstarted" => Ok(WbsTaskStatus::NotStarted),
            "inprogress" => Ok(WbsTaskStatus::InProgress),
            "completed" => Ok(WbsTaskStatus::Completed),
            "onhold" => Ok(WbsTaskStatus::OnHold),
            other => Err(format!("unknown task status '{}'", other)),
        }
    }
}

impl std::str::FromStr for DependencyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "finishtostart" | "fs" => Ok(DependencyType::FinishToStart),
            "starttostart" | "ss" => Ok(DependencyType::StartToStart),
            "finishtofinish" | "ff" => Ok(DependencyType::FinishToFinish),
            "starttofinish" | "sf" => Ok(DependencyType::StartToFinish),
            other => Err(format!("unknown dependency type '{}'", other)),
        }
    }
}

impl DependencyEdge {
    pub fn new(
        dependent_id: impl Into<TaskId>,
        prerequisite_id: impl Into<TaskId>,
        dependency_type: DependencyType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            dependent_id: dependent_id.into(),
            prerequisite_id: prerequisite_id.into(),
            dependency_type,
            created_at: Utc::now(),
        }
    }

    /// Whether `task_id` is either endpoint of this edge
    pub fn touches(&self, task_id: &str) -> bool {
        self.dependent_id == task_id || self.prerequisite_id == task_id
    }
}

impl Evidence {
    pub fn from_new(task_id: &str, spec: NewEvidence) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id: task_id.to_string(),
            evidence_type: spec.evidence_type,
            location: spec.location,
            file_name: spec.file_name,
            file_size: spec.file_size,
            mime_type: spec.mime_type,
            description: spec.description,
            created_at: Utc::now(),
            created_by: spec.created_by,
        }
    }
}

impl TaskFilter {
    pub fn matches(&self, task: &WbsTask) -> bool {
        if let Some(area) = self.installation_area.as_deref()
            && !area.is_empty()
            && task.installation_area.as_deref() != Some(area)
        {
            return false;
        }
        if let Some(status) = self.status
            && task.status != status
        {
            return false;
        }
        true
    }
}
