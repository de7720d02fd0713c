//! Weighted completion roll-up.
//!
//! Weights are summed flatly over every task of a project regardless of depth. A
//! phase's own weight and its children's weights are independent ledger entries:
//! giving a parent the sum of its children's weights counts that work twice.

use crate::wbs::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Completion summary for a project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectProgress {
    pub project_id: ProjectId,
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub total_weight: f64,
    pub completed_weight: f64,
    /// `100 * completed_weight / total_weight`, 0 when there is no weight at all
    pub percentage: f64,
    /// Count per status; every status is present, possibly with 0
    pub status_summary: BTreeMap<WbsTaskStatus, u32>,
    pub area_progress: Vec<AreaProgress>,
}

/// Completion of the tasks sharing one installation area
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AreaProgress {
    pub installation_area: String,
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub percentage: f64,
}

#[derive(Default)]
struct Tally {
    total_tasks: u32,
    completed_tasks: u32,
    total_weight: f64,
    completed_weight: f64,
}

impl Tally {
    fn add(&mut self, task: &WbsTask) {
        self.total_tasks += 1;
        self.total_weight += task.weight_percent;
        if task.is_completed() {
            self.completed_tasks += 1;
            self.completed_weight += task.weight_percent;
        }
    }

    fn percentage(&self, decimals: u32) -> f64 {
        if self.total_tasks == 0 || self.total_weight <= 0.0 {
            return 0.0;
        }
        round_to(100.0 * self.completed_weight / self.total_weight, decimals)
    }
}

/// Compute weighted progress over all tasks of a project.
///
/// Tasks are summed in id order so the result does not depend on the order the
/// snapshot was loaded in.
pub fn calculate_progress(project_id: ProjectId, tasks: &[WbsTask], decimals: u32) -> ProjectProgress {
    let mut ordered: Vec<&WbsTask> = tasks.iter().collect();
    ordered.sort_by(|a, b| a.id.cmp(&b.id));

    let mut overall = Tally::default();
    let mut by_area: BTreeMap<&str, Tally> = BTreeMap::new();
    let mut status_summary: BTreeMap<WbsTaskStatus, u32> =
        WbsTaskStatus::ALL.iter().map(|status| (*status, 0)).collect();

    for task in ordered {
        overall.add(task);
        *status_summary.entry(task.status).or_insert(0) += 1;
        if let Some(area) = task.installation_area.as_deref()
            && !area.is_empty()
        {
            by_area.entry(area).or_default().add(task);
        }
    }

    let area_progress = by_area
        .into_iter()
        .map(|(area, tally)| AreaProgress {
            installation_area: area.to_string(),
            total_tasks: tally.total_tasks,
            completed_tasks: tally.completed_tasks,
            percentage: tally.percentage(decimals),
        })
        .collect();

    ProjectProgress {
        project_id,
        total_tasks: overall.total_tasks,
        completed_tasks: overall.completed_tasks,
        total_weight: overall.total_weight,
        completed_weight: overall.completed_weight,
        percentage: overall.percentage(decimals),
        status_summary,
        area_progress,
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals.min(12) as i32);
    (value * factor).round() / factor
}
