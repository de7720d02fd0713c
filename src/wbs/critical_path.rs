use crate::wbs::dependency::DependencyGraph;
use crate::wbs::error::{WbsError, WbsResult};
use crate::wbs::types::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Scheduling figures for one task, in hours from project start
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSchedule {
    pub task_id: TaskId,
    pub duration_hours: i64,
    pub earliest_start: i64,
    pub earliest_finish: i64,
    pub latest_start: i64,
    pub latest_finish: i64,
    /// Float before the task delays the project end
    pub slack: i64,
    pub is_critical: bool,
}

/// Result of a critical path analysis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CriticalPath {
    /// Length of the longest dependency chain, in hours
    pub project_duration_hours: i64,
    /// One longest chain, first prerequisite to last dependent
    pub path: Vec<TaskId>,
    /// Every task in topological order
    pub schedule: Vec<TaskSchedule>,
}

impl CriticalPath {
    /// Ids of all zero-slack tasks in topological order
    pub fn critical_task_ids(&self) -> Vec<TaskId> {
        self.schedule
            .iter()
            .filter(|entry| entry.is_critical)
            .map(|entry| entry.task_id.clone())
            .collect()
    }

    pub fn schedule_for(&self, task_id: &str) -> Option<&TaskSchedule> {
        self.schedule.iter().find(|entry| entry.task_id == task_id)
    }
}

/// Duration of a task in whole hours.
///
/// A planned window with `end > start` wins, with any partial hour counted as a full
/// hour; otherwise the task's own estimate, then `default_hours`.
pub fn task_duration_hours(task: &WbsTask, default_hours: u32) -> i64 {
    const SECONDS_PER_HOUR: i64 = 3600;

    if let (Some(start), Some(end)) = (task.planned_start, task.planned_end)
        && end > start
    {
        let seconds = end.signed_duration_since(start).num_seconds();
        return (seconds + SECONDS_PER_HOUR - 1) / SECONDS_PER_HOUR;
    }
    i64::from(task.estimated_duration_hours.unwrap_or(default_hours))
}

/// Topological order of tasks (prerequisites first), ties broken by ascending id.
///
/// Edges whose endpoints are not both in `tasks` are ignored. Fails with a
/// validation error naming the remaining tasks if the graph has a cycle.
pub fn topological_order(tasks: &[WbsTask], graph: &DependencyGraph) -> WbsResult<Vec<TaskId>> {
    let ids: BTreeSet<&str> = tasks.iter().map(|task| task.id.as_str()).collect();

    let mut in_degree: HashMap<&str, usize> = ids
        .iter()
        .map(|&id| {
            let count = graph
                .prerequisites_of(id)
                .iter()
                .filter(|prereq| ids.contains(prereq.as_str()))
                .count();
            (id, count)
        })
        .collect();

    let mut ready: BTreeSet<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| *id)
        .collect();

    let mut order = Vec::with_capacity(ids.len());
    while let Some(current) = ready.pop_first() {
        order.push(current.to_string());
        for dependent in graph.dependents_of(current) {
            if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(dependent.as_str());
                }
            }
        }
    }

    if order.len() != ids.len() {
        let mut stuck: Vec<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree > 0)
            .map(|(id, _)| *id)
            .collect();
        stuck.sort_unstable();
        return Err(WbsError::validation(
            "dependencies",
            format!("dependency cycle among tasks: {}", stuck.join(", ")),
        ));
    }

    Ok(order)
}

/// Forward/backward pass over the dependency network.
pub fn analyze(
    tasks: &[WbsTask],
    graph: &DependencyGraph,
    default_hours: u32,
) -> WbsResult<CriticalPath> {
    if tasks.is_empty() {
        return Ok(CriticalPath::default());
    }

    let order = topological_order(tasks, graph)?;
    let durations: HashMap<&str, i64> = tasks
        .iter()
        .map(|task| (task.id.as_str(), task_duration_hours(task, default_hours)))
        .collect();

    let mut earliest_start: HashMap<&str, i64> = HashMap::new();
    let mut earliest_finish: HashMap<&str, i64> = HashMap::new();
    for id in &order {
        let start = graph
            .prerequisites_of(id)
            .iter()
            .filter(|prereq| durations.contains_key(prereq.as_str()))
            .map(|prereq| earliest_finish[prereq.as_str()])
            .max()
            .unwrap_or(0);
        earliest_start.insert(id.as_str(), start);
        earliest_finish.insert(id.as_str(), start + durations[id.as_str()]);
    }

    let project_end = earliest_finish.values().copied().max().unwrap_or(0);

    let mut latest_start: HashMap<&str, i64> = HashMap::new();
    let mut latest_finish: HashMap<&str, i64> = HashMap::new();
    for id in order.iter().rev() {
        let finish = graph
            .dependents_of(id)
            .iter()
            .filter(|dependent| durations.contains_key(dependent.as_str()))
            .map(|dependent| latest_start[dependent.as_str()])
            .min()
            .unwrap_or(project_end);
        latest_finish.insert(id.as_str(), finish);
        latest_start.insert(id.as_str(), finish - durations[id.as_str()]);
    }

    let schedule: Vec<TaskSchedule> = order
        .iter()
        .map(|id| {
            let key = id.as_str();
            let slack = latest_start[key] - earliest_start[key];
            TaskSchedule {
                task_id: id.clone(),
                duration_hours: durations[key],
                earliest_start: earliest_start[key],
                earliest_finish: earliest_finish[key],
                latest_start: latest_start[key],
                latest_finish: latest_finish[key],
                slack,
                is_critical: slack == 0,
            }
        })
        .collect();

    let path = trace_longest_chain(&schedule, graph);
    debug!(
        "Critical path spans {} tasks over {}h",
        path.len(),
        project_end
    );

    Ok(CriticalPath {
        project_duration_hours: project_end,
        path,
        schedule,
    })
}

/// Walk one chain of critical tasks from a zero-start task to the project end.
///
/// Each step moves to a critical dependent that starts exactly when the current
/// task finishes; ties go to the lowest id.
fn trace_longest_chain(schedule: &[TaskSchedule], graph: &DependencyGraph) -> Vec<TaskId> {
    let by_id: HashMap<&str, &TaskSchedule> = schedule
        .iter()
        .map(|entry| (entry.task_id.as_str(), entry))
        .collect();

    // Prefer a start that actually leads somewhere; fall back to the lowest id.
    let starts: Vec<&TaskSchedule> = {
        let mut starts: Vec<&TaskSchedule> = schedule
            .iter()
            .filter(|entry| entry.is_critical && entry.earliest_start == 0)
            .collect();
        starts.sort_by(|a, b| a.task_id.cmp(&b.task_id));
        starts
    };
    let Some(mut current) = starts
        .iter()
        .find(|entry| !next_links(entry, &by_id, graph).is_empty())
        .or_else(|| starts.first())
        .copied()
    else {
        return Vec::new();
    };

    let mut path = vec![current.task_id.clone()];
    loop {
        let candidates = next_links(current, &by_id, graph);
        let Some(next) = candidates.into_iter().min_by(|a, b| a.task_id.cmp(&b.task_id)) else {
            break;
        };
        path.push(next.task_id.clone());
        current = next;
    }
    path
}

fn next_links<'a>(
    current: &TaskSchedule,
    by_id: &HashMap<&str, &'a TaskSchedule>,
    graph: &DependencyGraph,
) -> Vec<&'a TaskSchedule> {
    graph
        .dependents_of(&current.task_id)
        .iter()
        .filter_map(|id| by_id.get(id.as_str()).copied())
        .filter(|next| next.is_critical && next.earliest_start == current.earliest_finish)
        .collect()
}
