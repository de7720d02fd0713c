//! Command line argument parsing
//!
//! Every subcommand maps onto one engine operation against the JSON store found in
//! the configured data directory. Project-scoped commands take `--project`, task
//! commands take the task id as a positional argument.

use crate::wbs::{DependencyType, ProjectId, TaskId, WbsTaskStatus};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "wbs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Work Breakdown Structure engine for construction projects")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Data directory holding the store (overrides config)
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Register a project in the store
    InitProject {
        /// Project id (random if omitted)
        #[arg(long)]
        project: Option<ProjectId>,
    },
    /// Create a task
    Create {
        #[arg(long)]
        project: ProjectId,
        /// Task id, e.g. 4.3.2.1
        #[arg(long)]
        id: TaskId,
        #[arg(long)]
        parent: Option<TaskId>,
        #[arg(long = "name-en")]
        name_en: String,
        #[arg(long = "name-th")]
        name_th: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value_t = 0.0)]
        weight: f64,
        #[arg(long)]
        area: Option<String>,
        #[arg(long)]
        criteria: Option<String>,
        /// Estimated duration in hours
        #[arg(long)]
        hours: Option<u32>,
        /// Prerequisite task id (repeatable)
        #[arg(long = "depends-on")]
        depends_on: Vec<TaskId>,
    },
    /// Update task fields
    Update {
        id: TaskId,
        #[arg(long = "name-en")]
        name_en: Option<String>,
        #[arg(long = "name-th")]
        name_th: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        weight: Option<f64>,
        #[arg(long)]
        area: Option<String>,
        #[arg(long)]
        criteria: Option<String>,
        #[arg(long)]
        hours: Option<u32>,
    },
    /// Set a task's status (not-started, in-progress, completed, on-hold)
    Status { id: TaskId, status: WbsTaskStatus },
    /// Delete a task without children
    Delete { id: TaskId },
    /// Make a task depend on another
    Depend {
        dependent: TaskId,
        prerequisite: TaskId,
        #[arg(long, default_value = "finish-to-start")]
        kind: DependencyType,
    },
    /// Remove a dependency
    Undepend {
        dependent: TaskId,
        prerequisite: TaskId,
    },
    /// Attach evidence to a task
    AddEvidence {
        id: TaskId,
        /// Evidence type (photo, document, ...)
        #[arg(long = "type")]
        evidence_type: String,
        /// URL or path of the file
        #[arg(long)]
        location: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        mime: Option<String>,
    },
    /// List evidence of a task
    Evidence { id: TaskId },
    /// List tasks of a project
    List {
        #[arg(long)]
        project: ProjectId,
        #[arg(long)]
        area: Option<String>,
        #[arg(long)]
        status: Option<WbsTaskStatus>,
    },
    /// Show one task with edges and evidence
    Show { id: TaskId },
    /// List direct children of a task
    Children { id: TaskId },
    /// Print the task hierarchy of a project
    Tree {
        #[arg(long)]
        project: ProjectId,
    },
    /// Weighted project progress
    Progress {
        #[arg(long)]
        project: ProjectId,
    },
    /// Whether a task's prerequisites are all completed
    CanStart { id: TaskId },
    /// Tasks ready to start
    Ready {
        #[arg(long)]
        project: ProjectId,
    },
    /// Critical path analysis
    CriticalPath {
        #[arg(long)]
        project: ProjectId,
    },
    /// Report integrity problems in stored data
    Check {
        #[arg(long)]
        project: ProjectId,
    },
    /// Show configuration discovery information
    ShowConfig,
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }
}
