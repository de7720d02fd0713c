//! # WBS Engine
//!
//! Work Breakdown Structure engine for construction and installation projects.
//! Tasks form a hierarchy through parent links and a separate acyclic graph of
//! prerequisite edges; the engine answers which tasks may start, how far the
//! project has progressed and which chain of tasks bounds its duration.
//!
//! ## Architecture Overview
//!
//! - **[`wbs`]**: task model, hierarchy builder, dependency resolver, progress
//!   calculator, critical path analyzer and the lifecycle [`WbsManager`]
//! - **[`store`]**: the [`TaskStore`] boundary with in-memory and JSON file backends
//! - **[`config`]**: TOML configuration and discovery
//! - **[`cli`]**: the `wbs` command-line driver
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wbs_engine::{InMemoryTaskStore, NewTask, WbsManager, WbsManagerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(InMemoryTaskStore::new());
//!     let project_id = uuid::Uuid::new_v4();
//!     store.register_project(project_id).await;
//!
//!     let manager = WbsManager::new(store, WbsManagerConfig::default());
//!     manager
//!         .create_task(NewTask {
//!             id: "1".to_string(),
//!             project_id,
//!             name_en: "Site preparation".to_string(),
//!             name_th: "เตรียมพื้นที่".to_string(),
//!             weight_percent: 10.0,
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     let progress = manager.project_progress(project_id).await?;
//!     println!("{}% complete", progress.percentage);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod env;
pub mod store;
pub mod wbs;

pub use config::{ConfigDiscovery, EngineConfig};
pub use store::{
    ChangeSet, InMemoryTaskStore, JsonFileStore, ProjectSnapshot, StoreError, StoreResult,
    TaskStore,
};
pub use wbs::{
    CriticalPath, DependencyGraph, ErrorKind, NewEvidence, NewTask, ProjectProgress,
    TaskHierarchy, TaskUpdate, WbsError, WbsManager, WbsManagerConfig, WbsResult, WbsTask,
    WbsTaskStatus,
};
