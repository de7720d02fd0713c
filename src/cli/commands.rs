//! Command execution against the file-backed store

use super::args::{Args, Commands};
use crate::config::{ConfigDiscovery, EngineConfig};
use crate::store::JsonFileStore;
use crate::wbs::{
    LoggingEventHandler, NewEvidence, NewTask, TaskFilter, TaskHierarchy, TaskUpdate, WbsManager,
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Resolve the effective configuration from flags, discovery and defaults
pub fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_toml_file(path)?,
        None => ConfigDiscovery::discover_config()?,
    };
    if let Some(data_dir) = &args.data_dir {
        config.data_dir = data_dir.clone();
    }
    Ok(config)
}

/// Execute one subcommand, printing its result to stdout
pub async fn run(args: Args, config: EngineConfig) -> Result<()> {
    if matches!(args.command, Commands::ShowConfig) {
        ConfigDiscovery::show_discovery_info();
        println!("\nEffective configuration:\n{}", config.to_toml_string()?);
        return Ok(());
    }

    let store = Arc::new(
        JsonFileStore::open(&config.data_dir)
            .await
            .with_context(|| format!("Failed to open store in {}", config.data_dir.display()))?,
    );
    debug!("Using store {}", store.store_file().display());

    if let Commands::InitProject { project } = &args.command {
        let project_id = project.unwrap_or_else(Uuid::new_v4);
        if store.register_project(project_id).await? {
            info!("Project {} registered", project_id);
        } else {
            info!("Project {} already registered", project_id);
        }
        println!("{}", project_id);
        return Ok(());
    }

    let mut manager = WbsManager::new(store, config.manager.clone());
    manager.add_event_handler(Box::new(LoggingEventHandler));

    match args.command {
        Commands::Create {
            project,
            id,
            parent,
            name_en,
            name_th,
            description,
            weight,
            area,
            criteria,
            hours,
            depends_on,
        } => {
            let task = manager
                .create_task(NewTask {
                    id,
                    parent_id: parent,
                    project_id: project,
                    name_en,
                    name_th,
                    description,
                    installation_area: area,
                    acceptance_criteria: criteria,
                    weight_percent: weight,
                    estimated_duration_hours: hours,
                    dependencies: depends_on,
                    ..Default::default()
                })
                .await?;
            print_json(&task)
        }
        Commands::Update {
            id,
            name_en,
            name_th,
            description,
            weight,
            area,
            criteria,
            hours,
        } => {
            let update = TaskUpdate {
                name_en,
                name_th,
                description,
                weight_percent: weight,
                installation_area: area,
                acceptance_criteria: criteria,
                estimated_duration_hours: hours,
                ..Default::default()
            };
            print_json(&manager.update_task(&id, update).await?)
        }
        Commands::Status { id, status } => print_json(&manager.set_status(&id, status).await?),
        Commands::Delete { id } => print_json(&manager.delete_task(&id).await?),
        Commands::Depend {
            dependent,
            prerequisite,
            kind,
        } => print_json(&manager.add_dependency(&dependent, &prerequisite, kind).await?),
        Commands::Undepend {
            dependent,
            prerequisite,
        } => {
            manager.remove_dependency(&dependent, &prerequisite).await?;
            println!("Removed dependency {} -> {}", dependent, prerequisite);
            Ok(())
        }
        Commands::AddEvidence {
            id,
            evidence_type,
            location,
            description,
            mime,
        } => {
            let spec = NewEvidence {
                evidence_type,
                location,
                description,
                mime_type: mime,
                ..Default::default()
            };
            print_json(&manager.add_evidence(&id, spec).await?)
        }
        Commands::Evidence { id } => print_json(&manager.list_evidence(&id).await?),
        Commands::List {
            project,
            area,
            status,
        } => {
            let filter = TaskFilter {
                installation_area: area,
                status,
            };
            print_json(&manager.list_tasks(project, &filter).await?)
        }
        Commands::Show { id } => print_json(&manager.get_task(&id).await?),
        Commands::Children { id } => print_json(&manager.get_children(&id).await?),
        Commands::Tree { project } => {
            let hierarchy = manager.get_hierarchy(project).await?;
            print!("{}", render_tree(&hierarchy));
            Ok(())
        }
        Commands::Progress { project } => print_json(&manager.project_progress(project).await?),
        Commands::CanStart { id } => {
            let can_start = manager.can_start(&id).await?;
            println!("{}", can_start);
            Ok(())
        }
        Commands::Ready { project } => print_json(&manager.ready_to_start(project).await?),
        Commands::CriticalPath { project } => print_json(&manager.critical_path(project).await?),
        Commands::Check { project } => {
            let issues = manager.validate_integrity(project).await?;
            if issues.is_empty() {
                println!("No integrity issues found");
            } else {
                for issue in &issues {
                    println!("- {}", issue);
                }
                anyhow::bail!("{} integrity issue(s) found", issues.len());
            }
            Ok(())
        }
        Commands::InitProject { .. } | Commands::ShowConfig => Ok(()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Indented text rendering of a hierarchy, one task per line
pub fn render_tree(hierarchy: &TaskHierarchy) -> String {
    let mut out = String::new();
    for node in hierarchy.nodes() {
        out.push_str(&"  ".repeat(node.level as usize));
        out.push_str(&format!(
            "{} {} [{}] {}%\n",
            node.task.id, node.task.name_en, node.task.status, node.task.weight_percent
        ));
    }
    for diagnostic in &hierarchy.diagnostics {
        out.push_str(&format!("! {:?}\n", diagnostic));
    }
    out
}
