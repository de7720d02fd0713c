use crate::store::*;
use crate::wbs::types::ProjectId;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

/// Volatile store, used by tests and embedders that persist elsewhere
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    state: RwLock<StoreState>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: StoreState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    pub async fn register_project(&self, project_id: ProjectId) -> bool {
        let created = self.state.write().await.register_project(project_id);
        if created {
            debug!("Registered project {}", project_id);
        }
        created
    }

    /// Copy of the whole store, for export
    pub async fn export_state(&self) -> StoreState {
        self.state.read().await.clone()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn has_project(&self, project_id: ProjectId) -> StoreResult<bool> {
        Ok(self.state.read().await.projects.contains_key(&project_id))
    }

    async fn load_project(&self, project_id: ProjectId) -> StoreResult<ProjectSnapshot> {
        self.state.read().await.snapshot(project_id)
    }

    async fn locate_task(&self, task_id: &str) -> StoreResult<Option<ProjectId>> {
        Ok(self.state.read().await.locate_task(task_id))
    }

    async fn commit(
        &self,
        project_id: ProjectId,
        expected_version: u64,
        changes: ChangeSet,
    ) -> StoreResult<u64> {
        self.state
            .write()
            .await
            .commit(project_id, expected_version, changes)
    }
}
