use crate::env;
use crate::store::*;
use crate::wbs::types::ProjectId;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Store persisted as a single JSON document.
///
/// Every commit is applied to a copy of the state, written to a temp file and
/// renamed over the store file; memory is only updated once the rename succeeded.
pub struct JsonFileStore {
    data_dir: PathBuf,
    store_file: PathBuf,
    state: Mutex<StoreState>,
}

impl JsonFileStore {
    /// Open (or initialise) the store under `data_dir`
    pub async fn open(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let data_dir = data_dir.into();
        async_fs::create_dir_all(&data_dir).await?;
        let store_file = env::store_file_path(&data_dir);

        let state = if async_fs::try_exists(&store_file).await? {
            let content = async_fs::read(&store_file).await?;
            let state: StoreState = serde_json::from_slice(&content)?;
            info!(
                "Loaded store {} with {} projects",
                store_file.display(),
                state.projects.len()
            );
            state
        } else {
            debug!("No store file at {}, starting empty", store_file.display());
            StoreState::default()
        };

        Ok(Self {
            data_dir,
            store_file,
            state: Mutex::new(state),
        })
    }

    pub fn store_file(&self) -> &Path {
        &self.store_file
    }

    pub async fn register_project(&self, project_id: ProjectId) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        if !next.register_project(project_id) {
            return Ok(false);
        }
        self.persist(&next).await?;
        *state = next;
        info!("Registered project {}", project_id);
        Ok(true)
    }

    async fn persist(&self, state: &StoreState) -> StoreResult<()> {
        let temp_dir = env::temp_dir_path(&self.data_dir);
        async_fs::create_dir_all(&temp_dir).await?;
        let temp_file = temp_dir.join(format!("store_{}.json", uuid::Uuid::new_v4()));

        let serialized = serde_json::to_vec_pretty(state)?;
        let written = async {
            let mut file = async_fs::File::create(&temp_file).await?;
            file.write_all(&serialized).await?;
            file.sync_all().await?;
            async_fs::rename(&temp_file, &self.store_file).await
        }
        .await;

        if let Err(e) = written {
            error!("Failed to persist store {}: {}", self.store_file.display(), e);
            let _ = async_fs::remove_file(&temp_file).await;
            return Err(e.into());
        }

        debug!(
            "Persisted store {} ({} bytes)",
            self.store_file.display(),
            serialized.len()
        );
        Ok(())
    }
}

#[async_trait]
impl TaskStore for JsonFileStore {
    async fn has_project(&self, project_id: ProjectId) -> StoreResult<bool> {
        Ok(self.state.lock().await.projects.contains_key(&project_id))
    }

    async fn load_project(&self, project_id: ProjectId) -> StoreResult<ProjectSnapshot> {
        self.state.lock().await.snapshot(project_id)
    }

    async fn locate_task(&self, task_id: &str) -> StoreResult<Option<ProjectId>> {
        Ok(self.state.lock().await.locate_task(task_id))
    }

    async fn commit(
        &self,
        project_id: ProjectId,
        expected_version: u64,
        changes: ChangeSet,
    ) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let version = next.commit(project_id, expected_version, changes)?;
        if version != expected_version {
            self.persist(&next).await?;
            *state = next;
        }
        Ok(version)
    }
}
