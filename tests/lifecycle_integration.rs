use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;
use wbs_engine::store::{
    ChangeSet, InMemoryTaskStore, ProjectSnapshot, StoreError, StoreResult, TaskStore,
};
use wbs_engine::wbs::*;

fn new_task(project_id: ProjectId, id: &str, parent: Option<&str>, weight: f64) -> NewTask {
    NewTask {
        id: id.to_string(),
        parent_id: parent.map(str::to_string),
        project_id,
        name_en: format!("Task {}", id),
        name_th: format!("งาน {}", id),
        weight_percent: weight,
        ..Default::default()
    }
}

async fn setup() -> (Arc<InMemoryTaskStore>, WbsManager, ProjectId) {
    let store = Arc::new(InMemoryTaskStore::new());
    let project_id = uuid::Uuid::new_v4();
    store.register_project(project_id).await;
    let manager = WbsManager::new(store.clone(), WbsManagerConfig::default());
    (store, manager, project_id)
}

struct RecordingHandler {
    events: Arc<Mutex<Vec<String>>>,
}

impl WbsEventHandler for RecordingHandler {
    fn handle_event(&self, event: &WbsEvent) -> anyhow::Result<()> {
        let name = match event {
            WbsEvent::TaskCreated { task_id, .. } => format!("created:{}", task_id),
            WbsEvent::TaskUpdated { task_id } => format!("updated:{}", task_id),
            WbsEvent::TaskStatusChanged {
                task_id,
                new_status,
                ..
            } => format!("status:{}:{}", task_id, new_status),
            WbsEvent::TaskDeleted { task_id, .. } => format!("deleted:{}", task_id),
            WbsEvent::DependencyAdded { dependent_id, .. } => format!("depends:{}", dependent_id),
            WbsEvent::DependencyRemoved { dependent_id, .. } => {
                format!("undepends:{}", dependent_id)
            }
            WbsEvent::EvidenceAdded { task_id, .. } => format!("evidence:{}", task_id),
        };
        self.events.lock().unwrap().push(name);
        Ok(())
    }
}

/// Store that lets another writer sneak in a commit before the first one it sees
struct ContendedStore {
    inner: InMemoryTaskStore,
    interfered: AtomicBool,
}

#[async_trait]
impl TaskStore for ContendedStore {
    async fn has_project(&self, project_id: ProjectId) -> StoreResult<bool> {
        self.inner.has_project(project_id).await
    }

    async fn load_project(&self, project_id: ProjectId) -> StoreResult<ProjectSnapshot> {
        self.inner.load_project(project_id).await
    }

    async fn locate_task(&self, task_id: &str) -> StoreResult<Option<ProjectId>> {
        self.inner.locate_task(task_id).await
    }

    async fn commit(
        &self,
        project_id: ProjectId,
        expected_version: u64,
        changes: ChangeSet,
    ) -> StoreResult<u64> {
        if !self.interfered.swap(true, Ordering::SeqCst) {
            let mut other = WbsTask::from_new(&new_task(project_id, "other", None, 1.0));
            other.name_en = "Concurrent writer".to_string();
            self.inner
                .commit(
                    project_id,
                    expected_version,
                    ChangeSet {
                        upsert_tasks: vec![other],
                        ..Default::default()
                    },
                )
                .await?;
        }
        self.inner.commit(project_id, expected_version, changes).await
    }
}

/// Store that holds every caller at a barrier right after the duplicate-id lookup
struct RendezvousStore {
    inner: InMemoryTaskStore,
    barrier: Barrier,
}

#[async_trait]
impl TaskStore for RendezvousStore {
    async fn has_project(&self, project_id: ProjectId) -> StoreResult<bool> {
        self.inner.has_project(project_id).await
    }

    async fn load_project(&self, project_id: ProjectId) -> StoreResult<ProjectSnapshot> {
        self.inner.load_project(project_id).await
    }

    async fn locate_task(&self, task_id: &str) -> StoreResult<Option<ProjectId>> {
        let located = self.inner.locate_task(task_id).await;
        self.barrier.wait().await;
        located
    }

    async fn commit(
        &self,
        project_id: ProjectId,
        expected_version: u64,
        changes: ChangeSet,
    ) -> StoreResult<u64> {
        self.inner.commit(project_id, expected_version, changes).await
    }
}

#[tokio::test]
async fn test_create_and_query_hierarchy() {
    let (_store, manager, project_id) = setup().await;

    manager
        .create_task(new_task(project_id, "4", None, 0.0))
        .await
        .unwrap();
    manager
        .create_task(new_task(project_id, "4.3", Some("4"), 10.0))
        .await
        .unwrap();
    manager
        .create_task(new_task(project_id, "4.1", Some("4"), 10.0))
        .await
        .unwrap();
    let created = manager
        .create_task(new_task(project_id, "4.3.2", Some("4.3"), 5.0))
        .await
        .unwrap();
    assert_eq!(created.status, WbsTaskStatus::NotStarted);

    let children: Vec<String> = manager
        .get_children("4")
        .await
        .unwrap()
        .into_iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(children, vec!["4.1", "4.3"]);

    let hierarchy = manager.get_hierarchy(project_id).await.unwrap();
    assert_eq!(hierarchy.node_count(), 4);
    assert_eq!(hierarchy.find("4.3.2").unwrap().level, 2);

    let details = manager.get_task("4").await.unwrap();
    assert_eq!(details.children, vec!["4.1", "4.3"]);
    assert!(details.prerequisites.is_empty());

    let listed = manager
        .list_tasks(project_id, &TaskFilter::default())
        .await
        .unwrap();
    let ids: Vec<&str> = listed.iter().map(|task| task.id.as_str()).collect();
    assert_eq!(ids, vec!["4", "4.1", "4.3", "4.3.2"]);
}

#[tokio::test]
async fn test_create_rejections() {
    let (_store, manager, project_id) = setup().await;
    manager
        .create_task(new_task(project_id, "1", None, 10.0))
        .await
        .unwrap();

    let duplicate = manager
        .create_task(new_task(project_id, "1", None, 10.0))
        .await
        .unwrap_err();
    assert_eq!(duplicate.kind(), ErrorKind::Conflict);

    let missing_parent = manager
        .create_task(new_task(project_id, "2", Some("9"), 10.0))
        .await
        .unwrap_err();
    assert_eq!(missing_parent.kind(), ErrorKind::NotFound);

    let mut missing_prereq = new_task(project_id, "3", None, 10.0);
    missing_prereq.dependencies = vec!["ghost".to_string()];
    assert_eq!(
        manager.create_task(missing_prereq).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );

    let unknown_project = manager
        .create_task(new_task(uuid::Uuid::new_v4(), "4", None, 10.0))
        .await
        .unwrap_err();
    assert_eq!(unknown_project.kind(), ErrorKind::NotFound);

    let mut nameless = new_task(project_id, "5", None, 10.0);
    nameless.name_en = "  ".to_string();
    assert_eq!(
        manager.create_task(nameless).await.unwrap_err().kind(),
        ErrorKind::Validation
    );

    let heavy = new_task(project_id, "6", None, 150.0);
    assert_eq!(
        manager.create_task(heavy).await.unwrap_err().kind(),
        ErrorKind::Validation
    );

    let long_id = new_task(project_id, &"x".repeat(51), None, 1.0);
    assert_eq!(
        manager.create_task(long_id).await.unwrap_err().kind(),
        ErrorKind::Validation
    );

    // Nothing but the first task was written
    assert_eq!(
        manager
            .list_tasks(project_id, &TaskFilter::default())
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_create_with_initial_dependencies() {
    let (_store, manager, project_id) = setup().await;
    manager
        .create_task(new_task(project_id, "A", None, 10.0))
        .await
        .unwrap();

    let mut spec = new_task(project_id, "B", None, 10.0);
    spec.dependencies = vec!["A".to_string(), "A".to_string()];
    manager.create_task(spec).await.unwrap();

    let details = manager.get_task("B").await.unwrap();
    assert_eq!(details.prerequisites.len(), 1);
    assert_eq!(details.prerequisites[0].prerequisite_id, "A");
    assert_eq!(
        details.prerequisites[0].dependency_type,
        DependencyType::FinishToStart
    );
    assert!(!manager.can_start("B").await.unwrap());
}

#[tokio::test]
async fn test_reverse_dependency_rejected() {
    let (_store, manager, project_id) = setup().await;
    for id in ["A", "B"] {
        manager
            .create_task(new_task(project_id, id, None, 10.0))
            .await
            .unwrap();
    }

    manager
        .add_dependency("A", "B", DependencyType::FinishToStart)
        .await
        .unwrap();
    let err = manager
        .add_dependency("B", "A", DependencyType::FinishToStart)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let self_edge = manager
        .add_dependency("A", "A", DependencyType::FinishToStart)
        .await
        .unwrap_err();
    assert_eq!(self_edge.kind(), ErrorKind::Validation);

    let b = manager.get_task("B").await.unwrap();
    assert!(b.prerequisites.is_empty());
    assert_eq!(b.dependents.len(), 1);
    assert!(
        manager
            .validate_integrity(project_id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_remove_dependency_unblocks() {
    let (_store, manager, project_id) = setup().await;
    for id in ["A", "B"] {
        manager
            .create_task(new_task(project_id, id, None, 10.0))
            .await
            .unwrap();
    }
    manager
        .add_dependency("B", "A", DependencyType::StartToStart)
        .await
        .unwrap();
    assert!(!manager.can_start("B").await.unwrap());

    manager.remove_dependency("B", "A").await.unwrap();
    assert!(manager.can_start("B").await.unwrap());

    let err = manager.remove_dependency("B", "A").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_status_lifecycle_and_readiness() {
    let (_store, manager, project_id) = setup().await;
    manager
        .create_task(new_task(project_id, "A", None, 30.0))
        .await
        .unwrap();
    manager
        .create_task(new_task(project_id, "B", None, 20.0))
        .await
        .unwrap();
    let mut c = new_task(project_id, "C", None, 50.0);
    c.dependencies = vec!["B".to_string()];
    manager.create_task(c).await.unwrap();

    manager
        .set_status("A", WbsTaskStatus::InProgress)
        .await
        .unwrap();
    let a = manager
        .set_status("A", WbsTaskStatus::Completed)
        .await
        .unwrap();
    assert!(a.actual_start.is_some());
    assert!(a.actual_end.is_some());
    manager
        .set_status("B", WbsTaskStatus::InProgress)
        .await
        .unwrap();

    let progress = manager.project_progress(project_id).await.unwrap();
    assert_eq!(progress.percentage, 30.0);
    assert!(!manager.can_start("C").await.unwrap());
    assert!(manager.ready_to_start(project_id).await.unwrap().is_empty());

    let blocked = manager
        .set_status("C", WbsTaskStatus::InProgress)
        .await
        .unwrap_err();
    assert_eq!(blocked.kind(), ErrorKind::Conflict);
    assert_eq!(
        manager.get_task("C").await.unwrap().task.status,
        WbsTaskStatus::NotStarted
    );

    manager
        .set_status("B", WbsTaskStatus::Completed)
        .await
        .unwrap();
    assert!(manager.can_start("C").await.unwrap());
    let ready: Vec<String> = manager
        .ready_to_start(project_id)
        .await
        .unwrap()
        .into_iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(ready, vec!["C"]);

    manager
        .set_status("C", WbsTaskStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(
        manager.project_progress(project_id).await.unwrap().percentage,
        50.0
    );
}

#[tokio::test]
async fn test_illegal_transitions_and_same_status() {
    let (_store, manager, project_id) = setup().await;
    manager
        .create_task(new_task(project_id, "A", None, 10.0))
        .await
        .unwrap();

    let err = manager
        .set_status("A", WbsTaskStatus::Completed)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let unchanged = manager
        .set_status("A", WbsTaskStatus::NotStarted)
        .await
        .unwrap();
    assert_eq!(unchanged.status, WbsTaskStatus::NotStarted);

    manager.set_status("A", WbsTaskStatus::OnHold).await.unwrap();
    manager
        .set_status("A", WbsTaskStatus::InProgress)
        .await
        .unwrap();
    manager
        .set_status("A", WbsTaskStatus::Completed)
        .await
        .unwrap();
    assert_eq!(
        manager
            .set_status("A", WbsTaskStatus::InProgress)
            .await
            .unwrap_err()
            .kind(),
        ErrorKind::Conflict
    );

    let missing = manager
        .set_status("nope", WbsTaskStatus::InProgress)
        .await
        .unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_enforcement_can_be_disabled() {
    let store = Arc::new(InMemoryTaskStore::new());
    let project_id = uuid::Uuid::new_v4();
    store.register_project(project_id).await;
    let config = WbsManagerConfig {
        enforce_dependencies_on_start: false,
        ..Default::default()
    };
    let manager = WbsManager::new(store, config);

    manager
        .create_task(new_task(project_id, "A", None, 10.0))
        .await
        .unwrap();
    let mut b = new_task(project_id, "B", None, 10.0);
    b.dependencies = vec!["A".to_string()];
    manager.create_task(b).await.unwrap();

    let started = manager
        .set_status("B", WbsTaskStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(started.status, WbsTaskStatus::InProgress);
}

#[tokio::test]
async fn test_update_task_fields_and_status() {
    let (_store, manager, project_id) = setup().await;
    manager
        .create_task(new_task(project_id, "A", None, 10.0))
        .await
        .unwrap();

    let updated = manager
        .update_task(
            "A",
            TaskUpdate {
                name_en: Some("Cable tray".to_string()),
                weight_percent: Some(25.0),
                installation_area: Some("Level 2".to_string()),
                status: Some(WbsTaskStatus::InProgress),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name_en, "Cable tray");
    assert_eq!(updated.name_th, "งาน A");
    assert_eq!(updated.weight_percent, 25.0);
    assert_eq!(updated.status, WbsTaskStatus::InProgress);
    assert!(updated.actual_start.is_some());

    let illegal = manager
        .update_task(
            "A",
            TaskUpdate {
                status: Some(WbsTaskStatus::NotStarted),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(illegal.kind(), ErrorKind::Conflict);

    let invalid = manager
        .update_task(
            "A",
            TaskUpdate {
                weight_percent: Some(-1.0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(invalid.kind(), ErrorKind::Validation);

    let filtered = manager
        .list_tasks(
            project_id,
            &TaskFilter {
                installation_area: Some("Level 2".to_string()),
                status: Some(WbsTaskStatus::InProgress),
            },
        )
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
}

#[tokio::test]
async fn test_delete_cascades_and_refuses_parents() {
    let (_store, manager, project_id) = setup().await;
    manager
        .create_task(new_task(project_id, "1", None, 0.0))
        .await
        .unwrap();
    manager
        .create_task(new_task(project_id, "1.1", Some("1"), 10.0))
        .await
        .unwrap();
    let mut second = new_task(project_id, "1.2", Some("1"), 10.0);
    second.dependencies = vec!["1.1".to_string()];
    manager.create_task(second).await.unwrap();
    manager
        .add_evidence(
            "1.1",
            NewEvidence {
                evidence_type: "photo".to_string(),
                location: "https://files.example.com/1.1.jpg".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = manager.delete_task("1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let deleted = manager.delete_task("1.1").await.unwrap();
    assert_eq!(deleted.removed_edges, 1);
    assert_eq!(deleted.removed_evidence, 1);

    assert_eq!(
        manager.get_task("1.1").await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert!(manager.can_start("1.2").await.unwrap());
    assert!(
        manager
            .validate_integrity(project_id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_evidence_listing_and_validation() {
    let (_store, manager, project_id) = setup().await;
    manager
        .create_task(new_task(project_id, "A", None, 10.0))
        .await
        .unwrap();

    for name in ["before.jpg", "after.jpg"] {
        manager
            .add_evidence(
                "A",
                NewEvidence {
                    evidence_type: "photo".to_string(),
                    location: format!("uploads/{}", name),
                    file_name: Some(name.to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    let evidence = manager.list_evidence("A").await.unwrap();
    assert_eq!(evidence.len(), 2);
    assert!(evidence[0].created_at >= evidence[1].created_at);

    let missing_location = manager
        .add_evidence(
            "A",
            NewEvidence {
                evidence_type: "photo".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(missing_location.kind(), ErrorKind::Validation);

    let unknown_task = manager
        .add_evidence(
            "Z",
            NewEvidence {
                evidence_type: "photo".to_string(),
                location: "uploads/z.jpg".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(unknown_task.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_critical_path_through_manager() {
    let (_store, manager, project_id) = setup().await;
    let mut a = new_task(project_id, "A", None, 10.0);
    a.estimated_duration_hours = Some(16);
    manager.create_task(a).await.unwrap();

    let mut b = new_task(project_id, "B", None, 10.0);
    b.estimated_duration_hours = Some(24);
    b.dependencies = vec!["A".to_string()];
    manager.create_task(b).await.unwrap();

    // No estimate: falls back to the configured default of 8 hours
    manager
        .create_task(new_task(project_id, "C", None, 10.0))
        .await
        .unwrap();

    let result = manager.critical_path(project_id).await.unwrap();
    assert_eq!(result.project_duration_hours, 40);
    assert_eq!(result.path, vec!["A", "B"]);
    assert_eq!(result.schedule_for("C").unwrap().slack, 32);
}

#[tokio::test]
async fn test_events_emitted_after_commit() {
    let store = Arc::new(InMemoryTaskStore::new());
    let project_id = uuid::Uuid::new_v4();
    store.register_project(project_id).await;
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut manager = WbsManager::new(store, WbsManagerConfig::default());
    manager.add_event_handler(Box::new(RecordingHandler {
        events: events.clone(),
    }));

    manager
        .create_task(new_task(project_id, "A", None, 10.0))
        .await
        .unwrap();
    manager
        .set_status("A", WbsTaskStatus::InProgress)
        .await
        .unwrap();
    // Rejected mutations emit nothing
    let _ = manager.set_status("A", WbsTaskStatus::NotStarted).await;
    manager.delete_task("A").await.unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        vec!["created:A", "status:A:InProgress", "deleted:A"]
    );
}

#[tokio::test]
async fn test_concurrent_writer_causes_version_conflict() {
    let inner = InMemoryTaskStore::new();
    let project_id = uuid::Uuid::new_v4();
    inner.register_project(project_id).await;
    let store = Arc::new(ContendedStore {
        inner,
        interfered: AtomicBool::new(false),
    });
    let manager = WbsManager::new(store.clone(), WbsManagerConfig::default());

    let err = manager
        .create_task(new_task(project_id, "A", None, 10.0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert!(matches!(
        err,
        WbsError::Persistence(StoreError::VersionConflict { .. })
    ));

    // The concurrent write survived; the rejected one left no trace
    assert_eq!(store.locate_task("other").await.unwrap(), Some(project_id));
    assert_eq!(store.locate_task("A").await.unwrap(), None);

    // A retry against the fresh snapshot succeeds
    manager
        .create_task(new_task(project_id, "A", None, 10.0))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_integrity_reports_stored_anomalies() {
    let project_id = uuid::Uuid::new_v4();
    let store = Arc::new(InMemoryTaskStore::new());
    store.register_project(project_id).await;

    let orphan = WbsTask::from_new(&new_task(project_id, "D", Some("X"), 10.0));
    let a = WbsTask::from_new(&new_task(project_id, "A", None, 10.0));
    let b = WbsTask::from_new(&new_task(project_id, "B", None, 10.0));
    store
        .commit(
            project_id,
            0,
            ChangeSet {
                upsert_tasks: vec![orphan, a, b],
                insert_edges: vec![
                    DependencyEdge::new("A", "B", DependencyType::FinishToStart),
                    DependencyEdge::new("B", "A", DependencyType::FinishToStart),
                ],
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let manager = WbsManager::new(store, WbsManagerConfig::default());

    let hierarchy = manager.get_hierarchy(project_id).await.unwrap();
    assert_eq!(hierarchy.roots.len(), 3);
    assert_eq!(hierarchy.diagnostics.len(), 1);

    let issues = manager.validate_integrity(project_id).await.unwrap();
    assert!(issues.iter().any(|issue| issue.contains("non-existent parent X")));
    assert!(issues.iter().any(|issue| issue.starts_with("Dependency cycle")));

    let err = manager.critical_path(project_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_concurrent_creates_of_same_id_in_two_projects() {
    let inner = InMemoryTaskStore::new();
    let first = uuid::Uuid::new_v4();
    let second = uuid::Uuid::new_v4();
    inner.register_project(first).await;
    inner.register_project(second).await;
    let store = Arc::new(RendezvousStore {
        inner,
        barrier: Barrier::new(2),
    });
    let manager = WbsManager::new(store.clone(), WbsManagerConfig::default());

    // Both creations pass the lookup before either commits
    let (r1, r2) = tokio::join!(
        manager.create_task(new_task(first, "1.1", None, 10.0)),
        manager.create_task(new_task(second, "1.1", None, 10.0)),
    );

    let outcomes = [r1, r2];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    let err = outcomes
        .iter()
        .find_map(|r| r.as_ref().err())
        .expect("one creation must be rejected");
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let mut stored = 0;
    for project_id in [first, second] {
        stored += store
            .inner
            .load_project(project_id)
            .await
            .unwrap()
            .tasks
            .iter()
            .filter(|task| task.id == "1.1")
            .count();
    }
    assert_eq!(stored, 1);
}
