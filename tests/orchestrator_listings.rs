use std::sync::Arc;

use flink_sql_orchestrator::config::OrchestratorConfig;
use flink_sql_orchestrator::domain::{JobState, SnapshotStatus, SnapshotType};
use flink_sql_orchestrator::orchestrator::Orchestrator;
use flink_sql_orchestrator::store::{SnapshotStatusPatch, Store};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn orchestrator(cluster_url: &str) -> (Orchestrator, Arc<Store>) {
    let mut config = OrchestratorConfig::default();
    config.cluster_url = cluster_url.to_string();
    config.gateway_url = "http://unused.invalid".to_string();

    let store = Arc::new(Store::connect_in_memory().await.unwrap());
    let orchestrator = Orchestrator::new(config, store.clone()).unwrap();
    (orchestrator, store)
}

#[tokio::test]
async fn list_pausable_returns_only_running_jobs() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jobs": [{"id": "job-1", "status": "RUNNING"}, {"id": "job-2", "status": "FINISHED"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/jobs/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jid": "job-1", "name": "a", "state": "RUNNING", "execution-config": {}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/jobs/job-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jid": "job-2", "name": "b", "state": "FINISHED", "execution-config": {}
        })))
        .mount(&server)
        .await;

    let (orchestrator, _store) = orchestrator(&server.uri()).await;
    let pausable = orchestrator.list_pausable().await.unwrap();
    assert_eq!(pausable.len(), 1);
    assert_eq!(pausable[0].id, "job-1");
}

#[tokio::test]
async fn list_resumable_excludes_still_running_jobs() {
    let server = MockServer::start().await;
    let (orchestrator, store) = orchestrator(&server.uri()).await;

    store
        .record_snapshot(
            "job-done",
            Some("demo"),
            SnapshotType::Manual,
            SnapshotStatus::Completed,
            "s3://savepoints/job-done/sp-1",
            None,
            &serde_json::json!({}),
        )
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/jobs/job-done"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let resumable = orchestrator.list_resumable().await.unwrap();
    assert_eq!(resumable.len(), 1);
    assert_eq!(resumable[0].cluster_state, JobState::NotFound);
}

#[tokio::test]
async fn list_active_snapshots_enriches_with_cluster_status_when_request_id_present() {
    let server = MockServer::start().await;
    let (orchestrator, store) = orchestrator(&server.uri()).await;

    let id = store
        .create_snapshot_record("job-1", Some("demo"), SnapshotType::Pause)
        .await
        .unwrap();
    store
        .update_snapshot_status(
            id,
            SnapshotStatus::InProgress,
            SnapshotStatusPatch {
                request_id: Some("req-1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/jobs/job-1/snapshots/req-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": {"id": "IN_PROGRESS"}
        })))
        .mount(&server)
        .await;

    let active = orchestrator.list_active_snapshots().await.unwrap();
    assert_eq!(active.len(), 1);
    assert!(active[0].cluster_status.is_some());
    assert_eq!(active[0].active.snapshot.id, id);
}
