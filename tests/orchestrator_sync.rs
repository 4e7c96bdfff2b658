use std::sync::Arc;

use flink_sql_orchestrator::config::OrchestratorConfig;
use flink_sql_orchestrator::domain::{SnapshotStatus, SnapshotType};
use flink_sql_orchestrator::orchestrator::Orchestrator;
use flink_sql_orchestrator::store::Store;
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
async fn sync_discovers_running_jobs_with_no_local_snapshot() {
    let server = MockServer::start().await;
    let (orchestrator, store) = orchestrator(&server.uri()).await;

    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jobs": [{"id": "job-new", "status": "RUNNING"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs/job-new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jid": "job-new", "name": "fresh", "state": "RUNNING", "execution-config": {}
        })))
        .mount(&server)
        .await;

    let report = orchestrator.sync().await.unwrap();
    assert_eq!(report.cluster_job_count, 1);
    assert_eq!(report.discovered_job_count, 1);
    assert_eq!(report.orphaned_job_count, 0);

    let latest = store
        .get_latest_for_job("job-new", chrono::Duration::minutes(5))
        .await
        .unwrap()
        .expect("sync recorded a JOB_START row");
    assert_eq!(latest.snapshot_type, SnapshotType::JobStart);
    assert_eq!(latest.snapshot_status, SnapshotStatus::Completed);
}

#[tokio::test]
async fn sync_marks_local_rows_as_not_found_when_the_job_has_disappeared_from_the_cluster() {
    let server = MockServer::start().await;
    let (orchestrator, store) = orchestrator(&server.uri()).await;

    let snapshot_id = store
        .record_snapshot(
            "job-gone",
            Some("demo"),
            SnapshotType::Manual,
            SnapshotStatus::Completed,
            "s3://savepoints/job-gone/sp-1",
            Some("SELECT 1;"),
            &serde_json::json!({}),
        )
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"jobs": []})))
        .mount(&server)
        .await;

    let report = orchestrator.sync().await.unwrap();
    assert_eq!(report.cluster_job_count, 0);
    assert_eq!(report.discovered_job_count, 0);
    assert_eq!(report.orphaned_job_count, 1);

    let snapshot = store.get_snapshot(snapshot_id).await.unwrap().unwrap();
    // the snapshot itself is left alone
    assert_eq!(snapshot.snapshot_status, SnapshotStatus::Completed);
    assert_eq!(snapshot.snapshot_path, "s3://savepoints/job-gone/sp-1");
    // but its job-status metadata is refreshed
    assert_eq!(
        snapshot.metadata.get("job_status").and_then(|v| v.as_str()),
        Some("NOT_FOUND")
    );
    assert!(snapshot.metadata.get("observed_at").is_some());
}
