use std::sync::Arc;
use std::time::Duration;

use flink_sql_orchestrator::config::OrchestratorConfig;
use flink_sql_orchestrator::orchestrator::{Orchestrator, PauseOptions};
use flink_sql_orchestrator::store::Store;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn orchestrator(cluster_url: &str) -> Orchestrator {
    let mut config = OrchestratorConfig::default();
    config.cluster_url = cluster_url.to_string();
    config.gateway_url = "http://unused.invalid".to_string();
    config.snapshot_poll_interval = Duration::from_millis(5);
    config.snapshot_poll_deadline = Duration::from_secs(2);

    let store = Arc::new(Store::connect_in_memory().await.unwrap());
    Orchestrator::new(config, store).unwrap()
}

#[tokio::test]
async fn pause_happy_path_records_completed_snapshot_and_cancels_job() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jid": "job-1",
            "name": "demo",
            "state": "RUNNING",
            "execution-config": {}
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/jobs/job-1/snapshots"))
        .respond_with(
            ResponseTemplate::new(202).set_body_json(serde_json::json!({"request-id": "req-1"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/jobs/job-1/snapshots/req-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": {"id": "COMPLETED"},
            "operation": {"location": "s3://savepoints/job-1/sp-1"}
        })))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/jobs/job-1"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let orchestrator = orchestrator(&server.uri()).await;
    orchestrator
        .pause("job-1", PauseOptions::default())
        .await
        .expect("pause succeeds");
}

#[tokio::test]
async fn pause_rejects_a_job_that_is_not_pausable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jid": "job-1",
            "name": "demo",
            "state": "FINISHED",
            "execution-config": {}
        })))
        .mount(&server)
        .await;

    let orchestrator = orchestrator(&server.uri()).await;
    let err = orchestrator
        .pause("job-1", PauseOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, flink_sql_orchestrator::Error::Precondition(_)));
}

#[tokio::test]
async fn pause_fails_job_missing_from_cluster() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let orchestrator = orchestrator(&server.uri()).await;
    let err = orchestrator
        .pause("ghost", PauseOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, flink_sql_orchestrator::Error::Precondition(_)));
}

#[tokio::test]
async fn pause_marks_snapshot_failed_when_cluster_reports_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jid": "job-1",
            "name": "demo",
            "state": "RUNNING",
            "execution-config": {}
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/jobs/job-1/snapshots"))
        .respond_with(
            ResponseTemplate::new(202).set_body_json(serde_json::json!({"request-id": "req-1"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/jobs/job-1/snapshots/req-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": {"id": "FAILED"},
            "operation": {"failure-cause": {"message": "disk full"}}
        })))
        .mount(&server)
        .await;

    let orchestrator = orchestrator(&server.uri()).await;
    let err = orchestrator
        .pause("job-1", PauseOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, flink_sql_orchestrator::Error::SnapshotFailed { .. }));
}
