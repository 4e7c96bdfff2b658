use flink_sql_orchestrator::cluster::ClusterClient;
use flink_sql_orchestrator::config::OrchestratorConfig;
use flink_sql_orchestrator::domain::JobState;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(base_url: &str) -> OrchestratorConfig {
    let mut config = OrchestratorConfig::default();
    config.cluster_url = base_url.to_string();
    config
}

#[tokio::test]
async fn lists_jobs_with_full_details() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jobs": [{"id": "job-1", "status": "RUNNING"}]
        })))
        .mount(&server)
        .await;

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

    let client = ClusterClient::new(&config_for(&server.uri())).unwrap();
    let jobs = client.list_jobs().await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].state, JobState::Running);
    assert_eq!(jobs[0].name.as_deref(), Some("demo"));
}

#[tokio::test]
async fn job_details_returns_none_on_404() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = ClusterClient::new(&config_for(&server.uri())).unwrap();
    let details = client.job_details("missing").await.unwrap();
    assert!(details.is_none());
}

#[tokio::test]
async fn trigger_and_poll_snapshot_to_completion() {
    let server = MockServer::start().await;

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

    let client = ClusterClient::new(&config_for(&server.uri())).unwrap();
    let request_id = client.trigger_snapshot("job-1", None).await.unwrap();
    assert_eq!(request_id, "req-1");

    let status = client.snapshot_status("job-1", &request_id).await.unwrap();
    assert_eq!(
        status.location.as_deref(),
        Some("s3://savepoints/job-1/sp-1")
    );
}

#[tokio::test]
async fn cancel_job_reports_success_on_202() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/jobs/job-1"))
        .and(body_json(serde_json::json!({"mode": "cancel"})))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let client = ClusterClient::new(&config_for(&server.uri())).unwrap();
    assert!(client.cancel_job("job-1").await.unwrap());
}
