use std::time::Duration;

use flink_sql_orchestrator::config::OrchestratorConfig;
use flink_sql_orchestrator::gateway::GatewayClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(base_url: &str) -> OrchestratorConfig {
    let mut config = OrchestratorConfig::default();
    config.gateway_url = base_url.to_string();
    config.result_fetch_delay = Duration::from_millis(5);
    config.operation_poll_deadline = Duration::from_secs(5);
    config
}

#[tokio::test]
async fn execute_many_on_empty_sql_makes_no_http_calls() {
    // Base URL deliberately points nowhere reachable: any HTTP attempt would
    // fail the test via a transport error surfacing in the results.
    let config = config_for("http://127.0.0.1:1");
    let client = GatewayClient::new(&config).unwrap();
    let session = flink_sql_orchestrator::gateway::Session {
        handle: "unused".to_string(),
    };

    let results = client.execute_many(&session, "   \n  ", true).await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn creates_and_closes_a_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/sessions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"sessionHandle": "s-1"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1/sessions/s-1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = GatewayClient::new(&config_for(&server.uri())).unwrap();
    let session = client
        .create_session(Default::default())
        .await
        .expect("session create");
    assert_eq!(session.handle, "s-1");

    client.close_session(&session).await.expect("session close");
}

#[tokio::test]
async fn closing_an_already_gone_session_is_success() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/sessions/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = GatewayClient::new(&config_for(&server.uri())).unwrap();
    let session = flink_sql_orchestrator::gateway::Session {
        handle: "ghost".to_string(),
    };
    client.close_session(&session).await.expect("404 treated as success");
}

#[tokio::test]
async fn drains_paginated_results_until_eos() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/sessions/s-1/operations/op-1/result/0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": {
                "columns": [{"name": "id"}],
                "data": [{"kind": "INSERT", "fields": [1]}]
            },
            "resultType": "PAYLOAD",
            "isQueryResult": true,
            "resultKind": "SUCCESS_WITH_CONTENT",
            "jobID": "job-abc",
            "nextResultUri": "/v1/sessions/s-1/operations/op-1/result/1?rowFormat=JSON"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/sessions/s-1/operations/op-1/result/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": {
                "columns": [],
                "data": [{"kind": "INSERT", "fields": [2]}]
            },
            "resultType": "EOS",
            "isQueryResult": true,
            "resultKind": "SUCCESS_WITH_CONTENT",
            "jobID": "job-abc"
        })))
        .mount(&server)
        .await;

    let client = GatewayClient::new(&config_for(&server.uri())).unwrap();
    let session = flink_sql_orchestrator::gateway::Session {
        handle: "s-1".to_string(),
    };

    let page = client
        .fetch_results(&session, "op-1")
        .await
        .expect("fetch results");

    assert_eq!(page.rows.len(), 2);
    assert_eq!(page.columns.len(), 1);
    assert_eq!(page.job_id.as_deref(), Some("job-abc"));
}

#[tokio::test]
async fn stops_after_repeated_empty_pages_with_no_rows() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/sessions/s-1/operations/op-empty/result/0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": {"columns": [], "data": []},
            "resultType": "NOT_READY",
            "nextResultUri": "/v1/sessions/s-1/operations/op-empty/result/0?rowFormat=JSON"
        })))
        .mount(&server)
        .await;

    let client = GatewayClient::new(&config_for(&server.uri())).unwrap();
    let session = flink_sql_orchestrator::gateway::Session {
        handle: "s-1".to_string(),
    };

    let page = client
        .fetch_results(&session, "op-empty")
        .await
        .expect("fetch results does not error on empty set");
    assert!(page.rows.is_empty());
}
