use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, instrument, warn};

use crate::config::OrchestratorConfig;
use crate::domain::{OperationStatus, ResultType};
use crate::error::{Error, GatewayTransportError, Result};
use crate::splitter;

use super::model::{
    CreateSessionRequest, CreateSessionResponse, OperationStatusResponse, ResultFetchResponse,
    ResultPage, Session, StatementResult, SubmitStatementRequest, SubmitStatementResponse,
    parse_operation_status, parse_result_type,
};

const DEFAULT_SESSION_PROPERTIES_MODE_KEY: &str = "execution.runtime-mode";
const DEFAULT_SESSION_PROPERTIES_MODE_VALUE: &str = "streaming";
const MIN_RESULT_FETCH_ATTEMPT_CAP: u32 = 20;
const EMPTY_RESPONSE_CUTOFF: u32 = 5;

/// Client for the Flink SQL Gateway's REST API (C1).
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    call_timeout: Duration,
    result_fetch_delay: Duration,
    result_fetch_attempt_cap: u32,
    operation_poll_deadline: Duration,
}

impl GatewayClient {
    pub fn new(config: &OrchestratorConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.gateway_call_timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build gateway HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.gateway_url.clone(),
            call_timeout: config.gateway_call_timeout,
            result_fetch_delay: config.result_fetch_delay,
            result_fetch_attempt_cap: config
                .result_fetch_attempt_cap
                .max(MIN_RESULT_FETCH_ATTEMPT_CAP),
            operation_poll_deadline: config.operation_poll_deadline,
        })
    }

    /// Open a new session. `properties` are merged over the default of
    /// `execution.runtime-mode = streaming`; caller-supplied keys win.
    #[instrument(skip(self, properties))]
    pub async fn create_session(&self, properties: HashMap<String, String>) -> Result<Session> {
        let mut merged = HashMap::new();
        merged.insert(
            DEFAULT_SESSION_PROPERTIES_MODE_KEY.to_string(),
            DEFAULT_SESSION_PROPERTIES_MODE_VALUE.to_string(),
        );
        merged.extend(properties);

        let resp = self
            .http
            .post(format!("{}/v1/sessions", self.base_url))
            .json(&CreateSessionRequest { properties: merged })
            .send()
            .await
            .map_err(GatewayTransportError::from)?;

        if !resp.status().is_success() {
            return Err(Error::session(format!(
                "session create failed with status {}",
                resp.status()
            )));
        }

        let body: CreateSessionResponse = resp
            .json()
            .await
            .map_err(|e| Error::session(format!("malformed session response: {e}")))?;

        Ok(Session {
            handle: body.session_handle,
        })
    }

    /// Close a session. HTTP 404 (already gone) is treated as success.
    #[instrument(skip(self))]
    pub async fn close_session(&self, session: &Session) -> Result<()> {
        let resp = self
            .http
            .delete(format!("{}/v1/sessions/{}", self.base_url, session.handle))
            .send()
            .await
            .map_err(GatewayTransportError::from)?;

        if resp.status().is_success() || resp.status().as_u16() == 404 {
            return Ok(());
        }

        Err(Error::session(format!(
            "session close failed with status {}",
            resp.status()
        )))
    }

    /// Submit one statement, returning its operation handle.
    #[instrument(skip(self, sql_text))]
    pub async fn submit(&self, session: &Session, sql_text: &str) -> Result<String> {
        let resp = self
            .http
            .post(format!(
                "{}/v1/sessions/{}/statements",
                self.base_url, session.handle
            ))
            .json(&SubmitStatementRequest { statement: sql_text })
            .send()
            .await
            .map_err(GatewayTransportError::from)?;

        if !resp.status().is_success() {
            return Err(Error::submit(format!(
                "statement rejected with status {}",
                resp.status()
            )));
        }

        let body: SubmitStatementResponse = resp
            .json()
            .await
            .map_err(|e| Error::submit(format!("malformed submit response: {e}")))?;

        body.operation_handle
            .ok_or_else(|| Error::submit("gateway returned no operation handle"))
    }

    /// Fetch the current status of a submitted operation, along with the
    /// status envelope's own `errorMessage`, if the gateway set one.
    #[instrument(skip(self))]
    pub async fn poll_status(
        &self,
        session: &Session,
        operation: &str,
    ) -> Result<(OperationStatus, Option<String>)> {
        let resp = self
            .http
            .get(format!(
                "{}/v1/sessions/{}/operations/{}/status",
                self.base_url, session.handle, operation
            ))
            .send()
            .await
            .map_err(GatewayTransportError::from)?;

        if !resp.status().is_success() {
            return Err(Error::submit(format!(
                "status poll failed with status {}",
                resp.status()
            )));
        }

        let body: OperationStatusResponse = resp
            .json()
            .await
            .map_err(|e| Error::submit(format!("malformed status response: {e}")))?;

        Ok((parse_operation_status(&body.status), body.error_message))
    }

    /// Poll `operation` to a terminal status, bounded by
    /// `operation_poll_deadline`. On timeout, reports failure without
    /// attempting cancellation. The second element is the status envelope's
    /// `errorMessage`, surfaced for `ERROR` terminals when the gateway set one.
    #[instrument(skip(self))]
    pub async fn wait_for_terminal(
        &self,
        session: &Session,
        operation: &str,
    ) -> Result<(OperationStatus, Option<String>)> {
        let started = Instant::now();
        loop {
            let (status, error_message) = self.poll_status(session, operation).await?;
            if status.is_terminal() {
                return Ok((status, error_message));
            }
            if started.elapsed() >= self.operation_poll_deadline {
                return Err(Error::OperationTimeout {
                    elapsed_secs: started.elapsed().as_secs(),
                });
            }
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
    }

    /// Drain all result pages for `operation` following the pagination
    /// protocol: accumulate until `EOS`, an absent `nextResultUri`, or the
    /// attempt cap is reached.
    #[instrument(skip(self))]
    pub async fn fetch_results(&self, session: &Session, operation: &str) -> Result<ResultPage> {
        let mut uri = format!(
            "{}/v1/sessions/{}/operations/{}/result/0?rowFormat=JSON",
            self.base_url, session.handle, operation
        );

        let mut accumulated = ResultPage::default();
        let mut attempts = 0u32;
        let mut consecutive_empty = 0u32;
        let mut first_fetch = true;

        loop {
            if attempts >= self.result_fetch_attempt_cap {
                warn!(operation, attempts, "result fetch attempt cap reached");
                return Ok(accumulated);
            }
            attempts += 1;

            let resp = self
                .http
                .get(&uri)
                .send()
                .await
                .map_err(GatewayTransportError::from)?;

            if !resp.status().is_success() {
                if first_fetch {
                    debug!(operation, status = %resp.status(), "no results on first fetch");
                    return Ok(accumulated);
                }
                return Ok(accumulated);
            }
            first_fetch = false;

            let body: ResultFetchResponse = resp
                .json()
                .await
                .map_err(|e| Error::submit(format!("malformed result page: {e}")))?;

            if let Some(errors) = &body.errors {
                if let Some(first) = errors.first() {
                    return Err(Error::submit(format!("result page reported error: {first}")));
                }
            }

            if accumulated.columns.is_empty() && !body.results.columns.is_empty() {
                accumulated.columns = body.results.columns.clone();
            }
            accumulated.is_query_result = body.is_query_result;
            accumulated.result_kind = body.result_kind.clone();
            if body.job_id.is_some() {
                accumulated.job_id = body.job_id.clone();
            }

            let page_empty = body.results.data.is_empty();
            accumulated.rows.extend(body.results.data);

            let result_type = parse_result_type(&body.result_type);

            if result_type == ResultType::Eos {
                return Ok(accumulated);
            }

            let Some(next_uri) = body.next_result_uri else {
                return Ok(accumulated);
            };

            if page_empty {
                consecutive_empty += 1;
                if consecutive_empty >= EMPTY_RESPONSE_CUTOFF && accumulated.rows.is_empty() {
                    debug!(operation, "stopping after repeated empty pages");
                    return Ok(accumulated);
                }
            } else {
                consecutive_empty = 0;
            }

            if result_type == ResultType::NotReady || page_empty {
                tokio::time::sleep(self.result_fetch_delay).await;
            }

            uri = next_uri;
        }
    }

    /// On `ERROR`, fetch `result/0` once and surface the deepest enrichable
    /// message, falling back to the status envelope's own message.
    #[instrument(skip(self, fallback))]
    async fn enrich_error(&self, session: &Session, operation: &str, fallback: Option<String>) -> String {
        let uri = format!(
            "{}/v1/sessions/{}/operations/{}/result/0?rowFormat=JSON",
            self.base_url, session.handle, operation
        );

        let Ok(resp) = self.http.get(&uri).send().await else {
            return fallback.unwrap_or_else(|| "operation failed".to_string());
        };

        let Ok(text) = resp.text().await else {
            return fallback.unwrap_or_else(|| "operation failed".to_string());
        };

        deepest_cause(&text).unwrap_or_else(|| fallback.unwrap_or(text))
    }

    /// Submit and fully drain one statement, producing either a [`ResultPage`]
    /// or an enriched error message.
    #[instrument(skip(self, sql_text))]
    pub async fn execute_one(
        &self,
        session: &Session,
        sql_text: &str,
    ) -> std::result::Result<ResultPage, String> {
        let operation = match self.submit(session, sql_text).await {
            Ok(op) => op,
            Err(e) => return Err(e.to_string()),
        };

        let (status, error_message) = match self.wait_for_terminal(session, &operation).await {
            Ok(s) => s,
            Err(e) => return Err(e.to_string()),
        };

        match status {
            OperationStatus::Finished => match self.fetch_results(session, &operation).await {
                Ok(page) => Ok(page),
                Err(e) => Err(e.to_string()),
            },
            OperationStatus::Error => {
                let message = self.enrich_error(session, &operation, error_message).await;
                Err(message)
            }
            other => Err(format!("operation ended in unexpected state {other}")),
        }
    }

    /// Split `sql_text` via the statement splitter and run each statement
    /// against `session` in order, stopping early on the first failure
    /// unless `continue_on_error` is set.
    #[instrument(skip(self, sql_text))]
    pub async fn execute_many(
        &self,
        session: &Session,
        sql_text: &str,
        continue_on_error: bool,
    ) -> Vec<StatementResult> {
        let statements = splitter::split(sql_text);
        let mut results = Vec::with_capacity(statements.len());

        for statement in statements {
            let outcome = self.execute_one(session, &statement).await;
            let failed = outcome.is_err();
            results.push(StatementResult {
                statement,
                outcome,
            });
            if failed && !continue_on_error {
                break;
            }
        }

        results
    }
}

/// Walk a server error body for the deepest `Caused by:` line, Flink's usual
/// exception-chain rendering. Returns `None` if the body doesn't look like
/// one of those traces.
fn deepest_cause(body: &str) -> Option<String> {
    let mut deepest = None;
    for line in body.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("Caused by: ") {
            deepest = Some(rest.to_string());
        }
    }
    deepest.or_else(|| extract_json_error_message(body))
}

fn extract_json_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("errors")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .or_else(|| {
            value
                .get("errorMessage")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deepest_cause_picks_the_last_occurrence() {
        let body = "org.apache.flink.table.api.ValidationException: bad\n\
                     Caused by: java.lang.RuntimeException: outer\n\
                     Caused by: org.apache.flink.table.api.SqlParserException: near line 1";
        assert_eq!(
            deepest_cause(body).as_deref(),
            Some("org.apache.flink.table.api.SqlParserException: near line 1")
        );
    }

    #[test]
    fn deepest_cause_falls_back_to_json_error_message() {
        let body = r#"{"errors": ["table `t` does not exist"]}"#;
        assert_eq!(
            deepest_cause(body).as_deref(),
            Some("table `t` does not exist")
        );
    }
}
