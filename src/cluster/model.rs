//! Wire types for the Flink Job REST API.

use serde::Deserialize;
use serde_json::Value as Json;

use crate::domain::JobState;

/// Summary view of a job, as returned by `/jobs` and enriched by `/jobs/{id}`.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    pub id: String,
    pub state: JobState,
    pub name: Option<String>,
    pub savepoint_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct JobsOverviewResponse {
    #[serde(default)]
    pub jobs: Vec<JobOverviewEntry>,
}

#[derive(Debug, Deserialize)]
pub(super) struct JobOverviewEntry {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct JobDetailsResponse {
    #[serde(default)]
    pub jid: Option<String>,
    pub name: Option<String>,
    pub state: String,
    #[serde(rename = "execution-config")]
    pub execution_config: Option<Json>,
}

impl JobDetailsResponse {
    pub(super) fn savepoint_path(&self) -> Option<String> {
        self.execution_config
            .as_ref()?
            .get("execution.savepoint.path")?
            .as_str()
            .map(|s| s.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct TriggerSnapshotResponse {
    #[serde(rename = "request-id")]
    pub request_id: String,
}

/// Outcome of polling a snapshot (savepoint/checkpoint) request.
#[derive(Debug, Clone)]
pub struct SnapshotStatus {
    pub status: SnapshotRequestState,
    pub location: Option<String>,
    pub failure_cause: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotRequestState {
    InProgress,
    Completed,
    Failed,
}

impl SnapshotRequestState {
    pub(super) fn parse(raw: &str) -> Self {
        match raw {
            "COMPLETED" => Self::Completed,
            "FAILED" => Self::Failed,
            _ => Self::InProgress,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SnapshotStatusResponse {
    pub status: SnapshotStatusInner,
    pub operation: Option<SnapshotOperationInner>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SnapshotStatusInner {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct SnapshotOperationInner {
    pub location: Option<String>,
    #[serde(rename = "failure-cause")]
    pub failure_cause: Option<Json>,
}

impl SnapshotOperationInner {
    pub(super) fn failure_cause_message(&self) -> Option<String> {
        self.failure_cause
            .as_ref()
            .and_then(|v| v.get("stack-trace").or_else(|| v.get("message")))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}
