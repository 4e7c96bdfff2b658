//! Wire types for the SQL Gateway REST surface.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::domain::{ChangeKind, OperationStatus, ResultType};

/// An open gateway session.
#[derive(Debug, Clone)]
pub struct Session {
    pub handle: String,
}

#[derive(Debug, Serialize)]
pub(super) struct CreateSessionRequest {
    pub properties: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateSessionResponse {
    #[serde(rename = "sessionHandle")]
    pub session_handle: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SubmitStatementRequest<'a> {
    pub statement: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct SubmitStatementResponse {
    #[serde(rename = "operationHandle")]
    pub operation_handle: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OperationStatusResponse {
    pub status: String,
    #[serde(rename = "errorMessage")]
    pub error_message: Option<String>,
}

/// One column descriptor in a result schema.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "logicalType")]
    pub logical_type: Option<Json>,
}

/// One row in a result page, tagged with its changelog kind.
#[derive(Debug, Clone, Deserialize)]
pub struct RowPayload {
    pub kind: ChangeKind,
    pub fields: Vec<Json>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub(super) struct ResultsBody {
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub data: Vec<RowPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ResultFetchResponse {
    #[serde(default)]
    pub results: ResultsBody,
    #[serde(rename = "resultType")]
    pub result_type: String,
    #[serde(rename = "isQueryResult", default)]
    pub is_query_result: bool,
    #[serde(rename = "resultKind")]
    pub result_kind: Option<String>,
    #[serde(rename = "jobID")]
    pub job_id: Option<String>,
    #[serde(rename = "nextResultUri")]
    pub next_result_uri: Option<String>,
    #[serde(rename = "errors")]
    pub errors: Option<Vec<String>>,
}

/// Accumulated outcome of draining a single operation's result pages.
#[derive(Debug, Clone, Default)]
pub struct ResultPage {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<RowPayload>,
    pub is_query_result: bool,
    pub result_kind: Option<String>,
    pub job_id: Option<String>,
}

/// Result of submitting and draining one statement within `ExecuteMany`.
#[derive(Debug, Clone)]
pub struct StatementResult {
    pub statement: String,
    pub outcome: std::result::Result<ResultPage, String>,
}

impl StatementResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

pub(super) fn parse_result_type(raw: &str) -> ResultType {
    raw.parse().unwrap_or(ResultType::NotReady)
}

pub(super) fn parse_operation_status(raw: &str) -> OperationStatus {
    raw.parse().unwrap_or(OperationStatus::Unknown)
}
