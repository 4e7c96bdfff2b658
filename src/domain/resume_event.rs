use chrono::{DateTime, Utc};
use serde_json::Value as Json;

use super::types::ResumeStatus;

/// A durable audit record of one resume attempt from a snapshot.
///
/// Rows are append-only: a failed resume is never deleted, only left with
/// `status = FAILED` and an `error_message`.
#[derive(Debug, Clone)]
pub struct ResumeEvent {
    pub id: i64,
    pub snapshot_id: i64,
    pub original_job_id: String,
    pub new_job_id: Option<String>,
    pub snapshot_path: String,
    pub sql_file_path: String,
    pub status: ResumeStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub metadata: Json,
}
