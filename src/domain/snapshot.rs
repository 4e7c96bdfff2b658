use chrono::{DateTime, Utc};
use serde_json::Value as Json;

use super::types::{SnapshotStatus, SnapshotType};

/// A durable record of a Flink savepoint or checkpoint taken for a job.
///
/// At most one row per `job_id` has `is_latest = true` at any time; the
/// orchestrator enforces this when it writes a new completed snapshot.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: i64,
    pub job_id: String,
    pub job_name: Option<String>,
    pub snapshot_path: String,
    pub snapshot_type: SnapshotType,
    pub snapshot_status: SnapshotStatus,
    pub sql_content: Option<String>,
    pub request_id: Option<String>,
    pub is_latest: bool,
    pub created_at: DateTime<Utc>,
    pub metadata: Json,
}

impl Snapshot {
    pub fn is_stale(&self, now: DateTime<Utc>, cutoff: chrono::Duration) -> bool {
        self.snapshot_status == SnapshotStatus::InProgress && now - self.created_at > cutoff
    }
}
