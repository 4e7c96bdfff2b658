//! Raw row shapes returned by `sqlx`, plus `TryFrom` conversions into the
//! domain types `C5` and readers operate on.

use sqlx::FromRow;

use crate::domain::{ResumeEvent, Snapshot};
use crate::error::StoreError;

use super::converters::{optional_string_to_datetime, string_to_datetime, string_to_json};

#[derive(Debug, Clone, FromRow)]
pub(super) struct SnapshotRow {
    pub id: i64,
    pub job_id: String,
    pub job_name: Option<String>,
    pub snapshot_path: String,
    pub snapshot_type: String,
    pub snapshot_status: String,
    pub sql_content: Option<String>,
    pub request_id: Option<String>,
    pub is_latest: bool,
    pub created_at: String,
    pub metadata: String,
}

impl TryFrom<SnapshotRow> for Snapshot {
    type Error = StoreError;

    fn try_from(row: SnapshotRow) -> Result<Self, Self::Error> {
        Ok(Snapshot {
            id: row.id,
            job_id: row.job_id,
            job_name: row.job_name,
            snapshot_path: row.snapshot_path,
            snapshot_type: row
                .snapshot_type
                .parse()
                .map_err(StoreError::validation)?,
            snapshot_status: row
                .snapshot_status
                .parse()
                .map_err(StoreError::validation)?,
            sql_content: row.sql_content,
            request_id: row.request_id,
            is_latest: row.is_latest,
            created_at: string_to_datetime(&row.created_at)?,
            metadata: string_to_json(&row.metadata)?,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub(super) struct ResumeEventRow {
    pub id: i64,
    pub snapshot_id: i64,
    pub original_job_id: String,
    pub new_job_id: Option<String>,
    pub snapshot_path: String,
    pub sql_file_path: String,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub metadata: String,
}

impl TryFrom<ResumeEventRow> for ResumeEvent {
    type Error = StoreError;

    fn try_from(row: ResumeEventRow) -> Result<Self, Self::Error> {
        Ok(ResumeEvent {
            id: row.id,
            snapshot_id: row.snapshot_id,
            original_job_id: row.original_job_id,
            new_job_id: row.new_job_id,
            snapshot_path: row.snapshot_path,
            sql_file_path: row.sql_file_path,
            status: row.status.parse().map_err(StoreError::validation)?,
            error_message: row.error_message,
            created_at: string_to_datetime(&row.created_at)?,
            completed_at: optional_string_to_datetime(&row.completed_at)?,
            metadata: string_to_json(&row.metadata)?,
        })
    }
}
