use chrono::Utc;
use serde_json::Value as Json;

use crate::domain::{ResumeEvent, ResumeStatus};
use crate::error::{Result, StoreError};

use super::Store;
use super::converters::{datetime_to_string, json_to_string, merge_json};
use super::models::ResumeEventRow;

/// Optional fields accepted by [`Store::update_resume_event`].
#[derive(Debug, Default)]
pub struct ResumeEventPatch {
    pub new_job_id: Option<String>,
    pub error_message: Option<String>,
    pub metadata_patch: Option<Json>,
}

impl Store {
    /// Insert a `STARTED` resume-event row, returning its id.
    pub async fn create_resume_event(
        &self,
        snapshot_id: i64,
        original_job_id: &str,
        snapshot_path: &str,
        sql_file_path: &str,
        metadata: &Json,
    ) -> Result<i64> {
        let _guard = self.write_lock.lock().await;

        let now = datetime_to_string(&Utc::now());
        let result = sqlx::query(
            r#"
            INSERT INTO resume_events (
                snapshot_id, original_job_id, new_job_id, snapshot_path, sql_file_path,
                status, error_message, created_at, completed_at, metadata
            ) VALUES (?, ?, NULL, ?, ?, ?, NULL, ?, NULL, ?)
            "#,
        )
        .bind(snapshot_id)
        .bind(original_job_id)
        .bind(snapshot_path)
        .bind(sql_file_path)
        .bind(ResumeStatus::Started.to_string())
        .bind(&now)
        .bind(json_to_string(metadata))
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(result.last_insert_rowid())
    }

    /// Update a resume-event row's status, setting `completed_at` when the
    /// new status is terminal.
    pub async fn update_resume_event(
        &self,
        id: i64,
        status: ResumeStatus,
        patch: ResumeEventPatch,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let existing: String =
            sqlx::query_scalar("SELECT metadata FROM resume_events WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::from)?
                .ok_or_else(|| StoreError::not_found("resume_event", id.to_string()))?;

        let base = super::converters::string_to_json(&existing)?;
        let merged = match patch.metadata_patch {
            Some(p) => merge_json(&base, &p),
            None => base,
        };

        let completed_at = status.is_terminal().then(|| datetime_to_string(&Utc::now()));

        sqlx::query(
            r#"
            UPDATE resume_events SET
                status = ?,
                new_job_id = COALESCE(?, new_job_id),
                error_message = COALESCE(?, error_message),
                completed_at = COALESCE(?, completed_at),
                metadata = ?
            WHERE id = ?
            "#,
        )
        .bind(status.to_string())
        .bind(patch.new_job_id)
        .bind(patch.error_message)
        .bind(completed_at)
        .bind(json_to_string(&merged))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(())
    }

    /// Most recent resume event recorded for `snapshot_id`, if any.
    pub async fn get_resume_event_by_snapshot(
        &self,
        snapshot_id: i64,
    ) -> Result<Option<ResumeEvent>> {
        let row = sqlx::query_as::<_, ResumeEventRow>(
            "SELECT * FROM resume_events WHERE snapshot_id = ? ORDER BY created_at DESC LIMIT 1",
        )
        .bind(snapshot_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)?;

        row.map(ResumeEvent::try_from).transpose().map_err(Into::into)
    }

    /// Resume events with `STARTED` status for `snapshot_path`, created
    /// within the last hour — used by the Resume preflight's warning check.
    pub async fn recent_started_resume_events(
        &self,
        snapshot_path: &str,
        within: chrono::Duration,
    ) -> Result<Vec<ResumeEvent>> {
        let rows = sqlx::query_as::<_, ResumeEventRow>(
            "SELECT * FROM resume_events WHERE snapshot_path = ? AND status = ? ORDER BY created_at DESC",
        )
        .bind(snapshot_path)
        .bind(ResumeStatus::Started.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;

        let cutoff = Utc::now() - within;
        rows.into_iter()
            .map(ResumeEvent::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(|events| {
                events
                    .into_iter()
                    .filter(|e| e.created_at >= cutoff)
                    .collect()
            })
            .map_err(Into::into)
    }
}
