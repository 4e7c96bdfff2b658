use std::collections::HashMap;

use tracing::{instrument, warn};

use crate::domain::{RUNNING_JOB_PLACEHOLDER, ResumeStatus, Snapshot, SnapshotStatus};
use crate::error::{Error, Result};
use crate::store::ResumeEventPatch;

use super::{Orchestrator, extract_job_id, substitute_env};

const RECENT_RESUME_WINDOW: i64 = 60 * 60;

/// Resume the latest completed snapshot recorded for `job_id`, replaying
/// its stored `sql_content`.
impl Orchestrator {
    #[instrument(skip(self))]
    pub async fn resume(&self, job_id: &str) -> Result<String> {
        let staleness_cutoff =
            chrono::Duration::from_std(self.config.snapshot_staleness_cutoff).unwrap();
        let snapshot = self
            .store
            .get_latest_for_job(job_id, staleness_cutoff)
            .await?
            .ok_or_else(|| Error::precondition(format!("no snapshot recorded for job {job_id}")))?;

        let sql_content = snapshot.sql_content.clone().ok_or_else(|| {
            Error::precondition(format!(
                "snapshot {} for job {job_id} has no stored SQL to replay",
                snapshot.id
            ))
        })?;

        self.resume_with_sql(&snapshot, &sql_content, &HashMap::new())
            .await
    }

    /// Resume an explicit snapshot id, reading its SQL from `sql_file_path`
    /// (already loaded into `sql_text` by the caller) with `${VAR}`
    /// substitution from `env`.
    #[instrument(skip(self, sql_text, env))]
    pub async fn resume_from_snapshot_id(
        &self,
        snapshot_id: i64,
        sql_file_path: &str,
        sql_text: &str,
        env: &HashMap<String, String>,
    ) -> Result<String> {
        let snapshot = self
            .store
            .get_snapshot(snapshot_id)
            .await?
            .ok_or_else(|| Error::precondition(format!("snapshot {snapshot_id} not found")))?;

        let new_job_id = self
            .resume_with_sql_file(&snapshot, sql_text, sql_file_path, env)
            .await?;
        Ok(new_job_id)
    }

    async fn resume_with_sql(
        &self,
        snapshot: &Snapshot,
        sql_text: &str,
        env: &HashMap<String, String>,
    ) -> Result<String> {
        self.resume_with_sql_file(snapshot, sql_text, "<stored sql_content>", env)
            .await
    }

    async fn resume_with_sql_file(
        &self,
        snapshot: &Snapshot,
        sql_text: &str,
        sql_file_path: &str,
        env: &HashMap<String, String>,
    ) -> Result<String> {
        self.warn_on_recent_resume_attempts(snapshot).await?;

        let metadata = serde_json::json!({});
        let event_id = self
            .store
            .create_resume_event(
                snapshot.id,
                &snapshot.job_id,
                &snapshot.snapshot_path,
                sql_file_path,
                &metadata,
            )
            .await?;

        if let Err(e) = self.preflight(snapshot).await {
            self.fail_resume(event_id, &e.to_string()).await;
            return Err(e);
        }

        let substituted = match substitute_env(sql_text, env) {
            Ok(s) => s,
            Err(e) => {
                self.fail_resume(event_id, &e.to_string()).await;
                return Err(e);
            }
        };
        let composed = format!(
            "SET 'execution.savepoint.path' = '{}';\n{}",
            snapshot.snapshot_path, substituted
        );

        let session = match self.gateway.create_session(HashMap::new()).await {
            Ok(s) => s,
            Err(e) => {
                self.fail_resume(event_id, &e.to_string()).await;
                return Err(e);
            }
        };

        let statements = self.gateway.execute_many(&session, &composed, false).await;
        let _ = self.gateway.close_session(&session).await;

        if let Some(failure) = statements.iter().find(|r| r.outcome.is_err()) {
            let message = failure.outcome.clone().unwrap_err();
            self.fail_resume(event_id, &message).await;
            return Err(Error::operation_error(message, Some(snapshot.job_id.clone())));
        }

        let new_job_id = extract_job_id(&statements).ok_or_else(|| {
            Error::operation_error(
                "resume completed but surfaced no new jobId",
                Some(snapshot.job_id.clone()),
            )
        })?;

        self.store
            .update_resume_event(
                event_id,
                ResumeStatus::Completed,
                ResumeEventPatch {
                    new_job_id: Some(new_job_id.clone()),
                    ..Default::default()
                },
            )
            .await?;

        Ok(new_job_id)
    }

    async fn fail_resume(&self, event_id: i64, message: &str) {
        let _ = self
            .store
            .update_resume_event(
                event_id,
                ResumeStatus::Failed,
                ResumeEventPatch {
                    error_message: Some(message.to_string()),
                    ..Default::default()
                },
            )
            .await;
    }

    /// Preflight checks shared by both resume variants (§4.5 preflight list,
    /// items 1-2 — the "recent STARTED events" warning is item 3 and runs
    /// separately, before a new event row exists to pollute its own check).
    async fn preflight(&self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.snapshot_status != SnapshotStatus::Completed
            || snapshot.snapshot_path == RUNNING_JOB_PLACEHOLDER
        {
            return Err(Error::precondition(format!(
                "snapshot {} is not a completed, resumable snapshot",
                snapshot.id
            )));
        }

        let consumers = self
            .cluster
            .jobs_using_snapshot(&snapshot.snapshot_path)
            .await?;
        if !consumers.is_empty() {
            return Err(Error::conflict(format!(
                "snapshot path {} is already in use by job {}",
                snapshot.snapshot_path, consumers[0].id
            )));
        }

        Ok(())
    }

    /// Item 3 of the preflight list: warn (but don't block) when prior
    /// `STARTED` resume events exist for this snapshot path within the last
    /// hour. Runs before the new event row is created so it never counts
    /// the attempt currently in progress.
    async fn warn_on_recent_resume_attempts(&self, snapshot: &Snapshot) -> Result<()> {
        let recent = self
            .store
            .recent_started_resume_events(
                &snapshot.snapshot_path,
                chrono::Duration::seconds(RECENT_RESUME_WINDOW),
            )
            .await?;
        if !recent.is_empty() {
            warn!(
                snapshot_path = %snapshot.snapshot_path,
                count = recent.len(),
                "prior STARTED resume events for this snapshot path within the last hour, proceeding anyway"
            );
        }
        Ok(())
    }
}
