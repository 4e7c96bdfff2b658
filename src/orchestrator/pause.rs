use tracing::{info, instrument, warn};

use crate::cluster::SnapshotRequestState;
use crate::domain::{JobState, SnapshotStatus, SnapshotType};
use crate::error::{Error, Result};
use crate::store::SnapshotStatusPatch;

use super::Orchestrator;

/// Parameters for [`Orchestrator::pause`].
#[derive(Debug, Clone, Default)]
pub struct PauseOptions {
    pub target_dir: Option<String>,
}

impl Orchestrator {
    /// Pause a running job by taking a savepoint and cancelling it,
    /// serialized per-`jobId` by an advisory lock held across the whole
    /// state machine.
    #[instrument(skip(self, options))]
    pub async fn pause(&self, job_id: &str, options: PauseOptions) -> Result<()> {
        let lock = self.job_locks_handle(job_id);
        let _guard = lock.lock().await;

        let details = self
            .cluster
            .job_details(job_id)
            .await?
            .ok_or_else(|| Error::precondition(format!("job {job_id} not found")))?;

        if !details.state.is_pausable() {
            return Err(Error::precondition(format!(
                "job {job_id} is in state {} and cannot be paused",
                details.state
            )));
        }

        let staleness_cutoff =
            chrono::Duration::from_std(self.config.snapshot_staleness_cutoff).unwrap();

        let existing = self
            .store
            .get_latest_for_job(job_id, staleness_cutoff)
            .await?;

        let (snapshot_id, request_id) = match existing {
            None => {
                let id = self
                    .store
                    .create_snapshot_record(job_id, details.name.as_deref(), SnapshotType::Pause)
                    .await?;
                (id, None)
            }
            Some(row) if row.snapshot_status == SnapshotStatus::Completed => {
                if details.state == JobState::Canceled {
                    info!(job_id, "job already paused, nothing to do");
                    return Ok(());
                }
                let id = self
                    .store
                    .create_snapshot_record(job_id, details.name.as_deref(), SnapshotType::Pause)
                    .await?;
                (id, None)
            }
            Some(row)
                if row.snapshot_status == SnapshotStatus::InProgress && row.request_id.is_some() =>
            {
                (row.id, row.request_id)
            }
            Some(row) if row.snapshot_status == SnapshotStatus::InProgress => {
                warn!(job_id, snapshot_id = row.id, "in-progress snapshot has no request id, marking failed");
                self.store
                    .update_snapshot_status(row.id, SnapshotStatus::Failed, SnapshotStatusPatch::default())
                    .await?;
                let id = self
                    .store
                    .create_snapshot_record(job_id, details.name.as_deref(), SnapshotType::Pause)
                    .await?;
                (id, None)
            }
            Some(_failed) => {
                let id = self
                    .store
                    .create_snapshot_record(job_id, details.name.as_deref(), SnapshotType::Pause)
                    .await?;
                (id, None)
            }
        };

        let request_id = match request_id {
            Some(id) => id,
            None => {
                let triggered = self
                    .cluster
                    .trigger_snapshot(job_id, options.target_dir.as_deref())
                    .await;

                let triggered = match triggered {
                    Ok(id) => id,
                    Err(e) => {
                        self.store
                            .update_snapshot_status(
                                snapshot_id,
                                SnapshotStatus::Failed,
                                SnapshotStatusPatch {
                                    metadata_patch: Some(serde_json::json!({"error": e.to_string()})),
                                    ..Default::default()
                                },
                            )
                            .await?;
                        return Err(e);
                    }
                };

                self.store
                    .update_snapshot_status(
                        snapshot_id,
                        SnapshotStatus::InProgress,
                        SnapshotStatusPatch {
                            request_id: Some(triggered.clone()),
                            ..Default::default()
                        },
                    )
                    .await?;
                triggered
            }
        };

        let status = self
            .cluster
            .wait_for_snapshot(
                job_id,
                &request_id,
                self.config.snapshot_poll_interval,
                self.config.snapshot_poll_deadline,
            )
            .await;

        let status = match status {
            Ok(s) => s,
            Err(e) => {
                self.store
                    .update_snapshot_status(
                        snapshot_id,
                        SnapshotStatus::Failed,
                        SnapshotStatusPatch {
                            metadata_patch: Some(serde_json::json!({"error": "timeout"})),
                            ..Default::default()
                        },
                    )
                    .await?;
                return Err(e);
            }
        };

        match status.status {
            SnapshotRequestState::Completed => {
                let path = status.location.ok_or_else(|| {
                    Error::SnapshotFailed {
                        job_id: job_id.to_string(),
                        message: "cluster reported COMPLETED with no location".to_string(),
                    }
                })?;

                self.store
                    .update_snapshot_status(
                        snapshot_id,
                        SnapshotStatus::Completed,
                        SnapshotStatusPatch {
                            snapshot_path: Some(path),
                            metadata_patch: Some(
                                serde_json::json!({"completed_at": chrono::Utc::now().to_rfc3339()}),
                            ),
                            ..Default::default()
                        },
                    )
                    .await?;

                self.cluster.cancel_job(job_id).await?;
                Ok(())
            }
            SnapshotRequestState::Failed => {
                let cause = status
                    .failure_cause
                    .unwrap_or_else(|| "snapshot failed".to_string());
                self.store
                    .update_snapshot_status(
                        snapshot_id,
                        SnapshotStatus::Failed,
                        SnapshotStatusPatch {
                            metadata_patch: Some(serde_json::json!({"error": cause.clone()})),
                            ..Default::default()
                        },
                    )
                    .await?;
                Err(Error::SnapshotFailed {
                    job_id: job_id.to_string(),
                    message: cause,
                })
            }
            SnapshotRequestState::InProgress => unreachable!("wait_for_snapshot only returns terminal states"),
        }
    }

    pub(super) fn job_locks_handle(&self, job_id: &str) -> std::sync::Arc<tokio::sync::Mutex<()>> {
        self.job_locks.handle(job_id)
    }
}
