use std::collections::HashSet;

use tracing::instrument;

use crate::domain::{JobState, SnapshotStatus, SnapshotType};
use crate::error::Result;
use crate::store::SnapshotStatusPatch;

use super::Orchestrator;

impl Orchestrator {
    /// Reconcile local snapshot records with cluster state. Jobs seen on the
    /// cluster with no local snapshot get a `JOB_START` discovery row; local
    /// rows whose job has disappeared from the cluster are left at their own
    /// status (still valid for future resume) but get their job-status
    /// metadata refreshed to reflect that the cluster no longer knows them.
    #[instrument(skip(self))]
    pub async fn sync(&self) -> Result<SyncReport> {
        let jobs = self.cluster.list_jobs().await?;
        let staleness_cutoff =
            chrono::Duration::from_std(self.config.snapshot_staleness_cutoff).unwrap();

        let mut discovered = 0u32;
        for job in &jobs {
            if matches!(job.state, JobState::Running | JobState::Created)
                && self
                    .store
                    .get_latest_for_job(&job.id, staleness_cutoff)
                    .await?
                    .is_none()
            {
                self.store
                    .record_snapshot(
                        &job.id,
                        job.name.as_deref(),
                        SnapshotType::JobStart,
                        SnapshotStatus::Completed,
                        crate::domain::RUNNING_JOB_PLACEHOLDER,
                        None,
                        &serde_json::json!({"discovered": true}),
                    )
                    .await?;
                discovered += 1;
            }
        }

        let known_job_ids: HashSet<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
        let observed_at = chrono::Utc::now().to_rfc3339();

        let mut orphaned = 0u32;
        for row in self.store.list_latest_snapshots().await? {
            if known_job_ids.contains(row.job_id.as_str()) {
                continue;
            }
            self.store
                .update_snapshot_status(
                    row.id,
                    row.snapshot_status,
                    SnapshotStatusPatch {
                        metadata_patch: Some(serde_json::json!({
                            "job_status": "NOT_FOUND",
                            "observed_at": observed_at,
                        })),
                        ..Default::default()
                    },
                )
                .await?;
            orphaned += 1;
        }

        Ok(SyncReport {
            cluster_job_count: jobs.len(),
            discovered_job_count: discovered,
            orphaned_job_count: orphaned,
        })
    }
}

/// Summary of one `Sync()` pass.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub cluster_job_count: usize,
    pub discovered_job_count: u32,
    /// Local `is_latest` rows whose job no longer appears in `ListJobs()`;
    /// their job-status metadata was refreshed but their snapshot record
    /// was left alone.
    pub orphaned_job_count: u32,
}
