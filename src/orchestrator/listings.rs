use tracing::{instrument, warn};

use crate::cluster::{JobDescriptor, SnapshotStatus as ClusterSnapshotStatus};
use crate::domain::{JobState, Snapshot};
use crate::error::Result;
use crate::store::ActiveSnapshot;

use super::Orchestrator;

/// A still-in-progress snapshot row paired with the cluster's current view
/// of the underlying snapshot request, when one has been triggered.
#[derive(Debug, Clone)]
pub struct ActiveSnapshotView {
    pub active: ActiveSnapshot,
    pub cluster_status: Option<ClusterSnapshotStatus>,
}

/// A locally-completed snapshot paired with the cluster's current view of
/// the job it came from, returned by [`Orchestrator::list_resumable`].
#[derive(Debug, Clone)]
pub struct ResumableSnapshot {
    pub snapshot: Snapshot,
    pub cluster_state: JobState,
}

impl Orchestrator {
    /// Cluster jobs currently `RUNNING` — candidates for `Pause`.
    #[instrument(skip(self))]
    pub async fn list_pausable(&self) -> Result<Vec<JobDescriptor>> {
        let jobs = self.cluster.list_jobs().await?;
        Ok(jobs
            .into_iter()
            .filter(|j| j.state == JobState::Running)
            .collect())
    }

    /// Locally completed, non-placeholder snapshots whose job is no longer
    /// running on the cluster — candidates for `Resume`.
    #[instrument(skip(self))]
    pub async fn list_resumable(&self) -> Result<Vec<ResumableSnapshot>> {
        let completed = self.store.list_completed_snapshots().await?;
        let mut out = Vec::with_capacity(completed.len());

        for snapshot in completed {
            let cluster_state = match self.cluster.job_details(&snapshot.job_id).await? {
                Some(details) => details.state,
                None => JobState::NotFound,
            };

            if matches!(
                cluster_state,
                JobState::NotFound | JobState::Canceled | JobState::Failed | JobState::Finished
            ) {
                out.push(ResumableSnapshot {
                    snapshot,
                    cluster_state,
                });
            }
        }

        Ok(out)
    }

    /// Store rows still `IN_PROGRESS`, each annotated with the cluster's
    /// current view of the underlying snapshot request, if one is open.
    #[instrument(skip(self))]
    pub async fn list_active_snapshots(&self) -> Result<Vec<ActiveSnapshotView>> {
        let staleness_cutoff =
            chrono::Duration::from_std(self.config.snapshot_staleness_cutoff).unwrap();
        let rows = self.store.list_active_snapshots(staleness_cutoff).await?;

        let mut out = Vec::with_capacity(rows.len());
        for active in rows {
            let cluster_status = match &active.snapshot.request_id {
                Some(request_id) => {
                    match self
                        .cluster
                        .snapshot_status(&active.snapshot.job_id, request_id)
                        .await
                    {
                        Ok(status) => Some(status),
                        Err(e) => {
                            warn!(
                                job_id = %active.snapshot.job_id,
                                request_id,
                                error = %e,
                                "failed to enrich active snapshot with cluster status"
                            );
                            None
                        }
                    }
                }
                None => None,
            };
            out.push(ActiveSnapshotView {
                active,
                cluster_status,
            });
        }
        Ok(out)
    }
}
