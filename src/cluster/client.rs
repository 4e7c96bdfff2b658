use std::time::Duration;

use tracing::instrument;

use crate::config::OrchestratorConfig;
use crate::domain::JobState;
use crate::error::{ClusterTransportError, Error, Result};

use super::model::{
    JobDescriptor, JobDetailsResponse, JobsOverviewResponse, SnapshotOperationInner,
    SnapshotRequestState, SnapshotStatus, SnapshotStatusResponse, TriggerSnapshotResponse,
};

/// Client for the Flink Job REST API (C2).
#[derive(Debug, Clone)]
pub struct ClusterClient {
    http: reqwest::Client,
    base_url: String,
}

impl ClusterClient {
    pub fn new(config: &OrchestratorConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.cluster_call_timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build cluster HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.cluster_url.clone(),
        })
    }

    /// List every job on the cluster with full per-job details.
    #[instrument(skip(self))]
    pub async fn list_jobs(&self) -> Result<Vec<JobDescriptor>> {
        let resp = self
            .http
            .get(format!("{}/jobs", self.base_url))
            .send()
            .await
            .map_err(ClusterTransportError::from)?;

        if !resp.status().is_success() {
            return Err(ClusterTransportError(format!(
                "list jobs failed with status {}",
                resp.status()
            ))
            .into());
        }

        let overview: JobsOverviewResponse = resp
            .json()
            .await
            .map_err(|e| ClusterTransportError(format!("malformed jobs overview: {e}")))?;

        let mut descriptors = Vec::with_capacity(overview.jobs.len());
        for entry in overview.jobs {
            match self.job_details(&entry.id).await? {
                Some(details) => descriptors.push(details),
                None => {
                    // Job vanished between the overview call and the details
                    // call; fall back to the overview's own status rather
                    // than dropping it from the listing.
                    let state = entry
                        .status
                        .parse::<JobState>()
                        .unwrap_or(JobState::NotFound);
                    descriptors.push(JobDescriptor {
                        id: entry.id,
                        state,
                        name: None,
                        savepoint_path: None,
                    });
                }
            }
        }
        Ok(descriptors)
    }

    /// Fetch full details for one job, or `None` on HTTP 404.
    #[instrument(skip(self))]
    pub async fn job_details(&self, job_id: &str) -> Result<Option<JobDescriptor>> {
        let resp = self
            .http
            .get(format!("{}/jobs/{}", self.base_url, job_id))
            .send()
            .await
            .map_err(ClusterTransportError::from)?;

        if resp.status().as_u16() == 404 {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(ClusterTransportError(format!(
                "job details failed with status {}",
                resp.status()
            ))
            .into());
        }

        let body: JobDetailsResponse = resp
            .json()
            .await
            .map_err(|e| ClusterTransportError(format!("malformed job details: {e}")))?;

        let state = body
            .state
            .parse::<JobState>()
            .unwrap_or(JobState::NotFound);
        let savepoint_path = body.savepoint_path();

        Ok(Some(JobDescriptor {
            id: body.jid.unwrap_or_else(|| job_id.to_string()),
            state,
            name: body.name,
            savepoint_path,
        }))
    }

    /// Trigger a savepoint for `job_id`, returning the async request id.
    #[instrument(skip(self))]
    pub async fn trigger_snapshot(
        &self,
        job_id: &str,
        target_dir: Option<&str>,
    ) -> Result<String> {
        let mut body = serde_json::Map::new();
        if let Some(dir) = target_dir {
            body.insert(
                "target-directory".to_string(),
                serde_json::Value::String(dir.to_string()),
            );
        }

        let resp = self
            .http
            .post(format!("{}/jobs/{}/snapshots", self.base_url, job_id))
            .json(&serde_json::Value::Object(body))
            .send()
            .await
            .map_err(ClusterTransportError::from)?;

        if resp.status().as_u16() != 202 {
            return Err(Error::SnapshotTrigger {
                job_id: job_id.to_string(),
                message: format!("cluster returned status {}", resp.status()),
            });
        }

        let parsed: TriggerSnapshotResponse = resp.json().await.map_err(|e| {
            Error::SnapshotTrigger {
                job_id: job_id.to_string(),
                message: format!("malformed trigger response: {e}"),
            }
        })?;

        Ok(parsed.request_id)
    }

    /// Poll the status of a previously triggered snapshot request.
    #[instrument(skip(self))]
    pub async fn snapshot_status(&self, job_id: &str, request_id: &str) -> Result<SnapshotStatus> {
        let resp = self
            .http
            .get(format!(
                "{}/jobs/{}/snapshots/{}",
                self.base_url, job_id, request_id
            ))
            .send()
            .await
            .map_err(ClusterTransportError::from)?;

        if !resp.status().is_success() {
            return Err(ClusterTransportError(format!(
                "snapshot status failed with status {}",
                resp.status()
            ))
            .into());
        }

        let body: SnapshotStatusResponse = resp
            .json()
            .await
            .map_err(|e| ClusterTransportError(format!("malformed snapshot status: {e}")))?;

        let state = SnapshotRequestState::parse(&body.status.id);
        let location = body
            .operation
            .as_ref()
            .and_then(|op: &SnapshotOperationInner| op.location.clone());
        let failure_cause = body
            .operation
            .as_ref()
            .and_then(|op| op.failure_cause_message());

        Ok(SnapshotStatus {
            status: state,
            location,
            failure_cause,
        })
    }

    /// Poll `job_id`'s snapshot request to a terminal state, sleeping
    /// `poll_interval` between attempts, bounded by `deadline`.
    #[instrument(skip(self))]
    pub async fn wait_for_snapshot(
        &self,
        job_id: &str,
        request_id: &str,
        poll_interval: Duration,
        deadline: Duration,
    ) -> Result<SnapshotStatus> {
        let started = std::time::Instant::now();
        loop {
            let status = self.snapshot_status(job_id, request_id).await?;
            if status.status != SnapshotRequestState::InProgress {
                return Ok(status);
            }
            if started.elapsed() >= deadline {
                return Err(Error::SnapshotTimeout {
                    job_id: job_id.to_string(),
                    elapsed_secs: started.elapsed().as_secs(),
                });
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Stop `job_id` while taking a final snapshot, returning the request id.
    #[instrument(skip(self))]
    pub async fn stop_with_snapshot(
        &self,
        job_id: &str,
        target_dir: Option<&str>,
    ) -> Result<String> {
        let mut body = serde_json::json!({ "mode": "stop" });
        if let Some(dir) = target_dir {
            body["targetDirectory"] = serde_json::Value::String(dir.to_string());
        }

        let resp = self
            .http
            .patch(format!("{}/jobs/{}", self.base_url, job_id))
            .json(&body)
            .send()
            .await
            .map_err(ClusterTransportError::from)?;

        if resp.status().as_u16() != 202 {
            return Err(Error::SnapshotTrigger {
                job_id: job_id.to_string(),
                message: format!("stop-with-snapshot returned status {}", resp.status()),
            });
        }

        let parsed: TriggerSnapshotResponse = resp.json().await.map_err(|e| {
            Error::SnapshotTrigger {
                job_id: job_id.to_string(),
                message: format!("malformed stop response: {e}"),
            }
        })?;

        Ok(parsed.request_id)
    }

    /// Cancel `job_id` without taking a snapshot.
    #[instrument(skip(self))]
    pub async fn cancel_job(&self, job_id: &str) -> Result<bool> {
        let resp = self
            .http
            .patch(format!("{}/jobs/{}", self.base_url, job_id))
            .json(&serde_json::json!({ "mode": "cancel" }))
            .send()
            .await
            .map_err(ClusterTransportError::from)?;

        Ok(resp.status().as_u16() == 202)
    }

    /// Find running/restarting jobs whose `execution.savepoint.path` matches
    /// `path` — used by the Resume preflight to detect double-consumption.
    #[instrument(skip(self))]
    pub async fn jobs_using_snapshot(&self, path: &str) -> Result<Vec<JobDescriptor>> {
        let jobs = self.list_jobs().await?;
        Ok(jobs
            .into_iter()
            .filter(|j| matches!(j.state, JobState::Running | JobState::Restarting))
            .filter(|j| j.savepoint_path.as_deref() == Some(path))
            .collect())
    }
}
