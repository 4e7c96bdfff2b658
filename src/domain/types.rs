use std::fmt;
use std::str::FromStr;

/// Status of a submitted statement operation, as reported by the SQL Gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Running,
    Finished,
    Error,
    Canceled,
    Unknown,
}

impl OperationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationStatus::Finished | OperationStatus::Error | OperationStatus::Canceled
        )
    }
}

impl FromStr for OperationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OperationStatus::Pending),
            "RUNNING" => Ok(OperationStatus::Running),
            "FINISHED" => Ok(OperationStatus::Finished),
            "ERROR" => Ok(OperationStatus::Error),
            "CANCELED" => Ok(OperationStatus::Canceled),
            other => {
                tracing::warn!(status = %other, "unrecognized operation status, treating as UNKNOWN");
                Ok(OperationStatus::Unknown)
            }
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationStatus::Pending => "PENDING",
            OperationStatus::Running => "RUNNING",
            OperationStatus::Finished => "FINISHED",
            OperationStatus::Error => "ERROR",
            OperationStatus::Canceled => "CANCELED",
            OperationStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Kind of a single page of statement results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    Payload,
    Eos,
    NotReady,
}

impl FromStr for ResultType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PAYLOAD" => Ok(ResultType::Payload),
            "EOS" => Ok(ResultType::Eos),
            "NOT_READY" => Ok(ResultType::NotReady),
            other => Err(format!("'{}' is not a valid result type", other)),
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResultType::Payload => "PAYLOAD",
            ResultType::Eos => "EOS",
            ResultType::NotReady => "NOT_READY",
        };
        f.write_str(s)
    }
}

/// Per-row change tag carried by the JSON row format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum ChangeKind {
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "UPDATE_BEFORE")]
    UpdateBefore,
    #[serde(rename = "UPDATE_AFTER")]
    UpdateAfter,
    #[serde(rename = "DELETE")]
    Delete,
}

/// Cluster-reported job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created,
    Running,
    Restarting,
    Finished,
    Canceled,
    Failed,
    /// Not a wire value: used locally when a job id is absent from the cluster.
    NotFound,
}

impl JobState {
    pub fn is_pausable(&self) -> bool {
        matches!(self, JobState::Running | JobState::Created)
    }
}

impl FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(JobState::Created),
            "RUNNING" => Ok(JobState::Running),
            "RESTARTING" => Ok(JobState::Restarting),
            "FINISHED" => Ok(JobState::Finished),
            "CANCELED" | "CANCELLED" => Ok(JobState::Canceled),
            "FAILED" => Ok(JobState::Failed),
            other => Err(format!("'{}' is not a valid job state", other)),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Created => "CREATED",
            JobState::Running => "RUNNING",
            JobState::Restarting => "RESTARTING",
            JobState::Finished => "FINISHED",
            JobState::Canceled => "CANCELED",
            JobState::Failed => "FAILED",
            JobState::NotFound => "NOT_FOUND",
        };
        f.write_str(s)
    }
}

/// Why a durable snapshot row was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotType {
    Manual,
    Pause,
    StopWithSnapshot,
    JobStart,
}

impl FromStr for SnapshotType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MANUAL" => Ok(SnapshotType::Manual),
            "PAUSE" => Ok(SnapshotType::Pause),
            "STOP_WITH_SNAPSHOT" => Ok(SnapshotType::StopWithSnapshot),
            "JOB_START" => Ok(SnapshotType::JobStart),
            other => Err(format!("'{}' is not a valid snapshot type", other)),
        }
    }
}

impl fmt::Display for SnapshotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SnapshotType::Manual => "MANUAL",
            SnapshotType::Pause => "PAUSE",
            SnapshotType::StopWithSnapshot => "STOP_WITH_SNAPSHOT",
            SnapshotType::JobStart => "JOB_START",
        };
        f.write_str(s)
    }
}

/// Lifecycle status of a durable snapshot row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotStatus {
    InProgress,
    Completed,
    Failed,
}

impl FromStr for SnapshotStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_PROGRESS" => Ok(SnapshotStatus::InProgress),
            "COMPLETED" => Ok(SnapshotStatus::Completed),
            "FAILED" => Ok(SnapshotStatus::Failed),
            other => Err(format!("'{}' is not a valid snapshot status", other)),
        }
    }
}

impl fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SnapshotStatus::InProgress => "IN_PROGRESS",
            SnapshotStatus::Completed => "COMPLETED",
            SnapshotStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Lifecycle status of a durable resume-event row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeStatus {
    Started,
    Completed,
    Failed,
}

impl ResumeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ResumeStatus::Completed | ResumeStatus::Failed)
    }
}

impl FromStr for ResumeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STARTED" => Ok(ResumeStatus::Started),
            "COMPLETED" => Ok(ResumeStatus::Completed),
            "FAILED" => Ok(ResumeStatus::Failed),
            other => Err(format!("'{}' is not a valid resume status", other)),
        }
    }
}

impl fmt::Display for ResumeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResumeStatus::Started => "STARTED",
            ResumeStatus::Completed => "COMPLETED",
            ResumeStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Literal placeholder snapshot path used while a trigger is in flight.
pub const RUNNING_JOB_PLACEHOLDER: &str = "RUNNING_JOB";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_status_round_trips() {
        for s in ["PENDING", "RUNNING", "FINISHED", "ERROR", "CANCELED"] {
            let parsed: OperationStatus = s.parse().unwrap();
            assert_eq!(parsed.to_string(), s);
        }
    }

    #[test]
    fn unknown_operation_status_falls_back() {
        let parsed: OperationStatus = "WAT".parse().unwrap();
        assert_eq!(parsed, OperationStatus::Unknown);
    }

    #[test]
    fn job_state_pausable() {
        assert!(JobState::Running.is_pausable());
        assert!(JobState::Created.is_pausable());
        assert!(!JobState::Finished.is_pausable());
    }
}
