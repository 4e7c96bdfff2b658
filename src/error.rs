//! Crate-wide error taxonomy.
//!
//! One variant per failure domain in the orchestrator's error handling
//! design: configuration, gateway/cluster transport, session/submit/operation
//! lifecycle, snapshot lifecycle, resume preflight, and the local store.

use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("SQL contains unbound placeholder(s): {0}")]
    MissingEnv(String),

    #[error("SQL gateway unreachable: {0}")]
    GatewayUnreachable(#[from] GatewayTransportError),

    #[error("Flink cluster unreachable: {0}")]
    ClusterUnreachable(#[from] ClusterTransportError),

    #[error("session error: {0}")]
    Session(String),

    #[error("statement submission rejected: {0}")]
    Submit(String),

    #[error("operation polling exceeded deadline after {elapsed_secs}s")]
    OperationTimeout { elapsed_secs: u64 },

    #[error("operation failed: {message}")]
    OperationError {
        message: String,
        job_id: Option<String>,
    },

    #[error("cluster refused snapshot trigger for job {job_id}: {message}")]
    SnapshotTrigger { job_id: String, message: String },

    #[error("snapshot polling for job {job_id} exceeded deadline after {elapsed_secs}s")]
    SnapshotTimeout { job_id: String, elapsed_secs: u64 },

    #[error("snapshot for job {job_id} failed: {message}")]
    SnapshotFailed { job_id: String, message: String },

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("local store error: {0}")]
    Store(#[from] StoreError),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    pub fn submit(msg: impl Into<String>) -> Self {
        Self::Submit(msg.into())
    }

    pub fn operation_error(message: impl Into<String>, job_id: Option<String>) -> Self {
        Self::OperationError {
            message: message.into(),
            job_id,
        }
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

/// Transport failure talking to the SQL Gateway.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct GatewayTransportError(pub String);

impl From<reqwest::Error> for GatewayTransportError {
    fn from(e: reqwest::Error) -> Self {
        Self(e.to_string())
    }
}

/// Transport failure talking to the Job REST API.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ClusterTransportError(pub String);

impl From<reqwest::Error> for ClusterTransportError {
    fn from(e: reqwest::Error) -> Self {
        Self(e.to_string())
    }
}

/// Local persistence failure.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid stored value: {0}")]
    Validation(String),

    #[error("entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },
}

impl StoreError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
