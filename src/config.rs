//! Orchestrator configuration.
//!
//! Loaded from environment variables (optionally via a local `.env` file
//! through `dotenvy`), with defaults matching the tunables observed in the
//! original Python tooling's `config.yaml` (gateway URL, session timeout,
//! poll interval, max wait time) and the state-machine numerics from the
//! pause/resume design (snapshot poll interval, snapshot deadline, staleness
//! cutoff).

use std::time::Duration;

use crate::error::{Error, Result};

/// Default SQL Gateway base URL.
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:8083";
/// Default Job REST API base URL.
pub const DEFAULT_CLUSTER_URL: &str = "http://localhost:8081";
/// Default local SQLite database URL.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:flink_orchestrator.db?mode=rwc";

/// Runtime configuration for the orchestrator and its HTTP clients.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Base URL of the SQL Gateway, e.g. `http://localhost:8083`.
    pub gateway_url: String,
    /// Base URL of the Flink Job REST API, e.g. `http://localhost:8081`.
    pub cluster_url: String,
    /// SQLite connection URL for the local persistence store.
    pub database_url: String,
    /// Per-call HTTP timeout for gateway requests.
    pub gateway_call_timeout: Duration,
    /// Per-call HTTP timeout for cluster requests.
    pub cluster_call_timeout: Duration,
    /// Wall-clock deadline for polling a statement operation to a terminal status.
    pub operation_poll_deadline: Duration,
    /// Delay between result-fetch attempts when a page is `NOT_READY` or empty.
    pub result_fetch_delay: Duration,
    /// Maximum number of result-fetch attempts before giving up.
    pub result_fetch_attempt_cap: u32,
    /// Delay between snapshot-status polls during `Pause`.
    pub snapshot_poll_interval: Duration,
    /// Wall-clock deadline for polling a snapshot request to completion.
    pub snapshot_poll_deadline: Duration,
    /// Age after which an `IN_PROGRESS` snapshot row is considered stale.
    pub snapshot_staleness_cutoff: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            cluster_url: DEFAULT_CLUSTER_URL.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            gateway_call_timeout: Duration::from_secs(30),
            cluster_call_timeout: Duration::from_secs(20),
            operation_poll_deadline: Duration::from_secs(60),
            result_fetch_delay: Duration::from_secs(1),
            result_fetch_attempt_cap: 20,
            snapshot_poll_interval: Duration::from_secs(2),
            snapshot_poll_deadline: Duration::from_secs(120),
            snapshot_staleness_cutoff: Duration::from_secs(5 * 60),
        }
    }
}

impl OrchestratorConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset. Loads a local `.env` file first, if
    /// present (best-effort, mirrors the teacher's `main.rs` startup).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(url) = std::env::var("FLINK_GATEWAY_URL") {
            config.gateway_url = validate_url(&url)?;
        }
        if let Ok(url) = std::env::var("FLINK_CLUSTER_URL") {
            config.cluster_url = validate_url(&url)?;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }

        Ok(config)
    }
}

fn validate_url(raw: &str) -> Result<String> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| Error::config(format!("invalid URL '{}': {}", raw, e)))?;
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_reasonable() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.snapshot_poll_deadline, Duration::from_secs(120));
        assert_eq!(
            config.snapshot_staleness_cutoff,
            Duration::from_secs(5 * 60)
        );
    }

    #[test]
    fn rejects_malformed_urls() {
        assert!(validate_url("not a url").is_err());
    }
}
