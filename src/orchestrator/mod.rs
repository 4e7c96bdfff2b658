//! Lifecycle Orchestrator (C5): composes the gateway client, cluster
//! client, and persistence store into the higher-level intents —
//! `ExecuteSQL`, `Pause`, `Resume`/`ResumeFromSnapshotId`, `Sync`, and the
//! three listing queries.

mod execute;
mod listings;
mod locks;
mod pause;
mod resume;
mod sync;

use std::collections::HashMap;
use std::sync::Arc;

use crate::cluster::ClusterClient;
use crate::config::OrchestratorConfig;
use crate::error::Result;
use crate::gateway::{GatewayClient, StatementResult};
use crate::store::Store;

use locks::JobLocks;

pub use execute::{ExecuteOptions, ExecuteOutcome, OnError};
pub use listings::{ActiveSnapshotView, ResumableSnapshot};
pub use pause::PauseOptions;
pub use sync::SyncReport;

/// Composes C1–C4 into the intents a caller (typically a CLI) drives.
#[derive(Debug)]
pub struct Orchestrator {
    gateway: GatewayClient,
    cluster: ClusterClient,
    store: Arc<Store>,
    config: OrchestratorConfig,
    job_locks: JobLocks,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig, store: Arc<Store>) -> Result<Self> {
        let gateway = GatewayClient::new(&config)?;
        let cluster = ClusterClient::new(&config)?;

        Ok(Self {
            gateway,
            cluster,
            store,
            config,
            job_locks: JobLocks::new(),
        })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }
}

/// Strictly substitute `${NAME}` placeholders in `sql`. Fails with
/// [`crate::Error::MissingEnv`] if any placeholder has no binding.
pub(crate) fn substitute_env(sql: &str, env: &HashMap<String, String>) -> Result<String> {
    let mut out = String::with_capacity(sql.len());
    let chars: Vec<char> = sql.chars().collect();
    let n = chars.len();
    let mut i = 0;
    let mut missing = Vec::new();

    while i < n {
        if chars[i] == '$' && i + 1 < n && chars[i + 1] == '{' {
            if let Some(end) = (i + 2..n).find(|&j| chars[j] == '}') {
                let name: String = chars[i + 2..end].iter().collect();
                match env.get(&name) {
                    Some(value) => {
                        out.push_str(value);
                        i = end + 1;
                        continue;
                    }
                    None => {
                        missing.push(name);
                        i = end + 1;
                        continue;
                    }
                }
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    if !missing.is_empty() {
        return Err(crate::Error::MissingEnv(missing.join(", ")));
    }

    Ok(out)
}

/// Find the `jobId` a statement's execution surfaced, if any.
pub(crate) fn extract_job_id(results: &[StatementResult]) -> Option<String> {
    results
        .iter()
        .find_map(|r| r.outcome.as_ref().ok().and_then(|p| p.job_id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_variables() {
        let mut env = HashMap::new();
        env.insert("TABLE".to_string(), "orders".to_string());
        let sql = substitute_env("SELECT * FROM ${TABLE}", &env).unwrap();
        assert_eq!(sql, "SELECT * FROM orders");
    }

    #[test]
    fn fails_strictly_on_missing_binding() {
        let env = HashMap::new();
        let err = substitute_env("SELECT * FROM ${TABLE}", &env).unwrap_err();
        assert!(matches!(err, crate::Error::MissingEnv(_)));
    }
}
