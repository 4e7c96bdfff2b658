use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

/// Per-`jobId` advisory locks, serializing concurrent `Pause` intents
/// against the same job without blocking intents on other jobs.
#[derive(Debug, Default)]
pub(super) struct JobLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl JobLocks {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn handle(&self, job_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(job_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
