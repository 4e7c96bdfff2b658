//! Logging initialization for binaries embedding this crate.
//!
//! The orchestrator itself only emits `tracing` events; it never writes to
//! the terminal directly (rendering is a CLI-layer concern). This helper is
//! a convenience for integrators, not something the orchestrator calls on
//! its own.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directive when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "flink_sql_orchestrator=info,sqlx=warn";

/// Initialize a process-wide `tracing` subscriber with an `EnvFilter`
/// seeded from `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`].
///
/// Safe to call once per process; a second call returns an error rather
/// than panicking.
pub fn init() -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_scopes_sqlx_down() {
        assert!(DEFAULT_LOG_FILTER.contains("sqlx=warn"));
    }
}
