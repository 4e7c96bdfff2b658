//! Embedded SQLite persistence (C4): the `snapshots` and `resume_events`
//! tables, behind a single-writer discipline enforced by a process-level
//! mutex around every write path. Readers go straight to the pool.

mod converters;
mod models;
mod resume_events;
mod snapshots;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::sync::Mutex;

use crate::error::{Result, StoreError};

pub use resume_events::ResumeEventPatch;
pub use snapshots::{ActiveSnapshot, SnapshotStatusPatch};

/// Embedded SQLite-backed store for snapshot and resume-event rows.
#[derive(Debug)]
pub struct Store {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl Store {
    /// Open (creating if missing) the SQLite database at `database_url` and
    /// run pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(StoreError::from)?
            .create_if_missing(true);

        Self::connect_with_options(options, 5).await
    }

    /// An in-memory database, migrated the same way — used by tests. Capped
    /// at a single pooled connection: a plain `sqlite::memory:` URL gives
    /// every new connection its own private database, so a pool size above
    /// one would make writes on one connection invisible to reads on another.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(StoreError::from)?;
        Self::connect_with_options(options, 1).await
    }

    async fn connect_with_options(options: SqliteConnectOptions, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(StoreError::from)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(StoreError::from)?;

        Ok(Self {
            pool,
            write_lock: Mutex::new(()),
        })
    }
}
