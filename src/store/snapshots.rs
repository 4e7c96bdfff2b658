use chrono::Utc;
use serde_json::Value as Json;

use crate::domain::{RUNNING_JOB_PLACEHOLDER, Snapshot, SnapshotStatus, SnapshotType};
use crate::error::{Result, StoreError};

use super::Store;
use super::converters::{datetime_to_string, json_to_string, merge_json};
use super::models::SnapshotRow;

/// Optional fields accepted by [`Store::update_snapshot_status`].
#[derive(Debug, Default)]
pub struct SnapshotStatusPatch {
    pub request_id: Option<String>,
    pub snapshot_path: Option<String>,
    pub metadata_patch: Option<Json>,
}

/// A row from [`Store::list_active_snapshots`], enriched with its age.
#[derive(Debug, Clone)]
pub struct ActiveSnapshot {
    pub snapshot: Snapshot,
    pub age: chrono::Duration,
    pub is_stale: bool,
}

impl Store {
    /// Insert a new `IN_PROGRESS` snapshot row for `job_id`, demoting any
    /// prior row for the same job from `is_latest`. Returns the new row id.
    pub async fn create_snapshot_record(
        &self,
        job_id: &str,
        job_name: Option<&str>,
        snapshot_type: SnapshotType,
    ) -> Result<i64> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        sqlx::query("UPDATE snapshots SET is_latest = 0 WHERE job_id = ?")
            .bind(job_id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        let now = datetime_to_string(&Utc::now());
        let result = sqlx::query(
            r#"
            INSERT INTO snapshots (
                job_id, job_name, snapshot_path, snapshot_type, snapshot_status,
                sql_content, request_id, is_latest, created_at, metadata
            ) VALUES (?, ?, ?, ?, ?, NULL, NULL, 1, ?, '{}')
            "#,
        )
        .bind(job_id)
        .bind(job_name)
        .bind(RUNNING_JOB_PLACEHOLDER)
        .bind(snapshot_type.to_string())
        .bind(SnapshotStatus::InProgress.to_string())
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from)?;

        tx.commit().await.map_err(StoreError::from)?;
        Ok(result.last_insert_rowid())
    }

    /// Insert a snapshot row directly in a terminal state, used by
    /// `ExecuteSQL`'s `JOB_START` bookkeeping and by `Sync`'s discovery rows.
    pub async fn record_snapshot(
        &self,
        job_id: &str,
        job_name: Option<&str>,
        snapshot_type: SnapshotType,
        status: SnapshotStatus,
        snapshot_path: &str,
        sql_content: Option<&str>,
        metadata: &Json,
    ) -> Result<i64> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        sqlx::query("UPDATE snapshots SET is_latest = 0 WHERE job_id = ?")
            .bind(job_id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        let now = datetime_to_string(&Utc::now());
        let result = sqlx::query(
            r#"
            INSERT INTO snapshots (
                job_id, job_name, snapshot_path, snapshot_type, snapshot_status,
                sql_content, request_id, is_latest, created_at, metadata
            ) VALUES (?, ?, ?, ?, ?, ?, NULL, 1, ?, ?)
            "#,
        )
        .bind(job_id)
        .bind(job_name)
        .bind(snapshot_path)
        .bind(snapshot_type.to_string())
        .bind(status.to_string())
        .bind(sql_content)
        .bind(&now)
        .bind(json_to_string(metadata))
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from)?;

        tx.commit().await.map_err(StoreError::from)?;
        Ok(result.last_insert_rowid())
    }

    /// Apply an atomic status update, merging `metadata_patch` over the
    /// row's existing metadata.
    pub async fn update_snapshot_status(
        &self,
        id: i64,
        status: SnapshotStatus,
        patch: SnapshotStatusPatch,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let existing: String = sqlx::query_scalar("SELECT metadata FROM snapshots WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from)?
            .ok_or_else(|| StoreError::not_found("snapshot", id.to_string()))?;

        let base = super::converters::string_to_json(&existing)?;
        let merged = match patch.metadata_patch {
            Some(p) => merge_json(&base, &p),
            None => base,
        };

        sqlx::query(
            r#"
            UPDATE snapshots SET
                snapshot_status = ?,
                request_id = COALESCE(?, request_id),
                snapshot_path = COALESCE(?, snapshot_path),
                metadata = ?
            WHERE id = ?
            "#,
        )
        .bind(status.to_string())
        .bind(patch.request_id)
        .bind(patch.snapshot_path)
        .bind(json_to_string(&merged))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(())
    }

    /// Fetch a snapshot by id.
    pub async fn get_snapshot(&self, id: i64) -> Result<Option<Snapshot>> {
        let row = sqlx::query_as::<_, SnapshotRow>("SELECT * FROM snapshots WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from)?;

        row.map(Snapshot::try_from).transpose().map_err(Into::into)
    }

    /// Return the `is_latest` row for `job_id`, sweeping it to `FAILED`
    /// first if it is `IN_PROGRESS` and older than `staleness_cutoff`.
    pub async fn get_latest_for_job(
        &self,
        job_id: &str,
        staleness_cutoff: chrono::Duration,
    ) -> Result<Option<Snapshot>> {
        let row = sqlx::query_as::<_, SnapshotRow>(
            "SELECT * FROM snapshots WHERE job_id = ? AND is_latest = 1 LIMIT 1",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)?;

        let Some(row) = row else { return Ok(None) };
        let snapshot = Snapshot::try_from(row)?;

        if snapshot.snapshot_status == SnapshotStatus::InProgress
            && snapshot.is_stale(Utc::now(), staleness_cutoff)
        {
            self.update_snapshot_status(
                snapshot.id,
                SnapshotStatus::Failed,
                SnapshotStatusPatch {
                    metadata_patch: Some(serde_json::json!({"failed_at": Utc::now().to_rfc3339(), "error": "stale: no observed completion within staleness window"})),
                    ..Default::default()
                },
            )
            .await?;
            return self.get_snapshot(snapshot.id).await;
        }

        Ok(Some(snapshot))
    }

    /// All rows currently `IN_PROGRESS`, each annotated with age/staleness.
    /// A row whose age exceeds `staleness_cutoff` is swept to `FAILED` (the
    /// same transition `get_latest_for_job` applies) before being surfaced,
    /// so invariant 2 holds regardless of which reader observes it first.
    pub async fn list_active_snapshots(
        &self,
        staleness_cutoff: chrono::Duration,
    ) -> Result<Vec<ActiveSnapshot>> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            "SELECT * FROM snapshots WHERE snapshot_status = ? ORDER BY created_at ASC",
        )
        .bind(SnapshotStatus::InProgress.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;

        let now = Utc::now();
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let mut snapshot = Snapshot::try_from(row)?;
            let age = now - snapshot.created_at;
            let is_stale = age > staleness_cutoff;

            if is_stale {
                self.update_snapshot_status(
                    snapshot.id,
                    SnapshotStatus::Failed,
                    SnapshotStatusPatch {
                        metadata_patch: Some(serde_json::json!({"failed_at": now.to_rfc3339(), "error": "stale: no observed completion within staleness window"})),
                        ..Default::default()
                    },
                )
                .await?;
                snapshot.snapshot_status = SnapshotStatus::Failed;
            }

            out.push(ActiveSnapshot {
                snapshot,
                age,
                is_stale,
            });
        }
        Ok(out)
    }

    /// All rows currently marked `is_latest`, one per job that has ever had
    /// a snapshot recorded — used by `Sync` to find local job records no
    /// longer visible on the cluster.
    pub async fn list_latest_snapshots(&self) -> Result<Vec<Snapshot>> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            "SELECT * FROM snapshots WHERE is_latest = 1 ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;

        rows.into_iter()
            .map(Snapshot::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// Rows with `snapshot_status = COMPLETED` and a real (non-placeholder)
    /// path, used by `ListResumable`.
    pub async fn list_completed_snapshots(&self) -> Result<Vec<Snapshot>> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            "SELECT * FROM snapshots WHERE snapshot_status = ? AND snapshot_path != ? ORDER BY created_at DESC",
        )
        .bind(SnapshotStatus::Completed.to_string())
        .bind(RUNNING_JOB_PLACEHOLDER)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;

        rows.into_iter()
            .map(Snapshot::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }
}
