//! Repository for the `backup_snapshots` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::snapshot::{
    BackupSnapshot, CreateBackupSnapshot, SNAPSHOT_TYPE_PRE_PROCESSING,
};

/// Column list for backup_snapshots queries.
const COLUMNS: &str = "id, batch_id, snapshot_type, payload, created_at";

/// Provides insert and query operations for backup snapshots.
pub struct BackupSnapshotRepo;

impl BackupSnapshotRepo {
    /// Insert a pre-processing snapshot, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateBackupSnapshot,
    ) -> Result<BackupSnapshot, sqlx::Error> {
        let query = format!(
            "INSERT INTO backup_snapshots (id, batch_id, snapshot_type, payload)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BackupSnapshot>(&query)
            .bind(Uuid::new_v4())
            .bind(input.batch_id)
            .bind(SNAPSHOT_TYPE_PRE_PROCESSING)
            .bind(&input.payload)
            .fetch_one(pool)
            .await
    }

    /// List snapshots taken for a batch, newest first.
    pub async fn list_for_batch(
        pool: &PgPool,
        batch_id: Uuid,
    ) -> Result<Vec<BackupSnapshot>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM backup_snapshots
             WHERE batch_id = $1
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, BackupSnapshot>(&query)
            .bind(batch_id)
            .fetch_all(pool)
            .await
    }
}
