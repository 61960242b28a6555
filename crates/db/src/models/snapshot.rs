//! Pre-processing backup snapshot model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use intake_core::types::Timestamp;

/// The only snapshot type currently taken.
pub const SNAPSHOT_TYPE_PRE_PROCESSING: &str = "pre_processing";

/// A row from the `backup_snapshots` table. Immutable once created; the
/// payload holds full copies of every entity the batch was about to
/// update, for manual operator-driven recovery.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BackupSnapshot {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub snapshot_type: String,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
}

/// DTO for creating a snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBackupSnapshot {
    pub batch_id: Uuid,
    pub payload: serde_json::Value,
}
