//! Import batch model and DTOs.
//!
//! Status values and the transition rule live in
//! `intake_core::batch_status` so non-DB layers can reason about them.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use intake_core::types::Timestamp;

/// A row from the `import_batches` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ImportBatch {
    pub id: Uuid,
    pub filename: String,
    pub file_size_bytes: i64,
    pub total_records: i32,
    pub processed_records: i32,
    pub new_records: i32,
    pub updated_records: i32,
    pub error_records: i32,
    pub status: String,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

/// DTO for creating a batch in `processing` status.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateImportBatch {
    pub id: Uuid,
    pub filename: String,
    pub file_size_bytes: i64,
    pub total_records: i32,
}

/// Aggregate counters written at finalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounters {
    pub total: i32,
    pub processed: i32,
    pub new: i32,
    pub updated: i32,
    pub errors: i32,
}
