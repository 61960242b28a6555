//! Audit ledger models.
//!
//! One entry per successful mutation — never zero, never more than one.
//! Entries are immutable (no `updated_at`) and chained per batch through
//! `integrity_hash` (see `intake_core::hashing`).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use intake_core::types::Timestamp;

pub const OPERATION_INSERT: &str = "insert";
pub const OPERATION_UPDATE: &str = "update";

/// A row from the `import_audit_entries` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ImportAuditEntry {
    pub id: i64,
    pub batch_id: Uuid,
    pub entity_type: String,
    pub entity_key: String,
    pub operation: String,
    /// Changed-field names; updates only.
    pub changed_fields: Option<serde_json::Value>,
    /// Pre-update values of the changed fields; updates only.
    pub previous_values: Option<serde_json::Value>,
    pub new_values: serde_json::Value,
    pub actor: String,
    pub integrity_hash: String,
    pub created_at: Timestamp,
}

/// DTO for appending one audit entry. Designed for batch inserts.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAuditEntry {
    pub batch_id: Uuid,
    pub entity_type: String,
    pub entity_key: String,
    pub operation: String,
    pub changed_fields: Option<serde_json::Value>,
    pub previous_values: Option<serde_json::Value>,
    pub new_values: serde_json::Value,
    pub actor: String,
    pub integrity_hash: String,
}
