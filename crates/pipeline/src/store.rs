//! The persistent-store collaborator the pipeline orchestrates against.
//!
//! Operations are assumed atomic per call only; there is no cross-call
//! transaction. The applier leans on this: a failed chunk loses exactly
//! that chunk, nothing already applied is undone.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use intake_core::types::FieldMap;
use intake_db::models::audit::CreateAuditEntry;
use intake_db::models::batch::{BatchCounters, CreateImportBatch};
use intake_db::models::snapshot::CreateBackupSnapshot;

/// A store operation failure with a stable machine code.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct StoreError {
    pub code: String,
    pub message: String,
}

impl StoreError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::new("store_error", err.to_string())
    }
}

/// Persistence operations the pipeline needs, expressed over canonical
/// field maps so the orchestration stays storage-agnostic.
#[async_trait]
pub trait ImportStore: Send + Sync {
    /// Fetch existing organizations for the given tax ids, keyed by tax id.
    async fn organizations_by_keys(
        &self,
        keys: &[String],
    ) -> Result<HashMap<String, FieldMap>, StoreError>;

    /// Fetch existing items for the given codes, keyed by code.
    async fn items_by_keys(&self, keys: &[String])
        -> Result<HashMap<String, FieldMap>, StoreError>;

    /// Insert a chunk of new organizations. Atomic: all rows or none.
    async fn insert_organizations(&self, drafts: &[FieldMap]) -> Result<(), StoreError>;

    /// Apply planned field writes to one organization.
    async fn update_organization(&self, key: &str, writes: &FieldMap) -> Result<(), StoreError>;

    /// Insert a chunk of new items. Atomic: all rows or none.
    async fn insert_items(&self, drafts: &[FieldMap]) -> Result<(), StoreError>;

    /// Apply planned field writes to one item.
    async fn update_item(&self, key: &str, writes: &FieldMap) -> Result<(), StoreError>;

    /// Append audit entries in order. Atomic: all entries or none.
    async fn append_audit_entries(&self, entries: &[CreateAuditEntry]) -> Result<(), StoreError>;

    /// Create a batch row in `processing` status.
    async fn create_batch(&self, input: &CreateImportBatch) -> Result<(), StoreError>;

    /// Write the terminal status, counters, and completion time.
    async fn finalize_batch(
        &self,
        id: Uuid,
        status: &str,
        counters: &BatchCounters,
    ) -> Result<(), StoreError>;

    /// Durably write the pre-processing snapshot.
    async fn create_snapshot(&self, input: &CreateBackupSnapshot) -> Result<(), StoreError>;
}
