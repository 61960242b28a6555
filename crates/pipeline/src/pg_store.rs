//! Postgres implementation of [`ImportStore`] over the intake-db
//! repositories.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use intake_core::types::FieldMap;
use intake_db::models::audit::CreateAuditEntry;
use intake_db::models::batch::{BatchCounters, CreateImportBatch};
use intake_db::models::snapshot::CreateBackupSnapshot;
use intake_db::repositories::{
    AuditEntryRepo, BackupSnapshotRepo, ImportBatchRepo, ItemRepo, OrganizationRepo,
};
use intake_db::DbPool;

use crate::store::{ImportStore, StoreError};

/// [`ImportStore`] backed by the intake Postgres schema.
pub struct PgImportStore {
    pool: DbPool,
}

impl PgImportStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImportStore for PgImportStore {
    async fn organizations_by_keys(
        &self,
        keys: &[String],
    ) -> Result<HashMap<String, FieldMap>, StoreError> {
        let rows = OrganizationRepo::find_by_keys(&self.pool, keys).await?;
        Ok(rows
            .into_iter()
            .map(|org| (org.tax_id.clone(), org.to_field_map()))
            .collect())
    }

    async fn items_by_keys(
        &self,
        keys: &[String],
    ) -> Result<HashMap<String, FieldMap>, StoreError> {
        let rows = ItemRepo::find_by_keys(&self.pool, keys).await?;
        Ok(rows
            .into_iter()
            .map(|item| (item.code.clone(), item.to_field_map()))
            .collect())
    }

    async fn insert_organizations(&self, drafts: &[FieldMap]) -> Result<(), StoreError> {
        OrganizationRepo::insert_many(&self.pool, drafts).await?;
        Ok(())
    }

    async fn update_organization(&self, key: &str, writes: &FieldMap) -> Result<(), StoreError> {
        let updated = OrganizationRepo::update_fields(&self.pool, key, writes).await?;
        if updated.is_none() {
            return Err(StoreError::new(
                "row_missing",
                format!("organization '{key}' disappeared before update"),
            ));
        }
        Ok(())
    }

    async fn insert_items(&self, drafts: &[FieldMap]) -> Result<(), StoreError> {
        ItemRepo::insert_many(&self.pool, drafts).await?;
        Ok(())
    }

    async fn update_item(&self, key: &str, writes: &FieldMap) -> Result<(), StoreError> {
        let updated = ItemRepo::update_fields(&self.pool, key, writes).await?;
        if updated.is_none() {
            return Err(StoreError::new(
                "row_missing",
                format!("item '{key}' disappeared before update"),
            ));
        }
        Ok(())
    }

    async fn append_audit_entries(&self, entries: &[CreateAuditEntry]) -> Result<(), StoreError> {
        AuditEntryRepo::batch_insert(&self.pool, entries).await?;
        Ok(())
    }

    async fn create_batch(&self, input: &CreateImportBatch) -> Result<(), StoreError> {
        ImportBatchRepo::create(&self.pool, input).await?;
        Ok(())
    }

    async fn finalize_batch(
        &self,
        id: Uuid,
        status: &str,
        counters: &BatchCounters,
    ) -> Result<(), StoreError> {
        let updated = ImportBatchRepo::finalize(&self.pool, id, status, counters).await?;
        if updated.is_none() {
            return Err(StoreError::new(
                "row_missing",
                format!("batch '{id}' not found at finalization"),
            ));
        }
        Ok(())
    }

    async fn create_snapshot(&self, input: &CreateBackupSnapshot) -> Result<(), StoreError> {
        BackupSnapshotRepo::create(&self.pool, input).await?;
        Ok(())
    }
}
