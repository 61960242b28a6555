//! In-memory [`ImportStore`] used by the pipeline scenario tests, with
//! failure injection for the snapshot, insert and update paths.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use intake_core::fields;
use intake_core::types::FieldMap;
use intake_db::models::audit::CreateAuditEntry;
use intake_db::models::batch::{BatchCounters, CreateImportBatch};
use intake_db::models::snapshot::CreateBackupSnapshot;
use intake_pipeline::store::{ImportStore, StoreError};

/// One batch row as the memory store sees it.
pub struct BatchRecord {
    pub input: CreateImportBatch,
    pub status: String,
    pub counters: Option<BatchCounters>,
}

#[derive(Default)]
pub struct MemoryStore {
    pub organizations: Mutex<HashMap<String, FieldMap>>,
    pub items: Mutex<HashMap<String, FieldMap>>,
    pub batches: Mutex<HashMap<Uuid, BatchRecord>>,
    pub snapshots: Mutex<Vec<CreateBackupSnapshot>>,
    pub audit_entries: Mutex<Vec<CreateAuditEntry>>,
    /// When set, `create_snapshot` fails.
    pub fail_snapshot: AtomicBool,
    /// Any insert chunk containing one of these keys fails whole.
    pub failing_insert_keys: Mutex<HashSet<String>>,
    /// Updates to these keys fail individually.
    pub failing_update_keys: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_organization(&self, fields_map: FieldMap) {
        let key = fields_map
            .get(fields::ORG_TAX_ID)
            .expect("seeded organization needs a tax_id")
            .clone();
        self.organizations.lock().unwrap().insert(key, fields_map);
    }

    pub fn seed_item(&self, fields_map: FieldMap) {
        let key = fields_map
            .get(fields::ITEM_CODE)
            .expect("seeded item needs a code")
            .clone();
        self.items.lock().unwrap().insert(key, fields_map);
    }

    pub fn organization(&self, key: &str) -> Option<FieldMap> {
        self.organizations.lock().unwrap().get(key).cloned()
    }

    pub fn item(&self, key: &str) -> Option<FieldMap> {
        self.items.lock().unwrap().get(key).cloned()
    }

    pub fn audit_count(&self) -> usize {
        self.audit_entries.lock().unwrap().len()
    }

    fn check_insert_failures(&self, drafts: &[FieldMap], key_field: &str) -> Result<(), StoreError> {
        let failing = self.failing_insert_keys.lock().unwrap();
        for draft in drafts {
            if let Some(key) = draft.get(key_field) {
                if failing.contains(key) {
                    return Err(StoreError::new(
                        "insert_failed",
                        format!("injected failure for key '{key}'"),
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_update_failure(&self, key: &str) -> Result<(), StoreError> {
        if self.failing_update_keys.lock().unwrap().contains(key) {
            return Err(StoreError::new(
                "update_failed",
                format!("injected failure for key '{key}'"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ImportStore for MemoryStore {
    async fn organizations_by_keys(
        &self,
        keys: &[String],
    ) -> Result<HashMap<String, FieldMap>, StoreError> {
        let organizations = self.organizations.lock().unwrap();
        Ok(keys
            .iter()
            .filter_map(|k| organizations.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }

    async fn items_by_keys(
        &self,
        keys: &[String],
    ) -> Result<HashMap<String, FieldMap>, StoreError> {
        let items = self.items.lock().unwrap();
        Ok(keys
            .iter()
            .filter_map(|k| items.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }

    async fn insert_organizations(&self, drafts: &[FieldMap]) -> Result<(), StoreError> {
        self.check_insert_failures(drafts, fields::ORG_TAX_ID)?;
        let mut organizations = self.organizations.lock().unwrap();
        for draft in drafts {
            let key = draft
                .get(fields::ORG_TAX_ID)
                .ok_or_else(|| StoreError::new("missing_key", "organization draft without tax_id"))?;
            organizations.insert(key.clone(), draft.clone());
        }
        Ok(())
    }

    async fn update_organization(&self, key: &str, writes: &FieldMap) -> Result<(), StoreError> {
        self.check_update_failure(key)?;
        let mut organizations = self.organizations.lock().unwrap();
        let record = organizations
            .get_mut(key)
            .ok_or_else(|| StoreError::new("row_missing", format!("organization '{key}'")))?;
        for (field, value) in writes {
            record.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn insert_items(&self, drafts: &[FieldMap]) -> Result<(), StoreError> {
        self.check_insert_failures(drafts, fields::ITEM_CODE)?;
        let mut items = self.items.lock().unwrap();
        for draft in drafts {
            let key = draft
                .get(fields::ITEM_CODE)
                .ok_or_else(|| StoreError::new("missing_key", "item draft without code"))?;
            items.insert(key.clone(), draft.clone());
        }
        Ok(())
    }

    async fn update_item(&self, key: &str, writes: &FieldMap) -> Result<(), StoreError> {
        self.check_update_failure(key)?;
        let mut items = self.items.lock().unwrap();
        let record = items
            .get_mut(key)
            .ok_or_else(|| StoreError::new("row_missing", format!("item '{key}'")))?;
        for (field, value) in writes {
            record.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn append_audit_entries(&self, entries: &[CreateAuditEntry]) -> Result<(), StoreError> {
        self.audit_entries.lock().unwrap().extend_from_slice(entries);
        Ok(())
    }

    async fn create_batch(&self, input: &CreateImportBatch) -> Result<(), StoreError> {
        self.batches.lock().unwrap().insert(
            input.id,
            BatchRecord {
                input: input.clone(),
                status: intake_core::batch_status::BATCH_STATUS_PROCESSING.to_string(),
                counters: None,
            },
        );
        Ok(())
    }

    async fn finalize_batch(
        &self,
        id: Uuid,
        status: &str,
        counters: &BatchCounters,
    ) -> Result<(), StoreError> {
        let mut batches = self.batches.lock().unwrap();
        let record = batches
            .get_mut(&id)
            .ok_or_else(|| StoreError::new("row_missing", format!("batch '{id}'")))?;
        record.status = status.to_string();
        record.counters = Some(*counters);
        Ok(())
    }

    async fn create_snapshot(&self, input: &CreateBackupSnapshot) -> Result<(), StoreError> {
        if self.fail_snapshot.load(Ordering::SeqCst) {
            return Err(StoreError::new("snapshot_io", "injected snapshot failure"));
        }
        self.snapshots.lock().unwrap().push(CreateBackupSnapshot {
            batch_id: input.batch_id,
            payload: input.payload.clone(),
        });
        Ok(())
    }
}
