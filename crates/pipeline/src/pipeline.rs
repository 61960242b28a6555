//! Two-phase import facade.
//!
//! `begin` turns a raw table into a reviewable [`ReconciliationPlan`]
//! without touching the store beyond batched key lookups. `commit` takes
//! the caller's approval decisions and runs backup, apply, and
//! finalization under per-key advisory locks.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use intake_core::approval::ApprovalState;
use intake_core::batch_status::{BATCH_STATUS_COMPLETED, BATCH_STATUS_FAILED};
use intake_core::config::ImportConfig;
use intake_core::error::ImportError;
use intake_core::fields;
use intake_core::mapper::extract_entities;
use intake_core::normalize::{normalize_table, RawTable};
use intake_core::progress::ImportStage;
use intake_core::reconcile::{reconcile, ReconciliationPlan};
use intake_db::models::batch::{BatchCounters, CreateImportBatch};
use intake_events::{ProgressBus, ProgressTracker};

use crate::applier::{self, ChunkOutcome};
use crate::locks::KeyLockRegistry;
use crate::snapshot;
use crate::store::ImportStore;

/// The reviewable result of the read-only phase.
#[derive(Debug)]
pub struct ImportPreview {
    /// Identifies the preview run on the progress bus; the commit phase
    /// gets its own batch id.
    pub run_id: Uuid,
    pub plan: ReconciliationPlan,
}

/// Caller-supplied context for the commit phase.
#[derive(Debug, Clone)]
pub struct CommitRequest {
    pub filename: String,
    pub file_size_bytes: i64,
    pub actor: String,
}

/// Outcome of one committed batch.
#[derive(Debug)]
pub struct CommitReport {
    pub batch_id: Uuid,
    /// Terminal batch status: `completed` iff zero errors were recorded.
    pub status: String,
    pub counters: BatchCounters,
    pub outcomes: Vec<ChunkOutcome>,
}

/// Orchestrates the full intake flow against an [`ImportStore`].
pub struct ImportPipeline {
    store: Arc<dyn ImportStore>,
    config: ImportConfig,
    bus: Arc<ProgressBus>,
    locks: KeyLockRegistry,
}

impl ImportPipeline {
    pub fn new(store: Arc<dyn ImportStore>, config: ImportConfig) -> Self {
        Self {
            store,
            config,
            bus: Arc::new(ProgressBus::default()),
            locks: KeyLockRegistry::new(),
        }
    }

    /// The progress bus; subscribe before calling `begin`/`commit` to
    /// observe every stage event.
    pub fn bus(&self) -> Arc<ProgressBus> {
        Arc::clone(&self.bus)
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Read-only phase: normalize, map, and reconcile into a plan for
    /// review. Store access is limited to one batched key lookup per
    /// entity type.
    pub async fn begin(&self, table: &RawTable) -> Result<ImportPreview, ImportError> {
        let run_id = Uuid::now_v7();
        let mut tracker = ProgressTracker::new(self.bus(), run_id);

        tracker.stage(ImportStage::Parsing, "normalizing table");
        let normalized = match normalize_table(table, &self.config) {
            Ok(normalized) => normalized,
            Err(err) => {
                tracker.error(err.to_string());
                return Err(err);
            }
        };

        tracker.stage(ImportStage::Mapping, "extracting entities");
        let extracted = extract_entities(&normalized, &self.config);

        tracker.stage(ImportStage::Validating, "reconciling against store");

        // One lookup per entity type. Supplier references are folded into
        // the organization lookup so the referential check can resolve
        // them without per-record round trips.
        let mut org_keys: HashSet<String> =
            extracted.organizations.iter().map(|d| d.key.clone()).collect();
        for item in &extracted.items {
            if let Some(supplier) = item.fields.get(fields::ITEM_SUPPLIER_TAX_ID) {
                org_keys.insert(supplier.clone());
            }
        }
        let org_keys: Vec<String> = org_keys.into_iter().collect();
        let item_keys: Vec<String> = extracted.items.iter().map(|d| d.key.clone()).collect();

        let existing_organizations = self
            .store
            .organizations_by_keys(&org_keys)
            .await
            .map_err(|err| ImportError::Store(err.to_string()))?;
        let existing_items = self
            .store
            .items_by_keys(&item_keys)
            .await
            .map_err(|err| ImportError::Store(err.to_string()))?;

        let plan = reconcile(&extracted, &existing_organizations, &existing_items, &self.config);
        tracing::info!(
            %run_id,
            new_organizations = plan.new_organizations.len(),
            changed_organizations = plan.changed_organizations.len(),
            new_items = plan.new_items.len(),
            changed_items = plan.changed_items.len(),
            issues = plan.issues.len(),
            "reconciliation plan ready"
        );

        Ok(ImportPreview { run_id, plan })
    }

    /// Approval-gated mutating phase: backup, apply, finalize.
    ///
    /// Refuses to run when nothing is approved. The batch ends in a
    /// terminal status either way: `completed` iff zero errors.
    pub async fn commit(
        &self,
        plan: &ReconciliationPlan,
        approval: &ApprovalState,
        request: &CommitRequest,
    ) -> Result<CommitReport, ImportError> {
        let approved = approval.filter(plan)?;
        let total = approved.record_count();
        let batch_id = Uuid::now_v7();
        let mut tracker = ProgressTracker::new(self.bus(), batch_id);

        // Serialize concurrent batches touching the same keys. Org and
        // item key spaces are disjoint by namespace prefix.
        let (org_keys, item_keys) = approved.touched_keys();
        let lock_keys: Vec<String> = org_keys
            .iter()
            .map(|k| format!("org:{k}"))
            .chain(item_keys.iter().map(|k| format!("item:{k}")))
            .collect();
        let _guards = self.locks.acquire(&lock_keys).await;

        self.store
            .create_batch(&CreateImportBatch {
                id: batch_id,
                filename: request.filename.clone(),
                file_size_bytes: request.file_size_bytes,
                total_records: total as i32,
            })
            .await
            .map_err(|err| ImportError::Store(err.to_string()))?;

        tracker.stage(ImportStage::BackingUp, "writing pre-processing snapshot");
        if let Err(err) = snapshot::take_snapshot(self.store.as_ref(), batch_id, &approved).await {
            let counters = BatchCounters {
                total: total as i32,
                errors: total as i32,
                ..Default::default()
            };
            // Best effort: the batch row must not stay in `processing`.
            if let Err(finalize_err) = self
                .store
                .finalize_batch(batch_id, BATCH_STATUS_FAILED, &counters)
                .await
            {
                tracing::error!(%batch_id, error = %finalize_err, "failed to mark batch failed");
            }
            tracker.error(err.to_string());
            return Err(err);
        }

        tracker.stage(ImportStage::Applying, "applying approved records");
        let report = applier::apply(
            self.store.as_ref(),
            &self.config,
            &approved,
            batch_id,
            &request.actor,
            &mut tracker,
        )
        .await;

        let status = if report.has_failures() {
            BATCH_STATUS_FAILED
        } else {
            BATCH_STATUS_COMPLETED
        };
        let counters = report.counters(total);
        self.store
            .finalize_batch(batch_id, status, &counters)
            .await
            .map_err(|err| ImportError::Store(err.to_string()))?;

        if report.has_failures() {
            tracker.error(format!("{} records failed", report.failed));
        } else {
            tracker.stage(ImportStage::Completed, "import completed");
        }
        tracing::info!(
            %batch_id,
            status,
            new = counters.new,
            updated = counters.updated,
            errors = counters.errors,
            "batch finalized"
        );

        Ok(CommitReport {
            batch_id,
            status: status.to_string(),
            counters,
            outcomes: report.outcomes,
        })
    }
}
