//! Chunked batch applier with partial-success semantics.
//!
//! Apply order is fixed: new organizations, changed organizations, new
//! items, changed items. Organizations go first because new items may
//! reference organizations created in the same batch. Chunks within a
//! category are applied in order, so the audit sequence of a batch is
//! deterministic for a given approved plan.
//!
//! A failed chunk loses exactly that chunk: its keys and store error
//! code are recorded, later chunks and categories continue, and nothing
//! already applied is undone.

use serde_json::json;
use uuid::Uuid;

use intake_core::approval::{ApprovalCategory, ApprovedPlan};
use intake_core::config::ImportConfig;
use intake_core::fields::EntityKind;
use intake_core::hashing::compute_integrity_hash;
use intake_core::mapper::EntityDraft;
use intake_core::merge::{plan_update, UpdateOutcome};
use intake_core::progress::ImportStage;
use intake_core::reconcile::ChangeDetail;
use intake_db::models::audit::{CreateAuditEntry, OPERATION_INSERT, OPERATION_UPDATE};
use intake_db::models::batch::BatchCounters;
use intake_events::ProgressTracker;

use crate::store::ImportStore;

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// The result of applying one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// Every mutation in the chunk succeeded and was audited.
    Applied {
        category: ApprovalCategory,
        keys: Vec<String>,
    },
    /// The chunk (or part of it, for updates) failed with a store error.
    Failed {
        category: ApprovalCategory,
        keys: Vec<String>,
        code: String,
    },
}

/// Aggregated result of the apply stage.
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub outcomes: Vec<ChunkOutcome>,
    pub inserted: usize,
    pub updated: usize,
    /// Approved updates whose planned write set came out empty (e.g.
    /// fill-only against fully-populated records). Processed, not audited.
    pub skipped_noops: usize,
    pub failed: usize,
}

impl ApplyReport {
    /// Records that ran to completion, including no-op updates.
    pub fn processed(&self) -> usize {
        self.inserted + self.updated + self.skipped_noops
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn counters(&self, total: usize) -> BatchCounters {
        BatchCounters {
            total: total as i32,
            processed: self.processed() as i32,
            new: self.inserted as i32,
            updated: self.updated as i32,
            errors: self.failed as i32,
        }
    }
}

// ---------------------------------------------------------------------------
// Audit hash chain
// ---------------------------------------------------------------------------

/// Per-batch integrity hash chain. Cloned before each chunk's audit
/// append and committed only when the append succeeds, so the persisted
/// chain stays verifiable even when an append is lost.
#[derive(Debug, Clone, Default)]
struct HashChain {
    prev: Option<String>,
}

impl HashChain {
    fn next(&mut self, batch_id: Uuid, entity_type: &str, key: &str, operation: &str, new_values: &serde_json::Value) -> String {
        let data = format!("{batch_id}|{entity_type}|{key}|{operation}|{new_values}");
        let hash = compute_integrity_hash(self.prev.as_deref(), &data);
        self.prev = Some(hash.clone());
        hash
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Apply an approved plan against the store.
///
/// The pre-processing snapshot must already be durable; this function
/// performs the first mutating writes of the batch.
pub async fn apply(
    store: &dyn ImportStore,
    config: &ImportConfig,
    approved: &ApprovedPlan,
    batch_id: Uuid,
    actor: &str,
    tracker: &mut ProgressTracker,
) -> ApplyReport {
    let mut report = ApplyReport::default();
    let mut chain = HashChain::default();
    let total = approved.record_count().max(1);
    let chunk_size = config.chunk_size.max(1);

    apply_insert_chunks(
        store,
        &approved.new_organizations,
        EntityKind::Organization,
        ApprovalCategory::NewOrganizations,
        batch_id,
        actor,
        chunk_size,
        &mut chain,
        &mut report,
        tracker,
        total,
    )
    .await;

    apply_update_chunks(
        store,
        &approved.changed_organizations,
        EntityKind::Organization,
        ApprovalCategory::ChangedOrganizations,
        &config.org_protected_fields,
        config,
        batch_id,
        actor,
        &mut chain,
        &mut report,
        tracker,
        total,
    )
    .await;

    apply_insert_chunks(
        store,
        &approved.new_items,
        EntityKind::Item,
        ApprovalCategory::NewItems,
        batch_id,
        actor,
        chunk_size,
        &mut chain,
        &mut report,
        tracker,
        total,
    )
    .await;

    apply_update_chunks(
        store,
        &approved.changed_items,
        EntityKind::Item,
        ApprovalCategory::ChangedItems,
        &config.item_protected_fields,
        config,
        batch_id,
        actor,
        &mut chain,
        &mut report,
        tracker,
        total,
    )
    .await;

    report
}

// ---------------------------------------------------------------------------
// Insert chunks
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
async fn apply_insert_chunks(
    store: &dyn ImportStore,
    drafts: &[EntityDraft],
    kind: EntityKind,
    category: ApprovalCategory,
    batch_id: Uuid,
    actor: &str,
    chunk_size: usize,
    chain: &mut HashChain,
    report: &mut ApplyReport,
    tracker: &mut ProgressTracker,
    total: usize,
) {
    for chunk in drafts.chunks(chunk_size) {
        let keys: Vec<String> = chunk.iter().map(|d| d.key.clone()).collect();
        let maps: Vec<_> = chunk.iter().map(|d| d.fields.clone()).collect();

        if let Err(err) = match kind {
            EntityKind::Organization => store.insert_organizations(&maps).await,
            EntityKind::Item => store.insert_items(&maps).await,
        } {
            tracing::warn!(
                %batch_id,
                entity = kind.as_str(),
                chunk_len = chunk.len(),
                code = %err.code,
                "insert chunk failed"
            );
            report.failed += chunk.len();
            report.outcomes.push(ChunkOutcome::Failed {
                category,
                keys,
                code: err.code,
            });
            continue;
        }

        // Audit entries commit the chain only if the append lands.
        let mut attempt = chain.clone();
        let entries: Vec<CreateAuditEntry> = chunk
            .iter()
            .map(|draft| {
                let new_values = serde_json::to_value(&draft.fields).unwrap_or(json!({}));
                let integrity_hash = attempt.next(
                    batch_id,
                    kind.as_str(),
                    &draft.key,
                    OPERATION_INSERT,
                    &new_values,
                );
                CreateAuditEntry {
                    batch_id,
                    entity_type: kind.as_str().to_string(),
                    entity_key: draft.key.clone(),
                    operation: OPERATION_INSERT.to_string(),
                    changed_fields: None,
                    previous_values: None,
                    new_values,
                    actor: actor.to_string(),
                    integrity_hash,
                }
            })
            .collect();

        match store.append_audit_entries(&entries).await {
            Ok(()) => {
                *chain = attempt;
                report.inserted += chunk.len();
                report.outcomes.push(ChunkOutcome::Applied { category, keys });
            }
            Err(err) => {
                // The rows exist but their ledger entries do not; the
                // batch must surface this as a failure for reconciliation.
                tracing::error!(
                    %batch_id,
                    entity = kind.as_str(),
                    code = %err.code,
                    "audit append failed after insert chunk"
                );
                report.failed += chunk.len();
                report.outcomes.push(ChunkOutcome::Failed {
                    category,
                    keys,
                    code: err.code,
                });
            }
        }

        emit_chunk_progress(tracker, report, total);
    }
}

// ---------------------------------------------------------------------------
// Update chunks
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
async fn apply_update_chunks(
    store: &dyn ImportStore,
    details: &[ChangeDetail],
    kind: EntityKind,
    category: ApprovalCategory,
    protected: &[String],
    config: &ImportConfig,
    batch_id: Uuid,
    actor: &str,
    chain: &mut HashChain,
    report: &mut ApplyReport,
    tracker: &mut ProgressTracker,
    total: usize,
) {
    for chunk in details.chunks(config.chunk_size.max(1)) {
        let mut applied: Vec<(String, UpdateOutcome)> = Vec::new();
        let mut failed_keys: Vec<String> = Vec::new();
        let mut failure_code: Option<String> = None;

        for detail in chunk {
            let outcome = plan_update(
                &detail.existing,
                &detail.incoming,
                kind.key_field(),
                protected,
                config.update_policy,
            );
            if outcome.is_noop() {
                report.skipped_noops += 1;
                continue;
            }

            let result = match kind {
                EntityKind::Organization => {
                    store.update_organization(&detail.key, &outcome.writes).await
                }
                EntityKind::Item => store.update_item(&detail.key, &outcome.writes).await,
            };
            match result {
                Ok(()) => applied.push((detail.key.clone(), outcome)),
                Err(err) => {
                    tracing::warn!(
                        %batch_id,
                        entity = kind.as_str(),
                        key = %detail.key,
                        code = %err.code,
                        "update failed"
                    );
                    failed_keys.push(detail.key.clone());
                    failure_code.get_or_insert(err.code);
                }
            }
        }

        if !applied.is_empty() {
            let mut attempt = chain.clone();
            let entries: Vec<CreateAuditEntry> = applied
                .iter()
                .map(|(key, outcome)| {
                    let changed_fields = json!(outcome
                        .changes
                        .iter()
                        .map(|c| c.field.as_str())
                        .collect::<Vec<_>>());
                    let previous_values = json!(outcome
                        .changes
                        .iter()
                        .map(|c| (c.field.as_str(), c.old.clone()))
                        .collect::<std::collections::BTreeMap<_, _>>());
                    let new_values = serde_json::to_value(&outcome.writes).unwrap_or(json!({}));
                    let integrity_hash =
                        attempt.next(batch_id, kind.as_str(), key, OPERATION_UPDATE, &new_values);
                    CreateAuditEntry {
                        batch_id,
                        entity_type: kind.as_str().to_string(),
                        entity_key: key.clone(),
                        operation: OPERATION_UPDATE.to_string(),
                        changed_fields: Some(changed_fields),
                        previous_values: Some(previous_values),
                        new_values,
                        actor: actor.to_string(),
                        integrity_hash,
                    }
                })
                .collect();

            match store.append_audit_entries(&entries).await {
                Ok(()) => {
                    *chain = attempt;
                    report.updated += applied.len();
                    report.outcomes.push(ChunkOutcome::Applied {
                        category,
                        keys: applied.iter().map(|(k, _)| k.clone()).collect(),
                    });
                }
                Err(err) => {
                    tracing::error!(
                        %batch_id,
                        entity = kind.as_str(),
                        code = %err.code,
                        "audit append failed after update chunk"
                    );
                    report.failed += applied.len();
                    report.outcomes.push(ChunkOutcome::Failed {
                        category,
                        keys: applied.iter().map(|(k, _)| k.clone()).collect(),
                        code: err.code,
                    });
                }
            }
        }

        if !failed_keys.is_empty() {
            report.failed += failed_keys.len();
            report.outcomes.push(ChunkOutcome::Failed {
                category,
                keys: failed_keys,
                code: failure_code.unwrap_or_else(|| "store_error".to_string()),
            });
        }

        emit_chunk_progress(tracker, report, total);
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Map apply progress onto the 70..99 percentage band.
fn emit_chunk_progress(tracker: &mut ProgressTracker, report: &ApplyReport, total: usize) {
    let done = report.processed() + report.failed;
    let pct = 70 + ((done * 29) / total).min(29) as u8;
    tracker.emit(
        ImportStage::Applying,
        format!("{done}/{total} records applied"),
        pct,
    );
}
