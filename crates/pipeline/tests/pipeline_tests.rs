//! End-to-end pipeline scenarios against the in-memory store.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use assert_matches::assert_matches;

use intake_core::approval::{ApprovalCategory, ApprovalState};
use intake_core::config::{ImportConfig, UpdatePolicy};
use intake_core::error::ImportError;
use intake_core::hashing::compute_integrity_hash;
use intake_core::issue::IssueCategory;
use intake_core::normalize::RawTable;
use intake_core::progress::ImportStage;
use intake_core::reconcile::ReconciliationPlan;
use intake_core::types::FieldMap;
use intake_pipeline::applier::ChunkOutcome;
use intake_pipeline::{CommitRequest, ImportPipeline};

use common::MemoryStore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
    RawTable {
        headers: headers.iter().map(|h| h.to_string()).collect(),
        rows: rows
            .iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect(),
        byte_size: 1024,
    }
}

fn fields_map(pairs: &[(&str, &str)]) -> FieldMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn approve_everything(plan: &ReconciliationPlan) -> ApprovalState {
    let mut state = ApprovalState::default();
    for category in [
        ApprovalCategory::NewOrganizations,
        ApprovalCategory::ChangedOrganizations,
        ApprovalCategory::NewItems,
        ApprovalCategory::ChangedItems,
    ] {
        state.approve_all(category, plan);
    }
    state
}

fn request() -> CommitRequest {
    CommitRequest {
        filename: "padron.xlsx".to_string(),
        file_size_bytes: 1024,
        actor: "tester".to_string(),
    }
}

fn pipeline_with(store: &Arc<MemoryStore>, config: ImportConfig) -> ImportPipeline {
    ImportPipeline::new(Arc::clone(store) as Arc<dyn intake_pipeline::ImportStore>, config)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

/// Two rows share a tax id (one with separators); the first wins and the
/// duplicate surfaces as an issue.
#[tokio::test]
async fn duplicate_tax_id_first_occurrence_wins() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline_with(&store, ImportConfig::default());

    let preview = pipeline
        .begin(&table(
            &["CUIT", "Razón Social"],
            &[
                &["30-71234567-8", "ACME SA"],
                &["30712345678", "ACME DUPLICADA SA"],
            ],
        ))
        .await
        .unwrap();

    assert_eq!(preview.plan.new_organizations.len(), 1);
    assert_eq!(
        preview.plan.new_organizations[0].fields.get("legal_name").unwrap(),
        "ACME SA"
    );
    assert!(preview
        .plan
        .issues
        .iter()
        .any(|i| i.category == IssueCategory::DuplicateKey));
}

/// A brand-new organization is inserted with exactly one audit entry.
#[tokio::test]
async fn new_organization_insert_is_audited() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline_with(&store, ImportConfig::default());

    let preview = pipeline
        .begin(&table(
            &["CUIT", "Razón Social", "Email"],
            &[&["30-71234567-8", "ACME SA", "ventas@acme.com"]],
        ))
        .await
        .unwrap();
    assert_eq!(preview.plan.new_organizations.len(), 1);

    let approval = approve_everything(&preview.plan);
    let report = pipeline
        .commit(&preview.plan, &approval, &request())
        .await
        .unwrap();

    assert_eq!(report.status, "completed");
    assert_eq!(report.counters.new, 1);
    assert_eq!(report.counters.errors, 0);

    let org = store.organization("30712345678").expect("org inserted");
    assert_eq!(org.get("legal_name").unwrap(), "ACME SA");

    let entries = store.audit_entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].operation, "insert");
    assert_eq!(entries[0].entity_key, "30712345678");
    assert_eq!(entries[0].actor, "tester");
}

/// An email-only diff classifies as changed with exactly that field, and
/// an unapproved plan commits nothing at all.
#[tokio::test]
async fn changed_email_requires_approval() {
    let store = Arc::new(MemoryStore::new());
    store.seed_organization(fields_map(&[
        ("tax_id", "30712345678"),
        ("legal_name", "ACME SA"),
        ("email", "old@acme.com"),
    ]));
    let pipeline = pipeline_with(&store, ImportConfig::default());

    let preview = pipeline
        .begin(&table(
            &["CUIT", "Razón Social", "Email"],
            &[&["30712345678", "ACME SA", "new@acme.com"]],
        ))
        .await
        .unwrap();

    assert_eq!(preview.plan.changed_organizations.len(), 1);
    assert_eq!(
        preview.plan.changed_organizations[0].changed_field_names(),
        vec!["email"]
    );

    // Nothing approved: commit refuses and nothing is written.
    let err = pipeline
        .commit(&preview.plan, &ApprovalState::default(), &request())
        .await
        .unwrap_err();
    assert_matches!(err, ImportError::NothingApproved);
    assert!(store.batches.lock().unwrap().is_empty());
    assert_eq!(store.audit_count(), 0);
    assert_eq!(
        store.organization("30712345678").unwrap().get("email").unwrap(),
        "old@acme.com"
    );

    // Approved: the email updates and the diff is audited.
    let approval = approve_everything(&preview.plan);
    let report = pipeline
        .commit(&preview.plan, &approval, &request())
        .await
        .unwrap();
    assert_eq!(report.counters.updated, 1);
    assert_eq!(
        store.organization("30712345678").unwrap().get("email").unwrap(),
        "new@acme.com"
    );

    let entries = store.audit_entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].operation, "update");
    assert_eq!(
        entries[0].changed_fields,
        Some(serde_json::json!(["email"]))
    );
    assert_eq!(
        entries[0].previous_values,
        Some(serde_json::json!({ "email": "old@acme.com" }))
    );
}

/// An item whose supplier resolves neither in the store nor in the batch
/// is excluded with a dangling-reference issue.
#[tokio::test]
async fn dangling_supplier_reference_excludes_item() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline_with(&store, ImportConfig::default());

    let preview = pipeline
        .begin(&table(
            &["Código", "Descripción", "CUIT Proveedor"],
            &[&["A-1", "Tornillo 8mm", "20999999990"]],
        ))
        .await
        .unwrap();

    assert!(preview.plan.new_items.is_empty());
    assert!(preview.plan.changed_items.is_empty());
    assert!(preview
        .plan
        .issues
        .iter()
        .any(|i| i.category == IssueCategory::DanglingReference));
}

/// A supplier created in the same batch satisfies the referential check.
#[tokio::test]
async fn same_batch_supplier_reference_resolves() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline_with(&store, ImportConfig::default());

    let preview = pipeline
        .begin(&table(
            &["CUIT", "Razón Social", "Código", "Descripción", "CUIT Proveedor"],
            &[&["30-71234567-8", "ACME SA", "A-1", "Tornillo 8mm", "30712345678"]],
        ))
        .await
        .unwrap();

    assert_eq!(preview.plan.new_organizations.len(), 1);
    assert_eq!(preview.plan.new_items.len(), 1);

    let approval = approve_everything(&preview.plan);
    let report = pipeline
        .commit(&preview.plan, &approval, &request())
        .await
        .unwrap();
    assert_eq!(report.status, "completed");
    assert_eq!(report.counters.new, 2);
    assert!(store.item("A-1").is_some());
}

/// Snapshot failure aborts the batch: zero mutations, zero audit entries,
/// batch marked failed.
#[tokio::test]
async fn snapshot_failure_aborts_with_zero_mutations() {
    let store = Arc::new(MemoryStore::new());
    store.seed_organization(fields_map(&[
        ("tax_id", "30712345678"),
        ("legal_name", "ACME SA"),
        ("email", "old@acme.com"),
    ]));
    store.fail_snapshot.store(true, Ordering::SeqCst);
    let pipeline = pipeline_with(&store, ImportConfig::default());

    let preview = pipeline
        .begin(&table(
            &["CUIT", "Razón Social", "Email"],
            &[&["30712345678", "ACME SA", "new@acme.com"]],
        ))
        .await
        .unwrap();
    let approval = approve_everything(&preview.plan);

    let err = pipeline
        .commit(&preview.plan, &approval, &request())
        .await
        .unwrap_err();
    assert_matches!(err, ImportError::SnapshotFailed(_));

    assert_eq!(
        store.organization("30712345678").unwrap().get("email").unwrap(),
        "old@acme.com"
    );
    assert_eq!(store.audit_count(), 0);
    let batches = store.batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    assert!(batches.values().all(|b| b.status == "failed"));
}

/// The snapshot carries full prior copies of every to-be-updated entity.
#[tokio::test]
async fn snapshot_captures_pre_update_state() {
    let store = Arc::new(MemoryStore::new());
    store.seed_organization(fields_map(&[
        ("tax_id", "30712345678"),
        ("legal_name", "ACME SA"),
        ("email", "old@acme.com"),
    ]));
    let pipeline = pipeline_with(&store, ImportConfig::default());

    let preview = pipeline
        .begin(&table(
            &["CUIT", "Razón Social", "Email"],
            &[&["30712345678", "ACME SA", "new@acme.com"]],
        ))
        .await
        .unwrap();
    let approval = approve_everything(&preview.plan);
    pipeline
        .commit(&preview.plan, &approval, &request())
        .await
        .unwrap();

    let snapshots = store.snapshots.lock().unwrap();
    assert_eq!(snapshots.len(), 1);
    let orgs = snapshots[0].payload["organizations"].as_array().unwrap();
    assert_eq!(orgs.len(), 1);
    assert_eq!(orgs[0]["email"].as_str().unwrap(), "old@acme.com");
}

/// Fill-only never overwrites populated fields and audits only what it
/// actually wrote.
#[tokio::test]
async fn fill_only_preserves_populated_fields() {
    let store = Arc::new(MemoryStore::new());
    store.seed_organization(fields_map(&[
        ("tax_id", "30712345678"),
        ("legal_name", "ACME SA"),
        ("email", "keep@acme.com"),
    ]));
    let config = ImportConfig {
        update_policy: UpdatePolicy::FillOnly,
        ..ImportConfig::default()
    };
    let pipeline = pipeline_with(&store, config);

    let preview = pipeline
        .begin(&table(
            &["CUIT", "Razón Social", "Email", "Teléfono"],
            &[&["30712345678", "ACME SA", "new@acme.com", "11-4444-5555"]],
        ))
        .await
        .unwrap();
    let approval = approve_everything(&preview.plan);
    let report = pipeline
        .commit(&preview.plan, &approval, &request())
        .await
        .unwrap();
    assert_eq!(report.counters.updated, 1);

    let org = store.organization("30712345678").unwrap();
    assert_eq!(org.get("email").unwrap(), "keep@acme.com");
    assert_eq!(org.get("phone").unwrap(), "11-4444-5555");

    let entries = store.audit_entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    // The untouched email must not appear in the audit diff.
    assert_eq!(
        entries[0].changed_fields,
        Some(serde_json::json!(["phone"]))
    );
}

/// Protected fields survive an update untouched.
#[tokio::test]
async fn protected_fields_survive_updates() {
    let store = Arc::new(MemoryStore::new());
    store.seed_item(fields_map(&[
        ("code", "A-1"),
        ("description", "Tornillo viejo"),
        ("external_ref", "ERP-77"),
    ]));
    let pipeline = pipeline_with(&store, ImportConfig::default());

    let preview = pipeline
        .begin(&table(
            &["Código", "Descripción"],
            &[&["A-1", "Tornillo 8mm zincado"]],
        ))
        .await
        .unwrap();
    let approval = approve_everything(&preview.plan);
    pipeline
        .commit(&preview.plan, &approval, &request())
        .await
        .unwrap();

    let item = store.item("A-1").unwrap();
    assert_eq!(item.get("description").unwrap(), "Tornillo 8mm zincado");
    assert_eq!(item.get("external_ref").unwrap(), "ERP-77");
}

/// A failed chunk loses only itself; later chunks apply, the batch ends
/// failed, and audit entries exist only for persisted mutations.
#[tokio::test]
async fn failed_chunk_does_not_halt_the_batch() {
    let store = Arc::new(MemoryStore::new());
    store
        .failing_insert_keys
        .lock()
        .unwrap()
        .insert("30700000001".to_string());
    let config = ImportConfig {
        chunk_size: 1,
        ..ImportConfig::default()
    };
    let pipeline = pipeline_with(&store, config);

    let preview = pipeline
        .begin(&table(
            &["CUIT", "Razón Social"],
            &[
                &["30700000001", "FALLA SA"],
                &["30700000028", "SIGUE SA"],
            ],
        ))
        .await
        .unwrap();
    let approval = approve_everything(&preview.plan);
    let report = pipeline
        .commit(&preview.plan, &approval, &request())
        .await
        .unwrap();

    assert_eq!(report.status, "failed");
    assert_eq!(report.counters.new, 1);
    assert_eq!(report.counters.errors, 1);
    assert!(store.organization("30700000001").is_none());
    assert!(store.organization("30700000028").is_some());
    assert_eq!(store.audit_count(), 1);
    assert!(report.outcomes.iter().any(|o| matches!(
        o,
        ChunkOutcome::Failed { code, .. } if code == "insert_failed"
    )));
}

/// An update that fails at the store loses only its own record; updates
/// after it still land, and only the persisted ones are audited.
#[tokio::test]
async fn failed_update_does_not_halt_remaining_updates() {
    let store = Arc::new(MemoryStore::new());
    store.seed_organization(fields_map(&[
        ("tax_id", "30700000001"),
        ("legal_name", "FALLA SA"),
        ("email", "old@falla.com"),
    ]));
    store.seed_organization(fields_map(&[
        ("tax_id", "30700000028"),
        ("legal_name", "SIGUE SA"),
        ("email", "old@sigue.com"),
    ]));
    store
        .failing_update_keys
        .lock()
        .unwrap()
        .insert("30700000001".to_string());
    let pipeline = pipeline_with(&store, ImportConfig::default());

    let preview = pipeline
        .begin(&table(
            &["CUIT", "Razón Social", "Email"],
            &[
                &["30700000001", "FALLA SA", "new@falla.com"],
                &["30700000028", "SIGUE SA", "new@sigue.com"],
            ],
        ))
        .await
        .unwrap();
    assert_eq!(preview.plan.changed_organizations.len(), 2);

    let approval = approve_everything(&preview.plan);
    let report = pipeline
        .commit(&preview.plan, &approval, &request())
        .await
        .unwrap();

    assert_eq!(report.status, "failed");
    assert_eq!(report.counters.updated, 1);
    assert_eq!(report.counters.errors, 1);
    assert_eq!(
        store.organization("30700000001").unwrap().get("email").unwrap(),
        "old@falla.com"
    );
    assert_eq!(
        store.organization("30700000028").unwrap().get("email").unwrap(),
        "new@sigue.com"
    );
    assert_eq!(store.audit_count(), 1);
    assert!(report.outcomes.iter().any(|o| matches!(
        o,
        ChunkOutcome::Failed { keys, code, .. }
            if keys == &["30700000001".to_string()] && code == "update_failed"
    )));
}

/// One audit entry per persisted mutation, chained by integrity hash.
#[tokio::test]
async fn audit_chain_is_verifiable() {
    let store = Arc::new(MemoryStore::new());
    store.seed_organization(fields_map(&[
        ("tax_id", "30712345678"),
        ("legal_name", "ACME SA"),
        ("email", "old@acme.com"),
    ]));
    let pipeline = pipeline_with(&store, ImportConfig::default());

    let preview = pipeline
        .begin(&table(
            &["CUIT", "Razón Social", "Email"],
            &[
                &["30712345678", "ACME SA", "new@acme.com"],
                &["30-70000002-8", "NUEVA SA", "info@nueva.com"],
            ],
        ))
        .await
        .unwrap();
    let approval = approve_everything(&preview.plan);
    let report = pipeline
        .commit(&preview.plan, &approval, &request())
        .await
        .unwrap();

    let entries = store.audit_entries.lock().unwrap();
    assert_eq!(
        entries.len(),
        (report.counters.new + report.counters.updated) as usize
    );

    let mut prev: Option<String> = None;
    for entry in entries.iter() {
        let data = format!(
            "{}|{}|{}|{}|{}",
            entry.batch_id, entry.entity_type, entry.entity_key, entry.operation, entry.new_values
        );
        assert_eq!(
            entry.integrity_hash,
            compute_integrity_hash(prev.as_deref(), &data)
        );
        prev = Some(entry.integrity_hash.clone());
    }
}

/// Reconciliation is idempotent: same file, same store state, same plan.
#[tokio::test]
async fn reconciliation_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    store.seed_organization(fields_map(&[
        ("tax_id", "30712345678"),
        ("legal_name", "ACME SA"),
    ]));
    let pipeline = pipeline_with(&store, ImportConfig::default());
    let input = table(
        &["CUIT", "Razón Social", "Email"],
        &[&["30712345678", "ACME SA", "ventas@acme.com"]],
    );

    let first = pipeline.begin(&input).await.unwrap();
    let second = pipeline.begin(&input).await.unwrap();
    assert_eq!(first.plan, second.plan);
}

/// A header-only file refuses before classification.
#[tokio::test]
async fn empty_file_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline_with(&store, ImportConfig::default());

    let err = pipeline
        .begin(&table(&["CUIT", "Razón Social"], &[]))
        .await
        .unwrap_err();
    assert_matches!(err, ImportError::EmptyFile);
    assert!(err.aborts_before_classification());
}

/// Stage events appear in order with non-decreasing percentages per run.
#[tokio::test]
async fn progress_stages_follow_the_pipeline() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline_with(&store, ImportConfig::default());
    let mut rx = pipeline.bus().subscribe();

    let preview = pipeline
        .begin(&table(
            &["CUIT", "Razón Social"],
            &[&["30-71234567-8", "ACME SA"]],
        ))
        .await
        .unwrap();
    let approval = approve_everything(&preview.plan);
    let report = pipeline
        .commit(&preview.plan, &approval, &request())
        .await
        .unwrap();

    let mut stages = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if event.batch_id == report.batch_id || event.batch_id == preview.run_id {
            stages.push(event.stage);
        }
    }
    let expect = [
        ImportStage::Parsing,
        ImportStage::Mapping,
        ImportStage::Validating,
        ImportStage::BackingUp,
        ImportStage::Applying,
    ];
    for stage in expect {
        assert!(stages.contains(&stage), "missing stage {stage:?}");
    }
    assert_eq!(*stages.last().unwrap(), ImportStage::Completed);
}
