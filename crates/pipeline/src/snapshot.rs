//! Pre-processing backup snapshot.
//!
//! Written durably before the first mutating write of a batch. Only
//! to-be-updated entities are captured; inserts have no prior state to
//! preserve. Recovery is operator-driven from the stored payload; there
//! is no automated restore path.

use serde_json::json;
use uuid::Uuid;

use intake_core::approval::ApprovedPlan;
use intake_core::error::ImportError;
use intake_db::models::snapshot::CreateBackupSnapshot;

use crate::store::ImportStore;

/// Build the snapshot payload: full copies of every entity the approved
/// plan is about to update.
pub fn build_payload(approved: &ApprovedPlan) -> serde_json::Value {
    let organizations: Vec<_> = approved
        .changed_organizations
        .iter()
        .map(|detail| &detail.existing)
        .collect();
    let items: Vec<_> = approved
        .changed_items
        .iter()
        .map(|detail| &detail.existing)
        .collect();
    json!({
        "organizations": organizations,
        "items": items,
    })
}

/// Write the one `pre_processing` snapshot row for this batch.
///
/// Any store failure maps to [`ImportError::SnapshotFailed`]; the caller
/// aborts the batch with zero mutations and zero audit entries.
pub async fn take_snapshot(
    store: &dyn ImportStore,
    batch_id: Uuid,
    approved: &ApprovedPlan,
) -> Result<(), ImportError> {
    let payload = build_payload(approved);
    tracing::info!(
        %batch_id,
        organizations = approved.changed_organizations.len(),
        items = approved.changed_items.len(),
        "writing pre-processing snapshot"
    );
    store
        .create_snapshot(&CreateBackupSnapshot { batch_id, payload })
        .await
        .map_err(|err| ImportError::SnapshotFailed(err.to_string()))
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::reconcile::ChangeDetail;
    use intake_core::types::FieldMap;

    fn change(key: &str, field: &str, value: &str) -> ChangeDetail {
        let mut existing = FieldMap::new();
        existing.insert(field.to_string(), value.to_string());
        ChangeDetail {
            key: key.to_string(),
            existing,
            incoming: FieldMap::new(),
            changes: Vec::new(),
        }
    }

    #[test]
    fn payload_contains_only_updated_entities() {
        let mut approved = ApprovedPlan::default();
        approved.changed_organizations.push(change("30712345678", "email", "old@x.com"));
        approved.new_items.push(intake_core::mapper::EntityDraft {
            key: "A-1".to_string(),
            fields: FieldMap::new(),
        });

        let payload = build_payload(&approved);
        assert_eq!(payload["organizations"].as_array().unwrap().len(), 1);
        // New items carry no prior state and must not be snapshotted.
        assert_eq!(payload["items"].as_array().unwrap().len(), 0);
        assert_eq!(
            payload["organizations"][0]["email"].as_str().unwrap(),
            "old@x.com"
        );
    }

    #[test]
    fn empty_update_set_yields_empty_payload() {
        let payload = build_payload(&ApprovedPlan::default());
        assert_eq!(payload["organizations"].as_array().unwrap().len(), 0);
        assert_eq!(payload["items"].as_array().unwrap().len(), 0);
    }
}
