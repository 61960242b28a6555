//! Reconciliation engine: classify extracted drafts against existing
//! records as New / Unchanged / Changed, with field-level diffs.
//!
//! This stage is a pure function of (drafts, pre-fetched existing records,
//! config). The pipeline performs the batched store lookups — one
//! keys-in-list query per entity type — and hands the results in, so
//! re-running reconciliation on identical input yields identical output.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::ImportConfig;
use crate::fields;
use crate::issue::{IssueCategory, ValidationIssue};
use crate::mapper::{EntityDraft, ExtractedEntities};
use crate::types::FieldMap;

/// One differing comparable field on a changed entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    /// Existing value; `None` when the field is empty on the record.
    pub old: Option<String>,
    pub new: String,
}

/// A classified change: the existing record, the incoming draft, and
/// exactly the fields that differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDetail {
    pub key: String,
    pub existing: FieldMap,
    pub incoming: FieldMap,
    pub changes: Vec<FieldChange>,
}

impl ChangeDetail {
    /// Names of the differing fields, in field order.
    pub fn changed_field_names(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.field.as_str()).collect()
    }
}

/// Classified sets for one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub new_organizations: Vec<EntityDraft>,
    pub changed_organizations: Vec<ChangeDetail>,
    pub unchanged_organizations: usize,
    pub new_items: Vec<EntityDraft>,
    pub changed_items: Vec<ChangeDetail>,
    pub unchanged_items: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ReconciliationPlan {
    /// Total number of classified records awaiting approval.
    pub fn pending_count(&self) -> usize {
        self.new_organizations.len()
            + self.changed_organizations.len()
            + self.new_items.len()
            + self.changed_items.len()
    }
}

/// Classify extracted entities against pre-fetched existing records.
///
/// `existing_organizations` / `existing_items` map natural keys to the
/// current persisted field values for every key present in the file.
pub fn reconcile(
    extracted: &ExtractedEntities,
    existing_organizations: &HashMap<String, FieldMap>,
    existing_items: &HashMap<String, FieldMap>,
    config: &ImportConfig,
) -> ReconciliationPlan {
    let mut plan = ReconciliationPlan {
        issues: extracted.issues.clone(),
        ..Default::default()
    };

    for draft in &extracted.organizations {
        match classify(draft, existing_organizations.get(&draft.key), &config.org_comparable_fields) {
            Classification::New => plan.new_organizations.push(draft.clone()),
            Classification::Unchanged => plan.unchanged_organizations += 1,
            Classification::Changed(detail) => plan.changed_organizations.push(detail),
        }
    }

    // Keys an item may legitimately reference: already stored, or created
    // by this very batch.
    let new_org_keys: HashSet<&str> = plan
        .new_organizations
        .iter()
        .map(|d| d.key.as_str())
        .collect();

    for draft in &extracted.items {
        if let Some(supplier_key) = draft.fields.get(fields::ITEM_SUPPLIER_TAX_ID) {
            let resolves = existing_organizations.contains_key(supplier_key)
                || new_org_keys.contains(supplier_key.as_str());
            if !resolves {
                plan.issues.push(
                    ValidationIssue::error(
                        IssueCategory::DanglingReference,
                        draft.key.clone(),
                        format!(
                            "Item '{}' references supplier '{supplier_key}' which is neither stored nor part of this batch",
                            draft.key
                        ),
                    )
                    .with_field(fields::ITEM_SUPPLIER_TAX_ID),
                );
                // Fails open toward exclusion: the item enters neither set.
                continue;
            }
        }

        match classify(draft, existing_items.get(&draft.key), &config.item_comparable_fields) {
            Classification::New => plan.new_items.push(draft.clone()),
            Classification::Unchanged => plan.unchanged_items += 1,
            Classification::Changed(detail) => plan.changed_items.push(detail),
        }
    }

    plan
}

// ── Classification ───────────────────────────────────────────────────

enum Classification {
    New,
    Unchanged,
    Changed(ChangeDetail),
}

/// Compare one draft against its existing record over the declared
/// comparable fields. Absent incoming values mean "no opinion" and can
/// never produce a diff entry.
fn classify(
    draft: &EntityDraft,
    existing: Option<&FieldMap>,
    comparable: &[String],
) -> Classification {
    let Some(existing) = existing else {
        return Classification::New;
    };

    let mut changes = Vec::new();
    for field in comparable {
        let Some(incoming) = draft.fields.get(field) else {
            continue;
        };
        // The sentinel marks "missing in the source"; it carries no
        // opinion about the stored value.
        if incoming == fields::NOT_FOUND {
            continue;
        }
        let old = existing.get(field).filter(|v| !v.is_empty());
        if old.map(String::as_str) != Some(incoming.as_str()) {
            changes.push(FieldChange {
                field: field.clone(),
                old: old.cloned(),
                new: incoming.clone(),
            });
        }
    }

    if changes.is_empty() {
        Classification::Unchanged
    } else {
        Classification::Changed(ChangeDetail {
            key: draft.key.clone(),
            existing: existing.clone(),
            incoming: draft.fields.clone(),
            changes,
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────
