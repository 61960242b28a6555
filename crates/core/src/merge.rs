//! Update-policy computation: which fields an update actually writes.
//!
//! Both policies are computed here as pure values so the applier can write
//! exactly the planned fields and audit exactly the planned diff:
//!
//! - **Merge** — incoming values win, except protected fields, which are
//!   always carried over from the existing record (they hold identifiers
//!   and workflow state generated downstream of the intake pipeline).
//! - **Fill-only** — only currently-empty existing fields are set;
//!   non-empty fields are never overwritten and never audited.

use crate::config::UpdatePolicy;
use crate::fields::NOT_FOUND;
use crate::reconcile::FieldChange;
use crate::types::FieldMap;

/// The planned effect of one update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Fields to write, with their new values. Empty means "skip this
    /// update entirely" (and append no audit entry).
    pub writes: FieldMap,
    /// Audit diff: exactly the written fields with old and new values.
    pub changes: Vec<FieldChange>,
}

impl UpdateOutcome {
    pub fn is_noop(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Compute the fields an update writes under the given policy.
///
/// `key_field` and `protected` fields are never written. Absent incoming
/// fields and the `NOT_FOUND` sentinel are "no opinion" and never written.
pub fn plan_update(
    existing: &FieldMap,
    incoming: &FieldMap,
    key_field: &str,
    protected: &[String],
    policy: UpdatePolicy,
) -> UpdateOutcome {
    let mut outcome = UpdateOutcome::default();

    for (field, incoming_value) in incoming {
        if field == key_field || incoming_value == NOT_FOUND {
            continue;
        }
        if protected.iter().any(|p| p == field) {
            continue;
        }

        let existing_value = existing.get(field).filter(|v| !v.is_empty());

        let write = match policy {
            UpdatePolicy::Merge => existing_value.map(String::as_str) != Some(incoming_value),
            UpdatePolicy::FillOnly => existing_value.is_none(),
        };
        if !write {
            continue;
        }

        outcome.writes.insert(field.clone(), incoming_value.clone());
        outcome.changes.push(FieldChange {
            field: field.clone(),
            old: existing_value.cloned(),
            new: incoming_value.clone(),
        });
    }

    outcome
}

// ── Tests ────────────────────────────────────────────────────────────
