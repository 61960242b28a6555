//! Approval gate: operator-held approval state and plan filtering.
//!
//! The gate holds no persistent state and performs no I/O. The operator's
//! toggles are an explicit [`ApprovalState`] value passed into commit,
//! which makes the commit a pure function of the approved subsets. Nothing
//! is ever assumed approved.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ImportError;
use crate::mapper::EntityDraft;
use crate::reconcile::{ChangeDetail, ReconciliationPlan};

/// The four approval categories, mirroring the classified sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalCategory {
    NewOrganizations,
    ChangedOrganizations,
    NewItems,
    ChangedItems,
}

impl ApprovalCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewOrganizations => "new_organizations",
            Self::ChangedOrganizations => "changed_organizations",
            Self::NewItems => "new_items",
            Self::ChangedItems => "changed_items",
        }
    }
}

/// Per-category key → approved map, supplied by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApprovalState {
    pub new_organizations: HashMap<String, bool>,
    pub changed_organizations: HashMap<String, bool>,
    pub new_items: HashMap<String, bool>,
    pub changed_items: HashMap<String, bool>,
}

/// The approved subset of a [`ReconciliationPlan`], ready for commit.
#[derive(Debug, Clone, Default)]
pub struct ApprovedPlan {
    pub new_organizations: Vec<EntityDraft>,
    pub changed_organizations: Vec<ChangeDetail>,
    pub new_items: Vec<EntityDraft>,
    pub changed_items: Vec<ChangeDetail>,
}

impl ApprovedPlan {
    /// Total number of approved records.
    pub fn record_count(&self) -> usize {
        self.new_organizations.len()
            + self.changed_organizations.len()
            + self.new_items.len()
            + self.changed_items.len()
    }

    /// All natural keys touched by this plan, organizations then items,
    /// each group sorted. Used for advisory per-key locking.
    pub fn touched_keys(&self) -> (Vec<String>, Vec<String>) {
        let mut org_keys: Vec<String> = self
            .new_organizations
            .iter()
            .map(|d| d.key.clone())
            .chain(self.changed_organizations.iter().map(|c| c.key.clone()))
            .collect();
        let mut item_keys: Vec<String> = self
            .new_items
            .iter()
            .map(|d| d.key.clone())
            .chain(self.changed_items.iter().map(|c| c.key.clone()))
            .collect();
        org_keys.sort();
        item_keys.sort();
        (org_keys, item_keys)
    }
}

impl ApprovalState {
    fn category_mut(&mut self, category: ApprovalCategory) -> &mut HashMap<String, bool> {
        match category {
            ApprovalCategory::NewOrganizations => &mut self.new_organizations,
            ApprovalCategory::ChangedOrganizations => &mut self.changed_organizations,
            ApprovalCategory::NewItems => &mut self.new_items,
            ApprovalCategory::ChangedItems => &mut self.changed_items,
        }
    }

    fn category(&self, category: ApprovalCategory) -> &HashMap<String, bool> {
        match category {
            ApprovalCategory::NewOrganizations => &self.new_organizations,
            ApprovalCategory::ChangedOrganizations => &self.changed_organizations,
            ApprovalCategory::NewItems => &self.new_items,
            ApprovalCategory::ChangedItems => &self.changed_items,
        }
    }

    /// Flip one key's approval. Unset keys toggle to approved.
    pub fn toggle(&mut self, category: ApprovalCategory, key: &str) {
        let map = self.category_mut(category);
        let current = map.get(key).copied().unwrap_or(false);
        map.insert(key.to_string(), !current);
    }

    /// Whether a key is approved. Unset keys are not approved.
    pub fn is_approved(&self, category: ApprovalCategory, key: &str) -> bool {
        self.category(category).get(key).copied().unwrap_or(false)
    }

    /// Approve every key of `category` present in `plan`.
    pub fn approve_all(&mut self, category: ApprovalCategory, plan: &ReconciliationPlan) {
        let keys: Vec<String> = match category {
            ApprovalCategory::NewOrganizations => {
                plan.new_organizations.iter().map(|d| d.key.clone()).collect()
            }
            ApprovalCategory::ChangedOrganizations => {
                plan.changed_organizations.iter().map(|c| c.key.clone()).collect()
            }
            ApprovalCategory::NewItems => plan.new_items.iter().map(|d| d.key.clone()).collect(),
            ApprovalCategory::ChangedItems => {
                plan.changed_items.iter().map(|c| c.key.clone()).collect()
            }
        };
        let map = self.category_mut(category);
        for key in keys {
            map.insert(key, true);
        }
    }

    /// Reject every key of `category`.
    pub fn reject_all(&mut self, category: ApprovalCategory) {
        let map = self.category_mut(category);
        for value in map.values_mut() {
            *value = false;
        }
    }

    /// Intersect the classified sets with this approval state.
    ///
    /// Refuses with [`ImportError::NothingApproved`] when the union of all
    /// four approved subsets is empty — backup and apply must not run as
    /// a no-op.
    pub fn filter(&self, plan: &ReconciliationPlan) -> Result<ApprovedPlan, ImportError> {
        let approved = ApprovedPlan {
            new_organizations: plan
                .new_organizations
                .iter()
                .filter(|d| self.is_approved(ApprovalCategory::NewOrganizations, &d.key))
                .cloned()
                .collect(),
            changed_organizations: plan
                .changed_organizations
                .iter()
                .filter(|c| self.is_approved(ApprovalCategory::ChangedOrganizations, &c.key))
                .cloned()
                .collect(),
            new_items: plan
                .new_items
                .iter()
                .filter(|d| self.is_approved(ApprovalCategory::NewItems, &d.key))
                .cloned()
                .collect(),
            changed_items: plan
                .changed_items
                .iter()
                .filter(|c| self.is_approved(ApprovalCategory::ChangedItems, &c.key))
                .cloned()
                .collect(),
        };

        if approved.record_count() == 0 {
            return Err(ImportError::NothingApproved);
        }
        Ok(approved)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
