//! Canonical field names and per-entity field policies.
//!
//! These match the column names of the `organizations` and `items` tables.
//! The comparable/protected/required lists here are defaults only — the
//! effective lists come from [`crate::config::ImportConfig`], which callers
//! may override.

use serde::{Deserialize, Serialize};

/// Sentinel substituted for a missing required field. The row is kept, the
/// gap is visible, and a warning issue is raised alongside.
pub const NOT_FOUND: &str = "NOT_FOUND";

/// Number of digits in a valid tax id after separator stripping.
pub const TAX_ID_DIGITS: usize = 11;

// ── Organization fields ──────────────────────────────────────────────

pub const ORG_TAX_ID: &str = "tax_id";
pub const ORG_LEGAL_NAME: &str = "legal_name";
pub const ORG_TRADE_NAME: &str = "trade_name";
pub const ORG_EMAIL: &str = "email";
pub const ORG_PHONE: &str = "phone";
pub const ORG_ADDRESS: &str = "address";
pub const ORG_CITY: &str = "city";
pub const ORG_PROVINCE: &str = "province";
pub const ORG_POSTAL_CODE: &str = "postal_code";
pub const ORG_REGISTERED_ON: &str = "registered_on";

/// Organization fields never overwritten by imports: identifiers and
/// workflow markers generated downstream of the intake pipeline.
pub const ORG_EXTERNAL_REF: &str = "external_ref";
pub const ORG_PORTAL_URL: &str = "portal_url";
pub const ORG_ONBOARDING_STATUS: &str = "onboarding_status";

/// All organization fields an import row may carry.
pub const ORG_FIELDS: &[&str] = &[
    ORG_TAX_ID,
    ORG_LEGAL_NAME,
    ORG_TRADE_NAME,
    ORG_EMAIL,
    ORG_PHONE,
    ORG_ADDRESS,
    ORG_CITY,
    ORG_PROVINCE,
    ORG_POSTAL_CODE,
    ORG_REGISTERED_ON,
];

/// Default comparable fields for organization reconciliation.
pub const ORG_COMPARABLE_FIELDS: &[&str] = &[
    ORG_LEGAL_NAME,
    ORG_TRADE_NAME,
    ORG_EMAIL,
    ORG_PHONE,
    ORG_ADDRESS,
    ORG_CITY,
    ORG_PROVINCE,
    ORG_POSTAL_CODE,
];

/// Default protected fields for organization updates.
pub const ORG_PROTECTED_FIELDS: &[&str] =
    &[ORG_EXTERNAL_REF, ORG_PORTAL_URL, ORG_ONBOARDING_STATUS];

/// Organization fields that must be present (sentinel-substituted if not).
pub const ORG_REQUIRED_FIELDS: &[&str] = &[ORG_LEGAL_NAME];

// ── Item fields ──────────────────────────────────────────────────────

pub const ITEM_CODE: &str = "code";
pub const ITEM_DESCRIPTION: &str = "description";
pub const ITEM_UNIT: &str = "unit";
pub const ITEM_LIST_PRICE: &str = "list_price";
pub const ITEM_CURRENCY: &str = "currency";
pub const ITEM_CATEGORY: &str = "category";
pub const ITEM_SUPPLIER_TAX_ID: &str = "supplier_tax_id";
pub const ITEM_EXTERNAL_REF: &str = "external_ref";

/// All item fields an import row may carry.
pub const ITEM_FIELDS: &[&str] = &[
    ITEM_CODE,
    ITEM_DESCRIPTION,
    ITEM_UNIT,
    ITEM_LIST_PRICE,
    ITEM_CURRENCY,
    ITEM_CATEGORY,
    ITEM_SUPPLIER_TAX_ID,
];

/// Default comparable fields for item reconciliation.
pub const ITEM_COMPARABLE_FIELDS: &[&str] = &[
    ITEM_DESCRIPTION,
    ITEM_UNIT,
    ITEM_LIST_PRICE,
    ITEM_CURRENCY,
    ITEM_CATEGORY,
];

/// Default protected fields for item updates.
pub const ITEM_PROTECTED_FIELDS: &[&str] = &[ITEM_EXTERNAL_REF];

/// Item fields that must be present (sentinel-substituted if not).
pub const ITEM_REQUIRED_FIELDS: &[&str] = &[ITEM_DESCRIPTION];

// ── Field typing ─────────────────────────────────────────────────────

/// Fields coerced as dates (ISO text, locale text, or spreadsheet serial).
pub const DATE_FIELDS: &[&str] = &[ORG_REGISTERED_ON];

/// Fields coerced as numeric identifiers (non-digits stripped).
pub const IDENTIFIER_FIELDS: &[&str] = &[ORG_TAX_ID, ITEM_SUPPLIER_TAX_ID];

/// The two entity kinds flowing through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Organization,
    Item,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Item => "item",
        }
    }

    /// The canonical field holding this kind's natural key.
    pub fn key_field(&self) -> &'static str {
        match self {
            Self::Organization => ORG_TAX_ID,
            Self::Item => ITEM_CODE,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `field` is coerced as a date.
pub fn is_date_field(field: &str) -> bool {
    DATE_FIELDS.contains(&field)
}

/// Whether `field` is coerced as a numeric identifier.
pub fn is_identifier_field(field: &str) -> bool {
    IDENTIFIER_FIELDS.contains(&field)
}
