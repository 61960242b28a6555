//! Shared type aliases used across the intake crates.

use std::collections::BTreeMap;

/// UTC timestamp used throughout the workspace.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Canonical-field map for one entity or row.
///
/// Keys are canonical field names (see [`crate::fields`]); values are the
/// coerced cell text. A field that was absent or empty in the source simply
/// has no entry — "absent" and "empty string" are deliberately distinct,
/// and only the former can occur here.
pub type FieldMap = BTreeMap<String, String>;
