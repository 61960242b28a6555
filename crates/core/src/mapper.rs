//! Entity mapper: normalized rows into deduplicated, keyed entity drafts.
//!
//! Each row may yield at most one organization draft and one item draft.
//! The first occurrence of a natural key wins; later rows with the same
//! key are dropped for that entity type with a duplicate-key issue.
//! Merge-on-duplicate is a possible future policy; until then the first
//! row is the authoritative one.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::ImportConfig;
use crate::fields::{self, EntityKind, NOT_FOUND, TAX_ID_DIGITS};
use crate::issue::{IssueCategory, ValidationIssue};
use crate::normalize::{NormalizedRow, NormalizedTable};
use crate::types::FieldMap;

/// A keyed entity candidate extracted from the file, not yet classified
/// against the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDraft {
    pub key: String,
    /// Canonical fields present in the source, key field included.
    pub fields: FieldMap,
}

/// Output of the mapping stage.
#[derive(Debug, Clone, Default)]
pub struct ExtractedEntities {
    /// Organization drafts in first-occurrence order.
    pub organizations: Vec<EntityDraft>,
    /// Item drafts in first-occurrence order.
    pub items: Vec<EntityDraft>,
    /// Accumulated issues: normalizer warnings plus row-level findings.
    pub issues: Vec<ValidationIssue>,
    /// Carried through from the normalizer.
    pub unmapped_headers: Vec<String>,
}

/// Split normalized rows into deduplicated organization and item drafts.
pub fn extract_entities(table: &NormalizedTable, config: &ImportConfig) -> ExtractedEntities {
    let mut out = ExtractedEntities {
        unmapped_headers: table.unmapped_headers.clone(),
        issues: table.issues.clone(),
        ..Default::default()
    };

    let mut seen_org_keys: HashSet<String> = HashSet::new();
    let mut seen_item_keys: HashSet<String> = HashSet::new();

    for row in &table.rows {
        extract_organization(row, config, &mut seen_org_keys, &mut out);
        extract_item(row, config, &mut seen_item_keys, &mut out);
    }

    out
}

// ── Organization extraction ──────────────────────────────────────────

fn extract_organization(
    row: &NormalizedRow,
    config: &ImportConfig,
    seen: &mut HashSet<String>,
    out: &mut ExtractedEntities,
) {
    let has_org_data = fields::ORG_FIELDS
        .iter()
        .any(|f| *f != fields::ORG_TAX_ID && row.fields.contains_key(*f));

    let Some(raw_key) = row.fields.get(fields::ORG_TAX_ID) else {
        // A row with organization data but no tax id is a hard row error
        // for the organization side only.
        if has_org_data {
            out.issues.push(
                ValidationIssue::error(
                    IssueCategory::MissingKey,
                    format!("row {}", row.row_number),
                    format!(
                        "Row {} has organization data but no tax id",
                        row.row_number
                    ),
                )
                .with_field(fields::ORG_TAX_ID),
            );
        }
        return;
    };

    // The normalizer already stripped separators; only length can be wrong.
    if raw_key.len() != TAX_ID_DIGITS {
        out.issues.push(
            ValidationIssue::error(
                IssueCategory::InvalidTaxId,
                raw_key.clone(),
                format!(
                    "Row {}: tax id '{raw_key}' is not {TAX_ID_DIGITS} digits",
                    row.row_number
                ),
            )
            .with_field(fields::ORG_TAX_ID),
        );
        return;
    }

    if !seen.insert(raw_key.clone()) {
        out.issues.push(
            ValidationIssue::error(
                IssueCategory::DuplicateKey,
                raw_key.clone(),
                format!(
                    "Row {}: duplicate tax id '{raw_key}'; first occurrence kept",
                    row.row_number
                ),
            )
            .with_field(fields::ORG_TAX_ID),
        );
        return;
    }

    let draft = build_draft(
        row,
        raw_key,
        fields::ORG_FIELDS,
        &config.org_required_fields,
        EntityKind::Organization,
        &mut out.issues,
    );
    out.organizations.push(draft);
}

// ── Item extraction ──────────────────────────────────────────────────

fn extract_item(
    row: &NormalizedRow,
    config: &ImportConfig,
    seen: &mut HashSet<String>,
    out: &mut ExtractedEntities,
) {
    let has_item_data = fields::ITEM_FIELDS
        .iter()
        .any(|f| *f != fields::ITEM_CODE && row.fields.contains_key(*f));

    let Some(raw_key) = row.fields.get(fields::ITEM_CODE) else {
        if has_item_data {
            out.issues.push(
                ValidationIssue::error(
                    IssueCategory::MissingKey,
                    format!("row {}", row.row_number),
                    format!("Row {} has item data but no item code", row.row_number),
                )
                .with_field(fields::ITEM_CODE),
            );
        }
        return;
    };

    // Item codes are taken verbatim; the normalizer guarantees non-empty.
    if !seen.insert(raw_key.clone()) {
        out.issues.push(
            ValidationIssue::error(
                IssueCategory::DuplicateKey,
                raw_key.clone(),
                format!(
                    "Row {}: duplicate item code '{raw_key}'; first occurrence kept",
                    row.row_number
                ),
            )
            .with_field(fields::ITEM_CODE),
        );
        return;
    }

    let draft = build_draft(
        row,
        raw_key,
        fields::ITEM_FIELDS,
        &config.item_required_fields,
        EntityKind::Item,
        &mut out.issues,
    );
    out.items.push(draft);
}

// ── Shared draft construction ────────────────────────────────────────

fn build_draft(
    row: &NormalizedRow,
    key: &str,
    kind_fields: &[&str],
    required: &[String],
    kind: EntityKind,
    issues: &mut Vec<ValidationIssue>,
) -> EntityDraft {
    let mut field_map = FieldMap::new();
    for field in kind_fields {
        if let Some(value) = row.fields.get(*field) {
            field_map.insert(field.to_string(), value.clone());
        }
    }

    // Missing required fields do not reject the entity; they get the
    // sentinel and a warning so the gap stays visible.
    for field in required {
        if !field_map.contains_key(field) {
            field_map.insert(field.clone(), NOT_FOUND.to_string());
            issues.push(
                ValidationIssue::warning(
                    IssueCategory::MissingRequiredField,
                    format!(
                        "Row {}: {kind} '{key}' is missing required field '{field}'",
                        row.row_number
                    ),
                )
                .with_key(key)
                .with_field(field.clone()),
            );
        }
    }

    EntityDraft {
        key: key.to_string(),
        fields: field_map,
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::Severity;

    fn row(number: usize, pairs: &[(&str, &str)]) -> NormalizedRow {
        NormalizedRow {
            row_number: number,
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn table(rows: Vec<NormalizedRow>) -> NormalizedTable {
        NormalizedTable {
            rows,
            unmapped_headers: Vec::new(),
            issues: Vec::new(),
        }
    }

    #[test]
    fn one_row_yields_org_and_item() {
        let t = table(vec![row(
            1,
            &[
                ("tax_id", "30712345678"),
                ("legal_name", "ACME SA"),
                ("code", "A-001"),
                ("description", "Widget"),
            ],
        )]);
        let extracted = extract_entities(&t, &ImportConfig::default());
        assert_eq!(extracted.organizations.len(), 1);
        assert_eq!(extracted.items.len(), 1);
        assert_eq!(extracted.organizations[0].key, "30712345678");
        assert_eq!(extracted.items[0].key, "A-001");
        assert!(extracted.issues.is_empty());
    }

    #[test]
    fn duplicate_tax_id_first_occurrence_wins() {
        let t = table(vec![
            row(1, &[("tax_id", "30712345678"), ("legal_name", "First SA")]),
            row(2, &[("tax_id", "30712345678"), ("legal_name", "Second SA")]),
        ]);
        let extracted = extract_entities(&t, &ImportConfig::default());
        assert_eq!(extracted.organizations.len(), 1);
        assert_eq!(
            extracted.organizations[0].fields.get("legal_name").unwrap(),
            "First SA"
        );
        let dup: Vec<_> = extracted
            .issues
            .iter()
            .filter(|i| i.category == IssueCategory::DuplicateKey)
            .collect();
        assert_eq!(dup.len(), 1);
        assert_eq!(dup[0].severity, Severity::Error);
        assert_eq!(dup[0].key.as_deref(), Some("30712345678"));
    }

    #[test]
    fn invalid_tax_id_fails_org_extraction_only() {
        let t = table(vec![row(
            1,
            &[
                ("tax_id", "123"),
                ("legal_name", "Short SA"),
                ("code", "A-001"),
                ("description", "Widget"),
            ],
        )]);
        let extracted = extract_entities(&t, &ImportConfig::default());
        assert!(extracted.organizations.is_empty());
        // The item side of the same row still extracts.
        assert_eq!(extracted.items.len(), 1);
        assert!(extracted
            .issues
            .iter()
            .any(|i| i.category == IssueCategory::InvalidTaxId));
    }

    #[test]
    fn missing_required_field_gets_sentinel_and_warning() {
        let t = table(vec![row(
            1,
            &[("tax_id", "30712345678"), ("email", "a@b.c")],
        )]);
        let extracted = extract_entities(&t, &ImportConfig::default());
        assert_eq!(extracted.organizations.len(), 1);
        assert_eq!(
            extracted.organizations[0].fields.get("legal_name").unwrap(),
            NOT_FOUND
        );
        let warning = extracted
            .issues
            .iter()
            .find(|i| i.category == IssueCategory::MissingRequiredField)
            .unwrap();
        assert_eq!(warning.severity, Severity::Warning);
        assert_eq!(warning.field.as_deref(), Some("legal_name"));
    }

    #[test]
    fn org_data_without_tax_id_is_row_error() {
        let t = table(vec![row(1, &[("legal_name", "No Key SA")])]);
        let extracted = extract_entities(&t, &ImportConfig::default());
        assert!(extracted.organizations.is_empty());
        assert!(extracted
            .issues
            .iter()
            .any(|i| i.category == IssueCategory::MissingKey && i.severity == Severity::Error));
    }

    #[test]
    fn item_only_rows_do_not_raise_org_issues() {
        let t = table(vec![row(1, &[("code", "A-001"), ("description", "Widget")])]);
        let extracted = extract_entities(&t, &ImportConfig::default());
        assert!(extracted.organizations.is_empty());
        assert_eq!(extracted.items.len(), 1);
        assert!(extracted
            .issues
            .iter()
            .all(|i| i.category != IssueCategory::MissingKey));
    }

    #[test]
    fn drafts_keep_first_occurrence_order() {
        let t = table(vec![
            row(1, &[("tax_id", "30712345678"), ("legal_name", "A")]),
            row(2, &[("tax_id", "30887654321"), ("legal_name", "B")]),
            row(3, &[("tax_id", "30999999990"), ("legal_name", "C")]),
        ]);
        let extracted = extract_entities(&t, &ImportConfig::default());
        let keys: Vec<_> = extracted.organizations.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["30712345678", "30887654321", "30999999990"]);
    }

    #[test]
    fn draft_fields_exclude_unrelated_columns() {
        let t = table(vec![row(
            1,
            &[
                ("tax_id", "30712345678"),
                ("legal_name", "ACME SA"),
                ("description", "Widget"), // item field, no code present
            ],
        )]);
        let extracted = extract_entities(&t, &ImportConfig::default());
        assert!(!extracted.organizations[0].fields.contains_key("description"));
        // Item data without a code raises the row error.
        assert!(extracted
            .issues
            .iter()
            .any(|i| i.category == IssueCategory::MissingKey));
    }
}
