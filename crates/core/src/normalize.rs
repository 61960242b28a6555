//! Normalizer: raw headers + rows into canonical-field row objects.
//!
//! Responsibilities, in order:
//!
//! 1. Enforce input limits (byte size, row count, non-empty) before any
//!    row is read.
//! 2. Normalize header text (lowercase, diacritics stripped, whitespace
//!    collapsed) and resolve each header to a canonical field through the
//!    configured [`SynonymTable`](crate::config::SynonymTable).
//! 3. Coerce cells per field type: dates to ISO, identifiers to bare
//!    digits, empty/whitespace cells to "absent".

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::fields;
use crate::issue::{IssueCategory, ValidationIssue};
use crate::types::FieldMap;

/// Raw tabular input: one header row plus data rows, with the byte size of
/// the file they came from. How the bytes became rows (CSV, XLSX, ...) is
/// the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub byte_size: u64,
}

/// One data row reduced to its resolved canonical fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedRow {
    /// 1-based data row number (header row excluded), for issue messages.
    pub row_number: usize,
    pub fields: FieldMap,
}

/// Output of the normalizer.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub rows: Vec<NormalizedRow>,
    /// Normalized header names that resolved to no canonical field, sorted
    /// and deduplicated.
    pub unmapped_headers: Vec<String>,
    /// One warning per unmapped header.
    pub issues: Vec<ValidationIssue>,
}

/// Spreadsheet date-serial epoch (the usual 1900 system with its leap-year
/// quirk folded in, hence December 30th).
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Serial numbers outside this range are not treated as dates.
const SERIAL_MIN: i64 = 1;
const SERIAL_MAX: i64 = 200_000;

// ── Entry point ──────────────────────────────────────────────────────

/// Normalize a raw table against the configured limits and synonym table.
pub fn normalize_table(
    table: &RawTable,
    config: &ImportConfig,
) -> Result<NormalizedTable, ImportError> {
    if table.byte_size > config.max_file_bytes {
        return Err(ImportError::FileTooLarge {
            actual: table.byte_size,
            limit: config.max_file_bytes,
        });
    }
    if table.rows.len() > config.max_rows {
        return Err(ImportError::TooManyRows {
            actual: table.rows.len(),
            limit: config.max_rows,
        });
    }
    if table.rows.is_empty() {
        return Err(ImportError::EmptyFile);
    }

    // Resolve each header column to a canonical field (or None).
    let mut resolved: Vec<Option<String>> = Vec::with_capacity(table.headers.len());
    let mut unmapped: Vec<String> = Vec::new();
    for header in &table.headers {
        let normalized = normalize_header(header);
        if normalized.is_empty() {
            // Blank filler column. It still occupies a column index, so a
            // placeholder keeps later columns aligned; no warning, since
            // there is no header text to report.
            resolved.push(None);
            continue;
        }
        match config.synonyms.resolve(&normalized) {
            Some(canonical) => resolved.push(Some(canonical.to_string())),
            None => {
                resolved.push(None);
                unmapped.push(normalized);
            }
        }
    }
    unmapped.sort();
    unmapped.dedup();

    // Without a key column nothing downstream can be keyed.
    let has_key_column = resolved.iter().flatten().any(|canonical| {
        canonical == fields::ORG_TAX_ID || canonical == fields::ITEM_CODE
    });
    if !has_key_column {
        return Err(ImportError::MissingKeyColumn);
    }

    let issues = unmapped
        .iter()
        .map(|header| {
            ValidationIssue::warning(
                IssueCategory::UnmappedHeader,
                format!("Header '{header}' does not match any known column"),
            )
            .with_field(header.clone())
        })
        .collect();

    let mut rows = Vec::with_capacity(table.rows.len());
    for (index, raw_row) in table.rows.iter().enumerate() {
        let mut field_map = FieldMap::new();
        for (column, cell) in raw_row.iter().enumerate() {
            let Some(Some(canonical)) = resolved.get(column) else {
                continue;
            };
            if let Some(value) = coerce_cell(canonical, cell) {
                field_map.insert(canonical.clone(), value);
            }
        }
        // Rows with no resolved values carry no information at all.
        if !field_map.is_empty() {
            rows.push(NormalizedRow {
                row_number: index + 1,
                fields: field_map,
            });
        }
    }

    Ok(NormalizedTable {
        rows,
        unmapped_headers: unmapped,
        issues,
    })
}

// ── Header normalization ─────────────────────────────────────────────

/// Lowercase, strip diacritics, collapse whitespace runs to single spaces.
pub fn normalize_header(header: &str) -> String {
    let stripped: String = header
        .to_lowercase()
        .chars()
        .map(strip_diacritic)
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fold the accented characters seen in real-world headers to ASCII.
fn strip_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

// ── Cell coercion ────────────────────────────────────────────────────

/// Coerce one cell for its canonical field. Returns `None` when the cell
/// is absent (empty or whitespace-only) — the field then simply has no
/// entry, which downstream stages read as "no opinion".
pub fn coerce_cell(canonical: &str, raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if fields::is_date_field(canonical) {
        return Some(coerce_date(trimmed));
    }
    if fields::is_identifier_field(canonical) {
        let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return None;
        }
        return Some(digits);
    }
    Some(trimmed.to_string())
}

/// Coerce date text to ISO `YYYY-MM-DD`.
///
/// Accepts ISO, `dd/mm/yyyy`, `dd-mm-yyyy`, and spreadsheet date serials
/// (days since 1899-12-30). Text that parses as none of these passes
/// through verbatim so the operator can see it at the approval stage.
pub fn coerce_date(text: &str) -> String {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    for format in ["%d/%m/%Y", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    if let Ok(serial) = text.parse::<i64>() {
        if (SERIAL_MIN..=SERIAL_MAX).contains(&serial) {
            let (y, m, d) = SERIAL_EPOCH;
            if let Some(epoch) = NaiveDate::from_ymd_opt(y, m, d) {
                if let Some(date) = epoch.checked_add_days(chrono::Days::new(serial as u64)) {
                    return date.format("%Y-%m-%d").to_string();
                }
            }
        }
    }
    text.to_string()
}

// ── Tests ────────────────────────────────────────────────────────────
