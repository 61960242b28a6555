//! Pipeline configuration: limits, chunking, field policies, and the
//! header synonym table.
//!
//! Nothing here is computed by the pipeline itself — these are the inputs a
//! deployment tunes. [`ImportConfig::default`] carries the values the
//! production spreadsheets are known to use.

use serde::{Deserialize, Serialize};

use crate::fields;

/// How updates treat fields already present on the existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePolicy {
    /// Incoming values win, except configured protected fields which are
    /// always carried over from the existing record.
    Merge,
    /// Only currently-empty existing fields are set from the incoming
    /// value; non-empty fields are never overwritten.
    FillOnly,
}

impl UpdatePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::FillOnly => "fill_only",
        }
    }
}

// ── Synonym table ────────────────────────────────────────────────────

/// Maps normalized header text to canonical field names.
///
/// Matching is deterministic: all variants are tried longest-first (ties
/// broken lexicographically), and a variant matches when the normalized
/// header equals or contains it. Longest-first ordering is what keeps
/// `"cuit proveedor"` from being swallowed by the shorter `"cuit"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynonymTable {
    /// (canonical field, accepted normalized header variants).
    entries: Vec<(String, Vec<String>)>,
}

impl SynonymTable {
    /// Build a table from (canonical, variants) pairs. Variants are
    /// expected in normalized form (lowercase, no diacritics).
    pub fn new(entries: Vec<(String, Vec<String>)>) -> Self {
        Self { entries }
    }

    /// Resolve a normalized header to a canonical field, or `None`.
    pub fn resolve(&self, normalized_header: &str) -> Option<&str> {
        // (variant, canonical) pairs, longest variant first.
        let mut candidates: Vec<(&str, &str)> = self
            .entries
            .iter()
            .flat_map(|(canonical, variants)| {
                variants.iter().map(move |v| (v.as_str(), canonical.as_str()))
            })
            .collect();
        candidates.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));

        candidates
            .into_iter()
            .find(|(variant, _)| {
                normalized_header == *variant || normalized_header.contains(*variant)
            })
            .map(|(_, canonical)| canonical)
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        let entry = |canonical: &str, variants: &[&str]| {
            (
                canonical.to_string(),
                variants.iter().map(|v| v.to_string()).collect(),
            )
        };
        Self::new(vec![
            entry(fields::ORG_TAX_ID, &["cuit", "cuit cuil", "nro cuit", "numero de cuit", "tax id"]),
            entry(fields::ORG_LEGAL_NAME, &["razon social", "legal name", "empresa", "proveedor"]),
            entry(fields::ORG_TRADE_NAME, &["nombre fantasia", "nombre comercial", "trade name"]),
            entry(fields::ORG_EMAIL, &["email", "e mail", "mail", "correo electronico", "correo"]),
            entry(fields::ORG_PHONE, &["telefono", "celular", "phone"]),
            entry(fields::ORG_ADDRESS, &["direccion", "domicilio", "address"]),
            entry(fields::ORG_CITY, &["ciudad", "localidad", "city"]),
            entry(fields::ORG_PROVINCE, &["provincia", "province"]),
            entry(fields::ORG_POSTAL_CODE, &["codigo postal", "postal code", "cp", "zip"]),
            entry(
                fields::ORG_REGISTERED_ON,
                &["fecha de alta", "fecha alta", "fecha registro", "registered on"],
            ),
            entry(
                fields::ITEM_CODE,
                &["codigo de articulo", "codigo articulo", "cod articulo", "item code", "codigo", "sku"],
            ),
            entry(fields::ITEM_DESCRIPTION, &["descripcion", "detalle", "articulo", "description"]),
            entry(fields::ITEM_UNIT, &["unidad de medida", "unidad medida", "unidad", "unit", "um"]),
            entry(
                fields::ITEM_LIST_PRICE,
                &["precio de lista", "precio lista", "precio", "importe", "price"],
            ),
            entry(fields::ITEM_CURRENCY, &["moneda", "divisa", "currency"]),
            entry(fields::ITEM_CATEGORY, &["categoria", "rubro", "familia", "category"]),
            entry(
                fields::ITEM_SUPPLIER_TAX_ID,
                &["cuit proveedor", "cuit del proveedor", "supplier tax id"],
            ),
        ])
    }
}

// ── Import configuration ─────────────────────────────────────────────

/// Default maximum input size: 10 MiB.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Default maximum data-row count.
pub const DEFAULT_MAX_ROWS: usize = 10_000;

/// Default chunk size for store writes.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Default value for the reserved concurrency cap.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 4;

/// Tunable configuration for one pipeline instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    pub max_file_bytes: u64,
    pub max_rows: usize,
    pub chunk_size: usize,
    /// Reserved cap for concurrent chunk dispatch. Currently has no
    /// effect: chunks are applied sequentially so the audit sequence
    /// stays deterministic.
    pub concurrency_limit: usize,
    pub update_policy: UpdatePolicy,
    pub synonyms: SynonymTable,
    pub org_comparable_fields: Vec<String>,
    pub item_comparable_fields: Vec<String>,
    pub org_protected_fields: Vec<String>,
    pub item_protected_fields: Vec<String>,
    pub org_required_fields: Vec<String>,
    pub item_required_fields: Vec<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        let owned = |list: &[&str]| list.iter().map(|f| f.to_string()).collect();
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_rows: DEFAULT_MAX_ROWS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            update_policy: UpdatePolicy::Merge,
            synonyms: SynonymTable::default(),
            org_comparable_fields: owned(fields::ORG_COMPARABLE_FIELDS),
            item_comparable_fields: owned(fields::ITEM_COMPARABLE_FIELDS),
            org_protected_fields: owned(fields::ORG_PROTECTED_FIELDS),
            item_protected_fields: owned(fields::ITEM_PROTECTED_FIELDS),
            org_required_fields: owned(fields::ORG_REQUIRED_FIELDS),
            item_required_fields: owned(fields::ITEM_REQUIRED_FIELDS),
        }
    }
}
