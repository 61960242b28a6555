//! Repository for the `items` table.

use sqlx::PgPool;

use intake_core::fields;
use intake_core::types::FieldMap;

use crate::models::item::Item;

/// Column list for items SELECT queries.
const COLUMNS: &str = "\
    code, description, unit, list_price, currency, category, \
    supplier_tax_id, external_ref, created_at, updated_at";

/// Column list for INSERT (excludes auto-generated timestamps).
const INSERT_COLUMNS: &str = "\
    code, description, unit, list_price, currency, category, \
    supplier_tax_id, external_ref";

const INSERT_BINDS: usize = 8;

/// Columns that may appear in a dynamic UPDATE.
const UPDATABLE_COLUMNS: &[&str] = &[
    fields::ITEM_DESCRIPTION,
    fields::ITEM_UNIT,
    fields::ITEM_LIST_PRICE,
    fields::ITEM_CURRENCY,
    fields::ITEM_CATEGORY,
    fields::ITEM_SUPPLIER_TAX_ID,
];

/// Provides query and mutation operations for catalog items.
pub struct ItemRepo;

impl ItemRepo {
    /// Fetch the items whose codes appear in `keys`.
    pub async fn find_by_keys(pool: &PgPool, keys: &[String]) -> Result<Vec<Item>, sqlx::Error> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!("SELECT {COLUMNS} FROM items WHERE code = ANY($1)");
        sqlx::query_as::<_, Item>(&query)
            .bind(keys)
            .fetch_all(pool)
            .await
    }

    /// Batch insert items from canonical field maps.
    pub async fn insert_many(pool: &PgPool, drafts: &[FieldMap]) -> Result<Vec<Item>, sqlx::Error> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = format!("INSERT INTO items ({INSERT_COLUMNS}) VALUES ");
        let mut param_idx = 1usize;
        let mut first = true;

        for _ in drafts {
            if !first {
                query.push_str(", ");
            }
            first = false;
            query.push('(');
            for i in 0..INSERT_BINDS {
                if i > 0 {
                    query.push_str(", ");
                }
                query.push_str(&format!("${param_idx}"));
                param_idx += 1;
            }
            query.push(')');
        }

        query.push_str(&format!(" RETURNING {COLUMNS}"));

        let mut q = sqlx::query_as::<_, Item>(&query);
        for draft in drafts {
            q = q
                .bind(draft.get(fields::ITEM_CODE).cloned())
                .bind(draft.get(fields::ITEM_DESCRIPTION).cloned())
                .bind(draft.get(fields::ITEM_UNIT).cloned())
                .bind(draft.get(fields::ITEM_LIST_PRICE).cloned())
                .bind(draft.get(fields::ITEM_CURRENCY).cloned())
                .bind(draft.get(fields::ITEM_CATEGORY).cloned())
                .bind(draft.get(fields::ITEM_SUPPLIER_TAX_ID).cloned())
                .bind(draft.get(fields::ITEM_EXTERNAL_REF).cloned());
        }

        q.fetch_all(pool).await
    }

    /// Apply a planned set of field writes to one item.
    ///
    /// Only whitelisted columns are updated. Returns the updated row,
    /// or `None` if the key does not exist.
    pub async fn update_fields(
        pool: &PgPool,
        code: &str,
        writes: &FieldMap,
    ) -> Result<Option<Item>, sqlx::Error> {
        let mut sets: Vec<String> = Vec::new();
        let mut bind_idx = 2u32; // $1 is code
        let mut bind_values: Vec<String> = Vec::new();

        for column in UPDATABLE_COLUMNS {
            let Some(value) = writes.get(*column) else {
                continue;
            };
            sets.push(format!("{column} = ${bind_idx}"));
            bind_idx += 1;
            bind_values.push(value.clone());
        }

        if sets.is_empty() {
            let query = format!("SELECT {COLUMNS} FROM items WHERE code = $1");
            return sqlx::query_as::<_, Item>(&query)
                .bind(code)
                .fetch_optional(pool)
                .await;
        }

        sets.push("updated_at = NOW()".to_string());

        let query = format!(
            "UPDATE items SET {} WHERE code = $1 RETURNING {COLUMNS}",
            sets.join(", ")
        );

        let mut q = sqlx::query_as::<_, Item>(&query).bind(code);
        for val in &bind_values {
            q = q.bind(val.as_str());
        }

        q.fetch_optional(pool).await
    }
}
