//! Repository for the `organizations` table.

use chrono::NaiveDate;
use sqlx::PgPool;

use intake_core::fields;
use intake_core::types::FieldMap;

use crate::models::organization::{parse_date_field, Organization};

/// Column list for organizations SELECT queries.
const COLUMNS: &str = "\
    tax_id, legal_name, trade_name, email, phone, address, city, \
    province, postal_code, registered_on, external_ref, portal_url, \
    onboarding_status, created_at, updated_at";

/// Column list for INSERT (excludes auto-generated timestamps).
const INSERT_COLUMNS: &str = "\
    tax_id, legal_name, trade_name, email, phone, address, city, \
    province, postal_code, registered_on, external_ref, portal_url, \
    onboarding_status";

const INSERT_BINDS: usize = 13;

/// Columns that may appear in a dynamic UPDATE. The key column and the
/// timestamps are excluded; callers are expected to have filtered
/// protected fields already, but the whitelist holds regardless.
const UPDATABLE_COLUMNS: &[&str] = &[
    fields::ORG_LEGAL_NAME,
    fields::ORG_TRADE_NAME,
    fields::ORG_EMAIL,
    fields::ORG_PHONE,
    fields::ORG_ADDRESS,
    fields::ORG_CITY,
    fields::ORG_PROVINCE,
    fields::ORG_POSTAL_CODE,
    fields::ORG_REGISTERED_ON,
];

/// Provides query and mutation operations for organizations.
pub struct OrganizationRepo;

impl OrganizationRepo {
    /// Fetch the organizations whose tax ids appear in `keys`.
    pub async fn find_by_keys(
        pool: &PgPool,
        keys: &[String],
    ) -> Result<Vec<Organization>, sqlx::Error> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!("SELECT {COLUMNS} FROM organizations WHERE tax_id = ANY($1)");
        sqlx::query_as::<_, Organization>(&query)
            .bind(keys)
            .fetch_all(pool)
            .await
    }

    /// Fetch every organization tax id. Used for referential checks.
    pub async fn list_keys(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT tax_id FROM organizations ORDER BY tax_id")
            .fetch_all(pool)
            .await
    }

    /// Batch insert organizations from canonical field maps.
    ///
    /// Uses a single INSERT with multiple value rows. Absent optional
    /// fields become NULL.
    pub async fn insert_many(
        pool: &PgPool,
        drafts: &[FieldMap],
    ) -> Result<Vec<Organization>, sqlx::Error> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = format!("INSERT INTO organizations ({INSERT_COLUMNS}) VALUES ");
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

        let mut q = sqlx::query_as::<_, Organization>(&query);
        for draft in drafts {
            q = q
                .bind(draft.get(fields::ORG_TAX_ID).cloned())
                .bind(draft.get(fields::ORG_LEGAL_NAME).cloned())
                .bind(draft.get(fields::ORG_TRADE_NAME).cloned())
                .bind(draft.get(fields::ORG_EMAIL).cloned())
                .bind(draft.get(fields::ORG_PHONE).cloned())
                .bind(draft.get(fields::ORG_ADDRESS).cloned())
                .bind(draft.get(fields::ORG_CITY).cloned())
                .bind(draft.get(fields::ORG_PROVINCE).cloned())
                .bind(draft.get(fields::ORG_POSTAL_CODE).cloned())
                .bind(parse_date_field(draft, fields::ORG_REGISTERED_ON))
                .bind(draft.get(fields::ORG_EXTERNAL_REF).cloned())
                .bind(draft.get(fields::ORG_PORTAL_URL).cloned())
                .bind(draft.get(fields::ORG_ONBOARDING_STATUS).cloned());
        }

        q.fetch_all(pool).await
    }

    /// Apply a planned set of field writes to one organization.
    ///
    /// Only whitelisted columns are updated; anything else in `writes`
    /// is ignored. `updated_at` is bumped. Returns the updated row, or
    /// `None` if the key does not exist.
    pub async fn update_fields(
        pool: &PgPool,
        tax_id: &str,
        writes: &FieldMap,
    ) -> Result<Option<Organization>, sqlx::Error> {
        let mut sets: Vec<String> = Vec::new();
        let mut bind_idx = 2u32; // $1 is tax_id
        let mut bind_values: Vec<BindValue> = Vec::new();

        for column in UPDATABLE_COLUMNS {
            let Some(value) = writes.get(*column) else {
                continue;
            };
            sets.push(format!("{column} = ${bind_idx}"));
            bind_idx += 1;
            if *column == fields::ORG_REGISTERED_ON {
                bind_values.push(BindValue::Date(
                    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok(),
                ));
            } else {
                bind_values.push(BindValue::Text(value.clone()));
            }
        }

        if sets.is_empty() {
            let query = format!("SELECT {COLUMNS} FROM organizations WHERE tax_id = $1");
            return sqlx::query_as::<_, Organization>(&query)
                .bind(tax_id)
                .fetch_optional(pool)
                .await;
        }

        sets.push("updated_at = NOW()".to_string());

        let query = format!(
            "UPDATE organizations SET {} WHERE tax_id = $1 RETURNING {COLUMNS}",
            sets.join(", ")
        );

        let mut q = sqlx::query_as::<_, Organization>(&query).bind(tax_id);
        for val in &bind_values {
            match val {
                BindValue::Text(v) => q = q.bind(v.as_str()),
                BindValue::Date(v) => q = q.bind(*v),
            }
        }

        q.fetch_optional(pool).await
    }
}

/// Typed bind value for dynamically-built organization updates.
enum BindValue {
    Text(String),
    Date(Option<NaiveDate>),
}
