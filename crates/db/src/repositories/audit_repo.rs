//! Repository for the `import_audit_entries` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::audit::{CreateAuditEntry, ImportAuditEntry};

/// Column list for import_audit_entries SELECT queries.
const COLUMNS: &str = "\
    id, batch_id, entity_type, entity_key, operation, changed_fields, \
    previous_values, new_values, actor, integrity_hash, created_at";

/// Column list for INSERT (excludes auto-generated `id` and `created_at`).
const INSERT_COLUMNS: &str = "\
    batch_id, entity_type, entity_key, operation, changed_fields, \
    previous_values, new_values, actor, integrity_hash";

const INSERT_BINDS: usize = 9;

/// Provides insert and query operations for the import audit ledger.
pub struct AuditEntryRepo;

impl AuditEntryRepo {
    /// Batch insert multiple audit entries.
    ///
    /// Uses a single INSERT with multiple value rows. Entry order is
    /// preserved, which keeps the per-batch hash chain verifiable by a
    /// sequential read in id order.
    pub async fn batch_insert(
        pool: &PgPool,
        entries: &[CreateAuditEntry],
    ) -> Result<Vec<ImportAuditEntry>, sqlx::Error> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = format!("INSERT INTO import_audit_entries ({INSERT_COLUMNS}) VALUES ");
        let mut param_idx = 1usize;
        let mut first = true;

        for _ in entries {
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

        let mut q = sqlx::query_as::<_, ImportAuditEntry>(&query);
        for entry in entries {
            q = q
                .bind(entry.batch_id)
                .bind(&entry.entity_type)
                .bind(&entry.entity_key)
                .bind(&entry.operation)
                .bind(&entry.changed_fields)
                .bind(&entry.previous_values)
                .bind(&entry.new_values)
                .bind(&entry.actor)
                .bind(&entry.integrity_hash);
        }

        q.fetch_all(pool).await
    }

    /// List all audit entries for a batch in insertion order.
    pub async fn list_for_batch(
        pool: &PgPool,
        batch_id: Uuid,
    ) -> Result<Vec<ImportAuditEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM import_audit_entries
             WHERE batch_id = $1
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, ImportAuditEntry>(&query)
            .bind(batch_id)
            .fetch_all(pool)
            .await
    }

    /// Count audit entries for a batch.
    pub async fn count_for_batch(pool: &PgPool, batch_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM import_audit_entries WHERE batch_id = $1",
        )
        .bind(batch_id)
        .fetch_one(pool)
        .await
    }
}
