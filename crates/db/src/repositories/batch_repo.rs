//! Repository for the `import_batches` table.

use sqlx::PgPool;
use uuid::Uuid;

use intake_core::batch_status;

use crate::models::batch::{BatchCounters, CreateImportBatch, ImportBatch};

/// Column list for import_batches queries.
const COLUMNS: &str = "\
    id, filename, file_size_bytes, total_records, processed_records, \
    new_records, updated_records, error_records, status, created_at, \
    completed_at";

/// Provides CRUD operations for import batches.
pub struct ImportBatchRepo;

impl ImportBatchRepo {
    /// Insert a new batch in `processing` status, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateImportBatch,
    ) -> Result<ImportBatch, sqlx::Error> {
        let query = format!(
            "INSERT INTO import_batches
                (id, filename, file_size_bytes, total_records, status)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ImportBatch>(&query)
            .bind(input.id)
            .bind(&input.filename)
            .bind(input.file_size_bytes)
            .bind(input.total_records)
            .bind(batch_status::BATCH_STATUS_PROCESSING)
            .fetch_one(pool)
            .await
    }

    /// Find a batch by its ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<ImportBatch>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM import_batches WHERE id = $1");
        sqlx::query_as::<_, ImportBatch>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List batches ordered by creation date descending.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<ImportBatch>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM import_batches ORDER BY created_at DESC LIMIT $1"
        );
        sqlx::query_as::<_, ImportBatch>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Write final counters, terminal status, and completion time.
    ///
    /// `status` must be a terminal batch status; the transition rule is
    /// enforced in `intake_core::batch_status` by callers.
    pub async fn finalize(
        pool: &PgPool,
        id: Uuid,
        status: &str,
        counters: &BatchCounters,
    ) -> Result<Option<ImportBatch>, sqlx::Error> {
        let query = format!(
            "UPDATE import_batches
             SET status = $2,
                 total_records = $3,
                 processed_records = $4,
                 new_records = $5,
                 updated_records = $6,
                 error_records = $7,
                 completed_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ImportBatch>(&query)
            .bind(id)
            .bind(status)
            .bind(counters.total)
            .bind(counters.processed)
            .bind(counters.new)
            .bind(counters.updated)
            .bind(counters.errors)
            .fetch_optional(pool)
            .await
    }
}
