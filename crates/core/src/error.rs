//! Error taxonomy for the intake pipeline.
//!
//! Every variant carries a stable machine-readable code (see
//! [`ImportError::code`]) so that tooling can branch on the code rather
//! than on message text. Row-level problems (bad key, duplicate, missing
//! field, dangling reference) are *not* errors at this level — they are
//! surfaced as [`crate::issue::ValidationIssue`]s and never abort a batch.

/// A fatal error raised by the intake pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The input exceeds the configured byte limit. Raised before any row
    /// is read.
    #[error("File is {actual} bytes, exceeding the limit of {limit} bytes")]
    FileTooLarge { actual: u64, limit: u64 },

    /// The input exceeds the configured row limit. Raised before any row
    /// is read.
    #[error("File has {actual} rows, exceeding the limit of {limit} rows")]
    TooManyRows { actual: usize, limit: usize },

    /// The input has a header row but zero data rows.
    #[error("File contains no data rows")]
    EmptyFile,

    /// Neither key column (tax id or item code) resolved from the header
    /// row, so nothing can be keyed.
    #[error("No key column found: headers must include a tax id or item code column")]
    MissingKeyColumn,

    /// The caller-supplied approval state selected nothing; backup and
    /// apply are refused rather than invoked as a no-op.
    #[error("Nothing approved: at least one record must be approved before commit")]
    NothingApproved,

    /// Writing the pre-processing backup snapshot failed. The batch aborts
    /// with zero mutations applied.
    #[error("Backup snapshot failed: {0}")]
    SnapshotFailed(String),

    /// A store write failed during apply. Recorded per chunk; does not
    /// halt the run.
    #[error("Persistence failure: {message}")]
    Persistence { code: String, message: String },

    /// A store read or bookkeeping write (batch row, lookup) failed.
    #[error("Store error: {0}")]
    Store(String),
}

impl ImportError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::FileTooLarge { .. } => "file_too_large",
            Self::TooManyRows { .. } => "too_many_rows",
            Self::EmptyFile => "empty_file",
            Self::MissingKeyColumn => "missing_key_column",
            Self::NothingApproved => "nothing_approved",
            Self::SnapshotFailed(_) => "snapshot_failed",
            Self::Persistence { .. } => "persistence_failed",
            Self::Store(_) => "store_error",
        }
    }

    /// Whether this error aborts processing before anything is presented
    /// for approval (format/schema-level failures).
    pub fn aborts_before_classification(&self) -> bool {
        matches!(
            self,
            Self::FileTooLarge { .. }
                | Self::TooManyRows { .. }
                | Self::EmptyFile
                | Self::MissingKeyColumn
        )
    }
}
