//! Pure domain logic for the tabular intake pipeline.
//!
//! This crate has zero I/O (no DB, no async). It covers the stages that can
//! be computed from values alone:
//!
//! - [`normalize`] — raw header/row normalization into canonical-field rows.
//! - [`mapper`] — splitting normalized rows into deduplicated, keyed
//!   organization and item drafts.
//! - [`reconcile`] — classifying drafts against existing records
//!   (New / Unchanged / Changed) with field-level diffs.
//! - [`approval`] — operator approval state and plan filtering.
//! - [`merge`] — update-policy computation (protected-field merge,
//!   fill-only).
//! - [`progress`] — the stage model consumed by the progress reporter.
//!
//! Persistence lives in `intake-db`, orchestration in `intake-pipeline`.

pub mod approval;
pub mod batch_status;
pub mod config;
pub mod error;
pub mod fields;
pub mod hashing;
pub mod issue;
pub mod mapper;
pub mod merge;
pub mod normalize;
pub mod progress;
pub mod reconcile;
pub mod types;
