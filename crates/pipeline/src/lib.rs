//! Orchestration layer for the intake pipeline.
//!
//! Ties the pure stages in `intake-core` to a persistent store:
//!
//! - [`store::ImportStore`] — the async store collaborator, with a
//!   Postgres implementation in [`pg_store`].
//! - [`snapshot`] — the pre-processing backup written strictly before the
//!   first mutation.
//! - [`applier`] — the chunked batch applier with partial-success
//!   semantics and the audit hash chain.
//! - [`locks`] — advisory per-key locks serializing concurrent batches
//!   that touch the same natural keys.
//! - [`pipeline::ImportPipeline`] — the two-phase facade:
//!   `begin` (parse/map/reconcile into a reviewable plan) and
//!   `commit` (approval-gated backup + apply + finalize).

pub mod applier;
pub mod env;
pub mod locks;
pub mod pg_store;
pub mod pipeline;
pub mod snapshot;
pub mod store;

pub use pipeline::{CommitReport, CommitRequest, ImportPipeline, ImportPreview};
pub use store::{ImportStore, StoreError};
