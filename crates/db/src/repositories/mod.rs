//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod audit_repo;
pub mod batch_repo;
pub mod item_repo;
pub mod organization_repo;
pub mod snapshot_repo;

pub use audit_repo::AuditEntryRepo;
pub use batch_repo::ImportBatchRepo;
pub use item_repo::ItemRepo;
pub use organization_repo::OrganizationRepo;
pub use snapshot_repo::BackupSnapshotRepo;
