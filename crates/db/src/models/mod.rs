//! Entity models and DTOs for the intake tables.

pub mod audit;
pub mod batch;
pub mod item;
pub mod organization;
pub mod snapshot;
