//! Progress event infrastructure for the intake pipeline.
//!
//! - [`ProgressBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`ProgressEvent`] — the stage/message/percentage envelope, keyed by
//!   batch id.
//! - [`ProgressTracker`] — per-batch emitter that enforces the
//!   non-decreasing-percentage guarantee until a terminal stage.

pub mod bus;
pub mod tracker;

pub use bus::{ProgressBus, ProgressEvent};
pub use tracker::ProgressTracker;
