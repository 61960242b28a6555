//! In-process progress bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`ProgressBus`] is shared via `Arc<ProgressBus>` between the pipeline
//! (publisher) and any number of callers polling a batch's progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use intake_core::progress::ImportStage;

/// One progress update for one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// The batch (or preview run) this event belongs to.
    pub batch_id: Uuid,
    pub stage: ImportStage,
    pub message: String,
    /// Advisory; non-decreasing per batch until a terminal stage.
    pub percentage: u8,
    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(batch_id: Uuid, stage: ImportStage, message: impl Into<String>, percentage: u8) -> Self {
        Self {
            batch_id,
            stage,
            message: message.into(),
            percentage,
            timestamp: Utc::now(),
        }
    }
}

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out bus for [`ProgressEvent`]s.
///
/// Subscribers filter on `batch_id` themselves; every subscriber sees
/// every event. Slow receivers observe `RecvError::Lagged` when the
/// buffer wraps.
pub struct ProgressBus {
    sender: broadcast::Sender<ProgressEvent>,
}

impl ProgressBus {
    /// Create a bus with a specific channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With zero subscribers the event is silently dropped; progress is
    /// advisory and never load-bearing for the pipeline itself.
    pub fn publish(&self, event: ProgressEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
