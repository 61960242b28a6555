//! Per-batch progress emitter with the monotonicity guarantee.

use std::sync::Arc;

use uuid::Uuid;

use intake_core::progress::ImportStage;

use crate::bus::{ProgressBus, ProgressEvent};

/// Emits progress events for one batch, clamping percentages so they are
/// non-decreasing until a terminal stage is reached. Events after a
/// terminal stage are dropped.
pub struct ProgressTracker {
    bus: Arc<ProgressBus>,
    batch_id: Uuid,
    last_percentage: u8,
    terminal: bool,
}

impl ProgressTracker {
    pub fn new(bus: Arc<ProgressBus>, batch_id: Uuid) -> Self {
        Self {
            bus,
            batch_id,
            last_percentage: 0,
            terminal: false,
        }
    }

    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    /// Emit a stage transition at the stage's base percentage.
    pub fn stage(&mut self, stage: ImportStage, message: impl Into<String>) {
        self.emit(stage, message, stage.base_percentage());
    }

    /// Emit an event with an explicit percentage (e.g. chunk progress
    /// inside the applying stage).
    pub fn emit(&mut self, stage: ImportStage, message: impl Into<String>, percentage: u8) {
        if self.terminal {
            return;
        }
        let clamped = percentage.clamp(self.last_percentage, 100);
        self.last_percentage = clamped;
        if stage.is_terminal() {
            self.terminal = true;
        }
        let message = message.into();
        tracing::debug!(
            batch_id = %self.batch_id,
            stage = %stage,
            percentage = clamped,
            "{message}"
        );
        self.bus
            .publish(ProgressEvent::new(self.batch_id, stage, message, clamped));
    }

    /// Emit the error stage. Terminal.
    pub fn error(&mut self, message: impl Into<String>) {
        let pct = self.last_percentage.max(ImportStage::Error.base_percentage());
        self.emit(ImportStage::Error, message, pct);
    }
}

// ── Tests ────────────────────────────────────────────────────────────
