//! Batch status constants and the monotonic transition rule.
//!
//! These match the values stored in `import_batches.status`. A batch moves
//! `processing` → `completed` or `processing` → `failed`; both end states
//! are terminal.

pub const BATCH_STATUS_PROCESSING: &str = "processing";
pub const BATCH_STATUS_COMPLETED: &str = "completed";
pub const BATCH_STATUS_FAILED: &str = "failed";

/// All valid batch statuses.
pub const VALID_BATCH_STATUSES: &[&str] = &[
    BATCH_STATUS_PROCESSING,
    BATCH_STATUS_COMPLETED,
    BATCH_STATUS_FAILED,
];

/// Whether `from` → `to` is a legal status transition.
pub fn can_transition(from: &str, to: &str) -> bool {
    match from {
        BATCH_STATUS_PROCESSING => {
            to == BATCH_STATUS_COMPLETED || to == BATCH_STATUS_FAILED
        }
        // completed and failed are terminal.
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_can_complete_or_fail() {
        assert!(can_transition(BATCH_STATUS_PROCESSING, BATCH_STATUS_COMPLETED));
        assert!(can_transition(BATCH_STATUS_PROCESSING, BATCH_STATUS_FAILED));
    }

    #[test]
    fn end_states_are_terminal() {
        assert!(!can_transition(BATCH_STATUS_COMPLETED, BATCH_STATUS_PROCESSING));
        assert!(!can_transition(BATCH_STATUS_COMPLETED, BATCH_STATUS_FAILED));
        assert!(!can_transition(BATCH_STATUS_FAILED, BATCH_STATUS_COMPLETED));
        assert!(!can_transition(BATCH_STATUS_FAILED, BATCH_STATUS_PROCESSING));
    }

    #[test]
    fn no_self_transitions() {
        for status in VALID_BATCH_STATUSES {
            assert!(!can_transition(status, status));
        }
    }
}
