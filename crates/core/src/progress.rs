//! Stage model for the progress reporter.
//!
//! Percentages are advisory: consumers may rely only on monotonicity
//! (enforced by the tracker in `intake-events`) and on terminality of
//! `completed` / `error`, never on exact values.

use serde::{Deserialize, Serialize};

/// The stages a batch moves through, in order. `Error` is reachable from
/// any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStage {
    Parsing,
    Mapping,
    Validating,
    BackingUp,
    Applying,
    Completed,
    Error,
}

impl ImportStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parsing => "parsing",
            Self::Mapping => "mapping",
            Self::Validating => "validating",
            Self::BackingUp => "backing_up",
            Self::Applying => "applying",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    /// Terminal stages emit no further events.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Advisory percentage at which this stage begins.
    pub fn base_percentage(&self) -> u8 {
        match self {
            Self::Parsing => 5,
            Self::Mapping => 25,
            Self::Validating => 45,
            Self::BackingUp => 60,
            Self::Applying => 70,
            Self::Completed => 100,
            Self::Error => 100,
        }
    }
}

impl std::fmt::Display for ImportStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
