//! Config Entry State Machine
//!
//! Valid lifecycle transitions:
//!
//! ```text
//! NotLoaded → SetupInProgress → Loaded
//!                            ↘ SetupError → SetupInProgress (retry)
//!                            ↘ SetupRetry → SetupInProgress (auto-retry)
//!                            ↘ MigrationError (terminal)
//!
//! Loaded/SetupError/SetupRetry → UnloadInProgress → NotLoaded
//!                                                 ↘ FailedUnload (terminal)
//! ```

use std::time::Duration;

use crate::entry::ConfigEntryState;
use thiserror::Error;

/// Error when an invalid state transition is attempted
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid state transition from {from:?} to {to:?}")]
pub struct InvalidTransition {
    pub from: ConfigEntryState,
    pub to: ConfigEntryState,
}

impl ConfigEntryState {
    /// Attempt a transition to a new state
    pub fn try_transition(
        self,
        to: ConfigEntryState,
    ) -> Result<ConfigEntryState, InvalidTransition> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(InvalidTransition { from: self, to })
        }
    }

    /// Check if a transition is valid without performing it
    pub fn can_transition_to(self, to: ConfigEntryState) -> bool {
        use ConfigEntryState::*;

        match self {
            NotLoaded => to == SetupInProgress,
            SetupInProgress => matches!(to, Loaded | SetupError | SetupRetry | MigrationError),
            SetupError | SetupRetry => matches!(to, SetupInProgress | UnloadInProgress),
            Loaded => to == UnloadInProgress,
            UnloadInProgress => matches!(to, NotLoaded | FailedUnload),
            MigrationError | FailedUnload => false,
        }
    }
}

/// Delay before the next setup retry
///
/// 2^min(tries, 4) * 5 seconds plus up to 100ms of jitter:
/// 5s, 10s, 20s, 40s, then 80s for every later attempt.
pub fn retry_delay(tries: u32) -> Duration {
    let base = 2_u64.pow(tries.min(4)) * 5;
    let jitter = rand::random::<f64>() * 0.1;
    Duration::from_secs(base) + Duration::from_secs_f64(jitter)
}
