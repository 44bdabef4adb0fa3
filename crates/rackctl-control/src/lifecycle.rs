//! Configuration lifecycle state machine.
//!
//! A [`Config`](crate::Config) handle moves through four states during one
//! invocation. This module defines the valid transitions and the validation
//! used by every loading, reconciling, mutating and persisting operation.
//!
//! # State Machine
//!
//! ```text
//!     ┌──────────┐  load   ┌──────────┐  reconcile  ┌────────────┐
//!     │ Unloaded │────────▶│  Loaded  │────────────▶│ Reconciled │◄──┐
//!     └──────────┘         └──────────┘             └─────┬──────┘   │
//!                                                         │ persist  │ mutate
//!                                                         ▼          │
//!                                                   ┌────────────┐   │
//!                                                   │ Persisted  │───┘
//!                                                   └────────────┘
//! ```
//!
//! `Reconciled` and `Persisted` also transition to themselves: reconciling
//! again is allowed (and is a no-op on a fixed point), and persisting twice
//! rewrites the same documents.

use crate::error::{ConfigError, Result};

/// The lifecycle state of a configuration handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigState {
    /// Nothing has been read.
    #[default]
    Unloaded,
    /// Both documents are in memory, not yet reconciled.
    Loaded,
    /// Both documents are mutually consistent in memory.
    Reconciled,
    /// Both documents have been written.
    Persisted,
}

/// Validates a state transition and returns the target state if valid.
///
/// # Errors
///
/// Returns `ConfigError::InvalidState` if the transition is not allowed.
pub fn validate_transition(from: ConfigState, to: ConfigState) -> Result<ConfigState> {
    if is_valid_transition(from, to) {
        Ok(to)
    } else {
        Err(ConfigError::InvalidState { from, to })
    }
}

/// Check if a state transition is valid according to the state machine.
#[must_use]
pub const fn is_valid_transition(from: ConfigState, to: ConfigState) -> bool {
    use ConfigState::{Loaded, Persisted, Reconciled, Unloaded};

    matches!(
        (from, to),
        (Unloaded, Loaded)
            | (Loaded | Reconciled | Persisted, Reconciled)
            | (Reconciled | Persisted, Persisted)
    )
}

/// Returns the list of valid target states from the given state.
#[must_use]
pub fn valid_transitions_from(state: ConfigState) -> Vec<ConfigState> {
    use ConfigState::{Loaded, Persisted, Reconciled, Unloaded};

    match state {
        Unloaded => vec![Loaded],
        Loaded => vec![Reconciled],
        Reconciled | Persisted => vec![Reconciled, Persisted],
    }
}

/// Returns true if resolved values may be read in this state.
#[must_use]
pub const fn is_consistent(state: ConfigState) -> bool {
    matches!(state, ConfigState::Reconciled | ConfigState::Persisted)
}
