//! Structured errors for the lifecycle state machine.

use thiserror::Error;

/// Errors raised when a transition is rejected.
///
/// A rejected transition never mutates the record: validation runs before
/// any field is touched, so callers can persist the record unchanged (or
/// not at all) after an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// The request is not in a state that permits the attempted transition.
    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        /// Current status of the record.
        from: String,
        /// Status the transition would have produced.
        to: String,
        /// Why the transition was rejected.
        reason: String,
    },

    /// The request has already reached a terminal status.
    #[error("request {request_id} is in terminal state {state} and accepts no further transitions")]
    TerminalState {
        /// The request the transition was attempted on.
        request_id: String,
        /// The absorbing status it is in.
        state: String,
    },
}
