//! Error types for the escalation core

use thiserror::Error;

use super::state::Phase;

/// Result type alias for transition operations
pub type TransitionResult<T> = Result<T, TransitionError>;

/// An event the current session cannot accept.
///
/// Rejected events leave the session untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The note is empty or whitespace-only
    #[error("note is empty")]
    EmptyNote,

    /// A classify or respond call is already outstanding
    #[error("a request is already in flight")]
    Busy,

    /// A consent decision must be made before submitting again
    #[error("a consent decision is pending")]
    ConsentPending,

    /// The event has no edge from the current phase
    #[error("illegal transition: {event} while {from}")]
    IllegalTransition { from: Phase, event: &'static str },
}

/// A broken structural invariant, reported by `Session::check_invariants`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("consent gate visible without a pending submission")]
    GateWithoutPending,

    #[error("pending submission retained outside the consent gate ({0})")]
    PendingOutsideGate(Phase),

    #[error("loading flag disagrees with phase {0}")]
    LoadingMismatch(Phase),
}
