//! WITH Coordination Library
//!
//! Deterministic core of the consent-gated escalation workflow:
//! - Severity tiers and the two-way consent gate they imply
//! - The session value and its pure transition function
//! - Quick-action dispatch for canned micro-habit prompts
//!
//! Nothing in this crate performs I/O. The agent crate executes the
//! `Effect`s returned by `transition` and reports their outcomes back as
//! `Event`s.

pub mod escalation;
pub mod quick_action;

// Re-export key escalation types
pub use escalation::{
    transition, Call, Effect, Event, FailureKind, Gate, InvariantViolation, Note,
    PendingSubmission, Phase, SeverityTier, Session, SessionSnapshot, SubmissionId,
    TransitionError, TransitionRecord,
};

// Re-export quick action types
pub use quick_action::{run_quick_action, QuickAction};
