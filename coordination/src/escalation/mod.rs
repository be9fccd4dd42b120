//! Escalation: Consent-Gated State Machine
//!
//! Routes a free-text note through classification and, for escalated text,
//! holds it behind an explicit consent gate before the generative call.
//! This is a pure state machine with no I/O: transitions return the network
//! calls to make as `Effect`s and the caller feeds the outcomes back.
//!
//! # Workflow
//!
//! ```text
//! note ──▶ classify
//!            │
//!            ├─ normal → direct reply, done
//!            │
//!            ├─ elevated | critical → consent gate
//!            │      ├─ now    → respond → generated reply
//!            │      ├─ later  → acknowledgement, note kept
//!            │      └─ ignore → nothing shown
//!            │
//!            └─ failure → fixed message, no retry
//! ```

pub mod copy;
pub mod error;
pub mod failure;
pub mod machine;
pub mod state;
pub mod tier;

pub use error::{InvariantViolation, TransitionError, TransitionResult};
pub use failure::{Call, FailureKind};
pub use machine::{transition, Effect, Event};
pub use state::{
    InFlight, Note, PendingSubmission, Phase, Session, SessionSnapshot, SubmissionId,
    TransitionRecord,
};
pub use tier::{Gate, SeverityTier};
