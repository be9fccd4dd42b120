//! Escalation Machine: pure transition function over `Session`
//!
//! ```text
//! Idle / Settled ──submit──▶ Classifying
//!     Classifying ──classified(normal)──────▶ Settled(direct reply)
//!     Classifying ──classified(elevated|critical)──▶ AwaitingConsent
//!     Classifying ──failure──▶ Settled(connection error)
//! AwaitingConsent ──now──▶ Responding
//! AwaitingConsent ──later──▶ Idle(acknowledgement)
//! AwaitingConsent ──ignore──▶ Idle(empty reply)
//!      Responding ──responded──▶ Settled(reply)
//!      Responding ──failure──▶ Settled(generation error)
//!       (any) ──quick action──▶ Settled(canned message)
//! ```
//!
//! Network calls are never made here. Edges that need one return an
//! `Effect` stamped with a fresh `SubmissionId`; the caller performs the call
//! and feeds the outcome back with the same id. Completions carrying any
//! other id are stale and dropped without touching the session.

use super::copy;
use super::error::{TransitionError, TransitionResult};
use super::failure::{Call, FailureKind};
use super::state::{Note, PendingSubmission, Phase, Session, SubmissionId};
use super::tier::{Gate, SeverityTier};

/// Inputs to the state machine: user actions and call completions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The note buffer changed
    NoteEdited(String),
    /// Submit the current note for classification
    Submit,
    Classified {
        id: SubmissionId,
        tier: SeverityTier,
    },
    ClassifyFailed {
        id: SubmissionId,
        failure: FailureKind,
    },
    ConsentNow,
    ConsentLater,
    ConsentIgnore,
    Responded {
        id: SubmissionId,
        reply: String,
    },
    RespondFailed {
        id: SubmissionId,
        failure: FailureKind,
    },
    /// Local canned micro-habit; never touches the network
    QuickAction { message: String },
    /// The caller stopped waiting on an outstanding call
    Abandoned { id: SubmissionId },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoteEdited(_) => "note_edited",
            Self::Submit => "submit",
            Self::Classified { .. } => "classified",
            Self::ClassifyFailed { .. } => "classify_failed",
            Self::ConsentNow => "consent_now",
            Self::ConsentLater => "consent_later",
            Self::ConsentIgnore => "consent_ignore",
            Self::Responded { .. } => "responded",
            Self::RespondFailed { .. } => "respond_failed",
            Self::QuickAction { .. } => "quick_action",
            Self::Abandoned { .. } => "abandoned",
        }
    }

    /// The call a completion event belongs to.
    pub fn submission(&self) -> Option<SubmissionId> {
        match self {
            Self::Classified { id, .. }
            | Self::ClassifyFailed { id, .. }
            | Self::Responded { id, .. }
            | Self::RespondFailed { id, .. }
            | Self::Abandoned { id } => Some(*id),
            _ => None,
        }
    }
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// POST the note to the classification service
    Classify { id: SubmissionId, text: Note },
    /// POST the consented submission to the responder service
    Respond {
        id: SubmissionId,
        submission: PendingSubmission,
    },
}

impl Effect {
    pub fn id(&self) -> SubmissionId {
        match self {
            Self::Classify { id, .. } | Self::Respond { id, .. } => *id,
        }
    }

    pub fn call(&self) -> Call {
        match self {
            Self::Classify { .. } => Call::Classify,
            Self::Respond { .. } => Call::Respond,
        }
    }
}

/// Apply one event to the session.
///
/// On `Err` the session is unchanged. At most one effect is ever returned,
/// and only when no other call is outstanding.
pub fn transition(session: &mut Session, event: Event) -> TransitionResult<Vec<Effect>> {
    let from = session.phase;
    let name = event.name();
    let submission = event.submission();

    if let Some(id) = submission {
        if session.outstanding() != Some(id) {
            tracing::debug!(
                id = %id,
                event = name,
                phase = %from,
                "Dropping stale completion"
            );
            return Ok(Vec::new());
        }
    }

    let effects = match event {
        Event::NoteEdited(text) => {
            // Buffer only; never recorded.
            session.note = text;
            return Ok(Vec::new());
        }
        Event::Submit => submit(session)?,
        Event::Classified { tier, .. } => {
            expect_phase(session, Phase::Classifying, name)?;
            classified(session, tier);
            Vec::new()
        }
        Event::ClassifyFailed { failure, .. } => {
            expect_phase(session, Phase::Classifying, name)?;
            settle(session, copy::failure_message(Call::Classify, failure));
            tracing::warn!(failure = %failure, "Classification failed");
            Vec::new()
        }
        Event::ConsentNow => consent_now(session)?,
        Event::ConsentLater => {
            expect_phase(session, Phase::AwaitingConsent, name)?;
            session.pending = None;
            session.phase = Phase::Idle;
            session.reply = copy::CONSENT_LATER_ACK.to_string();
            Vec::new()
        }
        Event::ConsentIgnore => {
            expect_phase(session, Phase::AwaitingConsent, name)?;
            session.pending = None;
            session.phase = Phase::Idle;
            session.reply.clear();
            Vec::new()
        }
        Event::Responded { reply, .. } => {
            expect_phase(session, Phase::Responding, name)?;
            settle(session, &reply);
            Vec::new()
        }
        Event::RespondFailed { failure, .. } => {
            expect_phase(session, Phase::Responding, name)?;
            settle(session, copy::failure_message(Call::Respond, failure));
            tracing::warn!(failure = %failure, "Reply generation failed");
            Vec::new()
        }
        Event::QuickAction { message } => {
            if let Some(abandoned) = session.in_flight.take() {
                tracing::debug!(
                    id = %abandoned.id,
                    call = %abandoned.call,
                    "Quick action supersedes outstanding call"
                );
            }
            session.pending = None;
            session.tier = SeverityTier::Normal;
            session.note.clear();
            settle(session, &message);
            Vec::new()
        }
        Event::Abandoned { .. } => {
            session.in_flight = None;
            session.pending = None;
            session.phase = Phase::Idle;
            session.reply.clear();
            Vec::new()
        }
    };

    session.record(from, name, submission);
    tracing::debug!(
        from = %from,
        to = %session.phase,
        event = name,
        "State transition"
    );
    Ok(effects)
}

fn expect_phase(session: &Session, phase: Phase, event: &'static str) -> TransitionResult<()> {
    if session.phase != phase {
        return Err(TransitionError::IllegalTransition {
            from: session.phase,
            event,
        });
    }
    Ok(())
}

fn submit(session: &mut Session) -> TransitionResult<Vec<Effect>> {
    if session.loading() {
        return Err(TransitionError::Busy);
    }
    if session.phase == Phase::AwaitingConsent {
        return Err(TransitionError::ConsentPending);
    }
    let text = Note::parse(&session.note)?;

    let id = session.issue(Call::Classify, text.clone());
    session.phase = Phase::Classifying;
    session.reply.clear();
    Ok(vec![Effect::Classify { id, text }])
}

fn classified(session: &mut Session, tier: SeverityTier) {
    let Some(in_flight) = session.in_flight.take() else {
        return;
    };
    session.tier = tier;

    match tier.gate() {
        Gate::Direct => {
            session.phase = Phase::Settled;
            session.reply = copy::DIRECT_REPLY.to_string();
        }
        Gate::RequiresConsent => {
            tracing::info!(tier = %tier, "Consent required before generating support");
            session.pending = Some(PendingSubmission {
                text: in_flight.text,
                tier,
            });
            session.phase = Phase::AwaitingConsent;
        }
    }
}

fn consent_now(session: &mut Session) -> TransitionResult<Vec<Effect>> {
    expect_phase(session, Phase::AwaitingConsent, "consent_now")?;
    let Some(submission) = session.pending.take() else {
        return Err(TransitionError::IllegalTransition {
            from: session.phase,
            event: "consent_now",
        });
    };

    let id = session.issue(Call::Respond, submission.text.clone());
    session.phase = Phase::Responding;
    session.reply.clear();
    Ok(vec![Effect::Respond { id, submission }])
}

fn settle(session: &mut Session, reply: &str) {
    session.in_flight = None;
    session.phase = Phase::Settled;
    session.reply = reply.to_string();
}
