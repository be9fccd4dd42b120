//! Escalation Session: the single explicit value every transition operates on

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{InvariantViolation, TransitionError};
use super::failure::Call;
use super::tier::SeverityTier;

/// Oldest transition records are dropped beyond this many entries.
pub const TRANSITION_LOG_CAPACITY: usize = 256;

/// A trimmed, non-empty note.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Note(String);

impl Note {
    pub fn parse(raw: &str) -> Result<Self, TransitionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TransitionError::EmptyNote);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Note {
    type Error = TransitionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Note> for String {
    fn from(note: Note) -> Self {
        note.0
    }
}

impl std::fmt::Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of what was classified, held until the user decides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSubmission {
    pub text: Note,
    pub tier: SeverityTier,
}

/// Workflow phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing in flight, nothing shown (initial state)
    Idle,
    /// Waiting on the classification call
    Classifying,
    /// Consent gate shown; no call outstanding
    AwaitingConsent,
    /// Waiting on the generative call
    Responding,
    /// A reply is on display; a new note may be submitted
    Settled,
}

impl Phase {
    /// Whether a network call is outstanding in this phase.
    pub fn is_loading(self) -> bool {
        matches!(self, Self::Classifying | Self::Responding)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Classifying => write!(f, "classifying"),
            Self::AwaitingConsent => write!(f, "awaiting_consent"),
            Self::Responding => write!(f, "responding"),
            Self::Settled => write!(f, "settled"),
        }
    }
}

/// Token stamped on an outbound call and echoed by its completion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubmissionId(pub u64);

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The call currently outstanding and the note it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlight {
    pub id: SubmissionId,
    pub call: Call,
    pub text: Note,
}

/// A single recorded state transition.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionRecord {
    pub from: Phase,
    pub to: Phase,
    /// Name of the event that caused it
    pub event: &'static str,
    /// Call the event belonged to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission: Option<SubmissionId>,
    pub timestamp: DateTime<Utc>,
}

/// Observable view of a session, for rendering and JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub tier: SeverityTier,
    pub loading: bool,
    pub consent_gate_visible: bool,
    pub can_submit: bool,
    pub note: String,
    pub reply: String,
}

/// Full workflow state for one user session.
///
/// Only `machine::transition` mutates it.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) phase: Phase,
    pub(crate) tier: SeverityTier,
    pub(crate) note: String,
    pub(crate) pending: Option<PendingSubmission>,
    pub(crate) reply: String,
    pub(crate) in_flight: Option<InFlight>,
    pub(crate) next_id: u64,
    pub(crate) transitions: VecDeque<TransitionRecord>,
}

impl Session {
    /// Idle, tier normal, nothing pending, empty reply.
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            tier: SeverityTier::Normal,
            note: String::new(),
            pending: None,
            reply: String::new(),
            in_flight: None,
            next_id: 1,
            transitions: VecDeque::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tier(&self) -> SeverityTier {
        self.tier
    }

    /// The editable note buffer (untrimmed).
    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn pending(&self) -> Option<&PendingSubmission> {
        self.pending.as_ref()
    }

    /// Reply on display; empty means "no reply yet".
    pub fn reply(&self) -> &str {
        &self.reply
    }

    /// True exactly while a classify or respond call is outstanding.
    pub fn loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn outstanding(&self) -> Option<SubmissionId> {
        self.in_flight.as_ref().map(|f| f.id)
    }

    pub fn in_flight(&self) -> Option<&InFlight> {
        self.in_flight.as_ref()
    }

    pub fn consent_gate_visible(&self) -> bool {
        self.phase == Phase::AwaitingConsent && self.pending.is_some()
    }

    /// Whether the submit action is enabled.
    pub fn can_submit(&self) -> bool {
        !self.note.trim().is_empty() && !self.loading() && self.phase != Phase::AwaitingConsent
    }

    pub fn transitions(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.transitions.iter()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            tier: self.tier,
            loading: self.loading(),
            consent_gate_visible: self.consent_gate_visible(),
            can_submit: self.can_submit(),
            note: self.note.clone(),
            reply: self.reply.clone(),
        }
    }

    /// Verify the structural invariants between phase, pending and loading.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.phase == Phase::AwaitingConsent && self.pending.is_none() {
            return Err(InvariantViolation::GateWithoutPending);
        }
        if self.phase != Phase::AwaitingConsent && self.pending.is_some() {
            return Err(InvariantViolation::PendingOutsideGate(self.phase));
        }
        if self.phase.is_loading() != self.loading() {
            return Err(InvariantViolation::LoadingMismatch(self.phase));
        }
        Ok(())
    }

    /// One-line summary for logging
    pub fn summary(&self) -> String {
        format!(
            "phase={} tier={} loading={} pending={} transitions={}",
            self.phase,
            self.tier,
            self.loading(),
            self.pending.is_some(),
            self.transitions.len(),
        )
    }

    pub(crate) fn issue(&mut self, call: Call, text: Note) -> SubmissionId {
        let id = SubmissionId(self.next_id);
        self.next_id += 1;
        self.in_flight = Some(InFlight { id, call, text });
        id
    }

    pub(crate) fn record(
        &mut self,
        from: Phase,
        event: &'static str,
        submission: Option<SubmissionId>,
    ) {
        if self.transitions.len() >= TRANSITION_LOG_CAPACITY {
            self.transitions.pop_front();
        }
        self.transitions.push_back(TransitionRecord {
            from,
            to: self.phase,
            event,
            submission,
            timestamp: Utc::now(),
        });
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
