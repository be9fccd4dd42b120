//! Async session driver: executes the effects the escalation machine returns.
//!
//! ## Lifecycle
//!
//! ```text
//! user action ──▶ transition(session, event) ──▶ [effect]
//!                                                   │
//!                     one call, raced against the cancellation token
//!                                                   │
//!            transition(session, completion) ◀──────┘
//! ```
//!
//! `&mut self` on every operation means one driver never has two calls in
//! flight. Transport failures are converted into completion events and never
//! escape; only rejected user actions surface as `SessionError`.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use with_coordination::{
    transition, Effect, Event, QuickAction, Session, SessionSnapshot, TransitionError,
};

use crate::classifier::ClassifierClient;
use crate::responder::ResponderClient;
use crate::transport::Transport;

/// Errors surfaced to the caller of a session operation.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The state machine refused the action (empty note, busy, no pending consent).
    #[error(transparent)]
    Rejected(#[from] TransitionError),

    /// Another task holds the shared session.
    #[error("session is busy with another submission")]
    Busy,

    /// The cancellation token has fired; the session takes no further actions.
    #[error("session was cancelled")]
    Cancelled,
}

/// One user's escalation workflow bound to a transport.
pub struct EscalationSession<T> {
    session: Session,
    classifier: ClassifierClient<Arc<T>>,
    responder: ResponderClient<Arc<T>>,
    cancel: CancellationToken,
}

/// A session shared between tasks; concurrent submissions get `Busy`.
pub type SharedSession<T> = Arc<Mutex<EscalationSession<T>>>;

impl<T: Transport> EscalationSession<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            session: Session::new(),
            classifier: ClassifierClient::new(Arc::clone(&transport)),
            responder: ResponderClient::new(transport),
            cancel: CancellationToken::new(),
        }
    }

    /// Tie outstanding calls to an external token (e.g. Ctrl-C).
    ///
    /// Once the token fires, the outstanding call is abandoned and every later
    /// operation returns `SessionError::Cancelled`.
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn into_shared(self) -> SharedSession<T> {
        Arc::new(Mutex::new(self))
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Replace the note buffer. Edits are accepted in every phase.
    pub fn edit_note(&mut self, text: impl Into<String>) -> SessionSnapshot {
        if let Err(e) = transition(&mut self.session, Event::NoteEdited(text.into())) {
            tracing::warn!(error = %e, "Note edit rejected");
        }
        self.session.snapshot()
    }

    /// Submit the current note buffer and wait for classification.
    ///
    /// Returns in `Settled` (normal tier or failure), `AwaitingConsent`
    /// (elevated/critical) or `Idle` (cancelled).
    pub async fn submit(&mut self) -> Result<SessionSnapshot, SessionError> {
        tracing::info!(
            chars = self.session.note().trim().chars().count(),
            "Submitting note"
        );
        self.dispatch(Event::Submit).await
    }

    /// Set the note buffer and submit it.
    pub async fn submit_note(
        &mut self,
        text: impl Into<String>,
    ) -> Result<SessionSnapshot, SessionError> {
        self.edit_note(text);
        self.submit().await
    }

    /// Consent to support now; waits for the generated reply.
    pub async fn consent_now(&mut self) -> Result<SessionSnapshot, SessionError> {
        tracing::info!("Consent granted");
        self.dispatch(Event::ConsentNow).await
    }

    /// Postpone support; the note buffer is kept for resubmission.
    pub async fn consent_later(&mut self) -> Result<SessionSnapshot, SessionError> {
        tracing::info!("Consent postponed");
        self.dispatch(Event::ConsentLater).await
    }

    /// Dismiss the consent gate without a reply.
    pub async fn consent_ignore(&mut self) -> Result<SessionSnapshot, SessionError> {
        tracing::info!("Consent dismissed");
        self.dispatch(Event::ConsentIgnore).await
    }

    /// Run a canned micro-habit prompt. Never touches the network.
    pub async fn quick_action(
        &mut self,
        action: QuickAction,
    ) -> Result<SessionSnapshot, SessionError> {
        tracing::info!(action = %action, "Quick action");
        self.dispatch(Event::QuickAction {
            message: action.message().to_string(),
        })
        .await
    }

    async fn dispatch(&mut self, event: Event) -> Result<SessionSnapshot, SessionError> {
        if self.cancel.is_cancelled() {
            tracing::debug!(event = event.name(), "Session cancelled; action refused");
            return Err(SessionError::Cancelled);
        }
        let mut effects = transition(&mut self.session, event)?;
        while let Some(effect) = effects.pop() {
            let completion = self.execute(effect).await;
            effects = transition(&mut self.session, completion)?;
        }
        tracing::debug!(session = %self.session.summary(), "Session settled");
        Ok(self.session.snapshot())
    }

    /// Perform exactly one call and translate its outcome into an event.
    async fn execute(&self, effect: Effect) -> Event {
        match effect {
            Effect::Classify { id, text } => {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        tracing::warn!(id = %id, "Classification abandoned");
                        Event::Abandoned { id }
                    }
                    result = self.classifier.classify(&text) => match result {
                        Ok(tier) => Event::Classified { id, tier },
                        Err(e) => {
                            tracing::warn!(id = %id, error = %e, "Classify call failed");
                            Event::ClassifyFailed { id, failure: e.kind() }
                        }
                    },
                }
            }
            Effect::Respond { id, submission } => {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        tracing::warn!(id = %id, "Reply generation abandoned");
                        Event::Abandoned { id }
                    }
                    result = self.responder.respond(&submission) => match result {
                        Ok(reply) => Event::Responded { id, reply },
                        Err(e) => {
                            tracing::warn!(id = %id, error = %e, "Respond call failed");
                            Event::RespondFailed { id, failure: e.kind() }
                        }
                    },
                }
            }
        }
    }
}

/// Submit `text` on a shared session, rejecting with `Busy` if another task
/// is mid-submission.
pub async fn submit_shared<T: Transport>(
    shared: &SharedSession<T>,
    text: impl Into<String>,
) -> Result<SessionSnapshot, SessionError> {
    let mut guard = shared.try_lock().map_err(|_| SessionError::Busy)?;
    guard.submit_note(text).await
}
