//! Quick actions: canned micro-habit prompts answered locally

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::escalation::{transition, Event, Session, SessionSnapshot, TransitionError};

/// The fixed set of micro-habit prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickAction {
    /// Two-minute pause
    Pause,
    /// Drink water
    Water,
    /// Thirty-second stretch
    Stretch,
}

impl QuickAction {
    pub const ALL: [QuickAction; 3] = [Self::Pause, Self::Water, Self::Stretch];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pause => "⏸ Pausa rápida (2 min)",
            Self::Water => "💧 Água agora",
            Self::Stretch => "🧘 Alongar 30s",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Pause => {
                "Ok. Pausa de 2 minutos. Não resolve nada agora. Volta e decide melhor."
            }
            Self::Water => "Água agora. Volta em 30 segundos.",
            Self::Stretch => "Levanta e alonga 30 segundos. Ombros, pescoço e costas. Só isso.",
        }
    }
}

impl std::fmt::Display for QuickAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pause => write!(f, "pause"),
            Self::Water => write!(f, "water"),
            Self::Stretch => write!(f, "stretch"),
        }
    }
}

impl FromStr for QuickAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pause" => Ok(Self::Pause),
            "water" => Ok(Self::Water),
            "stretch" => Ok(Self::Stretch),
            other => Err(format!(
                "unknown quick action '{}' (expected pause, water or stretch)",
                other
            )),
        }
    }
}

/// Settle the session with `message` without any network call.
///
/// Resets the tier to normal and clears the note buffer. Accepted in every
/// phase; an outstanding call or pending consent is superseded.
pub fn run_quick_action(
    session: &mut Session,
    message: impl Into<String>,
) -> Result<SessionSnapshot, TransitionError> {
    transition(
        session,
        Event::QuickAction {
            message: message.into(),
        },
    )?;
    Ok(session.snapshot())
}
