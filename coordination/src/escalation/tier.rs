//! Severity Tier: classification output and the consent gate it implies

use serde::{Deserialize, Serialize};

/// Severity buckets returned by the classification service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityTier {
    /// Routine input, answered directly with a short canned reply
    #[default]
    Normal,
    /// Emotionally escalated text
    Elevated,
    /// Highest intensity bucket
    Critical,
}

/// How the workflow proceeds after classification.
///
/// The three tiers collapse into two logical cases; matching on this enum
/// instead of the tier keeps the branch exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Settle immediately with the direct reply, no second call
    Direct,
    /// Suspend until the user explicitly consents to the generative call
    RequiresConsent,
}

impl SeverityTier {
    /// Parse the `state` field of a classification response.
    ///
    /// Missing, empty and unknown values all resolve to `Normal` (fail-open).
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("elevated") => Self::Elevated,
            Some("critical") => Self::Critical,
            _ => Self::Normal,
        }
    }

    /// The string echoed back to the responder service
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Elevated => "elevated",
            Self::Critical => "critical",
        }
    }

    pub fn gate(&self) -> Gate {
        match self {
            Self::Normal => Gate::Direct,
            Self::Elevated | Self::Critical => Gate::RequiresConsent,
        }
    }

    pub fn requires_consent(&self) -> bool {
        self.gate() == Gate::RequiresConsent
    }
}

impl std::fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}
