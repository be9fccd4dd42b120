//! Failure taxonomy for the two outbound calls.
//!
//! Empty notes never reach this layer (rejected by the submit guard) and a
//! response missing its expected field is absorbed into a default value, so
//! only connection and status failures survive into the core.

use serde::{Deserialize, Serialize};

/// Which outbound call a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Call {
    Classify,
    Respond,
}

impl std::fmt::Display for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classify => write!(f, "classify"),
            Self::Respond => write!(f, "respond"),
        }
    }
}

/// Coarse failure classification for a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The request never completed (DNS, connect, timeout).
    Network,
    /// The service answered with a non-success status or an unreadable body.
    Service,
}

impl FailureKind {
    /// Nothing in this workflow is retried automatically; the user re-triggers.
    pub fn is_retriable(self) -> bool {
        false
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Service => write!(f, "service"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_failure_is_retriable() {
        assert!(!FailureKind::Network.is_retriable());
        assert!(!FailureKind::Service.is_retriable());
    }

    #[test]
    fn test_display() {
        assert_eq!(Call::Classify.to_string(), "classify");
        assert_eq!(FailureKind::Service.to_string(), "service");
    }
}
