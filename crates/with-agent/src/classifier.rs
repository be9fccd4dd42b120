//! Classification client: note in, severity tier out.

use serde_json::{json, Value};
use with_coordination::{Note, SeverityTier};

use crate::transport::{Transport, TransportError};

pub const CLASSIFY_PATH: &str = "/classify";

/// Wraps a `Transport` to obtain a `SeverityTier` for a note.
#[derive(Debug, Clone)]
pub struct ClassifierClient<T> {
    transport: T,
}

impl<T: Transport> ClassifierClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Classify a note.
    ///
    /// A body that is not an object, lacks `state`, or carries an unknown
    /// value resolves to `Normal`. Transport failures propagate unchanged.
    pub async fn classify(&self, text: &Note) -> Result<SeverityTier, TransportError> {
        let body = json!({ "text": text.as_str() });
        let raw = self.transport.post(CLASSIFY_PATH, &body).await?;
        let tier = parse_tier(raw);
        tracing::info!(tier = %tier, "Note classified");
        Ok(tier)
    }
}

/// `Value::get` is `None` for anything but an object, so arrays and scalars
/// fail open along with a missing field.
fn parse_tier(raw: Value) -> SeverityTier {
    SeverityTier::from_wire(raw.get("state").and_then(Value::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tiers() {
        assert_eq!(parse_tier(json!({"state": "elevated"})), SeverityTier::Elevated);
        assert_eq!(parse_tier(json!({"state": "critical"})), SeverityTier::Critical);
        assert_eq!(parse_tier(json!({"state": "normal"})), SeverityTier::Normal);
    }

    #[test]
    fn test_parse_fails_open() {
        assert_eq!(parse_tier(json!({})), SeverityTier::Normal);
        assert_eq!(parse_tier(json!({"state": null})), SeverityTier::Normal);
        assert_eq!(parse_tier(json!({"state": 3})), SeverityTier::Normal);
        assert_eq!(parse_tier(json!({"state": "furious"})), SeverityTier::Normal);
        assert_eq!(parse_tier(json!(["critical"])), SeverityTier::Normal);
        assert_eq!(parse_tier(Value::Null), SeverityTier::Normal);
    }

    #[test]
    fn test_positional_array_is_not_an_object() {
        assert_eq!(parse_tier(json!(["elevated"])), SeverityTier::Normal);
        assert_eq!(
            parse_tier(json!([{"state": "critical"}])),
            SeverityTier::Normal
        );
        assert_eq!(parse_tier(json!("critical")), SeverityTier::Normal);
    }
}
