//! Reply client: consented submission in, generated reply out.

use serde_json::{json, Value};
use with_coordination::PendingSubmission;

use crate::transport::{Transport, TransportError};

pub const RESPOND_PATH: &str = "/respond";

/// Wraps a `Transport` to generate a support reply.
///
/// Only ever called with a submission the user consented to act on now.
#[derive(Debug, Clone)]
pub struct ResponderClient<T> {
    transport: T,
}

impl<T: Transport> ResponderClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Generate a reply. A missing `reply` field yields an empty string.
    pub async fn respond(&self, submission: &PendingSubmission) -> Result<String, TransportError> {
        let body = json!({
            "text": submission.text.as_str(),
            "state": submission.tier.as_wire(),
        });
        let raw = self.transport.post(RESPOND_PATH, &body).await?;
        let reply = parse_reply(raw);
        tracing::info!(
            tier = %submission.tier,
            chars = reply.chars().count(),
            "Reply generated"
        );
        Ok(reply)
    }
}

fn parse_reply(raw: Value) -> String {
    raw.get("reply")
        .and_then(Value::as_str)
        .map(|r| r.trim().to_string())
        .unwrap_or_default()
}
