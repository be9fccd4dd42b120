//! Service liveness probe (`GET /`).

use serde_json::Value;

use crate::transport::{Transport, TransportError};

pub const HEALTH_PATH: &str = "/";

/// Query the service root and return its status string (empty if absent).
pub async fn check_health<T: Transport + ?Sized>(
    transport: &T,
) -> Result<String, TransportError> {
    let raw = transport.get(HEALTH_PATH).await?;
    Ok(parse_status(&raw))
}

fn parse_status(raw: &Value) -> String {
    raw.get("status")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
