//! JSON-over-HTTP transport to the classification/reply service.
//!
//! One call is exactly one outbound request: no retries, no caching. Callers
//! treat any error as terminal for the submission it belongs to.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use thiserror::Error;
use with_coordination::FailureKind;

use crate::config::ServiceConfig;

const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be completed (DNS, connect, timeout).
    #[error("network error: {cause}")]
    Network { cause: String },

    /// The service answered with a non-2xx status.
    #[error("service error ({status}): {body}")]
    Service { status: u16, body: String },

    /// A 2xx answer whose body is not JSON.
    #[error("undecodable response: {cause}")]
    Decode { cause: String },
}

impl TransportError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network { .. } => FailureKind::Network,
            Self::Service { .. } | Self::Decode { .. } => FailureKind::Service,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode {
                cause: e.to_string(),
            }
        } else {
            Self::Network {
                cause: e.to_string(),
            }
        }
    }
}

/// Request/response exchange with the service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` as JSON to `path` and return the decoded JSON answer.
    async fn post(&self, path: &str, body: &Value) -> Result<Value, TransportError>;

    /// GET `path` and return the decoded JSON answer.
    async fn get(&self, path: &str) -> Result<Value, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn post(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        (**self).post(path, body).await
    }

    async fn get(&self, path: &str) -> Result<Value, TransportError> {
        (**self).get(path).await
    }
}

/// `Transport` backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    config: ServiceConfig,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: ServiceConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    async fn finish(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<Value, TransportError> {
        let status = response.status();
        tracing::debug!(path, status = status.as_u16(), "Service responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode {
            cause: e.to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        let url = self.config.endpoint(path);
        tracing::debug!(url = %url, "POST");

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8))
            .json(body)
            .send()
            .await?;

        self.finish(path, response).await
    }

    async fn get(&self, path: &str) -> Result<Value, TransportError> {
        let url = self.config.endpoint(path);
        tracing::debug!(url = %url, "GET");

        let response = self.http.get(&url).send().await?;
        self.finish(path, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let network = TransportError::Network {
            cause: "connection refused".into(),
        };
        let service = TransportError::Service {
            status: 503,
            body: "down".into(),
        };
        let decode = TransportError::Decode {
            cause: "expected value".into(),
        };
        assert_eq!(network.kind(), FailureKind::Network);
        assert_eq!(service.kind(), FailureKind::Service);
        assert_eq!(decode.kind(), FailureKind::Service);
    }

    #[test]
    fn test_service_error_display_includes_status() {
        let err = TransportError::Service {
            status: 422,
            body: "missing text".into(),
        };
        assert_eq!(err.to_string(), "service error (422): missing text");
    }
}
