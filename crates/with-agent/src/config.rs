//! Service endpoint configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. Environment variable overrides (`WITH_API_BASE`, `WITH_TIMEOUT_SECS`)
//! 2. Values from the TOML file passed with `--config`
//! 3. Built-in defaults (local service on port 8000, 30 s timeout)

use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Default base URL of the classification/reply service.
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
/// Default per-request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str = concat!("with-agent/", env!("CARGO_PKG_VERSION"));

const ENV_BASE_URL: &str = "WITH_API_BASE";
const ENV_TIMEOUT_SECS: &str = "WITH_TIMEOUT_SECS";

/// Where and how to reach the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL; endpoint paths (`/classify`, `/respond`) are appended.
    pub base_url: String,
    /// Per-request timeout covering connect and body.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply overrides from `lookup` (the process environment in `load`).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if url.is_empty() {
            bail!("base_url must not be empty");
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("base_url must start with http:// or https:// (got '{}')", url);
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Join the base URL and an endpoint path with exactly one slash.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Host portion of the base URL, for the status line.
    pub fn display_host(&self) -> &str {
        let url = self.base_url.trim();
        url.strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .unwrap_or(url)
            .trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_endpoint_joins_single_slash() {
        let config = ServiceConfig {
            base_url: "https://example.test/".into(),
            ..Default::default()
        };
        assert_eq!(config.endpoint("/classify"), "https://example.test/classify");
        assert_eq!(config.endpoint("respond"), "https://example.test/respond");
        assert_eq!(config.endpoint("/"), "https://example.test/");
    }

    #[test]
    fn test_display_host_strips_scheme() {
        let config = ServiceConfig {
            base_url: "https://web.example.app".into(),
            ..Default::default()
        };
        assert_eq!(config.display_host(), "web.example.app");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_scheme = ServiceConfig {
            base_url: "ftp://example".into(),
            ..Default::default()
        };
        assert!(bad_scheme.validate().is_err());

        let zero_timeout = ServiceConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_from_file_partial_toml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("with.toml");
        std::fs::write(&path, "base_url = \"https://svc.example\"\n").unwrap();

        let config = ServiceConfig::from_file(&path).unwrap();
        assert_eq!(config.base_url, "https://svc.example");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("with.toml");
        std::fs::write(
            &path,
            "base_url = \"https://file.example\"\ntimeout_secs = 12\n",
        )
        .unwrap();

        let mut config = ServiceConfig::from_file(&path).unwrap();
        config
            .apply_env(|key| match key {
                ENV_BASE_URL => Some("https://env.example".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.base_url, "https://env.example");
        assert_eq!(config.timeout_secs, 12);

        config
            .apply_env(|key| (key == ENV_TIMEOUT_SECS).then(|| " 45 ".to_string()))
            .unwrap();
        assert_eq!(config.base_url, "https://env.example");
        assert_eq!(config.timeout(), Duration::from_secs(45));
    }

    #[test]
    fn test_env_without_overrides_keeps_values() {
        let mut config = ServiceConfig::default();
        config.apply_env(|_| None).unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_env_timeout_must_be_whole_seconds() {
        let mut config = ServiceConfig::default();
        let err = config
            .apply_env(|key| (key == ENV_TIMEOUT_SECS).then(|| "1.5".to_string()))
            .unwrap_err();

        assert!(err.to_string().contains("WITH_TIMEOUT_SECS must be a whole number"));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "timeout_secs = \"soon\"\n").unwrap();

        let err = ServiceConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
