//! Client configuration.
//!
//! Configuration comes from environment variables (`JAM_*` prefixed) with
//! defaults from `jam_core::defaults`.
//!
//! # Example
//!
//! ```rust,no_run
//! use jam_client::config::ClientConfig;
//!
//! let config = ClientConfig::from_env();
//! config.validate().expect("invalid client config");
//! ```

use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use jam_core::defaults;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for jam_core::Error {
    fn from(e: ConfigError) -> Self {
        jam_core::Error::Config(e.to_string())
    }
}

/// Connection settings for the collection store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the store, without trailing slash.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::API_URL.to_string(),
            timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `JAM_API_URL` | `http://localhost:8000` | Store base URL |
    /// | `JAM_TIMEOUT_SECS` | `30` | Per-request timeout |
    pub fn from_env() -> Self {
        let base_url =
            env::var(defaults::ENV_API_URL).unwrap_or_else(|_| defaults::API_URL.to_string());

        let timeout_secs = env::var(defaults::ENV_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::REQUEST_TIMEOUT_SECS);

        Self::new(base_url).with_timeout_secs(timeout_secs)
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.base_url.is_empty() {
            return Err(ConfigError::Validation(
                "base_url cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let config = ClientConfig::new("http://store:9000/");
        assert_eq!(config.base_url, "http://store:9000");
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        let config = ClientConfig::new("ftp://store");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http:// or https://"));
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let config = ClientConfig::new("");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = ClientConfig::default().with_timeout_secs(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_error_into_core_error() {
        let err: jam_core::Error = ConfigError::Validation("bad".to_string()).into();
        assert!(matches!(err, jam_core::Error::Config(_)));
    }
}
