//! Gateway endpoint configuration.
//!
//! The only configuration this crate takes from the environment is the API
//! root and a transport timeout. Empty variables count as unset; a variable
//! that is present but unparsable is an error rather than a silent default.

use std::time::Duration;

use thiserror::Error;

/// Default API root when `TASK_BOARD_API_URL` is not set.
const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Default request timeout in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Connection settings for the remote gateways.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the REST backend, without a trailing slash.
    pub base_url: String,
    /// Per-request transport timeout.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ApiConfig {
    /// Read configuration from the environment.
    ///
    /// `TASK_BOARD_API_URL` overrides the base URL and
    /// `TASK_BOARD_TIMEOUT_MS` the request timeout.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("TASK_BOARD_API_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_ms = match std::env::var("TASK_BOARD_TIMEOUT_MS") {
            Ok(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout { value })?,
            Err(_) => DEFAULT_TIMEOUT_MS,
        };

        Ok(ApiConfig {
            base_url,
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

/// Invalid environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TASK_BOARD_TIMEOUT_MS is not a valid millisecond count: {value:?}")]
    InvalidTimeout { value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080/api");
        assert_eq!(config.timeout, Duration::from_millis(5000));
    }
}
