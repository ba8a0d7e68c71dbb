//! Configuration management and environment variable loading

use crate::{QuillError, Result};
use std::env;
use std::time::Duration;

/// Default base URL of the generation service
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Load environment variables from .env file
///
/// Looks in the current directory and its parents. A missing file is not an
/// error; the process environment is used as-is.
///
/// # Example
///
/// ```no_run
/// use quill_core::load_env;
///
/// load_env().ok();
/// let api_url = std::env::var("QUILL_API_URL").unwrap_or_default();
/// ```
pub fn load_env() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::info!("Loaded environment from: {}", path.display());
            Ok(())
        }
        Err(dotenvy::Error::LineParse(line, pos)) => Err(QuillError::config(format!(
            "Failed to parse .env file at line {}, position {}",
            line, pos
        ))),
        Err(dotenvy::Error::Io(_)) => {
            tracing::debug!("No .env file found - using system environment variables only");
            Ok(())
        }
        Err(e) => Err(QuillError::config(format!(
            "Failed to load .env file: {}",
            e
        ))),
    }
}

/// Get optional environment variable with default
pub fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get environment variable as integer
pub fn get_env_int<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Client-side settings for talking to the generation service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL, without trailing slash
    pub api_url: String,
    /// TCP connect timeout; the streaming read itself is never timed out
    pub connect_timeout: Duration,
    /// Maximum notifications kept at once
    pub notification_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            notification_limit: 1,
        }
    }
}

impl ClientConfig {
    /// Build from `QUILL_API_URL`, `QUILL_CONNECT_TIMEOUT_SECS` and
    /// `QUILL_NOTIFICATION_LIMIT`
    pub fn from_env() -> Result<Self> {
        let api_url = get_env_or("QUILL_API_URL", DEFAULT_API_URL);
        let config = Self {
            api_url,
            connect_timeout: Duration::from_secs(get_env_int("QUILL_CONNECT_TIMEOUT_SECS", 10u64)),
            notification_limit: get_env_int("QUILL_NOTIFICATION_LIMIT", 1usize),
        };
        config.validated()
    }

    /// Override the base URL
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Normalize and check the settings
    pub fn validated(mut self) -> Result<Self> {
        let trimmed = self.api_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(QuillError::config("QUILL_API_URL must not be empty"));
        }
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(QuillError::config(format!(
                "QUILL_API_URL must start with http:// or https://, got '{}'",
                trimmed
            )));
        }
        self.api_url = trimmed.to_string();
        if self.notification_limit == 0 {
            self.notification_limit = 1;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_int() {
        env::set_var("QUILL_TEST_INT", "42");
        env::set_var("QUILL_TEST_INT_BAD", "forty-two");

        assert_eq!(get_env_int("QUILL_TEST_INT", 0u32), 42);
        assert_eq!(get_env_int("QUILL_TEST_INT_BAD", 7u32), 7);
    }

    #[test]
    fn test_validated_trims_trailing_slash() {
        let config = ClientConfig::default()
            .with_api_url("http://127.0.0.1:8000/")
            .validated()
            .unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:8000");
    }

    #[test]
    fn test_validated_rejects_bad_scheme() {
        let err = ClientConfig::default()
            .with_api_url("ftp://example.com")
            .validated()
            .unwrap_err();
        assert!(matches!(err, QuillError::Config(_)));
    }

    #[test]
    fn test_zero_notification_limit_is_clamped() {
        let config = ClientConfig {
            notification_limit: 0,
            ..Default::default()
        }
        .validated()
        .unwrap();
        assert_eq!(config.notification_limit, 1);
    }
}
