//! Logging utilities

use std::sync::OnceLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: OnceLock<()> = OnceLock::new();

/// Default filter when neither `RUST_LOG` nor `QUILL_LOG_LEVEL` is set
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Filter directive from `QUILL_LOG_LEVEL`
pub fn configured_level() -> String {
    std::env::var("QUILL_LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
}

/// Initialize the global logging system
///
/// Logs go to stderr so they never interleave with rendered chat output.
/// `RUST_LOG` wins over `QUILL_LOG_LEVEL`. Safe to call more than once.
pub fn init_logging() {
    INIT.get_or_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured_level()));

        let result = tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .try_init();
        if let Err(e) = result {
            eprintln!("logging already initialized: {}", e);
        }
    });
}

/// Target-scoped logger
#[derive(Clone, Debug)]
pub struct Logger {
    namespace: String,
}

impl Logger {
    /// Create a new logger with a namespace
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Log an info message
    pub fn info(&self, message: &str) {
        tracing::info!("[{}] {}", self.namespace, message);
    }

    /// Log a debug message
    pub fn debug(&self, message: &str) {
        tracing::debug!("[{}] {}", self.namespace, message);
    }

    /// Log a warning message
    pub fn warn(&self, message: &str) {
        tracing::warn!("[{}] {}", self.namespace, message);
    }

    /// Log an error message
    pub fn error(&self, message: &str) {
        tracing::error!("[{}] {}", self.namespace, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
        Logger::new("test").debug("still alive");
    }
}
