//! Logging configuration and request/response log helpers.

use std::time::Duration;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::{SmtpError, SmtpResult};

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
    /// Single-line output.
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Minimum level, used when `RUST_LOG` is not set.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
    /// Include the module target in each event.
    pub include_target: bool,
    /// Include source file and line in each event.
    pub include_file_line: bool,
}

impl LoggingConfig {
    /// Creates a new logging configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the log level.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets whether to include the module target.
    pub fn with_target(mut self, include: bool) -> Self {
        self.include_target = include;
        self
    }

    /// Sets whether to include file and line number.
    pub fn with_file_line(mut self, include: bool) -> Self {
        self.include_file_line = include;
        self
    }

    /// Installs a global subscriber.
    ///
    /// `RUST_LOG` takes precedence over the configured level.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a global subscriber is already set.
    pub fn init(self) -> SmtpResult<()> {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from(self.level).into())
            .from_env_lossy();

        let registry = tracing_subscriber::registry().with(filter);
        let result = match self.format {
            LogFormat::Pretty => registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(self.include_target)
                        .with_file(self.include_file_line)
                        .with_line_number(self.include_file_line),
                )
                .try_init(),
            LogFormat::Json => registry
                .with(fmt::layer().json().with_target(self.include_target))
                .try_init(),
            LogFormat::Compact => registry
                .with(fmt::layer().compact().with_target(self.include_target))
                .try_init(),
        };

        result.map_err(|e| SmtpError::configuration(format!("Failed to initialize logging: {e}")))
    }
}

/// Logs an outgoing request. Only the body size is recorded.
pub fn log_request(method: &str, path: &str, body: Option<&[u8]>) {
    tracing::debug!(
        method = method,
        path = path,
        body_bytes = body.map_or(0, <[u8]>::len),
        "Outgoing request"
    );
}

/// Logs a received response.
pub fn log_response(status: u16, elapsed: Duration, body_bytes: usize) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    if status >= 400 {
        tracing::warn!(status, duration_ms, body_bytes, "Request failed");
    } else {
        tracing::debug!(status, duration_ms, body_bytes, "Incoming response");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(!config.include_file_line);
    }

    #[test]
    fn test_logging_config_builder_chain() {
        let config = LoggingConfig::new()
            .with_level(LogLevel::Trace)
            .with_format(LogFormat::Json)
            .with_target(true)
            .with_file_line(true);

        assert_eq!(config.level, LogLevel::Trace);
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.include_target);
        assert!(config.include_file_line);
    }

    #[test]
    fn test_level_filter_conversion() {
        assert_eq!(LevelFilter::from(LogLevel::Debug), LevelFilter::DEBUG);
        assert_eq!(LevelFilter::from(LogLevel::Error), LevelFilter::ERROR);
    }

    #[test]
    fn test_default_directive_follows_level() {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from(LogLevel::Warn).into())
            .parse_lossy("");
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn test_second_init_fails() {
        let _ = LoggingConfig::new().with_format(LogFormat::Compact).init();
        assert!(LoggingConfig::new().init().is_err());
    }

    #[test]
    fn test_log_helpers_do_not_panic() {
        log_request("POST", "/api/domains", Some(b"{}"));
        log_request("GET", "/api/domains", None);
        log_response(200, Duration::from_millis(12), 42);
        log_response(500, Duration::from_millis(12), 0);
    }
}
