//! Observability for the KirimEmail client.
//!
//! Transport calls emit `tracing` spans and debug events; applications that
//! do not install their own subscriber can use [`LoggingConfig::init`].

mod logging;

pub use logging::{log_request, log_response, LogFormat, LogLevel, LoggingConfig};
