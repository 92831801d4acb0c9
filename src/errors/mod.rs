//! Error types for the KirimEmail client.
//!
//! Every failed call surfaces as a [`SmtpError`]. Errors produced from an HTTP
//! response are classified by status code (see [`classify`]); errors raised
//! before any request is sent are either [`SmtpError::InvalidRequest`]
//! (pre-flight validation), [`SmtpError::Configuration`] or
//! [`SmtpError::File`].

use std::path::PathBuf;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for KirimEmail operations.
pub type SmtpResult<T> = Result<T, SmtpError>;

/// Message used when an error payload carries neither `message` nor `error`.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown API error";

/// Prefix carried by errors raised before any response was received.
pub const NETWORK_ERROR_PREFIX: &str = "Network error: ";

/// Error type for KirimEmail client operations.
#[derive(Debug, Error)]
pub enum SmtpError {
    /// The API rejected the request payload (HTTP 400 or 422).
    #[error("Validation failed: {message}")]
    Validation {
        /// Error message from the API.
        message: String,
        /// Per-field error messages, when the API sent them.
        errors: Option<FieldErrors>,
        /// HTTP status code.
        status_code: u16,
    },

    /// Credentials were rejected or lack permission (HTTP 401 or 403).
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Error message from the API.
        message: String,
        /// HTTP status code.
        status_code: u16,
    },

    /// The requested resource does not exist (HTTP 404).
    #[error("Not found: {message}")]
    NotFound {
        /// Error message from the API.
        message: String,
    },

    /// The server failed to handle the request (HTTP 5xx).
    #[error("Server error (HTTP {status_code}): {message}")]
    Server {
        /// Error message from the API.
        message: String,
        /// HTTP status code.
        status_code: u16,
    },

    /// Any other API failure: unclassified 4xx statuses, undecodable bodies
    /// and network failures.
    #[error("{message}")]
    Api {
        /// Error message.
        message: String,
        /// HTTP status code, absent when no response was received.
        status_code: Option<u16>,
        /// Underlying cause.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The request was rejected locally before being sent.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of the invalid input.
        message: String,
    },

    /// The client was configured with invalid settings.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// An attachment could not be read from disk.
    #[error("Failed to read attachment {}: {source}", path.display())]
    File {
        /// Path of the attachment.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Coarse error category, convenient for branching in callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`SmtpError::Validation`].
    Validation,
    /// See [`SmtpError::Authentication`].
    Authentication,
    /// See [`SmtpError::NotFound`].
    NotFound,
    /// See [`SmtpError::Server`].
    Server,
    /// See [`SmtpError::Api`].
    Api,
    /// See [`SmtpError::InvalidRequest`].
    InvalidRequest,
    /// See [`SmtpError::Configuration`].
    Configuration,
    /// See [`SmtpError::File`].
    File,
}

impl SmtpError {
    /// Creates a pre-flight validation error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        SmtpError::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        SmtpError::Configuration {
            message: message.into(),
        }
    }

    /// Creates a generic API error without a cause.
    pub fn api(message: impl Into<String>, status_code: Option<u16>) -> Self {
        SmtpError::Api {
            message: message.into(),
            status_code,
            source: None,
        }
    }

    /// Wraps a transport failure that happened before a response arrived.
    pub fn network(error: TransportError) -> Self {
        SmtpError::Api {
            message: format!("{NETWORK_ERROR_PREFIX}{error}"),
            status_code: None,
            source: Some(Box::new(error)),
        }
    }

    /// Returns the error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SmtpError::Validation { .. } => ErrorKind::Validation,
            SmtpError::Authentication { .. } => ErrorKind::Authentication,
            SmtpError::NotFound { .. } => ErrorKind::NotFound,
            SmtpError::Server { .. } => ErrorKind::Server,
            SmtpError::Api { .. } => ErrorKind::Api,
            SmtpError::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            SmtpError::Configuration { .. } => ErrorKind::Configuration,
            SmtpError::File { .. } => ErrorKind::File,
        }
    }

    /// Returns the human-readable message without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            SmtpError::Validation { message, .. }
            | SmtpError::Authentication { message, .. }
            | SmtpError::NotFound { message }
            | SmtpError::Server { message, .. }
            | SmtpError::Api { message, .. }
            | SmtpError::InvalidRequest { message }
            | SmtpError::Configuration { message } => message.clone(),
            SmtpError::File { path, source } => format!("{}: {source}", path.display()),
        }
    }

    /// Returns the HTTP status code that produced this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SmtpError::Validation { status_code, .. }
            | SmtpError::Authentication { status_code, .. }
            | SmtpError::Server { status_code, .. } => Some(*status_code),
            SmtpError::NotFound { .. } => Some(404),
            SmtpError::Api { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// Returns true if the failure happened before any response was received.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            SmtpError::Api { status_code: None, message, .. } if message.starts_with(NETWORK_ERROR_PREFIX)
        )
    }

    /// Returns the per-field error mapping, if present.
    pub fn errors(&self) -> Option<&FieldErrors> {
        match self {
            SmtpError::Validation { errors, .. } => errors.as_ref(),
            _ => None,
        }
    }

    /// Returns true if a non-empty field error mapping is attached.
    pub fn has_errors(&self) -> bool {
        self.errors().is_some_and(|errors| !errors.is_empty())
    }

    /// Returns the first message of the first field with a non-empty list.
    pub fn first_error(&self) -> Option<&str> {
        self.errors().and_then(FieldErrors::first)
    }

    /// Returns the messages attached to `field`.
    pub fn field_errors(&self, field: &str) -> Option<&[String]> {
        self.errors().and_then(|errors| errors.get(field))
    }

    /// Returns true if `field` has at least one message.
    pub fn has_field_error(&self, field: &str) -> bool {
        self.errors().is_some_and(|errors| errors.contains(field))
    }
}

/// Per-field validation messages in the order the API sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    entries: Vec<(String, Vec<String>)>,
}

impl FieldErrors {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the mapping from a decoded `errors` value.
    ///
    /// Returns `None` unless the value is a JSON object. A field whose value
    /// is a bare string is treated as a single message; non-string list
    /// items are skipped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(
            object
                .iter()
                .map(|(field, messages)| {
                    let messages = match messages {
                        Value::String(message) => vec![message.clone()],
                        Value::Array(items) => items
                            .iter()
                            .filter_map(|item| item.as_str().map(str::to_string))
                            .collect(),
                        _ => Vec::new(),
                    };
                    (field.clone(), messages)
                })
                .collect(),
        )
    }

    /// Sets the messages for a field, replacing any previous entry in place.
    pub fn insert(&mut self, field: impl Into<String>, messages: Vec<String>) {
        let field = field.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = messages,
            None => self.entries.push((field, messages)),
        }
    }

    /// Returns the messages for `field`.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    /// Returns true if `field` has at least one message.
    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some_and(|messages| !messages.is_empty())
    }

    /// Returns the first message of the first field with a non-empty list.
    pub fn first(&self) -> Option<&str> {
        self.entries
            .iter()
            .find_map(|(_, messages)| messages.first())
            .map(String::as_str)
    }

    /// Returns true if no field is present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates fields and their messages in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }
}

impl FromIterator<(String, Vec<String>)> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        let mut errors = FieldErrors::new();
        for (field, messages) in iter {
            errors.insert(field, messages);
        }
        errors
    }
}

/// Maps an error status and its decoded payload to a classified error.
///
/// `status` must be 400 or above. The message is taken from `message`, then
/// `error`, then [`UNKNOWN_ERROR_MESSAGE`].
pub fn classify(status: u16, body: Option<&Map<String, Value>>) -> SmtpError {
    let message = body
        .and_then(|map| {
            map.get("message")
                .and_then(Value::as_str)
                .or_else(|| map.get("error").and_then(Value::as_str))
        })
        .unwrap_or(UNKNOWN_ERROR_MESSAGE)
        .to_string();

    match status {
        400 | 422 => SmtpError::Validation {
            message,
            errors: body
                .and_then(|map| map.get("errors"))
                .and_then(FieldErrors::from_value),
            status_code: status,
        },
        401 | 403 => SmtpError::Authentication {
            message,
            status_code: status,
        },
        404 => SmtpError::NotFound { message },
        500.. => SmtpError::Server {
            message,
            status_code: status,
        },
        _ => SmtpError::Api {
            message,
            status_code: Some(status),
            source: None,
        },
    }
}

impl From<TransportError> for SmtpError {
    /// A request that could not be built is rejected locally; every other
    /// transport failure is a network error.
    fn from(error: TransportError) -> Self {
        if error.is_request() {
            SmtpError::invalid_request(error.to_string())
        } else {
            SmtpError::network(error)
        }
    }
}

impl From<serde_json::Error> for SmtpError {
    fn from(err: serde_json::Error) -> Self {
        SmtpError::Api {
            message: format!("Failed to decode response: {err}"),
            status_code: None,
            source: Some(Box::new(err)),
        }
    }
}

impl From<url::ParseError> for SmtpError {
    fn from(err: url::ParseError) -> Self {
        SmtpError::Configuration {
            message: format!("Invalid URL: {err}"),
        }
    }
}
