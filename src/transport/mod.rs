//! HTTP transport layer for the KirimEmail client.
//!
//! Provides the HTTP transport abstraction and its reqwest implementation,
//! multipart form construction and Server-Sent-Events decoding. The transport
//! moves bytes only: authentication, default headers and response
//! classification live in [`crate::client`].

mod http;
mod multipart;
mod streaming;

pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, HttpTransportImpl};
pub use multipart::{FileInput, FormValue, MultipartForm};
pub use streaming::{ByteStream, EventStream, SseDecoder, SseLine, StreamingResponse, DONE_SENTINEL};

use std::collections::HashMap;
use std::time::Duration;

/// Multipart request for file uploads.
#[derive(Debug, Clone)]
pub struct MultipartRequest {
    /// Request path.
    pub path: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Multipart form parts.
    pub parts: Vec<MultipartPart>,
    /// Request timeout.
    pub timeout: Option<Duration>,
}

/// A part of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartPart {
    /// Text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// File field.
    File {
        /// Field name.
        name: String,
        /// File name.
        filename: String,
        /// Content type.
        content_type: String,
        /// File data.
        data: Vec<u8>,
    },
}

impl MultipartPart {
    /// Returns the form field name of this part.
    pub fn name(&self) -> &str {
        match self {
            MultipartPart::Text { name, .. } | MultipartPart::File { name, .. } => name,
        }
    }
}

/// Boxed underlying cause of a transport failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Transport error types.
///
/// Every variant keeps the failure that produced it as its `source()`.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request could not be built, so nothing was sent.
    #[error("Request error: {message}")]
    Request {
        /// Error message.
        message: String,
        /// Underlying cause.
        #[source]
        source: BoxError,
    },

    /// Connection error.
    #[error("Connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
        /// Underlying cause.
        #[source]
        source: BoxError,
    },

    /// Timeout error.
    #[error("Timeout after {timeout:?}")]
    Timeout {
        /// Timeout duration.
        timeout: Duration,
        /// Underlying cause.
        #[source]
        source: BoxError,
    },

    /// Invalid response.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Error message.
        message: String,
        /// Underlying cause.
        #[source]
        source: BoxError,
    },
}

impl TransportError {
    /// Creates a request error from its cause.
    pub fn request(source: impl Into<BoxError>) -> Self {
        let source = source.into();
        TransportError::Request {
            message: source.to_string(),
            source,
        }
    }

    /// Creates a connection error from its cause.
    pub fn connection(source: impl Into<BoxError>) -> Self {
        let source = source.into();
        TransportError::Connection {
            message: source.to_string(),
            source,
        }
    }

    /// Creates a timeout error from its cause.
    pub fn timeout(timeout: Duration, source: impl Into<BoxError>) -> Self {
        TransportError::Timeout {
            timeout,
            source: source.into(),
        }
    }

    /// Creates an invalid response error from its cause.
    pub fn invalid_response(source: impl Into<BoxError>) -> Self {
        let source = source.into();
        TransportError::InvalidResponse {
            message: source.to_string(),
            source,
        }
    }

    /// Returns true if the failure happened before anything was sent.
    pub fn is_request(&self) -> bool {
        matches!(self, TransportError::Request { .. })
    }
}
