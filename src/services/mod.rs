//! Service implementations for the KirimEmail API.
//!
//! Each service is a borrowed view over [`crate::SmtpClient`] that validates
//! its input, calls the client and decodes the response into typed records.

mod credentials;
mod domains;
mod logs;
mod messages;
mod suppressions;

pub use credentials::CredentialsService;
pub use domains::DomainsService;
pub use logs::{LogStream, LogsService, DEFAULT_STREAM_LIMIT};
pub use messages::{MessagesService, MAX_BULK_RECIPIENTS};
pub use suppressions::SuppressionsService;

use std::borrow::Cow;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::ResponseEnvelope;
use crate::errors::SmtpResult;
use crate::types::Pagination;
use crate::validation::require_field;

/// Decodes a whole envelope into `T`.
pub(crate) fn decode<T: DeserializeOwned>(envelope: ResponseEnvelope) -> SmtpResult<T> {
    Ok(serde_json::from_value(Value::Object(envelope))?)
}

/// Decodes an optional JSON array; a missing or null value is empty.
pub(crate) fn decode_list<T: DeserializeOwned>(value: Option<&Value>) -> SmtpResult<Vec<T>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => Ok(serde_json::from_value(value.clone())?),
    }
}

/// Decodes an optional pagination block.
pub(crate) fn decode_pagination(value: Option<&Value>) -> SmtpResult<Option<Pagination>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
    }
}

/// Percent-encodes a caller-supplied path segment.
pub(crate) fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Builds `/api/domains/{domain}{suffix}`. Only `domain` is encoded.
pub(crate) fn domain_path(domain: &str, suffix: &str) -> SmtpResult<String> {
    require_field("domain", domain)?;
    Ok(format!("/api/domains/{}{suffix}", segment(domain)))
}
