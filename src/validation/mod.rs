//! Pre-flight input checks.
//!
//! Every failure is an [`SmtpError::InvalidRequest`] raised before any
//! request is sent.

use chrono::DateTime;
use regex::Regex;
use std::sync::OnceLock;

use crate::errors::{SmtpError, SmtpResult};

/// Date format accepted by log filters, e.g. `2024-01-31T23:59:59+07:00`.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$";

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).ok()).as_ref()
}

/// Returns true if `address` is a syntactically valid email address.
pub fn is_valid_email(address: &str) -> bool {
    address.len() <= 254
        && address.split('@').next().is_some_and(|local| local.len() <= 64)
        && email_regex().is_some_and(|regex| regex.is_match(address))
}

/// Returns true if `value` is a date in [`DATE_FORMAT`] that formats back
/// to the same text.
pub fn is_valid_datetime(value: &str) -> bool {
    DateTime::parse_from_str(value, DATE_FORMAT)
        .is_ok_and(|parsed| parsed.format(DATE_FORMAT).to_string() == value)
}

/// Fails if `value` is empty.
pub fn require_field(field: &str, value: &str) -> SmtpResult<()> {
    if value.trim().is_empty() {
        return Err(SmtpError::invalid_request(format!(
            "Missing required field: {field}"
        )));
    }
    Ok(())
}

/// Fails if `address` is not a valid email address.
pub fn require_email(field: &str, address: &str) -> SmtpResult<()> {
    if !is_valid_email(address) {
        return Err(SmtpError::invalid_request(format!(
            "Invalid {field} email address: {address}"
        )));
    }
    Ok(())
}

/// Fails if `value` is outside `min..=max`.
pub fn require_range(value: i64, min: i64, max: i64, message: &str) -> SmtpResult<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(SmtpError::invalid_request(message))
    }
}
