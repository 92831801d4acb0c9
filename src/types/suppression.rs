//! Suppression list types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::common::{unix_time, Pagination};
use crate::errors::SmtpError;

/// Kind of suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuppressionType {
    /// The recipient unsubscribed.
    Unsubscribe,
    /// The recipient bounced.
    Bounce,
    /// The recipient is whitelisted.
    Whitelist,
}

impl SuppressionType {
    /// Returns the name used by the API.
    pub fn as_str(self) -> &'static str {
        match self {
            SuppressionType::Unsubscribe => "unsubscribe",
            SuppressionType::Bounce => "bounce",
            SuppressionType::Whitelist => "whitelist",
        }
    }
}

impl fmt::Display for SuppressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuppressionType {
    type Err = SmtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unsubscribe" => Ok(SuppressionType::Unsubscribe),
            "bounce" => Ok(SuppressionType::Bounce),
            "whitelist" => Ok(SuppressionType::Whitelist),
            _ => Err(SmtpError::invalid_request(
                "Invalid suppression type. Must be one of: unsubscribe, bounce, whitelist",
            )),
        }
    }
}

/// A suppressed recipient.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Suppression {
    /// Numeric ID.
    pub id: Option<i64>,
    /// Owner GUID.
    pub user_guid: Option<String>,
    /// Domain GUID.
    pub user_domain_guid: Option<String>,
    /// Raw suppression type.
    #[serde(rename = "type")]
    pub suppression_type: Option<String>,
    /// `email` or `domain`.
    pub recipient_type: Option<String>,
    /// Suppressed address or domain.
    pub recipient: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Origin of the suppression.
    pub source: Option<String>,
    /// Tags.
    pub tags: Option<Value>,
    /// Creation time, unix seconds.
    pub created_at: Option<i64>,
    /// Last modification time, unix seconds.
    pub modified_at: Option<i64>,
}

impl Suppression {
    /// Returns the suppression type, if known.
    pub fn kind(&self) -> Option<SuppressionType> {
        self.suppression_type.as_deref().and_then(|kind| kind.parse().ok())
    }

    /// Returns the creation time.
    pub fn created_at_datetime(&self) -> Option<DateTime<Utc>> {
        unix_time(self.created_at)
    }

    /// Returns the last modification time.
    pub fn modified_at_datetime(&self) -> Option<DateTime<Utc>> {
        unix_time(self.modified_at)
    }

    /// Returns true for unsubscribes.
    pub fn is_unsubscribe(&self) -> bool {
        self.kind() == Some(SuppressionType::Unsubscribe)
    }

    /// Returns true for bounces.
    pub fn is_bounce(&self) -> bool {
        self.kind() == Some(SuppressionType::Bounce)
    }

    /// Returns true for whitelist entries.
    pub fn is_whitelist(&self) -> bool {
        self.kind() == Some(SuppressionType::Whitelist)
    }

    /// Returns true if a single address is suppressed.
    pub fn is_email_type(&self) -> bool {
        self.recipient_type.as_deref() == Some("email")
    }

    /// Returns true if a whole domain is suppressed.
    pub fn is_domain_type(&self) -> bool {
        self.recipient_type.as_deref() == Some("domain")
    }
}

/// A page of suppressions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuppressionList {
    /// Suppressions on this page.
    pub data: Vec<Suppression>,
    /// Pagination block, if the API sent one.
    pub pagination: Option<Pagination>,
    /// Filters the API applied, empty when absent.
    pub filters: Map<String, Value>,
}

/// Filters for suppression queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppressionQuery {
    /// Suppression type.
    pub suppression_type: Option<SuppressionType>,
    /// Search term, an address or a domain.
    pub search: Option<String>,
    /// Page number, from 1.
    pub page: Option<i64>,
    /// Page size, 10 to 100.
    pub per_page: Option<i64>,
}

impl SuppressionQuery {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by type.
    pub fn suppression_type(mut self, suppression_type: SuppressionType) -> Self {
        self.suppression_type = Some(suppression_type);
        self
    }

    /// Sets the search term.
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Sets the page number and size.
    pub fn page(mut self, page: i64, per_page: i64) -> Self {
        self.page = Some(page);
        self.per_page = Some(per_page);
        self
    }

    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(kind) = self.suppression_type {
            query.push(("type".to_string(), kind.as_str().to_string()));
        }
        if let Some(search) = &self.search {
            query.push(("search".to_string(), search.clone()));
        }
        if let Some(page) = self.page {
            query.push(("page".to_string(), page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            query.push(("per_page".to_string(), per_page.to_string()));
        }
        query
    }
}
