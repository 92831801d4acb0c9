//! Domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::common::{unix_time, Pagination};

/// A sending domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Domain {
    /// Numeric ID.
    pub id: Option<i64>,
    /// Domain name.
    pub domain: Option<String>,
    /// Tracking link domain.
    pub tracklink_domain: Option<String>,
    /// Whether the tracking link domain is verified.
    pub tracklink_domain_is_verified: Option<bool>,
    /// Whether the authentication domain is verified.
    pub auth_domain_is_verified: Option<bool>,
    /// DKIM selector.
    pub dns_selector: Option<String>,
    /// DKIM record value.
    pub dns_record: Option<String>,
    /// Click tracking.
    pub click_track: Option<bool>,
    /// Open tracking.
    pub open_track: Option<bool>,
    /// Unsubscribe tracking.
    pub unsub_track: Option<bool>,
    /// Whether the domain is verified.
    pub is_verified: Option<bool>,
    /// Whether the domain is active.
    pub status: Option<bool>,
    /// Creation time, unix seconds.
    pub created_at: Option<i64>,
    /// Last modification time, unix seconds.
    pub modified_at: Option<i64>,
    /// Authentication domain.
    pub auth_domain: Option<String>,
    /// DKIM record of the authentication domain.
    pub auth_domain_dkim_record: Option<String>,
    /// DKIM selector of the authentication domain.
    pub auth_domain_dkim_selector: Option<String>,
}

impl Domain {
    /// Returns the creation time.
    pub fn created_at_datetime(&self) -> Option<DateTime<Utc>> {
        unix_time(self.created_at)
    }

    /// Returns the last modification time.
    pub fn modified_at_datetime(&self) -> Option<DateTime<Utc>> {
        unix_time(self.modified_at)
    }
}

/// A page of domains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainList {
    /// Domains on this page.
    pub data: Vec<Domain>,
    /// Pagination block, if the API sent one.
    pub pagination: Option<Pagination>,
}

/// Query for listing domains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListDomainsParams {
    /// Page size.
    pub limit: Option<u32>,
    /// Page number.
    pub page: Option<u32>,
    /// Search term.
    pub search: Option<String>,
}

impl ListDomainsParams {
    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(page) = self.page {
            query.push(("page".to_string(), page.to_string()));
        }
        if let Some(search) = &self.search {
            query.push(("search".to_string(), search.clone()));
        }
        query
    }
}

/// DKIM key length for new domains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DkimKeyLength {
    /// 1024-bit key.
    Bits1024,
    /// 2048-bit key.
    #[default]
    Bits2048,
}

impl DkimKeyLength {
    /// Returns the key length in bits.
    pub fn bits(self) -> u16 {
        match self {
            DkimKeyLength::Bits1024 => 1024,
            DkimKeyLength::Bits2048 => 2048,
        }
    }
}

impl Serialize for DkimKeyLength {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.bits())
    }
}

/// Tracking settings for [`crate::services::DomainsService::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DomainSettings {
    /// Open tracking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_track: Option<bool>,
    /// Click tracking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_track: Option<bool>,
    /// Unsubscribe tracking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsub_track: Option<bool>,
}

/// Authentication domain setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthDomainSetup {
    /// Authentication domain, usually a subdomain.
    pub auth_domain: String,
    /// DKIM key length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dkim_key_length: Option<DkimKeyLength>,
}

/// Result of a DNS verification.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DnsVerification {
    /// Whether the API reported success.
    pub success: bool,
    /// Human-readable message.
    pub message: Option<String>,
    /// Per-record verification results.
    pub records: Option<Value>,
}
