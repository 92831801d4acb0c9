//! SMTP credential types.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;

use super::common::{unix_time, Pagination};

/// An SMTP credential of a domain.
///
/// `password` is only present on the responses of credential creation and
/// password reset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credential {
    /// Numeric ID.
    pub id: Option<i64>,
    /// SMTP user GUID.
    pub user_smtp_guid: Option<String>,
    /// SMTP username.
    pub username: Option<String>,
    /// Whether the credential is verified.
    pub is_verified: Option<bool>,
    /// Whether the credential is active.
    pub status: Option<bool>,
    /// Whether the credential is deleted.
    pub is_deleted: Option<bool>,
    /// Creation time, unix seconds.
    pub created_at: Option<i64>,
    /// Last modification time, unix seconds.
    pub modified_at: Option<i64>,
    /// Deletion time, unix seconds.
    pub deleted_at: Option<i64>,
    /// Last password change, unix seconds.
    pub last_password_changed: Option<i64>,
    /// Plaintext SMTP password.
    pub password: Option<SecretString>,
    /// Password strength report.
    pub strength_info: Option<Value>,
    /// Whether the credential was synced to the mail servers.
    pub remote_synced: Option<bool>,
}

impl Credential {
    /// Returns the plaintext password, if the response carried one.
    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|password| password.expose_secret().as_str())
    }

    /// Returns the creation time.
    pub fn created_at_datetime(&self) -> Option<DateTime<Utc>> {
        unix_time(self.created_at)
    }

    /// Returns the last modification time.
    pub fn modified_at_datetime(&self) -> Option<DateTime<Utc>> {
        unix_time(self.modified_at)
    }

    /// Returns the deletion time.
    pub fn deleted_at_datetime(&self) -> Option<DateTime<Utc>> {
        unix_time(self.deleted_at)
    }

    /// Returns the time of the last password change.
    pub fn last_password_changed_datetime(&self) -> Option<DateTime<Utc>> {
        unix_time(self.last_password_changed)
    }
}

/// A page of credentials.
#[derive(Debug, Clone, Default)]
pub struct CredentialList {
    /// Credentials on this page.
    pub data: Vec<Credential>,
    /// Domain the credentials belong to.
    pub domain: String,
    /// Pagination block, if the API sent one.
    pub pagination: Option<Pagination>,
}

/// Response of credential creation or password reset.
///
/// The plaintext password and sync flag are merged into `credential`.
#[derive(Debug, Clone, Default)]
pub struct CredentialSecret {
    /// Whether the API reported success.
    pub success: bool,
    /// Human-readable message.
    pub message: Option<String>,
    /// The credential, when the response carried one.
    pub credential: Option<Credential>,
}

/// Query for listing credentials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListCredentialsParams {
    /// Page size.
    pub limit: Option<u32>,
    /// Page number.
    pub page: Option<u32>,
}

impl ListCredentialsParams {
    pub(crate) fn to_query(self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(page) = self.page {
            query.push(("page".to_string(), page.to_string()));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_credential_password_is_redacted_in_debug() {
        let credential: Credential = serde_json::from_value(json!({
            "id": 7,
            "username": "mailer",
            "password": "pa55-w0rd"
        }))
        .unwrap();

        assert_eq!(credential.password(), Some("pa55-w0rd"));
        assert!(!format!("{credential:?}").contains("pa55-w0rd"));
    }

    #[test]
    fn test_credential_timestamps() {
        let credential: Credential = serde_json::from_value(json!({
            "created_at": 1_700_000_000,
            "last_password_changed": 0
        }))
        .unwrap();

        assert!(credential.created_at_datetime().is_some());
        assert!(credential.last_password_changed_datetime().is_none());
        assert!(credential.deleted_at_datetime().is_none());
    }
}
