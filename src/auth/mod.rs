//! Authentication module for the KirimEmail client.
//!
//! The API accepts two HTTP Basic credential pairs: account credentials
//! (username and token) and per-domain credentials (API key and secret).
//! Which pair is sent depends on the request path.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::config::SmtpConfig;

/// Path prefix of the endpoints authenticated with domain credentials.
pub const V4_PREFIX: &str = "/api/v4/";

/// Header carrying the domain name on v4 requests.
pub const DOMAIN_HEADER: &str = "domain";

const AUTHORIZATION: &str = "Authorization";

/// Authentication provider trait.
///
/// Implementations of this trait attach credentials to outgoing requests.
pub trait AuthProvider: Send + Sync {
    /// Apply authentication to the headers of a request for `path`.
    ///
    /// `multipart` is true for form uploads.
    fn apply_auth(&self, path: &str, multipart: bool, headers: &mut HashMap<String, String>);

    /// Get the authentication scheme name.
    fn scheme(&self) -> &str;
}

/// HTTP Basic authentication with account and domain credential pairs.
#[derive(Clone, Default)]
pub struct BasicAuth {
    account: Option<(String, SecretString)>,
    domain: Option<(SecretString, SecretString)>,
}

impl BasicAuth {
    /// Creates a provider without credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider from the credentials in a configuration.
    pub fn from_config(config: &SmtpConfig) -> Self {
        let account = match (&config.username, &config.token) {
            (Some(username), Some(token)) => Some((username.clone(), token.clone())),
            _ => None,
        };
        let domain = match (&config.domain_api_key, &config.domain_api_secret) {
            (Some(key), Some(secret)) => Some((key.clone(), secret.clone())),
            _ => None,
        };
        Self { account, domain }
    }

    /// Sets the account credentials.
    pub fn with_account(mut self, username: impl Into<String>, token: impl Into<String>) -> Self {
        self.account = Some((username.into(), SecretString::new(token.into())));
        self
    }

    /// Sets the domain credentials.
    pub fn with_domain(mut self, api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        self.domain = Some((
            SecretString::new(api_key.into()),
            SecretString::new(api_secret.into()),
        ));
        self
    }

    /// Returns the `Authorization` value for `path`, if any pair applies.
    pub fn authorization_for(&self, path: &str) -> Option<String> {
        if is_v4_path(path) {
            if let Some((key, secret)) = &self.domain {
                return Some(basic(key.expose_secret(), secret.expose_secret()));
            }
        }
        self.account
            .as_ref()
            .map(|(username, token)| basic(username, token.expose_secret()))
    }
}

impl AuthProvider for BasicAuth {
    fn apply_auth(&self, path: &str, multipart: bool, headers: &mut HashMap<String, String>) {
        let Some(value) = self.authorization_for(path) else {
            return;
        };

        headers.retain(|name, _| !name.eq_ignore_ascii_case(AUTHORIZATION));
        headers.insert(AUTHORIZATION.to_string(), value);

        if self.domain.is_none() || !is_v4_path(path) || multipart {
            return;
        }

        let has_domain = headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case(DOMAIN_HEADER));
        if !has_domain {
            if let Some(domain) = extract_domain(path) {
                headers.insert(DOMAIN_HEADER.to_string(), domain.to_string());
            }
        }
    }

    fn scheme(&self) -> &str {
        "Basic"
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.account.as_ref().map(|(username, _)| username))
            .field("token", &self.account.as_ref().map(|_| "[REDACTED]"))
            .field("domain_credentials", &self.domain.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Returns true if `path` addresses the v4 API namespace.
pub fn is_v4_path(path: &str) -> bool {
    let path = path.trim_start_matches('/');
    path.starts_with(&V4_PREFIX[1..])
}

/// Extracts the first path segment after `/api/domains/` or
/// `/api/v4/domains/`.
pub fn extract_domain(path: &str) -> Option<&str> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(r"/api/(?:v4/)?domains/([^/?#]+)").ok())
        .as_ref()?;

    pattern
        .captures(path)
        .and_then(|captures| captures.get(1))
        .map(|segment| segment.as_str())
}

fn basic(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn both() -> BasicAuth {
        BasicAuth::new()
            .with_account("acme", "tok")
            .with_domain("key", "secret")
    }

    #[test]
    fn test_v4_path_uses_domain_pair_and_derives_domain() {
        let mut headers = HashMap::new();

        both().apply_auth("/api/v4/domains/acme.com/messages", false, &mut headers);

        assert_eq!(
            headers.get("Authorization").map(String::as_str),
            Some(format!("Basic {}", STANDARD.encode("key:secret")).as_str())
        );
        assert_eq!(headers.get("domain").map(String::as_str), Some("acme.com"));
    }

    #[test]
    fn test_explicit_domain_header_is_kept() {
        let mut headers = HashMap::new();
        headers.insert("Domain".to_string(), "other.com".to_string());

        both().apply_auth("/api/v4/domains/acme.com/messages", false, &mut headers);

        assert_eq!(headers.get("Domain").map(String::as_str), Some("other.com"));
        assert!(!headers.contains_key("domain"));
    }

    #[test]
    fn test_multipart_never_derives_domain() {
        let mut headers = HashMap::new();

        both().apply_auth("/api/v4/domains/acme.com/messages", true, &mut headers);

        assert!(headers.contains_key("Authorization"));
        assert!(!headers.contains_key("domain"));
    }

    #[test]
    fn test_non_v4_path_uses_account_pair() {
        let mut headers = HashMap::new();

        both().apply_auth("/api/domains/acme.com", false, &mut headers);

        assert_eq!(
            headers.get("Authorization").map(String::as_str),
            Some(format!("Basic {}", STANDARD.encode("acme:tok")).as_str())
        );
        assert!(!headers.contains_key("domain"));
    }

    #[test]
    fn test_v4_without_domain_pair_falls_back_to_account() {
        let auth = BasicAuth::new().with_account("acme", "tok");
        let mut headers = HashMap::new();

        auth.apply_auth("/api/v4/domains/acme.com", false, &mut headers);

        assert_eq!(
            headers.get("Authorization").map(String::as_str),
            Some(format!("Basic {}", STANDARD.encode("acme:tok")).as_str())
        );
        assert!(!headers.contains_key("domain"));
    }

    #[test]
    fn test_no_credentials_leaves_headers_alone() {
        let mut headers = HashMap::new();
        headers.insert("authorization".to_string(), "Bearer caller".to_string());

        BasicAuth::new().apply_auth("/api/domains", false, &mut headers);

        assert_eq!(
            headers.get("authorization").map(String::as_str),
            Some("Bearer caller")
        );
    }

    #[test]
    fn test_configured_auth_replaces_caller_authorization() {
        let mut headers = HashMap::new();
        headers.insert("authorization".to_string(), "Bearer caller".to_string());

        both().apply_auth("/api/domains", false, &mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers["Authorization"].starts_with("Basic "));
    }

    #[test_case("/api/domains/acme.com/log", Some("acme.com"))]
    #[test_case("/api/v4/domains/acme.com", Some("acme.com"))]
    #[test_case("/api/domains/acme.com?x=1", Some("acme.com"))]
    #[test_case("/api/domains", None)]
    #[test_case("/api/v4/messages", None)]
    fn test_extract_domain(path: &str, expected: Option<&str>) {
        assert_eq!(extract_domain(path), expected);
    }

    #[test_case("/api/v4/domains", true)]
    #[test_case("api/v4/domains", true)]
    #[test_case("/api/v41/domains", false)]
    #[test_case("/api/domains/v4", false)]
    fn test_is_v4_path(path: &str, expected: bool) {
        assert_eq!(is_v4_path(path), expected);
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let debug_str = format!("{:?}", both());
        assert!(debug_str.contains("acme"));
        assert!(!debug_str.contains("tok\""));
        assert!(!debug_str.contains("secret"));
        assert_eq!(both().scheme(), "Basic");
    }
}
