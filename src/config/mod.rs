//! Configuration module for the KirimEmail client.
//!
//! Holds the base URL, both credential pairs, timeouts and default headers.
//! A configuration is immutable once built; pointing a client at another
//! base URL produces a new configuration.

use reqwest::header::{HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

use crate::errors::{SmtpError, SmtpResult};

/// Default base URL for the KirimEmail API.
pub const DEFAULT_BASE_URL: &str = "https://smtp-app.kirim.email";

/// Default connect timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default request timeout (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("KirimEmail-Rust-SDK/", env!("CARGO_PKG_VERSION"));

/// Configuration for the KirimEmail client.
#[derive(Clone)]
pub struct SmtpConfig {
    pub(crate) username: Option<String>,
    pub(crate) token: Option<SecretString>,
    pub(crate) domain_api_key: Option<SecretString>,
    pub(crate) domain_api_secret: Option<SecretString>,
    /// Base URL for API requests, without a trailing slash.
    pub base_url: String,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Request timeout for regular calls.
    pub timeout: Duration,
    /// Total timeout for streaming calls; unbounded when `None`.
    pub stream_timeout: Option<Duration>,
    /// User agent header value.
    pub user_agent: String,
    /// Custom headers to include in requests.
    pub custom_headers: Vec<(String, String)>,
}

impl SmtpConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> SmtpConfigBuilder {
        SmtpConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `KIRIMEMAIL_USERNAME` / `KIRIMEMAIL_TOKEN`: account credentials
    /// - `KIRIMEMAIL_DOMAIN_API_KEY` / `KIRIMEMAIL_DOMAIN_API_SECRET`: domain credentials
    /// - `KIRIMEMAIL_BASE_URL` (optional): custom base URL
    /// - `KIRIMEMAIL_TIMEOUT` (optional): request timeout in seconds
    ///
    /// Empty variables are treated as unset.
    pub fn from_env() -> SmtpResult<Self> {
        let mut builder = SmtpConfigBuilder::new();

        let username = env_var("KIRIMEMAIL_USERNAME");
        let token = env_var("KIRIMEMAIL_TOKEN");
        if let (Some(username), Some(token)) = (&username, &token) {
            builder = builder.credentials(username, token);
        } else if username.is_some() || token.is_some() {
            return Err(SmtpError::configuration(
                "KIRIMEMAIL_USERNAME and KIRIMEMAIL_TOKEN must be set together",
            ));
        }

        let key = env_var("KIRIMEMAIL_DOMAIN_API_KEY");
        let secret = env_var("KIRIMEMAIL_DOMAIN_API_SECRET");
        if let (Some(key), Some(secret)) = (&key, &secret) {
            builder = builder.domain_credentials(key, secret);
        } else if key.is_some() || secret.is_some() {
            return Err(SmtpError::configuration(
                "KIRIMEMAIL_DOMAIN_API_KEY and KIRIMEMAIL_DOMAIN_API_SECRET must be set together",
            ));
        }

        if let Some(base_url) = env_var("KIRIMEMAIL_BASE_URL") {
            builder = builder.base_url(base_url);
        }

        if let Some(timeout) = env_var("KIRIMEMAIL_TIMEOUT") {
            let secs = timeout.parse::<u64>().map_err(|_| {
                SmtpError::configuration(format!(
                    "KIRIMEMAIL_TIMEOUT is not a number of seconds: {timeout}"
                ))
            })?;
            builder = builder.timeout_secs(secs);
        }

        builder.build()
    }

    /// Returns the account username, if configured.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns true if account credentials are configured.
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.token.is_some()
    }

    /// Returns true if domain credentials are configured.
    pub fn has_domain_credentials(&self) -> bool {
        self.domain_api_key.is_some() && self.domain_api_secret.is_some()
    }

    /// Returns the domain API key hint (last 4 characters) for debugging.
    pub fn domain_api_key_hint(&self) -> Option<String> {
        self.domain_api_key
            .as_ref()
            .map(|key| secret_hint(key.expose_secret()))
    }

    /// Returns the full URL for an endpoint.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Returns a copy of this configuration pointing at another base URL.
    pub fn with_base_url(&self, base_url: &str) -> SmtpResult<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            ..self.clone()
        })
    }
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("username", &self.username)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("domain_api_key", &self.domain_api_key_hint())
            .field(
                "domain_api_secret",
                &self.domain_api_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("base_url", &self.base_url)
            .field("connect_timeout", &self.connect_timeout)
            .field("timeout", &self.timeout)
            .field("stream_timeout", &self.stream_timeout)
            .finish_non_exhaustive()
    }
}

/// Builder for `SmtpConfig`.
#[derive(Default)]
pub struct SmtpConfigBuilder {
    username: Option<String>,
    token: Option<String>,
    domain_api_key: Option<String>,
    domain_api_secret: Option<String>,
    base_url: Option<String>,
    connect_timeout: Option<Duration>,
    timeout: Option<Duration>,
    stream_timeout: Option<Duration>,
    user_agent: Option<String>,
    custom_headers: Vec<(String, String)>,
}

impl SmtpConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the account credentials used for basic authentication.
    pub fn credentials(mut self, username: impl Into<String>, token: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.token = Some(token.into());
        self
    }

    /// Sets the per-domain API key and secret used on v4 endpoints.
    pub fn domain_credentials(
        mut self,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        self.domain_api_key = Some(api_key.into());
        self.domain_api_secret = Some(api_secret.into());
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }

    /// Bounds streaming calls end to end.
    pub fn stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = Some(timeout);
        self
    }

    /// Overrides the user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Adds a custom header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Fails when only one half of a credential pair is set, when the base
    /// URL is not an absolute http(s) URL, when a timeout is zero, or when a
    /// custom header or the user agent is not a valid HTTP header.
    pub fn build(self) -> SmtpResult<SmtpConfig> {
        let (username, token) = pair(self.username, self.token, "username", "token")?;
        let (domain_api_key, domain_api_secret) = pair(
            self.domain_api_key,
            self.domain_api_secret,
            "domain API key",
            "domain API secret",
        )?;

        if username.is_none() && domain_api_key.is_none() {
            tracing::debug!("No credentials configured; requests will be sent unauthenticated");
        }

        let base_url = normalize_base_url(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let connect_timeout = self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        if timeout.is_zero() || connect_timeout.is_zero() {
            return Err(SmtpError::configuration("Timeouts must be greater than zero"));
        }

        let user_agent = self.user_agent.unwrap_or_else(|| USER_AGENT.to_string());
        validate_header("User-Agent", &user_agent)?;
        for (name, value) in &self.custom_headers {
            validate_header(name, value)?;
        }

        Ok(SmtpConfig {
            username,
            token: token.map(SecretString::new),
            domain_api_key: domain_api_key.map(SecretString::new),
            domain_api_secret: domain_api_secret.map(SecretString::new),
            base_url,
            connect_timeout,
            timeout,
            stream_timeout: self.stream_timeout,
            user_agent,
            custom_headers: self.custom_headers,
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn pair(
    first: Option<String>,
    second: Option<String>,
    first_name: &str,
    second_name: &str,
) -> SmtpResult<(Option<String>, Option<String>)> {
    let first = first.filter(|value| !value.is_empty());
    let second = second.filter(|value| !value.is_empty());
    match (&first, &second) {
        (Some(_), None) => Err(SmtpError::configuration(format!(
            "{second_name} is required when {first_name} is set"
        ))),
        (None, Some(_)) => Err(SmtpError::configuration(format!(
            "{first_name} is required when {second_name} is set"
        ))),
        _ => Ok((first, second)),
    }
}

fn validate_header(name: &str, value: &str) -> SmtpResult<()> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| SmtpError::configuration(format!("Invalid header name {name:?}: {e}")))?;
    HeaderValue::from_str(value)
        .map_err(|e| SmtpError::configuration(format!("Invalid value for header {name}: {e}")))?;
    Ok(())
}

fn normalize_base_url(base_url: &str) -> SmtpResult<String> {
    let trimmed = base_url.trim_end_matches('/');
    let parsed = Url::parse(trimmed)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SmtpError::configuration(format!(
            "Base URL must use http or https: {base_url}"
        )));
    }
    Ok(trimmed.to_string())
}

fn secret_hint(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 4 {
        format!("...{}", chars[chars.len() - 4..].iter().collect::<String>())
    } else {
        "****".to_string()
    }
}
