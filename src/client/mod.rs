//! KirimEmail API client.
//!
//! [`SmtpClient`] turns a logical API call into one HTTP exchange: it adds
//! the default headers and credentials, hands the request to the transport
//! and turns the response into either a JSON object or a classified
//! [`SmtpError`].

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::auth::{AuthProvider, BasicAuth};
use crate::config::{SmtpConfig, SmtpConfigBuilder};
use crate::errors::{classify, SmtpError, SmtpResult};
use crate::services::{
    CredentialsService, DomainsService, LogsService, MessagesService, SuppressionsService,
};
use crate::transport::{
    EventStream, HttpRequest, HttpResponse, HttpTransport, HttpTransportImpl, MultipartForm,
    MultipartRequest,
};

/// Decoded JSON object returned by every non-streaming call.
pub type ResponseEnvelope = Map<String, Value>;

/// Query parameters in the order they are sent.
pub type Query = Vec<(String, String)>;

const JSON_CONTENT_TYPE: &str = "application/json";

/// The KirimEmail API client.
///
/// The client is immutable and cheap to clone; it can be shared across
/// tasks. Resource operations are reached through borrowed views such as
/// [`SmtpClient::domains`].
///
/// # Example
///
/// ```rust,no_run
/// use kirimemail_smtp::SmtpClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = SmtpClient::builder()
///         .credentials("username", "token")
///         .build()?;
///
///     let domains = client.domains().list(Default::default()).await?;
///     for domain in domains.data {
///         println!("{:?}", domain.domain);
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct SmtpClient {
    config: SmtpConfig,
    transport: Arc<dyn HttpTransport>,
    auth: Arc<dyn AuthProvider>,
}

impl SmtpClient {
    /// Creates a new client builder.
    pub fn builder() -> SmtpClientBuilder {
        SmtpClientBuilder::new()
    }

    /// Creates a client from a configuration.
    pub fn new(config: SmtpConfig) -> SmtpResult<Self> {
        SmtpClientBuilder::from_config(config).build()
    }

    /// Creates a client from `KIRIMEMAIL_*` environment variables.
    pub fn from_env() -> SmtpResult<Self> {
        Self::new(SmtpConfig::from_env()?)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SmtpConfig {
        &self.config
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Returns a new client pointing at another base URL.
    ///
    /// The new client gets a fresh HTTP transport; `self` is left untouched
    /// so in-flight calls are unaffected.
    pub fn with_base_url(&self, base_url: &str) -> SmtpResult<Self> {
        let config = self.config.with_base_url(base_url)?;
        Ok(Self {
            transport: Arc::new(default_transport(&config)?),
            auth: Arc::clone(&self.auth),
            config,
        })
    }

    /// Returns the domains service.
    pub fn domains(&self) -> DomainsService<'_> {
        DomainsService::new(self)
    }

    /// Returns the credentials service.
    pub fn credentials(&self) -> CredentialsService<'_> {
        CredentialsService::new(self)
    }

    /// Returns the messages service.
    pub fn messages(&self) -> MessagesService<'_> {
        MessagesService::new(self)
    }

    /// Returns the logs service.
    pub fn logs(&self) -> LogsService<'_> {
        LogsService::new(self)
    }

    /// Returns the suppressions service.
    pub fn suppressions(&self) -> SuppressionsService<'_> {
        SuppressionsService::new(self)
    }

    /// Issues a GET request.
    pub async fn get(&self, path: &str, query: Query) -> SmtpResult<ResponseEnvelope> {
        self.request(HttpRequest::get(path).with_query(query)).await
    }

    /// Issues a POST request with a JSON body.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> SmtpResult<ResponseEnvelope> {
        self.request(HttpRequest::post(path).with_json(body)?).await
    }

    /// Issues a PUT request with a JSON body.
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> SmtpResult<ResponseEnvelope> {
        self.request(HttpRequest::put(path).with_json(body)?).await
    }

    /// Issues a DELETE request.
    pub async fn delete(&self, path: &str, query: Query) -> SmtpResult<ResponseEnvelope> {
        self.request(HttpRequest::delete(path).with_query(query)).await
    }

    /// Issues a request and parses the response.
    ///
    /// Headers already present on `request` are kept, except that a
    /// configured credential always replaces `Authorization`.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn request(&self, mut request: HttpRequest) -> SmtpResult<ResponseEnvelope> {
        request.headers = self.headers_for(&request.path, request.headers, false);

        let response = self.transport.send(request).await?;

        parse_http_response(&response)
    }

    /// Posts a multipart form.
    ///
    /// `headers` override the defaults the same way as in
    /// [`SmtpClient::request`].
    ///
    /// # Errors
    ///
    /// Returns [`SmtpError::File`] before sending if an attachment cannot be
    /// read.
    #[instrument(skip(self, form, headers))]
    pub async fn post_multipart(
        &self,
        path: &str,
        form: MultipartForm,
        headers: HashMap<String, String>,
    ) -> SmtpResult<ResponseEnvelope> {
        let parts = form.into_parts().await?;
        let request = MultipartRequest {
            path: path.to_string(),
            headers: self.headers_for(path, headers, true),
            parts,
            timeout: None,
        };

        let response = self.transport.send_multipart(request).await?;

        parse_http_response(&response)
    }

    /// Opens a Server-Sent-Events stream and decodes its JSON events.
    ///
    /// An error status is read in full and classified like any other call.
    /// Dropping the returned stream releases the connection. `headers`
    /// override the defaults the same way as in [`SmtpClient::request`].
    #[instrument(skip(self, query, headers))]
    pub async fn stream(
        &self,
        path: &str,
        query: Query,
        headers: HashMap<String, String>,
    ) -> SmtpResult<EventStream> {
        let mut request = HttpRequest::get(path).with_query(query);
        request.headers = self.headers_for(path, headers, false);
        if let Some(timeout) = self.config.stream_timeout {
            request = request.with_timeout(timeout);
        }

        let response = self.transport.send_streaming(request).await?;

        if response.status >= 400 {
            let status = response.status;
            let body = response.collect_body().await?;
            return Err(match parse_response(status, &body) {
                Err(error) => error,
                Ok(_) => classify(status, None),
            });
        }

        Ok(EventStream::new(response))
    }

    fn headers_for(
        &self,
        path: &str,
        overrides: HashMap<String, String>,
        multipart: bool,
    ) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("Accept".to_string(), JSON_CONTENT_TYPE.to_string());
        if !multipart {
            headers.insert("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string());
        }
        headers.insert("User-Agent".to_string(), self.config.user_agent.clone());

        for (name, value) in self.config.custom_headers.iter().cloned().chain(overrides) {
            headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
            headers.insert(name, value);
        }

        self.auth.apply_auth(path, multipart, &mut headers);
        headers
    }
}

impl std::fmt::Debug for SmtpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Parses a raw response into an envelope or a classified error.
///
/// An empty body becomes `{"success": status < 400}`. A body that is not
/// valid JSON is an [`SmtpError::Api`] whatever the status.
pub fn parse_response(status: u16, body: &[u8]) -> SmtpResult<ResponseEnvelope> {
    if body.iter().all(u8::is_ascii_whitespace) {
        let mut envelope = Map::new();
        envelope.insert("success".to_string(), Value::Bool(status < 400));
        return Ok(envelope);
    }

    let value: Value = serde_json::from_slice(body).map_err(|e| SmtpError::Api {
        message: format!("Invalid JSON response: {e}"),
        status_code: Some(status),
        source: Some(Box::new(e)),
    })?;

    if status >= 400 {
        return Err(classify(status, value.as_object()));
    }

    match value {
        Value::Object(envelope) => Ok(envelope),
        _ => Err(SmtpError::api(
            "Invalid JSON response: expected a JSON object",
            Some(status),
        )),
    }
}

fn parse_http_response(response: &HttpResponse) -> SmtpResult<ResponseEnvelope> {
    parse_response(response.status, &response.body)
}

fn default_transport(config: &SmtpConfig) -> SmtpResult<HttpTransportImpl> {
    HttpTransportImpl::new(
        &config.base_url,
        config.connect_timeout,
        config.timeout,
        config.stream_timeout,
    )
    .map_err(|e| SmtpError::configuration(format!("Failed to create HTTP client: {e}")))
}

/// Builder for the KirimEmail client.
#[derive(Default)]
pub struct SmtpClientBuilder {
    config_builder: SmtpConfigBuilder,
    config: Option<SmtpConfig>,
    transport: Option<Arc<dyn HttpTransport>>,
    auth: Option<Arc<dyn AuthProvider>>,
}

impl SmtpClientBuilder {
    /// Creates a new client builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder from an existing configuration.
    pub fn from_config(config: SmtpConfig) -> Self {
        Self {
            config: Some(config),
            ..Self::default()
        }
    }

    /// Sets the account credentials.
    pub fn credentials(mut self, username: impl Into<String>, token: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.credentials(username, token);
        self
    }

    /// Sets the per-domain API key and secret.
    pub fn domain_credentials(
        mut self,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        self.config_builder = self.config_builder.domain_credentials(api_key, api_secret);
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.base_url(base_url);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.connect_timeout(timeout);
        self
    }

    /// Bounds streaming calls end to end.
    pub fn stream_timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.stream_timeout(timeout);
        self
    }

    /// Adds a custom default header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.header(name, value);
        self
    }

    /// Sets a custom transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets a custom auth provider.
    pub fn auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Builds the client.
    ///
    /// A configuration passed to [`SmtpClientBuilder::from_config`] takes
    /// precedence over individual settings.
    pub fn build(self) -> SmtpResult<SmtpClient> {
        let config = match self.config {
            Some(config) => config,
            None => self.config_builder.build()?,
        };

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(default_transport(&config)?),
        };

        let auth: Arc<dyn AuthProvider> = match self.auth {
            Some(auth) => auth,
            None => Arc::new(BasicAuth::from_config(&config)),
        };

        Ok(SmtpClient {
            config,
            transport,
            auth,
        })
    }
}
