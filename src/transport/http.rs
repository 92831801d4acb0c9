//! HTTP transport implementation.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use std::collections::HashMap;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::instrument;

use super::{MultipartPart, MultipartRequest, StreamingResponse, TransportError};
use crate::observability::{log_request, log_response};

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request.
    Post,
    /// PUT request.
    Put,
    /// DELETE request.
    Delete,
}

impl HttpMethod {
    /// Returns the method name as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP request representation.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request path, relative to the base URL.
    pub path: String,
    /// Query parameters in the order they are sent.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Option<Vec<u8>>,
    /// Request timeout override.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Creates a request with the given method.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    /// Creates a new GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a new POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Creates a new PUT request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// Creates a new DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes `value` as the JSON request body.
    pub fn with_json<T: serde::Serialize + ?Sized>(
        mut self,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_vec(value)?);
        Ok(self)
    }

    /// Appends query parameters.
    pub fn with_query<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP response representation.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns the body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP transport trait.
///
/// Implementations must not fail on non-2xx statuses: every response that
/// arrives is returned as-is and classified by the caller.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send an HTTP request.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Send an HTTP request and hand back the body as a byte stream.
    async fn send_streaming(
        &self,
        request: HttpRequest,
    ) -> Result<StreamingResponse, TransportError>;

    /// Send a multipart form request.
    async fn send_multipart(
        &self,
        request: MultipartRequest,
    ) -> Result<HttpResponse, TransportError>;
}

/// HTTP transport implementation using reqwest.
pub struct HttpTransportImpl {
    client: Client,
    stream_client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransportImpl {
    /// Creates a new HTTP transport.
    ///
    /// `timeout` bounds every regular exchange end to end. Streaming requests
    /// use `stream_timeout` instead, which is unbounded when `None` so a live
    /// event stream is not cut off mid-way.
    pub fn new(
        base_url: impl Into<String>,
        connect_timeout: Duration,
        timeout: Duration,
        stream_timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let client = Self::client_builder(connect_timeout)
            .timeout(timeout)
            .build()
            .map_err(TransportError::connection)?;

        let mut stream_builder = Self::client_builder(connect_timeout);
        if let Some(stream_timeout) = stream_timeout {
            stream_builder = stream_builder.timeout(stream_timeout);
        }
        let stream_client = stream_builder
            .build()
            .map_err(TransportError::connection)?;

        Ok(Self {
            client,
            stream_client,
            base_url: base_url.into(),
            timeout,
        })
    }

    fn client_builder(connect_timeout: Duration) -> ClientBuilder {
        ClientBuilder::new()
            .connect_timeout(connect_timeout)
            .tcp_keepalive(Duration::from_secs(60))
    }

    /// Builds the full URL for a path.
    fn build_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn prepare(&self, client: &Client, request: &HttpRequest) -> RequestBuilder {
        let url = self.build_url(&request.path);

        let mut req_builder = match request.method {
            HttpMethod::Get => client.get(&url),
            HttpMethod::Post => client.post(&url),
            HttpMethod::Put => client.put(&url),
            HttpMethod::Delete => client.delete(&url),
        };

        if !request.query.is_empty() {
            req_builder = req_builder.query(&request.query);
        }

        for (name, value) in &request.headers {
            req_builder = req_builder.header(name, value);
        }

        if let Some(body) = &request.body {
            req_builder = req_builder.body(body.clone());
        }

        if let Some(timeout) = request.timeout {
            req_builder = req_builder.timeout(timeout);
        }

        req_builder
    }

    fn map_send_error(&self, error: reqwest::Error, timeout: Option<Duration>) -> TransportError {
        if error.is_builder() {
            TransportError::request(error)
        } else if error.is_timeout() {
            TransportError::timeout(timeout.unwrap_or(self.timeout), error)
        } else if error.is_connect() {
            TransportError::connection(error)
        } else {
            TransportError::invalid_response(error)
        }
    }

    async fn read_response(
        &self,
        response: reqwest::Response,
        started: Instant,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, TransportError> {
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(e, timeout))?
            .to_vec();

        log_response(status, started.elapsed(), body.len());

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn collect_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
        .collect()
}

#[async_trait]
impl HttpTransport for HttpTransportImpl {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        log_request(request.method.as_str(), &request.path, request.body.as_deref());
        let started = Instant::now();

        let response = self
            .prepare(&self.client, &request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e, request.timeout))?;

        self.read_response(response, started, request.timeout).await
    }

    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send_streaming(
        &self,
        request: HttpRequest,
    ) -> Result<StreamingResponse, TransportError> {
        log_request(request.method.as_str(), &request.path, None);

        let response = self
            .prepare(&self.stream_client, &request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e, request.timeout))?;

        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());

        let stream = response.bytes_stream();
        let stream: Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>> =
            Box::pin(futures::StreamExt::map(stream, |result| {
                result.map_err(TransportError::invalid_response)
            }));

        Ok(StreamingResponse {
            status,
            headers,
            stream,
        })
    }

    #[instrument(skip(self, request), fields(path = %request.path, parts = request.parts.len()))]
    async fn send_multipart(
        &self,
        request: MultipartRequest,
    ) -> Result<HttpResponse, TransportError> {
        log_request("POST", &request.path, None);
        let started = Instant::now();
        let url = self.build_url(&request.path);

        let mut form = reqwest::multipart::Form::new();

        for part in request.parts {
            form = match part {
                MultipartPart::Text { name, value } => form.text(name, value),
                MultipartPart::File {
                    name,
                    filename,
                    content_type,
                    data,
                } => {
                    let part = reqwest::multipart::Part::bytes(data)
                        .file_name(filename)
                        .mime_str(&content_type)
                        .map_err(TransportError::request)?;
                    form.part(name, part)
                }
            };
        }

        let mut req_builder = self.client.post(&url).multipart(form);

        for (name, value) in &request.headers {
            req_builder = req_builder.header(name, value);
        }

        if let Some(timeout) = request.timeout {
            req_builder = req_builder.timeout(timeout);
        }

        let response = req_builder
            .send()
            .await
            .map_err(|e| self.map_send_error(e, request.timeout))?;

        self.read_response(response, started, request.timeout).await
    }
}

impl std::fmt::Debug for HttpTransportImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransportImpl")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
