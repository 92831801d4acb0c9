//! Mock implementations for testing.
//!
//! [`MockTransport`] replays queued replies and records every request it
//! receives, so services can be tested without a server.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MultipartPart, MultipartRequest,
    StreamingResponse, TransportError,
};

/// A recorded request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request path.
    pub path: String,
    /// Query parameters.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Option<Vec<u8>>,
    /// Multipart parts, empty for non-multipart requests.
    pub parts: Vec<MultipartPart>,
}

impl RecordedRequest {
    /// Decodes the body as JSON.
    pub fn body_json(&self) -> Option<serde_json::Value> {
        self.body
            .as_deref()
            .and_then(|body| serde_json::from_slice(body).ok())
    }

    /// Returns the value of the first query parameter named `name`.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the text value of the first multipart part named `name`.
    pub fn part_text(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            MultipartPart::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }
}

/// A mock response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl MockResponse {
    /// Creates a successful JSON response.
    pub fn json<T: serde::Serialize>(value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_default();
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());

        Self {
            status: 200,
            headers,
            body,
        }
    }

    /// Creates an error response in the API's `{"message": ...}` shape.
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(&serde_json::json!({ "message": message })).with_status(status)
    }

    /// Creates a response without a body.
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Creates a response with a raw body.
    pub fn raw(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Creates a response with custom status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }
}

enum MockReply {
    Response(MockResponse),
    Stream(Vec<Bytes>),
    Failure(TransportError),
}

/// Mock HTTP transport for testing.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
    default_response: Mutex<Option<MockResponse>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn queue(&self, response: MockResponse) {
        lock(&self.replies).push_back(MockReply::Response(response));
    }

    /// Queues a JSON response.
    pub fn queue_json<T: serde::Serialize>(&self, value: &T) {
        self.queue(MockResponse::json(value));
    }

    /// Queues an error response.
    pub fn queue_error(&self, status: u16, message: &str) {
        self.queue(MockResponse::error(status, message));
    }

    /// Queues a 200 event-stream body delivered in the given chunks.
    pub fn queue_stream<I, C>(&self, chunks: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<Bytes>,
    {
        let chunks = chunks.into_iter().map(Into::into).collect();
        lock(&self.replies).push_back(MockReply::Stream(chunks));
    }

    /// Queues a transport failure.
    pub fn queue_failure(&self, error: TransportError) {
        lock(&self.replies).push_back(MockReply::Failure(error));
    }

    /// Sets the response used once the queue is empty.
    pub fn set_default(&self, response: MockResponse) {
        *lock(&self.default_response) = Some(response);
    }

    /// Gets all recorded requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Gets the last recorded request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Returns the number of requests made.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    fn next_reply(&self) -> MockReply {
        if let Some(reply) = lock(&self.replies).pop_front() {
            return reply;
        }
        MockReply::Response(
            lock(&self.default_response)
                .clone()
                .unwrap_or_else(|| MockResponse::error(500, "No mock response configured")),
        )
    }

    fn record(&self, request: RecordedRequest) {
        lock(&self.requests).push(request);
    }

    fn record_http(&self, request: &HttpRequest) {
        self.record(RecordedRequest {
            method: request.method,
            path: request.path.clone(),
            query: request.query.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
            parts: Vec::new(),
        });
    }
}

fn into_response(reply: MockReply) -> Result<HttpResponse, TransportError> {
    match reply {
        MockReply::Response(response) => Ok(HttpResponse {
            status: response.status,
            headers: response.headers,
            body: response.body,
        }),
        MockReply::Stream(chunks) => Ok(HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: chunks.concat(),
        }),
        MockReply::Failure(error) => Err(error),
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.record_http(&request);
        into_response(self.next_reply())
    }

    async fn send_streaming(
        &self,
        request: HttpRequest,
    ) -> Result<StreamingResponse, TransportError> {
        self.record_http(&request);

        let (status, headers, chunks) = match self.next_reply() {
            MockReply::Response(response) => (
                response.status,
                response.headers,
                vec![Bytes::from(response.body)],
            ),
            MockReply::Stream(chunks) => {
                let mut headers = HashMap::new();
                headers.insert("content-type".to_string(), "text/event-stream".to_string());
                (200, headers, chunks)
            }
            MockReply::Failure(error) => return Err(error),
        };

        Ok(StreamingResponse {
            status,
            headers,
            stream: Box::pin(futures::stream::iter(
                chunks.into_iter().map(Ok::<Bytes, TransportError>),
            )),
        })
    }

    async fn send_multipart(
        &self,
        request: MultipartRequest,
    ) -> Result<HttpResponse, TransportError> {
        self.record(RecordedRequest {
            method: HttpMethod::Post,
            path: request.path,
            query: Vec::new(),
            headers: request.headers,
            body: None,
            parts: request.parts,
        });
        into_response(self.next_reply())
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("request_count", &self.request_count())
            .finish_non_exhaustive()
    }
}
