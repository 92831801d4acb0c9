//! Streaming response handling and SSE decoding.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::task::{Context, Poll};

use super::TransportError;
use crate::errors::SmtpError;

/// Data value that ends an event stream.
pub const DONE_SENTINEL: &str = "[DONE]";

const DATA_PREFIX: &str = "data: ";

/// Boxed body byte stream.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Streaming HTTP response.
pub struct StreamingResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Byte stream.
    pub stream: ByteStream,
}

impl StreamingResponse {
    /// Drains the remaining body into memory.
    pub async fn collect_body(mut self) -> Result<Vec<u8>, TransportError> {
        let mut body = Vec::new();
        while let Some(chunk) = self.stream.next().await {
            body.extend_from_slice(&chunk?);
        }
        Ok(body)
    }
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Outcome of decoding a single SSE line.
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// Blank, non-data or undecodable line.
    Skip,
    /// A decoded JSON event.
    Event(Value),
    /// The termination sentinel.
    Done,
}

impl SseLine {
    /// Decodes one line, with or without its line terminator.
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(data) = line.strip_prefix(DATA_PREFIX) else {
            return SseLine::Skip;
        };

        if data.trim_end() == DONE_SENTINEL {
            return SseLine::Done;
        }

        match serde_json::from_str(data) {
            Ok(value) => SseLine::Event(value),
            Err(e) => {
                tracing::debug!(error = %e, data = %data, "Dropping undecodable SSE event");
                SseLine::Skip
            }
        }
    }
}

/// Incremental decoder turning SSE body chunks into JSON events.
///
/// Lines may be split across chunks at any byte, including inside a UTF-8
/// sequence. Once the sentinel is seen the decoder ignores all further input.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    /// Creates a new decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once the termination sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feeds a chunk and returns the events completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Value> {
        let mut events = Vec::new();
        if self.done {
            return events;
        }

        self.buffer.extend_from_slice(chunk);

        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if self.accept(&line, &mut events) {
                break;
            }
        }

        events
    }

    /// Decodes a trailing line left without a terminator at end of body.
    pub fn finish(&mut self) -> Option<Value> {
        if self.done || self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        let mut events = Vec::new();
        self.accept(&line, &mut events);
        events.pop()
    }

    /// Returns true when decoding must stop.
    fn accept(&mut self, line: &[u8], events: &mut Vec<Value>) -> bool {
        match SseLine::parse(&String::from_utf8_lossy(line)) {
            SseLine::Event(value) => {
                events.push(value);
                false
            }
            SseLine::Skip => false,
            SseLine::Done => {
                self.done = true;
                self.buffer.clear();
                true
            }
        }
    }
}

/// Stream of JSON events decoded from a Server-Sent-Events body.
///
/// The stream owns the response body. The connection is released as soon as
/// the sentinel arrives, the body ends, a read fails, or the stream is
/// dropped.
pub struct EventStream {
    inner: Option<ByteStream>,
    decoder: SseDecoder,
    pending: VecDeque<Value>,
}

impl EventStream {
    /// Creates an event stream over a response body.
    pub fn new(response: StreamingResponse) -> Self {
        Self::from_bytes(response.stream)
    }

    /// Creates an event stream over a raw byte stream.
    pub fn from_bytes(stream: ByteStream) -> Self {
        Self {
            inner: Some(stream),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
        }
    }

    /// Returns true once the underlying body has been released.
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl Stream for EventStream {
    type Item = Result<Value, SmtpError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }

            let Some(inner) = this.inner.as_mut() else {
                return Poll::Ready(None);
            };

            match inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.pending.extend(this.decoder.feed(&bytes));
                    if this.decoder.is_done() {
                        this.inner = None;
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    this.inner = None;
                    return Poll::Ready(Some(Err(SmtpError::from(e))));
                }
                Poll::Ready(None) => {
                    this.pending.extend(this.decoder.finish());
                    this.inner = None;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("closed", &self.is_closed())
            .field("pending", &self.pending.len())
            .finish()
    }
}
