//! Server-Sent-Events streaming against a mock server.

mod common;

use common::*;
use futures::StreamExt;
use std::collections::HashMap;
use kirimemail_smtp::{ErrorKind, LogEvent, LogQuery};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn sse(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body)
}

#[tokio::test]
async fn test_log_stream_yields_entries_until_done() {
    let server = setup_mock_server().await;

    let body = concat!(
        ": keep-alive\n\n",
        "data: {\"data\": {\"id\": 1, \"event_type\": \"queued\", \"message_guid\": \"m-1\"}}\n\n",
        "event: ping\n",
        "data: {\"status\": \"connected\"}\n\n",
        "data: {\"data\": {\"id\": 2, \"event_type\": \"delivered\", \"message_guid\": \"m-1\"}}\r\n\r\n",
        "data: [DONE]\n\n",
        "data: {\"data\": {\"id\": 3, \"event_type\": \"opened\"}}\n\n",
    );

    Mock::given(method("GET"))
        .and(path("/api/domains/example.com/log/stream"))
        .and(query_param("limit", "50000"))
        .and(query_param("sender", "s@example.com"))
        .and(header("Authorization", basic(USERNAME, TOKEN).as_str()))
        .respond_with(sse(body))
        .expect(1)
        .mount(&server)
        .await;

    let client = account_client(&server);
    let stream = client
        .logs()
        .stream("example.com", LogQuery::new().sender("s@example.com"))
        .await
        .unwrap();
    let entries: Vec<_> = stream.map(Result::unwrap).collect().await;

    let events: Vec<_> = entries.iter().map(|entry| entry.event()).collect();
    assert_eq!(events, vec![Some(LogEvent::Queued), Some(LogEvent::Delivered)]);
}

#[tokio::test]
async fn test_raw_event_stream() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/api/events"))
        .respond_with(sse("data: {\"n\": 1}\n\ndata: {\"n\": 2}\n\n"))
        .mount(&server)
        .await;

    let events: Vec<_> = account_client(&server)
        .stream("/api/events", Vec::new(), HashMap::new())
        .await
        .unwrap()
        .map(Result::unwrap)
        .collect()
        .await;

    assert_eq!(events, vec![json!({"n": 1}), json!({"n": 2})]);
}

#[tokio::test]
async fn test_stream_error_status_is_classified() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/api/domains/example.com/log/stream"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "Forbidden"})))
        .mount(&server)
        .await;

    let error = account_client(&server)
        .logs()
        .stream("example.com", LogQuery::new())
        .await
        .err()
        .unwrap();

    assert_eq!(error.kind(), ErrorKind::Authentication);
    assert_eq!(error.message(), "Forbidden");
}

#[tokio::test]
async fn test_stream_validation_precedes_connection() {
    let server = setup_mock_server().await;

    let error = account_client(&server)
        .logs()
        .stream("example.com", LogQuery::new().limit(20_000))
        .await
        .err()
        .unwrap();

    assert_eq!(error.message(), "Limit must be between 1 and 10000.");
    assert!(server.received_requests().await.unwrap().is_empty());
}
