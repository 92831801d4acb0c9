//! Delivery log queries and the live log stream.

use std::collections::HashMap;
use std::pin::Pin;

use chrono::{DateTime, FixedOffset};
use futures::{Stream, StreamExt};
use serde_json::Value;
use tracing::{debug, instrument};

use super::{decode_list, decode_pagination, domain_path, segment};
use crate::client::SmtpClient;
use crate::errors::{SmtpError, SmtpResult};
use crate::types::{LogEntry, LogList, LogQuery};
use crate::validation::{is_valid_datetime, is_valid_email, require_field, require_range, DATE_FORMAT};

/// Limit applied to streams when the query sets none.
pub const DEFAULT_STREAM_LIMIT: i64 = 50_000;

const DEFAULT_LIST_LIMIT: u64 = 1000;

/// Stream of log entries.
pub type LogStream = Pin<Box<dyn Stream<Item = SmtpResult<LogEntry>> + Send>>;

/// Service for log operations.
pub struct LogsService<'a> {
    client: &'a SmtpClient,
}

impl<'a> LogsService<'a> {
    /// Creates a new logs service.
    pub fn new(client: &'a SmtpClient) -> Self {
        Self { client }
    }

    /// Lists the log entries of a domain.
    ///
    /// # Errors
    ///
    /// Returns [`SmtpError::InvalidRequest`] without sending if the query
    /// has a malformed date or address, or a limit or offset out of range.
    #[instrument(skip(self))]
    pub async fn list(&self, domain: &str, query: &LogQuery) -> SmtpResult<LogList> {
        validate_query(query)?;
        let path = domain_path(domain, "/log")?;
        let response = self.client.get(&path, query.to_query()).await?;

        let data: Vec<LogEntry> = decode_list(response.get("data"))?;
        let count = response
            .get("count")
            .and_then(Value::as_u64)
            .unwrap_or(data.len() as u64);

        Ok(LogList {
            count,
            offset: response.get("offset").and_then(Value::as_u64).unwrap_or(0),
            limit: response
                .get("limit")
                .and_then(Value::as_u64)
                .unwrap_or(DEFAULT_LIST_LIMIT),
            pagination: decode_pagination(response.get("pagination"))?,
            data,
        })
    }

    /// Lists the log entries of one message.
    #[instrument(skip(self))]
    pub async fn message_logs(&self, domain: &str, message_guid: &str) -> SmtpResult<Vec<LogEntry>> {
        require_field("message_guid", message_guid)?;
        let path = domain_path(domain, &format!("/log/{}", segment(message_guid)))?;
        let response = self.client.get(&path, Vec::new()).await?;
        decode_list(response.get("data"))
    }

    /// Opens the live log stream of a domain.
    ///
    /// The query is validated before connecting; a missing limit becomes
    /// [`DEFAULT_STREAM_LIMIT`]. Events without a `data` member are skipped.
    /// The stream ends after the first error.
    #[instrument(skip(self))]
    pub async fn stream(&self, domain: &str, mut query: LogQuery) -> SmtpResult<LogStream> {
        validate_query(&query)?;
        query.limit.get_or_insert(DEFAULT_STREAM_LIMIT);

        let path = domain_path(domain, "/log/stream")?;
        let mut events = self.client.stream(&path, query.to_query(), HashMap::new()).await?;
        debug!(path = %path, "Log stream opened");

        Ok(Box::pin(async_stream::stream! {
            while let Some(event) = events.next().await {
                match event {
                    Ok(event) => match event.get("data") {
                        Some(data) if !data.is_null() => {
                            yield serde_json::from_value::<LogEntry>(data.clone())
                                .map_err(SmtpError::from);
                        }
                        _ => {}
                    },
                    Err(error) => {
                        yield Err(error);
                        break;
                    }
                }
            }
        }))
    }

    /// Lists the log entries between two instants.
    pub async fn by_date_range(
        &self,
        domain: &str,
        start: impl Into<DateTime<FixedOffset>>,
        end: impl Into<DateTime<FixedOffset>>,
        mut query: LogQuery,
    ) -> SmtpResult<LogList> {
        query.start = Some(start.into().format(DATE_FORMAT).to_string());
        query.end = Some(end.into().format(DATE_FORMAT).to_string());
        self.list(domain, &query).await
    }

    /// Lists the log entries of one sender.
    pub async fn by_sender(&self, domain: &str, sender: &str, query: LogQuery) -> SmtpResult<LogList> {
        self.list(domain, &query.sender(sender)).await
    }

    /// Lists the log entries of one recipient.
    pub async fn by_recipient(
        &self,
        domain: &str,
        recipient: &str,
        query: LogQuery,
    ) -> SmtpResult<LogList> {
        self.list(domain, &query.recipient(recipient)).await
    }
}

fn validate_query(query: &LogQuery) -> SmtpResult<()> {
    if query.start.as_deref().is_some_and(|start| !is_valid_datetime(start)) {
        return Err(SmtpError::invalid_request(
            "Invalid start date format. Use ISO8601 format.",
        ));
    }
    if query.end.as_deref().is_some_and(|end| !is_valid_datetime(end)) {
        return Err(SmtpError::invalid_request(
            "Invalid end date format. Use ISO8601 format.",
        ));
    }
    if query.sender.as_deref().is_some_and(|sender| !is_valid_email(sender)) {
        return Err(SmtpError::invalid_request("Invalid sender email address."));
    }
    if query
        .recipient
        .as_deref()
        .is_some_and(|recipient| !is_valid_email(recipient))
    {
        return Err(SmtpError::invalid_request("Invalid recipient email address."));
    }
    if let Some(limit) = query.limit {
        require_range(limit, 1, 10_000, "Limit must be between 1 and 10000.")?;
    }
    if let Some(offset) = query.offset {
        require_range(offset, 0, i64::MAX, "Offset must be greater than or equal to 0.")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::mocks::MockTransport;
    use crate::transport::HttpTransport;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;
    use test_case::test_case;

    fn setup() -> (Arc<MockTransport>, SmtpClient) {
        let transport = Arc::new(MockTransport::new());
        let client = SmtpClient::builder()
            .credentials("acme", "tok")
            .transport(Arc::clone(&transport) as Arc<dyn HttpTransport>)
            .build()
            .unwrap();
        (transport, client)
    }

    #[tokio::test]
    async fn test_list_defaults() {
        let (transport, client) = setup();
        transport.queue_json(&json!({
            "data": [
                {"id": 1, "event_type": "delivered", "timestamp": 1_700_000_000},
                {"id": 2, "event_type": "opened"}
            ]
        }));

        let logs = client.logs().list("example.com", &LogQuery::new()).await.unwrap();

        assert_eq!(logs.data.len(), 2);
        assert_eq!(logs.count, 2);
        assert_eq!(logs.offset, 0);
        assert_eq!(logs.limit, 1000);
        assert!(logs.data[0].is_delivered());
        assert_eq!(transport.last_request().unwrap().path, "/api/domains/example.com/log");
    }

    #[tokio::test]
    async fn test_list_uses_reported_counts() {
        let (transport, client) = setup();
        transport.queue_json(&json!({"data": [], "count": 120, "offset": 100, "limit": 20}));

        let logs = client
            .logs()
            .list("example.com", &LogQuery::new().limit(20).offset(100))
            .await
            .unwrap();

        assert_eq!((logs.count, logs.offset, logs.limit), (120, 100, 20));
        let request = transport.last_request().unwrap();
        assert_eq!(request.query_param("limit"), Some("20"));
        assert_eq!(request.query_param("offset"), Some("100"));
    }

    #[test_case(LogQuery { start: Some("2024-01-01".into()), ..Default::default() }, "Invalid start date format. Use ISO8601 format."; "start")]
    #[test_case(LogQuery { end: Some("tomorrow".into()), ..Default::default() }, "Invalid end date format. Use ISO8601 format."; "end")]
    #[test_case(LogQuery::new().sender("nope"), "Invalid sender email address."; "sender")]
    #[test_case(LogQuery::new().recipient("nope"), "Invalid recipient email address."; "recipient")]
    #[test_case(LogQuery::new().limit(0), "Limit must be between 1 and 10000."; "limit low")]
    #[test_case(LogQuery::new().limit(10_001), "Limit must be between 1 and 10000."; "limit high")]
    #[test_case(LogQuery::new().offset(-1), "Offset must be greater than or equal to 0."; "offset")]
    fn test_query_validation(query: LogQuery, expected: &str) {
        let error = validate_query(&query).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidRequest);
        assert_eq!(error.message(), expected);
    }

    #[tokio::test]
    async fn test_invalid_query_sends_nothing() {
        let (transport, client) = setup();

        let result = client.logs().list("example.com", &LogQuery::new().limit(0)).await;

        assert!(result.is_err());
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_message_logs() {
        let (transport, client) = setup();
        transport.queue_json(&json!({"data": [{"message_guid": "m-1", "event_type": "queued"}]}));

        let entries = client.logs().message_logs("example.com", "m-1").await.unwrap();

        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_queued());
        assert_eq!(transport.last_request().unwrap().path, "/api/domains/example.com/log/m-1");
    }

    #[tokio::test]
    async fn test_message_guid_is_encoded() {
        let (transport, client) = setup();
        transport.queue_json(&json!({"data": []}));

        client.logs().message_logs("example.com", "m/1?x").await.unwrap();

        assert_eq!(
            transport.last_request().unwrap().path,
            "/api/domains/example.com/log/m%2F1%3Fx"
        );
    }

    #[tokio::test]
    async fn test_by_date_range_formats_dates() {
        let (transport, client) = setup();
        transport.queue_json(&json!({"data": []}));

        let start = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 31, 23, 59, 59)
            .unwrap();
        client
            .logs()
            .by_date_range("example.com", start, end, LogQuery::new())
            .await
            .unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.query_param("start"), Some("2024-01-01T00:00:00+00:00"));
        assert_eq!(request.query_param("end"), Some("2024-01-31T23:59:59+07:00"));
    }

    #[tokio::test]
    async fn test_by_sender_and_recipient() {
        let (transport, client) = setup();
        transport.queue_json(&json!({"data": []}));
        transport.queue_json(&json!({"data": []}));

        client
            .logs()
            .by_sender("example.com", "s@example.com", LogQuery::new())
            .await
            .unwrap();
        client
            .logs()
            .by_recipient("example.com", "r@example.com", LogQuery::new())
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].query_param("sender"), Some("s@example.com"));
        assert_eq!(requests[1].query_param("recipient"), Some("r@example.com"));
    }

    #[tokio::test]
    async fn test_stream_yields_entries_with_data() {
        let (transport, client) = setup();
        transport.queue_stream(vec![
            "data: {\"data\": {\"id\": 1, \"event_type\": \"delivered\"}}\n\n",
            "data: {\"heartbeat\": true}\n\n",
            "data: {\"data\": {\"id\": 2, \"event_type\": \"bounced\"}}\n\n",
            "data: [DONE]\n\n",
        ]);

        let stream = client.logs().stream("example.com", LogQuery::new()).await.unwrap();
        let entries: Vec<_> = stream.collect().await;

        assert_eq!(entries.len(), 2);
        assert!(entries[0].as_ref().unwrap().is_delivered());
        assert!(entries[1].as_ref().unwrap().is_bounced());

        let request = transport.last_request().unwrap();
        assert_eq!(request.path, "/api/domains/example.com/log/stream");
        assert_eq!(request.query_param("limit"), Some("50000"));
    }

    #[tokio::test]
    async fn test_stream_keeps_explicit_limit_and_validates() {
        let (transport, client) = setup();
        transport.queue_stream(vec!["data: [DONE]\n\n"]);

        let stream = client
            .logs()
            .stream("example.com", LogQuery::new().limit(10))
            .await
            .unwrap();
        assert_eq!(stream.count().await, 0);
        assert_eq!(transport.last_request().unwrap().query_param("limit"), Some("10"));

        let error = client
            .logs()
            .stream("example.com", LogQuery::new().sender("bad"))
            .await
            .err()
            .unwrap();
        assert_eq!(error.message(), "Invalid sender email address.");
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_stream_error_status() {
        let (transport, client) = setup();
        transport.queue_error(401, "Unauthorized");

        let error = client
            .logs()
            .stream("example.com", LogQuery::new())
            .await
            .err()
            .unwrap();

        assert_eq!(error.kind(), ErrorKind::Authentication);
    }
}
