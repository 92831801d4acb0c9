//! Delivery log types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::common::{unix_time, Pagination};

/// Delivery event recorded in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogEvent {
    /// Accepted and queued.
    Queued,
    /// Handed to the receiving server.
    Send,
    /// Delivered.
    Delivered,
    /// Bounced.
    Bounced,
    /// Failed.
    Failed,
    /// Failed permanently.
    PermanentFail,
    /// Opened by the recipient.
    Opened,
    /// A link was clicked.
    Clicked,
    /// The recipient unsubscribed.
    Unsubscribed,
    /// Failed temporarily.
    TempFail,
    /// Delivery deferred.
    Deferred,
}

impl LogEvent {
    /// Every event, in lifecycle order.
    pub const ALL: [LogEvent; 11] = [
        LogEvent::Queued,
        LogEvent::Send,
        LogEvent::Delivered,
        LogEvent::Bounced,
        LogEvent::Failed,
        LogEvent::PermanentFail,
        LogEvent::Opened,
        LogEvent::Clicked,
        LogEvent::Unsubscribed,
        LogEvent::TempFail,
        LogEvent::Deferred,
    ];

    /// Returns the event name used by the API.
    pub fn as_str(self) -> &'static str {
        match self {
            LogEvent::Queued => "queued",
            LogEvent::Send => "send",
            LogEvent::Delivered => "delivered",
            LogEvent::Bounced => "bounced",
            LogEvent::Failed => "failed",
            LogEvent::PermanentFail => "permanent_fail",
            LogEvent::Opened => "opened",
            LogEvent::Clicked => "clicked",
            LogEvent::Unsubscribed => "unsubscribed",
            LogEvent::TempFail => "temp_fail",
            LogEvent::Deferred => "deferred",
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogEvent::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| format!("Unknown log event: {s}"))
    }
}

/// A delivery log entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogEntry {
    /// Numeric ID.
    pub id: Option<i64>,
    /// Owner GUID.
    pub user_guid: Option<String>,
    /// Domain GUID.
    pub user_domain_guid: Option<String>,
    /// Raw event name.
    pub event_type: Option<String>,
    /// Message GUID.
    pub message_guid: Option<String>,
    /// Event time, unix seconds.
    pub timestamp: Option<i64>,
}

impl LogEntry {
    /// Returns the event, if the name is known.
    pub fn event(&self) -> Option<LogEvent> {
        self.event_type.as_deref().and_then(|name| name.parse().ok())
    }

    /// Returns the event time.
    pub fn timestamp_datetime(&self) -> Option<DateTime<Utc>> {
        unix_time(self.timestamp)
    }

    fn is(&self, event: LogEvent) -> bool {
        self.event() == Some(event)
    }

    /// Returns true for `queued` events.
    pub fn is_queued(&self) -> bool {
        self.is(LogEvent::Queued)
    }

    /// Returns true for `send` events.
    pub fn is_send(&self) -> bool {
        self.is(LogEvent::Send)
    }

    /// Returns true for `delivered` events.
    pub fn is_delivered(&self) -> bool {
        self.is(LogEvent::Delivered)
    }

    /// Returns true for `bounced` events.
    pub fn is_bounced(&self) -> bool {
        self.is(LogEvent::Bounced)
    }

    /// Returns true for `failed` events.
    pub fn is_failed(&self) -> bool {
        self.is(LogEvent::Failed)
    }

    /// Returns true for `permanent_fail` events.
    pub fn is_permanent_fail(&self) -> bool {
        self.is(LogEvent::PermanentFail)
    }

    /// Returns true for `opened` events.
    pub fn is_opened(&self) -> bool {
        self.is(LogEvent::Opened)
    }

    /// Returns true for `clicked` events.
    pub fn is_clicked(&self) -> bool {
        self.is(LogEvent::Clicked)
    }

    /// Returns true for `unsubscribed` events.
    pub fn is_unsubscribed(&self) -> bool {
        self.is(LogEvent::Unsubscribed)
    }

    /// Returns true for `temp_fail` events.
    pub fn is_temp_failure(&self) -> bool {
        self.is(LogEvent::TempFail)
    }

    /// Returns true for `deferred` events.
    pub fn is_deferred(&self) -> bool {
        self.is(LogEvent::Deferred)
    }
}

/// A page of log entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogList {
    /// Entries on this page.
    pub data: Vec<LogEntry>,
    /// Number of entries, defaulting to the page length.
    pub count: u64,
    /// Offset of the page, defaulting to 0.
    pub offset: u64,
    /// Page size, defaulting to 1000.
    pub limit: u64,
    /// Pagination block, if the API sent one.
    pub pagination: Option<Pagination>,
}

/// Filters for log queries.
///
/// Dates must be formatted as `YYYY-MM-DDTHH:MM:SS+HH:MM`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    /// Start of the time window.
    pub start: Option<String>,
    /// End of the time window.
    pub end: Option<String>,
    /// Sender address.
    pub sender: Option<String>,
    /// Recipient address.
    pub recipient: Option<String>,
    /// Maximum number of entries, 1 to 10000.
    pub limit: Option<i64>,
    /// Number of entries to skip.
    pub offset: Option<i64>,
}

impl LogQuery {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the offset.
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Filters by sender.
    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Filters by recipient.
    pub fn recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        let text = [
            ("start", &self.start),
            ("end", &self.end),
            ("sender", &self.sender),
            ("recipient", &self.recipient),
        ];
        for (name, value) in text {
            if let Some(value) = value {
                query.push((name.to_string(), value.clone()));
            }
        }
        for (name, value) in [("limit", self.limit), ("offset", self.offset)] {
            if let Some(value) = value {
                query.push((name.to_string(), value.to_string()));
            }
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_round_trip_names() {
        for event in LogEvent::ALL {
            assert_eq!(event.as_str().parse::<LogEvent>(), Ok(event));
        }
        assert!("exploded".parse::<LogEvent>().is_err());
    }

    #[test]
    fn test_event_predicates() {
        let entry: LogEntry = serde_json::from_value(json!({
            "event_type": "permanent_fail",
            "message_guid": "m-1",
            "timestamp": 1_700_000_000
        }))
        .unwrap();

        assert!(entry.is_permanent_fail());
        assert!(!entry.is_failed());
        assert!(!entry.is_delivered());
        assert_eq!(entry.event(), Some(LogEvent::PermanentFail));
        assert!(entry.timestamp_datetime().is_some());
    }

    #[test]
    fn test_unknown_event_matches_nothing() {
        let entry = LogEntry {
            event_type: Some("spam_report".to_string()),
            ..LogEntry::default()
        };
        assert_eq!(entry.event(), None);
        assert!(!entry.is_queued());
    }

    #[test]
    fn test_query_serialization() {
        let query = LogQuery::new().sender("a@example.com").limit(10).offset(0);
        assert_eq!(
            query.to_query(),
            vec![
                ("sender".to_string(), "a@example.com".to_string()),
                ("limit".to_string(), "10".to_string()),
                ("offset".to_string(), "0".to_string()),
            ]
        );
    }
}
