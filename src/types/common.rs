//! Common types shared across the KirimEmail API.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Pagination block attached to list responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Pagination {
    /// Total number of items.
    #[serde(default)]
    pub total: Option<u64>,
    /// Current page, starting at 1.
    #[serde(default)]
    pub page: Option<u64>,
    /// Page size.
    #[serde(default)]
    pub limit: Option<u64>,
    /// Offset of the first item.
    #[serde(default)]
    pub offset: Option<u64>,
}

impl Pagination {
    /// Returns the number of pages, if `total` and a non-zero `limit` are known.
    pub fn total_pages(&self) -> Option<u64> {
        match (self.total, self.limit) {
            (Some(total), Some(limit)) if limit > 0 => Some(total.div_ceil(limit)),
            _ => None,
        }
    }

    /// Returns true if a page follows the current one.
    pub fn has_next_page(&self) -> bool {
        matches!((self.total_pages(), self.page), (Some(pages), Some(page)) if page < pages)
    }

    /// Returns true if a page precedes the current one.
    pub fn has_previous_page(&self) -> bool {
        self.page.is_some_and(|page| page > 1)
    }

    /// Returns the next page number.
    pub fn next_page(&self) -> Option<u64> {
        if self.has_next_page() {
            self.page.map(|page| page + 1)
        } else {
            None
        }
    }

    /// Returns the previous page number.
    pub fn previous_page(&self) -> Option<u64> {
        if self.has_previous_page() {
            self.page.map(|page| page - 1)
        } else {
            None
        }
    }
}

/// Envelope of create, update and delete responses.
///
/// Keys other than `success`, `message` and `data` are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiResponse<T = Value> {
    /// Whether the API reported success.
    #[serde(default)]
    pub success: bool,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Response payload.
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Any other top-level keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Converts a unix timestamp in seconds; zero counts as unset.
pub(crate) fn unix_time(seconds: Option<i64>) -> Option<DateTime<Utc>> {
    match seconds {
        Some(0) | None => None,
        Some(seconds) => Utc.timestamp_opt(seconds, 0).single(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn pagination(total: Option<u64>, page: Option<u64>, limit: Option<u64>) -> Pagination {
        Pagination {
            total,
            page,
            limit,
            offset: None,
        }
    }

    #[test_case(Some(95), Some(10), Some(10); "partial last page")]
    #[test_case(Some(100), Some(10), Some(10); "exact division")]
    #[test_case(Some(0), Some(10), Some(0); "empty")]
    #[test_case(Some(10), Some(0), None; "zero limit")]
    #[test_case(None, Some(10), None; "unknown total")]
    fn test_total_pages(total: Option<u64>, limit: Option<u64>, expected: Option<u64>) {
        assert_eq!(pagination(total, Some(1), limit).total_pages(), expected);
    }

    #[test]
    fn test_page_navigation() {
        let middle = pagination(Some(50), Some(3), Some(10));
        assert!(middle.has_next_page());
        assert!(middle.has_previous_page());
        assert_eq!(middle.next_page(), Some(4));
        assert_eq!(middle.previous_page(), Some(2));

        let last = pagination(Some(50), Some(5), Some(10));
        assert!(!last.has_next_page());
        assert_eq!(last.next_page(), None);

        let first = pagination(Some(50), Some(1), Some(10));
        assert!(!first.has_previous_page());
        assert_eq!(first.previous_page(), None);

        let unknown = Pagination::default();
        assert!(!unknown.has_next_page());
        assert!(!unknown.has_previous_page());
    }

    #[test]
    fn test_api_response_keeps_extra_keys() {
        let response: ApiResponse = serde_json::from_value(json!({
            "success": true,
            "message": "Template message sent successfully",
            "template_guid": "t-1"
        }))
        .unwrap();

        assert!(response.success);
        assert!(response.data.is_none());
        assert_eq!(response.extra["template_guid"], json!("t-1"));
    }

    #[test]
    fn test_unix_time() {
        assert_eq!(unix_time(None), None);
        assert_eq!(unix_time(Some(0)), None);
        assert_eq!(
            unix_time(Some(1_700_000_000)).map(|t| t.to_rfc3339()),
            Some("2023-11-14T22:13:20+00:00".to_string())
        );
    }
}
