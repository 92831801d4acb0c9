//! Suppression list queries.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::instrument;

use super::{decode_list, decode_pagination, domain_path};
use crate::client::SmtpClient;
use crate::errors::SmtpResult;
use crate::types::{SuppressionList, SuppressionQuery, SuppressionType};
use crate::validation::require_range;

const DEFAULT_PER_PAGE: i64 = 10;

/// Service for suppression operations.
pub struct SuppressionsService<'a> {
    client: &'a SmtpClient,
}

impl<'a> SuppressionsService<'a> {
    /// Creates a new suppressions service.
    pub fn new(client: &'a SmtpClient) -> Self {
        Self { client }
    }

    /// Lists the suppressions of a domain.
    ///
    /// # Errors
    ///
    /// Returns an invalid-request error without sending if `page` is
    /// below 1 or `per_page` is outside 10 to 100.
    #[instrument(skip(self))]
    pub async fn list(&self, domain: &str, query: &SuppressionQuery) -> SmtpResult<SuppressionList> {
        validate_query(query)?;
        let path = domain_path(domain, "/suppressions")?;
        let response = self.client.get(&path, query.to_query()).await?;

        let filters = match response.get("filters") {
            Some(Value::Object(filters)) => filters.clone(),
            _ => serde_json::Map::new(),
        };

        Ok(SuppressionList {
            data: decode_list(response.get("data"))?,
            pagination: decode_pagination(response.get("pagination"))?,
            filters,
        })
    }

    /// Lists the suppressions of a type given by name.
    ///
    /// # Errors
    ///
    /// Returns an invalid-request error if `kind` is not one of
    /// `unsubscribe`, `bounce` or `whitelist`.
    pub async fn by_type(
        &self,
        domain: &str,
        kind: &str,
        query: SuppressionQuery,
    ) -> SmtpResult<SuppressionList> {
        let kind: SuppressionType = kind.parse()?;
        self.list(domain, &query.suppression_type(kind)).await
    }

    /// Lists unsubscribe suppressions.
    pub async fn unsubscribes(
        &self,
        domain: &str,
        query: SuppressionQuery,
    ) -> SmtpResult<SuppressionList> {
        self.list(domain, &query.suppression_type(SuppressionType::Unsubscribe))
            .await
    }

    /// Lists bounce suppressions.
    pub async fn bounces(&self, domain: &str, query: SuppressionQuery) -> SmtpResult<SuppressionList> {
        self.list(domain, &query.suppression_type(SuppressionType::Bounce))
            .await
    }

    /// Lists whitelist entries.
    pub async fn whitelist(
        &self,
        domain: &str,
        query: SuppressionQuery,
    ) -> SmtpResult<SuppressionList> {
        self.list(domain, &query.suppression_type(SuppressionType::Whitelist))
            .await
    }

    /// Searches suppressions by address or domain.
    pub async fn search(
        &self,
        domain: &str,
        search: &str,
        query: SuppressionQuery,
    ) -> SmtpResult<SuppressionList> {
        self.list(domain, &query.search(search)).await
    }

    /// Lists one page of suppressions, page 1 of 10 by default.
    pub async fn paginated(
        &self,
        domain: &str,
        page: Option<i64>,
        per_page: Option<i64>,
        query: SuppressionQuery,
    ) -> SmtpResult<SuppressionList> {
        let query = query.page(page.unwrap_or(1), per_page.unwrap_or(DEFAULT_PER_PAGE));
        self.list(domain, &query).await
    }

    /// Lists the suppressions created at or after `start`.
    ///
    /// The filter runs on the fetched page; entries without a creation time
    /// are dropped. Pagination and filters are those of the fetched page.
    pub async fn created_after(
        &self,
        domain: &str,
        start: DateTime<Utc>,
        query: SuppressionQuery,
    ) -> SmtpResult<SuppressionList> {
        let mut list = self.list(domain, &query).await?;
        list.data.retain(|suppression| {
            suppression
                .created_at_datetime()
                .is_some_and(|created| created >= start)
        });
        Ok(list)
    }
}

fn validate_query(query: &SuppressionQuery) -> SmtpResult<()> {
    if let Some(page) = query.page {
        require_range(page, 1, i64::MAX, "Page must be greater than or equal to 1.")?;
    }
    if let Some(per_page) = query.per_page {
        require_range(per_page, 10, 100, "Per page must be between 10 and 100.")?;
    }
    Ok(())
}
