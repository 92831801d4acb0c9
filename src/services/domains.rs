//! Domain operations.

use serde_json::{json, Value};
use tracing::instrument;

use super::{decode, decode_list, decode_pagination, domain_path};
use crate::client::SmtpClient;
use crate::errors::{SmtpError, SmtpResult};
use crate::types::{
    ApiResponse, AuthDomainSetup, DkimKeyLength, DnsVerification, Domain, DomainList,
    DomainSettings, ListDomainsParams,
};
use crate::validation::require_field;

/// Service for domain operations.
pub struct DomainsService<'a> {
    client: &'a SmtpClient,
}

impl<'a> DomainsService<'a> {
    /// Creates a new domains service.
    pub fn new(client: &'a SmtpClient) -> Self {
        Self { client }
    }

    /// Lists the account's domains.
    #[instrument(skip(self))]
    pub async fn list(&self, params: ListDomainsParams) -> SmtpResult<DomainList> {
        let response = self.client.get("/api/domains", params.to_query()).await?;

        Ok(DomainList {
            data: decode_list(response.get("data"))?,
            pagination: decode_pagination(response.get("pagination"))?,
        })
    }

    /// Registers a domain.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        domain: &str,
        dkim_key_length: DkimKeyLength,
    ) -> SmtpResult<ApiResponse> {
        require_field("domain", domain)?;
        let body = json!({
            "domain": domain,
            "dkim_key_length": dkim_key_length,
        });
        decode(self.client.post("/api/domains", &body).await?)
    }

    /// Gets a domain.
    #[instrument(skip(self))]
    pub async fn get(&self, domain: &str) -> SmtpResult<Domain> {
        let response = self.client.get(&domain_path(domain, "")?, Vec::new()).await?;

        match response.get("data") {
            Some(data @ Value::Object(_)) => Ok(serde_json::from_value(data.clone())?),
            _ => Err(SmtpError::api("Response is missing domain data", None)),
        }
    }

    /// Updates the tracking settings of a domain.
    #[instrument(skip(self))]
    pub async fn update(&self, domain: &str, settings: DomainSettings) -> SmtpResult<ApiResponse> {
        let mut response: ApiResponse =
            decode(self.client.put(&domain_path(domain, "")?, &settings).await?)?;
        response.success = true;
        Ok(response)
    }

    /// Deletes a domain.
    #[instrument(skip(self))]
    pub async fn delete(&self, domain: &str) -> SmtpResult<ApiResponse> {
        decode(self.client.delete(&domain_path(domain, "")?, Vec::new()).await?)
    }

    /// Sets up an authentication domain.
    #[instrument(skip(self))]
    pub async fn setup_auth_domain(
        &self,
        domain: &str,
        setup: &AuthDomainSetup,
    ) -> SmtpResult<ApiResponse> {
        let path = domain_path(domain, "/setup-auth-domain")?;
        decode(self.client.post(&path, setup).await?)
    }

    /// Verifies the mandatory DNS records of a domain.
    #[instrument(skip(self))]
    pub async fn verify_mandatory_records(&self, domain: &str) -> SmtpResult<DnsVerification> {
        let path = domain_path(domain, "/verify-mandatory")?;
        decode(self.client.post(&path, &json!({})).await?)
    }

    /// Verifies the DNS records of the authentication domain.
    #[instrument(skip(self))]
    pub async fn verify_auth_domain_records(&self, domain: &str) -> SmtpResult<DnsVerification> {
        let path = domain_path(domain, "/verify-auth-domain")?;
        decode(self.client.post(&path, &json!({})).await?)
    }
}
