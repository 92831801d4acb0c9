//! SMTP credential operations.

use serde_json::{json, Map, Value};
use tracing::instrument;

use super::{decode, decode_list, decode_pagination, domain_path, segment};
use crate::client::{ResponseEnvelope, SmtpClient};
use crate::errors::{SmtpError, SmtpResult};
use crate::types::{
    ApiResponse, Credential, CredentialList, CredentialSecret, ListCredentialsParams,
};
use crate::validation::require_field;

/// Service for SMTP credential operations.
pub struct CredentialsService<'a> {
    client: &'a SmtpClient,
}

impl<'a> CredentialsService<'a> {
    /// Creates a new credentials service.
    pub fn new(client: &'a SmtpClient) -> Self {
        Self { client }
    }

    /// Lists the credentials of a domain.
    ///
    /// Accepts both the nested `{"data": {"data": [...], "pagination": ...}}`
    /// shape and a flat `{"data": [...]}`.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        domain: &str,
        params: ListCredentialsParams,
    ) -> SmtpResult<CredentialList> {
        let path = domain_path(domain, "/credentials")?;
        let response = self.client.get(&path, params.to_query()).await?;

        let data = response.get("data");
        let (items, pagination) = match data {
            Some(Value::Object(nested)) => (nested.get("data"), nested.get("pagination")),
            other => (other, None),
        };

        Ok(CredentialList {
            data: decode_list(items)?,
            domain: response
                .get("domain")
                .and_then(Value::as_str)
                .unwrap_or(domain)
                .to_string(),
            pagination: decode_pagination(pagination)?,
        })
    }

    /// Creates a credential and returns it with its generated password.
    #[instrument(skip(self))]
    pub async fn create(&self, domain: &str, username: &str) -> SmtpResult<CredentialSecret> {
        require_field("username", username)?;
        let path = domain_path(domain, "/credentials")?;
        let response = self
            .client
            .post(&path, &json!({ "username": username }))
            .await?;

        secret_from(response, &[("password", "password"), ("remote_synced", "remote_synced")])
    }

    /// Gets a credential.
    #[instrument(skip(self))]
    pub async fn get(&self, domain: &str, credential: &str) -> SmtpResult<Credential> {
        let path = credential_path(domain, credential, "")?;
        let response = self.client.get(&path, Vec::new()).await?;

        match response.get("data") {
            Some(data @ Value::Object(_)) => Ok(serde_json::from_value(data.clone())?),
            _ => Err(SmtpError::api("Response is missing credential data", None)),
        }
    }

    /// Deletes a credential.
    #[instrument(skip(self))]
    pub async fn delete(&self, domain: &str, credential: &str) -> SmtpResult<ApiResponse> {
        let path = credential_path(domain, credential, "")?;
        decode(self.client.delete(&path, Vec::new()).await?)
    }

    /// Generates a new password for a credential.
    #[instrument(skip(self))]
    pub async fn reset_password(
        &self,
        domain: &str,
        credential: &str,
    ) -> SmtpResult<CredentialSecret> {
        let path = credential_path(domain, credential, "/reset-password")?;
        let response = self.client.put(&path, &json!({})).await?;

        secret_from(
            response,
            &[
                ("new_password", "password"),
                ("strength_info", "strength_info"),
                ("remote_synced", "remote_synced"),
            ],
        )
    }
}

fn credential_path(domain: &str, credential: &str, suffix: &str) -> SmtpResult<String> {
    require_field("credential", credential)?;
    domain_path(domain, &format!("/credentials/{}{suffix}", segment(credential)))
}

/// Folds the listed `data` siblings into `data.credential` under their new
/// names, then decodes the result.
fn secret_from(
    response: ResponseEnvelope,
    merged: &[(&str, &str)],
) -> SmtpResult<CredentialSecret> {
    let success = response
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or_default();
    let message = response
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string);

    let credential = match response.get("data") {
        Some(Value::Object(data)) => match data.get("credential") {
            Some(Value::Object(fields)) => {
                let mut fields: Map<String, Value> = fields.clone();
                for (from, to) in merged {
                    if let Some(value) = data.get(*from).filter(|value| !value.is_null()) {
                        fields.insert((*to).to_string(), value.clone());
                    }
                }
                Some(serde_json::from_value(Value::Object(fields))?)
            }
            _ => None,
        },
        _ => None,
    };

    Ok(CredentialSecret {
        success,
        message,
        credential,
    })
}
