//! Transactional message sending.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{decode, domain_path};
use crate::client::SmtpClient;
use crate::errors::{SmtpError, SmtpResult};
use crate::transport::MultipartForm;
use crate::types::{ApiResponse, Recipients, SendMessageRequest, TemplateMessageRequest};
use crate::validation::{require_email, require_field};

/// Maximum number of recipients of one bulk request.
pub const MAX_BULK_RECIPIENTS: usize = 1000;

const ATTACHMENTS_FIELD: &str = "attachments";

/// Service for sending messages.
pub struct MessagesService<'a> {
    client: &'a SmtpClient,
}

impl<'a> MessagesService<'a> {
    /// Creates a new messages service.
    pub fn new(client: &'a SmtpClient) -> Self {
        Self { client }
    }

    /// Sends a message, as multipart when attachments are given.
    ///
    /// # Errors
    ///
    /// Returns [`SmtpError::InvalidRequest`] without sending if a required
    /// field is empty or an address is malformed.
    #[instrument(skip(self, request, attachments), fields(attachments = attachments.len()))]
    pub async fn send(
        &self,
        domain: &str,
        request: &SendMessageRequest,
        attachments: &[PathBuf],
    ) -> SmtpResult<ApiResponse> {
        validate_message(request)?;
        let path = domain_path(domain, "/message")?;
        self.dispatch(&path, request, attachments).await
    }

    /// Sends a message rendered from a stored template.
    #[instrument(skip(self, request, attachments), fields(attachments = attachments.len()))]
    pub async fn send_template(
        &self,
        domain: &str,
        request: &TemplateMessageRequest,
        attachments: &[PathBuf],
    ) -> SmtpResult<ApiResponse> {
        validate_template(request)?;
        let path = domain_path(domain, "/message/template")?;
        self.dispatch(&path, request, attachments).await
    }

    /// Sends a message with attachment processing options.
    ///
    /// Options that are null or empty are left out; anything else is sent as
    /// the JSON text of the `attachment_options` field.
    #[instrument(skip(self, request, attachments, options))]
    pub async fn send_with_attachment_options(
        &self,
        domain: &str,
        request: &SendMessageRequest,
        attachments: &[PathBuf],
        options: &Value,
    ) -> SmtpResult<ApiResponse> {
        let has_options = match options {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            Value::Array(items) => !items.is_empty(),
            _ => true,
        };

        if !has_options {
            return self.send(domain, request, attachments).await;
        }

        let request = request
            .clone()
            .field("attachment_options", options.to_string());
        self.send(domain, &request, attachments).await
    }

    /// Sends one message to a list of recipients.
    ///
    /// # Errors
    ///
    /// Returns [`SmtpError::InvalidRequest`] if `to` is a single address or
    /// holds more than [`MAX_BULK_RECIPIENTS`] addresses.
    #[instrument(skip(self, request, attachments))]
    pub async fn send_bulk(
        &self,
        domain: &str,
        request: &SendMessageRequest,
        attachments: &[PathBuf],
    ) -> SmtpResult<ApiResponse> {
        match &request.to {
            Recipients::One(_) => {
                return Err(SmtpError::invalid_request(
                    "Bulk email requires 'to' field to be an array of email addresses",
                ))
            }
            Recipients::Many(recipients) if recipients.len() > MAX_BULK_RECIPIENTS => {
                return Err(SmtpError::invalid_request(format!(
                    "Maximum {MAX_BULK_RECIPIENTS} recipients allowed per request"
                )))
            }
            Recipients::Many(_) => {}
        }

        self.send(domain, request, attachments).await
    }

    async fn dispatch<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        attachments: &[PathBuf],
    ) -> SmtpResult<ApiResponse> {
        if attachments.is_empty() {
            return decode(self.client.post(path, body).await?);
        }

        let Value::Object(fields) = serde_json::to_value(body)? else {
            return Err(SmtpError::invalid_request(
                "Message body must serialize to a JSON object",
            ));
        };
        debug!(count = attachments.len(), "Sending message as multipart");

        let form = MultipartForm::from_json(&fields).file(ATTACHMENTS_FIELD, attachments.to_vec());
        decode(self.client.post_multipart(path, form, HashMap::new()).await?)
    }
}

fn validate_message(request: &SendMessageRequest) -> SmtpResult<()> {
    require_field("from", &request.from)?;
    require_recipients(&request.to)?;
    require_field("subject", &request.subject)?;
    require_field("text", &request.text)?;

    require_email("from", &request.from)?;
    validate_recipients(&request.to)?;
    validate_optional_email("reply_to", request.reply_to.as_deref())
}

fn validate_template(request: &TemplateMessageRequest) -> SmtpResult<()> {
    require_field("template_guid", &request.template_guid)?;
    require_recipients(&request.to)?;

    validate_recipients(&request.to)?;
    validate_optional_email("from", request.from.as_deref())?;
    validate_optional_email("reply_to", request.reply_to.as_deref())
}

fn require_recipients(to: &Recipients) -> SmtpResult<()> {
    if to.is_empty() {
        return Err(SmtpError::invalid_request("Missing required field: to"));
    }
    Ok(())
}

fn validate_recipients(to: &Recipients) -> SmtpResult<()> {
    to.iter().try_for_each(|address| require_email("to", address))
}

fn validate_optional_email(field: &str, address: Option<&str>) -> SmtpResult<()> {
    match address {
        Some(address) if !address.is_empty() => require_email(field, address),
        _ => Ok(()),
    }
}
