//! Message sending types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One recipient or a list of recipients.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Recipients {
    /// A single address, sent as a string.
    One(String),
    /// Several addresses, sent as an array.
    Many(Vec<String>),
}

impl Recipients {
    /// Iterates the addresses.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice = match self {
            Recipients::One(address) => std::slice::from_ref(address),
            Recipients::Many(addresses) => addresses.as_slice(),
        };
        slice.iter().map(String::as_str)
    }

    /// Returns the number of addresses.
    pub fn len(&self) -> usize {
        match self {
            Recipients::One(_) => 1,
            Recipients::Many(addresses) => addresses.len(),
        }
    }

    /// Returns true if no address is present.
    pub fn is_empty(&self) -> bool {
        match self {
            Recipients::One(address) => address.is_empty(),
            Recipients::Many(addresses) => addresses.is_empty(),
        }
    }
}

impl From<&str> for Recipients {
    fn from(address: &str) -> Self {
        Recipients::One(address.to_string())
    }
}

impl From<String> for Recipients {
    fn from(address: String) -> Self {
        Recipients::One(address)
    }
}

impl From<Vec<String>> for Recipients {
    fn from(addresses: Vec<String>) -> Self {
        Recipients::Many(addresses)
    }
}

impl From<Vec<&str>> for Recipients {
    fn from(addresses: Vec<&str>) -> Self {
        Recipients::Many(addresses.into_iter().map(str::to_string).collect())
    }
}

/// A transactional message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendMessageRequest {
    /// Sender address.
    pub from: String,
    /// Sender display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
    /// Recipients.
    pub to: Recipients,
    /// Reply-to address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub text: String,
    /// HTML body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// Custom MIME headers.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Additional API fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SendMessageRequest {
    /// Creates a message with the required fields.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<Recipients>,
        subject: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            from_name: None,
            to: to.into(),
            reply_to: None,
            subject: subject.into(),
            text: text.into(),
            html: None,
            headers: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    /// Sets the sender display name.
    pub fn from_name(mut self, from_name: impl Into<String>) -> Self {
        self.from_name = Some(from_name.into());
        self
    }

    /// Sets the reply-to address.
    pub fn reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    /// Sets the HTML body.
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Adds a custom MIME header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets an additional API field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

/// A message rendered from a stored template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateMessageRequest {
    /// Template GUID.
    pub template_guid: String,
    /// Recipients.
    pub to: Recipients,
    /// Sender address, overriding the template's.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Sender display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
    /// Reply-to address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// Template variables.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub variables: Map<String, Value>,
    /// Additional API fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TemplateMessageRequest {
    /// Creates a template message with the required fields.
    pub fn new(template_guid: impl Into<String>, to: impl Into<Recipients>) -> Self {
        Self {
            template_guid: template_guid.into(),
            to: to.into(),
            from: None,
            from_name: None,
            reply_to: None,
            variables: Map::new(),
            extra: Map::new(),
        }
    }

    /// Sets the sender address.
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Sets the sender display name.
    pub fn from_name(mut self, from_name: impl Into<String>) -> Self {
        self.from_name = Some(from_name.into());
        self
    }

    /// Sets the reply-to address.
    pub fn reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    /// Sets a template variable.
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Sets an additional API field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_recipient_serializes_as_string() {
        let request = SendMessageRequest::new("s@example.com", "r@example.com", "Hi", "Body");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "from": "s@example.com",
                "to": "r@example.com",
                "subject": "Hi",
                "text": "Body"
            })
        );
    }

    #[test]
    fn test_optional_fields_and_extras() {
        let request = SendMessageRequest::new("s@example.com", vec!["a@x.io", "b@x.io"], "Hi", "Body")
            .reply_to("support@example.com")
            .header("X-Campaign-ID", "welcome")
            .field("track_open", true);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["to"], json!(["a@x.io", "b@x.io"]));
        assert_eq!(value["reply_to"], json!("support@example.com"));
        assert_eq!(value["headers"], json!({"X-Campaign-ID": "welcome"}));
        assert_eq!(value["track_open"], json!(true));
    }

    #[test]
    fn test_template_variables() {
        let request = TemplateMessageRequest::new("tpl-1", "r@example.com").variable("name", "Ada");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"template_guid": "tpl-1", "to": "r@example.com", "variables": {"name": "Ada"}})
        );
    }

    #[test]
    fn test_recipients_helpers() {
        let many = Recipients::from(vec!["a@x.io", "b@x.io"]);
        assert_eq!(many.len(), 2);
        assert_eq!(many.iter().collect::<Vec<_>>(), vec!["a@x.io", "b@x.io"]);
        assert!(Recipients::from("").is_empty());
    }
}
