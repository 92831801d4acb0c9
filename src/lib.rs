//! KirimEmail SMTP Client Library
//!
//! A Rust client for the KirimEmail transactional email REST API. Covers
//! domain management, SMTP credentials, message sending with attachments,
//! delivery logs (including the live log stream) and suppression lists.
//!
//! # Features
//!
//! - **Dual authentication**: account credentials, with domain API keys
//!   selected automatically for `/api/v4/` endpoints
//! - **Typed errors**: HTTP statuses classified into validation,
//!   authentication, not-found, server and generic API errors
//! - **Multipart uploads**: attachments read from disk and sent as form parts
//! - **Streaming**: Server-Sent-Events log stream decoded lazily
//! - **Observability**: structured logging through `tracing`
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use kirimemail_smtp::{SendMessageRequest, SmtpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SmtpClient::builder()
//!         .credentials("username", "api_token")
//!         .build()?;
//!
//!     let message = SendMessageRequest::new(
//!         "sender@example.com",
//!         "recipient@example.com",
//!         "Hello",
//!         "Sent from Rust",
//!     );
//!     let response = client.messages().send("example.com", &message, &[]).await?;
//!     println!("{:?}", response.message);
//!     Ok(())
//! }
//! ```
//!
//! # Streaming Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use kirimemail_smtp::{LogQuery, SmtpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SmtpClient::from_env()?;
//!
//!     let mut logs = client.logs().stream("example.com", LogQuery::new()).await?;
//!     while let Some(entry) = logs.next().await {
//!         let entry = entry?;
//!         println!("{:?} {:?}", entry.message_guid, entry.event());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod observability;
pub mod services;
pub mod transport;
pub mod types;
pub mod validation;

// Re-exports for convenience
pub use auth::{AuthProvider, BasicAuth};
pub use client::{SmtpClient, SmtpClientBuilder};
pub use config::{SmtpConfig, SmtpConfigBuilder};
pub use errors::{ErrorKind, FieldErrors, SmtpError, SmtpResult};
pub use observability::{LogFormat, LogLevel, LoggingConfig};
pub use services::LogStream;

// Type re-exports
pub use types::{
    ApiResponse, AuthDomainSetup, Credential, CredentialList, CredentialSecret, DkimKeyLength,
    DnsVerification, Domain, DomainList, DomainSettings, ListCredentialsParams,
    ListDomainsParams, LogEntry, LogEvent, LogList, LogQuery, Pagination, Recipients,
    SendMessageRequest, Suppression, SuppressionList, SuppressionQuery, SuppressionType,
    TemplateMessageRequest,
};

/// Mock implementations for testing.
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
