//! Type definitions for the KirimEmail API.
//!
//! Response records keep every field optional: the API omits keys freely,
//! and a missing key must never fail decoding.

pub mod common;
pub mod credential;
pub mod domain;
pub mod log_entry;
pub mod message;
pub mod suppression;

pub use common::{ApiResponse, Pagination};
pub use credential::{Credential, CredentialList, CredentialSecret, ListCredentialsParams};
pub use domain::{
    AuthDomainSetup, DkimKeyLength, DnsVerification, Domain, DomainList, DomainSettings,
    ListDomainsParams,
};
pub use log_entry::{LogEntry, LogEvent, LogList, LogQuery};
pub use message::{Recipients, SendMessageRequest, TemplateMessageRequest};
pub use suppression::{Suppression, SuppressionList, SuppressionQuery, SuppressionType};
