//! Shared helpers for the WireMock integration tests.

#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use kirimemail_smtp::SmtpClient;
use wiremock::MockServer;

pub const USERNAME: &str = "acme";
pub const TOKEN: &str = "account-token";
pub const API_KEY: &str = "domain-key";
pub const API_SECRET: &str = "domain-secret";

/// Starts a mock server.
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Builds a client with account credentials pointed at `server`.
pub fn account_client(server: &MockServer) -> SmtpClient {
    SmtpClient::builder()
        .credentials(USERNAME, TOKEN)
        .base_url(server.uri())
        .build()
        .expect("Failed to build client")
}

/// Builds a client with both credential pairs pointed at `server`.
pub fn full_client(server: &MockServer) -> SmtpClient {
    SmtpClient::builder()
        .credentials(USERNAME, TOKEN)
        .domain_credentials(API_KEY, API_SECRET)
        .base_url(server.uri())
        .build()
        .expect("Failed to build client")
}

/// Expected `Authorization` value for a credential pair.
pub fn basic(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}
