//! End-to-end tests of the request pipeline against a mock server.

mod common;

use common::*;
use kirimemail_smtp::transport::HttpRequest;
use kirimemail_smtp::{ErrorKind, ListDomainsParams, SmtpClient};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::error::Error as _;
use std::time::{Duration, Instant};
use test_case::test_case;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_account_auth_and_default_headers() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/api/domains"))
        .and(query_param("page", "2"))
        .and(header("Authorization", basic(USERNAME, TOKEN).as_str()))
        .and(header("Accept", "application/json"))
        .and(header_exists("User-Agent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"domain": "example.com"}],
            "pagination": {"total": 11, "page": 2, "limit": 10}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = account_client(&server);
    let list = client
        .domains()
        .list(ListDomainsParams {
            page: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(list.data[0].domain.as_deref(), Some("example.com"));
    let pagination = list.pagination.unwrap();
    assert!(!pagination.has_next_page());
    assert_eq!(pagination.previous_page(), Some(1));
}

#[tokio::test]
async fn test_v4_paths_use_domain_credentials() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/api/v4/domains/example.com/stats"))
        .and(header("Authorization", basic(API_KEY, API_SECRET).as_str()))
        .and(header("domain", "example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = full_client(&server);
    let envelope = client
        .get("/api/v4/domains/example.com/stats", Vec::new())
        .await
        .unwrap();

    assert_eq!(envelope["success"], json!(true));
}

#[tokio::test]
async fn test_non_v4_paths_keep_account_credentials() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/api/domains/example.com"))
        .and(header("Authorization", basic(USERNAME, TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 4}})))
        .expect(1)
        .mount(&server)
        .await;

    let domain = full_client(&server).domains().get("example.com").await.unwrap();

    assert_eq!(domain.id, Some(4));
}

#[tokio::test]
async fn test_custom_headers_are_sent() {
    let server = setup_mock_server().await;

    Mock::given(method("DELETE"))
        .and(path("/api/domains/example.com"))
        .and(header("X-Request-Source", "integration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = SmtpClient::builder()
        .credentials(USERNAME, TOKEN)
        .base_url(server.uri())
        .header("X-Request-Source", "integration")
        .build()
        .unwrap();

    assert!(client.domains().delete("example.com").await.unwrap().success);
}

#[test_case(400, ErrorKind::Validation; "bad request")]
#[test_case(422, ErrorKind::Validation; "unprocessable")]
#[test_case(401, ErrorKind::Authentication; "unauthorized")]
#[test_case(403, ErrorKind::Authentication; "forbidden")]
#[test_case(404, ErrorKind::NotFound; "not found")]
#[test_case(429, ErrorKind::Api; "rate limited")]
#[test_case(500, ErrorKind::Server; "internal")]
#[test_case(503, ErrorKind::Server; "unavailable")]
#[tokio::test]
async fn test_status_classification(status: u16, kind: ErrorKind) {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/api/domains"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({"message": "Boom"})))
        .mount(&server)
        .await;

    let error = account_client(&server)
        .domains()
        .list(ListDomainsParams::default())
        .await
        .unwrap_err();

    assert_eq!(error.kind(), kind);
    assert_eq!(error.message(), "Boom");
    assert_eq!(error.status_code(), Some(status));
}

#[tokio::test]
async fn test_validation_errors_expose_fields() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/domains"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "The given data was invalid.",
            "errors": {"domain": ["The domain has already been taken."]}
        })))
        .mount(&server)
        .await;

    let error = account_client(&server)
        .domains()
        .create("example.com", Default::default())
        .await
        .unwrap_err();

    assert!(error.has_field_error("domain"));
    assert_eq!(error.first_error(), Some("The domain has already been taken."));
}

#[tokio::test]
async fn test_error_field_fallback_and_unknown_message() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/api/domains/a.com"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "Database down"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/domains/b.com"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({"detail": "?"})))
        .mount(&server)
        .await;

    let client = account_client(&server);
    let first = client.domains().get("a.com").await.unwrap_err();
    let second = client.domains().get("b.com").await.unwrap_err();

    assert_eq!(first.message(), "Database down");
    assert_eq!(second.message(), kirimemail_smtp::errors::UNKNOWN_ERROR_MESSAGE);
}

#[test_case(204, true; "no content")]
#[test_case(400, false; "bad request")]
#[tokio::test]
async fn test_empty_body_maps_success_from_status(status: u16, success: bool) {
    let server = setup_mock_server().await;

    Mock::given(method("DELETE"))
        .and(path("/api/domains/example.com/credentials/7"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;

    let response = account_client(&server)
        .credentials()
        .delete("example.com", "7")
        .await
        .unwrap();

    assert_eq!(response.success, success);
}

#[tokio::test]
async fn test_invalid_json_is_api_error() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/api/domains"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let error = account_client(&server)
        .domains()
        .list(ListDomainsParams::default())
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Api);
    assert!(error.message().starts_with("Invalid JSON response"));
    assert_eq!(error.status_code(), Some(200));
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    let client = SmtpClient::builder()
        .credentials(USERNAME, TOKEN)
        .base_url("http://127.0.0.1:1")
        .build()
        .unwrap();

    let error = client
        .domains()
        .list(ListDomainsParams::default())
        .await
        .unwrap_err();

    assert!(error.is_network());
    assert!(error.message().starts_with("Network error: "));
    assert_eq!(error.status_code(), None);

    let cause = error.source().and_then(|transport| transport.source()).unwrap();
    assert!(cause.downcast_ref::<reqwest::Error>().unwrap().is_connect());
}

#[tokio::test]
async fn test_slow_response_hits_timeout() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/api/domains"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": []}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = SmtpClient::builder()
        .credentials(USERNAME, TOKEN)
        .base_url(server.uri())
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let started = Instant::now();
    let error = client
        .domains()
        .list(ListDomainsParams::default())
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(error.is_network());
    assert_eq!(error.message(), "Network error: Timeout after 200ms");
    let cause = error.source().and_then(|transport| transport.source()).unwrap();
    assert!(cause.downcast_ref::<reqwest::Error>().unwrap().is_timeout());
}

#[tokio::test]
async fn test_invalid_default_header_fails_at_build() {
    let error = SmtpClient::builder()
        .credentials(USERNAME, TOKEN)
        .header("X-Tag", "a\nb")
        .build()
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn test_invalid_call_header_is_rejected_locally() {
    let server = setup_mock_server().await;

    let error = account_client(&server)
        .request(HttpRequest::get("/api/domains").with_header("X-Tag", "a\nb"))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::InvalidRequest);
    assert!(!error.is_network());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_with_base_url_retargets_client() {
    let first = setup_mock_server().await;
    let second = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/api/domains/example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 2}})))
        .expect(1)
        .mount(&second)
        .await;

    let client = account_client(&first).with_base_url(&second.uri()).unwrap();
    let domain = client.domains().get("example.com").await.unwrap();

    assert_eq!(domain.id, Some(2));
    assert_eq!(client.base_url(), second.uri());
}
