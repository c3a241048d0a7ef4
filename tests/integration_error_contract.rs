mod common;

use std::sync::Arc;

use accountapi::prelude::{CallContext, Client, Error, ErrorCode};
use accountapi::{ForbiddenBody, ImmediateTimerFactory};

use common::{ACCOUNT_ID, MockResponse, MockServer};

async fn fetch_error(status: u16, body: &str) -> Error {
    let server = MockServer::start(vec![MockResponse::new(status, body)]);
    let client = Client::builder()
        .base_url(&server.base_url)
        .timer_factory(Arc::new(ImmediateTimerFactory))
        .build();
    client
        .fetch_account(&CallContext::new(), ACCOUNT_ID)
        .await
        .expect_err("non-success status should fail")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn terminal_statuses_keep_stable_codes_and_messages() {
    let cases = [
        (
            400_u16,
            r#"{"error_message":"id in body is required","error_code":"e1"}"#,
            ErrorCode::BadRequest,
            "e1: id in body is required",
        ),
        (
            403,
            r#"{"error":"access_denied","error_description":"not allowed"}"#,
            ErrorCode::Forbidden,
            "access_denied: not allowed",
        ),
        (404, "", ErrorCode::NotFound, "not found"),
        (
            409,
            r#"{"error_message":"invalid version"}"#,
            ErrorCode::Conflict,
            "invalid version",
        ),
        (418, "teapot", ErrorCode::HttpStatus, "418: I'm a teapot"),
    ];

    for (status, body, code, message) in cases {
        let error = fetch_error(status, body).await;
        assert_eq!(error.code(), code, "status {status}");
        assert_eq!(error.to_string(), message, "status {status}");
        assert_eq!(error.status().map(|status| status.as_u16()), Some(status));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn forbidden_detail_matches_with_wildcards() {
    let error = fetch_error(
        403,
        r#"{"error":"invalid_token","error_description":"token expired"}"#,
    )
    .await;

    assert!(error.matches(&Error::Forbidden(ForbiddenBody::default())));
    assert!(error.matches(&Error::Forbidden(ForbiddenBody::new("invalid_token", ""))));
    assert!(!error.matches(&Error::Forbidden(ForbiddenBody::new("other", ""))));
}

#[test]
fn error_codes_have_stable_names() {
    assert_eq!(ErrorCode::TooManyRetries.as_str(), "too_many_retries");
    assert_eq!(ErrorCode::Cancelled.as_str(), "cancelled");
    assert_eq!(ErrorCode::Deserialize.as_str(), "deserialize");
    assert_eq!(ErrorCode::HttpStatus.as_str(), "http_status");
}
