mod common;

use std::sync::Arc;

use accountapi::prelude::{AccountAttributes, AccountData, CallContext, Client, Error};
use accountapi::{API_CONTENT_TYPE, ApiErrorBody, ImmediateTimerFactory};
use serde_json::Value;

use common::{
    ACCOUNT_ID, MockResponse, MockServer, ORGANISATION_ID, account_envelope, gzip_bytes,
};

fn client_for(server: &MockServer) -> Client {
    Client::builder()
        .base_url(&server.base_url)
        .client_name("accountapi-tests")
        .timer_factory(Arc::new(ImmediateTimerFactory))
        .try_build()
        .expect("client should build")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn create_account_posts_envelope_and_decodes_created_account() {
    let server = MockServer::start(vec![
        MockResponse::new(201, account_envelope(0))
            .header("Content-Type", "application/vnd.api+json"),
    ]);
    let client = client_for(&server);

    let account = AccountData {
        id: ACCOUNT_ID.to_owned(),
        organisation_id: ORGANISATION_ID.to_owned(),
        kind: "accounts".to_owned(),
        attributes: Some(AccountAttributes {
            country: Some("GB".to_owned()),
            name: vec!["Samantha Holder".to_owned()],
            ..AccountAttributes::default()
        }),
        version: None,
    };
    let created = client
        .create_account(&CallContext::new(), account)
        .await
        .expect("create should succeed");

    assert_eq!(created.id, ACCOUNT_ID);
    assert_eq!(created.version, Some(0));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/v1/organisation/accounts");
    assert_eq!(
        request.headers.get("content-type").map(String::as_str),
        Some(API_CONTENT_TYPE)
    );
    assert_eq!(
        request.headers.get("user-agent").map(String::as_str),
        Some("accountapi-tests")
    );
    let sent: Value = serde_json::from_slice(&request.body).expect("request body should be json");
    assert_eq!(sent["data"]["organisation_id"], ORGANISATION_ID);
    assert_eq!(sent["data"]["attributes"]["name"][0], "Samantha Holder");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fetch_then_delete_uses_the_returned_version() {
    let server = MockServer::start(vec![
        MockResponse::new(200, account_envelope(2)),
        MockResponse::new(204, Vec::new()),
    ]);
    let client = client_for(&server);
    let context = CallContext::new();

    let fetched = client
        .fetch_account(&context, ACCOUNT_ID)
        .await
        .expect("fetch should succeed");
    client
        .delete_account(&context, &fetched.id, fetched.version.unwrap_or_default())
        .await
        .expect("delete should succeed");

    let requests = server.requests();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(
        requests[0].path,
        format!("/v1/organisation/accounts/{ACCOUNT_ID}")
    );
    assert_eq!(requests[1].method, "DELETE");
    assert_eq!(
        requests[1].path,
        format!("/v1/organisation/accounts/{ACCOUNT_ID}?version=2")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn decodes_gzip_response_and_advertises_gzip() {
    let server = MockServer::start(vec![
        MockResponse::new(200, gzip_bytes(account_envelope(5).as_bytes()))
            .header("Content-Encoding", "gzip"),
    ]);
    let client = client_for(&server);

    let fetched = client
        .fetch_account(&CallContext::new(), ACCOUNT_ID)
        .await
        .expect("gzip fetch should succeed");

    assert_eq!(fetched.version, Some(5));
    let requests = server.requests();
    assert_eq!(
        requests[0].headers.get("accept-encoding").map(String::as_str),
        Some("gzip")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn duplicate_create_reports_conflict_detail() {
    let server = MockServer::start(vec![MockResponse::new(
        409,
        r#"{"error_message":"Account cannot be created as it violates a duplicate constraint","error_code":"9f2c"}"#,
    )]);
    let client = client_for(&server);

    let error = client
        .create_account(&CallContext::new(), AccountData::default())
        .await
        .expect_err("duplicate create should fail");

    assert!(error.matches(&Error::Conflict(ApiErrorBody::new("", "9f2c"))));
    assert_eq!(server.served_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_account_is_not_found() {
    let server = MockServer::start(vec![MockResponse::new(
        404,
        r#"{"error_message":"record ad27e265 does not exist"}"#,
    )]);
    let client = client_for(&server);

    let error = client
        .fetch_account(&CallContext::new(), ACCOUNT_ID)
        .await
        .expect_err("missing account should fail");

    assert!(matches!(error, Error::NotFound));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_json_success_body_is_reported_with_body_preview() {
    let server = MockServer::start(vec![MockResponse::new(200, "<html>maintenance</html>")]);
    let client = client_for(&server);

    let error = client
        .fetch_account(&CallContext::new(), ACCOUNT_ID)
        .await
        .expect_err("html body should fail to decode");

    match error {
        Error::Deserialize { body, .. } => assert_eq!(body, "<html>maintenance</html>"),
        other => panic!("unexpected error variant: {other}"),
    }
}
