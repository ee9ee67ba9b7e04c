//! Retry-policy behavior against a mock server.
//!
//! Permanent statuses must short-circuit after a single transport call;
//! transient statuses are retried with backoff until attempts run out, with
//! the observer told about each failure that will be retried.

mod common;

use std::sync::{Arc, Mutex};

use common::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tfc_connector::{
    ApiClient, ApiRequest, RetryConfig, RetryEvent, TfcConfig, TfcCredentials, TfcError,
};

fn client_with_observer(
    server: &MockServer,
    max_attempts: u32,
) -> (ApiClient, Arc<Mutex<Vec<RetryEvent>>>) {
    let events: Arc<Mutex<Vec<RetryEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);

    let config = TfcConfig::default()
        .with_base_url(server.uri())
        .with_retry(RetryConfig {
            max_attempts,
            ..RetryConfig::for_testing()
        });

    let client = ApiClient::new(config, TfcCredentials::new(TEST_TOKEN))
        .unwrap()
        .with_retry_observer(Arc::new(move |event: &RetryEvent| {
            sink.lock().unwrap().push(event.clone());
        }));

    (client, events)
}

/// A 404 is permanent: exactly one transport call, no observer invocations.
#[tokio::test]
async fn permanent_status_short_circuits() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let (client, events) = client_with_observer(&server, 5);
    let err = client
        .request(&ApiRequest::get("/api/v2/organizations/missing"))
        .await
        .unwrap_err();

    match err {
        TfcError::Api { status, .. } => assert_eq!(status, 404),
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(err.is_permanent());
    assert!(events.lock().unwrap().is_empty());
}

/// A persistent 500 is retried until attempts are exhausted; the observer
/// sees one event per retried failure with decrementing attempts_remaining.
#[tokio::test]
async fn transient_status_exhausts_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/organizations"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let (client, events) = client_with_observer(&server, 3);
    let err = client
        .send(&ApiRequest::get("/api/v2/organizations"))
        .await
        .unwrap_err();

    match &err {
        TfcError::Api { status, .. } => assert_eq!(*status, 500),
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(err.is_transient());

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 2, "no observer call for the final failure");
    assert_eq!(events[0].attempt, 1);
    assert_eq!(events[0].attempts_remaining, 2);
    assert_eq!(events[1].attempt, 2);
    assert_eq!(events[1].attempts_remaining, 1);
    assert!(events.iter().all(|e| e.error_code == "API_TRANSIENT"));
    assert!(events[0].url.contains("/api/v2/organizations"));
}

/// Transient failures followed by success recover before attempts run out.
#[tokio::test]
async fn recovers_after_transient_failures() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/acme"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/acme"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": organization("acme")})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, events) = client_with_observer(&server, 5);
    let record = client
        .request(&ApiRequest::get("/api/v2/organizations/acme"))
        .await
        .unwrap();

    assert_eq!(record.attr_str("name"), Some("acme"));
    assert_eq!(events.lock().unwrap().len(), 2);
}

/// Structured sub-errors from the JSON:API error body are surfaced.
#[tokio::test]
async fn error_body_details_are_mirrored() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/forbidden"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "errors": [{
                "status": "403",
                "title": "forbidden",
                "detail": "insufficient permissions",
                "source": {"pointer": "/data"}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _events) = client_with_observer(&server, 3);
    let err = client
        .request(&ApiRequest::get("/api/v2/organizations/forbidden"))
        .await
        .unwrap_err();

    match err {
        TfcError::Api { status, errors, .. } => {
            assert_eq!(status, 403);
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].title.as_deref(), Some("forbidden"));
            assert_eq!(errors[0].detail.as_deref(), Some("insufficient permissions"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

/// An error body that is not JSON is tolerated: classification still happens,
/// just without structured details.
#[tokio::test]
async fn unparseable_error_body_is_tolerated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/broken"))
        .respond_with(ResponseTemplate::new(400).set_body_string("<html>bad request</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _events) = client_with_observer(&server, 3);
    let err = client
        .request(&ApiRequest::get("/api/v2/organizations/broken"))
        .await
        .unwrap_err();

    match err {
        TfcError::Api { status, errors, .. } => {
            assert_eq!(status, 400);
            assert!(errors.is_empty());
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}
