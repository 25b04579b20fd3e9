// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the lookup client against a local HTTP stub

mod common;

use scanview::{BarcodeValue, LookupClient, LookupFailure};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

fn barcode() -> BarcodeValue {
    BarcodeValue::new("4006381333931").unwrap()
}

#[tokio::test]
async fn test_successful_lookup_normalizes_and_sorts() {
    let body = r#"[
        {"id": "a", "name": "x", "url": "https://x/a.jpg", "created": 100},
        {"id": "b", "name": "y", "url": "https://x/b.jpg", "created": 200}
    ]"#;
    let url = common::serve_once("200 OK", body.to_string()).await;

    let client = LookupClient::new(url, None, TIMEOUT).unwrap();
    let items = client.lookup(&barcode()).await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].identifier, "b");
    assert_eq!(items[1].identifier, "a");
}

#[tokio::test]
async fn test_empty_result_is_ok_not_error() {
    let url = common::serve_once("200 OK", "[]".to_string()).await;
    let client = LookupClient::new(url, None, TIMEOUT).unwrap();
    assert_eq!(client.lookup(&barcode()).await, Ok(Vec::new()));
}

#[tokio::test]
async fn test_non_success_status_is_transport_failure() {
    let url = common::serve_once("502 Bad Gateway", "oops".to_string()).await;
    let client = LookupClient::new(url, None, TIMEOUT).unwrap();

    match client.lookup(&barcode()).await {
        Err(LookupFailure::Transport { status, .. }) => assert_eq!(status, Some(502)),
        other => panic!("expected transport failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let url = common::serve_once("200 OK", "<html>not json</html>".to_string()).await;
    let client = LookupClient::new(url, None, TIMEOUT).unwrap();

    assert!(matches!(
        client.lookup(&barcode()).await,
        Err(LookupFailure::MalformedBody(_))
    ));
}

#[tokio::test]
async fn test_server_reported_failure_body() {
    let body = r#"{"success": false, "message": "bad code"}"#;
    let url = common::serve_once("200 OK", body.to_string()).await;
    let client = LookupClient::new(url, None, TIMEOUT).unwrap();

    assert_eq!(
        client.lookup(&barcode()).await,
        Err(LookupFailure::ServerReported("bad code".to_string()))
    );
}

#[tokio::test]
async fn test_connection_refused_is_transport_failure() {
    // Port 9 (discard) is not listening
    let client = LookupClient::new("http://127.0.0.1:9/lookup", None, TIMEOUT).unwrap();
    assert!(matches!(
        client.lookup(&barcode()).await,
        Err(LookupFailure::Transport { .. })
    ));
}
