// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for response normalization

use scanview::LookupFailure;
use scanview::lookup::normalize::normalize;
use serde_json::json;

#[test]
fn test_payload_key_shape() {
    let body = json!({"data": [{"id": "a", "name": "x", "created": 100}]});
    let items = normalize(body).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].identifier, "a");
    assert_eq!(items[0].display_name, "x");
    assert!(items[0].captured_at.is_some());
}

#[test]
fn test_top_level_array_sorted_newest_first() {
    let body = json!([
        {"id": "a", "name": "x", "created": 100},
        {"id": "b", "name": "y", "created": 200},
    ]);
    let items = normalize(body).unwrap();
    let order: Vec<&str> = items.iter().map(|i| i.identifier.as_str()).collect();
    assert_eq!(order, vec!["b", "a"]);
}

#[test]
fn test_untimestamped_items_sort_last_in_arrival_order() {
    let body = json!([
        {"id": "n1", "name": "first untimestamped"},
        {"id": "t1", "name": "old", "created": 50},
        {"id": "n2", "name": "second untimestamped"},
        {"id": "t2", "name": "new", "created": 500},
    ]);
    let items = normalize(body).unwrap();
    let order: Vec<&str> = items.iter().map(|i| i.identifier.as_str()).collect();
    assert_eq!(order, vec!["t2", "t1", "n1", "n2"]);
}

#[test]
fn test_server_reported_failure() {
    let body = json!({"success": false, "message": "bad code"});
    assert_eq!(
        normalize(body),
        Err(LookupFailure::ServerReported("bad code".to_string()))
    );
}

#[test]
fn test_items_key_shape() {
    let body = json!({"items": [{"id": "a", "url": "https://x/a.jpg"}]});
    let items = normalize(body).unwrap();
    assert_eq!(items[0].image_locator, "https://x/a.jpg");
}

#[test]
fn test_images_key_shape() {
    let body = json!({"images": [{"name": "shelf.jpg", "url": "https://x/s.jpg"}]});
    let items = normalize(body).unwrap();
    // No id field: the name doubles as the identifier
    assert_eq!(items[0].identifier, "shelf.jpg");
}

#[test]
fn test_payload_key_beats_collection_key() {
    let body = json!({
        "images": [{"id": "from-images"}],
        "data": [{"id": "from-data"}],
    });
    let items = normalize(body).unwrap();
    assert_eq!(items[0].identifier, "from-data");
}

#[test]
fn test_item_without_identifier_dropped_softly() {
    let body = json!([
        {"url": "https://x/orphan.jpg"},
        {"id": "kept", "url": "https://x/kept.jpg"},
    ]);
    let items = normalize(body).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].identifier, "kept");
}

#[test]
fn test_empty_array_is_success() {
    assert_eq!(normalize(json!([])), Ok(Vec::new()));
    assert_eq!(normalize(json!({"data": []})), Ok(Vec::new()));
}

#[test]
fn test_unrecognized_object_shape() {
    let body = json!({"count": 3});
    assert_eq!(normalize(body), Err(LookupFailure::UnrecognizedShape));
}
