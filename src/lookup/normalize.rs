// SPDX-License-Identifier: GPL-3.0-only

//! Response shape normalization
//!
//! The photo service has been observed returning the item list as a bare
//! array, wrapped under a payload key, or wrapped under a collection key,
//! and failures either as a `success` flag or a bare message field. These
//! shapes form a closed set matched in a fixed precedence order; an
//! ambiguous body (say, an array *and* a failure flag) is resolved by that
//! order, never by whichever field happens to be seen first. Array wins.

use super::LookupResultItem;
use crate::errors::LookupFailure;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Keys that may wrap the item array, checked in this order
const PAYLOAD_KEYS: [&str; 2] = ["data", "payload"];
const COLLECTION_KEYS: [&str; 2] = ["images", "items"];

/// Keys that may hold an item's identifier, checked in this order
const IDENTIFIER_KEYS: [&str; 3] = ["id", "identifier", "name"];
const NAME_KEYS: [&str; 2] = ["name", "title"];
const LOCATOR_KEYS: [&str; 3] = ["url", "image", "thumbnail"];
const TIMESTAMP_KEYS: [&str; 4] = ["created", "createdAt", "capturedAt", "timestamp"];

/// Normalize a parsed response body into the canonical item list
pub fn normalize(body: Value) -> Result<Vec<LookupResultItem>, LookupFailure> {
    let raw_items = extract_items(body)?;

    let mut items = Vec::with_capacity(raw_items.len());
    let mut seen = HashSet::new();
    for (index, raw) in raw_items.iter().enumerate() {
        let Some(item) = coerce_item(raw) else {
            warn!(index, "Dropping item without a usable identifier");
            continue;
        };
        // The identifier is the rendering key; a response that repeats one
        // keeps only its first occurrence
        if !seen.insert(item.identifier.clone()) {
            debug!(identifier = %item.identifier, "Dropping duplicate identifier");
            continue;
        }
        items.push(item);
    }

    sort_items(&mut items);
    Ok(items)
}

/// Apply the shape precedence and return the raw item array
fn extract_items(body: Value) -> Result<Vec<Value>, LookupFailure> {
    let map = match body {
        Value::Array(items) => return Ok(items),
        Value::Object(map) => map,
        _ => return Err(LookupFailure::UnrecognizedShape),
    };

    for key in PAYLOAD_KEYS.iter().chain(COLLECTION_KEYS.iter()) {
        if let Some(Value::Array(items)) = map.get(*key) {
            return Ok(items.clone());
        }
    }

    if let Some(message) = reported_failure(&map) {
        return Err(LookupFailure::ServerReported(message));
    }

    Err(LookupFailure::UnrecognizedShape)
}

/// An explicit failure flag or message field, when the body carries one
fn reported_failure(map: &Map<String, Value>) -> Option<String> {
    let message = || {
        string_field(map, "message")
            .or_else(|| string_field(map, "error"))
            .unwrap_or_else(|| "lookup failed".to_string())
    };

    match map.get("success") {
        Some(Value::Bool(false)) => return Some(message()),
        Some(Value::Bool(true)) => return None,
        _ => {}
    }
    string_field(map, "error")
        .or_else(|| string_field(map, "message"))
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Coerce one raw item; None when no identifier can be found
fn coerce_item(raw: &Value) -> Option<LookupResultItem> {
    let map = raw.as_object()?;

    let identifier = first_scalar(map, &IDENTIFIER_KEYS)?;
    let display_name = first_scalar(map, &NAME_KEYS).unwrap_or_else(|| identifier.clone());
    let image_locator = first_scalar(map, &LOCATOR_KEYS).unwrap_or_else(|| identifier.clone());
    let captured_at = first_timestamp(map, &TIMESTAMP_KEYS);

    Some(LookupResultItem {
        identifier,
        display_name,
        image_locator,
        captured_at,
    })
}

/// First non-empty string (or number, stringified) under the given keys
fn first_scalar(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    for key in keys {
        match map.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// First numeric epoch-millisecond timestamp under the given keys
fn first_timestamp(map: &Map<String, Value>, keys: &[&str]) -> Option<DateTime<Utc>> {
    for key in keys {
        if let Some(Value::Number(n)) = map.get(*key)
            && let Some(millis) = n.as_i64()
        {
            return Utc.timestamp_millis_opt(millis).single();
        }
    }
    None
}

/// Newest first; items without a timestamp keep arrival order at the end
fn sort_items(items: &mut [LookupResultItem]) {
    items.sort_by(|a, b| match (a.captured_at, b.captured_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_array_wins_over_failure_flag() {
        // Ambiguous body: precedence says the array is authoritative
        let body = json!({
            "success": false,
            "message": "ignored",
            "data": [{"id": "a", "name": "x"}]
        });
        let items = normalize(body).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].identifier, "a");
    }

    #[test]
    fn test_numeric_identifier_stringified() {
        let body = json!([{"id": 7, "name": "x"}]);
        let items = normalize(body).unwrap();
        assert_eq!(items[0].identifier, "7");
    }

    #[test]
    fn test_duplicate_identifiers_keep_first() {
        let body = json!([
            {"id": "a", "name": "first"},
            {"id": "a", "name": "second"},
        ]);
        let items = normalize(body).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].display_name, "first");
    }

    #[test]
    fn test_locator_falls_back_to_identifier() {
        let body = json!([{"id": "img-9"}]);
        let items = normalize(body).unwrap();
        assert_eq!(items[0].image_locator, "img-9");
    }

    #[test]
    fn test_scalar_body_unrecognized() {
        assert_eq!(
            normalize(json!("nope")),
            Err(LookupFailure::UnrecognizedShape)
        );
        assert_eq!(normalize(json!(42)), Err(LookupFailure::UnrecognizedShape));
    }

    #[test]
    fn test_bare_error_field_reported() {
        assert_eq!(
            normalize(json!({"error": "no such barcode"})),
            Err(LookupFailure::ServerReported("no such barcode".to_string()))
        );
    }

    #[test]
    fn test_success_true_without_items_unrecognized() {
        assert_eq!(
            normalize(json!({"success": true})),
            Err(LookupFailure::UnrecognizedShape)
        );
    }
}
