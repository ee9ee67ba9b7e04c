//! Wire-format key normalization.
//!
//! Terraform Cloud returns JSON:API attribute bags with kebab-case keys
//! (`"session-timeout"`, `"vcs-repo"`). Consumers work with camelCase keys, so
//! every attribute bag is passed through [`normalize_keys`] before it is
//! exposed. The transformation is pure and structure-preserving: only object
//! keys change, values and array/object shape stay exactly as received.

use serde_json::{Map, Value};

/// Convert a kebab-case or snake_case key to camelCase.
///
/// Keys without separators pass through untouched, so already-normalized
/// input is a fixed point.
fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;

    for ch in key.chars() {
        match ch {
            '-' | '_' => upper_next = true,
            _ if upper_next => {
                out.extend(ch.to_uppercase());
                upper_next = false;
            }
            _ => out.push(ch),
        }
    }

    out
}

/// Recursively normalize all object keys in a JSON value tree.
#[must_use]
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut normalized = Map::with_capacity(map.len());
            for (key, val) in map {
                normalized.insert(camel_case(&key), normalize_keys(val));
            }
            Value::Object(normalized)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// Normalize the keys of an attribute map in place.
#[must_use]
pub fn normalize_map(map: Map<String, Value>) -> Map<String, Value> {
    match normalize_keys(Value::Object(map)) {
        Value::Object(normalized) => normalized,
        _ => unreachable!("normalizing an object always yields an object"),
    }
}
