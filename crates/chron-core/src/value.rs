//! Dot-path lookups over JSON values.
//!
//! Properties, context, and entity attributes are all `serde_json` values.
//! Nested data is addressed with dotted paths (`changes.old.status`); numeric
//! segments index into arrays (`tags.0`).

use serde_json::{Map, Value};

/// Walk `value` along a dotted `path`.
///
/// An empty path returns `value` itself. Returns `None` as soon as a segment
/// does not exist.
#[must_use]
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Walk a map along a dotted `path`. The first segment selects a key.
#[must_use]
pub fn get_map_path<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, rest),
        None => (path, ""),
    };
    map.get(head).and_then(|value| get_path(value, rest))
}

/// Render a value for human-readable output.
///
/// Strings are emitted without quotes, `null` as the empty string, and
/// arrays/objects as compact JSON.
#[must_use]
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
