//! Dotted path parsing, multi-result resolution, and structural deletion.
//!
//! A path is a `.`-separated list of keys. A key suffixed with `[]` fans out
//! over the array stored under it; a bare `[]` fans out over the current
//! value. There is no escaping, so keys containing `.` cannot be addressed.

use serde_json::{Map, Value};

/// Marker that turns a path token into an array wildcard.
pub const WILDCARD: &str = "[]";

/// One addressing step of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `[]`: the current value must be an array; continue into every element.
    Each,
    /// `key`: the current value must be an object; continue into `key`.
    Key(String),
    /// `key[]`: continue into every element of the array under `key`.
    KeyEach(String),
}

impl Segment {
    pub fn key(&self) -> Option<&str> {
        match self {
            Segment::Each => None,
            Segment::Key(k) | Segment::KeyEach(k) => Some(k),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        !matches!(self, Segment::Key(_))
    }
}

/// Split a path into segments. The empty path is the identity path.
pub fn parse_path(path: &str) -> Vec<Segment> {
    if path.is_empty() {
        return Vec::new();
    }
    path.split('.')
        .map(|raw| {
            if raw == WILDCARD {
                Segment::Each
            } else if let Some(key) = raw.strip_suffix(WILDCARD) {
                Segment::KeyEach(key.to_string())
            } else {
                Segment::Key(raw.to_string())
            }
        })
        .collect()
}

/// Resolve `segments` against `value`, returning every match in traversal order.
///
/// Missing keys and shape mismatches contribute nothing; resolution never fails.
pub fn resolve_path<'a>(value: &'a Value, segments: &[Segment]) -> Vec<&'a Value> {
    let mut results = Vec::new();
    collect(value, segments, &mut results);
    results
}

fn collect<'a>(current: &'a Value, segments: &[Segment], out: &mut Vec<&'a Value>) {
    let Some((segment, rest)) = segments.split_first() else {
        out.push(current);
        return;
    };

    match (segment, current) {
        (Segment::Each, Value::Array(items)) => {
            for item in items {
                collect(item, rest, out);
            }
        }
        (Segment::Key(key), Value::Object(map)) => {
            if let Some(next) = map.get(key) {
                collect(next, rest, out);
            }
        }
        (Segment::KeyEach(key), Value::Object(map)) => {
            if let Some(Value::Array(items)) = map.get(key) {
                for item in items {
                    collect(item, rest, out);
                }
            }
        }
        _ => {}
    }
}

/// Parse `path` and resolve it against `value`.
pub fn collect_values_at_path<'a>(value: &'a Value, path: &str) -> Vec<&'a Value> {
    resolve_path(value, &parse_path(path))
}

/// Resolve `path` to a single value: `None` for no match, the value itself
/// for exactly one match, an array of all matches otherwise.
pub fn pick_at_path(value: &Value, path: &str) -> Option<Value> {
    let mut values = collect_values_at_path(value, path);
    match values.len() {
        0 => None,
        1 => values.pop().cloned(),
        _ => Some(Value::Array(values.into_iter().cloned().collect())),
    }
}

/// Return a copy of `value` with the location(s) addressed by `path` removed.
pub fn delete_at_path(value: &Value, path: &str) -> Value {
    delete_segments(value, &parse_path(path))
}

/// Structural delete. Every object and array on the way to the deletion
/// point is rebuilt; `value` itself is never modified. A path that does not
/// resolve yields an equal copy.
pub fn delete_segments(value: &Value, segments: &[Segment]) -> Value {
    let Some((segment, rest)) = segments.split_first() else {
        return value.clone();
    };

    match (segment, value) {
        (Segment::Each, Value::Array(items)) => {
            Value::Array(items.iter().map(|item| delete_segments(item, rest)).collect())
        }
        (Segment::Key(key), Value::Object(map)) if rest.is_empty() => Value::Object(
            map.iter()
                .filter(|(k, _)| *k != key)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        (Segment::Key(key), Value::Object(map)) => {
            rebuild_entry(map, key, |next| delete_segments(next, rest))
        }
        (Segment::KeyEach(key), Value::Object(map)) => rebuild_entry(map, key, |next| match next {
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| delete_segments(item, rest)).collect())
            }
            other => other.clone(),
        }),
        _ => value.clone(),
    }
}

/// Copy `map`, replacing the entry under `key` (if present) with `f(entry)`.
fn rebuild_entry(map: &Map<String, Value>, key: &str, f: impl Fn(&Value) -> Value) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| {
                let v = if k == key { f(v) } else { v.clone() };
                (k.clone(), v)
            })
            .collect(),
    )
}

/// Return a copy of `value` with every object entry named `key` removed, at
/// any depth.
pub fn delete_key_anywhere(value: &Value, key: &str) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| delete_key_anywhere(item, key))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| *k != key)
                .map(|(k, v)| (k.clone(), delete_key_anywhere(v, key)))
                .collect(),
        ),
        other => other.clone(),
    }
}
