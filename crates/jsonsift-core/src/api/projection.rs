//! Projection: keep or drop fields of the elements that survived filtering.
//!
//! Drop mode supports full paths and recursive key removal. Keep mode only
//! selects top-level fields: exact rules with a `.` or `[]` in them are
//! skipped, and key-anywhere rules are looked up as ordinary paths and
//! written under their literal text.

use serde_json::{Map, Value};

use super::path::{WILDCARD, collect_values_at_path, delete_at_path, delete_key_anywhere};
use crate::types::{FilterProjection, ProjectionMatchMode, ProjectionMode, ProjectionRule};

/// Apply a projection to `root`. Array roots are projected per element.
/// With no rules the value is returned unchanged.
pub fn apply_projection(root: &Value, projection: &FilterProjection) -> Value {
    let rules = &projection.rules;
    if rules.is_empty() {
        return root.clone();
    }

    let project = |item: &Value| match projection.mode {
        ProjectionMode::Drop => drop_fields(item, rules),
        ProjectionMode::Keep => keep_fields(item, rules),
    };

    match root {
        Value::Array(items) => Value::Array(items.iter().map(project).collect()),
        other => project(other),
    }
}

/// Fold the rules over `value`, each one removing its target.
fn drop_fields(value: &Value, rules: &[ProjectionRule]) -> Value {
    let mut current = value.clone();
    for rule in rules {
        current = match rule.match_mode {
            ProjectionMatchMode::Exact => delete_at_path(&current, &rule.path),
            ProjectionMatchMode::KeyAnywhere => delete_key_anywhere(&current, &rule.path),
        };
    }
    current
}

/// Build a fresh object holding only the selected top-level fields.
fn keep_fields(value: &Value, rules: &[ProjectionRule]) -> Value {
    let mut out = Map::new();
    for rule in rules {
        if rule.match_mode == ProjectionMatchMode::Exact && is_nested_path(&rule.path) {
            continue;
        }
        if let Some(first) = collect_values_at_path(value, &rule.path).first() {
            out.insert(rule.path.clone(), (*first).clone());
        }
    }
    Value::Object(out)
}

fn is_nested_path(path: &str) -> bool {
    path.contains('.') || path.contains(WILDCARD)
}
