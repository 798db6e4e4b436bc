//! Condition evaluation and array filtering.
//!
//! Conditions are evaluated against one element at a time. A condition path
//! may fan out over wildcards, and the condition holds if *any* resolved
//! value satisfies it. All conditions in a spec are AND-combined.

use std::cmp::Ordering;

use serde_json::Value;
use tracing::debug;

use super::engine::FilterOutcome;
use super::path::{parse_path, resolve_path};
use crate::error::{EvalError, FilterError, FilterErrorKind};
use crate::types::{ComparisonOperator, FilterCondition};

/// Maximum number of segments in a condition path. Far deeper than any
/// document `serde_json` will parse, so only runaway paths hit it.
pub const MAX_PATH_DEPTH: usize = 4096;

/// Evaluate one condition against a single element.
///
/// `exists` holds when the path resolves to anything, including objects and
/// arrays. Every other operator narrows resolved values to primitives first
/// and holds when at least one of them satisfies the comparison.
pub fn evaluate_condition(element: &Value, condition: &FilterCondition) -> Result<bool, EvalError> {
    let segments = parse_path(&condition.path);
    if segments.len() > MAX_PATH_DEPTH {
        return Err(EvalError::PathTooDeep {
            max: MAX_PATH_DEPTH,
            actual: segments.len(),
        });
    }

    let candidates = resolve_path(element, &segments);

    if condition.operator == ComparisonOperator::Exists {
        return Ok(!candidates.is_empty());
    }

    // A null operand is the same as no operand.
    let operand = condition
        .value
        .as_ref()
        .filter(|v| !v.is_null())
        .and_then(to_comparable);
    Ok(candidates
        .into_iter()
        .filter_map(to_comparable)
        .any(|left| compare(left, condition.operator, operand)))
}

/// Narrow a value to something comparable. Objects and arrays have no
/// primitive form.
pub fn to_comparable(value: &Value) -> Option<&Value> {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Some(value),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Apply `op` to a defined primitive and an optional operand.
///
/// An absent operand never equals anything and is never ordered.
pub fn compare(left: &Value, op: ComparisonOperator, right: Option<&Value>) -> bool {
    let ordering = right.and_then(|r| compare_values(left, r));
    match op {
        ComparisonOperator::Exists => true,
        ComparisonOperator::Eq => ordering == Some(Ordering::Equal),
        ComparisonOperator::Ne => ordering != Some(Ordering::Equal),
        ComparisonOperator::Gt => ordering == Some(Ordering::Greater),
        ComparisonOperator::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        ComparisonOperator::Lt => ordering == Some(Ordering::Less),
        ComparisonOperator::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        ComparisonOperator::Contains => match (left, right) {
            (Value::String(haystack), Some(Value::String(needle))) => {
                haystack.contains(needle.as_str())
            }
            _ => false,
        },
    }
}

/// Compare two JSON values, returning an ordering if the types are comparable.
///
/// - Numbers: compared as f64
/// - Strings: compared lexicographically
/// - Booleans: false < true
/// - Null == Null
/// - Mismatched types: returns `None`
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Number(a), Value::Number(b)) => {
            let fa = a.as_f64()?;
            let fb = b.as_f64()?;
            fa.partial_cmp(&fb)
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Filter `root` by AND-combined conditions.
///
/// Array roots keep the elements that pass every condition, and surviving
/// elements that are themselves arrays are filtered the same way. A non-array
/// root is returned unchanged when it passes and replaced by `null` when it
/// does not. Evaluation failures are recorded and count as a failed condition.
pub fn apply_conditions(root: &Value, conditions: &[FilterCondition]) -> FilterOutcome {
    let mut errors = Vec::new();
    if conditions.is_empty() {
        return FilterOutcome {
            value: root.clone(),
            errors,
        };
    }

    let value = filter_node(root, conditions, &mut errors);
    FilterOutcome { value, errors }
}

fn filter_node(node: &Value, conditions: &[FilterCondition], errors: &mut Vec<FilterError>) -> Value {
    match node {
        Value::Array(items) => {
            let mut kept = Vec::new();
            for item in items {
                if !passes_all(item, conditions, errors) {
                    continue;
                }
                // Non-array survivors would pass again unchanged.
                kept.push(match item {
                    Value::Array(_) => filter_node(item, conditions, errors),
                    other => other.clone(),
                });
            }
            Value::Array(kept)
        }
        other => {
            if passes_all(other, conditions, errors) {
                other.clone()
            } else {
                Value::Null
            }
        }
    }
}

fn passes_all(element: &Value, conditions: &[FilterCondition], errors: &mut Vec<FilterError>) -> bool {
    conditions.iter().all(|condition| match evaluate_condition(element, condition) {
        Ok(passed) => passed,
        Err(e) => {
            debug!(path = %condition.path, error = %e, "condition evaluation failed");
            errors.push(
                FilterError::new(FilterErrorKind::Unknown, e.to_string())
                    .with_path(condition.path.clone()),
            );
            false
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_doc() -> Value {
        json!({
            "id": "user123",
            "name": "Alice",
            "age": 30,
            "active": true,
            "score": 95.5,
            "address": {
                "city": "Portland",
                "state": "OR",
                "zip": "97201"
            },
            "orders": [
                {"total": 12.5, "status": "shipped"},
                {"total": 80, "status": "pending"}
            ],
            "metadata": null
        })
    }

    fn eval(doc: &Value, cond: FilterCondition) -> bool {
        evaluate_condition(doc, &cond).unwrap()
    }

    // -----------------------------------------------------------------------
    // Equality
    // -----------------------------------------------------------------------

    #[test]
    fn test_condition_eq_string() {
        let doc = sample_doc();
        assert!(eval(&doc, FilterCondition::eq("name", "Alice")));
        assert!(!eval(&doc, FilterCondition::eq("name", "Bob")));
    }

    #[test]
    fn test_condition_eq_number_ignores_representation() {
        let doc = sample_doc();
        assert!(eval(&doc, FilterCondition::eq("age", 30)));
        assert!(eval(&doc, FilterCondition::eq("age", 30.0)));
        assert!(!eval(&doc, FilterCondition::eq("age", 25)));
    }

    #[test]
    fn test_condition_eq_boolean() {
        let doc = sample_doc();
        assert!(eval(&doc, FilterCondition::eq("active", true)));
        assert!(!eval(&doc, FilterCondition::eq("active", false)));
    }

    #[test]
    fn test_condition_ne() {
        let doc = sample_doc();
        assert!(eval(&doc, FilterCondition::ne("name", "Bob")));
        assert!(!eval(&doc, FilterCondition::ne("name", "Alice")));
        // Mismatched types are never equal.
        assert!(eval(&doc, FilterCondition::ne("age", "30")));
    }

    #[test]
    fn test_condition_eq_mismatched_types() {
        let doc = sample_doc();
        assert!(!eval(&doc, FilterCondition::eq("age", "30")));
        assert!(!eval(&doc, FilterCondition::eq("active", 1)));
    }

    // -----------------------------------------------------------------------
    // Ordering
    // -----------------------------------------------------------------------

    #[test]
    fn test_condition_ordering_numbers() {
        let doc = sample_doc();
        assert!(eval(&doc, FilterCondition::gt("age", 20)));
        assert!(!eval(&doc, FilterCondition::gt("age", 30)));
        assert!(eval(&doc, FilterCondition::ge("age", 30)));
        assert!(!eval(&doc, FilterCondition::ge("age", 31)));
        assert!(eval(&doc, FilterCondition::lt("age", 40)));
        assert!(!eval(&doc, FilterCondition::lt("age", 30)));
        assert!(eval(&doc, FilterCondition::le("age", 30)));
        assert!(!eval(&doc, FilterCondition::le("age", 29)));
    }

    #[test]
    fn test_condition_ordering_strings() {
        let doc = sample_doc();
        assert!(eval(&doc, FilterCondition::lt("name", "Bob")));
        assert!(!eval(&doc, FilterCondition::gt("name", "Bob")));
    }

    #[test]
    fn test_condition_ordering_float() {
        let doc = sample_doc();
        assert!(eval(&doc, FilterCondition::gt("score", 90.0)));
        assert!(!eval(&doc, FilterCondition::lt("score", 90)));
    }

    #[test]
    fn test_condition_ordering_type_mismatch_is_false() {
        let doc = sample_doc();
        assert!(!eval(&doc, FilterCondition::lt("name", 42)));
        assert!(!eval(&doc, FilterCondition::gt("name", 42)));
        assert!(!eval(&doc, FilterCondition::ge("age", "30")));
    }

    #[test]
    fn test_condition_absent_operand() {
        let doc = sample_doc();
        let cond = FilterCondition::new("age", ComparisonOperator::Gt, None);
        assert!(!eval(&doc, cond));
        let cond = FilterCondition::new("age", ComparisonOperator::Eq, None);
        assert!(!eval(&doc, cond));
        let cond = FilterCondition::new("age", ComparisonOperator::Ne, None);
        assert!(eval(&doc, cond));
    }

    #[test]
    fn test_condition_null_operand_is_absent() {
        let doc = sample_doc();
        let cond = FilterCondition::new("metadata", ComparisonOperator::Eq, Some(Value::Null));
        assert!(!eval(&doc, cond));
        let cond = FilterCondition::new("metadata", ComparisonOperator::Ne, Some(Value::Null));
        assert!(eval(&doc, cond));
    }

    #[test]
    fn test_condition_non_primitive_operand_is_absent() {
        let doc = sample_doc();
        let cond = FilterCondition::new("age", ComparisonOperator::Eq, Some(json!([30])));
        assert!(!eval(&doc, cond));
    }

    // -----------------------------------------------------------------------
    // Contains / exists
    // -----------------------------------------------------------------------

    #[test]
    fn test_condition_contains() {
        let doc = sample_doc();
        assert!(eval(&doc, FilterCondition::contains("name", "lic")));
        assert!(!eval(&doc, FilterCondition::contains("name", "xyz")));
        // Only defined for strings.
        assert!(!eval(&doc, FilterCondition::contains("age", "3")));
        let cond = FilterCondition::new("name", ComparisonOperator::Contains, Some(json!(1)));
        assert!(!eval(&doc, cond));
    }

    #[test]
    fn test_condition_exists() {
        let doc = sample_doc();
        assert!(eval(&doc, FilterCondition::exists("name")));
        assert!(eval(&doc, FilterCondition::exists("address")));
        assert!(eval(&doc, FilterCondition::exists("orders")));
        assert!(!eval(&doc, FilterCondition::exists("nonexistent")));
        assert!(!eval(&doc, FilterCondition::exists("address.country")));
    }

    #[test]
    fn test_condition_exists_counts_null_values() {
        // A key holding null still resolves.
        let doc = sample_doc();
        assert!(eval(&doc, FilterCondition::exists("metadata")));
    }

    #[test]
    fn test_condition_missing_path_is_false() {
        let doc = sample_doc();
        assert!(!eval(&doc, FilterCondition::eq("nonexistent", "x")));
        assert!(!eval(&doc, FilterCondition::ne("nonexistent", "x")));
        assert!(!eval(&doc, FilterCondition::contains("nonexistent", "x")));
    }

    #[test]
    fn test_condition_object_value_not_comparable() {
        let doc = sample_doc();
        assert!(!eval(&doc, FilterCondition::ne("address", "x")));
    }

    // -----------------------------------------------------------------------
    // Wildcards
    // -----------------------------------------------------------------------

    #[test]
    fn test_condition_wildcard_is_existential() {
        let doc = sample_doc();
        assert!(eval(&doc, FilterCondition::gt("orders[].total", 50)));
        assert!(!eval(&doc, FilterCondition::gt("orders[].total", 100)));
        assert!(eval(&doc, FilterCondition::eq("orders[].status", "pending")));
        assert!(eval(&doc, FilterCondition::exists("orders[].status")));
        assert!(!eval(&doc, FilterCondition::exists("orders[].missing")));
    }

    #[test]
    fn test_condition_nested_attr() {
        let doc = sample_doc();
        assert!(eval(&doc, FilterCondition::eq("address.city", "Portland")));
        assert!(!eval(&doc, FilterCondition::eq("address.country", "US")));
    }

    #[test]
    fn test_condition_path_too_deep() {
        let doc = sample_doc();
        let path = vec!["a"; MAX_PATH_DEPTH + 1].join(".");
        let err = evaluate_condition(&doc, &FilterCondition::exists(path)).unwrap_err();
        assert!(matches!(
            err,
            EvalError::PathTooDeep { actual, .. } if actual == MAX_PATH_DEPTH + 1
        ));
    }

    #[test]
    fn test_condition_long_path_on_deep_document() {
        let mut doc = json!({"leaf": 7});
        for _ in 0..65 {
            doc = json!({ "a": doc });
        }
        let path = format!("{}.leaf", vec!["a"; 65].join("."));
        assert!(eval(&doc, FilterCondition::eq(path.clone(), 7)));
        assert!(eval(&doc, FilterCondition::exists(path)));
    }

    // -----------------------------------------------------------------------
    // apply_conditions
    // -----------------------------------------------------------------------

    fn priced() -> Value {
        json!([
            {"id": 1, "price": 5, "category": "a"},
            {"id": 2, "price": 15, "category": "b"},
            {"id": 3, "price": 25, "category": "a"}
        ])
    }

    fn ids(value: &Value) -> Vec<i64> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["id"].as_i64().unwrap())
            .collect()
    }

    #[test]
    fn test_apply_empty_conditions_is_identity() {
        let data = priced();
        let out = apply_conditions(&data, &[]);
        assert_eq!(out.value, data);
        assert!(out.errors.is_empty());
    }

    #[test]
    fn test_apply_numeric_condition() {
        let out = apply_conditions(&priced(), &[FilterCondition::gt("price", 10)]);
        assert!(out.errors.is_empty());
        assert_eq!(ids(&out.value), vec![2, 3]);
    }

    #[test]
    fn test_apply_and_conditions() {
        let out = apply_conditions(
            &priced(),
            &[FilterCondition::gt("price", 10), FilterCondition::eq("category", "a")],
        );
        assert_eq!(ids(&out.value), vec![3]);
    }

    #[test]
    fn test_apply_exists_on_non_primitives() {
        let data = json!([
            {"id": 1, "meta": {"nested": true}},
            {"id": 2},
            {"id": 3, "meta": []}
        ]);
        let out = apply_conditions(&data, &[FilterCondition::exists("meta")]);
        assert_eq!(ids(&out.value), vec![1, 3]);
    }

    #[test]
    fn test_apply_non_array_root() {
        let doc = sample_doc();
        let out = apply_conditions(&doc, &[FilterCondition::eq("name", "Alice")]);
        assert_eq!(out.value, doc);

        let out = apply_conditions(&doc, &[FilterCondition::eq("name", "Bob")]);
        assert_eq!(out.value, Value::Null);
        assert!(out.errors.is_empty());
    }

    #[test]
    fn test_apply_nested_arrays_refiltered() {
        let data = json!([[{"v": 1}, {"v": 5}], {"v": 7}, {"v": 0}]);
        let cond = FilterCondition::new("", ComparisonOperator::Exists, None);
        // Empty path exists everywhere; nested array survives untouched.
        let out = apply_conditions(&data, &[cond]);
        assert_eq!(out.value, data);

        // `[].v` passes for the inner array (it holds v > 2); the inner array
        // is then filtered by the same condition, where `[].v` no longer
        // resolves against objects.
        let out = apply_conditions(&data, &[FilterCondition::gt("[].v", 2)]);
        assert_eq!(out.value, json!([[]]));
    }

    #[test]
    fn test_apply_is_idempotent() {
        let conds = [FilterCondition::gt("price", 10)];
        let once = apply_conditions(&priced(), &conds).value;
        let twice = apply_conditions(&once, &conds).value;
        assert_eq!(once, twice);
    }

    #[test]
    fn test_apply_records_errors_and_fails_closed() {
        let deep = vec!["x"; MAX_PATH_DEPTH + 1].join(".");
        let out = apply_conditions(
            &priced(),
            &[FilterCondition::exists("id"), FilterCondition::exists(deep.clone())],
        );
        assert_eq!(out.value, json!([]));
        assert_eq!(out.errors.len(), 3);
        assert!(out.errors.iter().all(|e| e.kind == FilterErrorKind::Unknown));
        assert_eq!(out.errors[0].path.as_deref(), Some(deep.as_str()));
    }

    // -----------------------------------------------------------------------
    // compare_values
    // -----------------------------------------------------------------------

    #[test]
    fn test_compare_values_numbers() {
        assert_eq!(compare_values(&json!(1), &json!(2)), Some(Ordering::Less));
        assert_eq!(compare_values(&json!(2), &json!(2.0)), Some(Ordering::Equal));
        assert_eq!(compare_values(&json!(3), &json!(2)), Some(Ordering::Greater));
    }

    #[test]
    fn test_compare_values_mixed_types() {
        assert_eq!(compare_values(&json!("a"), &json!(1)), None);
        assert_eq!(compare_values(&json!(true), &json!(1)), None);
        assert_eq!(compare_values(&Value::Null, &json!(0)), None);
    }

    #[test]
    fn test_compare_values_bools_and_nulls() {
        assert_eq!(compare_values(&json!(false), &json!(true)), Some(Ordering::Less));
        assert_eq!(compare_values(&Value::Null, &Value::Null), Some(Ordering::Equal));
    }
}
