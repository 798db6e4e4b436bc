//! Entry point tying conditions and projection together.

use serde::Serialize;
use serde_json::Value;

use super::filter::apply_conditions;
use super::projection::apply_projection;
use crate::error::FilterError;
use crate::types::{FilterSpec, Rule};

/// A transformed value plus the diagnostics collected while producing it.
///
/// `value` is always a complete best-effort result, even when `errors` is
/// non-empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOutcome {
    pub value: Value,
    pub errors: Vec<FilterError>,
}

impl FilterOutcome {
    /// An outcome with no diagnostics.
    pub fn unchanged(value: &Value) -> Self {
        Self {
            value: value.clone(),
            errors: Vec::new(),
        }
    }
}

/// Filter `root` by the spec's conditions, then project the result if the
/// spec has a projection. Only the conditions phase reports diagnostics.
pub fn apply_filter_spec(root: &Value, spec: &FilterSpec) -> FilterOutcome {
    let FilterOutcome { value, errors } = apply_conditions(root, &spec.conditions);
    match &spec.projection {
        Some(projection) => FilterOutcome {
            value: apply_projection(&value, projection),
            errors,
        },
        None => FilterOutcome { value, errors },
    }
}

/// Apply a rule's spec when the rule is enabled; a disabled rule leaves the
/// value unchanged.
pub fn apply_rule(root: &Value, rule: &Rule) -> FilterOutcome {
    if rule.enabled {
        apply_filter_spec(root, &rule.spec)
    } else {
        FilterOutcome::unchanged(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FilterCondition, FilterProjection, ProjectionRule};
    use serde_json::json;

    fn data() -> Value {
        json!([
            {"id": 1, "price": 5, "category": "a"},
            {"id": 2, "price": 15, "category": "b"},
            {"id": 3, "price": 25, "category": "a"}
        ])
    }

    #[test]
    fn test_empty_spec_is_identity() {
        for value in [data(), json!({"a": 1}), json!(3), Value::Null] {
            let out = apply_filter_spec(&value, &FilterSpec::new());
            assert_eq!(out, FilterOutcome::unchanged(&value));
        }
    }

    #[test]
    fn test_keep_after_conditions() {
        let spec = FilterSpec::new()
            .with_condition(FilterCondition::gt("price", 10))
            .with_projection(FilterProjection::keep(vec![ProjectionRule::exact("id")]));
        let out = apply_filter_spec(&data(), &spec);
        assert_eq!(out.value, json!([{"id": 2}, {"id": 3}]));
        assert!(out.errors.is_empty());
    }

    #[test]
    fn test_drop_after_conditions() {
        let spec = FilterSpec::new()
            .with_condition(FilterCondition::gt("price", 10))
            .with_projection(FilterProjection::drop(vec![ProjectionRule::exact("price")]));
        let out = apply_filter_spec(&data(), &spec);
        assert_eq!(
            out.value,
            json!([{"id": 2, "category": "b"}, {"id": 3, "category": "a"}])
        );
    }

    #[test]
    fn test_projection_only() {
        let spec = FilterSpec::new()
            .with_projection(FilterProjection::drop(vec![ProjectionRule::key_anywhere("price")]));
        let out = apply_filter_spec(&data(), &spec);
        assert_eq!(out.value.as_array().unwrap().len(), 3);
        assert!(out.value[0].get("price").is_none());
    }

    #[test]
    fn test_keep_on_nulled_root() {
        // A failing non-array root becomes null; keep then builds an empty object.
        let spec = FilterSpec::new()
            .with_condition(FilterCondition::eq("a", 2))
            .with_projection(FilterProjection::keep(vec![ProjectionRule::exact("a")]));
        let out = apply_filter_spec(&json!({"a": 1}), &spec);
        assert_eq!(out.value, json!({}));
    }

    #[test]
    fn test_disabled_rule_is_noop() {
        let mut rule = Rule {
            id: "r".to_string(),
            name: "R".to_string(),
            description: None,
            spec: FilterSpec::new().with_condition(FilterCondition::gt("price", 10)),
            enabled: false,
        };
        assert_eq!(apply_rule(&data(), &rule).value, data());
        rule.enabled = true;
        assert_eq!(apply_rule(&data(), &rule).value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_outcome_serializes() {
        let out = FilterOutcome::unchanged(&json!([1]));
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!({"value": [1], "errors": []})
        );
    }
}
