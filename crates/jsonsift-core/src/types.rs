//! Core types: filter specifications, projection rules, rules and rule sets.
//!
//! The serialized shape matches the persisted rule-set JSON (camelCase match
//! modes, symbolic operators), so specs saved by any frontend load unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON tree value.
pub type JsonValue = Value;

/// Dot-notation path with optional `[]` array wildcards, e.g. `"items[].price"`.
pub type JsonPath = String;

/// Comparison applied between a resolved value and a condition operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "exists")]
    Exists,
}

impl ComparisonOperator {
    /// Parse an operator from its symbol or keyword (keywords are case-insensitive).
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "==" | "=" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            _ => match s.to_ascii_lowercase().as_str() {
                "contains" => Some(Self::Contains),
                "exists" => Some(Self::Exists),
                _ => None,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Contains => "contains",
            Self::Exists => "exists",
        }
    }
}

impl std::fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `(path, operator, operand)` test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// Path to the field to check, e.g. `"price"` or `"items[].price"`.
    pub path: JsonPath,
    pub operator: ComparisonOperator,
    /// Literal operand. A JSON `null` decodes as `None`, same as an absent operand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<JsonValue>,
}

impl FilterCondition {
    pub fn new(path: impl Into<String>, operator: ComparisonOperator, value: Option<JsonValue>) -> Self {
        Self {
            path: path.into(),
            operator,
            value,
        }
    }

    /// `path == value`
    pub fn eq(path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::new(path, ComparisonOperator::Eq, Some(value.into()))
    }

    /// `path != value`
    pub fn ne(path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::new(path, ComparisonOperator::Ne, Some(value.into()))
    }

    /// `path > value`
    pub fn gt(path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::new(path, ComparisonOperator::Gt, Some(value.into()))
    }

    /// `path >= value`
    pub fn ge(path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::new(path, ComparisonOperator::Ge, Some(value.into()))
    }

    /// `path < value`
    pub fn lt(path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::new(path, ComparisonOperator::Lt, Some(value.into()))
    }

    /// `path <= value`
    pub fn le(path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::new(path, ComparisonOperator::Le, Some(value.into()))
    }

    /// `contains(path, needle)`
    pub fn contains(path: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::new(
            path,
            ComparisonOperator::Contains,
            Some(Value::String(needle.into())),
        )
    }

    /// `exists(path)`
    pub fn exists(path: impl Into<String>) -> Self {
        Self::new(path, ComparisonOperator::Exists, None)
    }
}

/// Whether projection rules name fields to keep or fields to drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    Keep,
    Drop,
}

/// How a projection rule's path is matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectionMatchMode {
    /// Resolve the literal path from the current value.
    #[default]
    Exact,
    /// Match any key with this name at any depth.
    KeyAnywhere,
}

/// A path (or bare key name) plus its match mode.
///
/// Deserializes from either `{"path": .., "match": ..}` or a bare string,
/// which is shorthand for an exact rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProjectionRuleRepr")]
pub struct ProjectionRule {
    pub path: JsonPath,
    #[serde(rename = "match")]
    pub match_mode: ProjectionMatchMode,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProjectionRuleRepr {
    Path(String),
    Rule {
        path: String,
        #[serde(default, rename = "match")]
        match_mode: ProjectionMatchMode,
    },
}

impl From<ProjectionRuleRepr> for ProjectionRule {
    fn from(repr: ProjectionRuleRepr) -> Self {
        match repr {
            ProjectionRuleRepr::Path(path) => ProjectionRule::exact(path),
            ProjectionRuleRepr::Rule { path, match_mode } => ProjectionRule { path, match_mode },
        }
    }
}

impl ProjectionRule {
    pub fn exact(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            match_mode: ProjectionMatchMode::Exact,
        }
    }

    pub fn key_anywhere(key: impl Into<String>) -> Self {
        Self {
            path: key.into(),
            match_mode: ProjectionMatchMode::KeyAnywhere,
        }
    }
}

/// Post-filter reshaping of surviving elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterProjection {
    pub mode: ProjectionMode,
    #[serde(default, alias = "paths")]
    pub rules: Vec<ProjectionRule>,
}

impl FilterProjection {
    pub fn keep(rules: Vec<ProjectionRule>) -> Self {
        Self {
            mode: ProjectionMode::Keep,
            rules,
        }
    }

    pub fn drop(rules: Vec<ProjectionRule>) -> Self {
        Self {
            mode: ProjectionMode::Drop,
            rules,
        }
    }
}

/// Conditions (AND-combined) followed by an optional projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<FilterCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<FilterProjection>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_condition(mut self, condition: FilterCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_projection(mut self, projection: FilterProjection) -> Self {
        self.projection = Some(projection);
        self
    }

    /// True when the spec has neither conditions nor a projection.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.projection.is_none()
    }
}

/// A named, toggleable filter spec inside a rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub spec: FilterSpec,
    pub enabled: bool,
}

/// An ordered collection of rules persisted under one name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// The rule a frontend should apply: the first enabled rule, or the
    /// first rule when none is enabled.
    pub fn active_rule(&self) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|r| r.enabled)
            .or_else(|| self.rules.first())
    }

    /// Look up a rule by id or by name.
    pub fn rule(&self, id_or_name: &str) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|r| r.id == id_or_name || r.name == id_or_name)
    }

    pub fn rule_mut(&mut self, id_or_name: &str) -> Option<&mut Rule> {
        self.rules
            .iter_mut()
            .find(|r| r.id == id_or_name || r.name == id_or_name)
    }
}
