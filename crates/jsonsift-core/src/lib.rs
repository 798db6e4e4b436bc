//! # jsonsift
//!
//! Filter and reshape JSON documents with a small declarative spec.
//!
//! A [`FilterSpec`](types::FilterSpec) holds AND-combined conditions on
//! dotted paths (`"price"`, `"items[].sku"`) and an optional projection that
//! keeps or drops fields of the surviving elements. Evaluation never fails:
//! it returns a best-effort value plus advisory diagnostics.
//!
//! ## Quick Start
//!
//! ```
//! use jsonsift_core::api::apply_filter_spec;
//! use jsonsift_core::types::{FilterCondition, FilterProjection, FilterSpec, ProjectionRule};
//! use serde_json::json;
//!
//! let data = json!([
//!     {"id": 1, "price": 5},
//!     {"id": 2, "price": 15},
//!     {"id": 3, "price": 25}
//! ]);
//!
//! let spec = FilterSpec::new()
//!     .with_condition(FilterCondition::gt("price", 10))
//!     .with_projection(FilterProjection::keep(vec![ProjectionRule::exact("id")]));
//!
//! let outcome = apply_filter_spec(&data, &spec);
//! assert_eq!(outcome.value, json!([{"id": 2}, {"id": 3}]));
//! assert!(outcome.errors.is_empty());
//! ```

pub mod api;
pub mod document;
pub mod error;
pub mod store;
pub mod types;
