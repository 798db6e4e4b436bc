//! Public API: path resolution, condition filtering, projection, and the
//! combined filter-spec entry point.

pub mod engine;
pub mod filter;
pub mod path;
pub mod projection;

pub use engine::{FilterOutcome, apply_filter_spec, apply_rule};
pub use filter::{apply_conditions, evaluate_condition};
pub use path::{
    Segment, collect_values_at_path, delete_at_path, delete_key_anywhere, delete_segments,
    parse_path, pick_at_path, resolve_path,
};
pub use projection::apply_projection;
