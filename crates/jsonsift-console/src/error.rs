use jsonsift_core::error::FilterError;
use thiserror::Error;

/// Failures surfaced by console commands.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Core(#[from] jsonsift_core::error::Error),

    #[error("{0}")]
    Document(FilterError),

    #[error("No document loaded. Use LOAD <file> or JSON <document> first.")]
    NoDocument,

    #[error("Rule set '{0}' not found")]
    SetNotFound(String),

    #[error("Rule '{rule}' not found in set '{set}'")]
    RuleNotFound { set: String, rule: String },

    #[error("'{0}' does not contain rule sets")]
    InvalidImport(String),
}
