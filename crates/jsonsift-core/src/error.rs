//! Error types for jsonsift operations.
//!
//! Two families live here. [`Error`] is the hard-failure type returned by
//! fallible operations (file I/O, rule-set storage, condition evaluation).
//! [`FilterError`] is an advisory diagnostic accumulated next to a
//! best-effort value; the filter engine never returns it as an `Err`.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for jsonsift operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("rule-set file is locked")]
    FileLocked,

    #[error("no data directory available for the rule-set store")]
    NoDataDir,

    #[error("rule-set file {} does not decode; refusing to overwrite it", .path.display())]
    Undecodable { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("path depth exceeds maximum of {max} segments (got {actual})")]
    PathTooDeep { max: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Category of a non-fatal diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterErrorKind {
    /// The input document is not valid JSON.
    Parse,
    Path,
    Type,
    Operator,
    /// Anything unexpected while evaluating a condition.
    Unknown,
}

impl std::fmt::Display for FilterErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FilterErrorKind::Parse => "parse",
            FilterErrorKind::Path => "path",
            FilterErrorKind::Type => "type",
            FilterErrorKind::Operator => "operator",
            FilterErrorKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A recoverable diagnostic reported alongside a transform result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterError {
    pub kind: FilterErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl FilterError {
    pub fn new(kind: FilterErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
        }
    }

    /// Attach the path the diagnostic refers to.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for FilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} error at '{}': {}", self.kind, path, self.message),
            None => write!(f, "{} error: {}", self.kind, self.message),
        }
    }
}
