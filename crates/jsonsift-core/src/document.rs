//! Loading input documents and writing transform results.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::{FilterError, FilterErrorKind, Result};

/// Outcome of parsing raw JSON text.
///
/// Blank text produces neither a value nor an error; malformed text produces
/// a `parse` diagnostic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedDocument {
    pub value: Option<Value>,
    pub error: Option<FilterError>,
}

pub fn parse_document(text: &str) -> ParsedDocument {
    if text.trim().is_empty() {
        return ParsedDocument::default();
    }
    match serde_json::from_str(text) {
        Ok(value) => ParsedDocument {
            value: Some(value),
            error: None,
        },
        Err(e) => {
            debug!(error = %e, "document is not valid JSON");
            ParsedDocument {
                value: None,
                error: Some(FilterError::new(FilterErrorKind::Parse, e.to_string())),
            }
        }
    }
}

/// Read and parse a document file. I/O failures are errors; bad JSON is
/// reported through [`ParsedDocument::error`].
pub fn read_document(path: &Path) -> Result<ParsedDocument> {
    let text = fs::read_to_string(path)?;
    Ok(parse_document(&text))
}

/// Serialize a value with 2-space indentation.
pub fn to_pretty_json(value: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Write a value to `path` as pretty JSON.
pub fn write_document(path: &Path, value: &Value) -> Result<()> {
    fs::write(path, to_pretty_json(value)?)?;
    Ok(())
}
