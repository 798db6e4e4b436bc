//! Rule-set persistence: an ordered list of named rule sets stored as one
//! JSON document.
//!
//! Reads are forgiving: a missing, empty, or undecodable file loads as an
//! empty list, so a damaged store never blocks the user. Edits are not: an
//! existing file that does not decode is left alone and the edit fails with
//! [`StoreError::Undecodable`]. Writes go through a temporary sibling and a
//! rename while holding [`WriterLock`].

pub mod lock;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Error, Result, StoreError};
use crate::types::RuleSet;

pub use lock::WriterLock;

/// Fixed identifier of the persisted rule-set list. The default store file is
/// `<data dir>/<STORAGE_KEY>.json`.
pub const STORAGE_KEY: &str = "filter-json-app/rule-sets";

/// File-backed store for the rule-set list.
#[derive(Debug, Clone)]
pub struct RuleSetStore {
    path: PathBuf,
}

impl RuleSetStore {
    /// Use the store file at `path`. Nothing is touched until the first read
    /// or write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use the store file under the platform's local data directory.
    pub fn open_default() -> Result<Self> {
        let path = Self::default_path().ok_or(StoreError::NoDataDir)?;
        Ok(Self::open(path))
    }

    /// `<data_local_dir>/filter-json-app/rule-sets.json`, if the platform has
    /// a data directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join(format!("{STORAGE_KEY}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every stored rule set. Missing or undecodable content yields an
    /// empty list; only genuine I/O failures are errors.
    pub fn load(&self) -> Result<Vec<RuleSet>> {
        let Some(text) = self.read_text()? else {
            return Ok(Vec::new());
        };
        match decode_rule_sets(&text) {
            Some(sets) => Ok(sets),
            None => {
                warn!(path = %self.path.display(), "rule-set file is not valid; loading empty list");
                Ok(Vec::new())
            }
        }
    }

    /// Replace the stored list with `sets`.
    pub fn save(&self, sets: &[RuleSet]) -> Result<()> {
        self.ensure_parent()?;
        let _lock = WriterLock::acquire(&self.path)?;
        self.write_locked(sets)
    }

    /// Load, transform, and save under a single writer lock. Returns the
    /// list that was written.
    pub fn update<F>(&self, f: F) -> Result<Vec<RuleSet>>
    where
        F: FnOnce(Vec<RuleSet>) -> Vec<RuleSet>,
    {
        self.modify(|sets| {
            let next = f(std::mem::take(sets));
            sets.clone_from(&next);
            Ok(next)
        })
    }

    /// Edit the stored list in place under the writer lock. Nothing is
    /// written when `f` fails, or when the existing file is not a list of
    /// rule sets.
    pub fn modify<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Vec<RuleSet>) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        self.ensure_parent()?;
        let _lock = WriterLock::acquire(&self.path)?;
        let mut sets = self.load_for_edit()?;
        let value = f(&mut sets)?;
        self.write_locked(&sets)?;
        Ok(value)
    }

    /// File contents, or `None` when the file is missing or blank.
    fn read_text(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(None),
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn load_for_edit(&self) -> Result<Vec<RuleSet>> {
        let Some(text) = self.read_text()? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&text).map_err(|e| -> Error {
            warn!(path = %self.path.display(), error = %e, "rule-set file does not decode; edit refused");
            StoreError::Undecodable {
                path: self.path.clone(),
            }
            .into()
        })
    }

    fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn write_locked(&self, sets: &[RuleSet]) -> Result<()> {
        let text = serde_json::to_string_pretty(sets)?;
        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        info!(path = %self.path.display(), count = sets.len(), "rule sets saved");
        Ok(())
    }
}

/// Decode a rule-set document.
///
/// Returns `None` when the text is not JSON or an array element is not a
/// valid rule set, and an empty list when the top level is not an array.
pub fn decode_rule_sets(text: &str) -> Option<Vec<RuleSet>> {
    let value: Value = serde_json::from_str(text).ok()?;
    if !value.is_array() {
        return Some(Vec::new());
    }
    serde_json::from_value(value).ok()
}

/// Write `sets` to an arbitrary file as pretty JSON.
pub fn export_rule_sets(path: &Path, sets: &[RuleSet]) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(sets)?)?;
    info!(path = %path.display(), count = sets.len(), "rule sets exported");
    Ok(())
}

/// Read rule sets from an arbitrary file. `Ok(None)` means the file was read
/// but does not hold rule sets.
pub fn import_rule_sets(path: &Path) -> Result<Option<Vec<RuleSet>>> {
    let text = fs::read_to_string(path)?;
    Ok(decode_rule_sets(&text))
}
