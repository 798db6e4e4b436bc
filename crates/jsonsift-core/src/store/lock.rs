use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{Error, Result, StoreError};

/// Advisory writer lock for a rule-set file (`flock(2)` on Unix).
///
/// The lock lives in a `<file>.lock` sibling so the data file itself can be
/// replaced by rename while the lock is held. Released on drop.
#[derive(Debug)]
pub struct WriterLock {
    _file: File,
}

impl WriterLock {
    /// Path of the lock file guarding `data_path`.
    pub fn lock_path(data_path: &Path) -> PathBuf {
        let mut name = data_path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Block until the writer lock for `data_path` is held. Lock failures
    /// here are I/O errors, never contention.
    pub fn acquire(data_path: &Path) -> Result<Self> {
        let file = open_lock_file(data_path)?;
        file.lock_exclusive()?;
        Ok(Self { _file: file })
    }

    /// Take the writer lock without blocking.
    /// Fails with `StoreError::FileLocked` if another writer holds it.
    pub fn try_acquire(data_path: &Path) -> Result<Self> {
        let file = open_lock_file(data_path)?;
        file.try_lock_exclusive().map_err(try_lock_error)?;
        Ok(Self { _file: file })
    }
}

/// Contention becomes `FileLocked`; anything else stays an I/O error.
fn try_lock_error(err: io::Error) -> Error {
    let contended = fs2::lock_contended_error();
    if err.kind() == contended.kind() && err.raw_os_error() == contended.raw_os_error() {
        StoreError::FileLocked.into()
    } else {
        err.into()
    }
}

fn open_lock_file(data_path: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(WriterLock::lock_path(data_path))?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_path_is_sibling() {
        let path = Path::new("/data/rule-sets.json");
        assert_eq!(
            WriterLock::lock_path(path),
            PathBuf::from("/data/rule-sets.json.lock")
        );
    }

    #[test]
    fn test_second_writer_is_refused() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("rules.json");

        let _held = WriterLock::acquire(&data).unwrap();
        match WriterLock::try_acquire(&data) {
            Err(Error::Store(StoreError::FileLocked)) => {}
            other => panic!("expected FileLocked, got {other:?}"),
        }
    }

    #[test]
    fn test_only_contention_maps_to_file_locked() {
        assert!(matches!(
            try_lock_error(fs2::lock_contended_error()),
            Error::Store(StoreError::FileLocked)
        ));
        assert!(matches!(
            try_lock_error(io::Error::other("no locks available")),
            Error::Io(_)
        ));
    }

    #[test]
    fn test_acquire_reports_io_failure() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("missing-dir/rules.json");
        assert!(matches!(WriterLock::acquire(&data), Err(Error::Io(_))));
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("rules.json");

        {
            let _held = WriterLock::acquire(&data).unwrap();
        }
        let _again = WriterLock::try_acquire(&data).unwrap();
    }
}
