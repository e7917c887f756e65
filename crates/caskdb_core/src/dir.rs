//! Store directory management.
//!
//! This module handles the file system layout for a CaskDB store:
//!
//! ```text
//! <store_path>/
//! ├─ <id>.data         # Append-only record logs, decimal file ids
//! ├─ <id>.hint         # Optional index snapshots, written by compaction
//! ├─ .lock             # Advisory marker containing a decimal timestamp
//! └─ *.tmp             # Leftover temporaries, deleted at open time
//! ```
//!
//! The lock marker is presence-based: creating it atomically claims the
//! directory, and any open attempt that finds it already present fails
//! with `StorageInUse`. It is advisory only; a marker left behind by a
//! crashed process must be removed manually before the store can be
//! opened again.

use crate::error::{StoreError, StoreResult};
use crate::types::FileId;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// File name of the lock marker.
const LOCK_FILE: &str = ".lock";
/// Extension of data files.
const DATA_EXT: &str = "data";
/// Extension of hint files.
const HINT_EXT: &str = "hint";
/// Extension of temporary files, reserved for atomic-rename use.
const TMP_EXT: &str = "tmp";

/// Paths and directory-level operations for one store.
///
/// `StoreDir` is a pure path helper plus the small set of file system
/// operations the engine performs outside record I/O: lock handling,
/// temp cleanup, and data file enumeration. It holds no open handles.
#[derive(Debug, Clone)]
pub struct StoreDir {
    path: PathBuf,
}

impl StoreDir {
    /// Creates a helper for the store directory at `path`.
    ///
    /// Does not touch the file system.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the store directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns whether the store directory exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Creates the store directory and any missing parents.
    pub fn create(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.path)?;
        Ok(())
    }

    /// Returns the path of the data file for `file_id`.
    #[must_use]
    pub fn data_path(&self, file_id: FileId) -> PathBuf {
        self.path.join(format!("{file_id}.{DATA_EXT}"))
    }

    /// Returns the path of the hint file for `file_id`.
    #[must_use]
    pub fn hint_path(&self, file_id: FileId) -> PathBuf {
        self.path.join(format!("{file_id}.{HINT_EXT}"))
    }

    /// Returns whether a hint snapshot exists for `file_id`.
    #[must_use]
    pub fn has_hint(&self, file_id: FileId) -> bool {
        self.hint_path(file_id).is_file()
    }

    /// Returns the path of the lock marker.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.path.join(LOCK_FILE)
    }

    /// Returns whether the lock marker is present.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock_path().is_file()
    }

    /// Creates the lock marker, claiming the directory.
    ///
    /// The marker is created with `create_new`, so claiming is atomic
    /// with respect to other processes doing the same.
    ///
    /// # Errors
    ///
    /// Returns `StorageInUse` if the marker already exists.
    pub fn acquire_lock(&self) -> StoreResult<()> {
        let lock_path = self.lock_path();
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .map_err(|err| {
                if err.kind() == ErrorKind::AlreadyExists {
                    StoreError::storage_in_use(lock_path.clone())
                } else {
                    StoreError::Io(err)
                }
            })?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        file.write_all(format!("{timestamp}\n").as_bytes())?;

        Ok(())
    }

    /// Removes the lock marker.
    ///
    /// Removing an already-absent marker is not an error.
    pub fn release_lock(&self) -> StoreResult<()> {
        match fs::remove_file(self.lock_path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Deletes every `*.tmp` file in the directory.
    ///
    /// Returns the number of files removed.
    pub fn remove_temp_files(&self) -> StoreResult<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == TMP_EXT) {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Lists the ids of all data files, in ascending order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFileName` if a `*.data` file's stem is not a
    /// decimal id; a store directory is expected to contain only files
    /// the engine wrote.
    pub fn data_file_ids(&self) -> StoreResult<Vec<FileId>> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.path)? {
            let path = entry?.path();
            if !path.extension().is_some_and(|ext| ext == DATA_EXT) {
                continue;
            }

            let stem = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default();
            match stem.parse::<u64>() {
                Ok(id) => ids.push(FileId::new(id)),
                Err(_) => {
                    let name = path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    return Err(StoreError::invalid_file_name(name));
                }
            }
        }

        ids.sort_unstable();
        Ok(ids)
    }

    /// Deletes the data file for `file_id` and its hint snapshot if one
    /// exists.
    pub fn remove_file_pair(&self, file_id: FileId) -> StoreResult<()> {
        fs::remove_file(self.data_path(file_id))?;
        match fs::remove_file(self.hint_path(file_id)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Syncs the directory itself so that file creations, renames, and
    /// deletions are durable.
    #[cfg(unix)]
    pub fn sync(&self) -> StoreResult<()> {
        let dir = fs::File::open(&self.path)?;
        dir.sync_all()?;
        Ok(())
    }

    /// Syncs the directory itself so that file creations, renames, and
    /// deletions are durable.
    #[cfg(not(unix))]
    pub fn sync(&self) -> StoreResult<()> {
        // NTFS journals metadata updates; directory fsync is not
        // available on Windows.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_dir() -> (tempfile::TempDir, StoreDir) {
        let temp = tempdir().unwrap();
        let dir = StoreDir::new(temp.path().join("db"));
        dir.create().unwrap();
        (temp, dir)
    }

    #[test]
    fn paths_are_correct() {
        let dir = StoreDir::new("/store");
        assert_eq!(dir.data_path(FileId::new(3)), PathBuf::from("/store/3.data"));
        assert_eq!(dir.hint_path(FileId::new(3)), PathBuf::from("/store/3.hint"));
        assert_eq!(dir.lock_path(), PathBuf::from("/store/.lock"));
    }

    #[test]
    fn lock_acquire_release() {
        let (_temp, dir) = store_dir();

        assert!(!dir.is_locked());
        dir.acquire_lock().unwrap();
        assert!(dir.is_locked());

        dir.release_lock().unwrap();
        assert!(!dir.is_locked());

        // Releasing twice is fine.
        dir.release_lock().unwrap();
    }

    #[test]
    fn second_acquire_fails_with_storage_in_use() {
        let (_temp, dir) = store_dir();
        dir.acquire_lock().unwrap();

        let result = dir.acquire_lock();
        assert!(matches!(result, Err(StoreError::StorageInUse { .. })));
    }

    #[test]
    fn lock_marker_contains_decimal_timestamp() {
        let (_temp, dir) = store_dir();
        dir.acquire_lock().unwrap();

        let content = fs::read_to_string(dir.lock_path()).unwrap();
        assert!(content.trim().parse::<u64>().is_ok());
    }

    #[test]
    fn remove_temp_files_only_touches_tmp() {
        let (_temp, dir) = store_dir();
        fs::write(dir.path().join("1.data"), b"keep").unwrap();
        fs::write(dir.path().join("stale.tmp"), b"drop").unwrap();
        fs::write(dir.path().join("other.tmp"), b"drop").unwrap();

        let removed = dir.remove_temp_files().unwrap();
        assert_eq!(removed, 2);
        assert!(dir.path().join("1.data").exists());
        assert!(!dir.path().join("stale.tmp").exists());
    }

    #[test]
    fn data_file_ids_sorted_ignoring_other_files() {
        let (_temp, dir) = store_dir();
        for name in ["10.data", "2.data", "1.data", "2.hint", ".lock"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let ids = dir.data_file_ids().unwrap();
        assert_eq!(ids, vec![FileId::new(1), FileId::new(2), FileId::new(10)]);
    }

    #[test]
    fn data_file_ids_rejects_non_decimal_stem() {
        let (_temp, dir) = store_dir();
        fs::write(dir.path().join("backup.data"), b"").unwrap();

        let result = dir.data_file_ids();
        assert!(matches!(result, Err(StoreError::InvalidFileName { .. })));
    }

    #[test]
    fn remove_file_pair_removes_hint_when_present() {
        let (_temp, dir) = store_dir();
        fs::write(dir.data_path(FileId::new(2)), b"").unwrap();
        fs::write(dir.hint_path(FileId::new(2)), b"").unwrap();
        fs::write(dir.data_path(FileId::new(3)), b"").unwrap();

        dir.remove_file_pair(FileId::new(2)).unwrap();
        dir.remove_file_pair(FileId::new(3)).unwrap();

        assert!(!dir.data_path(FileId::new(2)).exists());
        assert!(!dir.hint_path(FileId::new(2)).exists());
        assert!(!dir.data_path(FileId::new(3)).exists());
    }

    #[test]
    fn has_hint() {
        let (_temp, dir) = store_dir();
        assert!(!dir.has_hint(FileId::new(1)));

        fs::write(dir.hint_path(FileId::new(1)), b"").unwrap();
        assert!(dir.has_hint(FileId::new(1)));
    }
}
