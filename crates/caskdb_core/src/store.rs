//! The storage engine.
//!
//! [`Store`] ties the pieces together: an append-only active data file,
//! the in-memory key index, the open-file table, and the directory
//! bookkeeping. One reader/writer lock guards all engine state. Reads
//! (`get`, `has`, `len`, `scan`, `statistics`) take shared access,
//! everything that mutates state or file contents (`put`, `delete`,
//! `sync`, `compact`, `close`) takes exclusive access.

use crate::compaction::{self, CompactionOutcome};
use crate::config::Config;
use crate::dir::StoreDir;
use crate::error::{StoreError, StoreResult};
use crate::keydir::{IndexEntry, KeyDir};
use crate::log::files::{FileHandle, FileTable};
use crate::log::record::{self, Record, TOMBSTONE};
use crate::recovery;
use crate::stats::Statistics;
use crate::types::FileId;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Engine state behind the store's reader/writer lock.
struct Inner {
    files: FileTable,
    keydir: KeyDir,
    active_file_id: FileId,
    is_open: bool,
}

impl Inner {
    fn ensure_open(&self) -> StoreResult<()> {
        if self.is_open {
            Ok(())
        } else {
            Err(StoreError::NotOpen)
        }
    }
}

/// An embedded log-structured key-value store.
///
/// Every write appends a record to the active data file and updates the
/// in-memory index; reads go straight to the indexed offset. Deletes
/// append a tombstone so they replay like any other write. Disk space
/// held by superseded records is reclaimed by [`Store::compact`].
///
/// A store owns its directory exclusively while open, guarded by a
/// `.lock` marker file. All methods take `&self`; the store is safe to
/// share across threads.
///
/// ## Example
///
/// ```no_run
/// use caskdb_core::Store;
///
/// # fn main() -> caskdb_core::StoreResult<()> {
/// let store = Store::open("/tmp/players")?;
/// store.put(b"name", b"Jason")?;
/// assert_eq!(store.get(b"name")?, b"Jason");
/// store.delete(b"name")?;
/// # Ok(())
/// # }
/// ```
pub struct Store {
    dir: StoreDir,
    config: Config,
    inner: RwLock<Inner>,
}

impl Store {
    /// Opens the store at `path` with the default configuration.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens the store at `path`, creating the directory if needed.
    ///
    /// Fails with `StorageInUse` if another instance holds the
    /// directory's lock marker. A marker left behind by a crashed
    /// process must be removed by hand before the store opens again.
    ///
    /// Replay is strict: a data file that fails validation aborts the
    /// open with `CorruptedEntry` instead of dropping records silently.
    pub fn open_with_config(path: impl Into<PathBuf>, config: Config) -> StoreResult<Self> {
        let dir = StoreDir::new(path);
        if !dir.exists() {
            dir.create()?;
        }
        dir.acquire_lock()?;

        match Self::load(&dir) {
            Ok(inner) => {
                info!(
                    path = %dir.path().display(),
                    files = inner.files.len(),
                    live_keys = inner.keydir.len(),
                    active_file = %inner.active_file_id,
                    "opened store"
                );
                Ok(Self {
                    dir,
                    config,
                    inner: RwLock::new(inner),
                })
            }
            Err(err) => {
                let _ = dir.release_lock();
                Err(err)
            }
        }
    }

    fn load(dir: &StoreDir) -> StoreResult<Inner> {
        let removed = dir.remove_temp_files()?;
        if removed > 0 {
            debug!(removed, "deleted leftover temporary files");
        }

        let mut files = FileTable::new();
        let mut keydir = KeyDir::new();
        recovery::replay_store(dir, &mut files, &mut keydir)?;

        // A replayed file without a hint ends exactly at a validated
        // record boundary, so appending to it is safe. A hinted file is
        // a compaction target whose snapshot would go stale.
        let active_file_id = match files.max_id() {
            Some(max_id) if !dir.has_hint(max_id) => max_id,
            Some(max_id) => {
                let fresh = max_id.next();
                files.insert(fresh, FileHandle::open(&dir.data_path(fresh))?);
                fresh
            }
            None => {
                let first = FileId::new(1);
                files.insert(first, FileHandle::open(&dir.data_path(first))?);
                first
            }
        };

        Ok(Inner {
            files,
            keydir,
            active_file_id,
            is_open: true,
        })
    }

    /// Flushes and closes every data file and releases the lock marker.
    ///
    /// Closing an already-closed store is a no-op. Durability beyond
    /// the OS page cache still requires [`Store::sync`] beforehand.
    pub fn close(&self) -> StoreResult<()> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        if !inner.is_open {
            return Ok(());
        }

        for (_, handle) in inner.files.iter_mut() {
            handle.flush()?;
        }
        inner.files.clear();
        inner.keydir.clear();
        inner.is_open = false;
        self.dir.release_lock()?;

        info!(path = %self.dir.path().display(), "closed store");
        Ok(())
    }

    /// Stores `value` under `key`, overwriting any previous value.
    ///
    /// Fails with `ReservedValue` if `value` equals the tombstone
    /// sentinel [`TOMBSTONE`], which marks deletions inside the log.
    /// The write lands in the OS page cache; call [`Store::sync`] for
    /// durability against power loss.
    pub fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        inner.ensure_open()?;
        if value == TOMBSTONE {
            return Err(StoreError::ReservedValue);
        }

        let (record_size, record_offset) = {
            let active = inner.files.get_mut(inner.active_file_id)?;
            let record_offset = active.total_size()?;
            let buf = record::encode(key, value, record_offset);
            active.append(&buf)?;
            (buf.len() as u64, record_offset)
        };

        let entry = IndexEntry::new(inner.active_file_id, record_size, record_offset);
        if let Some(old) = inner.keydir.set(key.to_vec(), entry) {
            inner.files.get_mut(old.file_id)?.add_disposable(old.record_size);
        }
        Ok(())
    }

    /// Returns the value stored under `key`.
    ///
    /// Fails with `KeyNotFound` if the key is absent and with
    /// `CorruptedEntry` if the record on disk fails its checksum.
    pub fn get(&self, key: &[u8]) -> StoreResult<Vec<u8>> {
        let guard = self.inner.read();
        guard.ensure_open()?;

        let entry = guard.keydir.get(key).ok_or(StoreError::KeyNotFound)?;
        let record = read_record(&guard.files, *entry)?;
        Ok(record.value)
    }

    /// Returns whether `key` currently has a live value.
    pub fn has(&self, key: &[u8]) -> StoreResult<bool> {
        let guard = self.inner.read();
        guard.ensure_open()?;
        Ok(guard.keydir.contains(key))
    }

    /// Removes `key`, appending a tombstone so the deletion replays.
    ///
    /// Fails with `KeyNotFound` if the key is absent.
    pub fn delete(&self, key: &[u8]) -> StoreResult<()> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        inner.ensure_open()?;
        if !inner.keydir.contains(key) {
            return Err(StoreError::KeyNotFound);
        }

        let record_size = {
            let active = inner.files.get_mut(inner.active_file_id)?;
            let record_offset = active.total_size()?;
            let buf = record::encode(key, TOMBSTONE, record_offset);
            active.append(&buf)?;
            buf.len() as u64
        };

        // The tombstone itself is dead weight the moment it lands.
        inner
            .files
            .get_mut(inner.active_file_id)?
            .add_disposable(record_size);
        if let Some(old) = inner.keydir.remove(key) {
            inner.files.get_mut(old.file_id)?.add_disposable(old.record_size);
        }
        Ok(())
    }

    /// Returns the number of live keys.
    pub fn len(&self) -> StoreResult<usize> {
        let guard = self.inner.read();
        guard.ensure_open()?;
        Ok(guard.keydir.len())
    }

    /// Returns whether the store holds no live keys.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Visits every live key starting with `prefix` in ascending key
    /// order, invoking `callback(key, value)` for each.
    ///
    /// Returns the number of entries visited. An entry whose record
    /// cannot be read back is logged and skipped rather than aborting
    /// the scan, and does not count toward the total.
    ///
    /// The callback runs under the store's shared lock; calling back
    /// into operations that take exclusive access deadlocks.
    pub fn scan<F>(&self, prefix: &[u8], mut callback: F) -> StoreResult<usize>
    where
        F: FnMut(&[u8], &[u8]),
    {
        let guard = self.inner.read();
        guard.ensure_open()?;

        let mut visited = 0;
        for (key, entry) in guard.keydir.prefix_iter(prefix) {
            match read_record(&guard.files, *entry) {
                Ok(record) => {
                    callback(key, &record.value);
                    visited += 1;
                }
                Err(err) => warn!(error = %err, "skipping unreadable entry during scan"),
            }
        }
        Ok(visited)
    }

    /// Flushes the active file's buffers down to the device.
    ///
    /// Non-active files are already immutable and are not touched.
    pub fn sync(&self) -> StoreResult<()> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        inner.ensure_open()?;

        let active = inner.files.get_mut(inner.active_file_id)?;
        active.flush()?;
        active.sync()?;
        Ok(())
    }

    /// Returns a point-in-time snapshot of size and file counters.
    pub fn statistics(&self) -> StoreResult<Statistics> {
        let guard = self.inner.read();
        guard.ensure_open()?;

        let mut stats = Statistics {
            data_files: guard.files.len(),
            live_keys: guard.keydir.len(),
            ..Statistics::default()
        };
        for (_, handle) in guard.files.iter() {
            stats.total_bytes += handle.total_size()?;
            stats.disposable_bytes += handle.disposable_bytes();
        }
        Ok(stats)
    }

    /// Rewrites all live records into one fresh file and deletes the
    /// old data files, reclaiming every disposable byte.
    ///
    /// Appends made after the call land in a new active file created by
    /// the run. See [`CompactionOutcome`] for what the run did.
    pub fn compact(&self) -> StoreResult<CompactionOutcome> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        inner.ensure_open()?;

        let outcome = compaction::run(
            &self.dir,
            &mut inner.files,
            &mut inner.keydir,
            inner.active_file_id,
        )?;
        inner.active_file_id = outcome.active_file_id;
        Ok(outcome)
    }

    /// Returns the store's directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the configuration the store was opened with.
    #[must_use]
    pub fn config(&self) -> Config {
        self.config
    }
}

fn read_record(files: &FileTable, entry: IndexEntry) -> StoreResult<Record> {
    let handle = files.get(entry.file_id)?;
    let bytes = handle.read_at(entry.record_offset, entry.record_size as usize)?;
    Record::decode(&bytes, entry.file_id, entry.record_offset)
}

impl Drop for Store {
    fn drop(&mut self) {
        if self.config.auto_close {
            if let Err(err) = self.close() {
                warn!(error = %err, "failed to close store on drop");
            }
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Store")
            .field("path", &self.dir.path())
            .field("open", &inner.is_open)
            .field("live_keys", &inner.keydir.len())
            .finish_non_exhaustive()
    }
}
