//! Open data file handles and the open-file table.

use crate::error::{StoreError, StoreResult};
use crate::types::FileId;
use caskdb_storage::{FileBackend, StorageBackend};
use std::collections::BTreeMap;
use std::path::Path;

/// An open data file plus its disposable-byte counter.
///
/// `disposable_bytes` tracks bytes occupied by superseded or tombstoned
/// records in this file. It is rebuilt during replay and kept current by
/// puts and deletes, and feeds the compaction-worthiness statistics.
#[derive(Debug)]
pub struct FileHandle {
    backend: FileBackend,
    disposable_bytes: u64,
}

impl FileHandle {
    /// Opens or creates the data file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Ok(Self {
            backend: FileBackend::open(path)?,
            disposable_bytes: 0,
        })
    }

    /// Reads `len` bytes starting at `offset`.
    pub fn read_at(&self, offset: u64, len: usize) -> StoreResult<Vec<u8>> {
        Ok(self.backend.read_at(offset, len)?)
    }

    /// Appends bytes, returning the offset where they were written.
    pub fn append(&mut self, data: &[u8]) -> StoreResult<u64> {
        Ok(self.backend.append(data)?)
    }

    /// Flushes pending writes to the operating system.
    pub fn flush(&mut self) -> StoreResult<()> {
        Ok(self.backend.flush()?)
    }

    /// Syncs data and metadata to durable storage.
    pub fn sync(&mut self) -> StoreResult<()> {
        Ok(self.backend.sync()?)
    }

    /// Returns the current file size in bytes.
    ///
    /// This is also the offset at which the next append will land.
    pub fn total_size(&self) -> StoreResult<u64> {
        Ok(self.backend.size()?)
    }

    /// Returns the bytes reclaimable from this file by compaction.
    #[must_use]
    pub fn disposable_bytes(&self) -> u64 {
        self.disposable_bytes
    }

    /// Counts `bytes` of this file as superseded or tombstoned.
    pub fn add_disposable(&mut self, bytes: u64) {
        self.disposable_bytes += bytes;
    }

    /// Returns the path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.backend.path()
    }

    pub(crate) fn backend(&self) -> &dyn StorageBackend {
        &self.backend
    }
}

/// The open-file table: every data file the store currently has open,
/// keyed by file id.
///
/// Ordered by id so that replay and compaction can walk files oldest
/// first and find the highest id cheaply.
#[derive(Debug, Default)]
pub struct FileTable {
    files: BTreeMap<FileId, FileHandle>,
}

impl FileTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a handle for `file_id`, replacing any previous one.
    pub fn insert(&mut self, file_id: FileId, handle: FileHandle) {
        self.files.insert(file_id, handle);
    }

    /// Returns the handle for `file_id`.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` if the id is not in the table; the key
    /// index never references files outside it.
    pub fn get(&self, file_id: FileId) -> StoreResult<&FileHandle> {
        self.files
            .get(&file_id)
            .ok_or(StoreError::FileNotFound { file_id })
    }

    /// Returns the handle for `file_id` with mutable access.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` if the id is not in the table.
    pub fn get_mut(&mut self, file_id: FileId) -> StoreResult<&mut FileHandle> {
        self.files
            .get_mut(&file_id)
            .ok_or(StoreError::FileNotFound { file_id })
    }

    /// Removes and returns the handle for `file_id`, closing the file
    /// when the handle is dropped.
    pub fn remove(&mut self, file_id: FileId) -> Option<FileHandle> {
        self.files.remove(&file_id)
    }

    /// Returns whether `file_id` is in the table.
    #[must_use]
    pub fn contains(&self, file_id: FileId) -> bool {
        self.files.contains_key(&file_id)
    }

    /// Returns all file ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<FileId> {
        self.files.keys().copied().collect()
    }

    /// Returns the highest file id in the table.
    #[must_use]
    pub fn max_id(&self) -> Option<FileId> {
        self.files.keys().next_back().copied()
    }

    /// Iterates over all handles in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (&FileId, &FileHandle)> {
        self.files.iter()
    }

    /// Iterates over all handles in ascending id order with mutable access.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&FileId, &mut FileHandle)> {
        self.files.iter_mut()
    }

    /// Returns the number of open files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Removes all handles, closing the files as they drop.
    pub fn clear(&mut self) {
        self.files.clear();
    }
}
