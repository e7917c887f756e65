//! In-memory key index.
//!
//! The key index maps every live key to the location of its newest record
//! on disk. It is rebuilt from data and hint files at open time and is the
//! single source of truth for reads: a key absent from the index does not
//! exist, whatever the log files contain.

use crate::types::FileId;
use std::collections::BTreeMap;

/// Location of the newest record for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Data file holding the record.
    pub file_id: FileId,
    /// Encoded size of the record in bytes.
    pub record_size: u64,
    /// Byte offset of the record within the file.
    pub record_offset: u64,
}

impl IndexEntry {
    /// Creates a new index entry.
    #[must_use]
    pub const fn new(file_id: FileId, record_size: u64, record_offset: u64) -> Self {
        Self {
            file_id,
            record_size,
            record_offset,
        }
    }
}

/// Ordered map from key bytes to the newest record location.
///
/// Keys are ordered lexicographically, which makes prefix scans a
/// contiguous range walk.
#[derive(Debug, Default)]
pub struct KeyDir {
    entries: BTreeMap<Vec<u8>, IndexEntry>,
}

impl KeyDir {
    /// Creates an empty key index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for a key, if the key is live.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&IndexEntry> {
        self.entries.get(key)
    }

    /// Returns whether the key is live.
    #[must_use]
    pub fn contains(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    /// Inserts or replaces the entry for a key.
    ///
    /// Returns the displaced entry when the key was already live, so the
    /// caller can account the superseded record as disposable.
    pub fn set(&mut self, key: Vec<u8>, entry: IndexEntry) -> Option<IndexEntry> {
        self.entries.insert(key, entry)
    }

    /// Removes the entry for a key, returning it if the key was live.
    pub fn remove(&mut self, key: &[u8]) -> Option<IndexEntry> {
        self.entries.remove(key)
    }

    /// Returns the number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &IndexEntry)> {
        self.entries.iter()
    }

    /// Iterates over all entries in key order with mutable access.
    ///
    /// Compaction uses this to repoint entries at the merged file.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Vec<u8>, &mut IndexEntry)> {
        self.entries.iter_mut()
    }

    /// Iterates over entries whose key starts with `prefix`, in key order.
    ///
    /// An empty prefix visits every entry.
    pub fn prefix_iter<'a>(
        &'a self,
        prefix: &'a [u8],
    ) -> impl Iterator<Item = (&'a Vec<u8>, &'a IndexEntry)> {
        self.entries
            .range(prefix.to_vec()..)
            .take_while(move |(key, _)| key.starts_with(prefix))
    }
}
