//! Error types for CaskDB core.

use crate::types::FileId;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in CaskDB store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] caskdb_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An operation was attempted on a store that is not open.
    #[error("store is not open")]
    NotOpen,

    /// Another process already holds the lock marker for this directory.
    #[error("storage in use: lock marker present at {path}")]
    StorageInUse {
        /// Path of the lock marker that blocked the open.
        path: PathBuf,
    },

    /// A put was attempted with the reserved tombstone sentinel as value.
    #[error("value is reserved for internal use")]
    ReservedValue,

    /// The requested key does not exist in the store.
    #[error("key not found")]
    KeyNotFound,

    /// A record failed structural or checksum validation.
    #[error("corrupted entry in file {file_id} at offset {offset}: {reason}")]
    CorruptedEntry {
        /// File id of the corrupted record.
        file_id: FileId,
        /// Byte offset of the corrupted record within the file.
        offset: u64,
        /// Description of the corruption.
        reason: String,
    },

    /// A referenced file id is missing from the open-file table.
    ///
    /// This indicates an internal invariant violation, not a user error.
    #[error("file id {file_id} missing from open-file table")]
    FileNotFound {
        /// The missing file id.
        file_id: FileId,
    },

    /// A file in the store directory does not follow the naming scheme.
    #[error("invalid file name in store directory: {name}")]
    InvalidFileName {
        /// The offending file name.
        name: String,
    },
}

impl StoreError {
    /// Creates a corrupted entry error.
    pub fn corrupted(file_id: FileId, offset: u64, reason: impl Into<String>) -> Self {
        Self::CorruptedEntry {
            file_id,
            offset,
            reason: reason.into(),
        }
    }

    /// Creates a corrupted entry error for a checksum mismatch.
    pub fn checksum_mismatch(file_id: FileId, offset: u64, expected: u32, actual: u32) -> Self {
        Self::CorruptedEntry {
            file_id,
            offset,
            reason: format!("checksum mismatch: expected {expected:08x}, got {actual:08x}"),
        }
    }

    /// Creates a storage-in-use error.
    pub fn storage_in_use(path: impl Into<PathBuf>) -> Self {
        Self::StorageInUse { path: path.into() }
    }

    /// Creates an invalid file name error.
    pub fn invalid_file_name(name: impl Into<String>) -> Self {
        Self::InvalidFileName { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_mismatch_formats_hex() {
        let err = StoreError::checksum_mismatch(FileId::new(3), 42, 0xDEAD_BEEF, 0x0000_00FF);
        let message = err.to_string();
        assert!(message.contains("file 3"));
        assert!(message.contains("offset 42"));
        assert!(message.contains("deadbeef"));
        assert!(message.contains("000000ff"));
    }

    #[test]
    fn storage_in_use_mentions_path() {
        let err = StoreError::storage_in_use("/tmp/db/.lock");
        assert!(err.to_string().contains("/tmp/db/.lock"));
    }
}
