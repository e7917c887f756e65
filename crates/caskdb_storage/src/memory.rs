//! Heap-backed storage for tests and benchmarks.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};

/// A storage backend holding its bytes in a plain `Vec`.
///
/// Replay and record-format tests run against this backend to stay off
/// the file system, and the benchmarks use it to measure codec cost
/// without I/O noise. Nothing here survives the process.
///
/// Reads borrow the buffer and appends require exclusive access, so the
/// type is `Send + Sync` without any internal locking.
///
/// # Example
///
/// ```rust
/// use caskdb_storage::{StorageBackend, InMemoryBackend};
///
/// let mut backend = InMemoryBackend::new();
/// backend.append(b"abc").unwrap();
/// assert_eq!(backend.read_at(1, 2).unwrap(), b"bc");
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    bytes: Vec<u8>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend already holding `bytes`, as if they had been
    /// appended earlier. Replay tests build their log images this way.
    #[must_use]
    pub fn with_data(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Returns the stored bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let size = self.bytes.len() as u64;
        if offset.saturating_add(len as u64) > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        let start = offset as usize;
        Ok(self.bytes[start..start + len].to_vec())
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let offset = self.bytes.len() as u64;
        self.bytes.extend_from_slice(data);
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.bytes.len() as u64)
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }
}
