//! Durable storage backed by a file on disk.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A storage backend writing to a single file.
///
/// The file is opened in append mode, so every write lands at the end of
/// the file no matter where a read last left the cursor. Reads seek, and
/// take a mutex so concurrent readers cannot interleave their seek and
/// read steps on the shared cursor.
///
/// The size is tracked in memory and only measured once, at open.
///
/// # Durability
///
/// - `flush()` pushes buffered writes to the operating system
/// - `sync()` calls `File::sync_all()`, which makes data and metadata
///   durable across power loss
///
/// # Example
///
/// ```no_run
/// use caskdb_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("1.data")).unwrap();
/// let offset = backend.append(b"persistent data").unwrap();
/// backend.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    file: Mutex<File>,
    size: u64,
}

impl FileBackend {
    /// Opens the file at `path`, creating it when it does not exist.
    ///
    /// An existing file is never truncated; appends continue after its
    /// current contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created, or its
    /// size cannot be read.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            size,
        })
    }

    /// Returns the path this backend writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for FileBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        if offset.saturating_add(len as u64) > self.size {
            return Err(StorageError::ReadPastEnd {
                offset,
                len,
                size: self.size,
            });
        }
        if len == 0 {
            return Ok(Vec::new());
        }

        let mut buffer = vec![0u8; len];
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buffer)?;

        Ok(buffer)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let offset = self.size;
        self.file.get_mut().write_all(data)?;
        self.size += data.len() as u64;
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.file.get_mut().flush()?;
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.size)
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.file.get_mut().sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_in(dir: &tempfile::TempDir) -> FileBackend {
        FileBackend::open(&dir.path().join("log.bin")).unwrap()
    }

    #[test]
    fn open_creates_the_file() {
        let dir = tempdir().unwrap();
        let backend = open_in(&dir);

        assert_eq!(backend.size().unwrap(), 0);
        assert!(dir.path().join("log.bin").exists());
        assert_eq!(backend.path(), dir.path().join("log.bin"));
    }

    #[test]
    fn append_reports_prior_size_as_offset() {
        let dir = tempdir().unwrap();
        let mut backend = open_in(&dir);

        assert_eq!(backend.append(b"hello").unwrap(), 0);
        assert_eq!(backend.append(b" world").unwrap(), 5);
        assert_eq!(backend.size().unwrap(), 11);
    }

    #[test]
    fn read_back_slices() {
        let dir = tempdir().unwrap();
        let mut backend = open_in(&dir);
        backend.append(b"hello world").unwrap();

        assert_eq!(backend.read_at(0, 11).unwrap(), b"hello world");
        assert_eq!(backend.read_at(6, 5).unwrap(), b"world");
    }

    #[test]
    fn reads_do_not_move_the_append_position() {
        let dir = tempdir().unwrap();
        let mut backend = open_in(&dir);

        backend.append(b"abc").unwrap();
        backend.read_at(0, 1).unwrap();
        assert_eq!(backend.append(b"def").unwrap(), 3);
        assert_eq!(backend.read_at(0, 6).unwrap(), b"abcdef");
    }

    #[test]
    fn read_past_end_is_rejected() {
        let dir = tempdir().unwrap();
        let mut backend = open_in(&dir);
        backend.append(b"hello").unwrap();

        assert!(matches!(
            backend.read_at(10, 5),
            Err(StorageError::ReadPastEnd { .. })
        ));
        assert!(matches!(
            backend.read_at(3, 10),
            Err(StorageError::ReadPastEnd { .. })
        ));
    }

    #[test]
    fn zero_length_operations() {
        let dir = tempdir().unwrap();
        let mut backend = open_in(&dir);

        assert_eq!(backend.append(b"").unwrap(), 0);
        backend.append(b"hello").unwrap();
        assert!(backend.read_at(2, 0).unwrap().is_empty());
    }

    #[test]
    fn contents_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.bin");

        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.append(b"persistent data").unwrap();
            backend.sync().unwrap();
        }

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 15);
        assert_eq!(backend.read_at(0, 15).unwrap(), b"persistent data");
    }

    #[test]
    fn appends_continue_after_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.bin");

        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.append(b"first").unwrap();
        }

        let mut backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.append(b"second").unwrap(), 5);
        assert_eq!(backend.read_at(0, 11).unwrap(), b"firstsecond");
    }

    #[test]
    fn flush_and_sync_succeed() {
        let dir = tempdir().unwrap();
        let mut backend = open_in(&dir);
        backend.append(b"data").unwrap();

        assert!(backend.flush().is_ok());
        assert!(backend.sync().is_ok());
    }
}
