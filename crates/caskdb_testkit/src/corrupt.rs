//! Fault injection helpers for corruption and torn-write tests.
//!
//! These helpers damage a closed store's files on disk the way bad
//! hardware or an interrupted process would, so recovery paths can be
//! exercised deterministically.

use caskdb_core::{FileId, StoreDir};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Returns the on-disk path of a store's data file.
pub fn data_file_path(store_path: impl Into<PathBuf>, file_id: FileId) -> PathBuf {
    StoreDir::new(store_path).data_path(file_id)
}

/// Returns the on-disk path of a store's hint file.
pub fn hint_file_path(store_path: impl Into<PathBuf>, file_id: FileId) -> PathBuf {
    StoreDir::new(store_path).hint_path(file_id)
}

/// Flips every bit of one byte in a file.
///
/// # Panics
///
/// Panics if the file cannot be read or `offset` is past its end.
pub fn flip_byte(path: impl AsRef<Path>, offset: u64) {
    let path = path.as_ref();
    let mut bytes = fs::read(path).expect("Failed to read file");
    let index = offset as usize;
    assert!(
        index < bytes.len(),
        "Offset {offset} is past the end of {path:?} ({} bytes)",
        bytes.len()
    );
    bytes[index] ^= 0xFF;
    fs::write(path, bytes).expect("Failed to write file");
}

/// Truncates a file to `len` bytes, simulating a torn tail write.
pub fn truncate_to(path: impl AsRef<Path>, len: u64) {
    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .expect("Failed to open file");
    file.set_len(len).expect("Failed to truncate file");
}

/// Appends raw bytes to a file, simulating a partial record at the tail.
pub fn append_garbage(path: impl AsRef<Path>, garbage: &[u8]) {
    let mut bytes = fs::read(path.as_ref()).expect("Failed to read file");
    bytes.extend_from_slice(garbage);
    fs::write(path.as_ref(), bytes).expect("Failed to write file");
}

/// Returns the current length of a file in bytes.
pub fn file_len(path: impl AsRef<Path>) -> u64 {
    fs::metadata(path).expect("Failed to stat file").len()
}
