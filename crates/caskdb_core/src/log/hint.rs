//! Hint file layout.
//!
//! A hint file is a compact index snapshot for one data file, written only
//! by compaction. Each entry locates one live record in the matching data
//! file:
//!
//! ```text
//! ┌─────────┬─────────┬─────────────┬───────────────┐
//! │ key_len │   key   │ record_size │ record_offset │
//! │ u64 LE  │  bytes  │   u64 LE    │    u64 LE     │
//! └─────────┴─────────┴─────────────┴───────────────┘
//! ```
//!
//! Recovery scans a hint file forward and builds index entries without
//! touching the data file's records, which makes reopening a compacted
//! store proportional to the number of live keys rather than total log
//! bytes. Hint entries carry no checksum; the data file remains the
//! authority and reads still verify record checksums.

use crate::error::{StoreError, StoreResult};
use crate::types::FileId;

/// Fixed bytes every hint entry carries beyond its key.
pub const HINT_OVERHEAD: u64 = 24;

/// Returns the encoded size of a hint entry for the given key size.
#[must_use]
pub const fn encoded_len(key_len: u64) -> u64 {
    HINT_OVERHEAD + key_len
}

/// Encodes one hint entry.
#[must_use]
pub fn encode(key: &[u8], record_size: u64, record_offset: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoded_len(key.len() as u64) as usize);

    buf.extend_from_slice(&(key.len() as u64).to_le_bytes());
    buf.extend_from_slice(key);
    buf.extend_from_slice(&record_size.to_le_bytes());
    buf.extend_from_slice(&record_offset.to_le_bytes());

    buf
}

/// A decoded hint entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintRecord {
    /// Key bytes.
    pub key: Vec<u8>,
    /// Encoded size of the record in the data file.
    pub record_size: u64,
    /// Byte offset of the record in the data file.
    pub record_offset: u64,
}

impl HintRecord {
    /// Decodes the hint entry starting at `*cursor` in `bytes`, advancing
    /// the cursor past it.
    ///
    /// `file_id` names the hint file for error context.
    ///
    /// # Errors
    ///
    /// Returns `CorruptedEntry` if the entry is truncated or its key
    /// length exceeds the remaining bytes.
    pub fn decode(bytes: &[u8], cursor: &mut usize, file_id: FileId) -> StoreResult<Self> {
        let start = *cursor;
        let remaining = (bytes.len() - start) as u64;

        if remaining < HINT_OVERHEAD {
            return Err(StoreError::corrupted(
                file_id,
                start as u64,
                format!("hint entry truncated: {remaining} bytes remaining"),
            ));
        }

        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes[start..start + 8]);
        let key_len = u64::from_le_bytes(raw);

        if key_len
            .checked_add(HINT_OVERHEAD)
            .map_or(true, |needed| needed > remaining)
        {
            return Err(StoreError::corrupted(
                file_id,
                start as u64,
                format!("hint entry key length {key_len} exceeds remaining {remaining} bytes"),
            ));
        }

        let key_start = start + 8;
        let key_end = key_start + key_len as usize;
        let key = bytes[key_start..key_end].to_vec();

        raw.copy_from_slice(&bytes[key_end..key_end + 8]);
        let record_size = u64::from_le_bytes(raw);
        raw.copy_from_slice(&bytes[key_end + 8..key_end + 16]);
        let record_offset = u64::from_le_bytes(raw);

        *cursor = key_end + 16;

        Ok(Self {
            key,
            record_size,
            record_offset,
        })
    }
}
