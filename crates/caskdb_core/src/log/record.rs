//! On-disk record layout.
//!
//! Every write to a data file appends one record:
//!
//! ```text
//! ┌──────────┬─────────┬───────────┬─────────┬───────────┬─────────────┐
//! │ checksum │ key_len │ value_len │   key   │   value   │ back_offset │
//! │  u32 LE  │ u64 LE  │  u64 LE   │  bytes  │   bytes   │   u64 LE    │
//! └──────────┴─────────┴───────────┴─────────┴───────────┴─────────────┘
//! ```
//!
//! The checksum covers `key ++ value` only. The trailing `back_offset`
//! holds the record's own start offset, which lets recovery walk a file
//! backward from its end: read the trailer, jump to the record start,
//! repeat until offset zero. The trailer is excluded from the checksum so
//! compaction can rewrite it when a record moves to a new file.
//!
//! Deletions are logged as ordinary records whose value is [`TOMBSTONE`].

use crate::error::{StoreError, StoreResult};
use crate::types::FileId;

/// Reserved value marking a deletion in the log.
///
/// [`crate::Store::put`] rejects it; recovery treats any record carrying
/// it as a delete event. Comparison is always by byte content.
pub const TOMBSTONE: &[u8] = b"CASKDB_TOMBSTONE_VALUE";

/// Size of the leading checksum field.
pub const CHECKSUM_LEN: usize = 4;
/// Size of each length field.
pub const LENGTH_LEN: usize = 8;
/// Size of the fixed record header: checksum + key_len + value_len.
pub const HEADER_LEN: usize = CHECKSUM_LEN + 2 * LENGTH_LEN;
/// Size of the trailing back_offset field.
pub const TRAILER_LEN: usize = LENGTH_LEN;
/// Fixed bytes every record carries beyond its key and value.
pub const RECORD_OVERHEAD: u64 = (HEADER_LEN + TRAILER_LEN) as u64;

/// Computes the checksum over `key ++ value`.
#[must_use]
pub fn checksum(key: &[u8], value: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(key);
    hasher.update(value);
    hasher.finalize()
}

/// Returns the encoded size of a record with the given key and value sizes.
#[must_use]
pub const fn encoded_len(key_len: u64, value_len: u64) -> u64 {
    RECORD_OVERHEAD + key_len + value_len
}

/// Encodes a record for appending at `record_offset` in a data file.
#[must_use]
pub fn encode(key: &[u8], value: &[u8], record_offset: u64) -> Vec<u8> {
    let total = encoded_len(key.len() as u64, value.len() as u64) as usize;
    let mut buf = Vec::with_capacity(total);

    buf.extend_from_slice(&checksum(key, value).to_le_bytes());
    buf.extend_from_slice(&(key.len() as u64).to_le_bytes());
    buf.extend_from_slice(&(value.len() as u64).to_le_bytes());
    buf.extend_from_slice(key);
    buf.extend_from_slice(value);
    buf.extend_from_slice(&record_offset.to_le_bytes());

    buf
}

/// Fixed-size header at the start of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Checksum over `key ++ value`.
    pub checksum: u32,
    /// Key size in bytes.
    pub key_len: u64,
    /// Value size in bytes.
    pub value_len: u64,
}

impl RecordHeader {
    /// Decodes a record header from the first [`HEADER_LEN`] bytes at
    /// `offset` in file `file_id`.
    ///
    /// # Errors
    ///
    /// Returns `CorruptedEntry` if the slice is too short or the length
    /// fields describe an impossibly large record.
    pub fn decode(bytes: &[u8], file_id: FileId, offset: u64) -> StoreResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(StoreError::corrupted(
                file_id,
                offset,
                format!("record header truncated: {} bytes", bytes.len()),
            ));
        }

        let read_u32 = |at: usize| -> u32 {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&bytes[at..at + 4]);
            u32::from_le_bytes(raw)
        };
        let read_u64 = |at: usize| -> u64 {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[at..at + 8]);
            u64::from_le_bytes(raw)
        };

        let header = Self {
            checksum: read_u32(0),
            key_len: read_u64(CHECKSUM_LEN),
            value_len: read_u64(CHECKSUM_LEN + LENGTH_LEN),
        };

        // Reject length fields whose sum cannot be represented, before any
        // caller does arithmetic on them.
        if header
            .key_len
            .checked_add(header.value_len)
            .and_then(|n| n.checked_add(RECORD_OVERHEAD))
            .is_none()
        {
            return Err(StoreError::corrupted(
                file_id,
                offset,
                format!(
                    "implausible record lengths: key_len {}, value_len {}",
                    header.key_len, header.value_len
                ),
            ));
        }

        Ok(header)
    }

    /// Returns the full encoded size of the record this header describes.
    #[must_use]
    pub const fn record_len(&self) -> u64 {
        encoded_len(self.key_len, self.value_len)
    }
}

/// A fully decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Key bytes.
    pub key: Vec<u8>,
    /// Value bytes. May be [`TOMBSTONE`] for a logged deletion.
    pub value: Vec<u8>,
    /// The record's own start offset, read from the trailer.
    pub back_offset: u64,
}

impl Record {
    /// Decodes and validates a complete record.
    ///
    /// `bytes` must hold exactly the record as stored, read from `offset`
    /// in file `file_id`. Validation covers the length fields, the
    /// checksum over `key ++ value`, and that the trailer points back at
    /// `offset`.
    ///
    /// # Errors
    ///
    /// Returns `CorruptedEntry` describing the first failed check.
    pub fn decode(bytes: &[u8], file_id: FileId, offset: u64) -> StoreResult<Self> {
        let header = RecordHeader::decode(bytes, file_id, offset)?;

        let expected_len = header.record_len();
        if bytes.len() as u64 != expected_len {
            return Err(StoreError::corrupted(
                file_id,
                offset,
                format!(
                    "record size mismatch: length fields describe {} bytes, got {}",
                    expected_len,
                    bytes.len()
                ),
            ));
        }

        let key_start = HEADER_LEN;
        let key_end = key_start + header.key_len as usize;
        let value_end = key_end + header.value_len as usize;

        let key = &bytes[key_start..key_end];
        let value = &bytes[key_end..value_end];

        let actual = checksum(key, value);
        if actual != header.checksum {
            return Err(StoreError::checksum_mismatch(
                file_id,
                offset,
                header.checksum,
                actual,
            ));
        }

        let mut raw = [0u8; TRAILER_LEN];
        raw.copy_from_slice(&bytes[value_end..]);
        let back_offset = u64::from_le_bytes(raw);
        if back_offset != offset {
            return Err(StoreError::corrupted(
                file_id,
                offset,
                format!("trailer points at offset {back_offset}, record starts at {offset}"),
            ));
        }

        Ok(Self {
            key: key.to_vec(),
            value: value.to_vec(),
            back_offset,
        })
    }

    /// Returns whether this record logs a deletion.
    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.value == TOMBSTONE
    }
}
