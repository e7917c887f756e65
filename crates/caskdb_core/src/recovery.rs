//! Index reconstruction at open time.
//!
//! Recovery walks every data file in ascending id order and rebuilds the
//! key index. Later files hold newer records, so an entry from a later
//! file displaces one from an earlier file, and a tombstone in a later
//! file removes an earlier entry altogether.
//!
//! Within a single data file the walk runs backward along the trailer
//! chain, newest record first. The first occurrence of a key wins and
//! every further occurrence is a superseded record counted toward the
//! file's disposable bytes.
//!
//! Files with a hint snapshot are replayed from the snapshot instead,
//! one forward scan proportional to the number of live keys.
//!
//! Replay is strict: any structural damage, checksum mismatch, or broken
//! trailer chain fails the open with `CorruptedEntry` rather than
//! silently dropping records.

use crate::dir::StoreDir;
use crate::error::{StoreError, StoreResult};
use crate::keydir::{IndexEntry, KeyDir};
use crate::log::files::{FileHandle, FileTable};
use crate::log::hint::HintRecord;
use crate::log::record::{Record, RecordHeader, HEADER_LEN, RECORD_OVERHEAD, TRAILER_LEN};
use crate::types::FileId;
use caskdb_storage::{FileBackend, StorageBackend};
use std::collections::HashSet;
use tracing::debug;

/// Outcome of replaying one data file in isolation.
#[derive(Debug, Default)]
pub(crate) struct FileReplay {
    /// Newest live record per key found in this file.
    pub entries: Vec<(Vec<u8>, IndexEntry)>,
    /// Keys whose newest record in this file is a tombstone.
    pub tombstoned: Vec<Vec<u8>>,
    /// Bytes of this file occupied by superseded records and tombstones.
    pub disposable_bytes: u64,
}

fn read_u64_at(backend: &dyn StorageBackend, offset: u64) -> StoreResult<u64> {
    let bytes = backend.read_at(offset, TRAILER_LEN)?;
    let mut raw = [0u8; TRAILER_LEN];
    raw.copy_from_slice(&bytes);
    Ok(u64::from_le_bytes(raw))
}

/// Replays one data file backward along its trailer chain.
pub(crate) fn replay_data_file(
    backend: &dyn StorageBackend,
    file_id: FileId,
) -> StoreResult<FileReplay> {
    let mut replay = FileReplay::default();
    let size = backend.size()?;
    if size == 0 {
        return Ok(replay);
    }

    let mut seen: HashSet<Vec<u8>> = HashSet::new();
    let mut chain_end = size;

    loop {
        if chain_end < RECORD_OVERHEAD {
            return Err(StoreError::corrupted(
                file_id,
                chain_end,
                format!("trailer chain cut: {chain_end} bytes cannot hold a record"),
            ));
        }

        let offset = read_u64_at(backend, chain_end - TRAILER_LEN as u64)?;
        if offset
            .checked_add(RECORD_OVERHEAD)
            .map_or(true, |min_end| min_end > chain_end)
        {
            return Err(StoreError::corrupted(
                file_id,
                offset,
                format!("trailer points at {offset}, past the record boundary {chain_end}"),
            ));
        }

        let header_bytes = backend.read_at(offset, HEADER_LEN)?;
        let header = RecordHeader::decode(&header_bytes, file_id, offset)?;
        let record_len = header.record_len();
        if offset.checked_add(record_len) != Some(chain_end) {
            return Err(StoreError::corrupted(
                file_id,
                offset,
                format!(
                    "record of {record_len} bytes at {offset} does not end at boundary {chain_end}"
                ),
            ));
        }

        let bytes = backend.read_at(offset, record_len as usize)?;
        let record = Record::decode(&bytes, file_id, offset)?;

        if seen.insert(record.key.clone()) {
            if record.is_tombstone() {
                replay.disposable_bytes += record_len;
                replay.tombstoned.push(record.key);
            } else {
                replay
                    .entries
                    .push((record.key, IndexEntry::new(file_id, record_len, offset)));
            }
        } else {
            // An older record for a key already resolved in this file.
            replay.disposable_bytes += record_len;
        }

        if offset == 0 {
            break;
        }
        chain_end = offset;
    }

    Ok(replay)
}

/// Replays a hint snapshot with a single forward scan.
pub(crate) fn replay_hint_file(
    backend: &dyn StorageBackend,
    file_id: FileId,
) -> StoreResult<Vec<(Vec<u8>, IndexEntry)>> {
    let size = backend.size()?;
    let bytes = backend.read_at(0, size as usize)?;

    let mut entries = Vec::new();
    let mut cursor = 0;
    while cursor < bytes.len() {
        let hint = HintRecord::decode(&bytes, &mut cursor, file_id)?;
        entries.push((
            hint.key,
            IndexEntry::new(file_id, hint.record_size, hint.record_offset),
        ));
    }

    Ok(entries)
}

/// Rebuilds the open-file table and key index from the store directory.
///
/// `files` and `keydir` are expected to be empty; every discovered data
/// file is opened into the table, replayed, and its effects folded into
/// the index and the per-file disposable counters.
pub(crate) fn replay_store(
    dir: &StoreDir,
    files: &mut FileTable,
    keydir: &mut KeyDir,
) -> StoreResult<()> {
    for file_id in dir.data_file_ids()? {
        let handle = FileHandle::open(&dir.data_path(file_id))?;
        files.insert(file_id, handle);

        if dir.has_hint(file_id) {
            let hint_backend = FileBackend::open(&dir.hint_path(file_id))?;
            let entries = replay_hint_file(&hint_backend, file_id)?;
            debug!(file_id = %file_id, entries = entries.len(), "replayed hint file");

            for (key, entry) in entries {
                if let Some(old) = keydir.set(key, entry) {
                    files.get_mut(old.file_id)?.add_disposable(old.record_size);
                }
            }
        } else {
            let replay = replay_data_file(files.get(file_id)?.backend(), file_id)?;
            debug!(
                file_id = %file_id,
                live = replay.entries.len(),
                tombstones = replay.tombstoned.len(),
                disposable = replay.disposable_bytes,
                "replayed data file"
            );

            files.get_mut(file_id)?.add_disposable(replay.disposable_bytes);

            for (key, entry) in replay.entries {
                if let Some(old) = keydir.set(key, entry) {
                    files.get_mut(old.file_id)?.add_disposable(old.record_size);
                }
            }
            for key in replay.tombstoned {
                if let Some(old) = keydir.remove(&key) {
                    files.get_mut(old.file_id)?.add_disposable(old.record_size);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::hint;
    use crate::log::record::{self, TOMBSTONE};
    use caskdb_storage::InMemoryBackend;
    use tempfile::tempdir;

    const FILE: FileId = FileId::new(1);

    /// Appends an encoded record, returning `(size, offset)`.
    fn append_record(log: &mut Vec<u8>, key: &[u8], value: &[u8]) -> (u64, u64) {
        let offset = log.len() as u64;
        let buf = record::encode(key, value, offset);
        let size = buf.len() as u64;
        log.extend_from_slice(&buf);
        (size, offset)
    }

    #[test]
    fn replay_empty_file() {
        let backend = InMemoryBackend::new();
        let replay = replay_data_file(&backend, FILE).unwrap();

        assert!(replay.entries.is_empty());
        assert!(replay.tombstoned.is_empty());
        assert_eq!(replay.disposable_bytes, 0);
    }

    #[test]
    fn replay_single_put() {
        let mut log = Vec::new();
        let (size, offset) = append_record(&mut log, b"name", b"Jason");

        let backend = InMemoryBackend::with_data(log);
        let replay = replay_data_file(&backend, FILE).unwrap();

        assert_eq!(
            replay.entries,
            vec![(b"name".to_vec(), IndexEntry::new(FILE, size, offset))]
        );
        assert_eq!(replay.disposable_bytes, 0);
    }

    #[test]
    fn replay_newest_record_wins() {
        let mut log = Vec::new();
        let (old_size, _) = append_record(&mut log, b"height", b"180");
        let (new_size, new_offset) = append_record(&mut log, b"height", b"190");

        let backend = InMemoryBackend::with_data(log);
        let replay = replay_data_file(&backend, FILE).unwrap();

        assert_eq!(
            replay.entries,
            vec![(
                b"height".to_vec(),
                IndexEntry::new(FILE, new_size, new_offset)
            )]
        );
        assert_eq!(replay.disposable_bytes, old_size);
    }

    #[test]
    fn replay_tombstone_suppresses_key() {
        let mut log = Vec::new();
        let (put_size, _) = append_record(&mut log, b"name", b"Jason");
        let (tomb_size, _) = append_record(&mut log, b"name", TOMBSTONE);

        let backend = InMemoryBackend::with_data(log);
        let replay = replay_data_file(&backend, FILE).unwrap();

        assert!(replay.entries.is_empty());
        assert_eq!(replay.tombstoned, vec![b"name".to_vec()]);
        assert_eq!(replay.disposable_bytes, put_size + tomb_size);
    }

    #[test]
    fn replay_mixed_history() {
        let mut log = Vec::new();
        let (a1_size, _) = append_record(&mut log, b"a", b"one");
        let (b1_size, _) = append_record(&mut log, b"b", b"one");
        let (a_tomb_size, _) = append_record(&mut log, b"a", TOMBSTONE);
        let (b2_size, b2_offset) = append_record(&mut log, b"b", b"two");

        let backend = InMemoryBackend::with_data(log);
        let replay = replay_data_file(&backend, FILE).unwrap();

        assert_eq!(
            replay.entries,
            vec![(b"b".to_vec(), IndexEntry::new(FILE, b2_size, b2_offset))]
        );
        assert_eq!(replay.tombstoned, vec![b"a".to_vec()]);
        assert_eq!(replay.disposable_bytes, a1_size + b1_size + a_tomb_size);
    }

    #[test]
    fn replay_rejects_torn_tail() {
        let mut log = Vec::new();
        append_record(&mut log, b"k", b"v");
        let half = record::encode(b"torn", b"record", log.len() as u64);
        log.extend_from_slice(&half[..half.len() / 2]);

        let backend = InMemoryBackend::with_data(log);
        let result = replay_data_file(&backend, FILE);
        assert!(matches!(result, Err(StoreError::CorruptedEntry { .. })));
    }

    #[test]
    fn replay_rejects_flipped_byte() {
        let mut log = Vec::new();
        append_record(&mut log, b"k", b"value");
        log[HEADER_LEN + 2] ^= 0xFF;

        let backend = InMemoryBackend::with_data(log);
        let result = replay_data_file(&backend, FILE);
        assert!(matches!(result, Err(StoreError::CorruptedEntry { .. })));
    }

    #[test]
    fn replay_rejects_undersized_file() {
        let backend = InMemoryBackend::with_data(vec![0u8; 12]);
        let result = replay_data_file(&backend, FILE);
        assert!(matches!(result, Err(StoreError::CorruptedEntry { .. })));
    }

    #[test]
    fn replay_hint_snapshot() {
        let mut snapshot = Vec::new();
        snapshot.extend_from_slice(&hint::encode(b"age", 31, 0));
        snapshot.extend_from_slice(&hint::encode(b"name", 37, 31));

        let backend = InMemoryBackend::with_data(snapshot);
        let entries = replay_hint_file(&backend, FILE).unwrap();

        assert_eq!(
            entries,
            vec![
                (b"age".to_vec(), IndexEntry::new(FILE, 31, 0)),
                (b"name".to_vec(), IndexEntry::new(FILE, 37, 31)),
            ]
        );
    }

    #[test]
    fn store_replay_tombstone_removes_entry_from_earlier_file() {
        let temp = tempdir().unwrap();
        let dir = StoreDir::new(temp.path());

        let mut file1 = Vec::new();
        let (put_size, _) = append_record(&mut file1, b"name", b"Jason");
        std::fs::write(dir.data_path(FileId::new(1)), &file1).unwrap();

        let mut file2 = Vec::new();
        let (tomb_size, _) = append_record(&mut file2, b"name", TOMBSTONE);
        std::fs::write(dir.data_path(FileId::new(2)), &file2).unwrap();

        let mut files = FileTable::new();
        let mut keydir = KeyDir::new();
        replay_store(&dir, &mut files, &mut keydir).unwrap();

        assert!(keydir.is_empty());
        assert_eq!(
            files.get(FileId::new(1)).unwrap().disposable_bytes(),
            put_size
        );
        assert_eq!(
            files.get(FileId::new(2)).unwrap().disposable_bytes(),
            tomb_size
        );
    }

    #[test]
    fn store_replay_later_file_wins() {
        let temp = tempdir().unwrap();
        let dir = StoreDir::new(temp.path());

        let mut file1 = Vec::new();
        let (old_size, _) = append_record(&mut file1, b"k", b"old");
        std::fs::write(dir.data_path(FileId::new(1)), &file1).unwrap();

        let mut file2 = Vec::new();
        let (new_size, new_offset) = append_record(&mut file2, b"k", b"new");
        std::fs::write(dir.data_path(FileId::new(2)), &file2).unwrap();

        let mut files = FileTable::new();
        let mut keydir = KeyDir::new();
        replay_store(&dir, &mut files, &mut keydir).unwrap();

        assert_eq!(
            keydir.get(b"k"),
            Some(&IndexEntry::new(FileId::new(2), new_size, new_offset))
        );
        assert_eq!(
            files.get(FileId::new(1)).unwrap().disposable_bytes(),
            old_size
        );
    }

    #[test]
    fn store_replay_prefers_hint_over_data_scan() {
        let temp = tempdir().unwrap();
        let dir = StoreDir::new(temp.path());

        // The data file content is never parsed when a hint exists, so
        // junk here proves the snapshot path is taken.
        std::fs::write(dir.data_path(FileId::new(1)), b"not a record log").unwrap();
        std::fs::write(dir.hint_path(FileId::new(1)), hint::encode(b"k", 30, 0)).unwrap();

        let mut files = FileTable::new();
        let mut keydir = KeyDir::new();
        replay_store(&dir, &mut files, &mut keydir).unwrap();

        assert_eq!(
            keydir.get(b"k"),
            Some(&IndexEntry::new(FileId::new(1), 30, 0))
        );
    }
}
