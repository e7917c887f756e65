//! Log compaction.
//!
//! Compaction rewrites every live record into one fresh data file,
//! writes a hint snapshot alongside it, and deletes the files the
//! records came from. This module provides the [`run`] routine the
//! store invokes under its exclusive lock.
//!
//! ## Invariants
//!
//! - Compaction never changes logical state: every live key keeps its
//!   value and no deleted key comes back
//! - The target file is a valid record log in its own right: each
//!   copied record gets a trailer pointing at its new offset, so the
//!   backward chain replays even if the hint file is lost
//! - The hint snapshot reproduces exactly what a full replay of the
//!   target would produce
//! - Two file ids are consumed per run: the lower for the target, the
//!   higher for the fresh active file that receives appends afterwards

use crate::dir::StoreDir;
use crate::error::StoreResult;
use crate::keydir::KeyDir;
use crate::log::files::{FileHandle, FileTable};
use crate::log::hint;
use crate::log::record::{Record, TRAILER_LEN};
use crate::types::FileId;
use caskdb_storage::{FileBackend, StorageBackend};
use tracing::info;

/// Result of a compaction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionOutcome {
    /// Id of the file now holding every live record.
    pub target_file_id: FileId,
    /// Id of the fresh file receiving appends after the run.
    pub active_file_id: FileId,
    /// Number of live records carried into the target.
    pub records_copied: usize,
    /// Bytes written to the target data file.
    pub bytes_copied: u64,
    /// Number of data files deleted from disk.
    pub files_retired: usize,
}

/// Rewrites all live records into a fresh file and retires the old ones.
///
/// Takes the current active file id and returns the outcome carrying
/// the two ids it consumed. The caller must adopt
/// [`CompactionOutcome::active_file_id`] as the new append target.
///
/// Every copied record is decoded first, so a record that fails its
/// checksum aborts the run with `CorruptedEntry` before any source
/// file is deleted. The index then still points at valid data: entries
/// copied so far reference the target, the rest their original files.
pub(crate) fn run(
    dir: &StoreDir,
    files: &mut FileTable,
    keydir: &mut KeyDir,
    active_file_id: FileId,
) -> StoreResult<CompactionOutcome> {
    let retired_ids = files.ids();
    let target_id = active_file_id.next();
    let next_active_id = target_id.next();

    let mut target = FileHandle::open(&dir.data_path(target_id))?;
    let mut snapshot = FileBackend::open(&dir.hint_path(target_id))?;

    let mut records_copied = 0;
    let mut bytes_copied = 0;

    for (key, entry) in keydir.iter_mut() {
        let source = files.get(entry.file_id)?;
        let mut bytes = source.read_at(entry.record_offset, entry.record_size as usize)?;
        Record::decode(&bytes, entry.file_id, entry.record_offset)?;

        let new_offset = target.total_size()?;
        let trailer_at = bytes.len() - TRAILER_LEN;
        bytes[trailer_at..].copy_from_slice(&new_offset.to_le_bytes());
        target.append(&bytes)?;
        snapshot.append(&hint::encode(key, entry.record_size, new_offset))?;

        entry.file_id = target_id;
        entry.record_offset = new_offset;
        records_copied += 1;
        bytes_copied += entry.record_size;
    }

    // Make the rewritten log durable before touching its sources.
    target.flush()?;
    target.sync()?;
    snapshot.flush()?;
    snapshot.sync()?;

    files.insert(target_id, target);
    files.insert(next_active_id, FileHandle::open(&dir.data_path(next_active_id))?);

    let mut files_retired = 0;
    for file_id in retired_ids {
        drop(files.remove(file_id));
        dir.remove_file_pair(file_id)?;
        files_retired += 1;
    }
    dir.sync()?;

    let outcome = CompactionOutcome {
        target_file_id: target_id,
        active_file_id: next_active_id,
        records_copied,
        bytes_copied,
        files_retired,
    };
    info!(
        target_file = %outcome.target_file_id,
        active_file = %outcome.active_file_id,
        records = outcome.records_copied,
        bytes = outcome.bytes_copied,
        retired = outcome.files_retired,
        "compaction finished"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::keydir::IndexEntry;
    use crate::log::record;
    use crate::recovery::{replay_data_file, replay_hint_file};
    use tempfile::tempdir;

    fn append_record(log: &mut Vec<u8>, key: &[u8], value: &[u8]) -> (u64, u64) {
        let offset = log.len() as u64;
        let buf = record::encode(key, value, offset);
        let size = buf.len() as u64;
        log.extend_from_slice(&buf);
        (size, offset)
    }

    /// One data file with a superseded record for `a` and live `a`/`b`.
    fn seed_store(dir: &StoreDir) -> (FileTable, KeyDir) {
        let mut log = Vec::new();
        let (stale_size, _) = append_record(&mut log, b"a", b"one");
        let (a_size, a_offset) = append_record(&mut log, b"a", b"two");
        let (b_size, b_offset) = append_record(&mut log, b"b", b"three");
        std::fs::write(dir.data_path(FileId::new(1)), &log).unwrap();

        let mut files = FileTable::new();
        let mut handle = FileHandle::open(&dir.data_path(FileId::new(1))).unwrap();
        handle.add_disposable(stale_size);
        files.insert(FileId::new(1), handle);

        let mut keydir = KeyDir::new();
        keydir.set(
            b"a".to_vec(),
            IndexEntry::new(FileId::new(1), a_size, a_offset),
        );
        keydir.set(
            b"b".to_vec(),
            IndexEntry::new(FileId::new(1), b_size, b_offset),
        );
        (files, keydir)
    }

    #[test]
    fn rewrites_live_records_and_retires_sources() {
        let temp = tempdir().unwrap();
        let dir = StoreDir::new(temp.path());
        let (mut files, mut keydir) = seed_store(&dir);

        let outcome = run(&dir, &mut files, &mut keydir, FileId::new(1)).unwrap();

        assert_eq!(outcome.target_file_id, FileId::new(2));
        assert_eq!(outcome.active_file_id, FileId::new(3));
        assert_eq!(outcome.records_copied, 2);
        assert_eq!(outcome.files_retired, 1);

        assert!(!dir.data_path(FileId::new(1)).exists());
        assert!(dir.data_path(FileId::new(2)).exists());
        assert!(dir.has_hint(FileId::new(2)));
        assert!(dir.data_path(FileId::new(3)).exists());
        assert_eq!(files.ids(), vec![FileId::new(2), FileId::new(3)]);

        // Entries were repointed and decode cleanly at their new homes,
        // which also proves the trailer was rewritten.
        for (key, value) in [(b"a".as_slice(), b"two".as_slice()), (b"b", b"three")] {
            let entry = keydir.get(key).unwrap();
            assert_eq!(entry.file_id, FileId::new(2));
            let bytes = files
                .get(entry.file_id)
                .unwrap()
                .read_at(entry.record_offset, entry.record_size as usize)
                .unwrap();
            let record = Record::decode(&bytes, entry.file_id, entry.record_offset).unwrap();
            assert_eq!(record.value, value);
        }

        // Nothing disposable survives a run.
        assert!(files.iter().all(|(_, handle)| handle.disposable_bytes() == 0));
    }

    #[test]
    fn hint_matches_full_replay_of_target() {
        let temp = tempdir().unwrap();
        let dir = StoreDir::new(temp.path());
        let (mut files, mut keydir) = seed_store(&dir);

        let outcome = run(&dir, &mut files, &mut keydir, FileId::new(1)).unwrap();
        let target_id = outcome.target_file_id;

        let replay = replay_data_file(files.get(target_id).unwrap().backend(), target_id).unwrap();
        assert!(replay.tombstoned.is_empty());
        assert_eq!(replay.disposable_bytes, 0);

        let snapshot = FileBackend::open(&dir.hint_path(target_id)).unwrap();
        let mut from_hint = replay_hint_file(&snapshot, target_id).unwrap();
        let mut from_log = replay.entries;
        from_hint.sort_by(|a, b| a.0.cmp(&b.0));
        from_log.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(from_hint, from_log);

        for (key, entry) in from_hint {
            assert_eq!(keydir.get(&key), Some(&entry));
        }
    }

    #[test]
    fn empty_index_still_retires_files() {
        let temp = tempdir().unwrap();
        let dir = StoreDir::new(temp.path());

        let mut log = Vec::new();
        append_record(&mut log, b"gone", b"value");
        append_record(&mut log, b"gone", record::TOMBSTONE);
        std::fs::write(dir.data_path(FileId::new(1)), &log).unwrap();

        let mut files = FileTable::new();
        files.insert(
            FileId::new(1),
            FileHandle::open(&dir.data_path(FileId::new(1))).unwrap(),
        );
        let mut keydir = KeyDir::new();

        let outcome = run(&dir, &mut files, &mut keydir, FileId::new(1)).unwrap();

        assert_eq!(outcome.records_copied, 0);
        assert_eq!(outcome.files_retired, 1);
        assert!(!dir.data_path(FileId::new(1)).exists());
        assert_eq!(
            files.get(FileId::new(2)).unwrap().total_size().unwrap(),
            0
        );
    }

    #[test]
    fn aborts_on_corrupt_source_record() {
        let temp = tempdir().unwrap();
        let dir = StoreDir::new(temp.path());

        let mut log = Vec::new();
        let (size, offset) = append_record(&mut log, b"k", b"value");
        log[record::HEADER_LEN + 1] ^= 0xFF;
        std::fs::write(dir.data_path(FileId::new(1)), &log).unwrap();

        let mut files = FileTable::new();
        files.insert(
            FileId::new(1),
            FileHandle::open(&dir.data_path(FileId::new(1))).unwrap(),
        );
        let mut keydir = KeyDir::new();
        keydir.set(b"k".to_vec(), IndexEntry::new(FileId::new(1), size, offset));

        let result = run(&dir, &mut files, &mut keydir, FileId::new(1));
        assert!(matches!(result, Err(StoreError::CorruptedEntry { .. })));
        assert!(dir.data_path(FileId::new(1)).exists());
    }
}
