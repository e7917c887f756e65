//! Verify command implementation.

use caskdb_core::log::hint::HintRecord;
use caskdb_core::log::record::{Record, RecordHeader, HEADER_LEN};
use caskdb_core::{FileId, StoreDir};
use caskdb_storage::{FileBackend, StorageBackend};
use std::path::Path;

/// Verification result for one file.
#[derive(Debug)]
pub struct VerifyResult {
    /// Number of records checked.
    pub records_checked: usize,
    /// Number of valid records.
    pub valid_records: usize,
    /// Number of corrupt records.
    pub corrupt_records: usize,
    /// List of errors found.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn new() -> Self {
        Self {
            records_checked: 0,
            valid_records: 0,
            corrupt_records: 0,
            errors: Vec::new(),
        }
    }

    fn is_ok(&self) -> bool {
        self.corrupt_records == 0 && self.errors.is_empty()
    }
}

/// Runs the verify command.
///
/// Reads the files directly rather than opening the store, so a
/// directory left locked by a crashed process can still be checked.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let dir = StoreDir::new(path);
    if !dir.exists() {
        return Err(format!("no store directory at {path:?}").into());
    }

    println!("Verifying store at {:?}", path);
    println!();

    let mut all_ok = true;
    for file_id in dir.data_file_ids()? {
        println!("Checking {file_id}.data...");
        let backend = FileBackend::open(&dir.data_path(file_id))?;
        let data_result = verify_data_file(&backend, file_id)?;
        print_result(&data_result);
        all_ok &= data_result.is_ok();

        if dir.has_hint(file_id) {
            println!("Checking {file_id}.hint...");
            let hints = FileBackend::open(&dir.hint_path(file_id))?;
            let hint_result = verify_hint_file(&hints, &backend, file_id)?;
            print_result(&hint_result);
            all_ok &= hint_result.is_ok();
        }
    }

    println!();
    if all_ok {
        println!("✓ Store verification passed");
        Ok(())
    } else {
        println!("✗ Store verification failed");
        Err("Verification failed".into())
    }
}

/// Walks a data file front to back, decoding every record.
fn verify_data_file(
    backend: &dyn StorageBackend,
    file_id: FileId,
) -> Result<VerifyResult, Box<dyn std::error::Error>> {
    let mut result = VerifyResult::new();
    let size = backend.size()?;
    let mut offset = 0u64;

    while offset < size {
        result.records_checked += 1;

        if size - offset < HEADER_LEN as u64 {
            result.errors.push(format!(
                "truncated header at offset {}: only {} bytes left",
                offset,
                size - offset
            ));
            result.corrupt_records += 1;
            break;
        }

        let header_bytes = backend.read_at(offset, HEADER_LEN)?;
        let header = match RecordHeader::decode(&header_bytes, file_id, offset) {
            Ok(header) => header,
            Err(err) => {
                result.errors.push(err.to_string());
                result.corrupt_records += 1;
                break;
            }
        };

        let record_len = header.record_len();
        if record_len > size - offset {
            result.errors.push(format!(
                "truncated record at offset {}: needs {} bytes, only {} available",
                offset,
                record_len,
                size - offset
            ));
            result.corrupt_records += 1;
            break;
        }

        // The lengths are plausible, so a bad checksum or trailer does
        // not stop the walk from stepping to the next record.
        let record_bytes = backend.read_at(offset, record_len as usize)?;
        match Record::decode(&record_bytes, file_id, offset) {
            Ok(_) => result.valid_records += 1,
            Err(err) => {
                result.errors.push(err.to_string());
                result.corrupt_records += 1;
            }
        }

        offset += record_len;
    }

    Ok(result)
}

/// Checks every hint entry against the record it points at.
fn verify_hint_file(
    hints: &dyn StorageBackend,
    data: &dyn StorageBackend,
    file_id: FileId,
) -> Result<VerifyResult, Box<dyn std::error::Error>> {
    let mut result = VerifyResult::new();
    let size = hints.size()?;
    let bytes = hints.read_at(0, size as usize)?;

    let mut cursor = 0;
    while cursor < bytes.len() {
        result.records_checked += 1;

        let hint = match HintRecord::decode(&bytes, &mut cursor, file_id) {
            Ok(hint) => hint,
            Err(err) => {
                result.errors.push(err.to_string());
                result.corrupt_records += 1;
                break;
            }
        };

        match read_hinted_record(data, file_id, &hint) {
            Ok(record) if record.key == hint.key => result.valid_records += 1,
            Ok(_) => {
                result.errors.push(format!(
                    "hint entry at offset {} names a different key than its record",
                    hint.record_offset
                ));
                result.corrupt_records += 1;
            }
            Err(err) => {
                result.errors.push(err.to_string());
                result.corrupt_records += 1;
            }
        }
    }

    Ok(result)
}

fn read_hinted_record(
    data: &dyn StorageBackend,
    file_id: FileId,
    hint: &HintRecord,
) -> Result<Record, Box<dyn std::error::Error>> {
    let bytes = data.read_at(hint.record_offset, hint.record_size as usize)?;
    Ok(Record::decode(&bytes, file_id, hint.record_offset)?)
}

fn print_result(result: &VerifyResult) {
    println!(
        "  records checked: {}, valid: {}, corrupt: {}",
        result.records_checked, result.valid_records, result.corrupt_records
    );
    for error in &result.errors {
        println!("    ERROR: {error}");
    }
}
