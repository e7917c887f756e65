//! Put command implementation.

use caskdb_core::Store;
use std::path::Path;

/// Runs the put command.
pub fn run(path: &Path, key: &[u8], value: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(path)?;
    store.put(key, value)?;
    store.sync()?;
    println!(
        "Stored {} ({} bytes)",
        String::from_utf8_lossy(key),
        value.len()
    );
    Ok(())
}
