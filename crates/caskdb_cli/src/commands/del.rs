//! Del command implementation.

use caskdb_core::Store;
use std::path::Path;

/// Runs the del command.
pub fn run(path: &Path, key: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(path)?;
    store.delete(key)?;
    store.sync()?;
    println!("Deleted {}", String::from_utf8_lossy(key));
    Ok(())
}
