//! Get command implementation.

use caskdb_core::Store;
use std::path::Path;

/// Runs the get command.
pub fn run(path: &Path, key: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(path)?;
    let value = store.get(key)?;
    println!("{}", String::from_utf8_lossy(&value));
    Ok(())
}
