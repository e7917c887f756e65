//! Scan command implementation.

use caskdb_core::Store;
use std::path::Path;

/// Runs the scan command.
pub fn run(
    path: &Path,
    prefix: &[u8],
    limit: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(path)?;
    let max = limit.unwrap_or(usize::MAX);

    let mut printed = 0usize;
    let visited = store.scan(prefix, |key, value| {
        if printed < max {
            println!(
                "{} = {}",
                String::from_utf8_lossy(key),
                String::from_utf8_lossy(value)
            );
            printed += 1;
        }
    })?;

    println!();
    println!("{visited} entries match");
    Ok(())
}
