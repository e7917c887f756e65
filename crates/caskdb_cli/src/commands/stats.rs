//! Stats command implementation.

use caskdb_core::Store;
use std::path::Path;

/// Runs the stats command.
pub fn run(path: &Path, threshold: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(path)?;
    let stats = store.statistics()?;

    println!("Store at {:?}", path);
    println!();
    println!("  Data files:       {}", stats.data_files);
    println!("  Live keys:        {}", stats.live_keys);
    println!("  Total bytes:      {}", stats.total_bytes);
    println!("  Disposable bytes: {}", stats.disposable_bytes);
    println!(
        "  Reclaimable:      {:.1}%",
        stats.reclaimable_ratio() * 100.0
    );

    if let Some(bytes) = threshold {
        let due = stats.needs_compaction(Some(bytes));
        println!(
            "  Compaction due:   {} (threshold {} bytes)",
            if due { "yes" } else { "no" },
            bytes
        );
    }

    Ok(())
}
