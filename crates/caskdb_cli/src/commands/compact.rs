//! Compact command implementation.

use caskdb_core::Store;
use std::path::Path;

/// Runs the compact command.
pub fn run(path: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(path)?;
    let before = store.statistics()?;

    println!("Compacting store at {:?}", path);
    if dry_run {
        println!("(dry run - no changes will be made)");
    }
    println!();
    println!("  Data files:       {}", before.data_files);
    println!("  Live keys:        {}", before.live_keys);
    println!("  Total bytes:      {}", before.total_bytes);
    println!("  Disposable bytes: {}", before.disposable_bytes);

    if dry_run {
        println!();
        println!(
            "  Compaction would reclaim {} bytes ({:.1}%)",
            before.disposable_bytes,
            before.reclaimable_ratio() * 100.0
        );
        return Ok(());
    }

    let outcome = store.compact()?;
    let after = store.statistics()?;

    println!();
    println!("  Records copied: {}", outcome.records_copied);
    println!("  Files retired:  {}", outcome.files_retired);
    println!();
    println!("  Size before: {} bytes", before.total_bytes);
    println!("  Size after:  {} bytes", after.total_bytes);
    println!(
        "  Space saved: {} bytes",
        before.total_bytes.saturating_sub(after.total_bytes)
    );

    Ok(())
}
