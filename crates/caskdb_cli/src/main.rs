//! CaskDB CLI
//!
//! Command-line tools for CaskDB stores.
//!
//! # Commands
//!
//! - `stats` - Display store statistics
//! - `verify` - Verify data and hint file integrity
//! - `compact` - Rewrite live records and reclaim space
//! - `get` / `put` / `del` - Single-key operations
//! - `scan` - List key/value pairs by key prefix

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// CaskDB command-line store tools.
#[derive(Parser)]
#[command(name = "caskdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display store statistics
    Stats {
        /// Report whether disposable bytes have reached this threshold
        #[arg(short, long)]
        threshold: Option<u64>,
    },

    /// Verify data and hint file integrity
    Verify,

    /// Rewrite live records into a fresh file and reclaim space
    Compact {
        /// Dry run - report reclaimable space without compacting
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Print the value stored under a key
    Get {
        /// Key to look up
        key: String,
    },

    /// Store a value under a key
    Put {
        /// Key to write
        key: String,

        /// Value to store
        value: String,
    },

    /// Delete a key
    Del {
        /// Key to delete
        key: String,
    },

    /// List key/value pairs by key prefix
    Scan {
        /// Key prefix to match (all keys when omitted)
        prefix: Option<String>,

        /// Maximum number of entries to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Stats { threshold } => {
            let path = cli.path.ok_or("Store path required for stats")?;
            commands::stats::run(&path, threshold)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Store path required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::Compact { dry_run } => {
            let path = cli.path.ok_or("Store path required for compact")?;
            commands::compact::run(&path, dry_run)?;
        }
        Commands::Get { key } => {
            let path = cli.path.ok_or("Store path required for get")?;
            commands::get::run(&path, key.as_bytes())?;
        }
        Commands::Put { key, value } => {
            let path = cli.path.ok_or("Store path required for put")?;
            commands::put::run(&path, key.as_bytes(), value.as_bytes())?;
        }
        Commands::Del { key } => {
            let path = cli.path.ok_or("Store path required for del")?;
            commands::del::run(&path, key.as_bytes())?;
        }
        Commands::Scan { prefix, limit } => {
            let path = cli.path.ok_or("Store path required for scan")?;
            let prefix = prefix.unwrap_or_default();
            commands::scan::run(&path, prefix.as_bytes(), limit)?;
        }
        Commands::Version => {
            println!("CaskDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("CaskDB Core v{}", caskdb_core::VERSION);
        }
    }

    Ok(())
}
