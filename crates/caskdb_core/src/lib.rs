//! # CaskDB Core
//!
//! The CaskDB storage engine: an embedded, log-structured key-value
//! store in the Bitcask tradition.
//!
//! Every write appends a checksummed record to the active data file and
//! updates an in-memory index mapping each key to its newest on-disk
//! location. Reads are a single indexed seek. Deletes append a
//! tombstone record so they replay like any other write. Space held by
//! superseded records is reclaimed by compaction, which also writes
//! hint snapshots so later opens avoid full log replay.
//!
//! ## What this crate provides
//!
//! - [`Store`] - the engine: open/close lifecycle, put/get/delete,
//!   prefix scans, statistics, and compaction
//! - [`Config`] - tuning knobs for a store instance
//! - [`StoreDir`] - directory layout and the advisory lock marker
//! - [`log`] - the on-disk record and hint snapshot formats
//!
//! ## Example
//!
//! ```no_run
//! use caskdb_core::Store;
//!
//! # fn main() -> caskdb_core::StoreResult<()> {
//! let store = Store::open("/tmp/demo")?;
//! store.put(b"users_1", b"Jason")?;
//! store.put(b"users_2", b"Marta")?;
//!
//! let visited = store.scan(b"users_", |key, value| {
//!     println!("{:?} = {:?}", key, value);
//! })?;
//! assert_eq!(visited, 2);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod compaction;
mod config;
mod dir;
mod error;
mod keydir;
pub mod log;
mod recovery;
mod stats;
mod store;
mod types;

pub use compaction::CompactionOutcome;
pub use config::Config;
pub use dir::StoreDir;
pub use error::{StoreError, StoreResult};
pub use keydir::{IndexEntry, KeyDir};
pub use log::record::TOMBSTONE;
pub use stats::Statistics;
pub use store::Store;
pub use types::FileId;
