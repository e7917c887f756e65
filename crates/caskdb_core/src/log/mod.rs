//! On-disk log formats and open-file management.
//!
//! A store directory contains:
//!
//! ```text
//! <store_path>/
//! ├─ 1.data            # Append-only record log (file id 1)
//! ├─ 2.data            # Older ids are frozen once a newer id exists
//! ├─ 2.hint            # Index snapshot for 2.data, written by compaction
//! └─ .lock             # Advisory marker blocking concurrent opens
//! ```
//!
//! [`record`] defines the record layout shared by all data files,
//! [`hint`] the snapshot layout, and [`files`] the handle and table
//! types the engine keeps per open file.

pub mod files;
pub mod hint;
pub mod record;
