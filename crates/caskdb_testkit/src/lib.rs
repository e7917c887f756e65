//! # CaskDB Testkit
//!
//! Test utilities for CaskDB.
//!
//! This crate provides:
//! - Test fixtures and store helpers
//! - Property-based test generators using proptest
//! - Golden byte vectors pinning the on-disk formats
//! - File corruption helpers for recovery testing
//! - A model-tracking harness for cross-crate integration tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use caskdb_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_store() {
//!     with_temp_store(|store| {
//!         store.put(b"key", b"value").unwrap();
//!         // ... test operations
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod corrupt;
pub mod fixtures;
pub mod generators;
pub mod golden;
pub mod integration;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::corrupt::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::golden::*;
    pub use crate::integration::*;
}

pub use corrupt::*;
pub use fixtures::*;
pub use generators::*;
pub use golden::*;
pub use integration::*;
