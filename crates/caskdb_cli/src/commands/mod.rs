//! CLI command implementations.

pub mod compact;
pub mod del;
pub mod get;
pub mod put;
pub mod scan;
pub mod stats;
pub mod verify;
