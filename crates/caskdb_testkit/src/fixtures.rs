//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores
//! and common test scenarios.

use caskdb_core::{Config, Store};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: Store,
    path: PathBuf,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TestStore {
    /// Creates a fresh store in a temporary directory.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a fresh store with the given configuration.
    pub fn with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("store");
        let store = Store::open_with_config(&path, config).expect("Failed to open store");
        Self {
            store,
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the store's directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Closes the store and opens it again from the same directory.
    ///
    /// The closed-and-reopened store sees only what made it to disk,
    /// which is what crash-recovery tests care about.
    pub fn reopen(self) -> Self {
        let TestStore {
            store,
            path,
            _temp_dir,
        } = self;
        let config = store.config();
        store.close().expect("Failed to close store");
        drop(store);

        let store = Store::open_with_config(&path, config).expect("Failed to reopen store");
        Self {
            store,
            path,
            _temp_dir,
        }
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a temporary store.
///
/// # Example
///
/// ```rust,ignore
/// use caskdb_testkit::with_temp_store;
///
/// #[test]
/// fn my_test() {
///     with_temp_store(|store| {
///         store.put(b"key", b"value").unwrap();
///     });
/// }
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&Store) -> R,
{
    let test_store = TestStore::new();
    f(&test_store.store)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a store holding `key_0..key_count` with small values.
    pub fn populated_store(key_count: usize) -> TestStore {
        let test_store = TestStore::new();
        for i in 0..key_count {
            test_store
                .store
                .put(format!("key_{i}").as_bytes(), format!("value_{i}").as_bytes())
                .expect("Failed to put key");
        }
        test_store
    }

    /// Creates a store with plenty of disposable bytes.
    ///
    /// Every key is overwritten once and every third key deleted, so
    /// compaction and statistics tests have something to chew on.
    pub fn churned_store(key_count: usize) -> TestStore {
        let test_store = populated_store(key_count);
        for i in 0..key_count {
            test_store
                .store
                .put(
                    format!("key_{i}").as_bytes(),
                    format!("rewritten_{i}").as_bytes(),
                )
                .expect("Failed to overwrite key");
        }
        for i in (0..key_count).step_by(3) {
            test_store
                .store
                .delete(format!("key_{i}").as_bytes())
                .expect("Failed to delete key");
        }
        test_store
    }
}
