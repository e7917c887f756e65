//! Integration test harness.
//!
//! Drives a real store and an in-memory model side by side, asserting
//! after every step that the two agree. Sequences of generated
//! operations plus reopen and compact checkpoints catch index
//! bookkeeping bugs that single-operation tests miss.

use crate::fixtures::TestStore;
use crate::generators::StoreOperation;
use caskdb_core::Config;
use std::collections::BTreeMap;

/// Test harness that tracks expected store contents.
pub struct StoreHarness {
    store: TestStore,
    model: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl StoreHarness {
    /// Creates a new harness over a fresh store.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a new harness with the given store configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            store: TestStore::with_config(config),
            model: BTreeMap::new(),
        }
    }

    /// Writes a pair through both the store and the model.
    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.store.put(key, value).expect("Failed to put");
        self.model.insert(key.to_vec(), value.to_vec());
    }

    /// Deletes a key through both the store and the model.
    ///
    /// The store must agree with the model about whether the key
    /// existed.
    pub fn delete(&mut self, key: &[u8]) {
        let existed = self.model.remove(key).is_some();
        let result = self.store.delete(key);
        assert_eq!(
            existed,
            result.is_ok(),
            "Store and model disagree about deleting {key:?}"
        );
    }

    /// Applies one generated operation, checking reads against the model.
    pub fn apply(&mut self, op: StoreOperation) {
        match op {
            StoreOperation::Put { key, value } => self.put(&key, &value),
            StoreOperation::Delete { key } => self.delete(&key),
            StoreOperation::Get { key } => match self.model.get(&key) {
                Some(expected) => {
                    let actual = self.store.get(&key).expect("Failed to get tracked key");
                    assert_eq!(&actual, expected, "Wrong value for {key:?}");
                }
                None => {
                    assert!(
                        self.store.get(&key).is_err(),
                        "Store returned a value for untracked key {key:?}"
                    );
                }
            },
        }
    }

    /// Verifies that the store contents exactly match the model.
    pub fn verify_all(&self) {
        assert_eq!(
            self.store.len().expect("Failed to read length"),
            self.model.len(),
            "Live key count diverged from the model"
        );

        for (key, value) in &self.model {
            assert!(
                self.store.has(key).expect("Failed to check key"),
                "Tracked key {key:?} is missing"
            );
            let actual = self.store.get(key).expect("Failed to get tracked key");
            assert_eq!(&actual, value, "Wrong value for {key:?}");
        }

        let mut scanned = Vec::new();
        self.store
            .scan(b"", |key, value| {
                scanned.push((key.to_vec(), value.to_vec()));
            })
            .expect("Failed to scan");
        let expected: Vec<_> = self
            .model
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        assert_eq!(scanned, expected, "Scan order diverged from the model");
    }

    /// Closes and reopens the store, keeping the model.
    ///
    /// Everything the model tracks must survive the restart.
    pub fn reopen(self) -> Self {
        let Self { store, model } = self;
        Self {
            store: store.reopen(),
            model,
        }
    }

    /// Compacts the store. Compaction must never change logical contents.
    pub fn compact(&self) {
        self.store.compact().expect("Failed to compact");
    }

    /// Returns the number of tracked keys.
    pub fn tracked_count(&self) -> usize {
        self.model.len()
    }
}

impl Default for StoreHarness {
    fn default() -> Self {
        Self::new()
    }
}
