//! Property-based test generators.
//!
//! Strategies for generating keys, values, and operation sequences
//! for use with proptest.

use caskdb_core::TOMBSTONE;
use proptest::prelude::*;

/// Generates arbitrary binary keys between 1 and 64 bytes.
pub fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..64)
}

/// Generates short textual keys drawn from a small alphabet.
///
/// The tiny keyspace makes overwrites and delete-then-put collisions
/// common, which is where index bookkeeping bugs hide.
pub fn text_key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::string::string_regex("[a-c]{1,8}")
        .expect("Invalid regex")
        .prop_map(String::into_bytes)
}

/// Generates arbitrary binary values up to 512 bytes.
///
/// The tombstone sentinel is filtered out because stores reject it.
pub fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
        .prop_filter("Value must not be the tombstone sentinel", |value| {
            value != TOMBSTONE
        })
}

/// A single operation against a store, for sequence-based tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    /// Write a key-value pair.
    Put {
        /// The key to write.
        key: Vec<u8>,
        /// The value to write.
        value: Vec<u8>,
    },
    /// Remove a key.
    Delete {
        /// The key to remove.
        key: Vec<u8>,
    },
    /// Read a key.
    Get {
        /// The key to read.
        key: Vec<u8>,
    },
}

/// Generates a single store operation.
///
/// Puts are weighted heaviest so sequences build up state to read
/// back and delete.
pub fn store_operation_strategy() -> impl Strategy<Value = StoreOperation> {
    prop_oneof![
        3 => (text_key_strategy(), value_strategy())
            .prop_map(|(key, value)| StoreOperation::Put { key, value }),
        1 => text_key_strategy().prop_map(|key| StoreOperation::Delete { key }),
        2 => text_key_strategy().prop_map(|key| StoreOperation::Get { key }),
    ]
}

/// Generates a sequence of store operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StoreOperation>> {
    prop::collection::vec(store_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property-based tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum number of shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn keys_respect_bounds(key in key_strategy()) {
            prop_assert!(!key.is_empty());
            prop_assert!(key.len() < 64);
        }

        #[test]
        fn text_keys_use_small_alphabet(key in text_key_strategy()) {
            prop_assert!(!key.is_empty());
            prop_assert!(key.iter().all(|byte| (b'a'..=b'c').contains(byte)));
        }

        #[test]
        fn values_never_equal_the_tombstone(value in value_strategy()) {
            prop_assert_ne!(value, TOMBSTONE.to_vec());
        }

        #[test]
        fn operation_sequences_respect_length(
            ops in operation_sequence_strategy(1, 20)
        ) {
            prop_assert!(!ops.is_empty());
            prop_assert!(ops.len() < 20);
        }
    }

    #[test]
    fn test_config_presets() {
        assert!(PropTestConfig::quick().cases < PropTestConfig::default().cases);
        assert!(PropTestConfig::thorough().cases > PropTestConfig::default().cases);
    }
}
