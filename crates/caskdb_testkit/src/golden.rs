//! Golden vectors for on-disk format verification.
//!
//! The record and hint layouts are pinned here as hex-encoded byte
//! strings. A codec change that alters what lands on disk fails these
//! vectors before it silently breaks reopening an existing store.

/// Encodes bytes as hexadecimal string.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Decodes hexadecimal string to bytes.
pub fn hex_decode(hex: &str) -> Vec<u8> {
    let hex = hex.replace([' ', '\n', '\r'], "");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("Invalid hex"))
        .collect()
}

/// Data record test vectors.
pub mod record_vectors {
    /// One pinned data record encoding.
    #[derive(Debug, Clone)]
    pub struct RecordTestVector {
        /// Description of the test case
        pub description: &'static str,
        /// Record key
        pub key: &'static [u8],
        /// Record value
        pub value: &'static [u8],
        /// Offset the record starts at, echoed in the trailer
        pub record_offset: u64,
        /// Expected encoded bytes (hex-encoded)
        pub expected_hex: &'static str,
    }

    /// Returns the pinned data record vectors.
    #[must_use]
    pub fn standard_vectors() -> Vec<RecordTestVector> {
        vec![
            RecordTestVector {
                description: "Short text pair at the start of a file",
                key: b"name",
                value: b"Jason",
                record_offset: 0,
                expected_hex: "c160b053040000000000000005000000000000006e616d654a61736f6e0000000000000000",
            },
            RecordTestVector {
                description: "Tombstone for key 'k' at offset 37",
                key: b"k",
                value: b"CASKDB_TOMBSTONE_VALUE",
                record_offset: 37,
                expected_hex: "7ed11ee6010000000000000016000000000000006b4341534b44425f544f4d4253544f4e455f56414c55452500000000000000",
            },
            RecordTestVector {
                description: "Empty key and empty value at offset 99",
                key: b"",
                value: b"",
                record_offset: 99,
                expected_hex: "00000000000000000000000000000000000000006300000000000000",
            },
        ]
    }
}

/// Hint record test vectors.
pub mod hint_vectors {
    /// One pinned hint record encoding.
    #[derive(Debug, Clone)]
    pub struct HintTestVector {
        /// Description of the test case
        pub description: &'static str,
        /// Hinted key
        pub key: &'static [u8],
        /// Size of the data record the hint points at
        pub record_size: u64,
        /// Offset of the data record the hint points at
        pub record_offset: u64,
        /// Expected encoded bytes (hex-encoded)
        pub expected_hex: &'static str,
    }

    /// Returns the pinned hint record vectors.
    #[must_use]
    pub fn standard_vectors() -> Vec<HintTestVector> {
        vec![
            HintTestVector {
                description: "Hint for a 37-byte record at offset 0",
                key: b"name",
                record_size: 37,
                record_offset: 0,
                expected_hex: "04000000000000006e616d6525000000000000000000000000000000",
            },
            HintTestVector {
                description: "Hint for an empty-key record at offset 4096",
                key: b"",
                record_size: 28,
                record_offset: 4096,
                expected_hex: "00000000000000001c000000000000000010000000000000",
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caskdb_core::log::{hint, record};
    use caskdb_core::FileId;

    #[test]
    fn test_hex_roundtrip() {
        let original = vec![0x00, 0x01, 0xff, 0xab, 0xcd];
        let encoded = hex_encode(&original);
        let decoded = hex_decode(&encoded);
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_record_encoding_matches_vectors() {
        for vector in record_vectors::standard_vectors() {
            let encoded = record::encode(vector.key, vector.value, vector.record_offset);
            assert_eq!(
                hex_encode(&encoded),
                vector.expected_hex,
                "Vector '{}' encoded differently",
                vector.description
            );
        }
    }

    #[test]
    fn test_record_vectors_decode() {
        for vector in record_vectors::standard_vectors() {
            let bytes = hex_decode(vector.expected_hex);
            let decoded = record::Record::decode(&bytes, FileId::new(1), vector.record_offset)
                .expect("Failed to decode record vector");
            assert_eq!(decoded.key, vector.key, "Vector '{}'", vector.description);
            assert_eq!(decoded.value, vector.value, "Vector '{}'", vector.description);
            assert_eq!(
                decoded.back_offset, vector.record_offset,
                "Vector '{}'",
                vector.description
            );
        }
    }

    #[test]
    fn test_hint_encoding_matches_vectors() {
        for vector in hint_vectors::standard_vectors() {
            let encoded = hint::encode(vector.key, vector.record_size, vector.record_offset);
            assert_eq!(
                hex_encode(&encoded),
                vector.expected_hex,
                "Vector '{}' encoded differently",
                vector.description
            );
        }
    }

    #[test]
    fn test_hint_vectors_decode() {
        for vector in hint_vectors::standard_vectors() {
            let bytes = hex_decode(vector.expected_hex);
            let mut cursor = 0;
            let decoded = hint::HintRecord::decode(&bytes, &mut cursor, FileId::new(1))
                .expect("Failed to decode hint vector");
            assert_eq!(decoded.key, vector.key, "Vector '{}'", vector.description);
            assert_eq!(
                decoded.record_size, vector.record_size,
                "Vector '{}'",
                vector.description
            );
            assert_eq!(
                decoded.record_offset, vector.record_offset,
                "Vector '{}'",
                vector.description
            );
            assert_eq!(cursor, bytes.len(), "Vector '{}'", vector.description);
        }
    }

    #[test]
    fn test_tombstone_vector_is_recognized() {
        let vector = &record_vectors::standard_vectors()[1];
        let bytes = hex_decode(vector.expected_hex);
        let decoded = record::Record::decode(&bytes, FileId::new(1), vector.record_offset)
            .expect("Failed to decode tombstone vector");
        assert!(decoded.is_tombstone());
    }
}
