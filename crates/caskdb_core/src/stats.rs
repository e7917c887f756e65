//! Store statistics.

/// A point-in-time snapshot of store statistics.
///
/// Computed on demand from the open-file table and the key index; no
/// counters are maintained between calls. All byte figures refer to the
/// on-disk log, not to live key/value payload sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Statistics {
    /// Bytes occupied by superseded or tombstoned records, reclaimable
    /// by compaction.
    pub disposable_bytes: u64,
    /// Total bytes across all open data files.
    pub total_bytes: u64,
    /// Number of open data files.
    pub data_files: usize,
    /// Number of live keys in the index.
    pub live_keys: usize,
}

impl Statistics {
    /// Fraction of on-disk bytes that compaction would reclaim.
    ///
    /// Returns `0.0` for an empty store.
    #[must_use]
    pub fn reclaimable_ratio(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.disposable_bytes as f64 / self.total_bytes as f64
    }

    /// Whether disposable bytes have reached the configured threshold.
    ///
    /// Advisory only; see [`crate::Config::compaction_threshold`].
    #[must_use]
    pub fn needs_compaction(&self, threshold: Option<u64>) -> bool {
        match threshold {
            Some(bytes) => self.disposable_bytes >= bytes,
            None => false,
        }
    }
}
