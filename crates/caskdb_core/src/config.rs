//! Store configuration.

/// Configuration for opening a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Disposable-byte threshold used by [`crate::Statistics::needs_compaction`].
    ///
    /// The engine never compacts on its own; this value only feeds the
    /// advisory check. `None` disables the advice entirely.
    pub compaction_threshold: Option<u64>,

    /// Whether dropping the store closes it (flushes files, removes the
    /// lock marker). Disable when the caller wants to manage close
    /// failures explicitly via [`crate::Store::close`].
    pub auto_close: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compaction_threshold: None,
            auto_close: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the disposable-byte threshold for compaction advice.
    #[must_use]
    pub const fn compaction_threshold(mut self, bytes: u64) -> Self {
        self.compaction_threshold = Some(bytes);
        self
    }

    /// Sets whether dropping the store closes it.
    #[must_use]
    pub const fn auto_close(mut self, value: bool) -> Self {
        self.auto_close = value;
        self
    }
}
