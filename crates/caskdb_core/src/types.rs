//! Core type definitions for CaskDB.

use std::fmt;

/// Identifier for a data file within the store directory.
///
/// File ids are decimal, start at `1` for a fresh store, and only grow.
/// A file id names both the data file (`<id>.data`) and its optional hint
/// snapshot (`<id>.hint`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(pub u64);

impl FileId {
    /// Creates a new file id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next file id.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_id_ordering() {
        let f1 = FileId::new(1);
        let f2 = FileId::new(2);
        assert!(f1 < f2);
    }

    #[test]
    fn file_id_next() {
        let id = FileId::new(5);
        assert_eq!(id.next().as_u64(), 6);
        assert_eq!(id.next().next().as_u64(), 7);
    }

    #[test]
    fn file_id_display_is_bare_decimal() {
        assert_eq!(format!("{}", FileId::new(42)), "42");
    }
}
