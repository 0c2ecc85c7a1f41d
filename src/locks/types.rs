//! Lock range and mode definitions.

use std::fmt;

/// Kind of advisory lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Many holders may coexist; excludes exclusive holders.
    Shared,
    /// Sole holder of its range.
    Exclusive,
}

impl LockMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockMode::Shared => "shared",
            LockMode::Exclusive => "exclusive",
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A byte range of a file.
///
/// A length of `u64::MAX` means "from `offset` to the end of the address
/// space", which covers the file no matter how much it grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockRange {
    pub offset: u64,
    pub len: u64,
}

impl LockRange {
    /// The whole file, including bytes not written yet.
    pub const WHOLE_FILE: LockRange = LockRange {
        offset: 0,
        len: u64::MAX,
    };

    pub const fn new(offset: u64, len: u64) -> Self {
        Self { offset, len }
    }

    /// A single byte at `offset`.
    pub const fn byte(offset: u64) -> Self {
        Self::new(offset, 1)
    }

    pub fn is_whole_file(&self) -> bool {
        *self == Self::WHOLE_FILE
    }

    /// Whether two ranges share at least one byte.
    pub fn overlaps(&self, other: &LockRange) -> bool {
        let self_end = self.offset.saturating_add(self.len);
        let other_end = other.offset.saturating_add(other.len);
        self.len > 0 && other.len > 0 && self.offset < other_end && other.offset < self_end
    }
}

impl fmt::Display for LockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_whole_file() {
            write!(f, "whole file")
        } else if self.len == u64::MAX {
            write!(f, "bytes {}..", self.offset)
        } else {
            write!(f, "bytes {}..{}", self.offset, self.offset.saturating_add(self.len))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_file_overlaps_everything() {
        assert!(LockRange::WHOLE_FILE.overlaps(&LockRange::byte(0)));
        assert!(LockRange::WHOLE_FILE.overlaps(&LockRange::byte(1 << 40)));
    }

    #[test]
    fn distinct_bytes_do_not_overlap() {
        assert!(!LockRange::byte(1).overlaps(&LockRange::byte(2)));
        assert!(LockRange::byte(2).overlaps(&LockRange::new(0, 3)));
    }

    #[test]
    fn display() {
        assert_eq!(LockRange::WHOLE_FILE.to_string(), "whole file");
        assert_eq!(LockRange::byte(3).to_string(), "bytes 3..4");
        assert_eq!(LockMode::Shared.to_string(), "shared");
    }

    #[test]
    fn display_clamps_range_past_end_of_address_space() {
        let range = LockRange::new(u64::MAX - 1, 5);
        assert_eq!(range.to_string(), format!("bytes {}..{}", u64::MAX - 1, u64::MAX));
        assert_eq!(LockRange::new(7, u64::MAX).to_string(), "bytes 7..");
    }
}
