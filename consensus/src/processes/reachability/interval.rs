use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

/// An inclusive interval of tree positions. A node's interval contains the
/// intervals of all its tree descendants, which makes ancestry queries a
/// containment check.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
}

impl Interval {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// The full allocatable range. The edges are reserved so that sibling
    /// comparisons never wrap.
    pub fn maximal() -> Self {
        Self::new(1, u64::MAX - 1)
    }

    pub fn empty() -> Self {
        Self::new(1, 0)
    }

    /// Intervals are allowed to be empty (`end == start - 1`), which
    /// represents a node with no remaining allocation capacity.
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn size(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn contains(&self, other: Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Splits into two halves, the first no smaller than the second.
    pub fn split_half(&self) -> (Self, Self) {
        let left_size = self.size().div_ceil(2);
        (Self::new(self.start, self.start + left_size - 1), Self::new(self.start + left_size, self.end))
    }
}

impl Debug for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basics() {
        let interval = Interval::new(10, 19);
        assert_eq!(interval.size(), 10);
        assert!(!interval.is_empty());
        assert!(Interval::empty().is_empty());
        assert_eq!(Interval::empty().size(), 0);

        assert!(interval.contains(Interval::new(10, 19)));
        assert!(interval.contains(Interval::new(12, 15)));
        assert!(!interval.contains(Interval::new(9, 15)));
        assert!(!interval.contains(Interval::new(12, 20)));
    }

    #[test]
    fn test_split_half() {
        let (left, right) = Interval::new(1, 10).split_half();
        assert_eq!(left, Interval::new(1, 5));
        assert_eq!(right, Interval::new(6, 10));

        let (left, right) = Interval::new(1, 1).split_half();
        assert_eq!(left, Interval::new(1, 1));
        assert!(right.is_empty());
    }
}
