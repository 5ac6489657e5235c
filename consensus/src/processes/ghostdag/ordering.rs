use sedra_hashes::Hash;
use std::cmp::Ordering;

/// A block key ordered by blue score, tiebroken by hash (compared as
/// little-endian integers). The total order every consensus selection and
/// traversal relies on.
#[derive(Eq, PartialEq, Clone, Copy, Debug)]
pub struct SortableBlock {
    pub hash: Hash,
    pub blue_score: u64,
}

impl SortableBlock {
    pub fn new(hash: Hash, blue_score: u64) -> Self {
        Self { hash, blue_score }
    }
}

impl PartialOrd for SortableBlock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortableBlock {
    fn cmp(&self, other: &Self) -> Ordering {
        self.blue_score.cmp(&other.blue_score).then_with(|| self.hash.cmp(&other.hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        let a = SortableBlock::new(2.into(), 5);
        let b = SortableBlock::new(1.into(), 6);
        let c = SortableBlock::new(3.into(), 5);
        assert!(a < b);
        assert!(a < c);
        assert_eq!(vec![a, b, c].iter().max().unwrap().hash, b.hash);
    }
}
