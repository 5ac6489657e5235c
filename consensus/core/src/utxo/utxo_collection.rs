use crate::tx::*;
use std::collections::HashMap;

pub type UtxoCollection = HashMap<TransactionOutpoint, UtxoEntry>;

pub trait UtxoCollectionExtensions {
    /// Checks if the `outpoint` key exists with an entry that holds `entry.block_blue_score == blue_score`
    fn contains_with_blue_score(&self, outpoint: &TransactionOutpoint, blue_score: u64) -> bool;

    /// Adds all entries from `other` to `self`.
    /// Note that this means that values from `other` might override values of `self`.
    fn add_many(&mut self, other: &Self);

    /// Removes all elements in `other` from `self`. Equivalent to `self - other` in set theory.
    fn remove_many(&mut self, other: &Self);

    /// Returns whether the intersection between the two collections is not empty.
    fn intersects(&self, other: &Self) -> bool;

    /// Returns the first outpoint shared with `other` for which `rule`
    /// deems the intersection offending, if any.
    fn intersects_with_rule(
        &self,
        other: &Self,
        rule: impl Fn(&TransactionOutpoint, &UtxoEntry, &UtxoEntry) -> bool,
    ) -> Option<TransactionOutpoint>;
}

impl UtxoCollectionExtensions for UtxoCollection {
    fn contains_with_blue_score(&self, outpoint: &TransactionOutpoint, blue_score: u64) -> bool {
        if let Some(entry) = self.get(outpoint) {
            entry.block_blue_score == blue_score
        } else {
            false
        }
    }

    fn add_many(&mut self, other: &Self) {
        for (k, v) in other.iter() {
            self.insert(*k, v.clone());
        }
    }

    fn remove_many(&mut self, other: &Self) {
        for k in other.keys() {
            self.remove(k);
        }
    }

    fn intersects(&self, other: &Self) -> bool {
        // We prefer iterating over the smaller set
        let (keys, other) = if self.len() <= other.len() { (self.keys(), other) } else { (other.keys(), self) };
        keys.into_iter().any(|k| other.contains_key(k))
    }

    fn intersects_with_rule(
        &self,
        other: &Self,
        rule: impl Fn(&TransactionOutpoint, &UtxoEntry, &UtxoEntry) -> bool,
    ) -> Option<TransactionOutpoint> {
        for (outpoint, entry) in self.iter() {
            if let Some(other_entry) = other.get(outpoint) {
                if rule(outpoint, entry, other_entry) {
                    return Some(*outpoint);
                }
            }
        }
        None
    }
}

/// Splits `source` against `filter`: entries whose outpoint exists in
/// `filter` with the same blue score land in `intersection`, the rest are
/// appended to `remainder`.
pub fn intersection_with_remainder_having_blue_score_in_place(
    source: &UtxoCollection,
    filter: &UtxoCollection,
    intersection: &mut UtxoCollection,
    remainder: &mut UtxoCollection,
) {
    for (outpoint, entry) in source.iter() {
        if filter.contains_with_blue_score(outpoint, entry.block_blue_score) {
            intersection.insert(*outpoint, entry.clone());
        } else {
            remainder.insert(*outpoint, entry.clone());
        }
    }
}

/// Appends to `result` the entries of `source` whose outpoint does not exist
/// in `filter` with the same blue score.
pub fn subtraction_having_blue_score_in_place(source: &UtxoCollection, filter: &UtxoCollection, result: &mut UtxoCollection) {
    for (outpoint, entry) in source.iter() {
        if !filter.contains_with_blue_score(outpoint, entry.block_blue_score) {
            result.insert(*outpoint, entry.clone());
        }
    }
}

/// Like [`subtraction_having_blue_score_in_place`], while also collecting
/// the subtracted-away intersection into `remainder`.
pub fn subtraction_with_remainder_having_blue_score_in_place(
    source: &UtxoCollection,
    filter: &UtxoCollection,
    result: &mut UtxoCollection,
    remainder: &mut UtxoCollection,
) {
    for (outpoint, entry) in source.iter() {
        if !filter.contains_with_blue_score(outpoint, entry.block_blue_score) {
            result.insert(*outpoint, entry.clone());
        } else {
            remainder.insert(*outpoint, entry.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(score: u64) -> UtxoEntry {
        UtxoEntry::new(5, vec![], score, false)
    }

    #[test]
    fn test_collection_basics() {
        let op1 = TransactionOutpoint::new(1.into(), 0);
        let op2 = TransactionOutpoint::new(2.into(), 0);

        let mut a = UtxoCollection::new();
        a.insert(op1, entry(7));
        assert!(a.contains_with_blue_score(&op1, 7));
        assert!(!a.contains_with_blue_score(&op1, 8));
        assert!(!a.contains_with_blue_score(&op2, 7));

        let mut b = UtxoCollection::new();
        b.insert(op2, entry(9));
        assert!(!a.intersects(&b));
        a.add_many(&b);
        assert!(a.intersects(&b));
        a.remove_many(&b);
        assert!(!a.contains_key(&op2));
    }

    #[test]
    fn test_subtraction_respects_blue_score() {
        let op = TransactionOutpoint::new(3.into(), 1);
        let mut source = UtxoCollection::new();
        source.insert(op, entry(5));
        let mut filter = UtxoCollection::new();
        filter.insert(op, entry(6));

        let mut result = UtxoCollection::new();
        subtraction_having_blue_score_in_place(&source, &filter, &mut result);
        // Same outpoint under a different score is not filtered away
        assert!(result.contains_key(&op));

        filter.insert(op, entry(5));
        result.clear();
        subtraction_having_blue_score_in_place(&source, &filter, &mut result);
        assert!(result.is_empty());
    }
}
