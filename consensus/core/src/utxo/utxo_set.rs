use super::utxo_collection::{UtxoCollection, UtxoCollectionExtensions};
use super::utxo_diff::UtxoDiff;
use super::utxo_error::{UtxoAlgebraError, UtxoResult};
use super::utxo_view::UtxoView;
use crate::constants::UNACCEPTED_BLUE_SCORE;
use crate::serialization::utxo::multiset_element;
use crate::tx::{Transaction, TransactionOutpoint, UtxoEntry};
use sedra_multiset::Multiset;

/// The concrete materialized UTXO set, carrying the ECMH sum of all
/// contained entries. One instance backs the virtual block; block-level sets
/// are diff views over it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FullUtxoSet {
    pub utxo_collection: UtxoCollection,
    pub multiset: Multiset,
}

impl FullUtxoSet {
    pub fn new() -> Self {
        Default::default()
    }

    /// Reconstructs a set from raw entries, e.g. when loading from disk.
    pub fn from_iterator(iter: impl Iterator<Item = (TransactionOutpoint, UtxoEntry)>) -> Self {
        let mut set = Self::new();
        for (outpoint, entry) in iter {
            set.multiset.add_element(&multiset_element(&outpoint, &entry));
            set.utxo_collection.insert(outpoint, entry);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.utxo_collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxo_collection.is_empty()
    }

    /// Melds a diff into this set. The diff must be coherent with the set:
    /// every removed entry must be present with a matching blue score and no
    /// added outpoint may already exist afterwards.
    pub fn apply_diff(&mut self, diff: &UtxoDiff) -> UtxoResult<()> {
        for (outpoint, entry) in diff.remove.iter() {
            if !self.utxo_collection.contains_with_blue_score(outpoint, entry.block_blue_score) {
                return Err(UtxoAlgebraError::General("a melded diff removes an entry missing from the base set"));
            }
            self.utxo_collection.remove(outpoint);
        }
        for (outpoint, entry) in diff.add.iter() {
            if self.utxo_collection.insert(*outpoint, entry.clone()).is_some() {
                return Err(UtxoAlgebraError::General("a melded diff re-adds an entry already in the base set"));
            }
        }
        self.multiset.combine(&diff.multiset);
        Ok(())
    }
}

impl UtxoView for FullUtxoSet {
    fn get(&self, outpoint: &TransactionOutpoint) -> Option<UtxoEntry> {
        self.utxo_collection.get(outpoint).cloned()
    }
}

/// A cheap branchable view: a base set plus an accumulated diff. All block
/// processing works over these; only a virtual-state commit mutates the base.
#[derive(Clone, Debug)]
pub struct DiffUtxoSet<'a> {
    pub base: &'a FullUtxoSet,
    pub diff: UtxoDiff,
}

impl<'a> DiffUtxoSet<'a> {
    pub fn new(base: &'a FullUtxoSet) -> Self {
        Self { base, diff: UtxoDiff::default() }
    }

    pub fn with_base_diff(base: &'a FullUtxoSet, diff: UtxoDiff) -> Self {
        Self { base, diff }
    }

    /// Composes `other` on top of this view's diff.
    pub fn with_diff_in_place(&mut self, other: &UtxoDiff) -> UtxoResult<()> {
        self.diff.with_diff_in_place(other)
    }

    /// The ECMH sum of the represented set: base ⊕ diff.
    pub fn multiset(&self) -> Multiset {
        let mut multiset = self.base.multiset;
        multiset.combine(&self.diff.multiset);
        multiset
    }

    /// Adds a transaction to the represented set, spending its inputs and
    /// creating its outputs stamped with `blue_score`. Returns whether the
    /// transaction was applicable (all inputs present); an inapplicable
    /// transaction leaves the set untouched.
    pub fn add_transaction(&mut self, tx: &Transaction, blue_score: u64) -> UtxoResult<bool> {
        let mut spent = Vec::with_capacity(tx.inputs.len());
        for input in tx.inputs.iter() {
            match self.get(&input.previous_outpoint) {
                Some(entry) => spent.push(entry),
                None => return Ok(false),
            }
        }
        for (input, entry) in tx.inputs.iter().zip(spent.iter()) {
            self.diff.remove_entry(&input.previous_outpoint, entry)?;
        }
        let is_coinbase = tx.is_coinbase();
        let tx_id = tx.id();
        for (i, output) in tx.outputs.iter().enumerate() {
            let outpoint = TransactionOutpoint::new(tx_id, i as u32);
            let entry = UtxoEntry::new(output.value, output.script_public_key.clone(), blue_score, is_coinbase);
            self.diff.add_entry(outpoint, entry)?;
        }
        Ok(true)
    }

    /// Re-stamps the outputs of an already-applied transaction from the
    /// unaccepted sentinel to `accepting_blue_score`.
    pub fn accept_transaction(&mut self, tx: &Transaction, accepting_blue_score: u64) -> UtxoResult<()> {
        let tx_id = tx.id();
        for (i, _output) in tx.outputs.iter().enumerate() {
            let outpoint = TransactionOutpoint::new(tx_id, i as u32);
            let existing = self
                .get(&outpoint)
                .ok_or(UtxoAlgebraError::General("accepting a transaction whose outputs are not in the set"))?;
            if existing.block_blue_score != UNACCEPTED_BLUE_SCORE {
                return Err(UtxoAlgebraError::General("accepting a transaction whose outputs are already accepted"));
            }
            let mut accepted = existing.clone();
            accepted.block_blue_score = accepting_blue_score;
            self.diff.remove_entry(&outpoint, &existing)?;
            self.diff.add_entry(outpoint, accepted)?;
        }
        Ok(())
    }

    /// Adds `transactions` in order, requiring every one of them to apply.
    pub fn with_transactions(&mut self, transactions: &[Transaction], blue_score: u64) -> UtxoResult<()> {
        for tx in transactions {
            if !self.add_transaction(tx, blue_score)? {
                return Err(UtxoAlgebraError::General("a required transaction does not apply to the set"));
            }
        }
        Ok(())
    }
}

impl UtxoView for DiffUtxoSet<'_> {
    fn get(&self, outpoint: &TransactionOutpoint) -> Option<UtxoEntry> {
        if self.diff.remove.contains_key(outpoint) {
            // Visible only if re-added as an acceptance update
            return self.diff.add.get(outpoint).cloned();
        }
        if let Some(entry) = self.base.utxo_collection.get(outpoint) {
            return Some(entry.clone());
        }
        self.diff.add.get(outpoint).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subnets::{SUBNETWORK_ID_COINBASE, SUBNETWORK_ID_NATIVE};
    use crate::tx::{TransactionInput, TransactionOutput};
    use sedra_hashes::Hash;

    fn coinbase_tx() -> Transaction {
        Transaction::new(1, vec![], vec![TransactionOutput::new(50, vec![1])], 0, SUBNETWORK_ID_COINBASE, 0, vec![0; 17])
    }

    fn spending_tx(previous: TransactionOutpoint, value: u64) -> Transaction {
        Transaction::new(
            1,
            vec![TransactionInput::new(previous, vec![], u64::MAX)],
            vec![TransactionOutput::new(value, vec![2])],
            0,
            SUBNETWORK_ID_NATIVE,
            0,
            vec![],
        )
    }

    #[test]
    fn test_add_transaction_and_meld() {
        let mut base = FullUtxoSet::new();
        let coinbase = coinbase_tx();

        let mut view = DiffUtxoSet::new(&base);
        assert!(view.add_transaction(&coinbase, 1).unwrap());
        let outpoint = TransactionOutpoint::new(coinbase.id(), 0);
        assert_eq!(view.get(&outpoint).unwrap().amount, 50);

        let expected_multiset = view.multiset();
        let diff = view.diff;
        base.apply_diff(&diff).unwrap();
        assert_eq!(base.len(), 1);
        assert_eq!(base.multiset.finalize(), expected_multiset.finalize());
    }

    #[test]
    fn test_spend_through_the_view() {
        let coinbase = coinbase_tx();
        let outpoint = TransactionOutpoint::new(coinbase.id(), 0);
        let mut base = FullUtxoSet::new();
        {
            let mut view = DiffUtxoSet::new(&base);
            view.add_transaction(&coinbase, 1).unwrap();
            let diff = view.diff;
            base.apply_diff(&diff).unwrap();
        }

        let mut view = DiffUtxoSet::new(&base);
        let spend = spending_tx(outpoint, 30);
        assert!(view.add_transaction(&spend, 2).unwrap());
        // The spent output is shadowed, the new one is visible
        assert_eq!(view.get(&outpoint), None);
        assert_eq!(view.get(&TransactionOutpoint::new(spend.id(), 0)).unwrap().amount, 30);

        // A double spend is simply inapplicable
        let double_spend = spending_tx(outpoint, 29);
        assert!(!view.add_transaction(&double_spend, 2).unwrap());
    }

    #[test]
    fn test_acceptance_restamp() {
        let coinbase = coinbase_tx();
        let outpoint = TransactionOutpoint::new(coinbase.id(), 0);
        let base = FullUtxoSet::new();

        let mut view = DiffUtxoSet::new(&base);
        view.add_transaction(&coinbase, UNACCEPTED_BLUE_SCORE).unwrap();
        view.accept_transaction(&coinbase, 7).unwrap();
        assert_eq!(view.get(&outpoint).unwrap().block_blue_score, 7);

        // Accepting twice is an invariant violation
        assert!(view.accept_transaction(&coinbase, 8).is_err());
    }

    #[test]
    fn test_diff_composition_over_base() {
        // F.apply(d1.with_diff(d2)) must equal F.apply(d1).apply(d2)
        let coinbase = coinbase_tx();
        let outpoint = TransactionOutpoint::new(coinbase.id(), 0);

        let mut base = FullUtxoSet::new();
        let d1 = {
            let mut view = DiffUtxoSet::new(&base);
            view.add_transaction(&coinbase, 1).unwrap();
            view.diff
        };
        let d2 = {
            let mut view = DiffUtxoSet::with_base_diff(&base, d1.clone());
            view.add_transaction(&spending_tx(outpoint, 30), 2).unwrap();
            // The view accumulated d1 ∘ d2; extract d2 as the delta from d1
            d1.diff_from(&view.diff).unwrap()
        };

        let mut sequential = base.clone();
        sequential.apply_diff(&d1).unwrap();
        sequential.apply_diff(&d2).unwrap();

        let mut composed = base.clone();
        composed.apply_diff(&d1.with_diff(&d2).unwrap()).unwrap();

        assert_eq!(sequential.utxo_collection, composed.utxo_collection);
        assert_eq!(sequential.multiset, composed.multiset);
    }

    #[test]
    fn test_sibling_diff_from_inverse() {
        // For sibling views S, T over one base: S.with_diff(S.diff_from(T)) == T
        let coinbase = coinbase_tx();
        let base = FullUtxoSet::new();

        let mut s = DiffUtxoSet::new(&base);
        s.add_transaction(&coinbase, 1).unwrap();
        let mut t = DiffUtxoSet::new(&base);
        t.add_transaction(&coinbase, 1).unwrap();
        t.add_transaction(&spending_tx(TransactionOutpoint::new(coinbase.id(), 0), 25), 2).unwrap();

        let delta = s.diff.diff_from(&t.diff).unwrap();
        assert_eq!(s.diff.with_diff(&delta).unwrap(), t.diff);
    }

    #[test]
    fn test_full_set_multiset_invariant() {
        // multiset == Σ entry_hash over all contained entries
        let coinbase = coinbase_tx();
        let mut base = FullUtxoSet::new();
        let mut view = DiffUtxoSet::new(&base);
        view.add_transaction(&coinbase, 3).unwrap();
        let diff = view.diff;
        base.apply_diff(&diff).unwrap();

        let rebuilt = FullUtxoSet::from_iterator(base.utxo_collection.clone().into_iter());
        assert_eq!(rebuilt.multiset.finalize(), base.multiset.finalize());
    }
}
