use crate::tx::{Transaction, TransactionId};
use sedra_hashes::Hash;
use sedra_merkle::calc_merkle_root;

pub fn calc_hash_merkle_root<'a>(txs: impl ExactSizeIterator<Item = &'a Transaction>) -> Hash {
    calc_merkle_root(txs.map(|tx| tx.id()))
}

/// The accepted-id merkle root commits to the ids of every transaction
/// accepted by the block, sorted ascending as little-endian integers so the
/// root is independent of acceptance-traversal order.
pub fn calc_accepted_id_merkle_root(mut accepted_ids: Vec<TransactionId>) -> Hash {
    accepted_ids.sort();
    calc_merkle_root(accepted_ids.into_iter())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_root_is_order_independent() {
        let ids: Vec<TransactionId> = (1..6u64).map(Hash::from_u64_word).collect();
        let mut reversed = ids.clone();
        reversed.reverse();
        assert_eq!(calc_accepted_id_merkle_root(ids), calc_accepted_id_merkle_root(reversed));
    }
}
