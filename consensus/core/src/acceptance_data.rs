use crate::tx::Transaction;
use sedra_hashes::Hash;
use std::sync::Arc;

/// Per-transaction accepted/rejected flags produced while computing a
/// block's past UTXO from its blue blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxAcceptanceData {
    pub transaction: Transaction,
    pub fee: u64,
    pub accepted: bool,
}

/// Acceptance rows of one accepted block, in that block's transaction order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockAcceptanceData {
    pub block_hash: Hash,
    pub transactions: Vec<TxAcceptanceData>,
}

/// Rows for the accepting block itself plus its blues, in blue-set order.
pub type AcceptanceData = Arc<Vec<BlockAcceptanceData>>;

pub fn accepted_tx_ids(acceptance_data: &AcceptanceData) -> Vec<Hash> {
    acceptance_data
        .iter()
        .flat_map(|block_data| block_data.transactions.iter().filter(|tx| tx.accepted).map(|tx| tx.transaction.id()))
        .collect()
}
