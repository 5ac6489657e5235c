use sedra_consensus_core::{acceptance_data::AcceptanceData, block::Block};
use sedra_hashes::Hash;
use std::sync::Arc;

/// Selected-parent chain membership changes caused by one admission,
/// ordered for consumers: removals newest-first, additions oldest-first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainUpdates {
    pub removed_chain_block_hashes: Vec<Hash>,
    pub added_chain_block_hashes: Vec<Hash>,
}

/// Emitted after the enclosing persistent transaction commits, in
/// DAG-admission order.
#[derive(Clone, Debug)]
pub enum Notification {
    BlockAdded { block: Arc<Block>, acceptance_data: AcceptanceData, chain_updates: ChainUpdates },
}
