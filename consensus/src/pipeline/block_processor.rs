//! Context-free block validation: everything checkable from the block alone
//! plus the clock, before any DAG state is consulted.

use crate::dag::BlockDag;
use crate::errors::ConsensusResult;
use crate::pipeline::BehaviorFlags;
use itertools::Itertools;
use sedra_consensus_core::block::Block;
use sedra_consensus_core::errors::block::RuleError;
use sedra_consensus_core::merkle::calc_hash_merkle_root;
use sedra_consensus_core::serialization::wire::block_serialized_size;
use sedra_consensus_core::tx::TransactionId;
use sedra_math::Uint256;
use std::collections::HashSet;

impl BlockDag {
    /// Runs the full sanity suite. A block that is valid except for running
    /// ahead of the clock is not an error: the positive return value is the
    /// number of seconds until it becomes admissible.
    pub(crate) fn check_block_sanity(&self, block: &Block, flags: BehaviorFlags) -> ConsensusResult<i64> {
        self.check_proof_of_work(block, flags)?;
        self.check_parents_sanity(block)?;
        self.check_block_size(block)?;
        self.check_transactions_sanity(block)?;
        self.check_sig_op_counts(block)?;
        Ok(self.check_block_timestamp(block, flags))
    }

    fn check_proof_of_work(&self, block: &Block, flags: BehaviorFlags) -> ConsensusResult<()> {
        let header = &block.header;
        let target = Uint256::from_compact_bits(header.bits)
            .ok_or(RuleError::UnexpectedDifficulty(header.bits, self.params.pow_limit_bits))?;
        let pow_limit = Uint256::from_compact_bits(self.params.pow_limit_bits).unwrap();
        if target.is_zero() || target > pow_limit {
            return Err(RuleError::UnexpectedDifficulty(header.bits, self.params.pow_limit_bits).into());
        }
        if self.params.skip_proof_of_work || flags.contains(BehaviorFlags::NO_POW_CHECK) {
            return Ok(());
        }
        let hash_value = Uint256::from_le_bytes(header.hash.as_bytes());
        if hash_value > target {
            return Err(RuleError::HighHash(header.hash).into());
        }
        Ok(())
    }

    fn check_parents_sanity(&self, block: &Block) -> ConsensusResult<()> {
        let parents = &block.header.parents;
        if parents.is_empty() {
            return Err(RuleError::NoParents.into());
        }
        if parents.len() > self.params.max_block_parents as usize {
            return Err(RuleError::TooManyParents(parents.len(), self.params.max_block_parents as usize).into());
        }
        for window in parents.windows(2) {
            if window[0] == window[1] {
                return Err(RuleError::DuplicateParents(window[0]).into());
            }
            if window[0] > window[1] {
                return Err(RuleError::WrongParentsOrder.into());
            }
        }
        Ok(())
    }

    fn check_block_size(&self, block: &Block) -> ConsensusResult<()> {
        let size = block_serialized_size(block);
        if size > self.params.max_block_payload {
            return Err(RuleError::BlockSizeTooBig(size, self.params.max_block_payload).into());
        }
        Ok(())
    }

    fn check_transactions_sanity(&self, block: &Block) -> ConsensusResult<()> {
        if block.transactions.is_empty() {
            return Err(RuleError::NoTransactions.into());
        }
        if !block.transactions[0].is_coinbase() {
            return Err(RuleError::FirstTxNotCoinbase.into());
        }
        if let Some(i) = block.transactions.iter().skip(1).position(|tx| tx.is_coinbase()) {
            return Err(RuleError::MultipleCoinbases(i + 1).into());
        }
        // Canonical order: coinbase first, the rest ascending by subnetwork
        if block.transactions[1..].iter().tuple_windows().any(|(a, b)| a.subnetwork_id > b.subnetwork_id) {
            return Err(RuleError::TransactionsNotSorted.into());
        }
        let mut ids: HashSet<TransactionId> = HashSet::with_capacity(block.transactions.len());
        for tx in block.transactions.iter() {
            if !ids.insert(tx.id()) {
                return Err(RuleError::DuplicateTransactions(tx.id()).into());
            }
        }
        let calculated = calc_hash_merkle_root(block.transactions.iter());
        if calculated != block.header.hash_merkle_root {
            return Err(RuleError::BadMerkleRoot(block.header.hash_merkle_root, calculated).into());
        }
        for tx in block.transactions.iter() {
            self.transaction_validator
                .validate_tx_in_isolation(tx)
                .map_err(|e| RuleError::TxInIsolationValidationFailed(tx.id(), e))?;
        }
        Ok(())
    }

    fn check_sig_op_counts(&self, block: &Block) -> ConsensusResult<()> {
        let total: u64 = block.transactions.iter().map(|tx| self.mass_calculator.standalone_sig_ops(tx)).sum();
        let limit = self.params.max_sigops_per_block();
        if total > limit {
            return Err(RuleError::TooManySigOps(total, limit).into());
        }
        Ok(())
    }

    /// Seconds the block runs ahead of the allowed drift; zero when
    /// admissible now (or when reprocessing after a delay).
    fn check_block_timestamp(&self, block: &Block, flags: BehaviorFlags) -> i64 {
        if flags.contains(BehaviorFlags::AFTER_DELAY) {
            return 0;
        }
        let max_allowed = self.time_source.unix_now() + self.params.max_allowed_time_drift();
        (block.header.timestamp - max_allowed).max(0)
    }
}
