//! Block template assembly: builds a block over chosen parents whose
//! commitments are computed through the very same past-UTXO machinery
//! validation runs, so a mined template is admissible by construction.

use crate::dag::BlockDag;
use crate::errors::ConsensusResult;
use sedra_consensus_core::acceptance_data::accepted_tx_ids;
use sedra_consensus_core::block::Block;
use sedra_consensus_core::constants::{BLOCK_VERSION, UNACCEPTED_BLUE_SCORE};
use sedra_consensus_core::errors::block::RuleError;
use sedra_consensus_core::errors::tx::TxRuleError;
use sedra_consensus_core::header::Header;
use sedra_consensus_core::merkle::{calc_accepted_id_merkle_root, calc_hash_merkle_root};
use sedra_consensus_core::tx::{PopulatedTransaction, ScriptPublicKey, Transaction};
use sedra_consensus_core::utxo::utxo_view::UtxoView;
use sedra_hashes::Hash;
use std::sync::Arc;

impl BlockDag {
    /// Builds a template over the current tips.
    pub fn build_block_template(
        &self,
        miner_script_public_key: ScriptPublicKey,
        extra_data: &[u8],
        transactions: Vec<Transaction>,
    ) -> ConsensusResult<Block> {
        let tips = self.tips();
        self.build_block_template_for_parents(tips, miner_script_public_key, extra_data, transactions)
    }

    /// Builds a template over an explicit parent set; the form miners and
    /// DAG-shape tests use.
    pub fn build_block_template_for_parents(
        &self,
        mut parents: Vec<Hash>,
        miner_script_public_key: ScriptPublicKey,
        extra_data: &[u8],
        mut transactions: Vec<Transaction>,
    ) -> ConsensusResult<Block> {
        // Hold the DAG read lock so the template is built over a consistent state
        let _inner = self.inner.read();
        parents.sort();
        parents.dedup();
        let (ghostdag_data, _) = self.ghostdag_manager.ghostdag(&parents);
        let selected_parent = ghostdag_data.selected_parent;
        let sp_data = self.ghostdag_store.get_data(selected_parent)?;

        let base_guard = self.virtual_utxo_set.read();
        let (mut past_set, acceptance_rows) = self.compute_past_utxo(&base_guard, &ghostdag_data, None)?;

        // Canonical in-block order: coinbase first, then ascending subnetwork
        transactions.sort_by(|a, b| a.subnetwork_id.cmp(&b.subnetwork_id));

        let context_median_time = self.past_median_time_manager.calc_past_median_time(&ghostdag_data);
        let mut total_fees: u64 = 0;
        for tx in transactions.iter() {
            let mut entries = Vec::with_capacity(tx.inputs.len());
            for input in tx.inputs.iter() {
                let entry = past_set
                    .get(&input.previous_outpoint)
                    .ok_or(RuleError::TxInContextFailed(tx.id(), TxRuleError::MissingTxOut(input.previous_outpoint)))?;
                entries.push(entry);
            }
            let populated = PopulatedTransaction::new(tx, entries);
            let fee = self
                .transaction_validator
                .validate_populated_transaction(&populated, context_median_time, ghostdag_data.blue_score, |utxo_blue_score| {
                    self.median_time_at_blue_score(selected_parent, utxo_blue_score)
                })
                .map_err(|e| RuleError::TxInContextFailed(tx.id(), e))?;
            total_fees = total_fees.checked_add(fee).ok_or(RuleError::TxInContextFailed(tx.id(), TxRuleError::InputsValueOverflow))?;
        }

        let coinbase =
            self.coinbase_manager.expected_coinbase_transaction(ghostdag_data.blue_score, miner_script_public_key, extra_data, total_fees)?;
        let mut all_transactions = Vec::with_capacity(transactions.len() + 1);
        all_transactions.push(coinbase);
        all_transactions.append(&mut transactions);

        // The accepted-id root covers the blues' accepted transactions plus
        // this block's own
        let mut accepted_ids = accepted_tx_ids(&Arc::new(acceptance_rows));
        accepted_ids.extend(all_transactions.iter().map(|tx| tx.id()));
        let accepted_id_merkle_root = calc_accepted_id_merkle_root(accepted_ids);

        past_set.with_transactions(&all_transactions, UNACCEPTED_BLUE_SCORE).map_err(RuleError::from)?;
        let utxo_commitment = past_set.multiset().finalize();

        let hash_merkle_root = calc_hash_merkle_root(all_transactions.iter());
        let min_timestamp = self.past_median_time_manager.calc_median_time_including_block(selected_parent, &sp_data);
        let timestamp = min_timestamp.max(self.time_source.unix_now());
        let bits = self.difficulty_manager.required_difficulty(selected_parent, &sp_data);

        let header = Header::new(
            BLOCK_VERSION,
            parents,
            hash_merkle_root,
            accepted_id_merkle_root,
            utxo_commitment,
            timestamp,
            bits,
            0,
        );
        Ok(Block::new(header, all_transactions))
    }
}
