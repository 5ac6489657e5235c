//! Block connection and virtual-state maintenance: contextual validation,
//! past-UTXO reconstruction through the diff-child chain, acceptance data,
//! commitment verification, and the atomic DAG/UTXO state transition.

use crate::dag::{BlockDag, DagInner, VirtualState};
use crate::errors::{ConsensusError, ConsensusResult};
use crate::model::stores::block_index::{serialize_block_node, BlockIndexKey};
use crate::model::stores::ghostdag::{GhostdagData, GhostdagStore, GhostdagStoreReader};
use crate::model::stores::headers::HeadersStore;
use crate::model::stores::relations::RelationsStore;
use crate::model::stores::statuses::{StatusesStore, StatusesStoreReader};
use crate::model::stores::subnetworks::{subnetwork_id_from_registry_tx_id, SubnetworkData};
use crate::model::stores::utxo_diffs::BlockUtxoDiffData;
use crate::notifications::{ChainUpdates, Notification};
use crate::pipeline::BehaviorFlags;
use crate::processes::reachability::inquirer as reachability;
use sedra_consensus_core::acceptance_data::{accepted_tx_ids, AcceptanceData, BlockAcceptanceData, TxAcceptanceData};
use sedra_consensus_core::block::Block;
use sedra_consensus_core::blockhash::{BlockHashes, ORIGIN};
use sedra_consensus_core::blockstatus::BlockStatus;
use sedra_consensus_core::constants::UNACCEPTED_BLUE_SCORE;
use sedra_consensus_core::errors::block::RuleError;
use sedra_consensus_core::errors::tx::TxRuleError;
use sedra_consensus_core::merkle::calc_accepted_id_merkle_root;
use sedra_consensus_core::subnets::SUBNETWORK_ID_REGISTRY;
use sedra_consensus_core::tx::{PopulatedTransaction, Transaction, TransactionOutpoint};
use sedra_consensus_core::utxo::utxo_diff::UtxoDiff;
use sedra_consensus_core::utxo::utxo_set::{DiffUtxoSet, FullUtxoSet};
use sedra_consensus_core::utxo::utxo_view::UtxoView;
use sedra_hashes::Hash;
use log::info;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) struct VerifyOutput {
    /// The block's post-UTXO set as a diff over the virtual base
    pub(crate) block_diff: UtxoDiff,
    pub(crate) acceptance_data: AcceptanceData,
}

impl BlockDag {
    /// Validates a block whose parents are all known and, on success,
    /// connects it: validation errors return before any DAG mutation.
    pub(crate) fn maybe_accept_block(&self, inner: &mut DagInner, block: Block, _flags: BehaviorFlags) -> ConsensusResult<()> {
        let hash = block.hash();
        for parent in block.header.parents.iter() {
            if self.statuses_store.get(*parent)?.is_known_invalid() {
                let status = BlockStatus::DATA_STORED | BlockStatus::INVALID_ANCESTOR;
                self.statuses_store.set(hash, status)?;
                self.flush_block_status(hash, &block.header, status, &self.ghostdag_manager.genesis_ghostdag_data());
                return Err(RuleError::InvalidAncestor(*parent).into());
            }
        }

        let (ghostdag_data, ordered_mergeset) = self.ghostdag_manager.ghostdag(&block.header.parents);
        match self.validate_block_in_context(inner, &block, &ghostdag_data) {
            Ok(verify_output) => self.apply_dag_changes(inner, block, ghostdag_data, ordered_mergeset, verify_output),
            Err(err) => {
                if matches!(err, ConsensusError::Rule(_)) {
                    let status = BlockStatus::DATA_STORED | BlockStatus::VALIDATE_FAILED;
                    self.statuses_store.set(hash, status)?;
                    self.flush_block_status(hash, &block.header, status, &ghostdag_data);
                }
                Err(err)
            }
        }
    }

    fn validate_block_in_context(&self, inner: &DagInner, block: &Block, ghostdag_data: &GhostdagData) -> ConsensusResult<VerifyOutput> {
        self.check_block_context(inner, block, ghostdag_data)?;
        let base_guard = self.virtual_utxo_set.read();
        self.verify_and_build_block_utxo(&base_guard, block, ghostdag_data)
    }

    // -------- Contextual checks --------

    fn check_block_context(&self, inner: &DagInner, block: &Block, ghostdag_data: &GhostdagData) -> ConsensusResult<()> {
        self.check_parents_relation(block)?;
        self.check_finality_rules(inner, ghostdag_data)?;

        let selected_parent = ghostdag_data.selected_parent;
        let sp_data = self.ghostdag_store.get_data(selected_parent)?;

        let expected_bits = self.difficulty_manager.required_difficulty(selected_parent, &sp_data);
        if block.header.bits != expected_bits {
            return Err(RuleError::UnexpectedDifficulty(block.header.bits, expected_bits).into());
        }

        let parent_median_time = self.past_median_time_manager.calc_median_time_including_block(selected_parent, &sp_data);
        if block.header.timestamp < parent_median_time {
            return Err(RuleError::TimeTooOld(block.header.timestamp, parent_median_time).into());
        }

        if let Some(expected) = self.checkpoints.get(&ghostdag_data.blue_score) {
            if block.hash() != *expected {
                return Err(RuleError::BadCheckpoint(ghostdag_data.blue_score, *expected).into());
            }
        }
        Ok(())
    }

    /// No parent may be an ancestor of another parent.
    fn check_parents_relation(&self, block: &Block) -> ConsensusResult<()> {
        let parents = &block.header.parents;
        for (i, a) in parents.iter().enumerate() {
            for b in parents.iter().skip(i + 1) {
                if reachability::is_dag_ancestor_of(self.reachability_store.as_ref(), *a, *b)
                    .map_err(|e| ConsensusError::Corruption(e.to_string()))?
                {
                    return Err(RuleError::InvalidParentsRelation(*a, *b).into());
                }
                if reachability::is_dag_ancestor_of(self.reachability_store.as_ref(), *b, *a)
                    .map_err(|e| ConsensusError::Corruption(e.to_string()))?
                {
                    return Err(RuleError::InvalidParentsRelation(*b, *a).into());
                }
            }
        }
        Ok(())
    }

    /// Walks the selected-parent chain of the new block: hitting the last
    /// finality point passes; falling to its blue score without meeting it
    /// means the block forks before finality.
    fn check_finality_rules(&self, inner: &DagInner, ghostdag_data: &GhostdagData) -> ConsensusResult<()> {
        let finality_point = inner.last_finality_point;
        let finality_score = self.ghostdag_store.get_blue_score(finality_point)?;
        let mut current = ghostdag_data.selected_parent;
        loop {
            if current == finality_point {
                return Ok(());
            }
            if self.ghostdag_store.get_blue_score(current)? <= finality_score {
                return Err(RuleError::ViolatingFinality.into());
            }
            current = self.ghostdag_store.get_selected_parent(current)?;
        }
    }

    // -------- UTXO verification --------

    /// Reconstructs a block's post-UTXO set as a diff over the virtual base:
    /// follow diff children up to a node holding a diff against the virtual,
    /// then compose downward.
    pub(crate) fn restore_utxo_diff(&self, block_hash: Hash) -> ConsensusResult<UtxoDiff> {
        let mut stack = Vec::new();
        let mut current = block_hash;
        loop {
            let diff_data = self.utxo_diffs_store.get(current)?;
            let diff_child = diff_data.diff_child;
            stack.push(diff_data);
            match diff_child {
                Some(child) => current = child,
                None => break,
            }
        }
        let mut accumulated = UtxoDiff::default();
        for diff_data in stack.into_iter().rev() {
            accumulated
                .with_diff_in_place(&diff_data.diff)
                .map_err(|e| ConsensusError::Assert(format!("incoherent stored utxo diffs: {e}")))?;
        }
        Ok(accumulated)
    }

    /// Builds the past UTXO of a block (or of the virtual) with the given
    /// ghostdag data: the selected parent's post set plus the transactions
    /// of every blue block, stamped with the accepting blue score.
    /// Returns the resulting set view along with per-blue acceptance rows.
    pub(crate) fn compute_past_utxo<'a>(
        &self,
        base: &'a FullUtxoSet,
        ghostdag_data: &GhostdagData,
        pending: Option<(&Block, &UtxoDiff)>,
    ) -> ConsensusResult<(DiffUtxoSet<'a>, Vec<BlockAcceptanceData>)> {
        let selected_parent = ghostdag_data.selected_parent;
        // The pending block has no stored diff yet; its in-flight diff
        // substitutes for a restore
        let sp_diff = match pending {
            Some((pending_block, pending_diff)) if pending_block.hash() == selected_parent => pending_diff.clone(),
            _ => self.restore_utxo_diff(selected_parent)?,
        };
        let mut past_set = DiffUtxoSet::with_base_diff(base, sp_diff);
        let mut acceptance = Vec::with_capacity(ghostdag_data.mergeset_blues.len() + 1);

        for (i, blue) in ghostdag_data.mergeset_blues.iter().enumerate() {
            let blue_block = match pending {
                Some((block, _)) if block.hash() == *blue => block.clone(),
                _ => self.block_store.get(*blue)?,
            };
            let is_selected_parent = i == 0;
            let mut rows = Vec::with_capacity(blue_block.transactions.len());
            for tx in blue_block.transactions.iter() {
                let accepted = if is_selected_parent {
                    // The selected parent's own transactions are already in
                    // its set as unaccepted; re-stamp them
                    past_set
                        .accept_transaction(tx, ghostdag_data.blue_score)
                        .map_err(|e| RuleError::from(e))?;
                    true
                } else if tx.is_coinbase() {
                    // Coinbase outputs materialize only through the selected
                    // parent chain
                    false
                } else {
                    past_set.add_transaction(tx, ghostdag_data.blue_score).map_err(RuleError::from)?
                };
                rows.push(TxAcceptanceData { transaction: tx.clone(), accepted });
            }
            acceptance.push(BlockAcceptanceData { block_hash: *blue, transactions: rows });
        }
        Ok((past_set, acceptance))
    }

    fn verify_and_build_block_utxo(
        &self,
        base: &FullUtxoSet,
        block: &Block,
        ghostdag_data: &GhostdagData,
    ) -> ConsensusResult<VerifyOutput> {
        let (mut past_set, mut acceptance_rows) = self.compute_past_utxo(base, ghostdag_data, None)?;

        // The accepting block's own transactions form its final acceptance row
        acceptance_rows.push(BlockAcceptanceData {
            block_hash: block.hash(),
            transactions: block.transactions.iter().map(|tx| TxAcceptanceData { transaction: tx.clone(), accepted: true }).collect(),
        });
        let acceptance_data: AcceptanceData = Arc::new(acceptance_rows);

        let calculated = calc_accepted_id_merkle_root(accepted_tx_ids(&acceptance_data));
        if calculated != block.header.accepted_id_merkle_root {
            return Err(RuleError::BadAcceptedIDMerkleRoot(block.header.accepted_id_merkle_root, calculated).into());
        }

        self.check_double_spends_in_block(block)?;

        // Resolve and validate the block's own transactions against its past set
        let context_median_time = self.past_median_time_manager.calc_past_median_time(ghostdag_data);
        let mut populated_txs: Vec<PopulatedTransaction> = Vec::with_capacity(block.transactions.len());
        let mut total_fees: u64 = 0;
        let mut block_mass: u64 = 0;
        let mut gas_by_subnetwork: HashMap<sedra_consensus_core::subnets::SubnetworkId, (Hash, u64)> = HashMap::new();

        for tx in block.transactions.iter() {
            let mut entries = Vec::with_capacity(tx.inputs.len());
            for input in tx.inputs.iter() {
                let entry = past_set
                    .get(&input.previous_outpoint)
                    .ok_or(RuleError::TxInContextFailed(tx.id(), TxRuleError::MissingTxOut(input.previous_outpoint)))?;
                entries.push(entry);
            }
            let populated = PopulatedTransaction::new(tx, entries);

            if !tx.is_coinbase() {
                let fee = self
                    .transaction_validator
                    .validate_populated_transaction(&populated, context_median_time, ghostdag_data.blue_score, |utxo_blue_score| {
                        self.median_time_at_blue_score(ghostdag_data.selected_parent, utxo_blue_score)
                    })
                    .map_err(|e| RuleError::TxInContextFailed(tx.id(), e))?;
                total_fees = total_fees
                    .checked_add(fee)
                    .ok_or(RuleError::TxInContextFailed(tx.id(), TxRuleError::InputsValueOverflow))?;
            }
            block_mass += self.mass_calculator.calc_tx_mass(&populated);
            if !tx.subnetwork_id.is_builtin_or_native() {
                let slot = gas_by_subnetwork.entry(tx.subnetwork_id).or_insert((tx.id(), 0));
                slot.1 = slot.1.saturating_add(tx.gas);
            }
            populated_txs.push(populated);
        }

        if block_mass > self.params.max_block_mass {
            return Err(RuleError::MassTooHigh(block_mass, self.params.max_block_mass).into());
        }

        for (subnetwork_id, (first_tx, total_gas)) in gas_by_subnetwork {
            match self.subnetworks_store.get(subnetwork_id) {
                Ok(data) => {
                    if total_gas > data.gas_limit {
                        return Err(RuleError::GasLimitExceeded(subnetwork_id, total_gas, data.gas_limit).into());
                    }
                }
                Err(sedra_database::prelude::StoreError::KeyNotFound(_)) => {
                    return Err(RuleError::TxInContextFailed(first_tx, TxRuleError::SubnetworkNotFound(subnetwork_id)).into());
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.coinbase_manager.validate_coinbase_transaction(&block.transactions[0], ghostdag_data.blue_score, total_fees)?;
        self.check_scripts(&populated_txs)?;

        // The block's own set: its past plus its transactions as unaccepted
        past_set
            .with_transactions(&block.transactions, UNACCEPTED_BLUE_SCORE)
            .map_err(RuleError::from)?;
        let commitment = past_set.multiset().finalize();
        if commitment != block.header.utxo_commitment {
            return Err(RuleError::BadUTXOCommitment(block.header.utxo_commitment, commitment).into());
        }

        Ok(VerifyOutput { block_diff: past_set.diff, acceptance_data })
    }

    fn check_double_spends_in_block(&self, block: &Block) -> ConsensusResult<()> {
        let mut spent: std::collections::HashSet<TransactionOutpoint> = std::collections::HashSet::new();
        for tx in block.transactions.iter() {
            for input in tx.inputs.iter() {
                if !spent.insert(input.previous_outpoint) {
                    return Err(RuleError::DoubleSpendInSameBlock(input.previous_outpoint).into());
                }
            }
        }
        Ok(())
    }

    /// Signature verification, fanned out across all block inputs with
    /// first-error semantics. The one permitted intra-block parallelism.
    fn check_scripts(&self, populated_txs: &[PopulatedTransaction]) -> ConsensusResult<()> {
        let checks: Vec<(&PopulatedTransaction, usize)> =
            populated_txs.iter().flat_map(|populated| (0..populated.tx.inputs.len()).map(move |i| (populated, i))).collect();
        checks
            .par_iter()
            .try_for_each(|(populated, input_index)| {
                self.script_engine.verify(populated.tx, *input_index, &populated.entries[*input_index]).map_err(|e| {
                    RuleError::TxInContextFailed(populated.tx.id(), TxRuleError::ScriptCheckFailed(*input_index, e.to_string()))
                })
            })
            .map_err(ConsensusError::from)
    }

    /// The past median time anchoring seconds-type sequence locks: the
    /// median at the latest chain block at or below the UTXO's blue score.
    pub(crate) fn median_time_at_blue_score(&self, from: Hash, utxo_blue_score: u64) -> i64 {
        let mut current = from;
        loop {
            let selected_parent = self.ghostdag_store.get_selected_parent(current).unwrap();
            if selected_parent == ORIGIN || self.ghostdag_store.get_blue_score(current).unwrap() <= utxo_blue_score {
                break;
            }
            current = selected_parent;
        }
        let data = self.ghostdag_store.get_data(current).unwrap();
        self.past_median_time_manager.calc_median_time_including_block(current, &data)
    }

    // -------- State transition --------

    /// Links the validated block, recomputes the virtual, reparents diffs,
    /// persists the whole transition atomically and melds the virtual diff
    /// into the base set. A failure past the persistence point is
    /// unrecoverable state corruption.
    fn apply_dag_changes(
        &self,
        inner: &mut DagInner,
        block: Block,
        ghostdag_data: GhostdagData,
        ordered_mergeset: Vec<Hash>,
        verify_output: VerifyOutput,
    ) -> ConsensusResult<()> {
        let hash = block.hash();
        let header = Arc::new(block.header.clone());

        // Graph linkage; not yet observable, the dag lock is held exclusively
        self.headers_store.insert(Arc::clone(&header))?;
        self.relations_store.insert(hash, BlockHashes::new(block.header.parents.clone()))?;
        self.ghostdag_store.insert(hash, Arc::new(ghostdag_data.clone()))?;
        reachability::add_block(self.reachability_store.as_ref(), hash, ghostdag_data.selected_parent, &ordered_mergeset)
            .map_err(|e| ConsensusError::Corruption(e.to_string()))?;
        self.statuses_store.set(hash, BlockStatus::DATA_STORED)?;

        let new_tips: Vec<Hash> = inner
            .virtual_state
            .parents
            .iter()
            .copied()
            .filter(|tip| !block.header.parents.contains(tip))
            .chain(std::iter::once(hash))
            .collect();
        let (virtual_data, _) = self.ghostdag_manager.ghostdag(&new_tips);

        let base_guard = self.virtual_utxo_set.read();
        let (virtual_set, _virtual_acceptance) =
            self.compute_past_utxo(&base_guard, &virtual_data, Some((&block, &verify_output.block_diff)))?;
        let virtual_diff = virtual_set.diff;

        // Restore every diff this transition rewrites before touching any of
        // them, so no restore walks through a half-updated chain
        let mut parent_diffs: Vec<(Hash, UtxoDiff)> = Vec::new();
        for parent in block.header.parents.iter() {
            if self.utxo_diffs_store.get(*parent)?.diff_child.is_none() {
                parent_diffs.push((*parent, self.restore_utxo_diff(*parent)?));
            }
        }
        let mut tip_diffs: Vec<(Hash, UtxoDiff)> = Vec::new();
        for tip in new_tips.iter() {
            let tip_diff =
                if *tip == hash { verify_output.block_diff.clone() } else { self.restore_utxo_diff(*tip)? };
            tip_diffs.push((*tip, tip_diff));
        }
        drop(base_guard);

        let mut batch = rocksdb::WriteBatch::default();
        use sedra_database::prelude::BatchDbWriter;

        // Former tips that became parents now hold a diff against the new block
        for (parent, parent_diff) in parent_diffs {
            let reparented = verify_output
                .block_diff
                .diff_from(&parent_diff)
                .map_err(|e| ConsensusError::Assert(format!("parent diff reparenting failed: {e}")))?;
            self.utxo_diffs_store.write(
                BatchDbWriter::new(&mut batch),
                parent,
                Arc::new(BlockUtxoDiffData { diff: reparented, diff_child: Some(hash) }),
            )?;
        }
        // Tips hold diffs against the new virtual set
        for (tip, tip_diff) in tip_diffs {
            let against_virtual = virtual_diff
                .diff_from(&tip_diff)
                .map_err(|e| ConsensusError::Assert(format!("tip diff rebase failed: {e}")))?;
            self.utxo_diffs_store.write(
                BatchDbWriter::new(&mut batch),
                tip,
                Arc::new(BlockUtxoDiffData { diff: against_virtual, diff_child: None }),
            )?;
        }

        self.block_store.insert(BatchDbWriter::new(&mut batch), &block)?;
        let final_status = BlockStatus::DATA_STORED | BlockStatus::VALID;
        self.block_index_store.write(
            BatchDbWriter::new(&mut batch),
            BlockIndexKey::new(ghostdag_data.blue_score, hash),
            serialize_block_node(&header, final_status, &ghostdag_data),
        )?;
        self.utxo_set_store.write_diff(BatchDbWriter::new(&mut batch), &virtual_diff)?;

        let new_finality_point = self.advance_finality_point(inner, &virtual_data);
        self.dag_state_store.write(
            BatchDbWriter::new(&mut batch),
            &crate::model::stores::dag_state::DagState {
                tip_hashes: new_tips.clone(),
                last_finality_point: new_finality_point,
                local_subnetwork_id: self.local_subnetwork_id,
            },
        )?;
        self.register_accepted_subnetworks(&mut batch, &verify_output.acceptance_data)?;

        // The persistence point: all exit paths before this line leave disk
        // and observable memory untouched
        self.db.write(batch).map_err(sedra_database::prelude::StoreError::from)?;

        self.statuses_store.set(hash, final_status)?;
        {
            let mut base = self.virtual_utxo_set.write();
            base.apply_diff(&virtual_diff).map_err(|e| ConsensusError::Assert(format!("melding the virtual diff failed: {e}")))?;
        }
        let chain_updates = self.update_virtual_chain(&mut inner.virtual_state, new_tips, virtual_data);
        if inner.last_finality_point != new_finality_point {
            info!("finality point advanced to {new_finality_point}");
            inner.last_finality_point = new_finality_point;
        }

        info!(
            "accepted block {hash} at blue score {}, selected tip is {}",
            ghostdag_data.blue_score,
            inner.virtual_state.selected_tip()
        );
        if let Some(sender) = &self.notification_sender {
            let _ = sender.send(Notification::BlockAdded {
                block: Arc::new(block),
                acceptance_data: verify_output.acceptance_data,
                chain_updates,
            });
        }
        Ok(())
    }

    /// Registers subnetworks introduced by accepted registry transactions.
    fn register_accepted_subnetworks(&self, batch: &mut rocksdb::WriteBatch, acceptance_data: &AcceptanceData) -> ConsensusResult<()> {
        use sedra_database::prelude::BatchDbWriter;
        for row in acceptance_data.iter() {
            for tx_data in row.transactions.iter().filter(|t| t.accepted) {
                let tx: &Transaction = &tx_data.transaction;
                if tx.subnetwork_id != SUBNETWORK_ID_REGISTRY {
                    continue;
                }
                let id = subnetwork_id_from_registry_tx_id(tx.id());
                if self.subnetworks_store.has(id)? {
                    continue;
                }
                // The payload shape was enforced in isolation validation
                let gas_limit = u64::from_le_bytes(tx.payload[..8].try_into().unwrap());
                self.subnetworks_store.register(BatchDbWriter::new(batch), id, SubnetworkData { gas_limit })?;
                info!("registered subnetwork {id} with gas limit {gas_limit}");
            }
        }
        Ok(())
    }

    /// Advances the finality point once the selected tip's finality score
    /// has grown by at least two windows: the new point is the first chain
    /// block of the window after the current point's.
    fn advance_finality_point(&self, inner: &DagInner, virtual_data: &GhostdagData) -> Hash {
        let current = inner.last_finality_point;
        let current_score = self.params.finality_score(self.ghostdag_store.get_blue_score(current).unwrap());
        let selected_tip = virtual_data.selected_parent;
        let tip_score = self.params.finality_score(self.ghostdag_store.get_blue_score(selected_tip).unwrap());
        if tip_score < current_score + 2 {
            return current;
        }
        let mut node = selected_tip;
        loop {
            let selected_parent = self.ghostdag_store.get_selected_parent(node).unwrap();
            if selected_parent == ORIGIN {
                break;
            }
            if self.params.finality_score(self.ghostdag_store.get_blue_score(selected_parent).unwrap()) == current_score {
                break;
            }
            node = selected_parent;
        }
        node
    }

    /// Replaces the virtual state and derives the chain delta for consumers:
    /// removals newest-first down to the fork, additions oldest-first up to
    /// the new selected tip.
    fn update_virtual_chain(&self, state: &mut VirtualState, new_tips: Vec<Hash>, new_data: GhostdagData) -> ChainUpdates {
        let mut added = Vec::new();
        let mut current = new_data.selected_parent;
        while !state.chain_set.contains(&current) {
            added.push(current);
            current = self.ghostdag_store.get_selected_parent(current).unwrap();
        }
        let fork_point = current;
        let mut removed = Vec::new();
        while *state.chain_slice.last().expect("the chain always contains genesis") != fork_point {
            let popped = state.chain_slice.pop().unwrap();
            state.chain_set.remove(&popped);
            removed.push(popped);
        }
        added.reverse();
        for hash in added.iter() {
            state.chain_slice.push(*hash);
            state.chain_set.insert(*hash);
        }
        state.parents = new_tips;
        state.ghostdag_data = new_data;
        ChainUpdates { removed_chain_block_hashes: removed, added_chain_block_hashes: added }
    }
}
