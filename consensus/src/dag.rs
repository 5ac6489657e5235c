use crate::errors::{ConsensusError, ConsensusResult};
use crate::model::stores::block_index::{serialize_block_node, BlockIndexKey, DbBlockIndexStore};
use crate::model::stores::block_store::DbBlockStore;
use crate::model::stores::dag_state::{DagState, DbDagStateStore};
use crate::model::stores::ghostdag::{GhostdagData, GhostdagStore, GhostdagStoreReader, MemoryGhostdagStore};
use crate::model::stores::headers::{HeaderStoreReader, HeadersStore, MemoryHeadersStore};
use crate::model::stores::reachability::MemoryReachabilityStore;
use crate::model::stores::relations::{MemoryRelationsStore, RelationsStore, RelationsStoreReader};
use crate::model::stores::statuses::{MemoryStatusesStore, StatusesStore, StatusesStoreReader};
use crate::model::stores::subnetworks::DbSubnetworksStore;
use crate::model::stores::utxo_diffs::{BlockUtxoDiffData, DbUtxoDiffsStore};
use crate::model::stores::utxo_set::DbUtxoSetStore;
use crate::notifications::Notification;
use crate::pipeline::delayed::DelayedBlocks;
use crate::pipeline::orphans::OrphanPool;
use crate::pipeline::{BehaviorFlags, ProcessOutcome};
use crate::processes::coinbase::CoinbaseManager;
use crate::processes::difficulty::DifficultyManager;
use crate::processes::ghostdag::protocol::GhostdagManager;
use crate::processes::mass::MassCalculator;
use crate::processes::past_median_time::PastMedianTimeManager;
use crate::processes::reachability::inquirer as reachability;
use crate::processes::transaction_validator::TransactionValidator;
use crate::processes::traversal::DagTraversalManager;
use crate::time::TimeSource;
use crossbeam_channel::{Receiver, Sender};
use log::{info, warn};
use parking_lot::RwLock;
use sedra_consensus_core::block::Block;
use sedra_consensus_core::blockhash::{BlockHashExtensions, BlockHashes, ORIGIN};
use sedra_consensus_core::blockstatus::BlockStatus;
use sedra_consensus_core::config::params::Params;
use sedra_consensus_core::config::Config;
use sedra_consensus_core::errors::block::RuleError;
use sedra_consensus_core::header::Header;
use sedra_consensus_core::tx::{TransactionOutpoint, UtxoEntry};
use sedra_consensus_core::utxo::utxo_set::FullUtxoSet;
use sedra_consensus_core::utxo::utxo_view::UtxoView;
use sedra_consensus_core::BlockHashSet;
use sedra_database::prelude::{BatchDbWriter, DirectDbWriter, StoreResultExtensions, DB};
use sedra_hashes::Hash;
use sedra_txscript::ScriptEngine;
use std::sync::Arc;

pub(crate) type DagGhostdagManager = GhostdagManager<MemoryGhostdagStore, MemoryRelationsStore, MemoryReachabilityStore>;
pub(crate) type Traversal = DagTraversalManager<MemoryGhostdagStore, MemoryRelationsStore, MemoryReachabilityStore>;
pub(crate) type MedianTime =
    PastMedianTimeManager<MemoryHeadersStore, MemoryGhostdagStore, MemoryRelationsStore, MemoryReachabilityStore>;
pub(crate) type Difficulty =
    DifficultyManager<MemoryHeadersStore, MemoryGhostdagStore, MemoryRelationsStore, MemoryReachabilityStore>;

/// The synthetic tip of the DAG: its parents are the current tips and its
/// selected-parent chain defines the canonical order and the committed UTXO.
#[derive(Clone, Debug)]
pub struct VirtualState {
    pub parents: Vec<Hash>,
    pub ghostdag_data: GhostdagData,
    /// The selected-parent chain, genesis first
    pub chain_slice: Vec<Hash>,
    pub chain_set: BlockHashSet,
}

impl VirtualState {
    pub fn selected_tip(&self) -> Hash {
        self.ghostdag_data.selected_parent
    }

    pub fn tips(&self) -> &[Hash] {
        &self.parents
    }
}

pub(crate) struct DagInner {
    pub(crate) virtual_state: VirtualState,
    pub(crate) last_finality_point: Hash,
    pub(crate) orphans: OrphanPool,
    pub(crate) delayed: DelayedBlocks,
}

/// The consensus core handle: the block DAG, its UTXO state machine and the
/// single `process_block` entry point.
///
/// Writes are single-threaded: every mutating operation holds `inner` (the
/// DAG write lock) for its entire duration. Readers take the corresponding
/// read locks; the virtual's base UTXO set is additionally guarded on its
/// own so melds keep `get_utxo_entry` contention narrow.
pub struct BlockDag {
    pub(crate) params: Params,
    pub(crate) local_subnetwork_id: Option<sedra_consensus_core::subnets::SubnetworkId>,
    pub(crate) checkpoints: std::collections::HashMap<u64, Hash>,
    pub(crate) genesis_hash: Hash,
    pub(crate) db: Arc<DB>,

    // Stores
    pub(crate) headers_store: Arc<MemoryHeadersStore>,
    pub(crate) relations_store: Arc<MemoryRelationsStore>,
    pub(crate) ghostdag_store: Arc<MemoryGhostdagStore>,
    pub(crate) reachability_store: Arc<MemoryReachabilityStore>,
    pub(crate) statuses_store: Arc<MemoryStatusesStore>,
    pub(crate) block_store: DbBlockStore,
    pub(crate) block_index_store: DbBlockIndexStore,
    pub(crate) utxo_diffs_store: DbUtxoDiffsStore,
    pub(crate) utxo_set_store: DbUtxoSetStore,
    pub(crate) dag_state_store: DbDagStateStore,
    pub(crate) subnetworks_store: DbSubnetworksStore,

    // Services
    pub(crate) ghostdag_manager: DagGhostdagManager,
    pub(crate) traversal: Arc<Traversal>,
    pub(crate) past_median_time_manager: MedianTime,
    pub(crate) difficulty_manager: Difficulty,
    pub(crate) coinbase_manager: CoinbaseManager,
    pub(crate) mass_calculator: MassCalculator,
    pub(crate) transaction_validator: TransactionValidator,
    pub(crate) script_engine: Arc<dyn ScriptEngine>,
    pub(crate) time_source: Arc<dyn TimeSource>,

    // Shared mutable state
    pub(crate) inner: RwLock<DagInner>,
    pub(crate) virtual_utxo_set: RwLock<FullUtxoSet>,
    pub(crate) notification_sender: Option<Sender<Notification>>,
}

const CACHE_SIZE: u64 = 2048;
const INTERRUPT_CHECK_GRANULARITY: usize = 1024;
/// Extra seconds added past a delayed block's earliest valid time
const DELAY_PROCESS_SLACK: i64 = 1;

impl BlockDag {
    pub fn new(
        config: Config,
        db: Arc<DB>,
        script_engine: Arc<dyn ScriptEngine>,
        time_source: Arc<dyn TimeSource>,
        notification_sender: Option<Sender<Notification>>,
        interrupt: Option<Receiver<()>>,
    ) -> ConsensusResult<Self> {
        let params = config.params.clone();
        let genesis_block = params.genesis_block();
        let genesis_hash = genesis_block.hash();

        let headers_store = Arc::new(MemoryHeadersStore::new());
        let relations_store = Arc::new(MemoryRelationsStore::new());
        let ghostdag_store = Arc::new(MemoryGhostdagStore::new());
        let reachability_store = Arc::new(MemoryReachabilityStore::new());
        let statuses_store = Arc::new(MemoryStatusesStore::new());

        let ghostdag_manager = GhostdagManager::new(
            genesis_hash,
            params.ghostdag_k,
            Arc::clone(&ghostdag_store),
            Arc::clone(&relations_store),
            Arc::clone(&reachability_store),
        );
        let traversal =
            Arc::new(DagTraversalManager::new(Arc::clone(&ghostdag_store), Arc::clone(&relations_store), Arc::clone(&reachability_store)));
        let past_median_time_manager = PastMedianTimeManager::new(
            Arc::clone(&headers_store),
            Arc::clone(&traversal),
            params.timestamp_deviation_tolerance,
            params.genesis_timestamp,
        );
        let difficulty_manager = DifficultyManager::new(
            Arc::clone(&headers_store),
            Arc::clone(&traversal),
            params.genesis_bits,
            params.pow_limit_bits,
            params.difficulty_window_size,
            params.target_time_per_block,
        );
        let coinbase_manager =
            CoinbaseManager::new(params.max_coinbase_payload_len, params.base_subsidy, params.subsidy_reduction_interval);
        let mass_calculator =
            MassCalculator::new(params.mass_per_tx_byte, params.mass_per_script_pub_key_byte, params.mass_per_sig_op);
        let transaction_validator =
            TransactionValidator::new(params.max_block_payload, params.max_coinbase_payload_len, params.coinbase_maturity);

        let dag = Self {
            local_subnetwork_id: config.local_subnetwork_id,
            checkpoints: config.checkpoints.into_iter().collect(),
            genesis_hash,
            db: Arc::clone(&db),
            headers_store,
            relations_store,
            ghostdag_store,
            reachability_store,
            statuses_store,
            block_store: DbBlockStore::new(Arc::clone(&db), CACHE_SIZE),
            block_index_store: DbBlockIndexStore::new(Arc::clone(&db)),
            utxo_diffs_store: DbUtxoDiffsStore::new(Arc::clone(&db), CACHE_SIZE),
            utxo_set_store: DbUtxoSetStore::new(Arc::clone(&db)),
            dag_state_store: DbDagStateStore::new(Arc::clone(&db)),
            subnetworks_store: DbSubnetworksStore::new(db, CACHE_SIZE),
            ghostdag_manager,
            traversal,
            past_median_time_manager,
            difficulty_manager,
            coinbase_manager,
            mass_calculator,
            transaction_validator,
            script_engine,
            time_source,
            inner: RwLock::new(DagInner {
                virtual_state: VirtualState {
                    parents: vec![genesis_hash],
                    ghostdag_data: GhostdagData::new(0, ORIGIN, BlockHashes::new(vec![]), Default::default()),
                    chain_slice: vec![],
                    chain_set: BlockHashSet::new(),
                },
                last_finality_point: genesis_hash,
                orphans: OrphanPool::new(params.max_orphan_blocks),
                delayed: DelayedBlocks::new(),
            }),
            virtual_utxo_set: RwLock::new(FullUtxoSet::new()),
            notification_sender,
            params,
        };

        dag.init_dag_state(genesis_block, interrupt)?;
        Ok(dag)
    }

    /// Loads the persisted state or bootstraps a fresh DAG around genesis.
    fn init_dag_state(&self, genesis_block: Block, interrupt: Option<Receiver<()>>) -> ConsensusResult<()> {
        reachability::init(self.reachability_store.as_ref()).map_err(|e| ConsensusError::Corruption(e.to_string()))?;
        match self.dag_state_store.get()? {
            None => self.bootstrap_fresh_dag(genesis_block),
            Some(state) => self.load_existing_dag(state, interrupt),
        }
    }

    fn bootstrap_fresh_dag(&self, genesis_block: Block) -> ConsensusResult<()> {
        info!("creating a fresh DAG around genesis {}", self.genesis_hash);
        let genesis_data = self.ghostdag_manager.genesis_ghostdag_data();
        self.headers_store.insert(Arc::new(genesis_block.header.clone()))?;
        self.relations_store.insert(self.genesis_hash, BlockHashes::new(vec![]))?;
        self.ghostdag_store.insert(self.genesis_hash, Arc::new(genesis_data.clone()))?;
        reachability::add_block(self.reachability_store.as_ref(), self.genesis_hash, ORIGIN, &[])
            .map_err(|e| ConsensusError::Corruption(e.to_string()))?;
        self.statuses_store.set(self.genesis_hash, BlockStatus::DATA_STORED | BlockStatus::VALID)?;

        let mut batch = rocksdb::WriteBatch::default();
        self.block_store.insert(BatchDbWriter::new(&mut batch), &genesis_block)?;
        self.block_index_store.write(
            BatchDbWriter::new(&mut batch),
            BlockIndexKey::new(0, self.genesis_hash),
            serialize_block_node(&genesis_block.header, BlockStatus::DATA_STORED | BlockStatus::VALID, &genesis_data),
        )?;
        self.utxo_diffs_store.write(
            BatchDbWriter::new(&mut batch),
            self.genesis_hash,
            Arc::new(BlockUtxoDiffData { diff: Default::default(), diff_child: None }),
        )?;
        self.dag_state_store.write(
            BatchDbWriter::new(&mut batch),
            &DagState {
                tip_hashes: vec![self.genesis_hash],
                last_finality_point: self.genesis_hash,
                local_subnetwork_id: self.local_subnetwork_id,
            },
        )?;
        self.db.write(batch).map_err(sedra_database::prelude::StoreError::from)?;

        let mut inner = self.inner.write();
        self.rebuild_virtual_state(&mut inner, vec![self.genesis_hash]);
        Ok(())
    }

    fn load_existing_dag(&self, state: DagState, interrupt: Option<Receiver<()>>) -> ConsensusResult<()> {
        if state.local_subnetwork_id != self.local_subnetwork_id {
            return Err(ConsensusError::LocalSubnetworkMismatch {
                stored: state.local_subnetwork_id.map(|id| id.to_string()),
                configured: self.local_subnetwork_id.map(|id| id.to_string()),
            });
        }
        info!("loading an existing DAG with {} tips", state.tip_hashes.len());

        let check_interrupt = |count: usize| -> ConsensusResult<()> {
            if count % INTERRUPT_CHECK_GRANULARITY == 0 {
                if let Some(ref interrupt) = interrupt {
                    if interrupt.try_recv().is_ok() {
                        return Err(ConsensusError::Cancelled);
                    }
                }
            }
            Ok(())
        };

        // Replay index entries in ascending blue-score order; every parent
        // precedes its children, so incremental reinsertion is well-defined
        let mut count = 0usize;
        for item in self.block_index_store.iterator_from(None) {
            let (key, entry) = item?;
            let hash = key.block_hash();
            check_interrupt(count)?;
            count += 1;

            self.statuses_store.set(hash, entry.status)?;
            if !entry.status.is_valid() {
                continue;
            }
            self.headers_store.insert(Arc::new(entry.header.clone()))?;
            self.relations_store.insert(hash, BlockHashes::new(entry.header.parents.clone()))?;
            if hash == self.genesis_hash {
                reachability::add_block(self.reachability_store.as_ref(), hash, ORIGIN, &[])
                    .map_err(|e| ConsensusError::Corruption(e.to_string()))?;
            } else {
                let mergeset = self
                    .ghostdag_manager
                    .ordered_mergeset_without_selected_parent(entry.ghostdag_data.selected_parent, &entry.header.parents);
                reachability::add_block(self.reachability_store.as_ref(), hash, entry.ghostdag_data.selected_parent, &mergeset)
                    .map_err(|e| ConsensusError::Corruption(e.to_string()))?;
            }
            self.ghostdag_store.insert(hash, Arc::new(entry.ghostdag_data))?;
        }
        info!("replayed {count} block index entries");

        // Rebuild the committed UTXO set
        let mut utxo_set = FullUtxoSet::new();
        for (count, item) in self.utxo_set_store.iterate_all().enumerate() {
            let (outpoint, entry) = item?;
            check_interrupt(count)?;
            utxo_set.multiset.add_element(&sedra_consensus_core::serialization::utxo::multiset_element(&outpoint, &entry));
            utxo_set.utxo_collection.insert(outpoint, entry);
        }
        info!("loaded {} UTXO entries", utxo_set.len());
        *self.virtual_utxo_set.write() = utxo_set;

        let mut inner = self.inner.write();
        inner.last_finality_point = state.last_finality_point;
        self.rebuild_virtual_state(&mut inner, state.tip_hashes);
        Ok(())
    }

    /// Recomputes the virtual over the given tips from scratch, including
    /// the full selected-parent chain slice.
    fn rebuild_virtual_state(&self, inner: &mut DagInner, tips: Vec<Hash>) {
        let (virtual_data, _) = self.ghostdag_manager.ghostdag(&tips);
        let mut chain_slice: Vec<Hash> = self.traversal.selected_parent_chain_iterator(virtual_data.selected_parent).collect();
        chain_slice.reverse();
        let chain_set: BlockHashSet = chain_slice.iter().copied().collect();
        inner.virtual_state = VirtualState { parents: tips, ghostdag_data: virtual_data, chain_slice, chain_set };
    }

    /// The single entry point for new blocks. Holds the DAG write lock for
    /// the entire pass, servicing due delayed blocks first.
    pub fn process_block(&self, block: Block, flags: BehaviorFlags) -> ConsensusResult<ProcessOutcome> {
        let mut inner = self.inner.write();
        let now = self.time_source.unix_now();
        self.process_delayed_blocks(&mut inner, now)?;
        self.process_block_internal(&mut inner, block, flags)
    }

    pub(crate) fn process_block_internal(
        &self,
        inner: &mut DagInner,
        block: Block,
        flags: BehaviorFlags,
    ) -> ConsensusResult<ProcessOutcome> {
        let hash = block.hash();
        if self.statuses_store.has(hash)? || inner.orphans.contains(hash) || inner.delayed.contains(hash) {
            return Err(RuleError::DuplicateBlock.into());
        }

        let delay = self.check_block_sanity(&block, flags)?;
        if delay > 0 {
            if flags.contains(BehaviorFlags::DISALLOW_DELAY) {
                return Err(RuleError::DelayedBlockNotAllowed.into());
            }
            let process_time = self.time_source.unix_now() + delay + DELAY_PROCESS_SLACK;
            info!("block {hash} has a future timestamp; delaying processing by {delay}s");
            inner.delayed.add(block, process_time);
            return Ok(ProcessOutcome::delayed());
        }

        // A child of a delayed block cannot be processed before its parent
        if let Some(parent_time) = inner.delayed.max_delayed_parent_time(&block.header.parents) {
            if flags.contains(BehaviorFlags::DISALLOW_DELAY) {
                return Err(RuleError::DelayedBlockNotAllowed.into());
            }
            info!("block {hash} has a delayed parent; delaying it as well");
            inner.delayed.add(block, parent_time + DELAY_PROCESS_SLACK);
            return Ok(ProcessOutcome::delayed());
        }

        let missing_parents: Vec<Hash> =
            block.header.parents.iter().copied().filter(|parent| !self.statuses_store.has(*parent).unwrap_option().unwrap_or(false)).collect();
        if !missing_parents.is_empty() {
            if flags.contains(BehaviorFlags::DISALLOW_ORPHANS) {
                return Err(RuleError::OrphanBlockNotAllowed.into());
            }
            info!("block {hash} is missing parents {missing_parents:?}; adding it to the orphan pool");
            inner.orphans.add(block, &missing_parents);
            return Ok(ProcessOutcome::orphaned());
        }

        self.maybe_accept_block(inner, block, flags)?;
        self.process_orphans(inner, hash, flags)?;
        Ok(ProcessOutcome::admitted())
    }

    /// Replays orphans whose last missing parent just arrived. Rule errors
    /// in an unorphaned block are logged without penalizing the admitted
    /// ancestor; fatal errors propagate.
    fn process_orphans(&self, inner: &mut DagInner, admitted: Hash, flags: BehaviorFlags) -> ConsensusResult<()> {
        let mut queue = vec![admitted];
        while let Some(parent) = queue.pop() {
            for orphan_hash in inner.orphans.take_dependents(parent) {
                let all_parents_known = match inner.orphans.get(orphan_hash) {
                    Some(block) => {
                        block.header.parents.iter().all(|p| self.statuses_store.has(*p).unwrap_option().unwrap_or(false))
                    }
                    None => continue,
                };
                if !all_parents_known {
                    continue;
                }
                let block = inner.orphans.remove(orphan_hash).expect("presence checked above");
                match self.maybe_accept_block(inner, block, flags | BehaviorFlags::WAS_UNORPHANED) {
                    Ok(()) => queue.push(orphan_hash),
                    Err(ConsensusError::Rule(rule_error)) => {
                        warn!("unorphaned block {orphan_hash} failed validation: {rule_error}");
                    }
                    Err(fatal) => return Err(fatal),
                }
            }
        }
        Ok(())
    }

    /// Admits delayed blocks whose process time has arrived.
    pub(crate) fn process_delayed_blocks(&self, inner: &mut DagInner, now: i64) -> ConsensusResult<()> {
        while let Some(block) = inner.delayed.pop_due(now) {
            let hash = block.hash();
            match self.process_block_internal(inner, block, BehaviorFlags::AFTER_DELAY) {
                Ok(_) => {}
                Err(ConsensusError::Rule(rule_error)) => {
                    warn!("delayed block {hash} failed validation: {rule_error}");
                }
                Err(fatal) => return Err(fatal),
            }
        }
        Ok(())
    }

    // -------- Read API --------

    pub fn genesis_hash(&self) -> Hash {
        self.genesis_hash
    }

    pub fn selected_tip_hash(&self) -> Hash {
        self.inner.read().virtual_state.selected_tip()
    }

    pub fn tips(&self) -> Vec<Hash> {
        self.inner.read().virtual_state.parents.clone()
    }

    pub fn virtual_blue_score(&self) -> u64 {
        self.inner.read().virtual_state.ghostdag_data.blue_score
    }

    pub fn last_finality_point(&self) -> Hash {
        self.inner.read().last_finality_point
    }

    pub fn get_utxo_entry(&self, outpoint: &TransactionOutpoint) -> Option<UtxoEntry> {
        self.virtual_utxo_set.read().get(outpoint)
    }

    pub fn header_by_hash(&self, hash: Hash) -> ConsensusResult<Arc<Header>> {
        self.headers_store.get_header(hash).unwrap_option().ok_or(ConsensusError::BlockNotFound(hash))
    }

    pub fn block_by_hash(&self, hash: Hash) -> ConsensusResult<Block> {
        self.block_store.get(hash).unwrap_option().ok_or(ConsensusError::BlockNotFound(hash))
    }

    pub fn block_status(&self, hash: Hash) -> ConsensusResult<BlockStatus> {
        self.statuses_store.get(hash).unwrap_option().ok_or(ConsensusError::BlockNotFound(hash))
    }

    pub fn blue_score_by_hash(&self, hash: Hash) -> ConsensusResult<u64> {
        self.ghostdag_store.get_blue_score(hash).unwrap_option().ok_or(ConsensusError::BlockNotFound(hash))
    }

    /// The past median time of the virtual, i.e. of the committed state.
    pub fn past_median_time(&self) -> i64 {
        let inner = self.inner.read();
        self.past_median_time_manager.calc_past_median_time(&inner.virtual_state.ghostdag_data)
    }

    pub fn is_in_selected_parent_chain(&self, hash: Hash) -> bool {
        self.inner.read().virtual_state.chain_set.contains(&hash)
    }

    /// The selected-parent chain block carrying the given blue score, if any.
    pub fn chain_block_by_blue_score(&self, blue_score: u64) -> ConsensusResult<Hash> {
        let inner = self.inner.read();
        let slice = &inner.virtual_state.chain_slice;
        let position = slice
            .binary_search_by_key(&blue_score, |hash| self.ghostdag_store.get_blue_score(*hash).unwrap())
            .map_err(|_| ConsensusError::BlueScoreNotFound(blue_score))?;
        Ok(slice[position])
    }

    /// A peer-sync locator: the start hash, then selected-parent ancestors
    /// at exponentially growing distances, ending with genesis.
    pub fn block_locator_from_hash(&self, hash: Hash) -> ConsensusResult<Vec<Hash>> {
        if !self.ghostdag_store.has(hash)? {
            return Err(ConsensusError::BlockNotFound(hash));
        }
        let mut locator = Vec::new();
        let mut current = hash;
        let mut step = 1u64;
        loop {
            locator.push(current);
            if current == self.genesis_hash {
                return Ok(locator);
            }
            for _ in 0..step {
                current = self.ghostdag_store.get_selected_parent(current)?;
                if current == self.genesis_hash {
                    break;
                }
            }
            step *= 2;
        }
    }

    /// Blocks above `low` in the past of the current selected tip, in
    /// ascending blue-score order.
    pub fn ordered_block_hashes_from(&self, low: Hash, max_entries: usize) -> ConsensusResult<Vec<Hash>> {
        if !self.ghostdag_store.has(low)? {
            return Err(ConsensusError::BlockNotFound(low));
        }
        let high = self.selected_tip_hash();
        Ok(self.traversal.ordered_hashes_between(low, high, max_entries))
    }

    pub fn subnetwork_gas_limit(&self, id: sedra_consensus_core::subnets::SubnetworkId) -> Option<u64> {
        self.subnetworks_store.get(id).unwrap_option().map(|data| data.gas_limit)
    }

    /// The most recent blocks of the virtual's blue past, newest first.
    pub fn latest_blue_hashes(&self, max_entries: usize) -> Vec<Hash> {
        let inner = self.inner.read();
        self.traversal.descending_blue_past(&inner.virtual_state.ghostdag_data, max_entries)
    }

    /// Flushes the store. In-memory node state is durable through the block
    /// index, so shutdown is otherwise stateless.
    pub fn shutdown(&self) {
        if let Err(e) = self.db.flush() {
            warn!("db flush on shutdown failed: {e}");
        }
        info!("consensus shut down at selected tip {}", self.selected_tip_hash());
    }

    pub(crate) fn flush_block_status(&self, hash: Hash, header: &Header, status: BlockStatus, ghostdag_data: &GhostdagData) {
        let entry = serialize_block_node(header, status, ghostdag_data);
        let key = BlockIndexKey::new(ghostdag_data.blue_score, hash);
        // Status flush failures are tolerated; the block is revalidated
        // after a restart
        if let Err(e) = self.block_index_store.write(DirectDbWriter::new(&self.db), key, entry) {
            warn!("failed flushing status for block {hash}: {e}");
        }
    }
}
