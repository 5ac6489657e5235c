use super::ordering::SortableBlock;
use crate::model::stores::ghostdag::{GhostdagData, GhostdagStoreReader, HashKTypeMap};
use crate::model::stores::reachability::ReachabilityStore;
use crate::model::stores::relations::RelationsStoreReader;
use crate::processes::reachability::inquirer::is_dag_ancestor_of;
use sedra_consensus_core::blockhash::{BlockHashes, ORIGIN};
use sedra_consensus_core::KType;
use sedra_hashes::Hash;
use std::collections::HashMap;
use std::sync::Arc;

/// The GHOSTDAG block selector: classifies, for a new block over a given
/// parent set, which past blocks belong to its blue set, bounded by the
/// K-cluster rule, and derives its selected parent and blue score.
pub struct GhostdagManager<T: GhostdagStoreReader, S: RelationsStoreReader, U: ReachabilityStore> {
    genesis_hash: Hash,
    pub(crate) k: KType,
    pub(crate) ghostdag_store: Arc<T>,
    pub(crate) relations_store: Arc<S>,
    pub(crate) reachability_store: Arc<U>,
}

impl<T: GhostdagStoreReader, S: RelationsStoreReader, U: ReachabilityStore> GhostdagManager<T, S, U> {
    pub fn new(genesis_hash: Hash, k: KType, ghostdag_store: Arc<T>, relations_store: Arc<S>, reachability_store: Arc<U>) -> Self {
        Self { genesis_hash, k, ghostdag_store, relations_store, reachability_store }
    }

    pub fn genesis_ghostdag_data(&self) -> GhostdagData {
        GhostdagData::new(0, ORIGIN, BlockHashes::new(Vec::new()), HashKTypeMap::new(HashMap::new()))
    }

    pub fn find_selected_parent(&self, parents: &[Hash]) -> Hash {
        parents
            .iter()
            .map(|parent| SortableBlock {
                hash: *parent,
                blue_score: self.ghostdag_store.get_blue_score(*parent).unwrap(),
            })
            .max()
            .unwrap()
            .hash
    }

    /// Runs the GHOSTDAG procedure for a (possibly not yet admitted) block
    /// with the given parents. Returns its ghostdag data along with the
    /// ordered mergeset candidates (selected parent excluded), which callers
    /// feed into the reachability index on admission.
    pub fn ghostdag(&self, parents: &[Hash]) -> (GhostdagData, Vec<Hash>) {
        assert!(!parents.is_empty(), "genesis must be handled via genesis_ghostdag_data");
        let selected_parent = self.find_selected_parent(parents);
        let mut new_block_data = GhostdagData::new_with_selected_parent(selected_parent, self.k);

        let ordered_mergeset = self.ordered_mergeset_without_selected_parent(selected_parent, parents);

        for blue_candidate in ordered_mergeset.iter().cloned() {
            let (is_blue, candidate_blue_anticone_size, candidate_blues_anticone_sizes) =
                self.check_blue_candidate(&new_block_data, blue_candidate);

            if is_blue {
                // No k-cluster violation found, we can now set the candidate block as blue
                new_block_data.add_blue(blue_candidate, candidate_blue_anticone_size, &candidate_blues_anticone_sizes);
            }
        }

        let blue_score =
            self.ghostdag_store.get_blue_score(selected_parent).unwrap() + new_block_data.mergeset_blues.len() as u64;
        new_block_data.finalize_score(blue_score);

        (new_block_data, ordered_mergeset)
    }

    fn check_blue_candidate_with_chain_block(
        &self,
        new_block_data: &GhostdagData,
        chain_block: &ChainBlockData,
        blue_candidate: Hash,
        candidate_blues_anticone_sizes: &mut HashMap<Hash, KType>,
        candidate_blue_anticone_size: &mut KType,
    ) -> (bool, bool) {
        // If blue_candidate is in the future of chain_block, it means
        // that all remaining blues are in the past of chain_block and thus
        // in the past of blue_candidate. In this case we know for sure that
        // the anticone of blue_candidate will not exceed K, and we can mark
        // it as blue.
        //
        // The new block is always in the future of blue_candidate, so there's
        // no point in checking it.
        if let Some(hash) = chain_block.hash {
            if is_dag_ancestor_of(self.reachability_store.as_ref(), hash, blue_candidate).unwrap() {
                return (true, false);
            }
        }

        for &block in chain_block.data.mergeset_blues.iter() {
            // Skip blocks that exist in the past of blue_candidate.
            if is_dag_ancestor_of(self.reachability_store.as_ref(), block, blue_candidate).unwrap() {
                continue;
            }

            candidate_blues_anticone_sizes.insert(block, self.blue_anticone_size(block, new_block_data));

            *candidate_blue_anticone_size += 1;
            if *candidate_blue_anticone_size > self.k {
                // k-cluster violation: the candidate's blue anticone exceeded k
                return (false, true);
            }

            if candidate_blues_anticone_sizes[&block] == self.k {
                // k-cluster violation: a block in candidate's blue anticone already
                // has k blue blocks in its own anticone
                return (false, true);
            }

            assert!(candidate_blues_anticone_sizes[&block] < self.k, "found blue anticone larger than K");
        }

        (false, false)
    }

    /// Returns the blue anticone size of `block` from the worldview of
    /// `context`. Expects `block` to be in the blue set of `context`.
    fn blue_anticone_size(&self, block: Hash, context: &GhostdagData) -> KType {
        let mut current_blues_anticone_sizes = HashKTypeMap::clone(&context.blues_anticone_sizes);
        let mut current_selected_parent = context.selected_parent;
        loop {
            if let Some(size) = current_blues_anticone_sizes.get(&block) {
                return *size;
            }
            assert!(
                current_selected_parent != self.genesis_hash && current_selected_parent != ORIGIN,
                "block {block} is not in the blue set of the given context"
            );
            current_blues_anticone_sizes = self.ghostdag_store.get_blues_anticone_sizes(current_selected_parent).unwrap();
            current_selected_parent = self.ghostdag_store.get_selected_parent(current_selected_parent).unwrap();
        }
    }

    fn check_blue_candidate(&self, new_block_data: &GhostdagData, blue_candidate: Hash) -> (bool, KType, HashMap<Hash, KType>) {
        // The maximum length of new_block_data.mergeset_blues can be K+1
        // because it contains the selected parent.
        if new_block_data.mergeset_blues.len() as KType == self.k + 1 {
            return (false, 0, HashMap::new());
        }

        let mut candidate_blues_anticone_sizes: HashMap<Hash, KType> = HashMap::with_capacity(self.k as usize);

        // Iterate over all blocks in the blue past of the new block that are
        // not in the past of blue_candidate, and check for each one of them
        // if blue_candidate potentially enlarges their blue anticone to be
        // over K, or that they enlarge the blue anticone of blue_candidate
        // to be over K.
        let mut chain_block = ChainBlockData { hash: None, data: Arc::new(new_block_data.clone()) };
        let mut candidate_blue_anticone_size: KType = 0;

        loop {
            let (is_blue, is_red) = self.check_blue_candidate_with_chain_block(
                new_block_data,
                &chain_block,
                blue_candidate,
                &mut candidate_blues_anticone_sizes,
                &mut candidate_blue_anticone_size,
            );

            if is_blue {
                break;
            }
            if is_red {
                return (false, 0, HashMap::new());
            }

            chain_block = ChainBlockData {
                hash: Some(chain_block.data.selected_parent),
                data: self.ghostdag_store.get_data(chain_block.data.selected_parent).unwrap(),
            }
        }

        (true, candidate_blue_anticone_size, candidate_blues_anticone_sizes)
    }
}

struct ChainBlockData {
    hash: Option<Hash>,
    data: Arc<GhostdagData>,
}
