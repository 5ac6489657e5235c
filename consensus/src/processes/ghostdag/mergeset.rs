use super::ordering::SortableBlock;
use super::protocol::GhostdagManager;
use crate::model::stores::ghostdag::GhostdagStoreReader;
use crate::model::stores::reachability::ReachabilityStore;
use crate::model::stores::relations::RelationsStoreReader;
use crate::processes::reachability::inquirer::is_dag_ancestor_of;
use sedra_consensus_core::BlockHashSet;
use sedra_hashes::Hash;
use std::collections::VecDeque;

impl<T: GhostdagStoreReader, S: RelationsStoreReader, U: ReachabilityStore> GhostdagManager<T, S, U> {
    /// Computes the selected parent anticone within the new block's past:
    /// ancestors reachable from `parents` that are not ancestors of
    /// `selected_parent`. BFS over parent edges, pruned by reachability as
    /// soon as a visited block falls into the selected parent's past.
    /// Returned in ascending (blue score, hash) order.
    pub fn ordered_mergeset_without_selected_parent(&self, selected_parent: Hash, parents: &[Hash]) -> Vec<Hash> {
        let mut mergeset_set: BlockHashSet = BlockHashSet::new();
        let mut selected_parent_past: BlockHashSet = BlockHashSet::new();
        let mut queue: VecDeque<Hash> = VecDeque::new();

        for parent in parents.iter() {
            if *parent == selected_parent {
                continue;
            }
            mergeset_set.insert(*parent);
            queue.push_back(*parent);
        }

        while let Some(current) = queue.pop_front() {
            let current_parents = self.relations_store.get_parents(current).unwrap();

            // For each parent of the current block we check whether it is in
            // the past of the selected parent. If not, we add it to the
            // resulting mergeset and queue it for further processing.
            for parent in current_parents.iter() {
                if mergeset_set.contains(parent) || selected_parent_past.contains(parent) {
                    continue;
                }

                if is_dag_ancestor_of(self.reachability_store.as_ref(), *parent, selected_parent).unwrap() {
                    selected_parent_past.insert(*parent);
                    continue;
                }

                mergeset_set.insert(*parent);
                queue.push_back(*parent);
            }
        }

        self.sort_blocks(mergeset_set.into_iter())
    }

    pub fn sort_blocks(&self, blocks: impl Iterator<Item = Hash>) -> Vec<Hash> {
        let mut sorted_blocks: Vec<SortableBlock> =
            blocks.map(|block| SortableBlock { hash: block, blue_score: self.ghostdag_store.get_blue_score(block).unwrap() }).collect();
        sorted_blocks.sort();
        sorted_blocks.into_iter().map(|block| block.hash).collect()
    }
}
