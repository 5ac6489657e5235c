use crate::model::stores::ghostdag::{GhostdagData, GhostdagStoreReader};
use crate::model::stores::reachability::ReachabilityStore;
use crate::model::stores::relations::RelationsStoreReader;
use crate::processes::ghostdag::ordering::SortableBlock;
use crate::processes::reachability::inquirer::is_dag_ancestor_of;
use sedra_consensus_core::blockhash::{BlockHashExtensions, ORIGIN};
use sedra_consensus_core::BlockHashSet;
use sedra_hashes::Hash;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

/// A priority queue over blocks, popping in ascending (blue score, hash)
/// order.
#[derive(Default)]
pub struct UpHeap(BinaryHeap<Reverse<SortableBlock>>);

impl UpHeap {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(&mut self, block: SortableBlock) {
        self.0.push(Reverse(block));
    }

    pub fn push_set(&mut self, blocks: impl Iterator<Item = SortableBlock>) {
        self.0.extend(blocks.map(Reverse));
    }

    pub fn pop(&mut self) -> Option<SortableBlock> {
        self.0.pop().map(|Reverse(block)| block)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The descending counterpart of [`UpHeap`].
#[derive(Default)]
pub struct DownHeap(BinaryHeap<SortableBlock>);

impl DownHeap {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(&mut self, block: SortableBlock) {
        self.0.push(block);
    }

    pub fn push_set(&mut self, blocks: impl Iterator<Item = SortableBlock>) {
        self.0.extend(blocks);
    }

    pub fn pop(&mut self) -> Option<SortableBlock> {
        self.0.pop()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Walks the DAG along consensus orders: selected-parent chains, blue
/// windows and blue-score-ordered slices.
pub struct DagTraversalManager<T: GhostdagStoreReader, S: RelationsStoreReader, U: ReachabilityStore> {
    ghostdag_store: Arc<T>,
    relations_store: Arc<S>,
    reachability_store: Arc<U>,
}

impl<T: GhostdagStoreReader, S: RelationsStoreReader, U: ReachabilityStore> DagTraversalManager<T, S, U> {
    pub fn new(ghostdag_store: Arc<T>, relations_store: Arc<S>, reachability_store: Arc<U>) -> Self {
        Self { ghostdag_store, relations_store, reachability_store }
    }

    /// Collects up to `size` blocks of the blue past of a block with the
    /// given ghostdag data, newest first: each chain block contributes its
    /// mergeset blues (selected parent included), walking down the
    /// selected-parent chain. The windowed block itself is excluded.
    pub fn blue_window(&self, ghostdag_data: &GhostdagData, size: usize) -> Vec<Hash> {
        let mut window = Vec::with_capacity(size);
        let mut current = Arc::new(ghostdag_data.clone());
        loop {
            for blue in current.mergeset_blues.iter().rev() {
                if window.len() == size {
                    return window;
                }
                window.push(*blue);
            }
            if current.selected_parent.is_origin() {
                // The whole past is smaller than the requested window
                return window;
            }
            current = self.ghostdag_store.get_data(current.selected_parent).unwrap();
        }
    }

    /// Iterates the selected-parent chain from `from` (inclusive) down to
    /// genesis.
    pub fn selected_parent_chain_iterator(&self, from: Hash) -> impl Iterator<Item = Hash> + '_ {
        let mut current = from;
        std::iter::from_fn(move || {
            if current == ORIGIN {
                return None;
            }
            let item = current;
            current = self.ghostdag_store.get_selected_parent(item).unwrap();
            Some(item)
        })
    }

    /// Collects the blue past of a block in descending (blue score, hash)
    /// order through a [`DownHeap`], bounded by `max_entries`.
    pub fn descending_blue_past(&self, ghostdag_data: &GhostdagData, max_entries: usize) -> Vec<Hash> {
        let mut heap = DownHeap::new();
        heap.push_set(
            ghostdag_data
                .mergeset_blues
                .iter()
                .map(|blue| SortableBlock::new(*blue, self.ghostdag_store.get_blue_score(*blue).unwrap())),
        );
        let mut result = Vec::new();
        while let Some(SortableBlock { hash, .. }) = heap.pop() {
            if result.len() == max_entries {
                break;
            }
            result.push(hash);
            let data = self.ghostdag_store.get_data(hash).unwrap();
            heap.push_set(
                data.mergeset_blues.iter().map(|blue| SortableBlock::new(*blue, self.ghostdag_store.get_blue_score(*blue).unwrap())),
            );
        }
        result
    }

    /// Blocks in the future of `low` and the past of `high` (inclusive of
    /// `high`, exclusive of `low`), in ascending blue-score order; the slice
    /// peers request when syncing. Bounded by `max_entries`.
    pub fn ordered_hashes_between(&self, low: Hash, high: Hash, max_entries: usize) -> Vec<Hash> {
        let mut heap = UpHeap::new();
        let mut visited = BlockHashSet::new();
        let mut result = Vec::new();
        heap.push(SortableBlock::new(low, self.ghostdag_store.get_blue_score(low).unwrap()));
        visited.insert(low);
        while let Some(SortableBlock { hash, .. }) = heap.pop() {
            if result.len() == max_entries {
                break;
            }
            if hash != low {
                result.push(hash);
            }
            if hash == high {
                continue;
            }
            for child in self.relations_store.get_children(hash).unwrap().iter() {
                if visited.insert(*child) && is_dag_ancestor_of(self.reachability_store.as_ref(), *child, high).unwrap() {
                    heap.push(SortableBlock::new(*child, self.ghostdag_store.get_blue_score(*child).unwrap()));
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_orders() {
        let blocks = [SortableBlock::new(1.into(), 5), SortableBlock::new(2.into(), 3), SortableBlock::new(3.into(), 5)];

        let mut up = UpHeap::new();
        up.push_set(blocks.iter().copied());
        assert_eq!(up.len(), 3);
        let ascending: Vec<u64> = std::iter::from_fn(|| up.pop()).map(|b| b.blue_score).collect();
        assert_eq!(ascending, vec![3, 5, 5]);
        assert!(up.is_empty());

        let mut down = DownHeap::new();
        down.push_set(blocks.iter().copied());
        let descending: Vec<u64> = std::iter::from_fn(|| down.pop()).map(|b| b.blue_score).collect();
        assert_eq!(descending, vec![5, 5, 3]);
    }

    #[test]
    fn test_heap_hash_tiebreak() {
        // Equal scores pop in hash order (little-endian numeric)
        let mut up = UpHeap::new();
        up.push(SortableBlock::new(9.into(), 7));
        up.push(SortableBlock::new(4.into(), 7));
        assert_eq!(up.pop().unwrap().hash, 4.into());
        assert_eq!(up.pop().unwrap().hash, 9.into());
    }
}
