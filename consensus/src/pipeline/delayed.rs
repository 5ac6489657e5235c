use sedra_consensus_core::block::Block;
use sedra_consensus_core::BlockHashMap;
use sedra_hashes::Hash;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Blocks whose timestamps run ahead of adjusted time, queued until their
/// process time arrives. Serviced lazily from within `process_block`.
pub struct DelayedBlocks {
    /// Min-heap over (process time, hash)
    queue: BinaryHeap<Reverse<(i64, Hash)>>,
    blocks: BlockHashMap<(Block, i64)>,
}

impl DelayedBlocks {
    pub fn new() -> Self {
        Self { queue: BinaryHeap::new(), blocks: BlockHashMap::new() }
    }

    pub fn contains(&self, hash: Hash) -> bool {
        self.blocks.contains_key(&hash)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn add(&mut self, block: Block, process_time: i64) {
        let hash = block.hash();
        self.queue.push(Reverse((process_time, hash)));
        self.blocks.insert(hash, (block, process_time));
    }

    /// The process time of the latest delayed parent among `parents`, if any.
    /// A child of a delayed block is itself delayed at least that long.
    pub fn max_delayed_parent_time(&self, parents: &[Hash]) -> Option<i64> {
        parents.iter().filter_map(|parent| self.blocks.get(parent).map(|(_, time)| *time)).max()
    }

    /// Pops the next block whose process time has arrived.
    pub fn pop_due(&mut self, now: i64) -> Option<Block> {
        while let Some(Reverse((process_time, hash))) = self.queue.peek().copied() {
            if process_time > now {
                return None;
            }
            self.queue.pop();
            // Heap entries may be stale if the block was re-delayed
            if let Some((block, stored_time)) = self.blocks.get(&hash) {
                if *stored_time == process_time {
                    let block = block.clone();
                    self.blocks.remove(&hash);
                    return Some(block);
                }
            }
        }
        None
    }
}

impl Default for DelayedBlocks {
    fn default() -> Self {
        Self::new()
    }
}
