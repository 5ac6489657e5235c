use indexmap::IndexMap;
use log::debug;
use sedra_consensus_core::block::Block;
use sedra_consensus_core::BlockHashMap;
use sedra_hashes::Hash;
use std::time::{Duration, Instant};

const ORPHAN_EXPIRATION: Duration = Duration::from_secs(60 * 60);

struct OrphanBlock {
    block: Block,
    expiration: Instant,
}

/// Holds blocks whose parents are not all known yet, keyed by hash and
/// secondarily indexed by awaited parent. Bounded: admission at capacity
/// evicts the newest resident orphan. Entries expire after an hour.
pub struct OrphanPool {
    orphans: IndexMap<Hash, OrphanBlock>,
    /// parent hash → orphans waiting for it
    dependents: BlockHashMap<Vec<Hash>>,
    max_orphans: usize,
}

impl OrphanPool {
    pub fn new(max_orphans: usize) -> Self {
        Self { orphans: IndexMap::new(), dependents: BlockHashMap::new(), max_orphans }
    }

    pub fn contains(&self, hash: Hash) -> bool {
        self.orphans.contains_key(&hash)
    }

    pub fn len(&self) -> usize {
        self.orphans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orphans.is_empty()
    }

    pub fn add(&mut self, block: Block, missing_parents: &[Hash]) {
        self.expire_stale();
        if self.orphans.len() >= self.max_orphans {
            // Overflow policy: the newest resident is the eviction victim
            if let Some((newest, _)) = self.orphans.pop() {
                self.unindex(newest);
                debug!("orphan pool is full; evicted newest orphan {newest}");
            }
        }
        let hash = block.hash();
        for parent in missing_parents {
            self.dependents.entry(*parent).or_default().push(hash);
        }
        self.orphans.insert(hash, OrphanBlock { block, expiration: Instant::now() + ORPHAN_EXPIRATION });
    }

    /// Removes and returns the orphans that were waiting for `parent`.
    /// Callers re-check remaining parents before admission.
    pub fn take_dependents(&mut self, parent: Hash) -> Vec<Hash> {
        self.expire_stale();
        self.dependents.remove(&parent).unwrap_or_default()
    }

    pub fn remove(&mut self, hash: Hash) -> Option<Block> {
        let orphan = self.orphans.shift_remove(&hash)?;
        self.unindex(hash);
        Some(orphan.block)
    }

    pub fn get(&self, hash: Hash) -> Option<&Block> {
        self.orphans.get(&hash).map(|orphan| &orphan.block)
    }

    fn unindex(&mut self, hash: Hash) {
        for waiting in self.dependents.values_mut() {
            waiting.retain(|&dependent| dependent != hash);
        }
        self.dependents.retain(|_, waiting| !waiting.is_empty());
    }

    fn expire_stale(&mut self) {
        let now = Instant::now();
        let expired: Vec<Hash> = self.orphans.iter().filter(|(_, orphan)| orphan.expiration <= now).map(|(hash, _)| *hash).collect();
        for hash in expired {
            debug!("orphan {hash} expired");
            self.remove(hash);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sedra_consensus_core::config::params::SIMNET_PARAMS;

    fn test_block(seed: u64, parent: Hash) -> Block {
        let mut block = SIMNET_PARAMS.genesis_block();
        block.header.parents = vec![parent];
        block.header.nonce = seed;
        block.header.finalize();
        block
    }

    #[test]
    fn test_dependents_flow() {
        let mut pool = OrphanPool::new(10);
        let parent = Hash::from_u64_word(1000);
        let block = test_block(1, parent);
        let hash = block.hash();

        pool.add(block, &[parent]);
        assert!(pool.contains(hash));
        assert_eq!(pool.take_dependents(parent), vec![hash]);
        assert!(pool.take_dependents(parent).is_empty());
        assert!(pool.remove(hash).is_some());
        assert!(pool.remove(hash).is_none());
    }

    #[test]
    fn test_capacity_evicts_newest() {
        let mut pool = OrphanPool::new(2);
        let parent = Hash::from_u64_word(1000);
        let first = test_block(1, parent);
        let second = test_block(2, parent);
        let third = test_block(3, parent);
        let (h1, h2, h3) = (first.hash(), second.hash(), third.hash());

        pool.add(first, &[parent]);
        pool.add(second, &[parent]);
        pool.add(third, &[parent]);

        assert_eq!(pool.len(), 2);
        assert!(pool.contains(h1));
        assert!(!pool.contains(h2), "the newest resident is the eviction victim");
        assert!(pool.contains(h3));
    }
}
