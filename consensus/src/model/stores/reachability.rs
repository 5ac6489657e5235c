use crate::processes::reachability::interval::Interval;
use parking_lot::RwLock;
use sedra_consensus_core::blockhash::BlockHashes;
use sedra_database::prelude::{DbKey, StoreError, StoreResult};
use sedra_hashes::Hash;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct ReachabilityData {
    /// Children in the selected-parent tree
    pub children: BlockHashes,
    /// Parent in the selected-parent tree
    pub parent: Hash,
    pub interval: Interval,
    pub height: u64,
    /// Minimal set of descendants, kept ordered by interval, covering the
    /// node's DAG future
    pub future_covering_set: BlockHashes,
}

impl ReachabilityData {
    pub fn new(parent: Hash, interval: Interval, height: u64) -> Self {
        Self { children: Arc::new(vec![]), parent, interval, height, future_covering_set: Arc::new(vec![]) }
    }
}

pub trait ReachabilityStoreReader {
    fn has(&self, hash: Hash) -> StoreResult<bool>;
    fn get_interval(&self, hash: Hash) -> StoreResult<Interval>;
    fn get_parent(&self, hash: Hash) -> StoreResult<Hash>;
    fn get_children(&self, hash: Hash) -> StoreResult<BlockHashes>;
    fn get_future_covering_set(&self, hash: Hash) -> StoreResult<BlockHashes>;
    fn get_height(&self, hash: Hash) -> StoreResult<u64>;
}

pub trait ReachabilityStore: ReachabilityStoreReader {
    fn insert(&self, hash: Hash, parent: Hash, interval: Interval, height: u64) -> StoreResult<()>;
    fn set_interval(&self, hash: Hash, interval: Interval) -> StoreResult<()>;
    fn append_child(&self, hash: Hash, child: Hash) -> StoreResult<u64>;
    fn insert_future_covering_item(&self, hash: Hash, fci: Hash, insertion_index: usize) -> StoreResult<()>;
    fn replace_future_covering_item(&self, hash: Hash, fci: Hash, replaced_index: usize) -> StoreResult<()>;
}

/// In-memory reachability data; rebuilt by replay at startup.
#[derive(Default)]
pub struct MemoryReachabilityStore {
    map: RwLock<HashMap<Hash, ReachabilityData>>,
}

impl MemoryReachabilityStore {
    pub fn new() -> Self {
        Default::default()
    }

    fn read_data<T>(&self, hash: Hash, f: impl FnOnce(&ReachabilityData) -> T) -> StoreResult<T> {
        match self.map.read().get(&hash) {
            Some(data) => Ok(f(data)),
            None => Err(StoreError::KeyNotFound(DbKey::new(b"reachability", hash))),
        }
    }

    fn update_data(&self, hash: Hash, f: impl FnOnce(&mut ReachabilityData)) -> StoreResult<()> {
        match self.map.write().get_mut(&hash) {
            Some(data) => {
                f(data);
                Ok(())
            }
            None => Err(StoreError::KeyNotFound(DbKey::new(b"reachability", hash))),
        }
    }
}

impl ReachabilityStore for MemoryReachabilityStore {
    fn insert(&self, hash: Hash, parent: Hash, interval: Interval, height: u64) -> StoreResult<()> {
        let mut write_guard = self.map.write();
        if write_guard.contains_key(&hash) {
            return Err(StoreError::KeyAlreadyExists(hash.to_string()));
        }
        write_guard.insert(hash, ReachabilityData::new(parent, interval, height));
        Ok(())
    }

    fn set_interval(&self, hash: Hash, interval: Interval) -> StoreResult<()> {
        self.update_data(hash, |data| data.interval = interval)
    }

    fn append_child(&self, hash: Hash, child: Hash) -> StoreResult<u64> {
        let mut height = 0;
        self.update_data(hash, |data| {
            height = data.height;
            BlockHashes::make_mut(&mut data.children).push(child);
        })?;
        Ok(height)
    }

    fn insert_future_covering_item(&self, hash: Hash, fci: Hash, insertion_index: usize) -> StoreResult<()> {
        self.update_data(hash, |data| BlockHashes::make_mut(&mut data.future_covering_set).insert(insertion_index, fci))
    }

    fn replace_future_covering_item(&self, hash: Hash, fci: Hash, replaced_index: usize) -> StoreResult<()> {
        self.update_data(hash, |data| BlockHashes::make_mut(&mut data.future_covering_set)[replaced_index] = fci)
    }
}

impl ReachabilityStoreReader for MemoryReachabilityStore {
    fn has(&self, hash: Hash) -> StoreResult<bool> {
        Ok(self.map.read().contains_key(&hash))
    }

    fn get_interval(&self, hash: Hash) -> StoreResult<Interval> {
        self.read_data(hash, |data| data.interval)
    }

    fn get_parent(&self, hash: Hash) -> StoreResult<Hash> {
        self.read_data(hash, |data| data.parent)
    }

    fn get_children(&self, hash: Hash) -> StoreResult<BlockHashes> {
        self.read_data(hash, |data| BlockHashes::clone(&data.children))
    }

    fn get_future_covering_set(&self, hash: Hash) -> StoreResult<BlockHashes> {
        self.read_data(hash, |data| BlockHashes::clone(&data.future_covering_set))
    }

    fn get_height(&self, hash: Hash) -> StoreResult<u64> {
        self.read_data(hash, |data| data.height)
    }
}
