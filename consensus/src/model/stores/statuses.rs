use parking_lot::RwLock;
use sedra_consensus_core::blockstatus::BlockStatus;
use sedra_database::prelude::{DbKey, StoreError, StoreResult};
use sedra_hashes::Hash;
use std::collections::HashMap;

pub trait StatusesStoreReader {
    fn get(&self, hash: Hash) -> StoreResult<BlockStatus>;
    fn has(&self, hash: Hash) -> StoreResult<bool>;
}

pub trait StatusesStore: StatusesStoreReader {
    fn set(&self, hash: Hash, status: BlockStatus) -> StoreResult<()>;
}

/// In-memory statuses. Durability runs through the block index entries:
/// the DAG flushes an updated entry after each status change and tolerates
/// flush failures (the block is simply revalidated after a restart).
#[derive(Default)]
pub struct MemoryStatusesStore {
    map: RwLock<HashMap<Hash, BlockStatus>>,
}

impl MemoryStatusesStore {
    pub fn new() -> Self {
        Default::default()
    }
}

impl StatusesStoreReader for MemoryStatusesStore {
    fn get(&self, hash: Hash) -> StoreResult<BlockStatus> {
        match self.map.read().get(&hash) {
            Some(status) => Ok(*status),
            None => Err(StoreError::KeyNotFound(DbKey::new(b"statuses", hash))),
        }
    }

    fn has(&self, hash: Hash) -> StoreResult<bool> {
        Ok(self.map.read().contains_key(&hash))
    }
}

impl StatusesStore for MemoryStatusesStore {
    fn set(&self, hash: Hash, status: BlockStatus) -> StoreResult<()> {
        self.map.write().insert(hash, status);
        Ok(())
    }
}
