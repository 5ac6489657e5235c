use sedra_consensus_core::block::Block;
use sedra_database::prelude::{CachedDbAccess, DatabaseStorePrefixes, DbWriter, StoreResult, DB};
use sedra_hashes::Hash;
use std::sync::Arc;

/// Full block bodies by hash.
#[derive(Clone)]
pub struct DbBlockStore {
    access: CachedDbAccess<Hash, Block>,
}

impl DbBlockStore {
    pub fn new(db: Arc<DB>, cache_size: u64) -> Self {
        Self { access: CachedDbAccess::new(db, cache_size, vec![DatabaseStorePrefixes::BlockTransactions.into()]) }
    }

    pub fn has(&self, hash: Hash) -> StoreResult<bool> {
        self.access.has(hash)
    }

    pub fn get(&self, hash: Hash) -> StoreResult<Block> {
        self.access.read(hash)
    }

    pub fn insert(&self, writer: impl DbWriter, block: &Block) -> StoreResult<()> {
        self.access.write(writer, block.hash(), block.clone())
    }
}
