use parking_lot::RwLock;
use sedra_consensus_core::header::Header;
use sedra_database::prelude::{DbKey, StoreError, StoreResult};
use sedra_hashes::Hash;
use std::collections::HashMap;
use std::sync::Arc;

pub trait HeaderStoreReader {
    fn get_header(&self, hash: Hash) -> StoreResult<Arc<Header>>;
    fn get_timestamp(&self, hash: Hash) -> StoreResult<i64>;
    fn get_bits(&self, hash: Hash) -> StoreResult<u32>;
    fn has(&self, hash: Hash) -> StoreResult<bool>;
}

pub trait HeadersStore: HeaderStoreReader {
    fn insert(&self, header: Arc<Header>) -> StoreResult<()>;
}

/// In-memory headers of all known blocks; durable through the block index.
#[derive(Default)]
pub struct MemoryHeadersStore {
    map: RwLock<HashMap<Hash, Arc<Header>>>,
}

impl MemoryHeadersStore {
    pub fn new() -> Self {
        Default::default()
    }
}

impl HeaderStoreReader for MemoryHeadersStore {
    fn get_header(&self, hash: Hash) -> StoreResult<Arc<Header>> {
        match self.map.read().get(&hash) {
            Some(header) => Ok(Arc::clone(header)),
            None => Err(StoreError::KeyNotFound(DbKey::new(b"headers", hash))),
        }
    }

    fn get_timestamp(&self, hash: Hash) -> StoreResult<i64> {
        Ok(self.get_header(hash)?.timestamp)
    }

    fn get_bits(&self, hash: Hash) -> StoreResult<u32> {
        Ok(self.get_header(hash)?.bits)
    }

    fn has(&self, hash: Hash) -> StoreResult<bool> {
        Ok(self.map.read().contains_key(&hash))
    }
}

impl HeadersStore for MemoryHeadersStore {
    fn insert(&self, header: Arc<Header>) -> StoreResult<()> {
        let mut write_guard = self.map.write();
        if write_guard.contains_key(&header.hash) {
            return Err(StoreError::KeyAlreadyExists(header.hash.to_string()));
        }
        write_guard.insert(header.hash, header);
        Ok(())
    }
}
