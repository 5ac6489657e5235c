use parking_lot::RwLock;
use sedra_consensus_core::blockhash::BlockHashes;
use sedra_database::prelude::{DbKey, StoreError, StoreResult};
use sedra_hashes::Hash;
use std::collections::HashMap;
use std::sync::Arc;

pub trait RelationsStoreReader {
    fn get_parents(&self, hash: Hash) -> StoreResult<BlockHashes>;
    fn get_children(&self, hash: Hash) -> StoreResult<BlockHashes>;
    fn has(&self, hash: Hash) -> StoreResult<bool>;
}

pub trait RelationsStore: RelationsStoreReader {
    /// Inserts `parents` for a new block `hash` and links the child edges of
    /// each parent. All parents are required to be present already.
    fn insert(&self, hash: Hash, parents: BlockHashes) -> StoreResult<()>;
}

/// In-memory parent/child topology. The single source of truth for the DAG
/// graph shape; rebuilt from the block index at startup.
#[derive(Default)]
pub struct MemoryRelationsStore {
    parents_map: RwLock<HashMap<Hash, BlockHashes>>,
    children_map: RwLock<HashMap<Hash, BlockHashes>>,
}

impl MemoryRelationsStore {
    pub fn new() -> Self {
        Default::default()
    }
}

impl RelationsStoreReader for MemoryRelationsStore {
    fn get_parents(&self, hash: Hash) -> StoreResult<BlockHashes> {
        match self.parents_map.read().get(&hash) {
            Some(parents) => Ok(BlockHashes::clone(parents)),
            None => Err(StoreError::KeyNotFound(DbKey::new(b"relations-parents", hash))),
        }
    }

    fn get_children(&self, hash: Hash) -> StoreResult<BlockHashes> {
        match self.children_map.read().get(&hash) {
            Some(children) => Ok(BlockHashes::clone(children)),
            None => Err(StoreError::KeyNotFound(DbKey::new(b"relations-children", hash))),
        }
    }

    fn has(&self, hash: Hash) -> StoreResult<bool> {
        Ok(self.parents_map.read().contains_key(&hash))
    }
}

impl RelationsStore for MemoryRelationsStore {
    fn insert(&self, hash: Hash, parents: BlockHashes) -> StoreResult<()> {
        let mut parents_write = self.parents_map.write();
        if parents_write.contains_key(&hash) {
            return Err(StoreError::KeyAlreadyExists(hash.to_string()));
        }
        let mut children_write = self.children_map.write();
        for parent in parents.iter() {
            if !parents_write.contains_key(parent) {
                return Err(StoreError::KeyNotFound(DbKey::new(b"relations-parents", *parent)));
            }
            let children = children_write.entry(*parent).or_insert_with(|| BlockHashes::new(Vec::new()));
            BlockHashes::make_mut(children).push(hash);
        }
        parents_write.insert(hash, parents);
        children_write.entry(hash).or_insert_with(|| BlockHashes::new(Vec::new()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_link() {
        let store = MemoryRelationsStore::new();
        store.insert(1.into(), BlockHashes::new(vec![])).unwrap();
        store.insert(2.into(), BlockHashes::new(vec![1.into()])).unwrap();
        store.insert(3.into(), BlockHashes::new(vec![1.into(), 2.into()])).unwrap();

        assert_eq!(*store.get_parents(3.into()).unwrap(), vec![Hash::from(1u64), 2.into()]);
        assert_eq!(*store.get_children(1.into()).unwrap(), vec![Hash::from(2u64), 3.into()]);
        assert!(store.insert(3.into(), BlockHashes::new(vec![])).is_err());
        // Inserting with an unknown parent is a topology violation
        assert!(store.insert(4.into(), BlockHashes::new(vec![9.into()])).is_err());
    }
}
