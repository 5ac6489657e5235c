use parking_lot::RwLock;
use sedra_consensus_core::{blockhash::BlockHashes, KType};
use sedra_database::prelude::{StoreError, StoreResult};
use sedra_hashes::Hash;
use std::collections::HashMap;
use std::sync::Arc;

pub type HashKTypeMap = Arc<HashMap<Hash, KType>>;

/// The GHOSTDAG fields of a block node. Written once at admission and never
/// modified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GhostdagData {
    pub blue_score: u64,
    pub selected_parent: Hash,
    /// The blue set contribution of this block: the selected parent first,
    /// then accepted candidates in their discovery order
    pub mergeset_blues: BlockHashes,
    /// Blue-anticone size of every mergeset blue, from this block's worldview
    pub blues_anticone_sizes: HashKTypeMap,
}

impl GhostdagData {
    pub fn new(blue_score: u64, selected_parent: Hash, mergeset_blues: BlockHashes, blues_anticone_sizes: HashKTypeMap) -> Self {
        Self { blue_score, selected_parent, mergeset_blues, blues_anticone_sizes }
    }

    pub fn new_with_selected_parent(selected_parent: Hash, k: KType) -> Self {
        let mut mergeset_blues: Vec<Hash> = Vec::with_capacity(k as usize + 1);
        let mut blues_anticone_sizes: HashMap<Hash, KType> = HashMap::with_capacity(k as usize);
        mergeset_blues.push(selected_parent);
        blues_anticone_sizes.insert(selected_parent, 0);
        Self {
            blue_score: Default::default(),
            selected_parent,
            mergeset_blues: BlockHashes::new(mergeset_blues),
            blues_anticone_sizes: HashKTypeMap::new(blues_anticone_sizes),
        }
    }

    pub fn add_blue(&mut self, block: Hash, blue_anticone_size: KType, block_blues_anticone_sizes: &HashMap<Hash, KType>) {
        BlockHashes::make_mut(&mut self.mergeset_blues).push(block);
        let blues_anticone_sizes = HashKTypeMap::make_mut(&mut self.blues_anticone_sizes);
        blues_anticone_sizes.insert(block, blue_anticone_size);
        // Registering the new blue enlarges the anticone of the blues it does not see
        for (blue, size) in block_blues_anticone_sizes {
            blues_anticone_sizes.insert(*blue, size + 1);
        }
    }

    pub fn finalize_score(&mut self, blue_score: u64) {
        self.blue_score = blue_score;
    }
}

pub trait GhostdagStoreReader {
    fn get_blue_score(&self, hash: Hash) -> StoreResult<u64>;
    fn get_selected_parent(&self, hash: Hash) -> StoreResult<Hash>;
    fn get_mergeset_blues(&self, hash: Hash) -> StoreResult<BlockHashes>;
    fn get_blues_anticone_sizes(&self, hash: Hash) -> StoreResult<HashKTypeMap>;

    /// Returns full block data for the requested hash
    fn get_data(&self, hash: Hash) -> StoreResult<Arc<GhostdagData>>;

    fn has(&self, hash: Hash) -> StoreResult<bool>;
}

pub trait GhostdagStore: GhostdagStoreReader {
    /// Insert GHOSTDAG data for block `hash`. The data is added once and
    /// never modified, so no setters exist.
    fn insert(&self, hash: Hash, data: Arc<GhostdagData>) -> StoreResult<()>;
}

/// The in-memory GHOSTDAG store. Backed on disk through the block index
/// entries and rebuilt from them at startup.
#[derive(Default)]
pub struct MemoryGhostdagStore {
    map: RwLock<HashMap<Hash, Arc<GhostdagData>>>,
}

impl MemoryGhostdagStore {
    pub fn new() -> Self {
        Default::default()
    }
}

impl GhostdagStore for MemoryGhostdagStore {
    fn insert(&self, hash: Hash, data: Arc<GhostdagData>) -> StoreResult<()> {
        let mut write_guard = self.map.write();
        if write_guard.contains_key(&hash) {
            return Err(StoreError::KeyAlreadyExists(hash.to_string()));
        }
        write_guard.insert(hash, data);
        Ok(())
    }
}

impl GhostdagStoreReader for MemoryGhostdagStore {
    fn get_blue_score(&self, hash: Hash) -> StoreResult<u64> {
        Ok(self.get_data(hash)?.blue_score)
    }

    fn get_selected_parent(&self, hash: Hash) -> StoreResult<Hash> {
        Ok(self.get_data(hash)?.selected_parent)
    }

    fn get_mergeset_blues(&self, hash: Hash) -> StoreResult<BlockHashes> {
        Ok(BlockHashes::clone(&self.get_data(hash)?.mergeset_blues))
    }

    fn get_blues_anticone_sizes(&self, hash: Hash) -> StoreResult<HashKTypeMap> {
        Ok(HashKTypeMap::clone(&self.get_data(hash)?.blues_anticone_sizes))
    }

    fn get_data(&self, hash: Hash) -> StoreResult<Arc<GhostdagData>> {
        match self.map.read().get(&hash) {
            Some(data) => Ok(Arc::clone(data)),
            None => Err(StoreError::KeyNotFound(sedra_database::prelude::DbKey::new(b"ghostdag", hash))),
        }
    }

    fn has(&self, hash: Hash) -> StoreResult<bool> {
        Ok(self.map.read().contains_key(&hash))
    }
}
