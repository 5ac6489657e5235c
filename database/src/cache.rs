use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

/// A concurrent bounded key-value cache. Eviction removes an arbitrary
/// resident entry (index zero after swap removals); eviction order is never
/// consensus-visible.
#[derive(Clone)]
pub struct Cache<TKey: Clone + Hash + Eq + Send + Sync, TData: Clone + Send + Sync, S = RandomState> {
    map: Arc<RwLock<IndexMap<TKey, TData, S>>>,
    size: usize,
}

impl<TKey: Clone + Hash + Eq + Send + Sync, TData: Clone + Send + Sync, S: BuildHasher + Default> Cache<TKey, TData, S> {
    pub fn new(size: u64) -> Self {
        Self { map: Arc::new(RwLock::new(IndexMap::with_capacity_and_hasher(size as usize, S::default()))), size: size as usize }
    }

    pub fn get(&self, key: &TKey) -> Option<TData> {
        self.map.read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &TKey) -> bool {
        self.map.read().contains_key(key)
    }

    pub fn insert(&self, key: TKey, data: TData) {
        if self.size == 0 {
            return;
        }
        let mut write_guard = self.map.write();
        if write_guard.len() == self.size && !write_guard.contains_key(&key) {
            write_guard.swap_remove_index(0);
        }
        write_guard.insert(key, data);
    }

    pub fn remove(&self, key: &TKey) {
        self.map.write().swap_remove(key);
    }

    pub fn remove_all(&self) {
        self.map.write().clear();
    }
}
