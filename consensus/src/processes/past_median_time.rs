use crate::model::stores::ghostdag::{GhostdagData, GhostdagStoreReader};
use crate::model::stores::headers::HeaderStoreReader;
use crate::model::stores::reachability::ReachabilityStore;
use crate::model::stores::relations::RelationsStoreReader;
use crate::processes::traversal::DagTraversalManager;
use std::sync::Arc;

pub struct PastMedianTimeManager<T: HeaderStoreReader, U: GhostdagStoreReader, S: RelationsStoreReader, V: ReachabilityStore> {
    headers_store: Arc<T>,
    dag_traversal_manager: Arc<DagTraversalManager<U, S, V>>,
    timestamp_deviation_tolerance: u64,
    genesis_timestamp: i64,
}

impl<T: HeaderStoreReader, U: GhostdagStoreReader, S: RelationsStoreReader, V: ReachabilityStore>
    PastMedianTimeManager<T, U, S, V>
{
    pub fn new(
        headers_store: Arc<T>,
        dag_traversal_manager: Arc<DagTraversalManager<U, S, V>>,
        timestamp_deviation_tolerance: u64,
        genesis_timestamp: i64,
    ) -> Self {
        Self { headers_store, dag_traversal_manager, timestamp_deviation_tolerance, genesis_timestamp }
    }

    /// The median timestamp of the blue past window of a block with the
    /// given ghostdag data. An empty past yields the genesis timestamp.
    pub fn calc_past_median_time(&self, ghostdag_data: &GhostdagData) -> i64 {
        let window = self.dag_traversal_manager.blue_window(ghostdag_data, 2 * self.timestamp_deviation_tolerance as usize - 1);
        if window.is_empty() {
            return self.genesis_timestamp;
        }
        self.median_of(window.iter().map(|hash| self.headers_store.get_timestamp(*hash).unwrap()))
    }

    /// The median over a window anchored at the block itself: its own
    /// timestamp plus its blue past. New blocks must not fall below this
    /// value of their selected parent.
    pub fn calc_median_time_including_block(&self, hash: sedra_hashes::Hash, ghostdag_data: &GhostdagData) -> i64 {
        let window = self.dag_traversal_manager.blue_window(ghostdag_data, 2 * self.timestamp_deviation_tolerance as usize - 2);
        let own_timestamp = self.headers_store.get_timestamp(hash).unwrap();
        self.median_of(std::iter::once(own_timestamp).chain(window.iter().map(|h| self.headers_store.get_timestamp(*h).unwrap())))
    }

    fn median_of(&self, timestamps: impl Iterator<Item = i64>) -> i64 {
        let mut window_timestamps: Vec<i64> = timestamps.collect();
        window_timestamps.sort_unstable(); // Deterministic: sorting plain integers
        window_timestamps[window_timestamps.len() / 2]
    }
}
