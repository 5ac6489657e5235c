use crate::model::stores::ghostdag::{GhostdagData, GhostdagStoreReader};
use crate::model::stores::headers::HeaderStoreReader;
use crate::model::stores::reachability::ReachabilityStore;
use crate::model::stores::relations::RelationsStoreReader;
use crate::processes::traversal::DagTraversalManager;
use sedra_math::{Uint256, Uint320};
use std::sync::Arc;

/// Window-averaged difficulty: the required target is the mean target over
/// the selected parent's blue window, rescaled by the window's actual
/// duration against the expected one. Integer arithmetic throughout.
pub struct DifficultyManager<T: HeaderStoreReader, U: GhostdagStoreReader, S: RelationsStoreReader, V: ReachabilityStore> {
    headers_store: Arc<T>,
    dag_traversal_manager: Arc<DagTraversalManager<U, S, V>>,
    genesis_bits: u32,
    pow_limit_bits: u32,
    difficulty_window_size: usize,
    target_time_per_block: u64,
}

impl<T: HeaderStoreReader, U: GhostdagStoreReader, S: RelationsStoreReader, V: ReachabilityStore>
    DifficultyManager<T, U, S, V>
{
    pub fn new(
        headers_store: Arc<T>,
        dag_traversal_manager: Arc<DagTraversalManager<U, S, V>>,
        genesis_bits: u32,
        pow_limit_bits: u32,
        difficulty_window_size: usize,
        target_time_per_block: u64,
    ) -> Self {
        Self { headers_store, dag_traversal_manager, genesis_bits, pow_limit_bits, difficulty_window_size, target_time_per_block }
    }

    /// The difficulty bits required of a block whose selected parent has the
    /// given hash and ghostdag data.
    pub fn required_difficulty(&self, selected_parent: sedra_hashes::Hash, selected_parent_data: &GhostdagData) -> u32 {
        let mut window = vec![selected_parent];
        window.extend(self.dag_traversal_manager.blue_window(selected_parent_data, self.difficulty_window_size - 1));
        if window.len() < self.difficulty_window_size {
            return self.genesis_bits;
        }

        let mut target_sum = Uint320::ZERO;
        let mut min_timestamp = i64::MAX;
        let mut max_timestamp = i64::MIN;
        for hash in window.iter() {
            let bits = self.headers_store.get_bits(*hash).unwrap();
            let timestamp = self.headers_store.get_timestamp(*hash).unwrap();
            min_timestamp = min_timestamp.min(timestamp);
            max_timestamp = max_timestamp.max(timestamp);
            // Stored bits were validated, so decoding cannot fail
            let target = Uint256::from_compact_bits(bits).unwrap();
            target_sum = target_sum + Uint320::from(target);
        }

        let (average_target, _) = target_sum.div_rem_u64(window.len() as u64);
        let actual_duration = (max_timestamp - min_timestamp).max(1) as u64;
        let expected_duration = (window.len() as u64 - 1) * self.target_time_per_block;

        let (scaled, overflow) = average_target.overflowing_mul_u64(actual_duration);
        let new_target = if overflow { Uint320::from(Uint256::MAX) } else { scaled.div_rem_u64(expected_duration.max(1)).0 };

        let pow_limit = Uint256::from_compact_bits(self.pow_limit_bits).unwrap();
        let clamped = new_target.saturating_into_u256().min(pow_limit);
        clamped.to_compact_bits()
    }
}
