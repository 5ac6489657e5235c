use super::interval::Interval;
use super::{reindex, ReachabilityError, Result};
use crate::model::stores::reachability::ReachabilityStore;
use sedra_consensus_core::blockhash::ORIGIN;
use sedra_hashes::Hash;

/// The yet-unallocated tail of `parent`'s interval: everything past its last
/// child's allocation, excluding the final position which represents the
/// parent itself.
pub fn interval_remaining_after(store: &impl ReachabilityStore, parent: Hash) -> Result<Interval> {
    let parent_interval = store.get_interval(parent)?;
    let children = store.get_children(parent)?;
    match children.last() {
        Some(last_child) => {
            let last_end = store.get_interval(*last_child)?.end;
            Ok(Interval::new(last_end + 1, parent_interval.end.saturating_sub(1)))
        }
        None => Ok(Interval::new(parent_interval.start, parent_interval.end.saturating_sub(1))),
    }
}

/// Attaches `child` under `parent` in the selected-parent tree, allocating it
/// half of the parent's remaining capacity. Exhausted capacity triggers a
/// tree-wide reindex before the allocation is retried.
pub fn add_tree_child(store: &impl ReachabilityStore, parent: Hash, child: Hash) -> Result<()> {
    let mut remaining = interval_remaining_after(store, parent)?;
    if remaining.is_empty() {
        reindex::reindex_intervals(store, ORIGIN)?;
        remaining = interval_remaining_after(store, parent)?;
        if remaining.is_empty() {
            return Err(ReachabilityError::DataOverflow);
        }
    }
    let allocated = remaining.split_half().0;
    let parent_height = store.get_height(parent)?;
    store.insert(child, parent, allocated, parent_height + 1)?;
    store.append_child(parent, child)?;
    Ok(())
}
