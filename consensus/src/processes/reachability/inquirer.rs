use super::interval::Interval;
use super::{tree, Result};
use crate::model::stores::reachability::ReachabilityStore;
use sedra_consensus_core::blockhash::ORIGIN;
use sedra_hashes::Hash;

/// Initializes the reachability store with the origin root, under which the
/// genesis and all future blocks are inserted.
pub fn init(store: &impl ReachabilityStore) -> Result<()> {
    if store.has(ORIGIN)? {
        return Ok(());
    }
    store.insert(ORIGIN, ORIGIN, Interval::maximal(), 0)?;
    Ok(())
}

/// Registers a freshly admitted block: attaches it to the selected-parent
/// tree and records it in the future covering set of every mergeset block.
pub fn add_block(store: &impl ReachabilityStore, block: Hash, selected_parent: Hash, mergeset: &[Hash]) -> Result<()> {
    tree::add_tree_child(store, selected_parent, block)?;
    for merged_block in mergeset.iter().filter(|&&merged| merged != selected_parent) {
        insert_to_future_covering_set(store, *merged_block, block)?;
    }
    Ok(())
}

/// Is `anchor` an ancestor of `queried` in the selected-parent tree
/// (inclusive: a block is its own chain ancestor)?
pub fn is_chain_ancestor_of(store: &impl ReachabilityStore, anchor: Hash, queried: Hash) -> Result<bool> {
    Ok(store.get_interval(anchor)?.contains(store.get_interval(queried)?))
}

/// Is `anchor` an ancestor of `queried` in the DAG (inclusive)? Resolved via
/// the tree interval when possible, and through `anchor`'s future covering
/// set otherwise, in O(log n).
pub fn is_dag_ancestor_of(store: &impl ReachabilityStore, anchor: Hash, queried: Hash) -> Result<bool> {
    if is_chain_ancestor_of(store, anchor, queried)? {
        return Ok(true);
    }
    let queried_interval = store.get_interval(queried)?;
    let fcs = store.get_future_covering_set(anchor)?;
    match binary_search_descendant(store, &fcs, queried_interval)? {
        SearchOutput::Found(_) => Ok(true),
        SearchOutput::NotFound(_) => Ok(false),
    }
}

/// Walks up the selected-parent tree from `descendant` to the child of
/// `ancestor` on that path, in O(log n) via binary search over tree children.
pub fn get_next_chain_ancestor(store: &impl ReachabilityStore, descendant: Hash, ancestor: Hash) -> Result<Hash> {
    let descendant_interval = store.get_interval(descendant)?;
    let children = store.get_children(ancestor)?;
    match binary_search_descendant(store, &children, descendant_interval)? {
        SearchOutput::Found(hash) => Ok(hash),
        SearchOutput::NotFound(_) => Err(super::ReachabilityError::DataOverflow),
    }
}

enum SearchOutput {
    Found(Hash),
    NotFound(usize),
}

/// Searches an interval-ordered, disjoint list for the element whose
/// interval contains `target`. On a miss, returns the insertion index that
/// keeps the list ordered.
fn binary_search_descendant(store: &impl ReachabilityStore, ordered_hashes: &[Hash], target: Interval) -> Result<SearchOutput> {
    let mut low = 0usize;
    let mut high = ordered_hashes.len();
    while low < high {
        let mid = (low + high) / 2;
        let mid_interval = store.get_interval(ordered_hashes[mid])?;
        if mid_interval.end < target.start {
            low = mid + 1;
        } else if target.end < mid_interval.start {
            high = mid;
        } else if mid_interval.contains(target) {
            return Ok(SearchOutput::Found(ordered_hashes[mid]));
        } else {
            // Overlap without containment cannot happen for tree intervals
            return Ok(SearchOutput::NotFound(mid));
        }
    }
    Ok(SearchOutput::NotFound(low))
}

fn insert_to_future_covering_set(store: &impl ReachabilityStore, merged_block: Hash, new_block: Hash) -> Result<()> {
    let new_interval = store.get_interval(new_block)?;
    let fcs = store.get_future_covering_set(merged_block)?;
    match binary_search_descendant(store, &fcs, new_interval)? {
        // An existing item already covers the new block's subtree
        SearchOutput::Found(_) => Ok(()),
        SearchOutput::NotFound(insertion_index) => {
            // A new leaf can never cover an existing item, so a plain insert suffices
            store.insert_future_covering_item(merged_block, new_block, insertion_index)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::stores::reachability::MemoryReachabilityStore;

    /// Builds the tree/DAG structure:
    ///   genesis(1) <- 2 <- 3 <- 4 (chain), genesis <- 5,
    ///   where 5 also merges 2 (i.e. 2 is in 5's mergeset past via parents)
    fn build_store() -> MemoryReachabilityStore {
        let store = MemoryReachabilityStore::new();
        init(&store).unwrap();
        add_block(&store, 1.into(), ORIGIN, &[]).unwrap();
        add_block(&store, 2.into(), 1.into(), &[]).unwrap();
        add_block(&store, 3.into(), 2.into(), &[]).unwrap();
        add_block(&store, 4.into(), 3.into(), &[]).unwrap();
        add_block(&store, 5.into(), 1.into(), &[2.into()]).unwrap();
        store
    }

    #[test]
    fn test_chain_ancestry() {
        let store = build_store();
        assert!(is_chain_ancestor_of(&store, 1.into(), 4.into()).unwrap());
        assert!(is_chain_ancestor_of(&store, 2.into(), 4.into()).unwrap());
        assert!(is_chain_ancestor_of(&store, 4.into(), 4.into()).unwrap());
        assert!(!is_chain_ancestor_of(&store, 4.into(), 2.into()).unwrap());
        assert!(!is_chain_ancestor_of(&store, 5.into(), 4.into()).unwrap());
    }

    #[test]
    fn test_dag_ancestry_via_future_covering_set() {
        let store = build_store();
        // 2 is a DAG ancestor of 5 through the covering set, not the tree
        assert!(!is_chain_ancestor_of(&store, 2.into(), 5.into()).unwrap());
        assert!(is_dag_ancestor_of(&store, 2.into(), 5.into()).unwrap());
        assert!(is_dag_ancestor_of(&store, 1.into(), 5.into()).unwrap());
        assert!(!is_dag_ancestor_of(&store, 3.into(), 5.into()).unwrap());
        assert!(!is_dag_ancestor_of(&store, 5.into(), 3.into()).unwrap());
    }

    #[test]
    fn test_next_chain_ancestor() {
        let store = build_store();
        assert_eq!(get_next_chain_ancestor(&store, 4.into(), 1.into()).unwrap(), 2.into());
        assert_eq!(get_next_chain_ancestor(&store, 4.into(), 2.into()).unwrap(), 3.into());
    }

    #[test]
    fn test_deep_chain_triggers_reindex() {
        // A long chain forces interval exhaustion and a reindex; ancestry
        // queries must stay correct throughout
        let store = MemoryReachabilityStore::new();
        init(&store).unwrap();
        add_block(&store, 1.into(), ORIGIN, &[]).unwrap();
        let depth = 300u64;
        for i in 2..=depth {
            add_block(&store, i.into(), (i - 1).into(), &[]).unwrap();
        }
        for i in 1..=depth {
            assert!(is_chain_ancestor_of(&store, 1.into(), i.into()).unwrap());
            assert!(is_dag_ancestor_of(&store, i.into(), depth.into()).unwrap());
        }
        assert!(!is_dag_ancestor_of(&store, depth.into(), 1.into()).unwrap());
    }

    #[test]
    fn test_wide_tree_with_merges() {
        // Many siblings merging their predecessors
        let store = MemoryReachabilityStore::new();
        init(&store).unwrap();
        add_block(&store, 1.into(), ORIGIN, &[]).unwrap();
        let width = 100u64;
        for i in 2..=width {
            let mergeset: Vec<Hash> = (2..i).map(Hash::from).collect();
            add_block(&store, i.into(), 1.into(), &mergeset).unwrap();
        }
        for i in 2..=width {
            for j in 2..=width {
                assert_eq!(is_dag_ancestor_of(&store, i.into(), j.into()).unwrap(), i <= j, "{i} vs {j}");
            }
        }
    }
}
