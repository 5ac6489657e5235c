use super::interval::Interval;
use super::Result;
use crate::model::stores::reachability::ReachabilityStore;
use sedra_hashes::Hash;
use std::collections::HashMap;

/// Reallocates the intervals of the whole tree under `root`.
///
/// Every node is budgeted two positions (itself plus one reserved slot for a
/// future child), so a tree of `n` nodes requires `2n` positions out of the
/// ~2^64 available. Slack beyond the budget is split: half stays with the
/// parent for future children, half is handed down proportionally to the
/// children's subtree sizes. Deep chains therefore inherit almost the whole
/// range down their spine, keeping reindexing rare.
pub fn reindex_intervals(store: &impl ReachabilityStore, root: Hash) -> Result<()> {
    let sizes = count_subtree_sizes(store, root)?;

    let mut stack = vec![root];
    store.set_interval(root, Interval::maximal())?;
    while let Some(current) = stack.pop() {
        let interval = store.get_interval(current)?;
        let children = store.get_children(current)?;
        if children.is_empty() {
            continue;
        }
        // The final position represents the node itself
        let usable = Interval::new(interval.start, interval.end - 1);
        let required: u64 = children.iter().map(|child| 2 * sizes[child]).sum();
        let slack_for_children = usable.size().saturating_sub(required) / 2;

        let mut cursor = usable.start;
        for child in children.iter() {
            let child_required = 2 * sizes[child];
            let share = ((slack_for_children as u128 * child_required as u128) / required as u128) as u64;
            let capacity = child_required + share;
            store.set_interval(*child, Interval::new(cursor, cursor + capacity - 1))?;
            cursor += capacity;
            stack.push(*child);
        }
    }
    Ok(())
}

/// Iterative subtree-size count (post-order via a two-phase stack).
fn count_subtree_sizes(store: &impl ReachabilityStore, root: Hash) -> Result<HashMap<Hash, u64>> {
    let mut sizes: HashMap<Hash, u64> = HashMap::new();
    let mut stack = vec![(root, false)];
    while let Some((current, expanded)) = stack.pop() {
        let children = store.get_children(current)?;
        if expanded {
            sizes.insert(current, 1 + children.iter().map(|child| sizes[child]).sum::<u64>());
        } else {
            stack.push((current, true));
            for child in children.iter() {
                stack.push((*child, false));
            }
        }
    }
    Ok(sizes)
}
