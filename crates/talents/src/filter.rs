//! Node pruning applied to each half of a tree.

use std::collections::HashSet;

use common::TalentNode;

/// Drop `deny` nodes, then nodes that can never be unlocked.
///
/// A node with a non-empty `locked_by` survives only if at least one of
/// those ids survives too. Pruning repeats until nothing changes, so a chain
/// hanging off a removed node goes with it.
pub fn filter_nodes(nodes: Vec<TalentNode>, deny: &HashSet<u32>) -> Vec<TalentNode> {
    let mut kept: Vec<TalentNode> = nodes.into_iter().filter(|n| !deny.contains(&n.id)).collect();

    loop {
        let ids: HashSet<u32> = kept.iter().map(|n| n.id).collect();
        let before = kept.len();
        kept.retain(|n| n.locked_by.is_empty() || n.locked_by.iter().any(|id| ids.contains(id)));
        if kept.len() == before {
            return kept;
        }
    }
}
