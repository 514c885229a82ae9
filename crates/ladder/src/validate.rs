//! Loadout checks against a specialization's talent tree.

use common::{PlayerLoadout, TalentTree};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("node {0} is not in the tree")]
    UnknownNode(u32),

    #[error("talent {talent_id} does not belong to node {node_id}")]
    ForeignTalent { node_id: u32, talent_id: u32 },

    #[error("rank {rank} of node {node_id} exceeds max rank {max_rank}")]
    RankTooHigh { node_id: u32, rank: u8, max_rank: u8 },
}

/// Every selected node must exist in the tree, carry one of that node's
/// talents, and not exceed its max rank.
pub fn validate_loadout(loadout: &PlayerLoadout, tree: &TalentTree) -> Result<(), ValidationError> {
    for selected in loadout.nodes() {
        let node = tree
            .node(selected.node_id)
            .ok_or(ValidationError::UnknownNode(selected.node_id))?;
        if !node.has_talent(selected.talent_id) {
            return Err(ValidationError::ForeignTalent {
                node_id: selected.node_id,
                talent_id: selected.talent_id,
            });
        }
        if selected.rank > node.max_rank {
            return Err(ValidationError::RankTooHigh {
                node_id: selected.node_id,
                rank: selected.rank,
                max_rank: node.max_rank,
            });
        }
    }
    Ok(())
}
