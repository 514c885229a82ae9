//! Building [`TalentNode`]s from upstream payloads.

use common::{Error, Rank, Spell, Talent, TalentNode};

use crate::raw::{RawNode, TalentDetail, Tooltip};
use crate::strategy::ReferenceNode;

/// Node type given to nodes rebuilt from reference data.
pub const MISSING_NODE_TYPE: &str = "MISSING";

/// Build a node from a tree payload entry.
///
/// Returns `Ok(None)` for placeholder nodes: no ranks, or a first rank with
/// neither a tooltip nor a choice of tooltips. A choice rank must offer two
/// talents and every rank of a plain node must carry a tooltip.
pub fn from_raw_node(raw: &RawNode) -> Result<Option<TalentNode>, Error> {
    let Some(base_rank) = raw.ranks.first() else {
        return Ok(None);
    };
    let malformed = |message: String| Error::Decode {
        resource: format!("talent node {}", raw.id),
        message,
    };

    let (max_rank, talents) = match base_rank.choices() {
        Some([first, second, ..]) => (1, vec![talent(first, &[first]), talent(second, &[second])]),
        Some(choices) => {
            return Err(malformed(format!(
                "choice node offers {} talent(s), expected 2",
                choices.len()
            )))
        }
        None => {
            let Some(base) = base_rank.tooltip.as_ref() else {
                return Ok(None);
            };
            let tooltips = raw
                .ranks
                .iter()
                .enumerate()
                .map(|(i, rank)| {
                    rank.tooltip
                        .as_ref()
                        .ok_or_else(|| malformed(format!("rank {} has no tooltip", i + 1)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            (raw.ranks.len(), vec![talent(base, &tooltips)])
        }
    };

    Ok(Some(TalentNode {
        id: raw.id,
        x: raw.raw_position_x,
        y: raw.raw_position_y,
        row: raw.display_row,
        col: raw.display_col,
        unlocks: raw.unlocks.clone(),
        locked_by: raw.locked_by.clone(),
        talents,
        max_rank: clamp_rank(max_rank),
        node_type: raw.node_type.kind.clone(),
    }))
}

/// A talent named after `base` whose spell carries a rank per tooltip.
fn talent(base: &Tooltip, tooltips: &[&Tooltip]) -> Talent {
    let ranks = tooltips
        .iter()
        .map(|t| {
            let st = &t.spell_tooltip;
            Rank {
                description: st.description.clone(),
                cast_time: st.cast_time.clone(),
                power_cost: st.power_cost.clone(),
                range: st.range.clone(),
                cooldown: st.cooldown.clone(),
            }
        })
        .collect();

    Talent {
        id: base.talent.id,
        name: base.talent.name.clone(),
        spell: Spell {
            id: base.spell_tooltip.spell.id,
            name: base.spell_tooltip.spell.name.clone(),
            ranks,
        },
    }
}

/// Rebuild a node from the in-game reference table and the talent detail
/// payloads of its talents, in `talent_ids` order.
pub fn from_reference_node(
    reference: &ReferenceNode,
    details: &[TalentDetail],
) -> Result<TalentNode, Error> {
    let first = details.first().ok_or_else(|| {
        Error::Other(format!("reference node {} has no talents", reference.id))
    })?;

    let talents = details
        .iter()
        .map(|detail| Talent {
            id: detail.id,
            name: detail.spell.name.clone(),
            spell: Spell {
                id: detail.spell.id,
                name: detail.spell.name.clone(),
                ranks: detail
                    .rank_descriptions
                    .iter()
                    .map(|r| Rank::described(r.description.clone()))
                    .collect(),
            },
        })
        .collect();

    Ok(TalentNode {
        id: reference.id,
        x: reference.pos_x,
        y: reference.pos_y,
        row: 0,
        col: 0,
        unlocks: Vec::new(),
        locked_by: reference.locked_by.clone(),
        talents,
        max_rank: clamp_rank(first.rank_descriptions.len()),
        node_type: MISSING_NODE_TYPE.to_string(),
    })
}

/// True when any of a node's talents belongs to a specialization.
pub fn is_spec_node(details: &[TalentDetail]) -> bool {
    details.iter().any(|d| d.playable_specialization.is_some())
}

fn clamp_rank(ranks: usize) -> u8 {
    u8::try_from(ranks).unwrap_or(u8::MAX)
}
