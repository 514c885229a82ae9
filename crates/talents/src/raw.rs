//! Wire schemas for the game data talent endpoints.
//!
//! Only the fields the assembler reads are declared. Missing required keys
//! surface as decode errors at the boundary.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct KeyLink {
    pub href: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    pub id: u32,
    pub name: String,
}

// ── /data/wow/talent-tree/index ───────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TreeIndexPayload {
    pub class_talent_trees: Vec<IndexLink>,
    pub spec_talent_trees: Vec<IndexLink>,
}

#[derive(Debug, Deserialize)]
pub struct IndexLink {
    pub key: KeyLink,
    pub name: String,
}

// ── Tree payloads ─────────────────────────────────────────────────────

/// `/data/wow/talent-tree/{tree}/playable-specialization/{spec}`
#[derive(Debug, Deserialize)]
pub struct SpecTreePayload {
    pub class_talent_nodes: Vec<RawNode>,
    pub spec_talent_nodes: Vec<RawNode>,
}

/// `/data/wow/talent-tree/{tree}`
#[derive(Debug, Deserialize)]
pub struct ClassTreePayload {
    pub talent_nodes: Vec<RawNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeType {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawNode {
    pub id: u32,
    #[serde(default)]
    pub unlocks: Vec<u32>,
    #[serde(default)]
    pub locked_by: Vec<u32>,
    pub node_type: NodeType,
    /// Empty for placeholder nodes.
    #[serde(default)]
    pub ranks: Vec<RawRank>,
    pub display_row: i32,
    pub display_col: i32,
    pub raw_position_x: i32,
    pub raw_position_y: i32,
}

impl RawNode {
    /// Tooltip describing the node's (first) talent.
    pub fn first_tooltip(&self) -> Option<&Tooltip> {
        let rank = self.ranks.first()?;
        match rank.choices() {
            Some(choices) => choices.first(),
            None => rank.tooltip.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRank {
    #[serde(default)]
    pub tooltip: Option<Tooltip>,
    #[serde(default)]
    pub choice_of_tooltips: Option<Vec<Tooltip>>,
}

impl RawRank {
    /// Choice tooltips, if this rank offers a choice.
    pub fn choices(&self) -> Option<&[Tooltip]> {
        self.choice_of_tooltips
            .as_deref()
            .filter(|choices| !choices.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tooltip {
    pub talent: TalentRef,
    pub spell_tooltip: SpellTooltip,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TalentRef {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub key: Option<KeyLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpellTooltip {
    pub spell: NamedRef,
    pub description: String,
    #[serde(default)]
    pub cast_time: Option<String>,
    #[serde(default)]
    pub power_cost: Option<String>,
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub cooldown: Option<String>,
}

// ── /data/wow/talent/{id} ─────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct TalentDetail {
    pub id: u32,
    #[serde(default)]
    pub rank_descriptions: Vec<RankDescription>,
    pub spell: NamedRef,
    #[serde(default)]
    pub playable_specialization: Option<NamedRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankDescription {
    #[serde(default)]
    pub description: String,
}

// ── PvP talents ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PvpTalentIndex {
    pub pvp_talents: Vec<PvpIndexEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PvpIndexEntry {
    pub key: KeyLink,
    pub id: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PvpTalentDetail {
    pub id: u32,
    pub spell: NamedRef,
    pub playable_specialization: NamedRef,
    pub description: String,
}

// ── /data/wow/media/spell/{id} ────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SpellMedia {
    pub assets: Vec<MediaAsset>,
}

#[derive(Debug, Deserialize)]
pub struct MediaAsset {
    pub key: String,
    pub value: String,
}

impl SpellMedia {
    pub fn icon(&self) -> Option<&str> {
        self.assets
            .iter()
            .find(|a| a.key == "icon")
            .map(|a| a.value.as_str())
    }
}
