//! Wire schemas for leaderboard, season, realm and profile endpoints.

use common::Faction;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct KeyLink {
    pub href: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdRef {
    pub id: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    pub id: u32,
    pub name: String,
}

// ── /data/wow/pvp-season/index ────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SeasonIndexPayload {
    pub current_season: IdRef,
}

// ── /data/wow/pvp-season/{season}/pvp-leaderboard/{bracket} ───────────

#[derive(Debug, Deserialize)]
pub struct LeaderboardPayload {
    /// Absent for brackets nobody has played yet.
    #[serde(default)]
    pub entries: Vec<RawLeaderboardEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RawLeaderboardEntry {
    pub character: RawCharacter,
    pub faction: RawFaction,
    pub rating: u32,
}

#[derive(Debug, Deserialize)]
pub struct RawCharacter {
    pub name: String,
    pub realm: RawRealmRef,
}

#[derive(Debug, Deserialize)]
pub struct RawRealmRef {
    pub key: KeyLink,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct RawFaction {
    #[serde(rename = "type")]
    pub kind: Faction,
}

// ── /data/wow/realm/{slug} ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RealmPayload {
    pub id: u32,
    pub name: String,
    pub slug: String,
}

// ── /profile/wow/character/{realm}/{name}/specializations ─────────────

#[derive(Debug, Deserialize)]
pub struct SpecializationsPayload {
    pub active_specialization: NamedRef,
    pub specializations: Vec<SpecializationEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SpecializationEntry {
    pub specialization: NamedRef,
    #[serde(default)]
    pub loadouts: Vec<RawLoadout>,
    #[serde(default)]
    pub pvp_talent_slots: Vec<PvpSlot>,
}

#[derive(Debug, Deserialize)]
pub struct RawLoadout {
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub talent_loadout_code: String,
    #[serde(default)]
    pub selected_class_talents: Vec<SelectedTalent>,
    #[serde(default)]
    pub selected_spec_talents: Vec<SelectedTalent>,
}

#[derive(Debug, Deserialize)]
pub struct SelectedTalent {
    pub id: u32,
    pub rank: u8,
    #[serde(default)]
    pub tooltip: Option<SelectedTooltip>,
}

impl SelectedTalent {
    pub fn talent_id(&self) -> Option<u32> {
        self.tooltip.as_ref()?.talent.as_ref().map(|t| t.id)
    }

    /// Spell id, 0 when the API left the tooltip empty.
    pub fn spell_id(&self) -> u32 {
        self.tooltip
            .as_ref()
            .and_then(|t| t.spell_tooltip.as_ref())
            .and_then(|st| st.spell.as_ref())
            .map(|s| s.id)
            .unwrap_or(0)
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectedTooltip {
    #[serde(default)]
    pub talent: Option<IdRef>,
    #[serde(default)]
    pub spell_tooltip: Option<SpellTooltipRef>,
}

#[derive(Debug, Deserialize)]
pub struct SpellTooltipRef {
    #[serde(default)]
    pub spell: Option<IdRef>,
}

#[derive(Debug, Deserialize)]
pub struct PvpSlot {
    #[serde(default)]
    pub selected: Option<PvpSelection>,
}

#[derive(Debug, Deserialize)]
pub struct PvpSelection {
    pub talent: IdRef,
}
