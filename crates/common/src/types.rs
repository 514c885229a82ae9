//! Domain types shared across the scanner.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── API region ────────────────────────────────────────────────────────

/// Battle.net API region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Us,
    Eu,
    Kr,
    Tw,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Eu => "eu",
            Region::Kr => "kr",
            Region::Tw => "tw",
        }
    }

    /// Locale requested from the API. Names are matched against English tables.
    pub fn locale(&self) -> &'static str {
        match self {
            Region::Eu => "en_GB",
            _ => "en_US",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "us" => Ok(Region::Us),
            "eu" => Ok(Region::Eu),
            "kr" => Ok(Region::Kr),
            "tw" => Ok(Region::Tw),
            other => Err(format!("unknown region '{other}' (expected us, eu, kr or tw)")),
        }
    }
}

// ── Talent trees ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rank {
    pub description: String,
    pub cast_time: Option<String>,
    pub power_cost: Option<String>,
    pub range: Option<String>,
    pub cooldown: Option<String>,
}

impl Rank {
    /// A rank carrying only a description, as reported by talent detail payloads.
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            cast_time: None,
            power_cost: None,
            range: None,
            cooldown: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spell {
    pub id: u32,
    pub name: String,
    /// One rank per talent point invested.
    pub ranks: Vec<Rank>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Talent {
    pub id: u32,
    pub name: String,
    pub spell: Spell,
}

/// One slot of a class or spec tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalentNode {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub row: i32,
    pub col: i32,
    pub unlocks: Vec<u32>,
    pub locked_by: Vec<u32>,
    /// One talent, or two mutually exclusive talents for choice nodes.
    pub talents: Vec<Talent>,
    pub max_rank: u8,
    pub node_type: String,
}

impl TalentNode {
    pub fn has_talent(&self, talent_id: u32) -> bool {
        self.talents.iter().any(|t| t.id == talent_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalentTree {
    pub class_name: String,
    pub class_id: u32,
    pub spec_name: String,
    pub spec_id: u32,
    pub class_nodes: Vec<TalentNode>,
    pub spec_nodes: Vec<TalentNode>,
    pub pvp_talents: Vec<Talent>,
}

impl TalentTree {
    /// Class nodes followed by spec nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &TalentNode> {
        self.class_nodes.iter().chain(self.spec_nodes.iter())
    }

    pub fn node(&self, node_id: u32) -> Option<&TalentNode> {
        self.nodes().find(|n| n.id == node_id)
    }

    /// Every spell referenced by the tree, node talents first, then pvp talents.
    pub fn all_spells(&self) -> impl Iterator<Item = &Spell> {
        self.nodes()
            .flat_map(|n| n.talents.iter())
            .chain(self.pvp_talents.iter())
            .map(|t| &t.spell)
    }
}

// ── Players ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RealmLink {
    pub slug: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Realm {
    pub id: u32,
    pub name: String,
    pub slug: String,
}

/// A character on a realm. Derives the profile resource paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerLink {
    pub realm: RealmLink,
    pub name: String,
}

impl PlayerLink {
    pub fn new(realm: RealmLink, name: impl Into<String>) -> Self {
        Self {
            realm,
            name: name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} - {}", self.name, self.realm.slug)
    }

    pub fn profile_resource(&self) -> String {
        format!(
            "/profile/wow/character/{}/{}",
            self.realm.slug,
            self.name.to_lowercase()
        )
    }

    pub fn specialization_resource(&self) -> String {
        format!("{}/specializations", self.profile_resource())
    }
}

/// A player's selection at one talent node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadoutNode {
    pub node_id: u32,
    pub talent_id: u32,
    pub rank: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PvpTalentPick {
    pub id: u32,
}

/// A player's active talents, as decoded from their specialization profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerLoadout {
    pub class_name: String,
    pub spec_name: String,
    pub class_nodes: Vec<LoadoutNode>,
    pub spec_nodes: Vec<LoadoutNode>,
    pub pvp_talents: Vec<PvpTalentPick>,
    /// In-game import string, empty when the API omits it.
    #[serde(default)]
    pub code: String,
}

impl PlayerLoadout {
    pub fn nodes(&self) -> impl Iterator<Item = &LoadoutNode> {
        self.class_nodes.iter().chain(self.spec_nodes.iter())
    }
}

// ── Leaderboards ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Faction {
    Alliance,
    Horde,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player: PlayerLink,
    pub faction: Faction,
    pub rating: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedLoadout {
    pub player: PlayerLink,
    pub loadout: PlayerLoadout,
    pub faction: Faction,
    pub rating: u32,
}
