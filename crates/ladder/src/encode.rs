//! Compact ladder encoding consumed by the UI.
//!
//! Each entry is `base64(payload)|name[|loadout code]`. Payload layout:
//!
//! | field | size |
//! |---|---|
//! | talent count | 1 |
//! | per talent: index, then rank if the node has more than one rank | 1 or 2 |
//! | pvp talent count | 1 |
//! | per pvp talent: index | 1 |
//! | rating | 2, little endian |
//! | realm index | 2, little endian |
//! | faction (1 = horde) | 1 |
//!
//! Talent indices number the tree's distinct talent ids in ascending order;
//! pvp indices do the same for the tree's pvp talents.

use std::collections::{BTreeSet, HashMap, HashSet};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use common::{Error, Faction, PlayerLoadout, RatedLoadout, TalentTree};
use serde::{Deserialize, Serialize};

pub const ENCODING_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealmJson {
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingJson {
    pub version: u32,
    pub realms: Vec<RealmJson>,
}

/// One bracket's ladder for one class/spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderJson {
    pub encoding: EncodingJson,
    pub entries: Vec<String>,
}

/// Realm slugs in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct RealmTable {
    realms: Vec<RealmJson>,
    index: HashMap<String, u16>,
    names: HashMap<String, String>,
}

impl RealmTable {
    /// Table that labels realms with `names` (slug to display name),
    /// falling back to the slug.
    pub fn with_names(names: HashMap<String, String>) -> Self {
        Self {
            names,
            ..Self::default()
        }
    }

    pub fn index_of(&mut self, slug: &str) -> u16 {
        if let Some(&index) = self.index.get(slug) {
            return index;
        }
        let index = u16::try_from(self.realms.len()).unwrap_or(u16::MAX);
        let name = self.names.get(slug).cloned().unwrap_or_else(|| slug.to_string());
        self.realms.push(RealmJson {
            slug: slug.to_string(),
            name,
        });
        self.index.insert(slug.to_string(), index);
        index
    }

    pub fn into_realms(self) -> Vec<RealmJson> {
        self.realms
    }
}

/// Encodes loadouts of one tree.
#[derive(Debug, Clone)]
pub struct LoadoutEncoder {
    talent_index: HashMap<u32, u8>,
    pvp_index: HashMap<u32, u8>,
    multi_rank: HashSet<u32>,
}

fn index_map(ids: BTreeSet<u32>, what: &str) -> Result<HashMap<u32, u8>, Error> {
    ids.into_iter()
        .enumerate()
        .map(|(i, id)| {
            u8::try_from(i)
                .map(|i| (id, i))
                .map_err(|_| Error::Other(format!("too many {what} to encode")))
        })
        .collect()
}

impl LoadoutEncoder {
    pub fn new(tree: &TalentTree) -> Result<Self, Error> {
        let talent_ids: BTreeSet<u32> = tree
            .nodes()
            .flat_map(|n| n.talents.iter().map(|t| t.id))
            .collect();
        let pvp_ids: BTreeSet<u32> = tree.pvp_talents.iter().map(|t| t.id).collect();
        let multi_rank = tree
            .nodes()
            .filter(|n| n.max_rank > 1)
            .flat_map(|n| n.talents.iter().map(|t| t.id))
            .collect();

        Ok(Self {
            talent_index: index_map(talent_ids, "talents")?,
            pvp_index: index_map(pvp_ids, "pvp talents")?,
            multi_rank,
        })
    }

    /// Talent and pvp talent bytes. Selections unknown to the tree are left
    /// out and not counted.
    pub fn encode_talents(&self, loadout: &PlayerLoadout) -> Result<Vec<u8>, Error> {
        let mut talents = Vec::new();
        let mut count = 0usize;
        for node in loadout.nodes() {
            let Some(&index) = self.talent_index.get(&node.talent_id) else {
                continue;
            };
            count += 1;
            talents.push(index);
            if self.multi_rank.contains(&node.talent_id) {
                talents.push(node.rank);
            }
        }

        let pvp: Vec<u8> = loadout
            .pvp_talents
            .iter()
            .filter_map(|t| self.pvp_index.get(&t.id).copied())
            .collect();

        let mut data = Vec::with_capacity(talents.len() + pvp.len() + 2);
        data.push(count_byte(count, "talents")?);
        data.extend(talents);
        data.push(count_byte(pvp.len(), "pvp talents")?);
        data.extend(pvp);
        Ok(data)
    }

    pub fn encode_entry(&self, entry: &RatedLoadout, realms: &mut RealmTable) -> Result<String, Error> {
        let mut data = self.encode_talents(&entry.loadout)?;
        let rating = u16::try_from(entry.rating).unwrap_or(u16::MAX);
        data.extend(rating.to_le_bytes());
        data.extend(realms.index_of(&entry.player.realm.slug).to_le_bytes());
        data.push(match entry.faction {
            Faction::Horde => 1,
            Faction::Alliance => 0,
        });

        let mut encoded = format!("{}|{}", STANDARD.encode(&data), entry.player.name);
        if !entry.loadout.code.is_empty() {
            encoded.push('|');
            encoded.push_str(&entry.loadout.code);
        }
        Ok(encoded)
    }
}

fn count_byte(count: usize, what: &str) -> Result<u8, Error> {
    u8::try_from(count).map_err(|_| Error::Other(format!("{count} selected {what} do not fit one byte")))
}

/// Encode a class/spec ladder. `realm_names` maps slug to display name.
pub fn encode_ladder(
    tree: &TalentTree,
    entries: &[RatedLoadout],
    realm_names: HashMap<String, String>,
) -> Result<LadderJson, Error> {
    let encoder = LoadoutEncoder::new(tree)?;
    let mut realms = RealmTable::with_names(realm_names);
    let entries = entries
        .iter()
        .map(|entry| encoder.encode_entry(entry, &mut realms))
        .collect::<Result<_, _>>()?;
    Ok(LadderJson {
        encoding: EncodingJson {
            version: ENCODING_VERSION,
            realms: realms.into_realms(),
        },
        entries,
    })
}
