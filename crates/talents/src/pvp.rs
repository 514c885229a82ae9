//! PvP talents, fetched once per run and shared by every tree.

use bnet_client::{BnetClient, Namespace};
use common::{Error, GameData, Rank, Spell, Talent};
use futures_util::{pin_mut, StreamExt};
use tracing::{debug, info};

use crate::raw::{PvpTalentDetail, PvpTalentIndex};

pub const PVP_TALENT_INDEX_RESOURCE: &str = "/data/wow/pvp-talent/index";

/// Every PvP talent the API lists, in index order.
#[derive(Debug, Clone, Default)]
pub struct PvpCatalog {
    entries: Vec<PvpTalentDetail>,
}

impl PvpCatalog {
    /// Fetch the index and every entry. Any entry that cannot be fetched is
    /// fatal: a tree with a partial PvP list would encode loadouts wrongly.
    pub async fn fetch(client: &BnetClient) -> Result<Self, Error> {
        let body = client.get_static(PVP_TALENT_INDEX_RESOURCE).await?;
        let index: PvpTalentIndex = Error::decode(PVP_TALENT_INDEX_RESOURCE, body)?;
        info!("Fetching {} pvp talents", index.pvp_talents.len());

        let requests = index
            .pvp_talents
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.key.href.clone(), position))
            .collect();
        let mut slots: Vec<Option<PvpTalentDetail>> =
            (0..index.pvp_talents.len()).map(|_| None).collect();

        let responses = client.get_many(requests, Namespace::Static, true);
        pin_mut!(responses);
        while let Some(fetched) = responses.next().await {
            let fetched = fetched?;
            let entry = &index.pvp_talents[fetched.context];
            let body = fetched.body.ok_or_else(|| Error::Api {
                status: fetched.status,
                url: entry.key.href.clone(),
                body: format!("Unable to get pvp talent {}", entry.id),
            })?;
            slots[fetched.context] = Some(Error::decode(&entry.key.href, body)?);
        }

        Ok(Self::from_entries(slots.into_iter().flatten().collect()))
    }

    pub fn from_entries(entries: Vec<PvpTalentDetail>) -> Self {
        Self { entries }
    }

    /// Talents available to one class/spec. Spec names are shared between
    /// classes, so the entry's spec id must also map back to `class_name`.
    pub fn talents_for(&self, class_name: &str, spec_name: &str, game_data: &GameData) -> Vec<Talent> {
        self.entries
            .iter()
            .filter(|entry| entry.playable_specialization.name == spec_name)
            .filter(|entry| {
                match game_data.class_spec_by_spec_id(entry.playable_specialization.id) {
                    Some((found_class, _)) => found_class == class_name,
                    None => {
                        debug!(
                            "Skipping pvp talent {} for unknown spec id {}",
                            entry.id, entry.playable_specialization.id
                        );
                        false
                    }
                }
            })
            .map(|entry| Talent {
                id: entry.id,
                name: entry.spell.name.clone(),
                spell: Spell {
                    id: entry.spell.id,
                    name: entry.spell.name.clone(),
                    ranks: vec![Rank::described(entry.description.clone())],
                },
            })
            .collect()
    }
}
