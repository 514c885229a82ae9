//! Resolves a player's active talent loadout from their profile.

use bnet_client::{BnetClient, Namespace};
use common::{Error, GameData, LoadoutNode, PlayerLink, PlayerLoadout, PvpTalentPick};
use futures_util::{Stream, StreamExt};
use serde_json::Value;

use crate::raw::{SelectedTalent, SpecializationsPayload};

/// Result of looking up one player.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadoutOutcome {
    Loaded(PlayerLoadout),
    /// The profile could not be fetched (renamed, transferred, private).
    MissingPlayer,
    /// The profile was fetched but holds no usable loadout.
    Error(String),
}

impl LoadoutOutcome {
    pub fn loadout(self) -> Option<PlayerLoadout> {
        match self {
            LoadoutOutcome::Loaded(loadout) => Some(loadout),
            _ => None,
        }
    }
}

/// A batched lookup result with the caller's context.
#[derive(Debug, Clone)]
pub struct Resolved<C> {
    pub player: PlayerLink,
    pub context: C,
    pub outcome: LoadoutOutcome,
}

#[derive(Debug, Clone, Copy)]
pub struct LoadoutResolver<'a> {
    client: &'a BnetClient,
    game_data: &'a GameData,
}

impl<'a> LoadoutResolver<'a> {
    pub fn new(client: &'a BnetClient, game_data: &'a GameData) -> Self {
        Self { client, game_data }
    }

    /// Look up one player. With `override_spec`, that spec's loadout is
    /// read instead of the active spec's.
    pub async fn resolve(
        &self,
        player: &PlayerLink,
        override_spec: Option<&str>,
    ) -> Result<LoadoutOutcome, Error> {
        let resource = player.specialization_resource();
        match self.client.get(&resource, Namespace::Profile, &[], false).await {
            Ok(body) => Ok(self.decode(player, body, override_spec)),
            Err(Error::Api { .. }) => Ok(LoadoutOutcome::MissingPlayer),
            Err(e) => Err(e),
        }
    }

    /// Look up many players through the batched client. Profiles are never
    /// cached. Results arrive in completion order.
    pub fn resolve_many<C: 'a>(
        &self,
        players: Vec<(PlayerLink, C)>,
        override_spec: Option<String>,
    ) -> impl Stream<Item = Result<Resolved<C>, Error>> + 'a {
        let resolver = *self;
        let requests = players
            .into_iter()
            .map(|(player, context)| (player.specialization_resource(), (player, context)))
            .collect();

        self.client
            .get_many(requests, Namespace::Profile, false)
            .map(move |fetched| {
                let fetched = fetched?;
                let (player, context) = fetched.context;
                let outcome = match fetched.body {
                    Some(body) => resolver.decode(&player, body, override_spec.as_deref()),
                    None => LoadoutOutcome::MissingPlayer,
                };
                Ok(Resolved {
                    player,
                    context,
                    outcome,
                })
            })
    }

    fn decode(&self, player: &PlayerLink, body: Value, override_spec: Option<&str>) -> LoadoutOutcome {
        let resource = player.specialization_resource();
        let payload: SpecializationsPayload = match Error::decode(&resource, body) {
            Ok(payload) => payload,
            Err(e) => return LoadoutOutcome::Error(e.to_string()),
        };
        match self.active_loadout(player, payload, override_spec) {
            Ok(loadout) => LoadoutOutcome::Loaded(loadout),
            Err(reason) => LoadoutOutcome::Error(reason),
        }
    }

    fn active_loadout(
        &self,
        player: &PlayerLink,
        payload: SpecializationsPayload,
        override_spec: Option<&str>,
    ) -> Result<PlayerLoadout, String> {
        let active_id = payload.active_specialization.id;
        let (class_name, active_spec) = self
            .game_data
            .class_spec_by_spec_id(active_id)
            .ok_or_else(|| format!("Unknown spec id {active_id} for {}", player.full_name()))?;
        let spec_name = override_spec.unwrap_or(active_spec);

        let spec = payload
            .specializations
            .into_iter()
            .find(|s| s.specialization.name == spec_name)
            .ok_or_else(|| format!("Unable to find loadouts for {}", player.full_name()))?;
        let loadout = spec
            .loadouts
            .into_iter()
            .find(|l| l.is_active)
            .ok_or_else(|| format!("No active loadout for {}", player.full_name()))?;

        let mut class_talents = loadout.selected_class_talents;
        // The first class talent sometimes comes back as a bare id and rank.
        if class_talents.first().is_some_and(|t| t.spell_id() == 0) {
            class_talents.remove(0);
        }

        Ok(PlayerLoadout {
            class_name: class_name.to_string(),
            spec_name: spec_name.to_string(),
            class_nodes: loadout_nodes(&class_talents, player)?,
            spec_nodes: loadout_nodes(&loadout.selected_spec_talents, player)?,
            pvp_talents: spec
                .pvp_talent_slots
                .iter()
                .filter_map(|slot| slot.selected.as_ref())
                .map(|selected| PvpTalentPick {
                    id: selected.talent.id,
                })
                .collect(),
            code: loadout.talent_loadout_code,
        })
    }
}

fn loadout_nodes(talents: &[SelectedTalent], player: &PlayerLink) -> Result<Vec<LoadoutNode>, String> {
    talents
        .iter()
        .map(|t| {
            let talent_id = t.talent_id().ok_or_else(|| {
                format!("Node {} of {} has no talent", t.id, player.full_name())
            })?;
            Ok(LoadoutNode {
                node_id: t.id,
                talent_id,
                rank: t.rank,
            })
        })
        .collect()
}
