//! Spell icon lookup.

use std::collections::{HashMap, HashSet};

use bnet_client::{BnetClient, Namespace};
use common::{Error, TalentTree};
use futures_util::{pin_mut, StreamExt};
use tracing::info;

use crate::raw::SpellMedia;

fn media_resource(spell_id: u32) -> String {
    format!("/data/wow/media/spell/{spell_id}")
}

/// Icon names for the given spells. Duplicate ids are fetched once; a spell
/// without an icon is an error.
pub async fn spell_icons(
    client: &BnetClient,
    spell_ids: impl IntoIterator<Item = u32>,
) -> Result<HashMap<u32, String>, Error> {
    let mut seen = HashSet::new();
    let requests: Vec<(String, u32)> = spell_ids
        .into_iter()
        .filter(|id| seen.insert(*id))
        .map(|id| (media_resource(id), id))
        .collect();
    info!("Fetching media for {} spells", requests.len());

    let mut icons = HashMap::with_capacity(requests.len());
    let responses = client.get_many(requests, Namespace::Static, true);
    pin_mut!(responses);
    while let Some(fetched) = responses.next().await {
        let fetched = fetched?;
        let resource = media_resource(fetched.context);
        let body = fetched.body.ok_or_else(|| Error::Api {
            status: fetched.status,
            url: resource.clone(),
            body: format!("Unable to get media for spell {}", fetched.context),
        })?;
        let media: SpellMedia = Error::decode(&resource, body)?;
        let icon = media.icon().ok_or_else(|| Error::Decode {
            resource: resource.clone(),
            message: format!("Unable to find icon for {}", fetched.context),
        })?;
        icons.insert(fetched.context, icon.to_string());
    }
    Ok(icons)
}

/// Icons for every spell referenced by `trees`.
pub async fn tree_icons(
    client: &BnetClient,
    trees: &[TalentTree],
) -> Result<HashMap<u32, String>, Error> {
    let ids: Vec<u32> = trees
        .iter()
        .flat_map(|tree| tree.all_spells().map(|spell| spell.id))
        .collect();
    spell_icons(client, ids).await
}
