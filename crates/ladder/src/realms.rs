//! Realm details for the ladder realm table.

use std::collections::{HashMap, HashSet};

use bnet_client::{BnetClient, Namespace};
use common::{Error, Realm, RealmLink};
use futures_util::{pin_mut, StreamExt};
use tracing::warn;

use crate::raw::RealmPayload;

/// Details of every distinct realm in `links`, keyed by slug. Realms whose
/// details cannot be fetched are left out.
pub async fn fetch_realms<'l>(
    client: &BnetClient,
    links: impl IntoIterator<Item = &'l RealmLink>,
) -> Result<HashMap<String, Realm>, Error> {
    let mut seen = HashSet::new();
    let requests: Vec<(String, String)> = links
        .into_iter()
        .filter(|link| seen.insert(link.slug.as_str()))
        .map(|link| (link.url.clone(), link.slug.clone()))
        .collect();

    let mut realms = HashMap::with_capacity(requests.len());
    let responses = client.get_many(requests, Namespace::Dynamic, true);
    pin_mut!(responses);
    while let Some(fetched) = responses.next().await {
        let fetched = fetched?;
        let Some(body) = fetched.body else {
            warn!("Unable to get realm {} (status={})", fetched.context, fetched.status);
            continue;
        };
        let raw: RealmPayload = Error::decode(&fetched.context, body)?;
        realms.insert(
            fetched.context,
            Realm {
                id: raw.id,
                name: raw.name,
                slug: raw.slug,
            },
        );
    }
    Ok(realms)
}

/// Slug to display name.
pub fn display_names(realms: HashMap<String, Realm>) -> HashMap<String, String> {
    realms
        .into_iter()
        .map(|(slug, realm)| (slug, realm.name))
        .collect()
}
