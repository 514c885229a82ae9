//! PvP seasons and leaderboards.

use std::fmt;
use std::str::FromStr;

use bnet_client::{BnetClient, Namespace};
use common::{Error, LeaderboardEntry, PlayerLink, RealmLink};
use tracing::{debug, info};

use crate::raw::{LeaderboardPayload, SeasonIndexPayload};

pub const SEASON_INDEX_RESOURCE: &str = "/data/wow/pvp-season/index";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bracket {
    TwoVsTwo,
    ThreeVsThree,
    Shuffle,
    Rbg,
}

impl Bracket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bracket::TwoVsTwo => "2v2",
            Bracket::ThreeVsThree => "3v3",
            Bracket::Shuffle => "shuffle",
            Bracket::Rbg => "rbg",
        }
    }
}

impl fmt::Display for Bracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bracket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2v2" => Ok(Bracket::TwoVsTwo),
            "3v3" => Ok(Bracket::ThreeVsThree),
            "shuffle" => Ok(Bracket::Shuffle),
            "rbg" => Ok(Bracket::Rbg),
            other => Err(format!("unknown bracket '{other}' (expected 2v2, 3v3, shuffle or rbg)")),
        }
    }
}

/// Solo shuffle bracket of one class/spec, e.g. `shuffle-deathknight-frost`.
pub fn shuffle_bracket(class_name: &str, spec_name: &str) -> String {
    let slug = |s: &str| s.to_lowercase().replace(' ', "");
    format!("shuffle-{}-{}", slug(class_name), slug(spec_name))
}

/// The configured season, or the current one according to the API.
pub async fn resolve_season(client: &BnetClient, configured: Option<u32>) -> Result<u32, Error> {
    if let Some(season) = configured {
        return Ok(season);
    }
    let body = client
        .get(SEASON_INDEX_RESOURCE, Namespace::Dynamic, &[], false)
        .await?;
    let index: SeasonIndexPayload = Error::decode(SEASON_INDEX_RESOURCE, body)?;
    info!("Current pvp season: {}", index.current_season.id);
    Ok(index.current_season.id)
}

pub fn leaderboard_resource(season: u32, bracket: &str) -> String {
    format!("/data/wow/pvp-season/{season}/pvp-leaderboard/{bracket}")
}

/// Leaderboard entries in rank order. Never cached.
pub async fn fetch_leaderboard(
    client: &BnetClient,
    season: u32,
    bracket: &str,
) -> Result<Vec<LeaderboardEntry>, Error> {
    let resource = leaderboard_resource(season, bracket);
    let body = client.get(&resource, Namespace::Dynamic, &[], false).await?;
    let payload: LeaderboardPayload = Error::decode(&resource, body)?;
    debug!("{} lists {} entries", bracket, payload.entries.len());

    Ok(payload
        .entries
        .into_iter()
        .map(|raw| LeaderboardEntry {
            player: PlayerLink::new(
                RealmLink {
                    slug: raw.character.realm.slug,
                    url: raw.character.realm.key.href,
                },
                raw.character.name,
            ),
            faction: raw.faction.kind,
            rating: raw.rating,
        })
        .collect())
}

/// Leading entries rated at least `min_rating`, at most `max_entries` of
/// them. Stops at the first entry below the cutoff.
pub fn take_qualifying(
    entries: Vec<LeaderboardEntry>,
    min_rating: u32,
    max_entries: usize,
) -> Vec<LeaderboardEntry> {
    entries
        .into_iter()
        .take_while(|e| e.rating >= min_rating)
        .take(max_entries)
        .collect()
}
