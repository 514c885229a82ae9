//! Ladder scans: leaderboard, loadouts, validation, grouping.

use bnet_client::BnetClient;
use common::{Error, Faction, GameData, LeaderboardEntry, RatedLoadout, Region, TalentTree};
use futures_util::{pin_mut, StreamExt};
use tracing::{info, warn};

use crate::encode::{encode_ladder, LadderJson};
use crate::leaderboard::{fetch_leaderboard, shuffle_bracket, take_qualifying, Bracket};
use crate::realms::{display_names, fetch_realms};
use crate::resolver::{LoadoutOutcome, LoadoutResolver};
use crate::validate::validate_loadout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Entries below this rating end the scan of a leaderboard.
    pub min_rating: u32,
    /// Entries taken from the top of a leaderboard.
    pub max_entries: usize,
    /// Restrict shuffle scans to one class (case-insensitive).
    pub shuffle_class: Option<String>,
    /// Restrict shuffle scans to one spec (case-insensitive).
    pub shuffle_spec: Option<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            min_rating: 1600,
            max_entries: 7500,
            shuffle_class: None,
            shuffle_spec: None,
        }
    }
}

impl ScanOptions {
    /// True when the shuffle filters admit this class/spec. Filters compare
    /// case-insensitively; an empty filter admits everything.
    pub fn wants(&self, class_name: &str, spec_name: &str) -> bool {
        let matches = |filter: &Option<String>, value: &str| {
            filter
                .as_deref()
                .map_or(true, |f| f.is_empty() || f.eq_ignore_ascii_case(value))
        };
        matches(&self.shuffle_class, class_name) && matches(&self.shuffle_spec, spec_name)
    }
}

/// Validated loadouts of one class/spec, best rating first.
#[derive(Debug, Clone)]
pub struct SpecLadder<'t> {
    pub tree: &'t TalentTree,
    pub loadouts: Vec<RatedLoadout>,
}

impl SpecLadder<'_> {
    /// Output file name, e.g. `demon-hunter-havoc.us.json`.
    pub fn file_name(&self, region: Region) -> String {
        format!("{}-{}.{}.json", self.tree.class_name, self.tree.spec_name, region)
            .to_lowercase()
            .replace(' ', "-")
    }
}

pub struct LadderScanner<'a> {
    client: &'a BnetClient,
    resolver: LoadoutResolver<'a>,
    season: u32,
    options: ScanOptions,
}

impl<'a> LadderScanner<'a> {
    pub fn new(client: &'a BnetClient, game_data: &'a GameData, season: u32, options: ScanOptions) -> Self {
        Self {
            client,
            resolver: LoadoutResolver::new(client, game_data),
            season,
            options,
        }
    }

    /// Scan one bracket. Returns a ladder for every class/spec with at least
    /// one surviving entrant, in `trees` order.
    pub async fn scan<'t>(&self, bracket: Bracket, trees: &'t [TalentTree]) -> Result<Vec<SpecLadder<'t>>, Error> {
        let ladders = match bracket {
            Bracket::Shuffle => self.scan_shuffle(trees).await?,
            other => self.scan_arena(other, trees).await?,
        };
        Ok(ladders
            .into_iter()
            .filter(|l| !l.loadouts.is_empty())
            .map(|mut l| {
                l.loadouts.sort_by(|a, b| b.rating.cmp(&a.rating));
                l
            })
            .collect())
    }

    /// One shared leaderboard; entrants are grouped by their active spec.
    async fn scan_arena<'t>(&self, bracket: Bracket, trees: &'t [TalentTree]) -> Result<Vec<SpecLadder<'t>>, Error> {
        info!("Collecting player talents for {}...", bracket);
        let entries = fetch_leaderboard(self.client, self.season, bracket.as_str()).await?;
        let entries = take_qualifying(entries, self.options.min_rating, self.options.max_entries);

        let mut ladders: Vec<SpecLadder<'t>> = trees
            .iter()
            .map(|tree| SpecLadder {
                tree,
                loadouts: Vec::new(),
            })
            .collect();

        for rated in self.resolve_entries(entries, None).await? {
            let loadout = &rated.loadout;
            let Some(ladder) = ladders.iter_mut().find(|l| {
                l.tree.class_name == loadout.class_name && l.tree.spec_name == loadout.spec_name
            }) else {
                warn!(
                    "No talent tree for {} - {} ({})",
                    loadout.class_name,
                    loadout.spec_name,
                    rated.player.full_name()
                );
                continue;
            };
            if let Err(e) = validate_loadout(loadout, ladder.tree) {
                warn!("{} failed talent validation: {}", rated.player.full_name(), e);
                continue;
            }
            ladder.loadouts.push(rated);
        }
        Ok(ladders)
    }

    /// One leaderboard per class/spec; loadouts are read for that spec.
    async fn scan_shuffle<'t>(&self, trees: &'t [TalentTree]) -> Result<Vec<SpecLadder<'t>>, Error> {
        let mut ladders = Vec::new();
        for tree in trees.iter().filter(|t| self.options.wants(&t.class_name, &t.spec_name)) {
            info!(
                "Collecting player talents for Solo Shuffle {} - {}...",
                tree.class_name, tree.spec_name
            );
            let bracket = shuffle_bracket(&tree.class_name, &tree.spec_name);
            let entries = match fetch_leaderboard(self.client, self.season, &bracket).await {
                Ok(entries) => entries,
                Err(e) if e.is_not_found() => {
                    warn!("No leaderboard for {}", bracket);
                    continue;
                }
                Err(e) => return Err(e),
            };
            let entries = take_qualifying(entries, self.options.min_rating, self.options.max_entries);

            let mut loadouts = Vec::new();
            for rated in self.resolve_entries(entries, Some(tree.spec_name.as_str())).await? {
                match validate_loadout(&rated.loadout, tree) {
                    Ok(()) => loadouts.push(rated),
                    Err(e) => warn!("{} failed talent validation: {}", rated.player.full_name(), e),
                }
            }
            ladders.push(SpecLadder { tree, loadouts });
        }
        Ok(ladders)
    }

    /// Resolve every entrant, keeping only the ones with a loadout.
    async fn resolve_entries(
        &self,
        entries: Vec<LeaderboardEntry>,
        override_spec: Option<&str>,
    ) -> Result<Vec<RatedLoadout>, Error> {
        let players: Vec<_> = entries
            .into_iter()
            .map(|e| (e.player, (e.faction, e.rating)))
            .collect();
        let total = players.len();

        let results = self
            .resolver
            .resolve_many(players, override_spec.map(str::to_string));
        pin_mut!(results);

        let mut loaded = Vec::with_capacity(total);
        while let Some(resolved) = results.next().await {
            let resolved = resolved?;
            let (faction, rating): (Faction, u32) = resolved.context;
            let name = resolved.player.full_name();
            match resolved.outcome {
                LoadoutOutcome::Loaded(loadout) => {
                    info!(
                        "Requested talents for {}... {} - {} - {}",
                        name, loadout.class_name, loadout.spec_name, rating
                    );
                    loaded.push(RatedLoadout {
                        player: resolved.player,
                        loadout,
                        faction,
                        rating,
                    });
                }
                LoadoutOutcome::MissingPlayer => {
                    info!("Requested talents for {}... Failed (missing player)", name);
                }
                LoadoutOutcome::Error(reason) => {
                    warn!("Requested talents for {}... Failed: {}", name, reason);
                }
            }
        }
        info!("Resolved {} of {} loadouts", loaded.len(), total);
        Ok(loaded)
    }

    /// Encode a ladder, labelling realms with their display names.
    pub async fn export(&self, ladder: &SpecLadder<'_>) -> Result<LadderJson, Error> {
        let realms = fetch_realms(self.client, ladder.loadouts.iter().map(|l| &l.player.realm)).await?;
        encode_ladder(ladder.tree, &ladder.loadouts, display_names(realms))
    }
}
