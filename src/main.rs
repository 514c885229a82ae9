//! talent-scanner: WoW talent tree and PvP ladder scanner.
//!
//! Two commands:
//! 1. `talents` assembles every class/spec talent tree with spell icons
//! 2. `ladder` scans a PvP leaderboard and encodes each entrant's loadout

mod config;
mod output;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use bnet_client::BnetClient;
use common::{GameData, Region, ScannerConfig};
use ladder::leaderboard::resolve_season;
use ladder::{Bracket, LadderScanner, ScanOptions};
use talents::{StrategyTable, TalentTreeJson, TreeAssembler};

use crate::config::CliOverrides;

/// WoW talent tree and PvP ladder scanner
#[derive(Parser)]
#[command(name = "talent-scanner", about = "WoW talent tree and PvP ladder scanner")]
struct Cli {
    /// Directory the JSON artifacts are written under [default: ui/wow/].
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// Battle.net client id.
    #[arg(long, env = "WOW_CLIENT_ID", global = true, hide_env_values = true)]
    client_id: Option<String>,

    /// Battle.net client secret.
    #[arg(long, env = "WOW_CLIENT_SECRET", global = true, hide_env_values = true)]
    client_secret: Option<String>,

    /// Directory holding cached API responses [default: .cache].
    #[arg(long, global = true)]
    cache_path: Option<String>,

    /// API region: us, eu, kr or tw [default: us].
    #[arg(short, long, global = true)]
    region: Option<Region>,

    /// TOML file with fetch limits, season and tree override settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ignore cached responses (fresh responses are still cached).
    #[arg(long, global = true)]
    refresh: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a PvP leaderboard and write one ladder file per class/spec.
    Ladder {
        /// 2v2, 3v3, shuffle or rbg.
        bracket: Bracket,

        /// Stop at the first entry rated below this.
        #[arg(short = 'm', long, default_value_t = 1600)]
        min_rating: u32,

        /// Entries taken from the top of each leaderboard.
        #[arg(short = 'l', long, default_value_t = 7500)]
        max_entries: usize,

        /// Only scan this class's shuffle leaderboards.
        #[arg(long)]
        shuffle_class: Option<String>,

        /// Only scan this spec's shuffle leaderboards.
        #[arg(long)]
        shuffle_spec: Option<String>,
    },
    /// Assemble every talent tree and write one file per class/spec.
    Talents,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            config_path: self.config.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            region: self.region,
            cache_path: self.cache_path.clone(),
            output_path: self.output.clone(),
            refresh: self.refresh,
        }
    }
}

#[tokio::main]
async fn main() {
    let dotenv = config::load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_target(true)
        .init();
    match dotenv {
        Ok(path) => debug!("Loaded {}", path.display()),
        Err(e) => debug!("No .env file loaded: {}", e),
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` if set (including from `.env`), else info for the scanner crates.
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "talent_scanner=info,bnet_client=info,talents=info,ladder=info".into())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = config::load_config(&cli.overrides()).context("Configuration error")?;
    info!(
        "Region: {}, cache: {}, output: {}{}",
        cfg.region,
        cfg.cache_path,
        cfg.output_path,
        if cfg.refresh { " (refreshing cache)" } else { "" }
    );

    let game_data = GameData::builtin().context("Failed to load game tables")?;
    let strategies = StrategyTable::load(cfg.tree_overrides_path.as_deref().map(Path::new))
        .context("Failed to load tree overrides")?;
    let client = BnetClient::connect(&cfg)
        .await
        .context("Failed to connect to Battle.net")?;

    match cli.command {
        Command::Talents => write_talents(&cfg, &client, &game_data, &strategies).await,
        Command::Ladder {
            bracket,
            min_rating,
            max_entries,
            shuffle_class,
            shuffle_spec,
        } => {
            let options = ScanOptions {
                min_rating,
                max_entries,
                shuffle_class,
                shuffle_spec,
            };
            write_ladders(&cfg, &client, &game_data, &strategies, bracket, options).await
        }
    }
}

async fn write_talents(
    cfg: &ScannerConfig,
    client: &BnetClient,
    game_data: &GameData,
    strategies: &StrategyTable,
) -> anyhow::Result<()> {
    let trees = TreeAssembler::new(client, game_data, strategies)
        .build_all()
        .await
        .context("Failed to build talent trees")?;
    let icons = talents::media::tree_icons(client, &trees)
        .await
        .context("Failed to fetch spell icons")?;

    let output = Path::new(&cfg.output_path);
    for tree in &trees {
        let json = TalentTreeJson::from_tree(tree, &icons)?;
        let path = output::talents_path(output, &json.file_name());
        output::write_json(&path, &json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {}", path.display());
    }
    info!("Wrote {} talent trees", trees.len());
    Ok(())
}

async fn write_ladders(
    cfg: &ScannerConfig,
    client: &BnetClient,
    game_data: &GameData,
    strategies: &StrategyTable,
    bracket: Bracket,
    options: ScanOptions,
) -> anyhow::Result<()> {
    let mut assembler = TreeAssembler::new(client, game_data, strategies);
    if bracket == Bracket::Shuffle {
        assembler = assembler.with_targets(shuffle_targets(game_data, &options));
    }
    let trees = assembler
        .build_all()
        .await
        .context("Failed to build talent trees")?;

    let season = resolve_season(client, cfg.pvp_season)
        .await
        .context("Failed to resolve the PvP season")?;
    let scanner = LadderScanner::new(client, game_data, season, options);
    let ladders = scanner
        .scan(bracket, &trees)
        .await
        .with_context(|| format!("Failed to scan the {bracket} ladder"))?;

    let output = Path::new(&cfg.output_path);
    for ladder in &ladders {
        let json = scanner.export(ladder).await?;
        let path = output::ladder_path(output, bracket, &ladder.file_name(client.region()));
        output::write_json(&path, &json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {} entries to {}", json.entries.len(), path.display());
    }
    Ok(())
}

/// Class/spec pairs matching the shuffle filters, so only those trees are built.
fn shuffle_targets(game_data: &GameData, options: &ScanOptions) -> Vec<(String, String)> {
    game_data
        .class_specs()
        .into_iter()
        .filter(|(class, spec)| options.wants(class, spec))
        .collect()
}
