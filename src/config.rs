//! Configuration loader: merges .env, config.toml, env vars and CLI flags.

use std::path::{Path, PathBuf};

use common::{Error, Region, ScannerConfig};

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Values given on the command line. `None` keeps the lower layers.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub region: Option<Region>,
    pub cache_path: Option<String>,
    pub output_path: Option<String>,
    pub refresh: bool,
}

fn parse_positive_u32(raw: &str, env_name: &str) -> Result<u32, Error> {
    match raw.trim().parse::<u32>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(Error::Config(format!("{env_name} must be an integer > 0"))),
    }
}

fn parse_bool(raw: &str) -> bool {
    let lowered = raw.trim().to_ascii_lowercase();
    lowered != "0" && lowered != "false" && lowered != "no" && lowered != "off"
}

/// Load `.env` from the working directory or its parents. Runs before
/// logging is set up and before the CLI is parsed, so `RUST_LOG` and clap's
/// env fallbacks see its values. The caller logs the outcome.
pub fn load_dotenv() -> Result<PathBuf, dotenvy::Error> {
    dotenvy::dotenv()
}

fn validate_config(config: &ScannerConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if config.client_id.trim().is_empty() {
        issues.push("client id is required (--client-id or WOW_CLIENT_ID)".into());
    }
    if config.client_secret.trim().is_empty() {
        issues.push("client secret is required (--client-secret or WOW_CLIENT_SECRET)".into());
    }
    if config.cache_path.trim().is_empty() {
        issues.push("cache_path must not be empty".into());
    }
    if config.output_path.trim().is_empty() {
        issues.push("output_path must not be empty".into());
    }
    if config.pvp_season == Some(0) {
        issues.push("pvp_season must be > 0".into());
    }

    let limits = &config.limits;
    if limits.batch_size == 0 {
        issues.push("limits.batch_size must be > 0".into());
    }
    if limits.max_connections == 0 {
        issues.push("limits.max_connections must be > 0".into());
    }
    if limits.request_timeout_secs == 0 {
        issues.push("limits.request_timeout_secs must be > 0".into());
    }
    if limits.max_connections > limits.batch_size {
        issues.push("limits.max_connections must be <= limits.batch_size".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Defaults, replaced wholesale by the TOML file when one exists. An
/// explicitly named file must exist.
fn read_config_file(explicit: Option<&Path>) -> Result<ScannerConfig, Error> {
    let path = match explicit {
        Some(path) => path,
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                return Ok(ScannerConfig::default());
            }
            default
        }
    };
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

fn apply_env(config: &mut ScannerConfig) -> Result<(), Error> {
    if let Ok(id) = std::env::var("WOW_CLIENT_ID") {
        config.client_id = id;
    }
    if let Ok(secret) = std::env::var("WOW_CLIENT_SECRET") {
        config.client_secret = secret;
    }
    if let Ok(raw) = std::env::var("WOW_REGION") {
        config.region = raw.parse().map_err(Error::Config)?;
    }
    if let Ok(raw) = std::env::var("WOW_PVP_SEASON") {
        config.pvp_season = Some(parse_positive_u32(&raw, "WOW_PVP_SEASON")?);
    }
    if let Ok(raw) = std::env::var("WOW_REQUESTS_PER_SECOND") {
        config.limits.requests_per_second = parse_positive_u32(&raw, "WOW_REQUESTS_PER_SECOND")?;
    }
    if let Ok(raw) = std::env::var("WOW_REFRESH") {
        config.refresh = parse_bool(&raw);
    }
    Ok(())
}

fn apply_cli(config: &mut ScannerConfig, cli: &CliOverrides) {
    if let Some(id) = &cli.client_id {
        config.client_id = id.clone();
    }
    if let Some(secret) = &cli.client_secret {
        config.client_secret = secret.clone();
    }
    if let Some(region) = cli.region {
        config.region = region;
    }
    if let Some(path) = &cli.cache_path {
        config.cache_path = path.clone();
    }
    if let Some(path) = &cli.output_path {
        config.output_path = path.clone();
    }
    if cli.refresh {
        config.refresh = true;
    }
}

/// Load scanner configuration: defaults, then the TOML file, then
/// environment variables, then command-line flags.
pub fn load_config(cli: &CliOverrides) -> Result<ScannerConfig, Error> {
    let mut config = read_config_file(cli.config_path.as_deref())?;
    apply_env(&mut config)?;
    apply_cli(&mut config, cli);
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> CliOverrides {
        CliOverrides {
            client_id: Some("id".into()),
            client_secret: Some("secret".into()),
            ..CliOverrides::default()
        }
    }

    #[test]
    fn test_toml_then_cli_layering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scanner.toml");
        std::fs::write(
            &path,
            r#"
region = "eu"
cache_path = "/tmp/bnet-cache"
pvp_season = 35

[limits]
batch_size = 50
max_connections = 25
"#,
        )
        .unwrap();

        let mut config = read_config_file(Some(&path)).unwrap();
        assert_eq!(config.region, Region::Eu);
        assert_eq!(config.pvp_season, Some(35));
        assert_eq!(config.limits.batch_size, 50);
        assert_eq!(config.limits.batch_spacing_ms, 1200);
        assert_eq!(config.output_path, "ui/wow/");

        let cli = CliOverrides {
            region: Some(Region::Kr),
            refresh: true,
            ..credentials()
        };
        apply_cli(&mut config, &cli);
        assert_eq!(config.region, Region::Kr);
        assert_eq!(config.cache_path, "/tmp/bnet-cache");
        assert!(config.refresh);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_config_file(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validation_collects_every_issue() {
        let mut config = ScannerConfig::default();
        config.limits.batch_size = 0;

        let Err(Error::Config(message)) = validate_config(&config) else {
            panic!("expected a config error");
        };
        assert!(message.starts_with("Invalid config:"));
        assert!(message.contains("client id is required"));
        assert!(message.contains("client secret is required"));
        assert!(message.contains("limits.batch_size must be > 0"));
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_positive_u32(" 7 ", "X").unwrap(), 7);
        assert!(parse_positive_u32("0", "X").is_err());
        assert!(!parse_bool("off"));
        assert!(parse_bool("yes"));
    }
}
