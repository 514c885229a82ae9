//! Scanner configuration types.

use serde::{Deserialize, Serialize};

use crate::types::Region;

/// Top-level scanner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Battle.net client id.
    #[serde(default)]
    pub client_id: String,

    /// Battle.net client secret.
    #[serde(default)]
    pub client_secret: String,

    /// API region all requests are issued against.
    #[serde(default)]
    pub region: Region,

    /// Directory holding cached API responses.
    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    /// Directory the JSON artifacts are written under.
    #[serde(default = "default_output_path")]
    pub output_path: String,

    /// Skip cache reads (responses are still written back).
    #[serde(default)]
    pub refresh: bool,

    /// Pin the PvP season instead of asking the API for the current one.
    #[serde(default)]
    pub pvp_season: Option<u32>,

    /// Optional JSON file replacing the built-in tree override table.
    #[serde(default)]
    pub tree_overrides_path: Option<String>,

    /// Concurrency, pacing and retry settings for the API client.
    #[serde(default)]
    pub limits: FetchLimits,
}

/// Pacing and retry knobs for batched fetches.
///
/// The defaults were picked empirically against the upstream rate limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchLimits {
    /// Requests admitted per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Simultaneous connections to the API host.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Minimum time between a batch's first completion and the next batch.
    #[serde(default = "default_batch_spacing_ms")]
    pub batch_spacing_ms: u64,

    /// Sleep before retrying a 429/500 response.
    #[serde(default = "default_throttle_backoff_ms")]
    pub throttle_backoff_ms: u64,

    /// Sleep before retrying a transport failure.
    #[serde(default = "default_transport_backoff_ms")]
    pub transport_backoff_ms: u64,

    /// Transport failures tolerated per request before giving up.
    #[serde(default = "default_max_transport_retries")]
    pub max_transport_retries: u32,

    /// Global request quota; 0 disables it.
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_cache_path() -> String {
    ".cache".into()
}
fn default_output_path() -> String {
    "ui/wow/".into()
}
fn default_batch_size() -> usize {
    100
}
fn default_max_connections() -> usize {
    100
}
fn default_batch_spacing_ms() -> u64 {
    1200
}
fn default_throttle_backoff_ms() -> u64 {
    2000
}
fn default_transport_backoff_ms() -> u64 {
    5000
}
fn default_max_transport_retries() -> u32 {
    5
}
fn default_requests_per_second() -> u32 {
    100
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            region: Region::default(),
            cache_path: default_cache_path(),
            output_path: default_output_path(),
            refresh: false,
            pvp_season: None,
            tree_overrides_path: None,
            limits: FetchLimits::default(),
        }
    }
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_connections: default_max_connections(),
            batch_spacing_ms: default_batch_spacing_ms(),
            throttle_backoff_ms: default_throttle_backoff_ms(),
            transport_backoff_ms: default_transport_backoff_ms(),
            max_transport_retries: default_max_transport_retries(),
            requests_per_second: default_requests_per_second(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
