//! Configuration loading and region host resolution
//!
//! Two sources feed the collector's configuration:
//! 1. **TOML file**: regions, client tuning, match-history window, logging
//! 2. **Environment / command line**: API key, config path, database path
//!
//! A missing TOML file is not an error: built-in defaults apply. The region
//! table is built once from the defaults plus TOML overrides and then passed by
//! value to every component that needs it.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable holding the provider API key
pub const API_KEY_ENV: &str = "RIOT_API_KEY";

/// Environment variable pointing at an explicit config file
pub const CONFIG_PATH_ENV: &str = "TFTSTAT_CONFIG";

/// Match-history window start used when none is configured (start of set 12)
pub const DEFAULT_MATCH_START_TIME: i64 = 1_722_474_000;

/// Configuration loaded from the TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Provider API key (lowest priority source)
    #[serde(default)]
    pub api_key: Option<String>,

    /// SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Platform regions collected on each run
    #[serde(default = "default_regions")]
    pub regions: Vec<String>,

    /// Per-platform host overrides, keyed by platform id
    #[serde(default)]
    pub region_hosts: BTreeMap<String, RegionHostsOverride>,

    /// HTTP client tuning
    #[serde(default)]
    pub client: ClientConfig,

    /// Match-history query window
    #[serde(default)]
    pub match_history: MatchHistoryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            database_path: None,
            regions: default_regions(),
            region_hosts: BTreeMap::new(),
            client: ClientConfig::default(),
            match_history: MatchHistoryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// HTTP client tuning shared by every region client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Token bucket refill rate (requests per second, burst of one)
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Disable to dispatch without waiting on the token bucket
    #[serde(default = "default_true")]
    pub rate_limit: bool,

    /// Maximum concurrent requests per region
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Retries after a transport failure (total attempts = retry_count + 1)
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Fixed wait between transport retries
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Log every dispatch at info level instead of debug
    #[serde(default)]
    pub show_logs: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            rate_limit: true,
            max_in_flight: default_max_in_flight(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            timeout_secs: default_timeout_secs(),
            show_logs: false,
        }
    }
}

/// Match-history query window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchHistoryConfig {
    /// Epoch seconds; matches older than this are not listed
    #[serde(default = "default_match_start_time")]
    pub start_time: i64,

    /// Maximum ids requested per player
    #[serde(default = "default_match_count")]
    pub count: u32,
}

impl Default for MatchHistoryConfig {
    fn default() -> Self {
        Self {
            start_time: DEFAULT_MATCH_START_TIME,
            count: default_match_count(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Host override for one platform region
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionHostsOverride {
    /// Base URL of the platform host (league, summoner, status endpoints)
    pub platform: Option<String>,
    /// Base URL of the cluster host (match endpoints)
    pub cluster: Option<String>,
}

fn default_regions() -> Vec<String> {
    vec!["na1".to_string(), "jp1".to_string(), "kr".to_string()]
}

fn default_requests_per_second() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

fn default_max_in_flight() -> usize {
    8
}

fn default_retry_count() -> u32 {
    5
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_match_start_time() -> i64 {
    DEFAULT_MATCH_START_TIME
}

fn default_match_count() -> u32 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

// ============================================================================
// Region table
// ============================================================================

/// Resolved hosts for one platform region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionHosts {
    /// Platform id, e.g. `na1`
    pub platform_id: String,
    /// Routing cluster id, e.g. `americas`
    pub cluster_id: String,
    /// Base URL of the platform host
    pub platform_base: String,
    /// Base URL of the cluster host
    pub cluster_base: String,
}

impl RegionHosts {
    /// Hosts on the provider's public API domain
    pub fn riot(platform_id: &str, cluster_id: &str) -> Self {
        Self {
            platform_id: platform_id.to_string(),
            cluster_id: cluster_id.to_string(),
            platform_base: format!("https://{}.api.riotgames.com", platform_id),
            cluster_base: format!("https://{}.api.riotgames.com", cluster_id),
        }
    }
}

/// Platform → cluster routing as published by the provider
const PLATFORM_ROUTING: &[(&str, &str)] = &[
    ("na1", "americas"),
    ("br1", "americas"),
    ("la1", "americas"),
    ("la2", "americas"),
    ("oc1", "americas"),
    ("kr", "asia"),
    ("jp1", "asia"),
    ("euw1", "europe"),
    ("eun1", "europe"),
    ("tr1", "europe"),
    ("ru", "europe"),
    ("ph2", "sea"),
    ("sg2", "sea"),
    ("th2", "sea"),
    ("tw2", "sea"),
    ("vn2", "sea"),
];

/// Immutable platform → hosts lookup table
#[derive(Debug, Clone)]
pub struct RegionTable {
    entries: BTreeMap<String, RegionHosts>,
}

impl RegionTable {
    /// Table of every known platform on the provider's public domain
    pub fn riot_defaults() -> Self {
        let entries = PLATFORM_ROUTING
            .iter()
            .map(|(platform, cluster)| (platform.to_string(), RegionHosts::riot(platform, cluster)))
            .collect();
        Self { entries }
    }

    /// Build a table from explicit entries
    pub fn from_hosts(hosts: impl IntoIterator<Item = RegionHosts>) -> Self {
        let entries = hosts
            .into_iter()
            .map(|h| (h.platform_id.clone(), h))
            .collect();
        Self { entries }
    }

    /// Defaults with TOML host overrides applied
    ///
    /// An override for an unknown platform must name both hosts; its cluster id
    /// is taken from the platform id.
    pub fn from_config(config: &TomlConfig) -> Result<Self> {
        let mut table = Self::riot_defaults();

        for (platform, overrides) in &config.region_hosts {
            match table.entries.get_mut(platform) {
                Some(hosts) => {
                    if let Some(base) = &overrides.platform {
                        hosts.platform_base = base.trim_end_matches('/').to_string();
                    }
                    if let Some(base) = &overrides.cluster {
                        hosts.cluster_base = base.trim_end_matches('/').to_string();
                    }
                }
                None => {
                    let (Some(platform_base), Some(cluster_base)) =
                        (&overrides.platform, &overrides.cluster)
                    else {
                        return Err(Error::Config(format!(
                            "Region '{}' is not a known platform; both platform and cluster hosts are required",
                            platform
                        )));
                    };
                    table.entries.insert(
                        platform.clone(),
                        RegionHosts {
                            platform_id: platform.clone(),
                            cluster_id: platform.clone(),
                            platform_base: platform_base.trim_end_matches('/').to_string(),
                            cluster_base: cluster_base.trim_end_matches('/').to_string(),
                        },
                    );
                }
            }
        }

        Ok(table)
    }

    /// Look up hosts for a platform id
    pub fn lookup(&self, platform_id: &str) -> Result<&RegionHosts> {
        self.entries
            .get(platform_id)
            .ok_or_else(|| Error::Config(format!("Unknown region '{}'", platform_id)))
    }
}

// ============================================================================
// File and key resolution
// ============================================================================

/// Resolve the config file path
///
/// **Priority:** explicit path → `TFTSTAT_CONFIG` → `<config dir>/tftstat/config.toml`.
/// Returns `None` when no candidate exists on disk.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("tftstat").join("config.toml"))
        .filter(|p| p.exists())
}

/// Load TOML configuration from a file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Where the loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// A path was resolved but nothing exists there
    Missing(PathBuf),
    Defaults,
}

impl ConfigSource {
    /// Report the source; call once logging is initialized
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => {
                info!("Loaded configuration from {}", path.display())
            }
            ConfigSource::Missing(path) => {
                warn!("Config file {} not found, using defaults", path.display())
            }
            ConfigSource::Defaults => info!("No config file found, using defaults"),
        }
    }
}

/// Load configuration, falling back to defaults when no file is found
///
/// A file that exists but cannot be parsed is an error; a missing one is not.
/// Nothing is logged here since this runs before the subscriber is installed.
pub fn load_or_default(explicit: Option<&Path>) -> Result<(TomlConfig, ConfigSource)> {
    match resolve_config_path(explicit) {
        Some(path) if path.exists() => {
            let config = load_toml_config(&path)?;
            Ok((config, ConfigSource::File(path)))
        }
        Some(path) => Ok((TomlConfig::default(), ConfigSource::Missing(path))),
        None => Ok((TomlConfig::default(), ConfigSource::Defaults)),
    }
}

/// Write TOML configuration to a file
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Resolve the provider API key
///
/// **Priority:** command line → `RIOT_API_KEY` → TOML
pub fn resolve_api_key(cli_arg: Option<&str>, toml_config: &TomlConfig) -> Result<String> {
    if let Some(key) = cli_arg.filter(|k| is_valid_key(k)) {
        return Ok(key.trim().to_string());
    }

    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if is_valid_key(&key) {
            info!("API key loaded from environment variable");
            return Ok(key.trim().to_string());
        }
    }

    if let Some(key) = toml_config.api_key.as_deref().filter(|k| is_valid_key(k)) {
        info!("API key loaded from TOML config");
        return Ok(key.trim().to_string());
    }

    Err(Error::Config(format!(
        "API key not configured. Set {} or api_key in the TOML config",
        API_KEY_ENV
    )))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Default SQLite database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tftstat").join("tftstat.db"))
        .unwrap_or_else(|| PathBuf::from("./tftstat.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_routes_original_regions() {
        let table = RegionTable::riot_defaults();

        let na = table.lookup("na1").unwrap();
        assert_eq!(na.cluster_id, "americas");
        assert_eq!(na.platform_base, "https://na1.api.riotgames.com");
        assert_eq!(na.cluster_base, "https://americas.api.riotgames.com");

        assert_eq!(table.lookup("kr").unwrap().cluster_id, "asia");
        assert_eq!(table.lookup("jp1").unwrap().cluster_id, "asia");
    }

    #[test]
    fn test_unknown_region_is_config_error() {
        let table = RegionTable::riot_defaults();
        assert!(matches!(table.lookup("moon1"), Err(Error::Config(_))));
    }

    #[test]
    fn test_overrides_replace_hosts() {
        let mut config = TomlConfig::default();
        config.region_hosts.insert(
            "na1".to_string(),
            RegionHostsOverride {
                platform: Some("http://127.0.0.1:9000/".to_string()),
                cluster: None,
            },
        );

        let table = RegionTable::from_config(&config).unwrap();
        let na = table.lookup("na1").unwrap();
        assert_eq!(na.platform_base, "http://127.0.0.1:9000");
        assert_eq!(na.cluster_base, "https://americas.api.riotgames.com");
    }

    #[test]
    fn test_new_region_requires_both_hosts() {
        let mut config = TomlConfig::default();
        config.region_hosts.insert(
            "local".to_string(),
            RegionHostsOverride {
                platform: Some("http://127.0.0.1:9000".to_string()),
                cluster: None,
            },
        );
        assert!(RegionTable::from_config(&config).is_err());
    }

    #[test]
    fn test_parse_minimal_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str("regions = [\"euw1\"]").unwrap();
        assert_eq!(config.regions, vec!["euw1"]);
        assert_eq!(config.client.retry_count, 5);
        assert_eq!(config.client.requests_per_second, 2);
        assert!(config.client.rate_limit);
        assert_eq!(config.match_history.count, 1000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("RGAPI-abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }
}
