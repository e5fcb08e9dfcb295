use std::path::PathBuf;

use tracing::trace;

/// Storage backend configuration
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (no persistence)
    #[serde(rename = "none")]
    None,

    /// SQLite database (default for most deployments)
    Sqlite {
        /// Path to the SQLite database file
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./monitoring.db")
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub targets: Option<Vec<TargetConfig>>,

    /// Probe interval applied to targets that do not set their own (seconds)
    pub default_interval: Option<u64>,

    /// Storage configuration (optional - defaults to SQLite)
    pub storage: Option<StorageConfig>,

    /// Optional webhook receiving serialized notifications
    pub webhook: Option<WebhookConfig>,
}

/// One monitored endpoint, as written in the config file.
///
/// Unset intervals fall back to `default_interval` and then to the
/// built-in defaults; `resolve_targets` applies all of them.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct TargetConfig {
    pub url: String,
    pub display: Option<String>,

    /// Seconds between probes
    pub interval: Option<u64>,

    /// Seconds between alert checks
    pub check_interval: Option<u64>,

    /// Probe timeout in seconds
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct WebhookConfig {
    pub url: String,
}

/// Target configuration with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTargetConfig {
    pub url: String,
    pub display_name: String,
    pub probe_interval: u64,
    pub check_interval: u64,
    pub timeout: u64,
}

const DEFAULT_PROBE_INTERVAL: u64 = 2;
const DEFAULT_CHECK_INTERVAL: u64 = 10;
const DEFAULT_TIMEOUT: u64 = 10;

impl Config {
    /// Resolve all targets, applying per-target, global, and built-in
    /// defaults in that order.
    pub fn resolve_targets(&self) -> Vec<ResolvedTargetConfig> {
        let default_interval = self.default_interval.unwrap_or(DEFAULT_PROBE_INTERVAL);

        self.targets
            .iter()
            .flatten()
            .map(|target| ResolvedTargetConfig {
                url: target.url.clone(),
                display_name: target.display.clone().unwrap_or_else(|| target.url.clone()),
                probe_interval: target.interval.unwrap_or(default_interval),
                check_interval: target.check_interval.unwrap_or(DEFAULT_CHECK_INTERVAL),
                timeout: target.timeout.unwrap_or(DEFAULT_TIMEOUT),
            })
            .collect()
    }
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|_| anyhow::anyhow!("Invalid configuration file provided!"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
