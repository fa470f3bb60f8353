use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

// =============================================================================
// Time-related constants
// =============================================================================

/// Timeout for a single tag listing in milliseconds (20 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 20_000;

// =============================================================================
// Registry constants
// =============================================================================

/// Number of containers checked in parallel
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Tags requested per Docker Hub page
pub const DOCKER_HUB_PAGE_SIZE: usize = 100;

/// Upper bound on Docker Hub pages followed for one repository
pub const DOCKER_HUB_MAX_PAGES: usize = 10;

/// Tags requested per OCI tags/list page
pub const OCI_PAGE_SIZE: usize = 100;

/// Upper bound on OCI `Link` pages followed for one repository
pub const OCI_MAX_PAGES: usize = 20;

/// Registries speaking the OCI distribution API that are enabled by default
pub const DEFAULT_OCI_HOSTS: &[&str] = &["ghcr.io", "quay.io"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Checker configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckerConfig {
    /// Containers checked in parallel
    pub concurrency: usize,
    /// Timeout for a single tag listing in milliseconds
    pub fetch_timeout_ms: u64,
    pub registries: RegistriesConfig,
    /// Required by `--output telegram`
    pub telegram: Option<TelegramConfig>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            fetch_timeout_ms: FETCH_TIMEOUT_MS,
            registries: RegistriesConfig::default(),
            telegram: None,
        }
    }
}

impl CheckerConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "fetchTimeoutMs must be greater than 0".to_string(),
            ));
        }
        if let Some(entry) = self.registries.oci.iter().find(|r| r.host.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "OCI registry entry without host: {:?}",
                entry
            )));
        }
        if self.telegram.as_ref().is_some_and(|t| t.bot_token.is_empty()) {
            return Err(ConfigError::Invalid(
                "telegram.botToken must not be empty".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Registry-specific configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistriesConfig {
    pub docker_hub: RegistryConfig,
    pub oci: Vec<OciRegistryConfig>,
}

impl Default for RegistriesConfig {
    fn default() -> Self {
        Self {
            docker_hub: RegistryConfig::default(),
            oci: DEFAULT_OCI_HOSTS
                .iter()
                .map(|host| OciRegistryConfig {
                    host: host.to_string(),
                    insecure: false,
                })
                .collect(),
        }
    }
}

/// Individual registry configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    pub enabled: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// A registry reached through the OCI distribution API
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OciRegistryConfig {
    /// Hostname as it appears in image references (e.g. "ghcr.io", "localhost:5000")
    pub host: String,
    /// Use plain HTTP instead of HTTPS
    #[serde(default)]
    pub insecure: bool,
}

/// Telegram chat that receives update notifications
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: i64,
}

/// Load the checker configuration from a JSON file
///
/// Missing fields fall back to their defaults.
pub fn load_config(path: &Path) -> Result<CheckerConfig, ConfigError> {
    info!("Loading config from file {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: CheckerConfig = serde_json::from_str(&content)?;
    config.validate()
}

/// Returns the path to the data directory for tagscout.
/// Uses $XDG_DATA_HOME/tagscout if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/tagscout,
/// or ./tagscout if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the default path of the state database.
///
/// Reserved: nothing is persisted between runs.
pub fn db_path() -> PathBuf {
    data_dir().join("tagscout.db")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("tagscout")
}
