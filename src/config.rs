use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sync::entry::SyncConfig;
use crate::sync::error::ConfigError;

// =============================================================================
// Scheduling defaults
// =============================================================================

/// Number of entities synced concurrently per batch
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Per-entity timeout in milliseconds (30 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

// =============================================================================
// Retry and cache defaults
// =============================================================================

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_RETRY_DELAY_MS: u64 = 1_000;
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_MAX_RETRY_DELAY_MS: u64 = 10_000;

/// How long an upstream response is reused within one run (5 minutes)
pub const DEFAULT_CACHE_TTL_MS: u64 = 5 * 60 * 1000;

// =============================================================================
// Outbound HTTP
// =============================================================================

pub const USER_AGENT: &str = "catalog-sync";

/// GitHub caps `per_page` at 100
pub const TAGS_PER_PAGE: usize = 100;

/// Upper bound on tag pages fetched per repository
pub const MAX_TAG_PAGES: usize = 5;

/// Base URLs of every upstream the adapters talk to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub github: String,
    pub npm: String,
    pub pypi: String,
    pub crates: String,
    pub endoflife: String,
    pub dotnet: String,
    pub adoptium: String,
    pub cppreference: String,
    pub whatwg: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            github: "https://api.github.com".to_string(),
            npm: "https://registry.npmjs.org".to_string(),
            pypi: "https://pypi.org".to_string(),
            crates: "https://crates.io".to_string(),
            endoflife: "https://endoflife.date".to_string(),
            dotnet: "https://dotnetcli.blob.core.windows.net".to_string(),
            adoptium: "https://api.adoptium.net".to_string(),
            cppreference: "https://en.cppreference.com".to_string(),
            whatwg: "https://html.spec.whatwg.org".to_string(),
        }
    }
}

impl Endpoints {
    /// Points every upstream at the same base URL
    pub fn all(base_url: &str) -> Self {
        let url = base_url.trim_end_matches('/').to_string();
        Self {
            github: url.clone(),
            npm: url.clone(),
            pypi: url.clone(),
            crates: url.clone(),
            endoflife: url.clone(),
            dotnet: url.clone(),
            adoptium: url.clone(),
            cppreference: url.clone(),
            whatwg: url,
        }
    }
}

// =============================================================================
// Environment variables
// =============================================================================

pub const ENV_CONCURRENCY: &str = "SYNC_CONCURRENCY";
pub const ENV_TIMEOUT: &str = "SYNC_TIMEOUT";
pub const ENV_DRY_RUN: &str = "DRY_RUN";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";

/// Runtime settings for one sync run
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    pub concurrency: usize,
    pub timeout: Duration,
    pub dry_run: bool,
    pub github_token: Option<String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            dry_run: false,
            github_token: None,
        }
    }
}

impl SyncSettings {
    /// Reads settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(value) = lookup(ENV_CONCURRENCY) {
            settings.concurrency = value
                .trim()
                .parse()
                .ok()
                .filter(|n: &usize| *n > 0)
                .ok_or(ConfigError::InvalidEnv {
                    name: ENV_CONCURRENCY,
                    value,
                })?;
        }

        if let Some(value) = lookup(ENV_TIMEOUT) {
            let ms: u64 = value
                .trim()
                .parse()
                .ok()
                .filter(|n: &u64| *n > 0)
                .ok_or(ConfigError::InvalidEnv {
                    name: ENV_TIMEOUT,
                    value,
                })?;
            settings.timeout = Duration::from_millis(ms);
        }

        settings.dry_run = lookup(ENV_DRY_RUN).is_some_and(|v| v.trim() == "1");

        settings.github_token = lookup(ENV_GITHUB_TOKEN).filter(|t| !t.trim().is_empty());

        Ok(settings)
    }
}

/// Loads a list of sync entries from a JSON file
pub fn load_sync_configs(path: &Path) -> Result<Vec<SyncConfig>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Returns the path to the data directory for catalog-sync.
/// Uses $XDG_DATA_HOME/catalog-sync if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/catalog-sync,
/// or ./catalog-sync if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the catalog database file.
pub fn db_path() -> PathBuf {
    data_dir().join("catalog.db")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("catalog-sync.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("catalog-sync")
}
