//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.biomodels-cache/config.toml` (user)
//! 3. `/etc/biomodels-cache/config.toml` (system)
//!
//! Unlike an explicit path, the standard locations are optional: without a
//! config file every setting takes its default.
//!
//! Of the tier kinds only `json_file` and `object_store` persist on disk.
//! `key_value` lives in process memory, so a CLI run with
//! `tiers = ["key_value"]` forgets every write when it exits.
//!
//! ```toml
//! [cache]
//! directory = "/var/cache/biomodels"
//! file_name = "biomodels_cache.json"
//! tiers = ["json_file", "object_store"]
//! backfill_tiers = false
//!
//! [catalog]
//! base_url = "https://www.ebi.ac.uk/biomodels"
//! timeout_secs = 30
//!
//! [retry]
//! max_attempts = 3
//! initial_delay_ms = 500
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::catalog::{DEFAULT_BASE_URL, RetryConfig};
use crate::tier::DEFAULT_CACHE_FILE;
use crate::{CacheError, Result};

const APP_DIR: &str = "biomodels-cache";

/// Client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Persistence tier selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
    /// Process-local key-value blob. Not persisted across runs.
    KeyValue,
    /// One document per record under `<directory>/objects`.
    ObjectStore,
    /// Single JSON file `<directory>/<file_name>`.
    JsonFile,
}

/// Local cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// Cache directory (default: the platform cache dir + `biomodels-cache`).
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// JSON file name (default: `biomodels_cache.json`).
    #[serde(default = "default_file_name")]
    pub file_name: String,
    /// Persistence tiers in priority order.
    #[serde(default = "default_tiers")]
    pub tiers: Vec<TierKind>,
    /// Refill faster tiers on a hit in a slower one (default: false).
    #[serde(default)]
    pub backfill_tiers: bool,
    /// Write remotely fetched records into every tier (default: true).
    #[serde(default = "default_true")]
    pub write_through_on_fetch: bool,
}

impl CacheConfig {
    /// Whether any configured tier keeps records on disk.
    pub fn is_persistent(&self) -> bool {
        self.tiers.iter().any(|kind| *kind != TierKind::KeyValue)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_name: default_file_name(),
            tiers: default_tiers(),
            backfill_tiers: false,
            write_through_on_fetch: true,
        }
    }
}

fn default_file_name() -> String {
    DEFAULT_CACHE_FILE.to_string()
}

fn default_tiers() -> Vec<TierKind> {
    vec![TierKind::JsonFile, TierKind::ObjectStore]
}

fn default_true() -> bool {
    true
}

/// Remote catalog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogConfig {
    /// Disable to run purely from the local tiers (default: enabled).
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided, must exist)
    /// 2. `~/.biomodels-cache/config.toml`
    /// 3. `/etc/biomodels-cache/config.toml`
    /// 4. Built-in defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let Some(path) = Self::resolve_config_path(explicit_path)? else {
            debug!("no config file found, using defaults");
            return Ok(Self::default());
        };
        debug!(path = %path.display(), "loading config");
        let content = fs::read_to_string(&path).map_err(|e| {
            CacheError::InvalidConfiguration(format!("failed to read config file {path:?}: {e}"))
        })?;
        Self::parse(&content).map_err(|e| match e {
            CacheError::InvalidConfiguration(msg) => {
                CacheError::InvalidConfiguration(format!("{path:?}: {msg}"))
            }
            other => other,
        })
    }

    /// Parse a TOML document.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| CacheError::InvalidConfiguration(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.cache.tiers.is_empty() {
            return Err(CacheError::InvalidConfiguration(
                "cache.tiers must name at least one tier".to_string(),
            ));
        }
        if self.cache.file_name.is_empty() {
            return Err(CacheError::InvalidConfiguration(
                "cache.file_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The cache directory, defaulting to `<platform cache dir>/biomodels-cache`.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.cache.directory {
            return Ok(dir.clone());
        }
        dirs::cache_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| {
                CacheError::InvalidConfiguration(
                    "no platform cache directory; set cache.directory".to_string(),
                )
            })
    }

    /// Full path of the JSON cache file.
    pub fn cache_file(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join(&self.cache.file_name))
    }

    /// Resolve the config file path, if any.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(CacheError::InvalidConfiguration(format!(
                "config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(format!(".{APP_DIR}")).join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc").join(APP_DIR).join("config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }
}
