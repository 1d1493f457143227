//! Runtime configuration
//!
//! Loaded from a TOML file, then overridden by environment variables.
//! File lookup order: an explicit path (the `--config` flag), `$HEDDLE_CONFIG`,
//! then `<config dir>/heddle/config.toml` if it exists. Without any file the
//! defaults apply.
//!
//! ```toml
//! [store]
//! root = ".heddle"
//!
//! [cache]
//! caching_jobs = 100
//!
//! [orchestrator]
//! max_conflict_retries = 3
//!
//! [watch]
//! poll_interval_ms = 1000
//!
//! [log]
//! level = "info"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::constants::DEFAULT_CACHING_JOBS;
use crate::orchestrator::OrchestratorConfig;

pub const CONFIG_ENV: &str = "HEDDLE_CONFIG";
pub const STORE_ROOT_ENV: &str = "HEDDLE_STORE_ROOT";
pub const CACHING_JOBS_ENV: &str = "HEDDLE_CACHING_JOBS";
pub const MAX_CONFLICT_RETRIES_ENV: &str = "HEDDLE_MAX_CONFLICT_RETRIES";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub store: StoreSettings,
    pub cache: CacheSettings,
    pub orchestrator: OrchestratorSettings,
    pub watch: WatchSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreSettings {
    /// Root directory of the file-backed store, inbox and outbox
    pub root: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".heddle"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheSettings {
    /// Prior finished jobs examined for a cache hit; 0 disables caching
    pub caching_jobs: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            caching_jobs: DEFAULT_CACHING_JOBS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrchestratorSettings {
    pub max_conflict_retries: u32,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_conflict_retries: OrchestratorConfig::default().max_conflict_retries,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WatchSettings {
    pub poll_interval_ms: u64,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter directive when `HEDDLE_LOG` is unset
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration following the lookup order, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if an explicitly named file is missing, a file
    /// cannot be parsed, or an override is not a valid number.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match Self::locate(explicit)? {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn locate(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));

        if let Some(path) = named {
            if !path.exists() {
                return Err(config_error(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Ok(Some(path));
        }

        Ok(dirs::config_dir()
            .map(|dir| dir.join("heddle").join("config.toml"))
            .filter(|path| path.exists()))
    }

    /// Parse a TOML config file without applying overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            config_error(format!("failed to read config file {}: {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| {
            config_error(format!("failed to parse config file {}: {e}", path.display()))
        })
    }

    /// Apply `HEDDLE_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(root) = env::var_os(STORE_ROOT_ENV) {
            self.store.root = PathBuf::from(root);
        }
        if let Some(caching_jobs) = parse_env(CACHING_JOBS_ENV)? {
            self.cache.caching_jobs = caching_jobs;
        }
        if let Some(retries) = parse_env(MAX_CONFLICT_RETRIES_ENV)? {
            self.orchestrator.max_conflict_retries = retries;
        }
        Ok(())
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            caching_jobs: self.cache.caching_jobs,
            max_conflict_retries: self.orchestrator.max_conflict_retries,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.watch.poll_interval_ms)
    }

    pub fn inbox_dir(&self) -> PathBuf {
        self.store.root.join("inbox")
    }

    pub fn outbox_path(&self) -> PathBuf {
        self.store.root.join("outbox.jsonl")
    }
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| config_error(format!("invalid {name}={raw:?}: {e}"))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(config_error(format!("invalid {name}: {e}"))),
    }
}

fn config_error(message: String) -> Error {
    Error::Config { message }
}
