//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! where the database lives and how the data cache times out.
//!
//! Configuration is stored at `~/.config/wedplan/config.json`. The data
//! directory can also be forced with the `WEDPLAN_DATA_DIR` environment
//! variable.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::cache::CacheSettings;

/// Application name used for config/data directory paths
const APP_NAME: &str = "wedplan";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "WEDPLAN_DATA_DIR";

/// Cached snapshots are served without I/O for 5 minutes.
const DEFAULT_CACHE_VALIDITY_SECS: u64 = 300;

/// A bulk refresh that takes longer than this is treated as failed.
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// The background timer marks the cache stale once a minute.
const DEFAULT_STALE_CHECK_SECS: u64 = 60;

/// Refresh flags are polled every 2 seconds.
const DEFAULT_FLAG_POLL_SECS: u64 = 2;

/// Timers and timeouts are never shorter than this; tokio intervals panic on zero.
const MIN_PERIOD_SECS: u64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub cache_validity_secs: u64,
    pub fetch_timeout_secs: u64,
    pub stale_check_secs: u64,
    pub flag_poll_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            cache_validity_secs: DEFAULT_CACHE_VALIDITY_SECS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            stale_check_secs: DEFAULT_STALE_CHECK_SECS,
            flag_poll_secs: DEFAULT_FLAG_POLL_SECS,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the database and local storage.
    ///
    /// `None` means there is nowhere to persist data and storage runs
    /// disabled.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.resolve_data_dir(std::env::var_os(DATA_DIR_ENV))
    }

    fn resolve_data_dir(&self, env_override: Option<OsString>) -> Option<PathBuf> {
        if let Some(dir) = env_override.filter(|v| !v.is_empty()) {
            return Some(PathBuf::from(dir));
        }
        if let Some(ref dir) = self.data_dir {
            return Some(dir.clone());
        }
        dirs::data_dir().map(|dir| dir.join(APP_NAME))
    }

    /// Cache timing. A zero validity means every read reloads; the timer
    /// period and fetch timeout are raised to one second.
    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            validity: Duration::from_secs(self.cache_validity_secs),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs.max(MIN_PERIOD_SECS)),
            stale_check_interval: Duration::from_secs(self.stale_check_secs.max(MIN_PERIOD_SECS)),
        }
    }

    pub fn flag_poll_interval(&self) -> Duration {
        Duration::from_secs(self.flag_poll_secs.max(MIN_PERIOD_SECS))
    }
}
