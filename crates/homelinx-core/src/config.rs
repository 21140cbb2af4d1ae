//! Application configuration management.
//!
//! Configuration is stored at `~/.config/homelinx/config.json` and can be
//! overridden per field by environment variables:
//!
//! - `HOMELINX_ORIGIN`: origin the worker fetches against
//! - `HOMELINX_SCOPE`: registration scope
//! - `HOMELINX_CACHE_NAME`: current cache generation
//! - `PUBLIC_VTL_API_URL`: listings API base URL (unset selects mock listings)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::worker::WorkerConfig;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "homelinx";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_ORIGIN: &str = "http://localhost:4321";
const DEFAULT_SCOPE: &str = "/";

const ENV_ORIGIN: &str = "HOMELINX_ORIGIN";
const ENV_SCOPE: &str = "HOMELINX_SCOPE";
const ENV_CACHE_NAME: &str = "HOMELINX_CACHE_NAME";
const ENV_API_URL: &str = "PUBLIC_VTL_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub origin: String,
    pub scope: String,
    pub api_url: Option<String>,
    #[serde(flatten)]
    pub worker: WorkerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            api_url: None,
            worker: WorkerConfig::default(),
        }
    }
}

impl Config {
    /// Load the config file (defaults if absent), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file(&Self::config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Override fields from `lookup` (normally the process environment).
    /// Blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(origin) = get(ENV_ORIGIN) {
            self.origin = origin;
        }
        if let Some(scope) = get(ENV_SCOPE) {
            self.scope = scope;
        }
        if let Some(name) = get(ENV_CACHE_NAME) {
            self.worker.cache_name = name;
        }
        if let Some(url) = get(ENV_API_URL) {
            self.api_url = Some(url);
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
