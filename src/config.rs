//! Configuration management for EmberTV
//!
//! Config is stored at ~/.config/embertv/config.toml. The API base URL can
//! be overridden per run with `--api-url` or the `EMBER_API_URL` variable.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::api::DEFAULT_BASE_URL;
use crate::storage::{FileStore, STORE_FILE};
use crate::stream::PlayerType;

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "EMBER_API_URL";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Backend functions root
    pub api_base_url: Option<String>,
    /// Directory holding store.json (default: <platform data dir>/embertv)
    pub data_dir: Option<PathBuf>,
    /// Preferred local player
    pub player: Option<PlayerType>,
}

impl Config {
    /// Get config file path (~/.config/embertv/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("embertv").join("config.toml"))
    }

    /// Load config from the default path, or defaults if not found
    pub fn load() -> Self {
        Self::path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default()
    }

    /// Load config from a specific file. Missing or invalid files give defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(s) => toml::from_str(&s).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Resolve the API base URL:
    /// 1. Explicit override (CLI flag)
    /// 2. Environment variable EMBER_API_URL
    /// 3. Config file
    /// 4. Built-in default
    pub fn api_base_url(&self, cli_override: Option<&str>) -> String {
        if let Some(url) = cli_override {
            return url.to_string();
        }

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                return url;
            }
        }

        self.api_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// Data directory: configured, or the platform default
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(FileStore::default_dir)
    }

    /// Path of the key-value store file
    pub fn store_path(&self) -> Option<PathBuf> {
        self.data_dir().map(|dir| dir.join(STORE_FILE))
    }

    pub fn player(&self) -> PlayerType {
        self.player.unwrap_or_default()
    }
}
