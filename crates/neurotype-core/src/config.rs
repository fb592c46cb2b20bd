//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the backend base URL, an optional chat URL override, where the session
//! token is kept, the last used email and the export directory.
//!
//! Configuration is stored at `~/.config/neurotype/config.json`. Environment
//! variables override the file after it is loaded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{FileTokenStore, KeyringTokenStore, TokenStore};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "neurotype";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_BASE_URL: &str = "https://neurotype-prod-backend.onrender.com";

/// Path of the chat socket, relative to the API base URL
const CHAT_PATH: &str = "/ws/chat";

pub const ENV_API_URL: &str = "NEUROTYPE_API_URL";
pub const ENV_CHAT_URL: &str = "NEUROTYPE_CHAT_URL";
pub const ENV_EMAIL: &str = "NEUROTYPE_EMAIL";

/// Where the bearer token is persisted between runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    #[default]
    File,
    Keyring,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_url: Option<String>,
    #[serde(default)]
    pub token_storage: TokenStorage,
    #[serde(default)]
    pub last_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            chat_url: None,
            token_storage: TokenStorage::default(),
            last_email: None,
            export_dir: None,
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
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

    /// Directory for the session file and logs
    pub fn cache_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(url) = get(ENV_CHAT_URL) {
            self.chat_url = Some(url);
        }
        if let Some(email) = get(ENV_EMAIL) {
            self.last_email = Some(email);
        }
    }

    /// Chat socket URL: the explicit override, or the base URL with its
    /// scheme swapped for `ws`/`wss` and `/ws/chat` appended.
    pub fn chat_url(&self) -> Result<String> {
        if let Some(ref url) = self.chat_url {
            return Ok(url.clone());
        }
        let base = self.api_base_url.trim_end_matches('/');
        let socket_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            bail!("Cannot derive a chat URL from {:?}", self.api_base_url);
        };
        Ok(format!("{}{}", socket_base, CHAT_PATH))
    }

    /// Token store selected by `token_storage`
    pub fn token_store(&self) -> Result<Arc<dyn TokenStore>> {
        Ok(match self.token_storage {
            TokenStorage::File => Arc::new(FileTokenStore::new(Self::cache_dir()?)),
            TokenStorage::Keyring => Arc::new(KeyringTokenStore),
        })
    }
}
