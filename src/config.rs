//! Configuration loading
//!
//! Settings come from a TOML file found in this order:
//! 1. The path in `BOOK_CATALOG_CONFIG`
//! 2. `<config dir>/book-catalog/config.toml`
//! 3. Built-in defaults
//!
//! `BOOK_CATALOG_FILE` overrides `catalog_path` from any of them.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::covers::{CoverSettings, RemotePolicy, DEFAULT_REMOTE_TEMPLATE};
use crate::error::ConfigError;

pub const CONFIG_ENV_VAR: &str = "BOOK_CATALOG_CONFIG";
pub const CATALOG_ENV_VAR: &str = "BOOK_CATALOG_FILE";

/// Application settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Catalog opened at startup
    pub catalog_path: Option<PathBuf>,
    /// Directory holding cover images
    pub covers_dir: Option<PathBuf>,
    /// Image shown when a book has no cover
    pub placeholder: Option<PathBuf>,
    /// Remote cover URL with an `{isbn}` token; empty disables remote covers
    pub remote_template: String,
    pub remote_policy: RemotePolicy,
    pub probe_timeout_ms: u64,
    pub probe_min_bytes: u64,
    /// Cards per page
    pub page_size: usize,
    /// Symbol printed before prices
    pub currency: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            covers_dir: None,
            placeholder: None,
            remote_template: DEFAULT_REMOTE_TEMPLATE.to_string(),
            remote_policy: RemotePolicy::default(),
            probe_timeout_ms: 3000,
            probe_min_bytes: 1000,
            page_size: 12,
            currency: "$".to_string(),
        }
    }
}

impl AppConfig {
    /// Load settings from the environment and config file
    ///
    /// Never fails: an unreadable or invalid file is logged and defaults are used.
    pub fn load() -> Self {
        let mut config = match config_file_path() {
            Some(path) => match Self::from_file(&path) {
                Ok(config) => {
                    info!("⚙️ Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("{}; using defaults", e);
                    Self::default()
                }
            },
            None => Self::default(),
        };

        if let Some(path) = std::env::var_os(CATALOG_ENV_VAR) {
            config.catalog_path = Some(PathBuf::from(path));
        }
        config
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Cards per page, never zero
    pub fn page_size(&self) -> usize {
        self.page_size.max(1)
    }

    /// Settings for the cover resolver
    pub fn cover_settings(&self) -> CoverSettings {
        let template = self.remote_template.trim();
        CoverSettings {
            covers_dir: self.covers_dir.clone(),
            placeholder: self.placeholder.clone(),
            remote_template: (!template.is_empty()).then(|| template.to_string()),
            remote_policy: self.remote_policy,
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            probe_min_bytes: self.probe_min_bytes,
        }
    }
}

/// The config file to read, if any
fn config_file_path() -> Option<PathBuf> {
    // Priority 1: explicit path from the environment
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    // Priority 2: per-user config directory
    dirs::config_dir()
        .map(|dir| dir.join("book-catalog").join("config.toml"))
        .filter(|path| path.is_file())
}
