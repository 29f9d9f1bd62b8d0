//! Configuration management for the CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Used when neither the flag, the environment nor the config file set a URL
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// CLI configuration (`~/.config/qc/config.json`)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_url: Option<String>,
    /// Model used by `predict` and `watch` when `--model` is not given
    pub default_model: Option<String>,
    /// Dataset replayed by `watch` when `--dataset` is not given
    pub dataset: Option<PathBuf>,
}

impl Config {
    /// Load the user's config file; a missing file yields the defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).context("Failed to read config file")?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// The API URL to use: explicit flag or env, then config file, then default
    pub fn resolve_api_url(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn resolve_model(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.default_model.clone())
            .unwrap_or_else(|| server_lib::DEFAULT_MODEL.to_string())
    }

    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("qc").join("config.json"))
    }
}
