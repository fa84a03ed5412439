//! Application configuration
//!
//! Loaded once at startup from, in increasing priority:
//! - defaults
//! - a YAML file (`--config`, `./deepdimension.yaml`, or
//!   `~/.config/deepdimension/config.yaml`)
//! - `DEEPSEEK_API_URL` / `DEEPSEEK_API_KEY` / `DEEPSEEK_API_MODEL`
//!   (a `.env` file is honoured)
//!
//! If no API key is set by then, [`Config::load_auth`] consults auth.json.

use crate::auth::AuthConfig;
use crate::prompt::PromptTemplate;
use crate::provider::{GenerationConfig, ProviderConfig};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_API_URL: &str = "DEEPSEEK_API_URL";
pub const ENV_API_KEY: &str = "DEEPSEEK_API_KEY";
pub const ENV_API_MODEL: &str = "DEEPSEEK_API_MODEL";

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chat-completions endpoint and model
    pub provider: ProviderConfig,

    /// System prompt rules and reference markers
    pub prompt: PromptTemplate,

    /// Sampling parameters
    pub generation: GenerationConfig,

    /// Logging settings
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Directory for log files
    pub log_dir: PathBuf,

    /// Also log to the console
    pub verbose: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(".deepdimension_logs"),
            verbose: false,
        }
    }
}

impl Config {
    /// Load the config file and environment overrides.
    ///
    /// An explicit `path` must exist; the default locations are optional.
    /// auth.json is read separately by [`Config::load_auth`], so callers can
    /// install logging first and report an unreadable credentials file.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => match Self::default_paths().into_iter().find(|p| p.is_file()) {
                Some(found) => Self::load_from(&found)?,
                None => Self::default(),
            },
        };

        config.apply_overrides(|name| std::env::var(name).ok());

        Ok(config)
    }

    /// Fill a missing API key from the default auth.json
    pub fn load_auth(&mut self) -> anyhow::Result<()> {
        match AuthConfig::config_path() {
            Some(path) => self.load_auth_from(&path),
            None => Ok(()),
        }
    }

    /// Fill a missing API key from the given auth.json. The file is not read
    /// when a key is already set.
    pub fn load_auth_from(&mut self, path: &Path) -> anyhow::Result<()> {
        if self.provider.api_key().is_some() {
            return Ok(());
        }
        let auth = AuthConfig::load_from(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        self.apply_auth(&auth);
        Ok(())
    }

    /// Parse a YAML config file
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Config file locations searched when none is given
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("deepdimension.yaml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("deepdimension").join("config.yaml"));
        }
        paths
    }

    /// Apply provider overrides from a variable lookup (the environment in
    /// production). Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(url) = lookup(ENV_API_URL) {
            self.provider.base_url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.provider.api_key = Some(key);
        }
        if let Some(model) = lookup(ENV_API_MODEL) {
            self.provider.model = model;
        }
    }

    /// Fill a missing API key (and its base URL, if recorded) from auth.json
    pub fn apply_auth(&mut self, auth: &AuthConfig) {
        if self.provider.api_key().is_some() {
            return;
        }
        if let Some(entry) = auth.get(&self.provider.name) {
            self.provider.api_key = Some(entry.api_key().to_string());
            if let Some(base_url) = entry.base_url() {
                self.provider.base_url = base_url.to_string();
            }
        }
    }

    /// Set verbose logging
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.telemetry.verbose = verbose;
        self
    }

    /// Set API key
    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.provider.api_key = Some(api_key);
        self
    }
}
