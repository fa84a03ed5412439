//! Provider credentials
//!
//! API keys can live outside the main config file, in
//! `$XDG_DATA_HOME/deepdimension/auth.json` (usually
//! `~/.local/share/deepdimension/auth.json`):
//!
//! ```json
//! { "deepseek": { "type": "api", "key": "sk-...", "base_url": "https://api.deepseek.com" } }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Credentials for one provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AuthEntry {
    /// Static bearer token
    #[serde(rename = "api")]
    Api {
        key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
}

impl AuthEntry {
    pub fn api_key(&self) -> &str {
        match self {
            AuthEntry::Api { key, .. } => key,
        }
    }

    pub fn base_url(&self) -> Option<&str> {
        match self {
            AuthEntry::Api { base_url, .. } => base_url.as_deref(),
        }
    }
}

/// Contents of auth.json, keyed by provider name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthConfig {
    pub providers: HashMap<String, AuthEntry>,
}

impl AuthConfig {
    /// A missing file is an empty config
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: AuthConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("deepdimension").join("auth.json"))
    }

    pub fn get(&self, provider: &str) -> Option<&AuthEntry> {
        self.providers.get(provider)
    }
}
