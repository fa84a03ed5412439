//! Provider configuration

use serde::{Deserialize, Serialize};

/// Configuration for the chat-completions provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Display name, also the auth.json lookup key
    pub name: String,
    /// API base URL (e.g., "https://api.deepseek.com")
    pub base_url: String,
    /// Bearer token; no Authorization header is sent when unset or empty
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::deepseek()
    }
}

impl ProviderConfig {
    /// DeepSeek's hosted API
    pub fn deepseek() -> Self {
        Self {
            name: "deepseek".to_string(),
            base_url: "https://api.deepseek.com".to_string(),
            api_key: None,
            model: "deepseek-chat".to_string(),
        }
    }

    /// Any endpoint speaking the same streaming contract (e.g., a local proxy)
    pub fn custom(
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            api_key: None,
            model: model.into(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// The API key, if one is configured and non-empty
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Full URL of the chat-completions endpoint
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Sampling parameters sent with every request
///
/// A `None` field is left out of the request body so the provider applies
/// its own default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Sampling temperature
    pub temperature: Option<f64>,
    /// Nucleus sampling
    pub top_p: Option<f64>,
    /// Maximum output tokens
    pub max_tokens: Option<u32>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: Some(0.3),
            top_p: Some(0.9),
            max_tokens: Some(2000),
        }
    }
}

impl GenerationConfig {
    /// No parameters: every field is left to the provider
    pub fn unset() -> Self {
        Self {
            temperature: None,
            top_p: None,
            max_tokens: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_is_ignored() {
        let config = ProviderConfig::deepseek().with_api_key("");
        assert_eq!(config.api_key(), None);

        let config = ProviderConfig::deepseek().with_api_key("sk-test");
        assert_eq!(config.api_key(), Some("sk-test"));
    }

    #[test]
    fn test_chat_completions_url() {
        let config = ProviderConfig::custom("local", "http://localhost:8080/v1/", "m");
        assert_eq!(
            config.chat_completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_generation_null_unsets_field() {
        let config: GenerationConfig =
            serde_yaml::from_str("temperature: ~\nmax_tokens: 512\n").unwrap();
        assert_eq!(config.temperature, None);
        assert_eq!(config.top_p, Some(0.9));
        assert_eq!(config.max_tokens, Some(512));
    }
}
