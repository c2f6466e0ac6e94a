// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

/// Prioritized model ids; deployed ids vary by account/region and change over time.
pub const DEFAULT_MODELS: &[&str] = &[
    "gemini-2.5-flash",
    "gemini-2.0-flash-exp",
    "gemini-1.5-flash-latest",
    "gemini-1.5-flash-001",
    "gemini-1.5-flash",
    "gemini-1.5-pro-latest",
    "gemini-1.5-pro-001",
    "gemini-1.5-pro",
];

fn default_enabled() -> bool {
    true
}
fn default_provider() -> String {
    "gemini".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_models() -> Vec<String> {
    DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
}
fn default_prompt_char_cap() -> usize {
    8_000
}
fn default_fallback_chars() -> usize {
    500
}
fn default_language() -> String {
    "Korean".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Only "gemini" is wired today (case-insensitive).
    #[serde(default = "default_provider")]
    pub provider: String,
    /// "ENV" means: read from GEMINI_API_KEY
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    /// Body chars included in the prompt.
    #[serde(default = "default_prompt_char_cap")]
    pub prompt_char_cap: usize,
    /// Length of the text excerpt stored when every model fails.
    #[serde(default = "default_fallback_chars")]
    pub fallback_chars: usize,
    /// Language the summary is written in.
    #[serde(default = "default_language")]
    pub language: String,
    /// Override for the provider endpoint (tests, proxies).
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            provider: default_provider(),
            api_key: default_api_key(),
            models: default_models(),
            prompt_char_cap: default_prompt_char_cap(),
            fallback_chars: default_fallback_chars(),
            language: default_language(),
            base_url: None,
        }
    }
}

impl AiConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let cfg: AiConfig = serde_json::from_str(&data)?;
        cfg.finalize()
    }

    /// `path` if it exists, otherwise defaults (key still resolved from env).
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::info!(path = %path.display(), "no AI config file; using defaults");
            Self::default().finalize()
        }
    }

    fn finalize(mut self) -> anyhow::Result<Self> {
        // Normalize provider
        self.provider = self.provider.trim().to_lowercase();
        if self.provider != "gemini" {
            anyhow::bail!("Unsupported provider in config: {}", self.provider);
        }

        // Resolve api key if "ENV". A missing key degrades summaries, it doesn't stop ingestion.
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = env::var(ENV_GEMINI_API_KEY).unwrap_or_default();
            if self.api_key.is_empty() && self.enabled {
                tracing::warn!("GEMINI_API_KEY not set; summaries will fall back to text excerpts");
            }
        }

        self.models.retain(|m| !m.trim().is_empty());
        if self.models.is_empty() {
            self.models = default_models();
        }
        if self.prompt_char_cap == 0 {
            self.prompt_char_cap = default_prompt_char_cap();
        }
        if self.language.trim().is_empty() {
            self.language = default_language();
        }
        Ok(self)
    }
}
