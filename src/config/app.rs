// src/config/app.rs
use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::{info, warn};

use crate::ingest::extract::{ExtractLimits, DEFAULT_MAX_BODY_CHARS, DEFAULT_MIN_BODY_CHARS};

pub const ENV_CRON_SECRET: &str = "CRON_SECRET";
pub const ENV_STORE_PATH: &str = "STORE_PATH";
pub const ENV_SOURCES_CONFIG_PATH: &str = "SOURCES_CONFIG_PATH";
pub const ENV_AI_CONFIG_PATH: &str = "AI_CONFIG_PATH";
pub const ENV_INGEST_INTERVAL_SECS: &str = "INGEST_INTERVAL_SECS";
pub const ENV_REVALIDATE_WEBHOOK_URL: &str = "REVALIDATE_WEBHOOK_URL";
pub const ENV_REVALIDATE_TOKEN: &str = "REVALIDATE_TOKEN";
pub const ENV_EXTRACT_MIN_BODY_CHARS: &str = "EXTRACT_MIN_BODY_CHARS";
pub const ENV_EXTRACT_MAX_BODY_CHARS: &str = "EXTRACT_MAX_BODY_CHARS";

pub const DEFAULT_STORE_PATH: &str = "data/patch_notes.jsonl";
pub const DEFAULT_SOURCES_CONFIG_PATH: &str = "config/sources.toml";
pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";

/// Process configuration read from the environment (after `.env` is loaded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Bearer secret for the cron trigger. `None` rejects every trigger.
    pub cron_secret: Option<String>,
    pub store_path: PathBuf,
    pub sources_config_path: PathBuf,
    pub ai_config_path: PathBuf,
    /// In-process schedule; `None` leaves triggering to an external scheduler.
    pub ingest_interval_secs: Option<u64>,
    pub revalidate_webhook_url: Option<String>,
    pub revalidate_token: Option<String>,
    /// Body length thresholds for detail-page extraction.
    pub extract_limits: ExtractLimits,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let cron_secret = non_empty(ENV_CRON_SECRET);
        if cron_secret.is_none() {
            warn!("{ENV_CRON_SECRET} not set; the cron trigger will reject every request");
        }

        Self {
            cron_secret,
            store_path: try_load(ENV_STORE_PATH, DEFAULT_STORE_PATH),
            sources_config_path: try_load(ENV_SOURCES_CONFIG_PATH, DEFAULT_SOURCES_CONFIG_PATH),
            ai_config_path: try_load(ENV_AI_CONFIG_PATH, DEFAULT_AI_CONFIG_PATH),
            ingest_interval_secs: non_empty(ENV_INGEST_INTERVAL_SECS)
                .and_then(|raw| match raw.parse::<u64>() {
                    Ok(0) => {
                        warn!("{ENV_INGEST_INTERVAL_SECS}=0 ignored; scheduler disabled");
                        None
                    }
                    Ok(secs) => Some(secs),
                    Err(e) => {
                        warn!("Invalid {ENV_INGEST_INTERVAL_SECS} value: {e}; scheduler disabled");
                        None
                    }
                }),
            revalidate_webhook_url: non_empty(ENV_REVALIDATE_WEBHOOK_URL),
            revalidate_token: non_empty(ENV_REVALIDATE_TOKEN),
            extract_limits: extract_limits(),
        }
    }
}

fn extract_limits() -> ExtractLimits {
    let min_body_chars: usize =
        try_load(ENV_EXTRACT_MIN_BODY_CHARS, &DEFAULT_MIN_BODY_CHARS.to_string());
    let max_body_chars: usize =
        try_load(ENV_EXTRACT_MAX_BODY_CHARS, &DEFAULT_MAX_BODY_CHARS.to_string());
    if max_body_chars == 0 || min_body_chars > max_body_chars {
        warn!(
            min_body_chars,
            max_body_chars, "extract limits inconsistent; using defaults"
        );
        return ExtractLimits::default();
    }
    ExtractLimits {
        min_body_chars,
        max_body_chars,
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = non_empty(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    match raw.parse() {
        Ok(v) => v,
        Err(e) => {
            warn!("Invalid {key} value: {e}; using default: {default}");
            match default.parse() {
                Ok(v) => v,
                Err(_) => unreachable!("default for {key} must parse"),
            }
        }
    }
}
