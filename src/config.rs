use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Which image failures get replaced by a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTrigger {
    #[default]
    AnyFailure,
    RateLimitOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "gemini_api_key")]
    pub api_key: String,
    #[serde(default = "default_script_model")]
    pub script_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_tts_model")]
    pub tts_model: String,
    #[serde(rename = "rate_limit_backoff_ms")]
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(rename = "image_throttle_ms")]
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    #[serde(default)]
    pub image_fallback: FallbackTrigger,
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

fn default_script_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_image_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_tts_model() -> String {
    "gemini-2.5-flash-preview-tts".to_string()
}

fn default_backoff_ms() -> u64 {
    3000
}

fn default_throttle_ms() -> u64 {
    1500
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("exports")
}

impl Config {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content).context("config.json: invalid JSON")?;

        if config.api_key.trim().is_empty() {
            anyhow::bail!("config.json: gemini_api_key missing");
        }

        Ok(config)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}
