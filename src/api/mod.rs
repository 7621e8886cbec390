use crate::error::ProviderResult;
use crate::project::{AspectRatio, AssetRef, StyleIntensity};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod gemini;

/// What to write the script from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    Topic(String),
    /// User-supplied script: keep all of it, translate, time by word count.
    RawScript(String),
}

#[derive(Debug, Clone)]
pub struct ScriptRequest {
    pub source: ScriptSource,
    pub language: String,
    pub style_names: Vec<String>,
    pub style_intensity: StyleIntensity,
    pub duration_target: String,
}

/// One scene as returned by script generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptBeat {
    pub text: String,
    pub visual_prompt: String,
    #[serde(rename = "estimatedDuration")]
    pub estimated_duration_seconds: f64,
}

/// The generative service behind script, image and speech generation.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn generate_script(&self, request: &ScriptRequest) -> ProviderResult<Vec<ScriptBeat>>;

    /// Rate-limit failures must satisfy `ProviderError::is_rate_limited`.
    async fn generate_image(&self, prompt: &str, ratio: AspectRatio) -> ProviderResult<AssetRef>;

    async fn generate_speech(&self, text: &str, voice_id: &str) -> ProviderResult<AssetRef>;
}
