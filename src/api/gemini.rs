use crate::api::{ContentProvider, ScriptBeat, ScriptRequest};
use crate::config::Config;
use crate::error::{ProviderError, ProviderResult};
use crate::project::{AspectRatio, AssetRef};
use crate::script::{build_script_prompt, parse_script_beats};
use crate::wav::{SPEECH_SAMPLE_RATE, pcm_duration_seconds, pcm_to_wav};
use crate::{logi, logw};
use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const BODY_SNIPPET_CHARS: usize = 800;

pub struct GeminiClient {
    client: Client,
    cfg: Config,
}

impl GeminiClient {
    pub fn new(cfg: Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, cfg })
    }

    async fn generate_content(&self, model: &str, body: &Value) -> ProviderResult<Value> {
        let url = format!("{GEMINI_BASE}/{model}:generateContent");
        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.cfg.api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let raw = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            logw(format!("Gemini {} HTTP {}", model, status.as_u16()));
            if !raw.is_empty() {
                let snippet = raw.chars().take(BODY_SNIPPET_CHARS).collect::<String>();
                logw(format!("Gemini raw body: {}", snippet));
            }
            return Err(classify_error(status.as_u16(), &raw));
        }

        let root: Value = serde_json::from_str(&raw)?;
        if let Some(err) = root.get("error") {
            return Err(classify_error(0, &json!({ "error": err }).to_string()));
        }
        Ok(root)
    }
}

/// Maps an error body to a provider error; quota exhaustion becomes
/// `RateLimited` whatever the transport status.
pub(crate) fn classify_error(status: u16, raw: &str) -> ProviderError {
    let parsed: Option<Value> = serde_json::from_str(raw).ok();
    let err = parsed.as_ref().and_then(|v| v.get("error"));

    let message = err
        .and_then(|e| e.get("message"))
        .and_then(|v| v.as_str())
        .unwrap_or(raw)
        .to_string();
    let code_status = err
        .and_then(|e| e.get("status"))
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let code = err
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_u64())
        .map(|c| c as u16)
        .unwrap_or(status);

    if code == 429 || code_status == "RESOURCE_EXHAUSTED" {
        return ProviderError::RateLimited(message);
    }
    ProviderError::http(code, message)
}

fn candidate_parts(root: &Value) -> Vec<&Value> {
    root.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| parts.iter().collect())
        .unwrap_or_default()
}

pub(crate) fn first_text(root: &Value) -> Option<String> {
    candidate_parts(root)
        .into_iter()
        .find_map(|p| p.get("text").and_then(|t| t.as_str()))
        .map(str::to_string)
}

/// `(mime type, base64 data)` of the first inline payload.
pub(crate) fn first_inline_data(root: &Value) -> Option<(String, String)> {
    candidate_parts(root).into_iter().find_map(|p| {
        let inline = p.get("inlineData")?;
        let data = inline.get("data")?.as_str()?;
        if data.is_empty() {
            return None;
        }
        let mime = inline
            .get("mimeType")
            .and_then(|m| m.as_str())
            .unwrap_or("application/octet-stream");
        Some((mime.to_string(), data.to_string()))
    })
}

fn script_body(prompt: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "text": { "type": "STRING", "description": "The narration text for this scene." },
                        "visualPrompt": { "type": "STRING", "description": "A detailed prompt for generating an image for this scene, incorporating the requested visual style." },
                        "estimatedDuration": { "type": "NUMBER", "description": "Estimated duration in seconds." }
                    },
                    "required": ["text", "visualPrompt", "estimatedDuration"]
                }
            }
        }
    })
}

fn image_body(prompt: &str, ratio: AspectRatio) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "imageConfig": { "aspectRatio": ratio.as_str() }
        }
    })
}

fn speech_body(text: &str, voice_id: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": text }] }],
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice_id } }
            }
        }
    })
}

#[async_trait]
impl ContentProvider for GeminiClient {
    async fn generate_script(&self, request: &ScriptRequest) -> ProviderResult<Vec<ScriptBeat>> {
        let prompt = build_script_prompt(request);
        let root = self
            .generate_content(&self.cfg.script_model, &script_body(&prompt))
            .await?;
        let text = first_text(&root).unwrap_or_else(|| "[]".to_string());
        let beats = parse_script_beats(&text)?;
        logi(format!("Gemini script received: {} scenes", beats.len()));
        Ok(beats)
    }

    async fn generate_image(&self, prompt: &str, ratio: AspectRatio) -> ProviderResult<AssetRef> {
        let root = self
            .generate_content(&self.cfg.image_model, &image_body(prompt, ratio))
            .await?;

        match first_inline_data(&root) {
            Some((mime, data)) => Ok(AssetRef::new(format!("data:{mime};base64,{data}"))),
            None => {
                if let Some(text) = first_text(&root) {
                    logw(format!("Model returned text instead of image: {}", text));
                }
                Err(ProviderError::empty("no image data returned"))
            }
        }
    }

    async fn generate_speech(&self, text: &str, voice_id: &str) -> ProviderResult<AssetRef> {
        let root = self
            .generate_content(&self.cfg.tts_model, &speech_body(text, voice_id))
            .await?;

        let (_, data) =
            first_inline_data(&root).ok_or_else(|| ProviderError::empty("no audio data returned"))?;
        let pcm = STANDARD
            .decode(data.as_bytes())
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        logi(format!(
            "Speech received: {:.2}s of audio ({} bytes PCM)",
            pcm_duration_seconds(pcm.len(), SPEECH_SAMPLE_RATE),
            pcm.len()
        ));

        let wav = pcm_to_wav(&pcm, SPEECH_SAMPLE_RATE);
        Ok(AssetRef::new(format!(
            "data:audio/wav;base64,{}",
            STANDARD.encode(wav)
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_errors_become_rate_limits() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = classify_error(429, body);
        assert!(matches!(err, ProviderError::RateLimited(ref m) if m == "Quota exceeded"));

        let body = r#"{"error":{"code":400,"message":"Bad prompt","status":"INVALID_ARGUMENT"}}"#;
        let err = classify_error(400, body);
        assert!(matches!(err, ProviderError::Http { status: 400, .. }));
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn non_json_error_keeps_transport_status() {
        let err = classify_error(503, "upstream unavailable");
        assert!(matches!(err, ProviderError::Http { status: 503, ref message } if message == "upstream unavailable"));
    }

    #[test]
    fn extracts_inline_payload_after_text_part() {
        let root = json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "here you go" },
                    { "inlineData": { "mimeType": "image/png", "data": "iVBORw0KGgo=" } }
                ]}
            }]
        });
        assert_eq!(first_text(&root).as_deref(), Some("here you go"));
        assert_eq!(
            first_inline_data(&root),
            Some(("image/png".to_string(), "iVBORw0KGgo=".to_string()))
        );
    }

    #[test]
    fn missing_candidates_yield_nothing() {
        let root = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert!(first_text(&root).is_none());
        assert!(first_inline_data(&root).is_none());
    }

    #[test]
    fn image_body_carries_aspect_ratio() {
        let body = image_body("a fox", AspectRatio::Square);
        assert_eq!(body["generationConfig"]["imageConfig"]["aspectRatio"], "1:1");
        let body = speech_body("hi", "Puck");
        assert_eq!(
            body["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
            "Puck"
        );
    }
}
