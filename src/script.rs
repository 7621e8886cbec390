use crate::api::{ScriptBeat, ScriptRequest, ScriptSource};
use crate::error::{ProviderError, ProviderResult};
use crate::project::Scene;
use anyhow::Context;
use once_cell::sync::OnceCell;
use regex::Regex;

pub const WORDS_PER_MINUTE: f64 = 150.0;

fn style_description(request: &ScriptRequest) -> String {
    if request.style_names.is_empty() {
        return "VISUAL STYLE: Cinematic + Realistic.".to_string();
    }
    let names = request.style_names.join(" + ");
    format!(
        "VISUAL STYLE: {names} ({} Intensity).\nIMPORTANT: The 'visualPrompt' for each scene MUST strictly reflect this style.\nDescribe lighting, textures, colors, and camera angles that match {names}.",
        request.style_intensity.as_str()
    )
}

fn duration_instruction(request: &ScriptRequest) -> String {
    match &request.source {
        ScriptSource::RawScript(_) => "SCRIPT DURATION: The user has provided a manual script.\nRESPECT THE FULL LENGTH OF THE USER INPUT. Do NOT summarize, cut, or shorten the content to fit a target duration.\nCreate as many scenes as necessary to cover the entire text provided.\nThe 'estimatedDuration' for each scene should be calculated based on reading speed (~150 words per minute).".to_string(),
        ScriptSource::Topic(_) => format!(
            "TARGET VIDEO DURATION: {target}.\nYou MUST adjust the total script length and number of scenes to match this duration.\n- 30s: ~3-5 scenes, ~75 words\n- 1min: ~6-8 scenes, ~150 words\n- 5min: ~20-30 scenes, ~750 words\n- 10min+: Scale scenes and word count accordingly.\nEnsure the script has a strong hook, progression, and ending suitable for a {target} video.",
            target = request.duration_target
        ),
    }
}

pub fn build_script_prompt(request: &ScriptRequest) -> String {
    let language = &request.language;
    let duration = duration_instruction(request);
    let style = style_description(request);
    match &request.source {
        ScriptSource::RawScript(script) => format!(
            "Act as a professional video script editor and translator.\n\nTASK: Translate and adapt the User Input into a production-ready video script in {language}.\n\nUSER INPUT:\n\"{script}\"\n\nCONSTRAINTS:\n1. LANGUAGE: The output narration text MUST be in {language}. If the input is in another language, translate it accurately first.\n2. ADAPTATION: Optimize the pacing for a faceless video.\n3. {duration}\n4. {style}"
        ),
        ScriptSource::Topic(topic) => format!(
            "Create a captivating faceless video script about \"{topic}\" in {language}.\nThe tone should be engaging and viral.\n{duration}\n\n{style}"
        ),
    }
}

fn fence_regex() -> anyhow::Result<&'static Regex> {
    static FENCE_RE: OnceCell<Regex> = OnceCell::new();
    FENCE_RE.get_or_try_init(|| {
        Regex::new(r"(?s)^\s*```(?:json)?\s*\n?(.*?)\n?\s*```\s*$").context("failed to compile fence regex")
    })
}

/// Removes a surrounding ```json fence if the model added one.
pub fn strip_code_fence(text: &str) -> String {
    if let Ok(re) = fence_regex() {
        if let Some(cap) = re.captures(text) {
            return cap[1].trim().to_string();
        }
    }
    text.trim().to_string()
}

pub fn parse_script_beats(text: &str) -> ProviderResult<Vec<ScriptBeat>> {
    let cleaned = strip_code_fence(text);
    let json = if cleaned.is_empty() { "[]" } else { cleaned.as_str() };
    let beats: Vec<ScriptBeat> = serde_json::from_str(json)?;
    if beats.is_empty() {
        return Err(ProviderError::empty("script generation returned no scenes"));
    }
    Ok(beats)
}

/// Seconds to read `text` aloud at 150 words per minute.
pub fn reading_seconds(text: &str) -> f64 {
    let words = text.split_whitespace().count() as f64;
    words * 60.0 / WORDS_PER_MINUTE
}

/// Numbers beats into scenes. Non-positive estimates are replaced by the
/// reading-speed estimate so every scene starts with a usable duration.
pub fn beats_into_scenes(beats: Vec<ScriptBeat>) -> Vec<Scene> {
    beats
        .into_iter()
        .enumerate()
        .map(|(i, beat)| {
            let mut duration = beat.estimated_duration_seconds;
            if !duration.is_finite() || duration <= 0.0 {
                duration = reading_seconds(&beat.text);
            }
            Scene::new(i, beat.text, beat.visual_prompt, duration)
        })
        .collect()
}
