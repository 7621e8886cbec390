use crate::error::{StudioError, StudioResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const MAX_SELECTED_STYLES: usize = 3;

/// Opaque reference to a generated asset: a remote URL or a `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(pub String);

impl AssetRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Landscape,
    #[default]
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum MusicIntensity {
    Low,
    #[default]
    Medium,
    High,
    /// Label not in the list above, e.g. from a hand-edited snapshot.
    Unrecognized,
}

impl MusicIntensity {
    pub fn from_label(label: &str) -> Self {
        match label {
            "Low" => MusicIntensity::Low,
            "Medium" => MusicIntensity::Medium,
            "High" => MusicIntensity::High,
            _ => MusicIntensity::Unrecognized,
        }
    }
}

impl From<String> for MusicIntensity {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StyleIntensity {
    Soft,
    #[default]
    Medium,
    Extreme,
}

impl StyleIntensity {
    pub fn as_str(self) -> &'static str {
        match self {
            StyleIntensity::Soft => "Soft",
            StyleIntensity::Medium => "Medium",
            StyleIntensity::Extreme => "Extreme",
        }
    }
}

/// Background music choice: a catalog track or a user-supplied file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MusicSelection {
    Prebuilt { track_id: String },
    Custom { path: PathBuf },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub index: usize,
    pub narration_text: String,
    pub visual_prompt: String,
    pub estimated_duration_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_asset: Option<AssetRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_asset: Option<AssetRef>,
    #[serde(skip)]
    pub image_pending: bool,
    #[serde(skip)]
    pub audio_pending: bool,
}

impl Scene {
    pub fn new(
        index: usize,
        narration_text: impl Into<String>,
        visual_prompt: impl Into<String>,
        estimated_duration_seconds: f64,
    ) -> Self {
        Self {
            index,
            narration_text: narration_text.into(),
            visual_prompt: visual_prompt.into(),
            estimated_duration_seconds,
            ..Default::default()
        }
    }

    pub fn is_production_complete(&self) -> bool {
        self.image_asset.is_some() && self.audio_asset.is_some()
    }

    pub fn needs_assets(&self) -> bool {
        !self.is_production_complete()
    }
}

/// The wizard steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Step {
    #[default]
    Script,
    Voice,
    Visuals,
    Preview,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Script => "SCRIPT",
            Step::Voice => "VOICE",
            Step::Visuals => "VISUALS",
            Step::Preview => "PREVIEW",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectState {
    #[serde(default)]
    pub version: u64,
    pub topic: String,
    pub raw_script: String,
    pub language: String,
    pub target_ratio: AspectRatio,
    pub target_duration: String,
    pub scenes: Vec<Scene>,
    pub selected_voice_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_music: Option<MusicSelection>,
    pub bg_music_intensity: MusicIntensity,
    pub selected_styles: Vec<String>,
    pub style_intensity: StyleIntensity,
}

impl Default for ProjectState {
    fn default() -> Self {
        Self {
            version: 0,
            topic: String::new(),
            raw_script: String::new(),
            language: "English US".to_string(),
            target_ratio: AspectRatio::default(),
            target_duration: "1min".to_string(),
            scenes: Vec::new(),
            selected_voice_id: String::new(),
            selected_music: None,
            bg_music_intensity: MusicIntensity::default(),
            selected_styles: Vec::new(),
            style_intensity: StyleIntensity::default(),
        }
    }
}

/// Partial update: every `Some` field replaces the matching project field,
/// everything else is left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectUpdate {
    pub topic: Option<String>,
    pub raw_script: Option<String>,
    pub language: Option<String>,
    pub target_ratio: Option<AspectRatio>,
    pub target_duration: Option<String>,
    pub scenes: Option<Vec<Scene>>,
    pub selected_voice_id: Option<String>,
    pub selected_music: Option<Option<MusicSelection>>,
    pub bg_music_intensity: Option<MusicIntensity>,
    pub selected_styles: Option<Vec<String>>,
    pub style_intensity: Option<StyleIntensity>,
}

impl ProjectUpdate {
    pub fn scenes(scenes: Vec<Scene>) -> Self {
        Self {
            scenes: Some(scenes),
            ..Default::default()
        }
    }
}

impl ProjectState {
    /// Shallow-merges `update` and returns the new state. The version is
    /// bumped even when the update names no fields.
    pub fn merged(&self, update: ProjectUpdate) -> ProjectState {
        let mut next = self.clone();
        if let Some(v) = update.topic {
            next.topic = v;
        }
        if let Some(v) = update.raw_script {
            next.raw_script = v;
        }
        if let Some(v) = update.language {
            next.language = v;
        }
        if let Some(v) = update.target_ratio {
            next.target_ratio = v;
        }
        if let Some(v) = update.target_duration {
            next.target_duration = v;
        }
        if let Some(v) = update.scenes {
            next.scenes = v;
        }
        if let Some(v) = update.selected_voice_id {
            next.selected_voice_id = v;
        }
        if let Some(v) = update.selected_music {
            next.selected_music = v;
        }
        if let Some(v) = update.bg_music_intensity {
            next.bg_music_intensity = v;
        }
        if let Some(v) = update.selected_styles {
            next.selected_styles = v;
        }
        if let Some(v) = update.style_intensity {
            next.style_intensity = v;
        }
        next.version = self.version + 1;
        next
    }

    pub fn all_scenes_complete(&self) -> bool {
        !self.scenes.is_empty() && self.scenes.iter().all(Scene::is_production_complete)
    }

    pub fn can_navigate(&self, target: Step) -> bool {
        match target {
            Step::Script => true,
            Step::Voice => !self.scenes.is_empty(),
            Step::Visuals => !self.scenes.is_empty() && !self.selected_voice_id.is_empty(),
            Step::Preview => self.all_scenes_complete(),
        }
    }

    /// Removes `style_id` if selected, otherwise appends it while fewer than
    /// three styles are selected. Returns the resulting selection.
    pub fn toggled_styles(&self, style_id: &str) -> Vec<String> {
        let mut styles = self.selected_styles.clone();
        if let Some(pos) = styles.iter().position(|s| s == style_id) {
            styles.remove(pos);
        } else if styles.len() < MAX_SELECTED_STYLES {
            styles.push(style_id.to_string());
        }
        styles
    }

    /// Swaps the scene at `index` with its neighbour. Moving past either end
    /// returns `None`.
    pub fn moved_scene(&self, index: usize, direction: MoveDirection) -> Option<Vec<Scene>> {
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1)?,
            MoveDirection::Down => index + 1,
        };
        if index >= self.scenes.len() || target >= self.scenes.len() {
            return None;
        }

        let mut scenes = self.scenes.clone();
        scenes.swap(index, target);
        renumber(&mut scenes);
        Some(scenes)
    }

    pub fn with_scene_text(&self, index: usize, text: &str) -> StudioResult<Vec<Scene>> {
        let mut scenes = self.scenes.clone();
        let scene = scenes
            .get_mut(index)
            .ok_or_else(|| StudioError::validation(format!("no scene at index {index}")))?;
        scene.narration_text = text.to_string();
        Ok(scenes)
    }

    pub fn with_scene_duration(&self, index: usize, seconds: f64) -> StudioResult<Vec<Scene>> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(StudioError::validation(format!(
                "scene duration must be positive, got {seconds}"
            )));
        }
        let mut scenes = self.scenes.clone();
        let scene = scenes
            .get_mut(index)
            .ok_or_else(|| StudioError::validation(format!("no scene at index {index}")))?;
        scene.estimated_duration_seconds = seconds;
        Ok(scenes)
    }
}

pub(crate) fn renumber(scenes: &mut [Scene]) {
    for (i, scene) in scenes.iter_mut().enumerate() {
        scene.index = i;
    }
}
