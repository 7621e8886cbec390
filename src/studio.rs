//! Session controller: owns the project record and drives each wizard step.

use crate::api::{ContentProvider, ScriptRequest, ScriptSource};
use crate::catalog::{self, VoiceProfile};
use crate::error::{StudioError, StudioResult};
use crate::export::{self, SubtitleFormat};
use crate::generator::{AssetJob, AssetPipeline, PassReport, PipelineSettings};
use crate::playback::Synchronizer;
use crate::project::{
    AssetRef, MoveDirection, MusicIntensity, MusicSelection, ProjectState, ProjectUpdate, Scene,
    Step,
};
use crate::script::beats_into_scenes;
use crate::srt::total_duration;
use crate::{logi, logok, logw};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::watch;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "ogg", "aac"];

/// Rejects anything that is not a non-empty file with an audio extension.
async fn check_audio_upload(path: &Path) -> StudioResult<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        return Err(StudioError::upload(format!(
            "{} is not a supported audio file",
            path.display()
        )));
    }

    let meta = fs::metadata(path)
        .await
        .map_err(|e| StudioError::upload(format!("{}: {e}", path.display())))?;
    if !meta.is_file() || meta.len() == 0 {
        return Err(StudioError::upload(format!("{} is empty", path.display())));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptMode {
    #[default]
    Generate,
    Paste,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportPaths {
    pub srt: PathBuf,
    pub txt: PathBuf,
    pub snapshot: PathBuf,
}

pub struct Studio {
    state: ProjectState,
    step: Step,
    provider: Arc<dyn ContentProvider>,
    pipeline: AssetPipeline,
    board: watch::Sender<Vec<Scene>>,
    playback: Synchronizer,
}

impl Studio {
    pub fn new(provider: Arc<dyn ContentProvider>, settings: PipelineSettings) -> Self {
        let state = ProjectState::default();
        let (board, _) = watch::channel(state.scenes.clone());
        Self {
            pipeline: AssetPipeline::new(provider.clone(), settings),
            provider,
            playback: Synchronizer::new(&state.scenes),
            state,
            step: Step::Script,
            board,
        }
    }

    pub fn state(&self) -> &ProjectState {
        &self.state
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn playback(&self) -> &Synchronizer {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut Synchronizer {
        &mut self.playback
    }

    /// Live view of the scene list, updated after every generated asset.
    pub fn subscribe_scenes(&self) -> watch::Receiver<Vec<Scene>> {
        self.board.subscribe()
    }

    /// Merges `update` into the project and keeps the scene board and the
    /// preview player in step with it.
    pub fn apply(&mut self, update: ProjectUpdate) -> &ProjectState {
        let scenes_changed = update.scenes.is_some();
        let music_changed = update.selected_music.is_some();
        let intensity = update.bg_music_intensity;

        self.state = self.state.merged(update);

        if scenes_changed {
            self.board.send_replace(self.state.scenes.clone());
            self.playback.set_scenes(&self.state.scenes);
        }
        if music_changed {
            self.playback
                .set_music(self.music_source(), self.state.bg_music_intensity);
        } else if let Some(intensity) = intensity {
            self.playback.set_music_intensity(intensity);
        }
        &self.state
    }

    pub fn navigate(&mut self, target: Step) -> StudioResult<()> {
        if !self.state.can_navigate(target) {
            return Err(StudioError::NavigationBlocked(target.to_string()));
        }
        self.step = target;
        Ok(())
    }

    pub fn toggle_style(&mut self, style_id: &str) -> &[String] {
        let styles = self.state.toggled_styles(style_id);
        self.apply(ProjectUpdate {
            selected_styles: Some(styles),
            ..Default::default()
        });
        &self.state.selected_styles
    }

    pub fn select_voice(&mut self, voice_id: &str) {
        self.apply(ProjectUpdate {
            selected_voice_id: Some(voice_id.to_string()),
            ..Default::default()
        });
    }

    /// Speaks a short sample in the given voice. Provider failures are
    /// returned to the caller.
    pub async fn preview_voice(&self, voice_id: &str) -> StudioResult<AssetRef> {
        let voice = catalog::voice_profile(voice_id)
            .ok_or_else(|| StudioError::validation(format!("unknown voice {voice_id}")))?;
        logi(format!("Previewing voice {} ({})", voice.name, voice.api_voice_name));
        let audio = self
            .provider
            .generate_speech(&catalog::voice_preview_text(voice), voice.api_voice_name)
            .await?;
        Ok(audio)
    }

    /// Takes a voice sample and selects the cloned profile.
    pub async fn clone_voice(&mut self, sample: &Path) -> StudioResult<&'static VoiceProfile> {
        check_audio_upload(sample).await?;
        let profile = &catalog::CLONED_VOICE;
        self.select_voice(profile.id);
        logok(format!("Voice sample accepted: {}", sample.display()));
        Ok(profile)
    }

    pub fn select_music(&mut self, selection: Option<MusicSelection>) -> StudioResult<()> {
        if let Some(MusicSelection::Prebuilt { track_id }) = &selection {
            if catalog::music_track(track_id).is_none() {
                return Err(StudioError::validation(format!("unknown music track {track_id}")));
            }
        }
        self.apply(ProjectUpdate {
            selected_music: Some(selection),
            ..Default::default()
        });
        Ok(())
    }

    /// Validates a user-supplied music file and selects it.
    pub async fn upload_custom_music(&mut self, path: &Path) -> StudioResult<()> {
        check_audio_upload(path).await?;
        logok(format!("Custom music selected: {}", path.display()));
        self.select_music(Some(MusicSelection::Custom {
            path: path.to_path_buf(),
        }))
    }

    pub fn set_music_intensity(&mut self, intensity: MusicIntensity) {
        self.apply(ProjectUpdate {
            bg_music_intensity: Some(intensity),
            ..Default::default()
        });
    }

    /// Playable location of the selected music bed.
    pub fn music_source(&self) -> Option<String> {
        match self.state.selected_music.as_ref()? {
            MusicSelection::Prebuilt { track_id } => {
                catalog::music_track(track_id).map(|t| t.url.to_string())
            }
            MusicSelection::Custom { path } => Some(path.display().to_string()),
        }
    }

    pub async fn generate_script(&mut self, mode: ScriptMode) -> StudioResult<usize> {
        let source = match mode {
            ScriptMode::Generate if self.state.topic.trim().is_empty() => {
                return Err(StudioError::validation("topic is empty"));
            }
            ScriptMode::Paste if self.state.raw_script.trim().is_empty() => {
                return Err(StudioError::validation("script is empty"));
            }
            ScriptMode::Generate => ScriptSource::Topic(self.state.topic.clone()),
            ScriptMode::Paste => ScriptSource::RawScript(self.state.raw_script.clone()),
        };

        if !catalog::is_known_duration(&self.state.target_duration) {
            logw(format!("Unlisted duration bucket: {}", self.state.target_duration));
        }
        if !catalog::is_supported_language(&self.state.language) {
            logw(format!("Unlisted language: {}", self.state.language));
        }

        let request = ScriptRequest {
            source,
            language: self.state.language.clone(),
            style_names: catalog::style_names(&self.state.selected_styles)
                .into_iter()
                .map(str::to_string)
                .collect(),
            style_intensity: self.state.style_intensity,
            duration_target: self.state.target_duration.clone(),
        };

        logi(format!(
            "Requesting script ({} / {} / {})",
            self.state.language,
            self.state.target_duration,
            self.state.target_ratio.as_str()
        ));
        let beats = self.provider.generate_script(&request).await.map_err(|e| {
            logw(format!("Script generation failed: {}", e));
            StudioError::from(e)
        })?;

        let scenes = beats_into_scenes(beats);
        let count = scenes.len();
        self.apply(ProjectUpdate::scenes(scenes));
        logok(format!(
            "Script ready: {} scenes (~{:.0}s)",
            count,
            total_duration(&self.state.scenes)
        ));
        Ok(count)
    }

    pub fn asset_job(&self) -> AssetJob {
        AssetJob {
            voice_id: catalog::voice_or_default(&self.state.selected_voice_id)
                .api_voice_name
                .to_string(),
            style_suffix: catalog::style_suffix(&self.state.selected_styles, self.state.style_intensity),
            ratio: self.state.target_ratio,
        }
    }

    /// Runs one asset pass over the current scenes. Calling it again after a
    /// partial failure retries only what is still missing.
    pub async fn generate_assets(&mut self) -> StudioResult<PassReport> {
        if self.state.scenes.is_empty() {
            return Err(StudioError::validation("no scenes to produce"));
        }
        let job = self.asset_job();
        let report = self
            .pipeline
            .run_pass(self.state.scenes.clone(), &job, &self.board)
            .await
            .ok_or(StudioError::GenerationInProgress)?;

        self.apply(ProjectUpdate::scenes(report.scenes.clone()));
        Ok(report)
    }

    pub fn move_scene(&mut self, index: usize, direction: MoveDirection) {
        let Some(scenes) = self.state.moved_scene(index, direction) else {
            return;
        };
        let active = self.playback.active_index();
        let target = match direction {
            MoveDirection::Up => index - 1,
            MoveDirection::Down => index + 1,
        };
        // the player follows the scene it was on
        if active == index {
            self.playback.follow_scene(target);
        } else if active == target {
            self.playback.follow_scene(index);
        }
        self.apply(ProjectUpdate::scenes(scenes));
    }

    pub fn edit_scene_text(&mut self, index: usize, text: &str) -> StudioResult<()> {
        let scenes = self.state.with_scene_text(index, text)?;
        self.apply(ProjectUpdate::scenes(scenes));
        Ok(())
    }

    pub fn edit_scene_duration(&mut self, index: usize, seconds: f64) -> StudioResult<()> {
        let scenes = self.state.with_scene_duration(index, seconds)?;
        self.apply(ProjectUpdate::scenes(scenes));
        Ok(())
    }

    /// Writes `subtitles.srt`, `subtitles.txt` and the project snapshot.
    pub async fn export(&self, dir: &Path) -> anyhow::Result<ExportPaths> {
        let srt = export::write_subtitles(&dir.join("subtitles"), &self.state, SubtitleFormat::Srt).await?;
        let txt = export::write_subtitles(&dir.join("subtitles"), &self.state, SubtitleFormat::Txt).await?;
        let snapshot = export::write_snapshot(&dir.join("projects"), &self.state).await?;
        Ok(ExportPaths { srt, txt, snapshot })
    }
}
