//! Preview playback: narration advances scene by scene while a looping music
//! bed plays underneath at the configured ducking level.
//!
//! The synchronizer only tracks what each channel should be doing; a
//! renderer applies `narration()` / `music()` to real audio outputs and feeds
//! back `narration_ended` and `time_update` events.

use crate::project::{AssetRef, MusicIntensity, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    PlayingScene(usize),
    Paused,
    Finished,
}

/// State of one audio output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Channel {
    pub source: Option<String>,
    pub position: f64,
    pub playing: bool,
    pub looping: bool,
    pub volume: f32,
}

impl Channel {
    fn load(&mut self, source: Option<String>) {
        self.source = source;
        self.position = 0.0;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn rewind(&mut self) {
        self.position = 0.0;
    }
}

pub fn music_volume(intensity: MusicIntensity) -> f32 {
    match intensity {
        MusicIntensity::Low => 0.1,
        MusicIntensity::Medium => 0.25,
        MusicIntensity::High => 0.5,
        MusicIntensity::Unrecognized => 0.2,
    }
}

#[derive(Debug, Clone, Default)]
pub struct Synchronizer {
    state: PlaybackState,
    active: usize,
    scene_audio: Vec<Option<AssetRef>>,
    narration: Channel,
    music: Channel,
    progress: f64,
}

impl Synchronizer {
    pub fn new(scenes: &[Scene]) -> Self {
        let mut sync = Self {
            music: Channel {
                looping: true,
                volume: music_volume(MusicIntensity::default()),
                ..Default::default()
            },
            narration: Channel {
                volume: 1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        sync.set_scenes(scenes);
        sync
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn narration(&self) -> &Channel {
        &self.narration
    }

    pub fn music(&self) -> &Channel {
        &self.music
    }

    /// Percentage through the active narration track.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::PlayingScene(_))
    }

    /// Picks up edited scenes. The active index is clamped and the
    /// narration source reloaded only if it changed.
    pub fn set_scenes(&mut self, scenes: &[Scene]) {
        self.scene_audio = scenes.iter().map(|s| s.audio_asset.clone()).collect();
        if self.active >= self.scene_audio.len() {
            self.active = self.scene_audio.len().saturating_sub(1);
        }
        let source = self.active_source();
        if self.narration.source != source {
            self.narration.load(source);
            self.progress = 0.0;
        }
        if let PlaybackState::PlayingScene(_) = self.state {
            self.state = PlaybackState::PlayingScene(self.active);
        }
    }

    /// Replaces the music bed (or removes it with `None`) and reapplies loop
    /// and volume. The new source starts from the top and only plays if
    /// narration is playing.
    pub fn set_music(&mut self, source: Option<String>, intensity: MusicIntensity) {
        self.music.load(source);
        self.music.looping = true;
        self.music.volume = music_volume(intensity);
        self.music.playing = self.is_playing() && self.music.source.is_some();
    }

    pub fn set_music_intensity(&mut self, intensity: MusicIntensity) {
        self.music.volume = music_volume(intensity);
    }

    pub fn play(&mut self) {
        if self.scene_audio.is_empty() || self.is_playing() {
            return;
        }
        if self.narration.source.is_none() {
            self.narration.load(self.active_source());
        }
        self.narration.playing = true;
        if self.music.source.is_some() {
            self.music.playing = true;
        }
        self.state = PlaybackState::PlayingScene(self.active);
    }

    pub fn pause(&mut self) {
        if !self.is_playing() {
            return;
        }
        self.narration.pause();
        self.music.pause();
        self.state = PlaybackState::Paused;
    }

    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// The active narration track reached its end.
    pub fn narration_ended(&mut self) {
        let PlaybackState::PlayingScene(i) = self.state else {
            return;
        };

        if i + 1 >= self.scene_audio.len() {
            self.narration.pause();
            self.music.pause();
            self.music.rewind();
            self.active = 0;
            self.narration.load(self.active_source());
            self.state = PlaybackState::Finished;
        } else {
            self.active = i + 1;
            self.narration.load(self.active_source());
            self.narration.playing = true;
            self.state = PlaybackState::PlayingScene(self.active);
        }
        self.progress = 0.0;
    }

    /// Jumps to scene `index`, pausing everything and rewinding the music bed.
    /// Out-of-range indices are ignored.
    pub fn select_scene(&mut self, index: usize) {
        if index >= self.scene_audio.len() {
            return;
        }
        self.active = index;
        self.narration.pause();
        self.narration.load(self.active_source());
        self.music.pause();
        self.music.rewind();
        self.progress = 0.0;
        self.state = PlaybackState::Paused;
    }

    /// Position report from the narration output. A missing or zero
    /// duration counts as one second; an unbounded stream reports 0.
    /// Progress stays within 0..=100.
    pub fn time_update(&mut self, current: f64, duration: Option<f64>) -> f64 {
        let progress = match duration {
            Some(d) if d.is_infinite() => 0.0,
            Some(d) if d.is_finite() && d > 0.0 => current / d * 100.0,
            _ => current * 100.0,
        };
        self.narration.position = current;
        self.progress = if progress.is_finite() {
            progress.clamp(0.0, 100.0)
        } else {
            0.0
        };
        self.progress
    }

    /// Re-points the player at `index` after the active scene changed
    /// position in the list. Play/pause state and the music bed are kept;
    /// the next `set_scenes` reloads narration only if the source differs.
    pub fn follow_scene(&mut self, index: usize) {
        if index >= self.scene_audio.len() {
            return;
        }
        self.active = index;
        if let PlaybackState::PlayingScene(_) = self.state {
            self.state = PlaybackState::PlayingScene(index);
        }
    }

    /// Position report from the music output.
    pub fn music_time_update(&mut self, current: f64) {
        self.music.position = current;
    }

    fn active_source(&self) -> Option<String> {
        self.scene_audio
            .get(self.active)
            .cloned()
            .flatten()
            .map(|a| a.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenes(n: usize) -> Vec<Scene> {
        (0..n)
            .map(|i| {
                let mut s = Scene::new(i, format!("line {i}"), "", 2.0);
                s.audio_asset = Some(AssetRef::new(format!("aud-{i}")));
                s
            })
            .collect()
    }

    fn playing_with_music(n: usize) -> Synchronizer {
        let mut sync = Synchronizer::new(&scenes(n));
        sync.set_music(Some("bed.mp3".into()), MusicIntensity::High);
        sync.play();
        sync
    }

    #[test]
    fn play_starts_narration_and_music() {
        let sync = playing_with_music(3);
        assert_eq!(sync.state(), PlaybackState::PlayingScene(0));
        assert!(sync.narration().playing);
        assert_eq!(sync.narration().source.as_deref(), Some("aud-0"));
        assert!(sync.music().playing);
        assert!(sync.music().looping);
        assert_eq!(sync.music().volume, 0.5);
    }

    #[test]
    fn ending_a_middle_scene_advances_without_touching_music() {
        let mut sync = playing_with_music(3);
        sync.music_time_update(4.2);

        sync.narration_ended();

        assert_eq!(sync.state(), PlaybackState::PlayingScene(1));
        assert_eq!(sync.active_index(), 1);
        assert_eq!(sync.narration().source.as_deref(), Some("aud-1"));
        assert!(sync.narration().playing);
        assert!(sync.music().playing);
        assert_eq!(sync.music().position, 4.2);
    }

    #[test]
    fn ending_the_last_scene_finishes_and_resets() {
        let mut sync = playing_with_music(2);
        sync.narration_ended();
        sync.music_time_update(9.0);
        sync.narration_ended();

        assert_eq!(sync.state(), PlaybackState::Finished);
        assert_eq!(sync.active_index(), 0);
        assert!(!sync.narration().playing);
        assert!(!sync.music().playing);
        assert_eq!(sync.music().position, 0.0);
    }

    #[test]
    fn selecting_a_scene_always_rewinds_music() {
        for start_playing in [true, false] {
            let mut sync = playing_with_music(3);
            if !start_playing {
                sync.pause();
            }
            sync.music_time_update(12.5);

            sync.select_scene(2);

            assert_eq!(sync.state(), PlaybackState::Paused);
            assert_eq!(sync.active_index(), 2);
            assert_eq!(sync.music().position, 0.0);
            assert!(!sync.music().playing);
            assert_eq!(sync.narration().source.as_deref(), Some("aud-2"));
        }
    }

    #[test]
    fn pause_keeps_positions_and_resume_continues() {
        let mut sync = playing_with_music(2);
        sync.time_update(1.5, Some(3.0));
        sync.music_time_update(7.0);

        sync.pause();
        assert_eq!(sync.state(), PlaybackState::Paused);
        assert!(!sync.narration().playing && !sync.music().playing);
        assert_eq!(sync.narration().position, 1.5);

        sync.toggle();
        assert_eq!(sync.state(), PlaybackState::PlayingScene(0));
        assert_eq!(sync.narration().position, 1.5);
        assert_eq!(sync.music().position, 7.0);
    }

    #[test]
    fn progress_treats_unknown_duration_as_one() {
        let mut sync = playing_with_music(1);
        assert_eq!(sync.time_update(1.5, Some(3.0)), 50.0);
        assert_eq!(sync.time_update(0.25, None), 25.0);
        assert_eq!(sync.time_update(0.5, Some(0.0)), 50.0);
        assert_eq!(sync.progress(), 50.0);
    }

    #[test]
    fn progress_is_clamped_for_streams_and_overruns() {
        let mut sync = playing_with_music(1);
        assert_eq!(sync.time_update(7.0, Some(f64::INFINITY)), 0.0);
        assert_eq!(sync.time_update(7.0, None), 100.0);
        assert_eq!(sync.time_update(3.5, Some(3.0)), 100.0);
        assert_eq!(sync.time_update(f64::NAN, Some(3.0)), 0.0);
    }

    #[test]
    fn following_a_moved_scene_keeps_playing() {
        let mut sync = playing_with_music(3);
        sync.music_time_update(20.0);

        sync.follow_scene(1);

        assert_eq!(sync.state(), PlaybackState::PlayingScene(1));
        assert_eq!(sync.active_index(), 1);
        assert!(sync.music().playing);
        assert_eq!(sync.music().position, 20.0);

        sync.follow_scene(5);
        assert_eq!(sync.active_index(), 1);
    }

    #[test]
    fn no_music_selected_plays_narration_only() {
        let mut sync = Synchronizer::new(&scenes(2));
        sync.play();
        assert!(sync.narration().playing);
        assert!(!sync.music().playing);
    }

    #[test]
    fn swapping_music_reapplies_configuration() {
        let mut sync = playing_with_music(2);
        sync.music_time_update(30.0);

        sync.set_music(Some("custom.wav".into()), MusicIntensity::Low);
        assert_eq!(sync.music().source.as_deref(), Some("custom.wav"));
        assert_eq!(sync.music().position, 0.0);
        assert_eq!(sync.music().volume, 0.1);
        assert!(sync.music().looping);
        assert!(sync.music().playing);

        sync.set_music(None, MusicIntensity::Low);
        assert!(!sync.music().playing);
    }

    #[test]
    fn intensity_labels_map_to_volumes() {
        assert_eq!(music_volume(MusicIntensity::from_label("Medium")), 0.25);
        assert_eq!(music_volume(MusicIntensity::from_label("Loud")), 0.2);
    }

    #[test]
    fn shrinking_scene_list_clamps_active_index() {
        let mut sync = Synchronizer::new(&scenes(3));
        sync.select_scene(2);
        sync.set_scenes(&scenes(1));
        assert_eq!(sync.active_index(), 0);
        assert_eq!(sync.narration().source.as_deref(), Some("aud-0"));
    }
}
