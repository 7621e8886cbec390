use crate::project::Scene;

pub const DEFAULT_SCENE_SECONDS: f64 = 5.0;

/// One subtitle cue on the cumulative timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Duration used for timing; unset, non-positive or non-finite estimates
/// count as five seconds.
pub fn effective_duration(scene: &Scene) -> f64 {
    let d = scene.estimated_duration_seconds;
    if d.is_finite() && d > 0.0 {
        d
    } else {
        DEFAULT_SCENE_SECONDS
    }
}

pub fn build_timeline(scenes: &[Scene]) -> Vec<Cue> {
    let mut cursor = 0.0;
    let mut cues = Vec::with_capacity(scenes.len());
    for (i, scene) in scenes.iter().enumerate() {
        let end = cursor + effective_duration(scene);
        cues.push(Cue {
            index: i,
            start: cursor,
            end,
            text: scene.narration_text.clone(),
        });
        cursor = end;
    }
    cues
}

pub fn total_duration(scenes: &[Scene]) -> f64 {
    scenes.iter().map(effective_duration).sum()
}

/// `HH:MM:SS,mmm`; hours are not wrapped at 24. Sub-millisecond parts are
/// truncated, so float drift can land one millisecond early.
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).floor() as u64;
    let ms = total_ms % 1000;
    let total_sec = total_ms / 1000;
    let s = total_sec % 60;
    let total_min = total_sec / 60;
    let m = total_min % 60;
    let h = total_min / 60;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

pub fn render_srt(scenes: &[Scene]) -> String {
    let mut out = String::new();
    for cue in build_timeline(scenes) {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            cue.index + 1,
            format_timestamp(cue.start),
            format_timestamp(cue.end),
            cue.text
        ));
    }
    out
}

pub fn render_transcript(scenes: &[Scene]) -> String {
    scenes
        .iter()
        .map(|s| s.narration_text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
