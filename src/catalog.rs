//! Static voice, music, style, language and duration catalogs.

use crate::project::StyleIntensity;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct VoiceProfile {
    pub id: &'static str,
    pub name: &'static str,
    pub gender: Gender,
    pub style: &'static str,
    /// Voice name understood by the speech provider.
    pub api_voice_name: &'static str,
    pub is_cloned: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MusicTrack {
    pub id: &'static str,
    pub name: &'static str,
    pub mood: &'static str,
    pub url: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct VisualStyle {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const PREBUILT_VOICES: &[VoiceProfile] = &[
    VoiceProfile { id: "v2", name: "Fenrir", gender: Gender::Male, style: "Deep, Narrative", api_voice_name: "Fenrir", is_cloned: false },
    VoiceProfile { id: "v3", name: "Puck", gender: Gender::Male, style: "Energetic, Clear", api_voice_name: "Puck", is_cloned: false },
    VoiceProfile { id: "v4", name: "Charon", gender: Gender::Male, style: "Deep, Authoritative", api_voice_name: "Charon", is_cloned: false },
    VoiceProfile { id: "v5", name: "Zephyr", gender: Gender::Female, style: "Balanced, Standard", api_voice_name: "Zephyr", is_cloned: false },
];

/// Profile selected after a voice sample upload. Cloning is simulated: the
/// narration is spoken by a stock provider voice.
pub static CLONED_VOICE: VoiceProfile = VoiceProfile {
    id: "cloned-1",
    name: "Custom Clone",
    gender: Gender::Male,
    style: "Matched from Audio",
    api_voice_name: "Fenrir",
    is_cloned: true,
};

pub const PREBUILT_MUSIC: &[MusicTrack] = &[
    MusicTrack { id: "m1", name: "Corporate Uplifting", mood: "Professional", url: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-1.mp3" },
    MusicTrack { id: "m2", name: "Cinematic Ambient", mood: "Emotional", url: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-10.mp3" },
    MusicTrack { id: "m3", name: "Tech Lo-Fi", mood: "Modern", url: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-8.mp3" },
    MusicTrack { id: "m4", name: "Dark Tension", mood: "Mystery", url: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-15.mp3" },
];

pub const VISUAL_STYLES: &[VisualStyle] = &[
    VisualStyle { id: "realistic-film", name: "Realistic Film", description: "Cinematic lighting, realistic textures" },
    VisualStyle { id: "3d-cartoon", name: "3D Cartoon", description: "Pixar-style animation, vibrant colors" },
    VisualStyle { id: "cinematic", name: "Cinematic Film", description: "Wide aspect ratio, dramatic lighting" },
    VisualStyle { id: "photographic", name: "Photographic", description: "High-res photography style" },
    VisualStyle { id: "fantasy", name: "Fantasy", description: "Magical atmosphere, soft glow" },
    VisualStyle { id: "futuristic", name: "Futuristic", description: "Sci-fi elements, neon lights" },
    VisualStyle { id: "sports-gaming", name: "Sports Gaming", description: "High energy, sharp focus" },
    VisualStyle { id: "portrait", name: "Portrait", description: "Focus on characters, shallow depth of field" },
    VisualStyle { id: "noir-comic", name: "Dark Comic / Noir", description: "High contrast, black and white accents" },
    VisualStyle { id: "modern-realism", name: "Modern Realism", description: "Clean lines, contemporary look" },
    VisualStyle { id: "biblical", name: "Biblical Style", description: "Epic scale, historical tones" },
    VisualStyle { id: "miniature", name: "Miniature World", description: "Tilt-shift effect, macro details" },
    VisualStyle { id: "clay-animation", name: "Clay Animation", description: "Stop motion look, clay textures" },
    VisualStyle { id: "90s-pixel", name: "90s Pixel Art", description: "Retro gaming aesthetic" },
    VisualStyle { id: "disney", name: "Disney Style", description: "Classic hand-drawn animation style" },
    VisualStyle { id: "anime", name: "Anime", description: "Japanese animation style" },
    VisualStyle { id: "jurassic", name: "Jurassic Theme", description: "Prehistoric nature, earthy tones" },
    VisualStyle { id: "clay-static", name: "Clay Style", description: "Artistic clay sculpture look" },
    VisualStyle { id: "epic-fantasy", name: "Epic Fantasy", description: "Grand landscapes, heroic lighting" },
    VisualStyle { id: "impressionist", name: "Impressionist", description: "Painterly strokes, light focus" },
    VisualStyle { id: "horror", name: "Horror", description: "Dark shadows, unsettling atmosphere" },
    VisualStyle { id: "cyberpunk", name: "Cyberpunk", description: "High tech, low life, neon colors" },
    VisualStyle { id: "neoclassical", name: "Neoclassical", description: "Elegant, classical art style" },
    VisualStyle { id: "prehistoric", name: "Prehistoric", description: "Raw nature, ancient setting" },
    VisualStyle { id: "roman-art", name: "Roman Art", description: "Mosaic and fresco styles" },
    VisualStyle { id: "bw-film", name: "B&W Film", description: "Classic noir, grainy texture" },
    VisualStyle { id: "comic", name: "Comic Style", description: "Bold outlines, comic book colors" },
];

pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "Español (Global)", "Español México", "Español España", "Español Latinoamérica",
    "Español Ecuador", "Español Colombia", "Español Argentina", "Español Chile",
    "Español Perú", "Español Venezuela",
    "English US", "English UK", "English Australia", "English Canada",
    "German", "French", "Italian", "Portuguese (Portugal)", "Portuguese (Brazil)",
    "Dutch", "Russian", "Ukrainian", "Japanese", "Korean", "Mandarin", "Cantonese",
    "Arabic", "Turkish", "Hindi", "Indonesian", "Vietnamese", "Hungarian", "Czech",
    "Polish", "Romanian", "Slovak",
];

pub const VIDEO_DURATIONS: &[&str] = &[
    "30s", "1min", "2min", "3min", "4min", "5min", "7min", "8min", "10min",
    "12min", "15min", "20min", "25min", "30min", "35min", "40min", "45min",
    "50min", "55min", "60min", "90min", "2h", "2h 30min",
];

/// Prebuilt voices plus the cloned profile.
pub fn voice_profile(id: &str) -> Option<&'static VoiceProfile> {
    if id == CLONED_VOICE.id {
        return Some(&CLONED_VOICE);
    }
    PREBUILT_VOICES.iter().find(|v| v.id == id)
}

/// Falls back to the first catalog voice for unknown ids.
pub fn voice_or_default(id: &str) -> &'static VoiceProfile {
    voice_profile(id).unwrap_or(&PREBUILT_VOICES[0])
}

pub fn voice_preview_text(voice: &VoiceProfile) -> String {
    format!(
        "Hello. This is a preview of the {} voice. I am ready to generate your faceless video narration.",
        voice.name
    )
}

pub fn music_track(id: &str) -> Option<&'static MusicTrack> {
    PREBUILT_MUSIC.iter().find(|m| m.id == id)
}

pub fn visual_style(id: &str) -> Option<&'static VisualStyle> {
    VISUAL_STYLES.iter().find(|s| s.id == id)
}

pub fn is_known_duration(bucket: &str) -> bool {
    VIDEO_DURATIONS.contains(&bucket)
}

pub fn is_supported_language(language: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&language)
}

/// Display names for the selected style ids; unknown ids are skipped.
pub fn style_names(ids: &[String]) -> Vec<&'static str> {
    ids.iter()
        .filter_map(|id| visual_style(id).map(|s| s.name))
        .collect()
}

/// Suffix appended to every image prompt, e.g.
/// `", Anime, Horror style, Extreme intensity"`. Empty with no styles.
pub fn style_suffix(ids: &[String], intensity: StyleIntensity) -> String {
    let names = style_names(ids);
    if names.is_empty() {
        return String::new();
    }
    format!(", {} style, {} intensity", names.join(", "), intensity.as_str())
}
