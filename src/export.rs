use crate::logok;
use crate::project::ProjectState;
use crate::srt::{render_srt, render_transcript};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub const SNAPSHOT_EXTENSION: &str = "afve";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Srt,
    Txt,
}

impl SubtitleFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Txt => "txt",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub exported_at: DateTime<Utc>,
    #[serde(flatten)]
    pub project: ProjectState,
}

/// `project-<first ten characters of the topic>.afve`, with path separators
/// replaced.
pub fn snapshot_file_name(topic: &str) -> String {
    let stem: String = topic
        .chars()
        .take(10)
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("project-{stem}.{SNAPSHOT_EXTENSION}")
}

pub fn render_subtitles(state: &ProjectState, format: SubtitleFormat) -> String {
    match format {
        SubtitleFormat::Srt => render_srt(&state.scenes),
        SubtitleFormat::Txt => render_transcript(&state.scenes),
    }
}

pub fn render_snapshot(state: &ProjectState) -> Result<String> {
    let snapshot = ProjectSnapshot {
        exported_at: Utc::now(),
        project: state.clone(),
    };
    serde_json::to_string_pretty(&snapshot).context("Failed to serialize project snapshot")
}

async fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create dir {}", parent.display()))?;
    }
    let mut out = fs::File::create(path)
        .await
        .with_context(|| format!("create export: {}", path.display()))?;
    out.write_all(data).await?;
    out.flush().await?;
    Ok(())
}

pub async fn write_subtitles(dir: &Path, state: &ProjectState, format: SubtitleFormat) -> Result<PathBuf> {
    let path = dir.join(format!("subtitles.{}", format.extension()));
    write_file(&path, render_subtitles(state, format).as_bytes()).await?;
    logok(format!("Wrote subtitles: {}", path.display()));
    Ok(path)
}

pub async fn write_snapshot(dir: &Path, state: &ProjectState) -> Result<PathBuf> {
    let path = dir.join(snapshot_file_name(&state.topic));
    write_file(&path, render_snapshot(state)?.as_bytes()).await?;
    logok(format!("Wrote project snapshot: {}", path.display()));
    Ok(path)
}

pub async fn load_snapshot(path: &Path) -> Result<ProjectSnapshot> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("read snapshot: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parse snapshot: {}", path.display()))
}
