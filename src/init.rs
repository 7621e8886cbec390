use crate::logi;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

const EXPORT_SUBDIRS: &[&str] = &["subtitles", "projects"];

pub async fn ensure_directories(export_dir: &Path) -> Result<()> {
    for sub in std::iter::once("").chain(EXPORT_SUBDIRS.iter().copied()) {
        let dir = export_dir.join(sub);
        if !fs::try_exists(&dir).await.unwrap_or(false) {
            fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            logi(format!("Created directory: {}", dir.display()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_export_tree_once() {
        let root = tempfile::tempdir().unwrap();
        let exports = root.path().join("exports");

        ensure_directories(&exports).await.unwrap();
        ensure_directories(&exports).await.unwrap();

        assert!(exports.join("subtitles").is_dir());
        assert!(exports.join("projects").is_dir());
    }
}
