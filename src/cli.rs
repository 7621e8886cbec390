use anyhow::{Context, Result};
use faceless_engine::api::gemini::GeminiClient;
use faceless_engine::config::Config;
use faceless_engine::generator::PipelineSettings;
use faceless_engine::init;
use faceless_engine::project::{ProjectUpdate, Step};
use faceless_engine::studio::{ScriptMode, Studio};
use std::sync::Arc;
use tracing::{info, warn};

const MAX_ASSET_PASSES: usize = 2;

async fn run_production() -> Result<i32> {
    let cfg = Config::load("config.json").await?;
    init::ensure_directories(&cfg.export_dir).await?;

    let request_text = tokio::fs::read_to_string("project.json")
        .await
        .context("Failed to read project.json")?;
    let request: ProjectUpdate =
        serde_json::from_str(&request_text).context("project.json: invalid project request")?;

    let settings = PipelineSettings::from_config(&cfg);
    let export_dir = cfg.export_dir.clone();
    let provider = Arc::new(GeminiClient::new(cfg)?);
    let mut studio = Studio::new(provider, settings);
    studio.apply(request);

    let mode = if studio.state().raw_script.trim().is_empty() {
        ScriptMode::Generate
    } else {
        ScriptMode::Paste
    };
    let scenes = studio.generate_script(mode).await?;
    info!("Script has {} scenes", scenes);

    studio.navigate(Step::Voice)?;
    studio.navigate(Step::Visuals)?;

    for pass in 1..=MAX_ASSET_PASSES {
        let report = studio.generate_assets().await?;
        if report.complete() {
            break;
        }
        warn!("Pass {} left {} scenes incomplete", pass, report.scenes.iter().filter(|s| s.needs_assets()).count());
    }

    if studio.navigate(Step::Preview).is_err() {
        warn!("Some scenes are still missing assets; exporting what exists");
    }

    let paths = studio.export(&export_dir).await?;
    info!(
        "Exported {} / {} / {}",
        paths.srt.display(),
        paths.txt.display(),
        paths.snapshot.display()
    );

    Ok(if studio.state().all_scenes_complete() { 0 } else { 2 })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let code = run_production().await?;
    std::process::exit(code);
}
