use crate::api::ContentProvider;
use crate::config::{Config, FallbackTrigger};
use crate::project::{AspectRatio, AssetRef, Scene};
use crate::retry::{RetryPolicy, placeholder_image, retry_on_rate_limit};
use crate::{logi, logok, logw};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub backoff: Duration,
    pub throttle: Duration,
    pub fallback: FallbackTrigger,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            backoff: Duration::from_millis(3000),
            throttle: Duration::from_millis(1500),
            fallback: FallbackTrigger::AnyFailure,
        }
    }
}

impl PipelineSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            backoff: cfg.backoff(),
            throttle: cfg.throttle(),
            fallback: cfg.image_fallback,
        }
    }
}

/// Per-pass inputs shared by every scene.
#[derive(Debug, Clone)]
pub struct AssetJob {
    pub voice_id: String,
    pub style_suffix: String,
    pub ratio: AspectRatio,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    pub images_generated: usize,
    pub placeholders_used: usize,
    pub images_missing: usize,
    pub audio_generated: usize,
    pub audio_failed: usize,
    pub scenes: Vec<Scene>,
}

impl PassReport {
    pub fn complete(&self) -> bool {
        self.scenes.iter().all(Scene::is_production_complete)
    }
}

enum ImageOutcome {
    Generated(AssetRef),
    Placeholder(AssetRef),
    Missing,
}

struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Fills missing scene images and narration, one provider call at a time.
pub struct AssetPipeline {
    provider: Arc<dyn ContentProvider>,
    settings: PipelineSettings,
    running: AtomicBool,
}

impl AssetPipeline {
    pub fn new(provider: Arc<dyn ContentProvider>, settings: PipelineSettings) -> Self {
        Self {
            provider,
            settings,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn try_begin(&self) -> Option<RunningGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RunningGuard(&self.running))
    }

    /// Visits every scene once, in order, generating only the assets that are
    /// missing. Each change publishes a full snapshot on `board`. Provider
    /// failures never escape: images fall back to a placeholder, narration
    /// failures leave the scene without audio.
    ///
    /// Returns `None` without touching anything if a pass is already running.
    pub async fn run_pass(
        &self,
        scenes: Vec<Scene>,
        job: &AssetJob,
        board: &watch::Sender<Vec<Scene>>,
    ) -> Option<PassReport> {
        let _guard = self.try_begin()?;

        let mut scenes = scenes;
        for scene in scenes.iter_mut() {
            scene.image_pending = false;
            scene.audio_pending = false;
        }
        board.send_replace(scenes.clone());

        let pending = scenes.iter().filter(|s| s.needs_assets()).count();
        logi(format!("Asset pass: {} of {} scenes need assets", pending, scenes.len()));

        let mut report = PassReport::default();
        let total = scenes.len();

        for i in 0..total {
            if !scenes[i].needs_assets() {
                continue;
            }

            scenes[i].image_pending = scenes[i].image_asset.is_none();
            scenes[i].audio_pending = scenes[i].audio_asset.is_none();
            board.send_replace(scenes.clone());

            if scenes[i].image_asset.is_none() {
                let prompt = format!("{}{}", scenes[i].visual_prompt, job.style_suffix);
                logi(format!("Image scene {}/{}", i + 1, total));
                let outcome = self.resolve_image(&prompt, job.ratio).await;
                let generated = matches!(outcome, ImageOutcome::Generated(_));

                match outcome {
                    ImageOutcome::Generated(asset) => {
                        scenes[i].image_asset = Some(asset);
                        report.images_generated += 1;
                    }
                    ImageOutcome::Placeholder(asset) => {
                        scenes[i].image_asset = Some(asset);
                        report.placeholders_used += 1;
                    }
                    ImageOutcome::Missing => report.images_missing += 1,
                }
                scenes[i].image_pending = false;
                board.send_replace(scenes.clone());

                if generated && !self.settings.throttle.is_zero() {
                    tokio::time::sleep(self.settings.throttle).await;
                }
            }

            if scenes[i].audio_asset.is_none() {
                logi(format!("Narration scene {}/{} (voice {})", i + 1, total, job.voice_id));
                match self
                    .provider
                    .generate_speech(&scenes[i].narration_text, &job.voice_id)
                    .await
                {
                    Ok(asset) => {
                        scenes[i].audio_asset = Some(asset);
                        report.audio_generated += 1;
                    }
                    Err(e) => {
                        logw(format!("Narration failed for scene {}: {}", i + 1, e));
                        report.audio_failed += 1;
                    }
                }
                scenes[i].image_pending = false;
                scenes[i].audio_pending = false;
                board.send_replace(scenes.clone());
            }
        }

        logok(format!(
            "Asset pass done: {} images, {} placeholders, {} narrations, {} narration failures",
            report.images_generated,
            report.placeholders_used,
            report.audio_generated,
            report.audio_failed
        ));
        report.scenes = scenes;
        Some(report)
    }

    async fn resolve_image(&self, prompt: &str, ratio: AspectRatio) -> ImageOutcome {
        let policy = RetryPolicy::rate_limit(self.settings.backoff);
        let result = retry_on_rate_limit(&policy, "image generation", || {
            self.provider.generate_image(prompt, ratio)
        })
        .await;

        match result {
            Ok(asset) => ImageOutcome::Generated(asset),
            Err(e) => {
                let substitute = match self.settings.fallback {
                    FallbackTrigger::AnyFailure => true,
                    FallbackTrigger::RateLimitOnly => e.is_rate_limited(),
                };
                if substitute {
                    logw(format!("Image generation failed ({}); using placeholder", e));
                    ImageOutcome::Placeholder(placeholder_image(ratio))
                } else {
                    logw(format!("Image generation failed ({}); leaving scene for retry", e));
                    ImageOutcome::Missing
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::{ScriptBeat, ScriptRequest};
    use crate::error::{ProviderError, ProviderResult};
    use crate::retry::is_placeholder;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider that replays queued results; an empty queue means success.
    #[derive(Default)]
    pub(crate) struct ScriptedProvider {
        pub script: Mutex<Option<ProviderResult<Vec<ScriptBeat>>>>,
        pub images: Mutex<VecDeque<ProviderResult<AssetRef>>>,
        pub speech: Mutex<VecDeque<ProviderResult<AssetRef>>>,
        pub image_prompts: Mutex<Vec<String>>,
        pub speech_calls: Mutex<Vec<(String, String)>>,
        pub delay: Option<Duration>,
    }

    impl ScriptedProvider {
        pub fn push_image(&self, r: ProviderResult<AssetRef>) {
            self.images.lock().unwrap().push_back(r);
        }

        pub fn push_speech(&self, r: ProviderResult<AssetRef>) {
            self.speech.lock().unwrap().push_back(r);
        }

        pub fn image_calls(&self) -> usize {
            self.image_prompts.lock().unwrap().len()
        }

        pub fn speech_call_count(&self) -> usize {
            self.speech_calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ContentProvider for ScriptedProvider {
        async fn generate_script(&self, _request: &ScriptRequest) -> ProviderResult<Vec<ScriptBeat>> {
            self.script
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(ProviderError::empty("no script queued")))
        }

        async fn generate_image(&self, prompt: &str, _ratio: AspectRatio) -> ProviderResult<AssetRef> {
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            let n = {
                let mut prompts = self.image_prompts.lock().unwrap();
                prompts.push(prompt.to_string());
                prompts.len()
            };
            let queued = self.images.lock().unwrap().pop_front();
            queued.unwrap_or_else(|| Ok(AssetRef::new(format!("img-{n}"))))
        }

        async fn generate_speech(&self, text: &str, voice_id: &str) -> ProviderResult<AssetRef> {
            let n = {
                let mut calls = self.speech_calls.lock().unwrap();
                calls.push((text.to_string(), voice_id.to_string()));
                calls.len()
            };
            let queued = self.speech.lock().unwrap().pop_front();
            queued.unwrap_or_else(|| Ok(AssetRef::new(format!("aud-{n}"))))
        }
    }

    fn job() -> AssetJob {
        AssetJob {
            voice_id: "Puck".into(),
            style_suffix: String::new(),
            ratio: AspectRatio::Landscape,
        }
    }

    fn pipeline(provider: &Arc<ScriptedProvider>, settings: PipelineSettings) -> AssetPipeline {
        AssetPipeline::new(provider.clone(), settings)
    }

    fn scenes(n: usize) -> Vec<Scene> {
        (0..n)
            .map(|i| Scene::new(i, format!("line {i}"), format!("prompt {i}"), 3.0))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn fills_only_the_missing_image() {
        let provider = Arc::new(ScriptedProvider::default());
        let (board, _rx) = watch::channel(Vec::new());
        let mut input = scenes(1);
        input[0].audio_asset = Some(AssetRef::new("existing-audio"));

        let report = pipeline(&provider, PipelineSettings::default())
            .run_pass(input, &job(), &board)
            .await
            .unwrap();

        let scene = &report.scenes[0];
        assert_eq!(scene.image_asset, Some(AssetRef::new("img-1")));
        assert_eq!(scene.audio_asset, Some(AssetRef::new("existing-audio")));
        assert_eq!(provider.speech_call_count(), 0);
        assert!(report.complete());
    }

    #[tokio::test(start_paused = true)]
    async fn complete_scenes_are_left_alone() {
        let provider = Arc::new(ScriptedProvider::default());
        let (board, _rx) = watch::channel(Vec::new());
        let mut input = scenes(2);
        for s in &mut input {
            s.image_asset = Some(AssetRef::new("i"));
            s.audio_asset = Some(AssetRef::new("a"));
        }

        let report = pipeline(&provider, PipelineSettings::default())
            .run_pass(input.clone(), &job(), &board)
            .await
            .unwrap();

        assert_eq!(report.scenes, input);
        assert_eq!(provider.image_calls(), 0);
        assert_eq!(provider.speech_call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn two_rate_limits_fall_back_to_placeholder() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.push_image(Err(ProviderError::http(429, "Too Many Requests")));
        provider.push_image(Err(ProviderError::RateLimited("quota".into())));
        let (board, _rx) = watch::channel(Vec::new());
        let settings = PipelineSettings::default();
        let backoff = settings.backoff;

        let started = tokio::time::Instant::now();
        let report = pipeline(&provider, settings)
            .run_pass(scenes(1), &job(), &board)
            .await
            .unwrap();

        // no throttle after a placeholder
        assert_eq!(started.elapsed().as_millis(), backoff.as_millis());
        let image = report.scenes[0].image_asset.as_ref().unwrap();
        assert!(is_placeholder(image));
        assert_eq!(provider.image_calls(), 2);
        assert_eq!(report.placeholders_used, 1);
        assert!(report.scenes[0].audio_asset.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn one_rate_limit_then_success_keeps_real_asset() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.push_image(Err(ProviderError::http(400, "quota exceeded")));
        provider.push_image(Ok(AssetRef::new("real-image")));
        let (board, _rx) = watch::channel(Vec::new());

        let started = tokio::time::Instant::now();
        let report = pipeline(&provider, PipelineSettings::default())
            .run_pass(scenes(1), &job(), &board)
            .await
            .unwrap();

        assert_eq!(report.scenes[0].image_asset, Some(AssetRef::new("real-image")));
        assert_eq!(report.images_generated, 1);
        // backoff + throttle
        assert!(started.elapsed() >= Duration::from_millis(4500));
    }

    #[tokio::test(start_paused = true)]
    async fn non_rate_limit_failure_is_not_retried() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.push_image(Err(ProviderError::empty("no image data returned")));
        let (board, _rx) = watch::channel(Vec::new());

        let report = pipeline(&provider, PipelineSettings::default())
            .run_pass(scenes(1), &job(), &board)
            .await
            .unwrap();

        assert_eq!(provider.image_calls(), 1);
        assert!(is_placeholder(report.scenes[0].image_asset.as_ref().unwrap()));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_only_fallback_leaves_gap_for_retry() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.push_image(Err(ProviderError::empty("no image data returned")));
        let (board, _rx) = watch::channel(Vec::new());
        let settings = PipelineSettings {
            fallback: FallbackTrigger::RateLimitOnly,
            ..Default::default()
        };
        let pipe = pipeline(&provider, settings);

        let report = pipe.run_pass(scenes(1), &job(), &board).await.unwrap();
        assert!(report.scenes[0].image_asset.is_none());
        assert_eq!(report.images_missing, 1);
        assert!(!report.scenes[0].image_pending);

        let report = pipe.run_pass(report.scenes, &job(), &board).await.unwrap();
        assert_eq!(report.scenes[0].image_asset, Some(AssetRef::new("img-2")));
        assert_eq!(provider.speech_call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn speech_failure_is_not_left_pending() {
        let provider = Arc::new(ScriptedProvider::default());
        provider.push_speech(Err(ProviderError::http(500, "tts down")));
        let (board, rx) = watch::channel(Vec::new());

        let report = pipeline(&provider, PipelineSettings::default())
            .run_pass(scenes(2), &job(), &board)
            .await
            .unwrap();

        assert!(report.scenes[0].audio_asset.is_none());
        assert!(!report.scenes[0].audio_pending);
        assert!(report.scenes[1].audio_asset.is_some());
        assert_eq!(report.audio_failed, 1);
        assert!(!report.complete());
        assert_eq!(*rx.borrow(), report.scenes);
    }

    #[tokio::test(start_paused = true)]
    async fn prompts_carry_style_suffix_and_voice() {
        let provider = Arc::new(ScriptedProvider::default());
        let (board, _rx) = watch::channel(Vec::new());
        let mut j = job();
        j.style_suffix = ", Anime style, Soft intensity".into();

        let report = pipeline(&provider, PipelineSettings::default())
            .run_pass(scenes(2), &j, &board)
            .await
            .unwrap();

        let prompts = provider.image_prompts.lock().unwrap().clone();
        assert_eq!(
            prompts,
            vec![
                "prompt 0, Anime style, Soft intensity".to_string(),
                "prompt 1, Anime style, Soft intensity".to_string()
            ]
        );
        assert_eq!(report.scenes[0].visual_prompt, "prompt 0");
        let calls = provider.speech_calls.lock().unwrap().clone();
        assert_eq!(calls[1], ("line 1".to_string(), "Puck".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn throttles_after_each_generated_image() {
        let provider = Arc::new(ScriptedProvider::default());
        let (board, _rx) = watch::channel(Vec::new());

        let started = tokio::time::Instant::now();
        pipeline(&provider, PipelineSettings::default())
            .run_pass(scenes(3), &job(), &board)
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(4500));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_pass_is_rejected() {
        let provider = Arc::new(ScriptedProvider {
            delay: Some(Duration::from_millis(10)),
            ..Default::default()
        });
        let (board, _rx) = watch::channel(Vec::new());
        let pipe = pipeline(&provider, PipelineSettings::default());

        let j = job();

        let (first, second) = tokio::join!(
            pipe.run_pass(scenes(1), &j, &board),
            pipe.run_pass(scenes(1), &j, &board)
        );

        assert!(first.is_some());
        assert!(second.is_none());
        assert!(!pipe.is_running());
        assert_eq!(provider.image_calls(), 1);
    }
}
