//! Bounded retry for rate-limited provider calls, and the placeholder used
//! when an image cannot be produced at all.

use crate::error::ProviderResult;
use crate::logw;
use crate::project::{AspectRatio, AssetRef};
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff: Duration::from_millis(3000),
        }
    }
}

impl RetryPolicy {
    pub fn rate_limit(backoff: Duration) -> Self {
        Self {
            max_retries: 1,
            backoff,
        }
    }
}

/// Runs `op`, retrying after a fixed backoff only while the failure is
/// classified as a rate limit. Any other failure is returned immediately.
pub async fn retry_on_rate_limit<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_rate_limited() && attempt < policy.max_retries => {
                attempt += 1;
                logw(format!(
                    "{} rate limited ({}); retrying in {}ms (attempt {}/{})",
                    operation,
                    e,
                    policy.backoff.as_millis(),
                    attempt,
                    policy.max_retries
                ));
                tokio::time::sleep(policy.backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// A random stock-photo URL sized for `ratio`.
pub fn placeholder_image(ratio: AspectRatio) -> AssetRef {
    let seed: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(11)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    let (w, h) = match ratio {
        AspectRatio::Landscape => (1280, 720),
        AspectRatio::Portrait => (720, 1280),
        AspectRatio::Square => (1024, 1024),
    };
    AssetRef::new(format!("https://picsum.photos/seed/{seed}/{w}/{h}"))
}

pub fn is_placeholder(asset: &AssetRef) -> bool {
    asset.as_str().starts_with("https://picsum.photos/seed/")
}
