//! Error taxonomy for provider calls and studio operations.

use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;
pub type StudioResult<T> = Result<T, StudioError>;

/// Failures reported by a content provider (script, image, speech).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Provider HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Provider returned no usable content: {0}")]
    EmptyResponse(String),

    #[error("Malformed provider payload: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    pub fn empty(msg: impl Into<String>) -> Self {
        Self::EmptyResponse(msg.into())
    }

    /// True for quota or rate-limit conditions: an explicit `RateLimited`,
    /// HTTP 429, or a message mentioning "429" or "quota".
    pub fn is_rate_limited(&self) -> bool {
        match self {
            ProviderError::RateLimited(_) => true,
            ProviderError::Http { status: 429, .. } => true,
            other => {
                let msg = other.to_string().to_lowercase();
                msg.contains("429") || msg.contains("quota")
            }
        }
    }
}

/// Errors surfaced by the studio session to its caller.
#[derive(Debug, Error)]
pub enum StudioError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Upload rejected: {0}")]
    Upload(String),

    #[error("Step {0} is not reachable yet")]
    NavigationBlocked(String),

    #[error("Asset generation already in progress")]
    GenerationInProgress,
}

impl StudioError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn upload(msg: impl Into<String>) -> Self {
        Self::Upload(msg.into())
    }
}
