use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod init;
pub mod playback;
pub mod project;
pub mod retry;
pub mod script;
pub mod srt;
pub mod studio;
pub mod wav;

pub type StudioLogHook = Arc<Mutex<dyn Fn(&str) + Send + Sync + 'static>>;

static LOG_HOOK: Lazy<Mutex<Option<StudioLogHook>>> = Lazy::new(|| Mutex::new(None));

/// Mirrors every tagged log line into `hook`, e.g. a UI log panel.
pub fn set_log_hook(hook: Option<StudioLogHook>) {
    if let Ok(mut guard) = LOG_HOOK.lock() {
        *guard = hook;
    }
}

pub(crate) fn logv(tag: &str, message: &str) {
    match tag {
        "WARN" => tracing::warn!("{}", message),
        _ => tracing::info!("[{}] {}", tag, message),
    }

    if let Ok(guard) = LOG_HOOK.lock() {
        if let Some(hook) = guard.as_ref() {
            if let Ok(callback) = hook.lock() {
                let line = format!("[{}] {}", tag, message);
                callback(&line);
            }
        }
    }
}

pub(crate) fn logi(message: impl AsRef<str>) {
    logv("INFO", message.as_ref());
}

pub(crate) fn logok(message: impl AsRef<str>) {
    logv("OK", message.as_ref());
}

pub(crate) fn logw(message: impl AsRef<str>) {
    logv("WARN", message.as_ref());
}
