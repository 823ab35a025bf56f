//! Client configuration resolved from explicit values and the environment.

use crate::error::{Result, StudioError};
use std::time::Duration;

/// Environment variables searched for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 3] = ["API_KEY", "GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Overrides the model used for describe/expand calls.
pub const TEXT_MODEL_ENV: &str = "PHOTO_STUDIO_TEXT_MODEL";
/// Overrides the model used for image generation.
pub const IMAGE_MODEL_ENV: &str = "PHOTO_STUDIO_IMAGE_MODEL";
/// Overrides the API base URL.
pub const BASE_URL_ENV: &str = "PHOTO_STUDIO_BASE_URL";
/// Overrides the per-request timeout, in seconds.
pub const TIMEOUT_ENV: &str = "PHOTO_STUDIO_TIMEOUT_SECS";

/// Default model for text calls.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
/// Default model for image generation.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";
/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Resolved settings for the Gemini backend.
#[derive(Clone)]
pub struct StudioConfig {
    /// API key sent with every request.
    pub api_key: String,
    /// Model for describe/expand calls.
    pub text_model: String,
    /// Model for image generation.
    pub image_model: String,
    /// API base URL, without trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for StudioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioConfig")
            .field("api_key", &"[REDACTED]")
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl StudioConfig {
    /// Resolves everything from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::resolve(None, |name| std::env::var(name).ok())
    }

    /// Resolves settings, preferring `api_key` and falling back to `lookup`
    /// for everything else.
    ///
    /// A missing key is a [`StudioError::Config`] and is reported before any
    /// network call is made.
    pub fn resolve<F>(api_key: Option<String>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| API_KEY_ENV_VARS.iter().find_map(|name| non_empty(*name)))
            .ok_or_else(|| {
                StudioError::Config(format!(
                    "API key not set (set one of {})",
                    API_KEY_ENV_VARS.join(", ")
                ))
            })?;

        let timeout = match non_empty(TIMEOUT_ENV) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    StudioError::Config(format!("{TIMEOUT_ENV} must be whole seconds, got '{raw}'"))
                })?;
                Duration::from_secs(secs)
            }
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            api_key,
            text_model: non_empty(TEXT_MODEL_ENV).unwrap_or_else(|| DEFAULT_TEXT_MODEL.into()),
            image_model: non_empty(IMAGE_MODEL_ENV).unwrap_or_else(|| DEFAULT_IMAGE_MODEL.into()),
            base_url: non_empty(BASE_URL_ENV)
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            timeout,
        })
    }
}
