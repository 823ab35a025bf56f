//! Error types for the photo studio workflow.

use std::time::Duration;

/// Message shown when generation completes without an image part.
pub const NO_IMAGE_MESSAGE: &str =
    "No image was generated. The model may have refused the request.";

/// Message shown when a submission has no product image.
pub const MISSING_PRODUCT_MESSAGE: &str = "Please upload a product image.";

/// Broad classification of a [`StudioError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required configuration (the API credential) is missing. Fatal.
    Configuration,
    /// The request was rejected before any remote call.
    Validation,
    /// A remote call failed or returned something unusable.
    Transport,
    /// Generation completed but produced no image.
    NoImageProduced,
    /// A local failure (file I/O, decoding, a run already in flight).
    Local,
}

/// Errors that can occur while composing and generating a styled photo.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    /// API credential missing.
    #[error("configuration error: {0}")]
    Config(String),

    /// Request failed validation (e.g., no product image).
    #[error("{0}")]
    Validation(String),

    /// Uploaded file is not an accepted image type.
    #[error("unsupported image type: {0} (expected PNG, JPEG, or WEBP)")]
    UnsupportedImage(String),

    /// API key rejected by the service.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        message: String,
    },

    /// Rate limit or quota exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Server-suggested delay, if any.
        retry_after: Option<Duration>,
    },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// A text call returned no text.
    #[error("empty response: {0}")]
    EmptyResponse(String),

    /// Generation finished without any inline image data.
    #[error("{message}")]
    NoImageProduced {
        /// User-facing message.
        message: String,
        /// Any text the model returned instead of an image.
        model_text: Option<String>,
    },

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to decode base64 or a data URI.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (reading uploads, saving results).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A generation is already running for this session.
    #[error("a generation is already in progress")]
    Busy,
}

impl StudioError {
    /// Creates a `NoImageProduced` error carrying optional model text.
    pub fn no_image(model_text: Option<String>) -> Self {
        Self::NoImageProduced {
            message: NO_IMAGE_MESSAGE.to_string(),
            model_text,
        }
    }

    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Configuration,
            Self::Validation(_) | Self::UnsupportedImage(_) => ErrorKind::Validation,
            Self::Auth(_)
            | Self::Api { .. }
            | Self::RateLimited { .. }
            | Self::ContentBlocked(_)
            | Self::EmptyResponse(_)
            | Self::Network(_)
            | Self::Json(_) => ErrorKind::Transport,
            Self::NoImageProduced { .. } => ErrorKind::NoImageProduced,
            Self::Decode(_) | Self::Io(_) | Self::Busy => ErrorKind::Local,
        }
    }

    /// Returns true if this error came from a remote call.
    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// Returns the suggested retry delay, if the service supplied one.
    ///
    /// Nothing in this crate retries automatically; callers decide.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Result type alias for photo studio operations.
pub type Result<T> = std::result::Result<T, StudioError>;

/// Maximum length of an error body carried into an error message.
const MAX_ERROR_BODY: usize = 500;

/// Redacts API keys from an error body and truncates it.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let mut out = String::with_capacity(text.len().min(MAX_ERROR_BODY));
    for (i, word) in text.split(' ').enumerate() {
        if i > 0 {
            out.push(' ');
        }
        // Google API keys start with "AIza" and are 39 chars long.
        match word.find("AIza") {
            Some(pos) if word.len() - pos >= 35 => {
                out.push_str(&word[..pos]);
                out.push_str("[REDACTED]");
            }
            _ => out.push_str(word),
        }
    }
    if out.chars().count() > MAX_ERROR_BODY {
        let truncated: String = out.chars().take(MAX_ERROR_BODY).collect();
        return format!("{truncated}...");
    }
    out
}

/// Reads a `Retry-After` header given in whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
