//! The remote capabilities the workflow depends on.

use crate::error::Result;
use crate::image::ImageAsset;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Inline binary data in a response part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// MIME type reported by the service.
    pub mime_type: String,
    /// Base64-encoded payload.
    pub data: String,
}

/// One part of a generation response. A part may carry text, inline data,
/// both, or neither.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    /// Text content, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Inline image data, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl ResponsePart {
    /// A text-only part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    /// An inline-data part.
    pub fn image(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
        }
    }
}

/// The ordered parts of a generation call's first candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentResponse {
    /// Parts in the order the service returned them.
    pub parts: Vec<ResponsePart>,
}

impl ContentResponse {
    /// Creates a response from parts.
    pub fn new(parts: Vec<ResponsePart>) -> Self {
        Self { parts }
    }

    /// All text parts joined together as returned, or `None` if there were
    /// none or they were blank.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// The three calls a generation backend must offer.
#[async_trait]
pub trait StudioService: Send + Sync {
    /// Describes the visual style of an image (lighting, palette, mood,
    /// composition, texture, aesthetic).
    async fn describe_style(&self, image: &ImageAsset) -> Result<String>;

    /// Expands a short phrase into a single evocative style paragraph.
    async fn expand_keywords(&self, keywords: &str) -> Result<String>;

    /// Generates a new image from the product image and the composed prompt.
    async fn generate_image(&self, product: &ImageAsset, prompt: &str)
        -> Result<ContentResponse>;

    /// Returns the name of this backend for display.
    fn name(&self) -> &str;
}
