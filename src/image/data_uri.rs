//! `data:<mime>;base64,<payload>` URIs for generated images.

use crate::error::{Result, StudioError};
use crate::image::types::{ImageAsset, ImageFormat};
use base64::Engine;
use std::path::Path;

/// A self-describing image reference for inline display or download.
///
/// The payload is kept exactly as the service returned it; it is only
/// decoded when the image is saved or turned back into bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    mime_type: String,
    payload: String,
}

impl DataUri {
    /// Builds a data URI from a MIME type and an already-encoded payload.
    pub fn new(mime_type: impl Into<String>, base64_payload: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            payload: base64_payload.into(),
        }
    }

    /// Builds a data URI by encoding an asset's bytes.
    pub fn from_asset(asset: &ImageAsset) -> Self {
        Self::new(asset.mime_type(), asset.to_base64())
    }

    /// Parses `data:<mime>;base64,<payload>`.
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| StudioError::Decode("missing `data:` scheme".into()))?;
        let (mime_type, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| StudioError::Decode("data URI is not base64-encoded".into()))?;
        if mime_type.is_empty() {
            return Err(StudioError::Decode("data URI has no MIME type".into()));
        }
        Ok(Self::new(mime_type, payload))
    }

    /// MIME type of the image.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Base64 payload, as returned by the service.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Decodes the payload to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(self.payload.trim())
            .map_err(|e| StudioError::Decode(e.to_string()))
    }

    /// Decodes into a generated [`ImageAsset`].
    pub fn to_asset(&self) -> Result<ImageAsset> {
        Ok(ImageAsset::generated(self.decode()?, self.mime_type.clone()))
    }

    /// File extension to use when saving; unknown types fall back to `png`.
    pub fn extension(&self) -> &'static str {
        ImageFormat::from_mime_type(&self.mime_type)
            .unwrap_or_default()
            .extension()
    }

    /// Default download name, e.g. `generated-image.png`.
    pub fn default_file_name(&self) -> String {
        format!("generated-image.{}", self.extension())
    }

    /// Decodes and writes the image to `path`. Returns the bytes written.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<usize> {
        let bytes = self.decode()?;
        tokio::fs::write(path.as_ref(), &bytes).await?;
        tracing::debug!(path = %path.as_ref().display(), size = bytes.len(), "saved generated image");
        Ok(bytes.len())
    }
}

impl std::fmt::Display for DataUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.payload)
    }
}

impl std::str::FromStr for DataUri {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
