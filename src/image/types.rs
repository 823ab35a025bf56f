//! Image payloads moving through the workflow.

use crate::error::{Result, StudioError};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image formats accepted for uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
}

/// Bytes needed before content sniffing is attempted.
const MAGIC_LEN: usize = 12;

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Looks up a format by MIME type.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < MAGIC_LEN {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Where an image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageOrigin {
    /// Selected by the user.
    Uploaded,
    /// Returned by the generation service.
    Generated,
}

/// An image payload with its MIME type and provenance.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAsset {
    data: Vec<u8>,
    mime_type: String,
    origin: ImageOrigin,
}

impl std::fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAsset")
            .field("mime_type", &self.mime_type)
            .field("origin", &self.origin)
            .field("size", &self.data.len())
            .finish()
    }
}

impl ImageAsset {
    /// Creates an uploaded asset, enforcing the PNG/JPEG/WEBP allow-list.
    pub fn upload(data: Vec<u8>, mime_type: &str) -> Result<Self> {
        let format = ImageFormat::from_mime_type(mime_type)
            .ok_or_else(|| StudioError::UnsupportedImage(mime_type.to_string()))?;
        Ok(Self {
            data,
            mime_type: format.mime_type().to_string(),
            origin: ImageOrigin::Uploaded,
        })
    }

    /// Creates an uploaded asset, detecting the type from magic bytes.
    pub fn upload_detected(data: Vec<u8>) -> Result<Self> {
        let format = ImageFormat::from_magic_bytes(&data)
            .ok_or_else(|| StudioError::UnsupportedImage("unrecognized content".into()))?;
        Self::upload(data, format.mime_type())
    }

    /// Creates an asset produced by the service; any MIME type is accepted.
    pub fn generated(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
            origin: ImageOrigin::Generated,
        }
    }

    /// Reads an upload from disk.
    ///
    /// The type comes from the content's magic bytes. The file extension is
    /// only consulted when the content is too short to identify; longer
    /// content in an unsupported format is rejected whatever its name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let by_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ImageFormat::from_extension);
        let by_magic = ImageFormat::from_magic_bytes(&data);

        let format = match (by_magic, by_ext) {
            (Some(detected), _) => detected,
            (None, Some(ext)) if data.len() < MAGIC_LEN => ext,
            _ => {
                return Err(StudioError::UnsupportedImage(path.display().to_string()));
            }
        };
        tracing::debug!(path = %path.display(), mime = format.mime_type(), size = data.len(), "loaded image");
        Self::upload(data, format.mime_type())
    }

    /// Raw image bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Declared MIME type.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Provenance of this image.
    pub fn origin(&self) -> ImageOrigin {
        self.origin
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}
