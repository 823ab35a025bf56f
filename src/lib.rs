#![warn(missing_docs)]
//! Photo Studio - restyled product photography via Gemini.
//!
//! Give it a product photo, optionally a style reference photo and/or a few
//! keywords, and three composition choices. It builds one instruction from
//! those inputs (describing the reference image or expanding the keywords
//! first, when present), asks the image model for a new photograph, and
//! returns the result as a data URI.
//!
//! # Quick Start
//!
//! ```no_run
//! use photo_studio::{
//!     GeminiClient, GenerationRequest, ImageAsset, LightingStyle, Orchestrator, StyleParameters,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> photo_studio::Result<()> {
//!     let client = GeminiClient::builder().build()?;
//!     let orchestrator = Orchestrator::new(Arc::new(client));
//!
//!     let product = ImageAsset::from_path("mug.png").await?;
//!     let request = GenerationRequest::new(product)
//!         .with_keywords("minimalist, bright, on a marble surface")
//!         .with_params(StyleParameters::default().with_lighting(LightingStyle::Soft));
//!
//!     let result = orchestrator.compose_and_generate(&request).await?;
//!     result.image.save("generated-image.png").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `gemini` (default): the Gemini HTTP backend
//! - `cli`: the `photo-studio` command-line interface

pub mod config;
mod error;
pub mod extract;
pub mod image;
pub mod prompt;
pub mod providers;
pub mod request;
pub mod service;
pub mod session;
pub mod style;
pub mod workflow;

// Re-export error types at crate root
pub use error::{ErrorKind, Result, StudioError, MISSING_PRODUCT_MESSAGE, NO_IMAGE_MESSAGE};

pub use config::StudioConfig;
pub use extract::{extract_image, ExtractedImage};
pub use image::{DataUri, ImageAsset, ImageFormat, ImageOrigin};
pub use prompt::{compose, ComposedPrompt, StyleFragment};
pub use request::{GenerationRequest, StyleSource, ValidatedRequest};
pub use service::{ContentResponse, InlineData, ResponsePart, StudioService};
pub use session::{PreviewHandle, PreviewRegistry, Session, SessionState, INTERRUPTED_MESSAGE};
pub use style::{AspectRatio, CameraPerspective, LightingStyle, StyleParameters};
pub use workflow::{GenerationResult, Orchestrator};

#[cfg(feature = "gemini")]
pub use providers::{GeminiClient, GeminiClientBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, StudioError};
    pub use crate::image::{DataUri, ImageAsset};
    pub use crate::request::GenerationRequest;
    pub use crate::service::StudioService;
    pub use crate::session::Session;
    pub use crate::style::{AspectRatio, CameraPerspective, LightingStyle, StyleParameters};
    pub use crate::workflow::{GenerationResult, Orchestrator};

    #[cfg(feature = "gemini")]
    pub use crate::providers::GeminiClient;
}
