//! User inputs for one generation, and their validated form.

use crate::error::{Result, StudioError, MISSING_PRODUCT_MESSAGE};
use crate::image::ImageAsset;
use crate::style::StyleParameters;

/// Raw inputs collected from the user. Any field may be missing until
/// [`GenerationRequest::validate`] is called.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// The subject photo. Required.
    pub product_image: Option<ImageAsset>,
    /// Optional style reference photo.
    pub style_image: Option<ImageAsset>,
    /// Optional free-text keywords or instructions.
    pub keywords: Option<String>,
    /// Composition and lighting choices.
    pub params: StyleParameters,
}

impl GenerationRequest {
    /// Creates a request for the given product image with default parameters.
    pub fn new(product_image: ImageAsset) -> Self {
        Self {
            product_image: Some(product_image),
            ..Default::default()
        }
    }

    /// Sets the style reference image.
    pub fn with_style_image(mut self, image: ImageAsset) -> Self {
        self.style_image = Some(image);
        self
    }

    /// Sets the keyword prompt.
    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    /// Sets the style parameters.
    pub fn with_params(mut self, params: StyleParameters) -> Self {
        self.params = params;
        self
    }

    /// Checks the request and resolves which style branch applies.
    ///
    /// Fails without touching the network when there is no product image.
    pub fn validate(&self) -> Result<ValidatedRequest> {
        let product_image = self
            .product_image
            .clone()
            .ok_or_else(|| StudioError::Validation(MISSING_PRODUCT_MESSAGE.into()))?;

        let keywords = self
            .keywords
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        let style = match (self.style_image.clone(), keywords) {
            (Some(image), refinements) => StyleSource::Reference { image, refinements },
            (None, Some(keywords)) => StyleSource::Keywords(keywords),
            (None, None) => StyleSource::None,
        };

        Ok(ValidatedRequest {
            product_image,
            style,
            params: self.params,
        })
    }
}

/// Where the style inspiration comes from. A reference image always wins
/// over keywords; keywords then become verbatim refinements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleSource {
    /// A style reference image, plus optional verbatim refinements.
    Reference {
        /// The reference image to describe.
        image: ImageAsset,
        /// Trimmed keyword text, passed through unexpanded.
        refinements: Option<String>,
    },
    /// Keywords only; they are expanded into a description.
    Keywords(String),
    /// Neither; the base prompt is used alone.
    None,
}

impl StyleSource {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Reference {
                refinements: Some(_),
                ..
            } => "reference+refinements",
            Self::Reference { .. } => "reference",
            Self::Keywords(_) => "keywords",
            Self::None => "none",
        }
    }
}

/// A request that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    /// The subject photo.
    pub product_image: ImageAsset,
    /// The resolved style branch.
    pub style: StyleSource,
    /// Composition and lighting choices.
    pub params: StyleParameters,
}
