//! The compose-and-generate pipeline.
//!
//! One run is a fixed linear sequence:
//!
//! 1. validate the request (no remote calls on failure),
//! 2. resolve the style fragment: describe the reference image, *or* expand
//!    the keywords, *or* nothing,
//! 3. compose the prompt,
//! 4. call image generation,
//! 5. extract the first inline image as a data URI.
//!
//! Any error ends the run. Nothing is retried.

use crate::error::Result;
use crate::extract::extract_image;
use crate::image::DataUri;
use crate::prompt::{compose, ComposedPrompt, StyleFragment};
use crate::request::{GenerationRequest, StyleSource, ValidatedRequest};
use crate::service::StudioService;
use std::sync::Arc;
use std::time::Instant;

/// The outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    /// The generated image.
    pub image: DataUri,
    /// The prompt sent with the product image.
    pub prompt: ComposedPrompt,
    /// Any text the model returned alongside the image.
    pub model_text: Option<String>,
}

/// Drives the remote calls for one request at a time.
#[derive(Clone)]
pub struct Orchestrator {
    service: Arc<dyn StudioService>,
}

impl Orchestrator {
    /// Creates an orchestrator over the given backend.
    pub fn new(service: Arc<dyn StudioService>) -> Self {
        Self { service }
    }

    /// The backend in use.
    pub fn service(&self) -> &dyn StudioService {
        self.service.as_ref()
    }

    /// Validates, composes, generates and extracts.
    pub async fn compose_and_generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let validated = request.validate()?;
        self.run(&validated).await
    }

    /// Runs the describe/expand step and composes the prompt, without
    /// generating an image.
    pub async fn compose_prompt(&self, request: &ValidatedRequest) -> Result<ComposedPrompt> {
        let fragment = self.resolve_style(&request.style).await?;
        Ok(compose(&request.params, &fragment))
    }

    /// Runs an already-validated request.
    pub async fn run(&self, request: &ValidatedRequest) -> Result<GenerationResult> {
        let start = Instant::now();
        tracing::debug!(
            backend = self.service.name(),
            style = request.style.label(),
            aspect_ratio = %request.params.aspect_ratio,
            lighting = %request.params.lighting,
            perspective = %request.params.perspective,
            "starting generation"
        );

        let prompt = self.compose_prompt(request).await?;
        let response = self
            .service
            .generate_image(&request.product_image, prompt.as_str())
            .await?;
        let extracted = extract_image(&response)?;

        tracing::info!(
            mime = extracted.data_uri.mime_type(),
            duration_ms = start.elapsed().as_millis() as u64,
            "generation complete"
        );

        Ok(GenerationResult {
            image: extracted.data_uri,
            prompt,
            model_text: extracted.model_text,
        })
    }

    async fn resolve_style(&self, style: &StyleSource) -> Result<StyleFragment> {
        match style {
            StyleSource::Reference { image, refinements } => {
                tracing::debug!("describing style reference image");
                let description = self.service.describe_style(image).await?;
                Ok(StyleFragment::Described {
                    description,
                    refinements: refinements.clone(),
                })
            }
            StyleSource::Keywords(keywords) => {
                tracing::debug!("expanding style keywords");
                let description = self.service.expand_keywords(keywords).await?;
                Ok(StyleFragment::Expanded(description))
            }
            StyleSource::None => Ok(StyleFragment::None),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{product, style, FakeService};
    use super::*;
    use crate::error::{ErrorKind, StudioError};
    use crate::prompt::{STYLE_INSPIRATION, USER_REFINEMENTS};
    use crate::service::{ContentResponse, ResponsePart};

    fn orchestrator(fake: &Arc<FakeService>) -> Orchestrator {
        Orchestrator::new(fake.clone())
    }

    #[tokio::test]
    async fn test_image_and_keywords() {
        let fake = Arc::new(FakeService::default());
        let request = GenerationRequest::new(product())
            .with_style_image(style())
            .with_keywords("on a marble surface");

        let result = orchestrator(&fake).compose_and_generate(&request).await.unwrap();

        assert_eq!(fake.calls(), vec!["describe_style", "generate_image"]);
        assert_eq!(result.prompt.sections(), vec![STYLE_INSPIRATION, USER_REFINEMENTS]);
        let prompt = result.prompt.as_str();
        assert!(prompt.contains("*warm amber light on weathered oak*"));
        assert!(prompt.contains("*on a marble surface*"));
        assert!(!prompt.contains("deep indigo"));
        assert_eq!(fake.last_prompt().as_deref(), Some(prompt));
    }

    #[tokio::test]
    async fn test_image_only() {
        let fake = Arc::new(FakeService::default());
        let request = GenerationRequest::new(product()).with_style_image(style());

        let result = orchestrator(&fake).compose_and_generate(&request).await.unwrap();

        assert_eq!(fake.calls(), vec!["describe_style", "generate_image"]);
        assert_eq!(result.prompt.sections(), vec![STYLE_INSPIRATION]);
        assert!(result.prompt.as_str().contains("*warm amber light on weathered oak*"));
    }

    #[tokio::test]
    async fn test_keywords_only_uses_expansion_not_raw_keywords() {
        let fake = Arc::new(FakeService::default());
        let request = GenerationRequest::new(product()).with_keywords("xyzzy moody");

        let result = orchestrator(&fake).compose_and_generate(&request).await.unwrap();

        assert_eq!(fake.calls(), vec!["expand_keywords", "generate_image"]);
        assert_eq!(result.prompt.sections(), vec![STYLE_INSPIRATION]);
        assert!(result.prompt.as_str().contains("*a hushed, shadowy scene in deep indigo*"));
        assert!(!result.prompt.as_str().contains("xyzzy moody"));
    }

    #[tokio::test]
    async fn test_neither_uses_base_prompt() {
        let fake = Arc::new(FakeService::default());
        let request = GenerationRequest::new(product());

        let result = orchestrator(&fake).compose_and_generate(&request).await.unwrap();

        assert_eq!(fake.calls(), vec!["generate_image"]);
        assert!(result.prompt.sections().is_empty());
    }

    #[tokio::test]
    async fn test_missing_product_makes_no_calls() {
        let fake = Arc::new(FakeService::default());
        let request = GenerationRequest::default()
            .with_style_image(style())
            .with_keywords("bright");

        let err = orchestrator(&fake)
            .compose_and_generate(&request)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_exact_data_uri_result() {
        let fake = Arc::new(FakeService::default());
        let result = orchestrator(&fake)
            .compose_and_generate(&GenerationRequest::new(product()))
            .await
            .unwrap();
        assert_eq!(result.image.to_string(), "data:image/png;base64,AAAA");
    }

    #[tokio::test]
    async fn test_text_only_response_is_no_image() {
        let fake = Arc::new(FakeService::default().with_response(ContentResponse::new(vec![
            ResponsePart::text("I cannot edit this photo."),
        ])));
        let err = orchestrator(&fake)
            .compose_and_generate(&GenerationRequest::new(product()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoImageProduced);
    }

    #[tokio::test]
    async fn test_describe_failure_stops_pipeline() {
        let fake = Arc::new(FakeService {
            fail_on: Some("describe_style"),
            ..Default::default()
        });
        let request = GenerationRequest::new(product()).with_style_image(style());

        let err = orchestrator(&fake)
            .compose_and_generate(&request)
            .await
            .unwrap_err();

        assert!(err.is_transport());
        assert_eq!(err.to_string(), "API error: 503 - describe_style unavailable");
        assert_eq!(fake.calls(), vec!["describe_style"]);
    }

    #[tokio::test]
    async fn test_generate_failure_is_not_retried() {
        let fake = Arc::new(FakeService {
            fail_on: Some("generate_image"),
            ..Default::default()
        });
        let request = GenerationRequest::new(product()).with_keywords("soft pastel");

        let err = orchestrator(&fake)
            .compose_and_generate(&request)
            .await
            .unwrap_err();

        assert!(matches!(err, StudioError::Api { status: 503, .. }));
        assert_eq!(fake.calls(), vec!["expand_keywords", "generate_image"]);
    }

    #[tokio::test]
    async fn test_compose_prompt_skips_generation() {
        let fake = Arc::new(FakeService::default());
        let validated = GenerationRequest::new(product())
            .with_keywords("bright")
            .validate()
            .unwrap();

        let prompt = orchestrator(&fake).compose_prompt(&validated).await.unwrap();

        assert_eq!(fake.calls(), vec!["expand_keywords"]);
        assert_eq!(prompt.sections(), vec![STYLE_INSPIRATION]);
    }
}
