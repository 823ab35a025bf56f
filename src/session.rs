//! Single-user session state: input slots, the request lifecycle, and the
//! preview handles tied to the current selections.
//!
//! Lifecycle:
//!
//! ```text
//! Idle ─submit─▶ Validating ─┬─▶ InvalidInput            (no remote calls)
//!                            └─▶ Running ─┬─▶ Succeeded
//!                                         └─▶ Failed
//! ```
//!
//! Every state except `Running` accepts the next submission. A submission
//! while `Running` is rejected with [`StudioError::Busy`] and changes nothing.

use crate::error::{Result, StudioError};
use crate::image::{DataUri, ImageAsset, ImageFormat, ImageOrigin};
use crate::request::GenerationRequest;
use crate::service::StudioService;
use crate::style::StyleParameters;
use crate::workflow::{GenerationResult, Orchestrator};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Recorded when a submission is dropped before its run completes.
pub const INTERRUPTED_MESSAGE: &str = "The generation was interrupted before it finished.";

/// Where a session is in the request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing submitted yet, or reset.
    #[default]
    Idle,
    /// Checking the submitted inputs.
    Validating,
    /// The last submission had no product image.
    InvalidInput,
    /// A generation is in flight.
    Running,
    /// The last run produced an image.
    Succeeded,
    /// The last run failed.
    Failed,
}

impl SessionState {
    /// Returns true if a new submission would be accepted.
    pub fn accepts_submit(&self) -> bool {
        !matches!(self, Self::Running | Self::Validating)
    }
}

/// Hands out preview handles and counts the ones still alive.
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    next_id: Arc<AtomicU64>,
    live: Arc<AtomicUsize>,
}

impl PreviewRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires a preview for an image. Released when the handle is dropped.
    pub fn acquire(&self, image: &ImageAsset) -> PreviewHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.live.fetch_add(1, Ordering::AcqRel);
        PreviewHandle {
            id,
            uri: DataUri::from_asset(image),
            live: Arc::clone(&self.live),
        }
    }

    /// Number of handles not yet released.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}

/// A displayable preview of a selected image.
#[derive(Debug)]
pub struct PreviewHandle {
    id: u64,
    uri: DataUri,
    live: Arc<AtomicUsize>,
}

impl PreviewHandle {
    /// Unique id within the registry.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The preview as a data URI.
    pub fn uri(&self) -> &DataUri {
        &self.uri
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Moves the session from `Running` to `Failed` if the submit future is
/// dropped mid-run, so the next submission is not rejected as busy.
struct RunningGuard<'a> {
    session: &'a Session,
    armed: bool,
}

impl RunningGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.session.inner();
        if inner.state == SessionState::Running {
            tracing::warn!("generation interrupted");
            inner.state = SessionState::Failed;
            inner.error = Some(INTERRUPTED_MESSAGE.to_string());
        }
    }
}

struct ImageSlot {
    asset: ImageAsset,
    preview: PreviewHandle,
}

#[derive(Default)]
struct SessionInner {
    product: Option<ImageSlot>,
    style: Option<ImageSlot>,
    keywords: String,
    params: StyleParameters,
    state: SessionState,
    result: Option<GenerationResult>,
    error: Option<String>,
}

/// One user's working state.
pub struct Session {
    orchestrator: Orchestrator,
    previews: PreviewRegistry,
    inner: Mutex<SessionInner>,
}

impl Session {
    /// Creates an idle session over the given backend.
    pub fn new(service: Arc<dyn StudioService>) -> Self {
        Self::with_orchestrator(Orchestrator::new(service))
    }

    /// Creates an idle session over an existing orchestrator.
    pub fn with_orchestrator(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            previews: PreviewRegistry::new(),
            inner: Mutex::new(SessionInner::default()),
        }
    }

    fn inner(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn slot(&self, image: ImageAsset) -> Result<ImageSlot> {
        if image.origin() != ImageOrigin::Uploaded
            || ImageFormat::from_mime_type(image.mime_type()).is_none()
        {
            return Err(StudioError::UnsupportedImage(image.mime_type().to_string()));
        }
        let preview = self.previews.acquire(&image);
        Ok(ImageSlot {
            asset: image,
            preview,
        })
    }

    /// Selects the product image, releasing the previous preview.
    pub fn set_product_image(&self, image: ImageAsset) -> Result<()> {
        let slot = self.slot(image)?;
        self.inner().product = Some(slot);
        Ok(())
    }

    /// Selects the style reference image, releasing the previous preview.
    pub fn set_style_image(&self, image: ImageAsset) -> Result<()> {
        let slot = self.slot(image)?;
        self.inner().style = Some(slot);
        Ok(())
    }

    /// Empties the product slot. State and last result are untouched.
    pub fn clear_product_image(&self) {
        self.inner().product = None;
    }

    /// Empties the style slot. State and last result are untouched.
    pub fn clear_style_image(&self) {
        self.inner().style = None;
    }

    /// Sets the keyword prompt text.
    pub fn set_keywords(&self, keywords: impl Into<String>) {
        self.inner().keywords = keywords.into();
    }

    /// Sets the style parameters.
    pub fn set_params(&self, params: StyleParameters) {
        self.inner().params = params;
    }

    /// Current style parameters.
    pub fn params(&self) -> StyleParameters {
        self.inner().params
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.inner().state
    }

    /// Result of the last successful run, if not superseded.
    pub fn result(&self) -> Option<GenerationResult> {
        self.inner().result.clone()
    }

    /// Message from the last failed or rejected submission.
    pub fn error(&self) -> Option<String> {
        self.inner().error.clone()
    }

    /// The selected product image.
    pub fn product_image(&self) -> Option<ImageAsset> {
        self.inner().product.as_ref().map(|s| s.asset.clone())
    }

    /// The selected style image.
    pub fn style_image(&self) -> Option<ImageAsset> {
        self.inner().style.as_ref().map(|s| s.asset.clone())
    }

    /// Preview of the selected product image.
    pub fn product_preview(&self) -> Option<DataUri> {
        self.inner().product.as_ref().map(|s| s.preview.uri().clone())
    }

    /// Preview of the selected style image.
    pub fn style_preview(&self) -> Option<DataUri> {
        self.inner().style.as_ref().map(|s| s.preview.uri().clone())
    }

    /// Number of preview handles currently held.
    pub fn live_previews(&self) -> usize {
        self.previews.live()
    }

    /// Returns true while a generation is in flight.
    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    /// Returns to `Idle`, dropping the last result and error.
    pub fn reset(&self) -> Result<()> {
        let mut inner = self.inner();
        if !inner.state.accepts_submit() {
            return Err(StudioError::Busy);
        }
        inner.state = SessionState::Idle;
        inner.result = None;
        inner.error = None;
        Ok(())
    }

    /// Submits the current inputs.
    ///
    /// Validation, transport and no-image failures are recorded as the
    /// session's error message and returned; the session is left ready for
    /// another attempt. A submission while running returns
    /// [`StudioError::Busy`] without touching any state. Dropping the
    /// returned future mid-run leaves the session `Failed` with
    /// [`INTERRUPTED_MESSAGE`].
    pub async fn submit(&self) -> Result<GenerationResult> {
        let validated = {
            let mut inner = self.inner();
            if !inner.state.accepts_submit() {
                return Err(StudioError::Busy);
            }
            inner.state = SessionState::Validating;

            let request = GenerationRequest {
                product_image: inner.product.as_ref().map(|s| s.asset.clone()),
                style_image: inner.style.as_ref().map(|s| s.asset.clone()),
                keywords: Some(inner.keywords.clone()),
                params: inner.params,
            };
            match request.validate() {
                Ok(validated) => {
                    inner.state = SessionState::Running;
                    inner.result = None;
                    inner.error = None;
                    validated
                }
                Err(e) => {
                    tracing::warn!("submission rejected: {e}");
                    inner.state = SessionState::InvalidInput;
                    inner.error = Some(e.to_string());
                    return Err(e);
                }
            }
        };

        let mut guard = RunningGuard {
            session: self,
            armed: true,
        };
        let outcome = self.orchestrator.run(&validated).await;
        guard.disarm();

        let mut inner = self.inner();
        match outcome {
            Ok(result) => {
                inner.state = SessionState::Succeeded;
                inner.result = Some(result.clone());
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(kind = ?e.kind(), "generation failed: {e}");
                inner.state = SessionState::Failed;
                inner.error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, MISSING_PRODUCT_MESSAGE, NO_IMAGE_MESSAGE};
    use crate::service::{ContentResponse, ResponsePart};
    use crate::workflow::testing::{product, style, FakeService};
    use std::time::Duration;

    fn session(fake: &Arc<FakeService>) -> Session {
        Session::new(fake.clone())
    }

    #[tokio::test]
    async fn test_submit_without_product() {
        let fake = Arc::new(FakeService::default());
        let session = session(&fake);
        session.set_keywords("bright");

        let err = session.submit().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(session.state(), SessionState::InvalidInput);
        assert_eq!(session.error().as_deref(), Some(MISSING_PRODUCT_MESSAGE));
        assert!(fake.calls().is_empty());
        assert!(session.state().accepts_submit());
    }

    #[tokio::test]
    async fn test_successful_run() {
        let fake = Arc::new(FakeService::default());
        let session = session(&fake);
        session.set_product_image(product()).unwrap();

        let result = session.submit().await.unwrap();

        assert_eq!(session.state(), SessionState::Succeeded);
        assert_eq!(result.image.to_string(), "data:image/png;base64,AAAA");
        assert_eq!(session.result(), Some(result));
        assert_eq!(session.error(), None);
    }

    #[tokio::test]
    async fn test_failure_then_retry() {
        let fake = Arc::new(FakeService::default().with_response(ContentResponse::new(vec![
            ResponsePart::text("no"),
        ])));
        let session = session(&fake);
        session.set_product_image(product()).unwrap();

        assert!(session.submit().await.is_err());
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.error().as_deref(), Some(NO_IMAGE_MESSAGE));

        *fake.response.lock().unwrap() = Some(ContentResponse::new(vec![ResponsePart::image(
            "image/webp",
            "UklGRg==",
        )]));
        let result = session.submit().await.unwrap();
        assert_eq!(session.state(), SessionState::Succeeded);
        assert_eq!(session.error(), None);
        assert_eq!(result.image.mime_type(), "image/webp");
    }

    #[tokio::test]
    async fn test_new_run_clears_previous_result() {
        let fake = Arc::new(FakeService::default());
        let session = session(&fake);
        session.set_product_image(product()).unwrap();
        session.submit().await.unwrap();

        *fake.response.lock().unwrap() = Some(ContentResponse::default());
        session.submit().await.unwrap_err();
        assert_eq!(session.result(), None);
    }

    #[tokio::test]
    async fn test_overlapping_submit_is_busy() {
        let fake = Arc::new(FakeService {
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let session = session(&fake);
        session.set_product_image(product()).unwrap();

        let (first, second) = tokio::join!(session.submit(), session.submit());

        assert!(first.is_ok());
        assert!(matches!(second, Err(StudioError::Busy)));
        assert_eq!(fake.calls(), vec!["generate_image"]);
        assert_eq!(session.state(), SessionState::Succeeded);
    }

    #[tokio::test]
    async fn test_dropped_submit_leaves_session_retryable() {
        let fake = Arc::new(FakeService {
            delay: Some(Duration::from_millis(200)),
            ..Default::default()
        });
        let session = session(&fake);
        session.set_product_image(product()).unwrap();

        let timed_out = tokio::time::timeout(Duration::from_millis(20), session.submit()).await;
        assert!(timed_out.is_err());

        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.error().as_deref(), Some(INTERRUPTED_MESSAGE));
        assert!(session.state().accepts_submit());

        let result = session.submit().await.unwrap();
        assert_eq!(result.image.to_string(), "data:image/png;base64,AAAA");
        assert_eq!(session.state(), SessionState::Succeeded);
        assert_eq!(session.error(), None);
        assert_eq!(fake.calls(), vec!["generate_image", "generate_image"]);

        session.reset().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_clearing_style_keeps_result_and_product() {
        let fake = Arc::new(FakeService::default());
        let session = session(&fake);
        session.set_product_image(product()).unwrap();
        session.set_style_image(style()).unwrap();
        let result = session.submit().await.unwrap();

        session.clear_style_image();

        assert_eq!(session.style_image(), None);
        assert_eq!(session.product_image(), Some(product()));
        assert_eq!(session.result(), Some(result));
        assert_eq!(session.state(), SessionState::Succeeded);
    }

    #[tokio::test]
    async fn test_clearing_product_keeps_result() {
        let fake = Arc::new(FakeService::default());
        let session = session(&fake);
        session.set_product_image(product()).unwrap();
        session.submit().await.unwrap();

        session.clear_product_image();

        assert!(session.result().is_some());
        assert_eq!(session.state(), SessionState::Succeeded);
    }

    #[test]
    fn test_preview_handles_released() {
        let fake = Arc::new(FakeService::default());
        let session = session(&fake);
        assert_eq!(session.live_previews(), 0);

        session.set_product_image(product()).unwrap();
        session.set_style_image(style()).unwrap();
        assert_eq!(session.live_previews(), 2);

        session.set_product_image(product()).unwrap();
        assert_eq!(session.live_previews(), 2);

        session.clear_style_image();
        assert_eq!(session.live_previews(), 1);
        assert_eq!(session.style_preview(), None);
        assert_eq!(
            session.product_preview().unwrap().to_string(),
            "data:image/png;base64,iVBORw=="
        );

        let registry = session.previews.clone();
        drop(session);
        assert_eq!(registry.live(), 0);
    }

    #[test]
    fn test_generated_image_rejected_as_upload() {
        let fake = Arc::new(FakeService::default());
        let session = session(&fake);
        let err = session
            .set_product_image(ImageAsset::generated(vec![1], "image/png"))
            .unwrap_err();
        assert!(matches!(err, StudioError::UnsupportedImage(_)));
        assert_eq!(session.live_previews(), 0);
    }

    #[tokio::test]
    async fn test_reset() {
        let fake = Arc::new(FakeService::default());
        let session = session(&fake);
        session.set_product_image(product()).unwrap();
        session.submit().await.unwrap();

        session.reset().unwrap();

        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.result(), None);
        assert!(session.product_image().is_some());
    }
}
