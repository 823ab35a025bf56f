//! Pulls the generated image out of a mixed text/image response.

use crate::error::{Result, StudioError};
use crate::image::DataUri;
use crate::service::ContentResponse;

/// An image found in a response, with any text the model sent alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// The first inline image, as a data URI.
    pub data_uri: DataUri,
    /// Joined text parts, if any.
    pub model_text: Option<String>,
}

/// Finds the first part with inline image data.
///
/// A response with no image part is a refusal, not a transport failure,
/// and yields [`StudioError::NoImageProduced`] even when text is present.
pub fn extract_image(response: &ContentResponse) -> Result<ExtractedImage> {
    let model_text = response.text();
    let inline = response
        .parts
        .iter()
        .find_map(|p| p.inline_data.as_ref())
        .ok_or_else(|| StudioError::no_image(model_text.clone()))?;

    Ok(ExtractedImage {
        data_uri: DataUri::new(inline.mime_type.clone(), inline.data.clone()),
        model_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, NO_IMAGE_MESSAGE};
    use crate::service::ResponsePart;

    #[test]
    fn test_exact_data_uri() {
        let response = ContentResponse::new(vec![ResponsePart::image("image/png", "AAAA")]);
        let extracted = extract_image(&response).unwrap();
        assert_eq!(extracted.data_uri.to_string(), "data:image/png;base64,AAAA");
        assert_eq!(extracted.model_text, None);
    }

    #[test]
    fn test_first_image_wins() {
        let response = ContentResponse::new(vec![
            ResponsePart::text("Sure, here it is."),
            ResponsePart::image("image/jpeg", "/9j/"),
            ResponsePart::image("image/png", "AAAA"),
        ]);
        let extracted = extract_image(&response).unwrap();
        assert_eq!(extracted.data_uri.to_string(), "data:image/jpeg;base64,/9j/");
        assert_eq!(extracted.model_text.as_deref(), Some("Sure, here it is."));
    }

    #[test]
    fn test_text_only_is_no_image() {
        let response = ContentResponse::new(vec![ResponsePart::text(
            "I can't help with that request.",
        )]);
        let err = extract_image(&response).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoImageProduced);
        assert_eq!(err.to_string(), NO_IMAGE_MESSAGE);
        match err {
            StudioError::NoImageProduced { model_text, .. } => {
                assert_eq!(model_text.as_deref(), Some("I can't help with that request."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_response_is_no_image() {
        let err = extract_image(&ContentResponse::default()).unwrap_err();
        assert!(matches!(err, StudioError::NoImageProduced { model_text: None, .. }));
    }
}
