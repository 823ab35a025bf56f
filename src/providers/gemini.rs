//! Gemini (Google) backend for the describe, expand and generate calls.

use crate::config::StudioConfig;
use crate::error::{parse_retry_after, sanitize_error_message, Result, StudioError};
use crate::image::ImageAsset;
use crate::service::{ContentResponse, InlineData, ResponsePart, StudioService};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const DESCRIBE_STYLE_INSTRUCTION: &str = "Describe this image's visual style in detail. Focus on the lighting, color palette, mood, composition, texture, and overall aesthetic. Be descriptive and evocative. This description will be used as a prompt for an AI to generate a new product photograph in the same style.";

fn expand_keywords_instruction(keywords: &str) -> String {
    format!(
        "Based on the following keywords, generate a detailed and evocative visual style description for an AI image generator. The description should be a single paragraph and focus on elements like lighting, color palette, mood, composition, texture, and overall aesthetic. Do not add any preamble like \"Here is a description...\". Just provide the description itself. Keywords: \"{keywords}\""
    )
}

/// Builder for [`GeminiClient`].
#[derive(Debug, Clone, Default)]
pub struct GeminiClientBuilder {
    api_key: Option<String>,
    text_model: Option<String>,
    image_model: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `API_KEY`, `GEMINI_API_KEY`, then
    /// `GOOGLE_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model for describe/expand calls.
    pub fn text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = Some(model.into());
        self
    }

    /// Sets the model for image generation.
    pub fn image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = Some(model.into());
        self
    }

    /// Overrides the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client, resolving the API key.
    ///
    /// Fails with [`StudioError::Config`] when no key is available.
    pub fn build(self) -> Result<GeminiClient> {
        let env_lookup = |name: &str| std::env::var(name).ok();
        let mut config = StudioConfig::resolve(self.api_key, env_lookup)?;
        if let Some(model) = self.text_model {
            config.text_model = model;
        }
        if let Some(model) = self.image_model {
            config.image_model = model;
        }
        if let Some(url) = self.base_url {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        GeminiClient::from_config(config)
    }
}

/// Gemini multimodal client.
pub struct GeminiClient {
    client: reqwest::Client,
    config: StudioConfig,
}

impl GeminiClient {
    /// Creates a new `GeminiClientBuilder`.
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::new()
    }

    /// Creates a client from resolved configuration.
    pub fn from_config(config: StudioConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// The resolved configuration (key redacted in `Debug`).
    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    /// Checks that the key is accepted and the image model exists.
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/models/{}", self.config.base_url, self.config.image_model);

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Err(StudioError::Auth("Invalid API key".into())),
            404 => Err(StudioError::Api {
                status: 404,
                message: format!("Model '{}' not found", self.config.image_model),
            }),
            s if !(200..300).contains(&s) => Err(StudioError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }

    async fn generate_content(&self, model: &str, body: &GeminiRequest) -> Result<GeminiResponse> {
        let url = format!("{}/models/{}:generateContent", self.config.base_url, model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        Ok(response.json().await?)
    }

    async fn generate_text(&self, body: GeminiRequest, call: &str) -> Result<String> {
        let start = Instant::now();
        let response = self.generate_content(&self.config.text_model, &body).await?;
        let content = response.into_content()?;
        let text = content
            .text()
            .ok_or_else(|| StudioError::EmptyResponse(format!("{call} returned no text")))?;
        tracing::debug!(
            call,
            model = %self.config.text_model,
            chars = text.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Gemini text call complete"
        );
        Ok(text)
    }
}

#[async_trait]
impl StudioService for GeminiClient {
    async fn describe_style(&self, image: &ImageAsset) -> Result<String> {
        let body = GeminiRequest::text_call(vec![
            GeminiRequestPart::inline(image),
            GeminiRequestPart::Text {
                text: DESCRIBE_STYLE_INSTRUCTION.to_string(),
            },
        ]);
        self.generate_text(body, "describe_style").await
    }

    async fn expand_keywords(&self, keywords: &str) -> Result<String> {
        let body = GeminiRequest::text_call(vec![GeminiRequestPart::Text {
            text: expand_keywords_instruction(keywords),
        }]);
        self.generate_text(body, "expand_keywords").await
    }

    async fn generate_image(
        &self,
        product: &ImageAsset,
        prompt: &str,
    ) -> Result<ContentResponse> {
        let start = Instant::now();
        let body = GeminiRequest::image_call(product, prompt);
        let response = self
            .generate_content(&self.config.image_model, &body)
            .await?;
        let content = response.into_content()?;
        tracing::debug!(
            model = %self.config.image_model,
            parts = content.parts.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Gemini image call complete"
        );
        Ok(content)
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> StudioError {
    let message = extract_error_message(text);
    let message = sanitize_error_message(&message);
    match status {
        401 | 403 => StudioError::Auth(message),
        429 => {
            let retry_after = parse_retry_after(headers).map(Duration::from_secs);
            StudioError::RateLimited { retry_after }
        }
        _ => {
            let lower = message.to_lowercase();
            if lower.contains("safety") || lower.contains("prohibited") {
                return StudioError::ContentBlocked(message);
            }
            StudioError::Api { status, message }
        }
    }
}

/// Pulls `error.message` out of a Google error body, if it is one.
fn extract_error_message(text: &str) -> String {
    serde_json::from_str::<GeminiErrorBody>(text)
        .ok()
        .and_then(|b| b.error.message)
        .unwrap_or_else(|| text.to_string())
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl GeminiRequestPart {
    fn inline(image: &ImageAsset) -> Self {
        Self::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type().to_string(),
                data: image.to_base64(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn text_call(parts: Vec<GeminiRequestPart>) -> Self {
        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: None,
        }
    }

    fn image_call(product: &ImageAsset, prompt: &str) -> Self {
        // Product image first, then the instruction.
        let parts = vec![
            GeminiRequestPart::inline(product),
            GeminiRequestPart::Text {
                text: prompt.to_string(),
            },
        ];
        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: Some(GeminiConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

impl GeminiResponse {
    /// Returns the first candidate's parts, turning blocks into errors.
    ///
    /// A candidate with no content yields an empty part list; deciding
    /// whether that is a failure is left to the caller.
    fn into_content(self) -> Result<ContentResponse> {
        // Prompt blocks come back as HTTP 200.
        if let Some(ref feedback) = self.prompt_feedback {
            if let Some(ref reason) = feedback.block_reason {
                let msg = feedback
                    .block_reason_message
                    .clone()
                    .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
                return Err(StudioError::ContentBlocked(msg));
            }
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Ok(ContentResponse::default());
        };

        if let Some(ref finish_reason) = candidate.finish_reason {
            match finish_reason.as_str() {
                "SAFETY"
                | "IMAGE_SAFETY"
                | "IMAGE_PROHIBITED_CONTENT"
                | "RECITATION"
                | "IMAGE_RECITATION"
                | "PROHIBITED_CONTENT"
                | "BLOCKLIST"
                | "SPII" => {
                    return Err(StudioError::ContentBlocked(format!(
                        "Content blocked by Gemini safety filter: {}",
                        finish_reason
                    )));
                }
                _ => {} // STOP, MAX_TOKENS, NO_IMAGE etc. fall through to extraction
            }
        }

        Ok(ContentResponse::new(
            candidate.content.map(|c| c.parts).unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png() -> ImageAsset {
        ImageAsset::upload(vec![1, 2, 3], "image/png").unwrap()
    }

    #[test]
    fn test_builder_with_explicit_key() {
        let client = GeminiClientBuilder::new()
            .api_key("test-key")
            .text_model("gemini-2.0-flash")
            .base_url("http://localhost:9999/v1beta/")
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(client.config().api_key, "test-key");
        assert_eq!(client.config().text_model, "gemini-2.0-flash");
        assert_eq!(client.config().base_url, "http://localhost:9999/v1beta");
        assert_eq!(client.config().timeout, Duration::from_secs(5));
        assert_eq!(client.name(), "Gemini (Google)");
    }

    #[test]
    fn test_image_call_shape() {
        let req = GeminiRequest::image_call(&png(), "Make it shine");
        let json = serde_json::to_value(&req).unwrap();

        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "AQID");
        assert_eq!(parts[1]["text"], "Make it shine");
        assert_eq!(
            json["generationConfig"]["responseModalities"],
            serde_json::json!(["IMAGE", "TEXT"])
        );
        assert!(json.get("generation_config").is_none());
    }

    #[test]
    fn test_describe_call_shape() {
        let req = GeminiRequest::text_call(vec![
            GeminiRequestPart::inline(&png()),
            GeminiRequestPart::Text {
                text: DESCRIBE_STYLE_INSTRUCTION.to_string(),
            },
        ]);
        let json = serde_json::to_value(&req).unwrap();
        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert!(parts[0].get("inlineData").is_some());
        assert!(parts[1]["text"].as_str().unwrap().contains("visual style"));
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_expand_instruction_quotes_keywords() {
        let instruction = expand_keywords_instruction("dark and moody");
        assert!(instruction.ends_with("Keywords: \"dark and moody\""));
        assert!(instruction.contains("single paragraph"));
    }

    #[test]
    fn test_response_mixed_parts() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here is your image."},
                        {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
                    ]
                },
                "finishReason": "STOP"
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let content = resp.into_content().unwrap();
        assert_eq!(content.parts.len(), 2);
        assert_eq!(content.text().as_deref(), Some("Here is your image."));
        let inline = content.parts[1].inline_data.as_ref().unwrap();
        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(inline.data, "iVBORw0KGgo=");
    }

    #[test]
    fn test_response_text_only() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "Soft "}, {"text": "diffuse light."}]},
                "finishReason": "STOP"
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let content = resp.into_content().unwrap();
        assert_eq!(content.text().as_deref(), Some("Soft diffuse light."));
        assert!(content.parts.iter().all(|p| p.inline_data.is_none()));
    }

    #[test]
    fn test_response_with_prompt_feedback_block() {
        let json = r#"{
            "candidates": [],
            "promptFeedback": {
                "blockReason": "SAFETY",
                "blockReasonMessage": "Prompt was blocked due to safety"
            }
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        match resp.into_content().unwrap_err() {
            StudioError::ContentBlocked(msg) => {
                assert_eq!(msg, "Prompt was blocked due to safety")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_response_safety_finish_reason() {
        let json = r#"{"candidates": [{"finishReason": "IMAGE_SAFETY"}]}"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            resp.into_content().unwrap_err(),
            StudioError::ContentBlocked(_)
        ));
    }

    #[test]
    fn test_response_no_candidates_is_empty() {
        let resp: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.into_content().unwrap().parts.is_empty());

        let json = r#"{"candidates": [{"finishReason": "NO_IMAGE"}]}"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert!(resp.into_content().unwrap().parts.is_empty());
    }

    #[test]
    fn test_parse_error_by_status() {
        let headers = reqwest::header::HeaderMap::new();
        let body = r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#;

        match parse_error(400, body, &headers) {
            StudioError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            parse_error(403, "forbidden", &headers),
            StudioError::Auth(_)
        ));
        assert!(matches!(
            parse_error(500, "blocked for safety reasons", &headers),
            StudioError::ContentBlocked(_)
        ));
    }

    #[test]
    fn test_parse_error_rate_limited() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::RETRY_AFTER, "12".parse().unwrap());
        let err = parse_error(429, "quota exceeded", &headers);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(12)));
    }
}
