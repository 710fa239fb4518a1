//! Gemini client for sketch-to-image rendering.
//!
//! Wraps `models/{model}:generateContent` with mixed text and image output.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use sketchmotion_core::generation::{GeneratedImage, GenerationError, ImageGenerator};
use sketchmotion_core::sketch::{Sketch, encode_base64};

use crate::error::GoogleApiError;
use crate::http::parse_response;

/// Default Gemini API endpoint.
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// HTTP client for the Gemini API.
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    InlineData {
        inline_data: Blob,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: [&'static str; 2],
}

/// Response of `generateContent`, reduced to what we read.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    inline_data: Option<Blob>,
}

impl GeminiClient {
    /// Create a client for `model` using the public endpoint.
    #[must_use]
    pub fn new(client: reqwest::Client, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Override the endpoint (proxies, emulators).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Model identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/{}:generateContent", self.endpoint, self.model)
    }

    /// Send `instruction` and the sketch, returning the raw response.
    ///
    /// The key travels in a header so it never shows up in logged URLs.
    async fn generate_content(
        &self,
        instruction: &str,
        sketch: &Sketch,
    ) -> Result<GenerateContentResponse, GoogleApiError> {
        let body = build_request(instruction, sketch);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        parse_response(response).await
    }
}

fn build_request<'a>(instruction: &'a str, sketch: &Sketch) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![
                RequestPart::Text { text: instruction },
                RequestPart::InlineData {
                    inline_data: Blob {
                        mime_type: sketch.mime_type.to_string(),
                        data: encode_base64(&sketch.bytes),
                    },
                },
            ],
        }],
        generation_config: GenerationConfig {
            response_modalities: ["TEXT", "IMAGE"],
        },
    }
}

/// Pick the first image part of the first candidate.
fn extract_image(response: GenerateContentResponse) -> Result<GeneratedImage, GenerationError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(GenerationError::no_image(
            "Gemini image generation returned no candidates",
        ));
    };

    let blob = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.inline_data)
        .find(|blob| blob.mime_type.starts_with("image/"))
        .ok_or_else(|| GenerationError::no_image("Gemini did not return an image"))?;

    let bytes = STANDARD
        .decode(blob.data.as_bytes())
        .map_err(|e| GenerationError::image(format!("Gemini returned undecodable image data: {e}")))?;

    if bytes.is_empty() {
        return Err(GenerationError::no_image("Gemini did not return an image"));
    }

    Ok(GeneratedImage {
        bytes,
        mime_type: blob.mime_type,
    })
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate_image(
        &self,
        instruction: &str,
        sketch: &Sketch,
    ) -> Result<GeneratedImage, GenerationError> {
        let response = self
            .generate_content(instruction, sketch)
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "Gemini API error");
                GenerationError::image(e.to_string())
            })?;

        let image = extract_image(response)?;
        info!(model = %self.model, size = image.bytes.len(), "Gemini returned an image");
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sketch() -> Sketch {
        Sketch {
            bytes: b"\x89PNG\r\n\x1a\n".to_vec(),
            mime_type: "image/png",
            extension: "png",
        }
    }

    fn parse(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).expect("valid response json")
    }

    #[test]
    fn test_request_shape() {
        let body = serde_json::to_value(build_request("make it real", &sketch())).expect("json");

        assert_eq!(
            body,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "text": "make it real" },
                        { "inlineData": { "mimeType": "image/png", "data": "iVBORw0KGgo=" } }
                    ]
                }],
                "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
            })
        );
    }

    #[test]
    fn test_extract_first_image_part() {
        let response = parse(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Here is your image" },
                        { "inlineData": { "mimeType": "text/plain", "data": "aGk=" } },
                        { "inlineData": { "mimeType": "image/png", "data": "iVBORw0KGgo=" } },
                        { "inlineData": { "mimeType": "image/jpeg", "data": "/9j/" } }
                    ]
                }
            }]
        }));

        let image = extract_image(response).expect("image present");
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes, b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_no_candidates() {
        let err = extract_image(parse(json!({ "candidates": [] }))).unwrap_err();
        assert!(matches!(err, GenerationError::NoImage(ref m) if m.contains("no candidates")));

        let err = extract_image(parse(json!({}))).unwrap_err();
        assert!(matches!(err, GenerationError::NoImage(_)));
    }

    #[test]
    fn test_text_only_candidate() {
        let response = parse(json!({
            "candidates": [{ "content": { "parts": [{ "text": "I cannot draw that" }] } }]
        }));
        let err = extract_image(response).unwrap_err();
        assert!(matches!(err, GenerationError::NoImage(ref m) if m == "Gemini did not return an image"));
    }

    #[test]
    fn test_candidate_without_content() {
        let response = parse(json!({ "candidates": [{ "finishReason": "SAFETY" }] }));
        assert!(matches!(
            extract_image(response),
            Err(GenerationError::NoImage(_))
        ));
    }

    #[test]
    fn test_undecodable_image_data() {
        let response = parse(json!({
            "candidates": [{ "content": { "parts": [
                { "inlineData": { "mimeType": "image/png", "data": "***" } }
            ] } }]
        }));
        assert!(matches!(
            extract_image(response),
            Err(GenerationError::ImageGeneration(_))
        ));
    }

    #[test]
    fn test_url_and_endpoint_override() {
        let client = GeminiClient::new(reqwest::Client::new(), "gemini-test", "key")
            .with_endpoint("http://localhost:8081/v1beta/models/");
        assert_eq!(
            client.url(),
            "http://localhost:8081/v1beta/models/gemini-test:generateContent"
        );
        assert_eq!(client.model(), "gemini-test");
    }

    #[tokio::test]
    async fn test_generate_image_over_http() {
        use crate::test_server::{ScriptedServer, client};
        use axum::http::StatusCode;

        let server = ScriptedServer::start(vec![(
            StatusCode::OK,
            json!({ "candidates": [{ "content": { "parts": [
                { "text": "Here you go" },
                { "inlineData": { "mimeType": "image/png", "data": "iVBORw0KGgo=" } }
            ] } }] }),
        )])
        .await;
        let gemini = GeminiClient::new(client(), "gemini-test", "AIzaSy-secret")
            .with_endpoint(format!("{}/v1beta/models", server.base_url));

        let image = gemini
            .generate_image("make it real", &sketch())
            .await
            .expect("image");
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes, b"\x89PNG\r\n\x1a\n");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.uri, "/v1beta/models/gemini-test:generateContent");
        assert_eq!(request.header("x-goog-api-key"), Some("AIzaSy-secret"));
        assert_eq!(
            request.json(),
            serde_json::to_value(build_request("make it real", &sketch())).expect("json")
        );
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        use crate::test_server::{ScriptedServer, client};
        use axum::http::StatusCode;

        let server = ScriptedServer::start(vec![
            (
                StatusCode::FORBIDDEN,
                json!({ "error": { "status": "PERMISSION_DENIED" } }),
            ),
            (
                StatusCode::FORBIDDEN,
                json!({ "error": { "status": "PERMISSION_DENIED" } }),
            ),
        ])
        .await;
        let gemini = GeminiClient::new(client(), "gemini-test", "bad-key")
            .with_endpoint(format!("{}/v1beta/models", server.base_url));

        match gemini.generate_content("make it real", &sketch()).await {
            Err(GoogleApiError::Api { status, body }) => {
                assert_eq!(status, 403);
                assert!(body.contains("PERMISSION_DENIED"), "{body}");
            }
            other => panic!("expected API error, got {other:?}"),
        }

        let err = gemini
            .generate_image("make it real", &sketch())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::ImageGeneration(ref m) if m.contains("403")));
    }
}
