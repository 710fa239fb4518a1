//! Vertex AI Veo client for image-to-video generation.
//!
//! Veo runs as a long-running operation: `predictLongRunning` returns an
//! operation name which is then polled through `fetchPredictOperation`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use sketchmotion_core::generation::{
    GeneratedVideo, GenerationError, OperationHandle, OperationStatus, VideoGenerator,
    VideoRequest,
};

use crate::auth::TokenProvider;
use crate::error::GoogleApiError;
use crate::http::parse_response;

/// HTTP client for Veo models on Vertex AI.
pub struct VeoClient {
    client: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    base_url: String,
    project: String,
    location: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: [Instance<'a>; 1],
    parameters: Parameters<'a>,
}

#[derive(Debug, Serialize)]
struct Instance<'a> {
    prompt: &'a str,
    image: ImageRef<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageRef<'a> {
    gcs_uri: &'a str,
    mime_type: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters<'a> {
    aspect_ratio: &'a str,
    storage_uri: &'a str,
    duration_seconds: u32,
    person_generation: &'a str,
    enhance_prompt: bool,
    generate_audio: bool,
    sample_count: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FetchOperationRequest<'a> {
    operation_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct StartedOperation {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct Operation {
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<OperationError>,
    #[serde(default)]
    response: Option<VideoResponse>,
}

#[derive(Debug, Default, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResponse {
    #[serde(default)]
    videos: Vec<VideoRef>,
    #[serde(default)]
    generated_samples: Vec<Sample>,
    #[serde(default)]
    rai_media_filtered_reasons: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoRef {
    #[serde(default)]
    gcs_uri: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Sample {
    #[serde(default)]
    video: Option<SampleVideo>,
}

#[derive(Debug, Default, Deserialize)]
struct SampleVideo {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

impl VeoClient {
    /// Create a client for `model` in `project` / `location`.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        tokens: Arc<dyn TokenProvider>,
        project: impl Into<String>,
        location: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let location = location.into();
        Self {
            client,
            tokens,
            base_url: format!("https://{location}-aiplatform.googleapis.com"),
            project: project.into(),
            location,
            model: model.into(),
        }
    }

    /// Override the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn model_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}",
            self.base_url, self.project, self.location, self.model
        )
    }

    async fn post<B: Serialize + Sync, T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T, GoogleApiError> {
        let token = self.tokens.access_token().await?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        parse_response(response).await
    }

    /// Start an image-to-video operation.
    pub async fn predict_long_running(
        &self,
        request: &VideoRequest,
    ) -> Result<OperationHandle, GoogleApiError> {
        let body = build_request(request);
        let started: StartedOperation = self
            .post(format!("{}:predictLongRunning", self.model_url()), &body)
            .await?;

        if started.name.is_empty() {
            return Err(GoogleApiError::invalid_response(
                "predictLongRunning returned no operation name",
            ));
        }
        Ok(OperationHandle::new(started.name))
    }

    /// Fetch the current state of an operation.
    pub async fn fetch_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, GoogleApiError> {
        let body = FetchOperationRequest {
            operation_name: &handle.name,
        };
        let operation: Operation = self
            .post(format!("{}:fetchPredictOperation", self.model_url()), &body)
            .await?;

        Ok(status_of(operation))
    }
}

fn build_request(request: &VideoRequest) -> PredictRequest<'_> {
    PredictRequest {
        instances: [Instance {
            prompt: &request.prompt,
            image: ImageRef {
                gcs_uri: &request.image_gcs_uri,
                mime_type: &request.image_mime_type,
            },
        }],
        parameters: Parameters {
            aspect_ratio: &request.settings.aspect_ratio,
            storage_uri: &request.output_gcs_prefix,
            duration_seconds: request.settings.duration_seconds,
            person_generation: &request.settings.person_generation,
            enhance_prompt: request.settings.enhance_prompt,
            generate_audio: request.settings.generate_audio,
            sample_count: request.sample_count,
        },
    }
}

fn status_of(operation: Operation) -> OperationStatus {
    if let Some(err) = operation.error {
        return OperationStatus::Failed(format!("{} (code {})", err.message, err.code));
    }
    if !operation.done {
        return OperationStatus::Pending;
    }

    let response = operation.response.unwrap_or_default();

    let mut videos: Vec<GeneratedVideo> = response
        .videos
        .into_iter()
        .filter_map(|video| {
            video.gcs_uri.map(|gcs_uri| GeneratedVideo {
                gcs_uri,
                mime_type: video.mime_type,
            })
        })
        .collect();

    videos.extend(response.generated_samples.into_iter().filter_map(|sample| {
        let video = sample.video?;
        video.uri.map(|gcs_uri| GeneratedVideo {
            gcs_uri,
            mime_type: video.encoding,
        })
    }));

    if videos.is_empty() && !response.rai_media_filtered_reasons.is_empty() {
        return OperationStatus::Failed(format!(
            "all videos were filtered: {}",
            response.rai_media_filtered_reasons.join("; ")
        ));
    }

    OperationStatus::Done(videos)
}

#[async_trait]
impl VideoGenerator for VeoClient {
    async fn start(&self, request: &VideoRequest) -> Result<OperationHandle, GenerationError> {
        let handle = self.predict_long_running(request).await.map_err(|e| {
            error!(model = %self.model, error = %e, "Veo API error");
            GenerationError::video(e.to_string())
        })?;
        info!(model = %self.model, operation = %handle.name, "Veo operation started");
        Ok(handle)
    }

    async fn poll(&self, handle: &OperationHandle) -> Result<OperationStatus, GenerationError> {
        self.fetch_operation(handle).await.map_err(|e| {
            error!(operation = %handle.name, error = %e, "Veo operation poll failed");
            GenerationError::video(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use serde_json::json;
    use sketchmotion_core::generation::VideoSettings;

    fn parse(value: serde_json::Value) -> Operation {
        serde_json::from_value(value).expect("valid operation json")
    }

    fn request() -> VideoRequest {
        VideoRequest {
            prompt: "Animate this image.".to_string(),
            image_gcs_uri: "gs://sketches/jobs/1/generated-image.png".to_string(),
            image_mime_type: "image/png".to_string(),
            output_gcs_prefix: "gs://sketches/jobs/1/videos/".to_string(),
            sample_count: 1,
            settings: VideoSettings::default(),
        }
    }

    #[test]
    fn test_request_shape() {
        let req = request();
        let body = serde_json::to_value(build_request(&req)).expect("json");

        assert_eq!(
            body,
            json!({
                "instances": [{
                    "prompt": "Animate this image.",
                    "image": {
                        "gcsUri": "gs://sketches/jobs/1/generated-image.png",
                        "mimeType": "image/png"
                    }
                }],
                "parameters": {
                    "aspectRatio": "16:9",
                    "storageUri": "gs://sketches/jobs/1/videos/",
                    "durationSeconds": 8,
                    "personGeneration": "allow_adult",
                    "enhancePrompt": true,
                    "generateAudio": true,
                    "sampleCount": 1
                }
            })
        );
    }

    #[test]
    fn test_model_url() {
        let client = VeoClient::new(
            reqwest::Client::new(),
            Arc::new(StaticToken::new("t")),
            "demo-project",
            "us-central1",
            "veo-3.0-generate-preview",
        );
        assert_eq!(
            client.model_url(),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/demo-project/locations/us-central1/publishers/google/models/veo-3.0-generate-preview"
        );

        let client = client.with_base_url("http://localhost:8080/");
        assert!(client.model_url().starts_with("http://localhost:8080/v1/projects/"));
    }

    #[test]
    fn test_pending_operation() {
        let op = parse(json!({ "name": "projects/p/operations/1" }));
        assert_eq!(status_of(op), OperationStatus::Pending);

        let op = parse(json!({ "name": "projects/p/operations/1", "done": false }));
        assert_eq!(status_of(op), OperationStatus::Pending);
    }

    #[test]
    fn test_done_operation_with_videos() {
        let op = parse(json!({
            "name": "projects/p/operations/1",
            "done": true,
            "response": {
                "@type": "type.googleapis.com/cloud.ai.large_models.vision.GenerateVideoResponse",
                "raiMediaFilteredCount": 0,
                "videos": [
                    { "gcsUri": "gs://sketches/jobs/1/videos/123/sample_0.mp4", "mimeType": "video/mp4" }
                ]
            }
        }));

        assert_eq!(
            status_of(op),
            OperationStatus::Done(vec![GeneratedVideo {
                gcs_uri: "gs://sketches/jobs/1/videos/123/sample_0.mp4".to_string(),
                mime_type: Some("video/mp4".to_string()),
            }])
        );
    }

    #[test]
    fn test_done_operation_with_generated_samples() {
        let op = parse(json!({
            "done": true,
            "response": {
                "generatedSamples": [
                    { "video": { "uri": "gs://sketches/a.mp4", "encoding": "video/mp4" } },
                    { "video": {} }
                ]
            }
        }));

        assert_eq!(
            status_of(op),
            OperationStatus::Done(vec![GeneratedVideo {
                gcs_uri: "gs://sketches/a.mp4".to_string(),
                mime_type: Some("video/mp4".to_string()),
            }])
        );
    }

    #[test]
    fn test_done_without_response_is_empty() {
        let op = parse(json!({ "done": true }));
        assert_eq!(status_of(op), OperationStatus::Done(Vec::new()));
    }

    #[test]
    fn test_filtered_videos_fail_with_reasons() {
        let op = parse(json!({
            "done": true,
            "response": {
                "raiMediaFilteredCount": 1,
                "raiMediaFilteredReasons": ["Unable to generate videos due to safety policy."]
            }
        }));

        match status_of(op) {
            OperationStatus::Failed(message) => assert!(message.contains("safety policy")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_operation_error() {
        let op = parse(json!({
            "done": true,
            "error": { "code": 8, "message": "Resource exhausted" }
        }));
        assert_eq!(
            status_of(op),
            OperationStatus::Failed("Resource exhausted (code 8)".to_string())
        );
    }

    fn veo_at(base_url: &str) -> VeoClient {
        VeoClient::new(
            crate::test_server::client(),
            Arc::new(StaticToken::new("ya29.test")),
            "demo-project",
            "us-central1",
            "veo-test",
        )
        .with_base_url(base_url)
    }

    const MODEL_PATH: &str =
        "/v1/projects/demo-project/locations/us-central1/publishers/google/models/veo-test";

    #[tokio::test]
    async fn test_start_over_http() {
        use crate::test_server::ScriptedServer;
        use axum::http::StatusCode;

        let server = ScriptedServer::start(vec![(
            StatusCode::OK,
            json!({ "name": "projects/demo-project/locations/us-central1/operations/op-1" }),
        )])
        .await;

        let handle = veo_at(&server.base_url)
            .start(&request())
            .await
            .expect("operation started");
        assert_eq!(
            handle.name,
            "projects/demo-project/locations/us-central1/operations/op-1"
        );

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].uri, format!("{MODEL_PATH}:predictLongRunning"));
        assert_eq!(requests[0].header("authorization"), Some("Bearer ya29.test"));
        assert_eq!(
            requests[0].json(),
            serde_json::to_value(build_request(&request())).expect("json")
        );
    }

    #[tokio::test]
    async fn test_start_without_operation_name() {
        use crate::test_server::ScriptedServer;
        use axum::http::StatusCode;

        let server = ScriptedServer::start(vec![(StatusCode::OK, json!({ "name": "" }))]).await;

        let err = veo_at(&server.base_url)
            .predict_long_running(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, GoogleApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_poll_over_http() {
        use crate::test_server::ScriptedServer;
        use axum::http::StatusCode;

        let name = "projects/demo-project/locations/us-central1/operations/op-1";
        let server = ScriptedServer::start(vec![
            (StatusCode::OK, json!({ "name": name, "done": false })),
            (
                StatusCode::OK,
                json!({
                    "name": name,
                    "done": true,
                    "response": { "videos": [
                        { "gcsUri": "gs://sketches/jobs/1/videos/9/sample_0.mp4", "mimeType": "video/mp4" }
                    ] }
                }),
            ),
        ])
        .await;
        let veo = veo_at(&server.base_url);
        let handle = OperationHandle::new(name);

        assert_eq!(veo.poll(&handle).await.expect("poll"), OperationStatus::Pending);
        assert_eq!(
            veo.poll(&handle).await.expect("poll"),
            OperationStatus::Done(vec![GeneratedVideo {
                gcs_uri: "gs://sketches/jobs/1/videos/9/sample_0.mp4".to_string(),
                mime_type: Some("video/mp4".to_string()),
            }])
        );

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        for recorded in &requests {
            assert_eq!(recorded.uri, format!("{MODEL_PATH}:fetchPredictOperation"));
            assert_eq!(recorded.header("authorization"), Some("Bearer ya29.test"));
            assert_eq!(recorded.json(), json!({ "operationName": name }));
        }
    }

    #[tokio::test]
    async fn test_poll_error_status() {
        use crate::test_server::ScriptedServer;
        use axum::http::StatusCode;

        let server = ScriptedServer::start(vec![(
            StatusCode::TOO_MANY_REQUESTS,
            json!({ "error": { "status": "RESOURCE_EXHAUSTED" } }),
        )])
        .await;

        let err = veo_at(&server.base_url)
            .poll(&OperationHandle::new("projects/p/operations/op"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, GenerationError::VideoGeneration(ref m) if m.contains("429") && m.contains("RESOURCE_EXHAUSTED"))
        );
    }
}
