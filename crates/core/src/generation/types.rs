//! Generation pipeline types.

use serde::Serialize;
use uuid::Uuid;

use sketchmotion_shared::config::GenerationConfig;

/// Image returned by the image provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Raw image bytes.
    pub bytes: Vec<u8>,
    /// MIME type reported by the provider.
    pub mime_type: String,
}

/// Output parameters for the video provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSettings {
    /// Output aspect ratio, e.g. `16:9`.
    pub aspect_ratio: String,
    /// Clip length in seconds.
    pub duration_seconds: u32,
    /// Person generation policy.
    pub person_generation: String,
    /// Let the provider rewrite the prompt.
    pub enhance_prompt: bool,
    /// Generate an audio track.
    pub generate_audio: bool,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self::from_config(&GenerationConfig::default())
    }
}

impl VideoSettings {
    /// Build from application settings.
    #[must_use]
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            aspect_ratio: config.aspect_ratio.clone(),
            duration_seconds: config.duration_seconds,
            person_generation: config.person_generation.clone(),
            enhance_prompt: config.enhance_prompt,
            generate_audio: config.generate_audio,
        }
    }
}

/// Request to start an image-to-video operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRequest {
    /// Text prompt guiding the animation.
    pub prompt: String,
    /// `gs://` URI of the still image to animate.
    pub image_gcs_uri: String,
    /// MIME type of the still image.
    pub image_mime_type: String,
    /// `gs://` prefix the provider writes videos under, with trailing slash.
    pub output_gcs_prefix: String,
    /// Number of videos to generate.
    pub sample_count: u8,
    /// Output parameters.
    pub settings: VideoSettings,
}

/// Handle of a remote long-running operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    /// Fully qualified operation name.
    pub name: String,
}

impl OperationHandle {
    /// Wrap an operation name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A video produced by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVideo {
    /// `gs://` URI of the video.
    pub gcs_uri: String,
    /// MIME type, when reported.
    pub mime_type: Option<String>,
}

/// State of a long-running operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    /// Still running.
    Pending,
    /// Finished successfully. May be empty when every sample was filtered.
    Done(Vec<GeneratedVideo>),
    /// Finished with an error.
    Failed(String),
}

/// Input of one sketch-to-video request.
#[derive(Debug, Clone)]
pub struct GenerateInput {
    /// Base64 sketch, optionally as a data URL.
    pub image_data: String,
    /// Optional user prompt for the animation.
    pub prompt: Option<String>,
    /// Optional number of videos, any integer; clamped by the pipeline.
    pub sample_count: Option<i64>,
}

/// Result of one sketch-to-video request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateOutput {
    /// Job folder identifier.
    pub job_id: Uuid,
    /// Public URL of the generated still image.
    pub generated_image_url: String,
    /// Public URL of the first video.
    pub generated_video_url: String,
    /// Public URLs of every video.
    pub generated_video_urls: Vec<String>,
}
