//! Generation service implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, sleep};
use tracing::{error, info, warn};

use sketchmotion_shared::config::GenerationConfig;

use super::error::GenerationError;
use super::types::{
    GenerateInput, GenerateOutput, GeneratedImage, GeneratedVideo, OperationHandle,
    OperationStatus, VideoRequest, VideoSettings,
};
use crate::sketch::{Sketch, decode_sketch};
use crate::storage::{JobFolder, StorageService};

/// Instruction sent alongside every sketch.
pub const DEFAULT_IMAGE_INSTRUCTION: &str = "Convert this sketch into a photorealistic image as if it were taken from a real DSLR camera. The elements and objects should look real.";

/// Animation prompt used when the caller supplies none.
pub const DEFAULT_VIDEO_PROMPT: &str = "Animate this image. Add subtle, cinematic motion.";

/// Upper bound on videos per request.
const MAX_SAMPLE_COUNT: u8 = 4;

/// Sketch-to-image provider.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Render `sketch` following `instruction`.
    async fn generate_image(
        &self,
        instruction: &str,
        sketch: &Sketch,
    ) -> Result<GeneratedImage, GenerationError>;
}

/// Image-to-video provider exposing a long-running operation.
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Start an operation.
    async fn start(&self, request: &VideoRequest) -> Result<OperationHandle, GenerationError>;

    /// Fetch the current state of an operation.
    async fn poll(&self, handle: &OperationHandle) -> Result<OperationStatus, GenerationError>;
}

/// Tunables of the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Delay between operation polls.
    pub poll_interval: Duration,
    /// Time after which the operation is abandoned.
    pub timeout: Duration,
    /// Largest decoded sketch accepted.
    pub max_sketch_bytes: usize,
    /// Video output parameters.
    pub video: VideoSettings,
}

impl PipelineSettings {
    /// Build from application settings.
    #[must_use]
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            timeout: Duration::from_secs(config.timeout_secs),
            max_sketch_bytes: config.max_sketch_bytes,
            video: VideoSettings::from_config(config),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&GenerationConfig::default())
    }
}

/// Runs one sketch through image and video generation.
pub struct GenerationService {
    images: Arc<dyn ImageGenerator>,
    videos: Arc<dyn VideoGenerator>,
    storage: Arc<StorageService>,
    settings: PipelineSettings,
}

impl GenerationService {
    /// Create a new generation service.
    #[must_use]
    pub fn new(
        images: Arc<dyn ImageGenerator>,
        videos: Arc<dyn VideoGenerator>,
        storage: Arc<StorageService>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            images,
            videos,
            storage,
            settings,
        }
    }

    /// Turn a sketch into a video and return public URLs of the artifacts.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The sketch cannot be decoded
    /// - The image provider fails or returns no image
    /// - An upload fails
    /// - The video operation fails, returns no video, or times out
    pub async fn generate(&self, input: GenerateInput) -> Result<GenerateOutput, GenerationError> {
        let sketch = decode_sketch(&input.image_data, self.settings.max_sketch_bytes)?;

        info!(
            mime_type = sketch.mime_type,
            size = sketch.bytes.len(),
            "Generating image from sketch"
        );
        let image = self
            .images
            .generate_image(DEFAULT_IMAGE_INSTRUCTION, &sketch)
            .await?;
        info!(mime_type = %image.mime_type, size = image.bytes.len(), "Image generated");

        let job = JobFolder::new();
        let video_prompt = effective_prompt(input.prompt.as_deref());

        self.storage
            .upload_bytes(
                &job.sketch_key(sketch.extension),
                sketch.bytes,
                sketch.mime_type,
            )
            .await?;
        self.storage
            .upload_bytes(
                &job.prompt_key(),
                video_prompt.as_bytes().to_vec(),
                "text/plain; charset=utf-8",
            )
            .await?;

        let image_key = job.generated_image_key(extension_for(&image.mime_type));
        let image_gcs_uri = self
            .storage
            .upload_bytes(&image_key, image.bytes, &image.mime_type)
            .await?;

        let request = VideoRequest {
            prompt: video_prompt,
            image_gcs_uri,
            image_mime_type: image.mime_type,
            output_gcs_prefix: self.storage.gcs_uri(&job.video_prefix()),
            sample_count: clamp_sample_count(input.sample_count),
            settings: self.settings.video.clone(),
        };

        info!(job_id = %job.id(), samples = request.sample_count, "Starting video generation");
        let handle = self.videos.start(&request).await?;
        let videos = self.wait_for_videos(&handle).await?;

        let generated_video_urls = videos
            .iter()
            .map(|video| self.storage.public_url_from_gcs_uri(&video.gcs_uri))
            .collect::<Result<Vec<_>, _>>()?;
        let generated_video_url = generated_video_urls
            .first()
            .cloned()
            .ok_or(GenerationError::NoVideo)?;

        info!(job_id = %job.id(), url = %generated_video_url, "Video available");

        Ok(GenerateOutput {
            job_id: job.id(),
            generated_image_url: self.storage.public_url(&image_key),
            generated_video_url,
            generated_video_urls,
        })
    }

    /// Poll the operation until it finishes or the timeout elapses.
    async fn wait_for_videos(
        &self,
        handle: &OperationHandle,
    ) -> Result<Vec<GeneratedVideo>, GenerationError> {
        let started = Instant::now();

        loop {
            match self.videos.poll(handle).await? {
                OperationStatus::Done(videos) if videos.is_empty() => {
                    error!(operation = %handle.name, "Video operation returned no video");
                    return Err(GenerationError::NoVideo);
                }
                OperationStatus::Done(videos) => {
                    info!(operation = %handle.name, count = videos.len(), "Video operation complete");
                    return Ok(videos);
                }
                OperationStatus::Failed(message) => {
                    error!(operation = %handle.name, %message, "Video operation failed");
                    return Err(GenerationError::video(message));
                }
                OperationStatus::Pending => {
                    info!(
                        operation = %handle.name,
                        elapsed_secs = started.elapsed().as_secs(),
                        "Video generation in progress"
                    );
                }
            }

            if started.elapsed() > self.settings.timeout {
                warn!(operation = %handle.name, "Video generation timed out");
                return Err(GenerationError::Timeout(self.settings.timeout));
            }
            sleep(self.settings.poll_interval).await;
        }
    }

    /// Get the storage service.
    #[must_use]
    pub fn storage(&self) -> &StorageService {
        &self.storage
    }
}

/// Trimmed user prompt, or the default when blank.
fn effective_prompt(prompt: Option<&str>) -> String {
    prompt
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_VIDEO_PROMPT)
        .to_string()
}

/// Saturates any requested count into `1..=MAX_SAMPLE_COUNT`.
fn clamp_sample_count(requested: Option<i64>) -> u8 {
    let clamped = requested
        .unwrap_or(1)
        .clamp(1, i64::from(MAX_SAMPLE_COUNT));
    u8::try_from(clamped).unwrap_or(MAX_SAMPLE_COUNT)
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}
