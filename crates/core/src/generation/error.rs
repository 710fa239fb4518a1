//! Generation error types.

use std::time::Duration;

use thiserror::Error;

use crate::sketch::SketchError;
use crate::storage::StorageError;

/// Pipeline stage an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Request validation, before any provider is called.
    Input,
    /// Sketch-to-image rendering.
    Image,
    /// Upload and image-to-video animation.
    Video,
}

/// Generation pipeline errors.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The submitted sketch could not be decoded.
    #[error("invalid sketch: {0}")]
    InvalidSketch(#[from] SketchError),

    /// The image provider call failed.
    #[error("{0}")]
    ImageGeneration(String),

    /// The image provider answered without an image.
    #[error("{0}")]
    NoImage(String),

    /// Artifact upload or URL resolution failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The video provider call failed or the operation reported an error.
    #[error("{0}")]
    VideoGeneration(String),

    /// The video operation completed without any video.
    #[error("Video operation completed but returned no video")]
    NoVideo,

    /// The video operation did not complete in time.
    #[error("Video generation timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl GenerationError {
    /// Create an image provider error.
    #[must_use]
    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageGeneration(msg.into())
    }

    /// Create a missing image error.
    #[must_use]
    pub fn no_image(msg: impl Into<String>) -> Self {
        Self::NoImage(msg.into())
    }

    /// Create a video provider error.
    #[must_use]
    pub fn video(msg: impl Into<String>) -> Self {
        Self::VideoGeneration(msg.into())
    }

    /// The pipeline stage this error was raised in.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::InvalidSketch(_) => Stage::Input,
            Self::ImageGeneration(_) | Self::NoImage(_) => Stage::Image,
            Self::Storage(_) | Self::VideoGeneration(_) | Self::NoVideo | Self::Timeout(_) => {
                Stage::Video
            }
        }
    }
}
