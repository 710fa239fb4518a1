//! Sketch-to-video generation pipeline.
//!
//! This module drives one request end to end:
//! - Sketch decoding
//! - Photorealistic rendering through an [`ImageGenerator`]
//! - Artifact upload into a job folder
//! - Animation through a [`VideoGenerator`] long-running operation
//! - Public URL resolution of the produced videos
//!
//! Provider clients live in a separate crate and plug in through the traits.

mod error;
mod service;
mod types;

pub use error::{GenerationError, Stage};
pub use service::{GenerationService, ImageGenerator, PipelineSettings, VideoGenerator};
pub use types::{
    GenerateInput, GenerateOutput, GeneratedImage, GeneratedVideo, OperationHandle,
    OperationStatus, VideoRequest, VideoSettings,
};
