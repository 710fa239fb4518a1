//! Sketch-to-video generation route.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use sketchmotion_core::generation::{GenerateInput, GenerateOutput};
use sketchmotion_shared::AppError;

use crate::{AppState, error::ApiError};

/// Creates the generation route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/generate", post(generate))
}

/// Request body for `/generate`.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Base64 sketch, optionally prefixed as a data URL.
    #[serde(default)]
    pub image_data: Option<String>,
    /// Optional animation prompt.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Optional number of videos, clamped to the supported range.
    #[serde(default)]
    pub sample_count: Option<i64>,
}

/// POST /generate
///
/// Runs the sketch through image and video generation and answers with the
/// public URLs of the artifacts.
async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateOutput>, ApiError> {
    let Some(service) = state.generation.as_ref() else {
        error!("Generation requested but provider clients are not initialized");
        return Err(AppError::Unavailable(
            "Server-side client initialization failed".to_string(),
        )
        .into());
    };

    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection, "Rejected generation request body");
        ApiError::from(rejection)
    })?;

    let Some(image_data) = request.image_data.filter(|data| !data.trim().is_empty()) else {
        return Err(AppError::Validation("Missing image_data in request".to_string()).into());
    };

    info!(
        payload_len = image_data.len(),
        has_prompt = request.prompt.is_some(),
        sample_count = ?request.sample_count,
        "Received generation request"
    );

    let output = service
        .generate(GenerateInput {
            image_data,
            prompt: request.prompt,
            sample_count: request.sample_count,
        })
        .await
        .map_err(|e| {
            error!(error = %e, stage = ?e.stage(), "Generation failed");
            ApiError::from(e)
        })?;

    info!(job_id = %output.job_id, videos = output.generated_video_urls.len(), "Generation complete");
    Ok(Json(output))
}
