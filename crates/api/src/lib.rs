//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - The drawing page and the `/generate` endpoint
//! - Health checks
//! - Mapping of pipeline errors onto HTTP responses

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use sketchmotion_core::generation::GenerationService;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Sketch-to-video pipeline. `None` when provider clients failed to
    /// initialize at start-up; requests then fail with a server error.
    pub generation: Option<Arc<GenerationService>>,
    /// Maximum accepted request body in bytes.
    pub body_limit_bytes: usize,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::public_routes())
        .nest("/api/v1", routes::api_routes())
        .layer(DefaultBodyLimit::max(state.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
