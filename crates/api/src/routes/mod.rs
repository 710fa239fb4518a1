//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod generate;
pub mod health;
pub mod index;

/// Routes served at the root: the drawing page and the form endpoint.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .merge(index::routes())
        .merge(generate::routes())
}

/// Creates the versioned API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(generate::routes())
}
