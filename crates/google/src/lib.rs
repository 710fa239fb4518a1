//! REST clients for the Google services SketchMotion delegates to.
//!
//! - [`GeminiClient`] renders sketches (implements `ImageGenerator`)
//! - [`VeoClient`] animates images (implements `VideoGenerator`)
//! - [`SecretManagerClient`] reads the Gemini API key
//! - [`TokenProvider`] supplies OAuth tokens for Vertex AI and Secret Manager

pub mod auth;
pub mod error;
pub mod gemini;
mod http;
pub mod secrets;
pub mod veo;

#[cfg(test)]
mod test_server;

use std::sync::Arc;

use sketchmotion_shared::config::GoogleConfig;

pub use auth::{MetadataServerToken, StaticToken, TokenProvider};
pub use error::GoogleApiError;
pub use gemini::GeminiClient;
pub use secrets::{SecretManagerClient, mask_secret, resolve_api_key};
pub use veo::VeoClient;

/// Pick a token provider: a configured static token, or the metadata server.
#[must_use]
pub fn token_provider(config: &GoogleConfig, client: reqwest::Client) -> Arc<dyn TokenProvider> {
    match config.access_token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => Arc::new(StaticToken::new(token)),
        _ => Arc::new(MetadataServerToken::new(client)),
    }
}
