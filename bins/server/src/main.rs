//! SketchMotion API Server
//!
//! Main entry point for the sketch-to-video service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sketchmotion_api::{AppState, create_router};
use sketchmotion_core::generation::{GenerationService, PipelineSettings};
use sketchmotion_core::storage::{StorageConfig, StorageService};
use sketchmotion_google::{
    GeminiClient, SecretManagerClient, VeoClient, resolve_api_key, token_provider,
};
use sketchmotion_shared::AppConfig;

/// Timeout of a single outbound HTTP call.
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sketchmotion=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(
        project = %config.google.project_id,
        location = %config.google.location,
        bucket = %config.storage.bucket,
        "Configuration loaded"
    );

    // A failed client setup keeps the server up; /generate then answers 500.
    let generation = match build_generation(&config).await {
        Ok(service) => {
            info!("Generation clients initialized");
            Some(Arc::new(service))
        }
        Err(e) => {
            error!(error = ?e, "Failed to initialize generation clients");
            None
        }
    };

    let state = AppState {
        generation,
        body_limit_bytes: config.server.body_limit_bytes,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Wire storage and provider clients into the pipeline.
async fn build_generation(config: &AppConfig) -> anyhow::Result<GenerationService> {
    let http = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;
    let tokens = token_provider(&config.google, http.clone());

    let storage = StorageService::from_config(StorageConfig::from_settings(&config.storage))
        .context("Failed to initialize storage")?;
    info!(
        provider = storage.provider_name(),
        bucket = storage.bucket(),
        "Storage service configured"
    );

    let secrets = SecretManagerClient::new(http.clone(), tokens.clone(), &config.google.project_id);
    let api_key = resolve_api_key(
        config.google.gemini_api_key.as_deref(),
        &secrets,
        &config.google.gemini_secret_name,
    )
    .await
    .context("Failed to resolve Gemini API key")?;

    let images = GeminiClient::new(http.clone(), &config.models.image, api_key);
    let videos = VeoClient::new(
        http,
        tokens,
        &config.google.project_id,
        &config.google.location,
        &config.models.video,
    );
    info!(
        image_model = %config.models.image,
        video_model = %config.models.video,
        "Model clients configured"
    );

    Ok(GenerationService::new(
        Arc::new(images),
        Arc::new(videos),
        Arc::new(storage),
        PipelineSettings::from_config(&config.generation),
    ))
}
