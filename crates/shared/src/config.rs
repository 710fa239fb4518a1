//! Application configuration management.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Google Cloud project and credential configuration.
    #[serde(default)]
    pub google: GoogleConfig,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Model identifiers.
    #[serde(default)]
    pub models: ModelConfig,
    /// Generation pipeline settings.
    #[serde(default)]
    pub generation: GenerationConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted request body in bytes.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit() -> usize {
    16 * 1024 * 1024
}

/// Google Cloud configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    /// Google Cloud project ID.
    #[serde(default)]
    pub project_id: String,
    /// Vertex AI region.
    #[serde(default = "default_location")]
    pub location: String,
    /// Gemini API key. When absent the key is read from Secret Manager.
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    /// Secret Manager secret holding the Gemini API key.
    #[serde(default = "default_gemini_secret")]
    pub gemini_secret_name: String,
    /// Static OAuth access token. When absent the metadata server is used.
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            location: default_location(),
            gemini_api_key: None,
            gemini_secret_name: default_gemini_secret(),
            access_token: None,
        }
    }
}

fn default_location() -> String {
    "us-central1".to_string()
}

fn default_gemini_secret() -> String {
    "gemini-api-key".to_string()
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Bucket receiving job artifacts.
    #[serde(default)]
    pub bucket: String,
    /// Path to a service account JSON file. Falls back to ambient credentials.
    #[serde(default)]
    pub credential_path: Option<String>,
    /// Store artifacts on the local filesystem under this root instead of GCS.
    #[serde(default)]
    pub local_root: Option<String>,
    /// Base of public object URLs.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            credential_path: None,
            local_root: None,
            public_base_url: default_public_base_url(),
        }
    }
}

fn default_public_base_url() -> String {
    "https://storage.googleapis.com".to_string()
}

/// Model identifiers.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Gemini model used for sketch-to-image.
    #[serde(default = "default_image_model")]
    pub image: String,
    /// Veo model used for image-to-video.
    #[serde(default = "default_video_model")]
    pub video: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            image: default_image_model(),
            video: default_video_model(),
        }
    }
}

fn default_image_model() -> String {
    "gemini-2.0-flash-exp-image-generation".to_string()
}

fn default_video_model() -> String {
    "veo-3.0-generate-preview".to_string()
}

/// Generation pipeline settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Seconds between polls of the video operation.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Seconds before the video operation is abandoned.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Output aspect ratio.
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    /// Output clip length in seconds.
    #[serde(default = "default_duration")]
    pub duration_seconds: u32,
    /// Person generation policy.
    #[serde(default = "default_person_generation")]
    pub person_generation: String,
    /// Let the provider rewrite the prompt.
    #[serde(default = "default_true")]
    pub enhance_prompt: bool,
    /// Generate an audio track.
    #[serde(default = "default_true")]
    pub generate_audio: bool,
    /// Largest decoded sketch accepted, in bytes.
    #[serde(default = "default_max_sketch_bytes")]
    pub max_sketch_bytes: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            timeout_secs: default_timeout(),
            aspect_ratio: default_aspect_ratio(),
            duration_seconds: default_duration(),
            person_generation: default_person_generation(),
            enhance_prompt: true,
            generate_audio: true,
            max_sketch_bytes: default_max_sketch_bytes(),
        }
    }
}

fn default_poll_interval() -> u64 {
    15
}

fn default_timeout() -> u64 {
    300 // 5 minutes
}

fn default_aspect_ratio() -> String {
    "16:9".to_string()
}

fn default_duration() -> u32 {
    8
}

fn default_person_generation() -> String {
    "allow_adult".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_sketch_bytes() -> usize {
    10 * 1024 * 1024
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources in order of precedence (last wins): `config/default`,
    /// `config/{RUN_MODE}`, `SKETCHMOTION__*` variables, then the bare
    /// Cloud Run variables `PORT`, `PROJECT_ID`, `GCS_BUCKET_NAME`,
    /// `GOOGLE_CLOUD_REGION` and `GEMINI_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or required
    /// values are missing.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SKETCHMOTION").separator("__"))
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .set_override_option("google.project_id", std::env::var("PROJECT_ID").ok())?
            .set_override_option("google.location", std::env::var("GOOGLE_CLOUD_REGION").ok())?
            .set_override_option("google.gemini_api_key", std::env::var("GEMINI_API_KEY").ok())?
            .set_override_option("storage.bucket", std::env::var("GCS_BUCKET_NAME").ok())?;

        Self::from_builder(builder)
    }

    /// Builds and validates configuration from a prepared builder.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or required values are missing.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every required value is present.
    fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if self.google.project_id.trim().is_empty() {
            missing.push("google.project_id");
        }
        if self.storage.bucket.trim().is_empty() {
            missing.push("storage.bucket");
        }
        if self.generation.poll_interval_secs == 0 {
            return Err(ConfigError::Message(
                "generation.poll_interval_secs must be greater than zero".to_string(),
            ));
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(format!(
                "missing required configuration: {}",
                missing.join(", ")
            )))
        }
    }
}
