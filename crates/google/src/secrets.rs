//! Secret Manager access and Gemini API key resolution.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tracing::info;

use crate::auth::TokenProvider;
use crate::error::GoogleApiError;
use crate::http::parse_response;

/// Default Secret Manager endpoint.
pub const DEFAULT_SECRET_MANAGER_URL: &str = "https://secretmanager.googleapis.com";

/// HTTP client for Secret Manager.
pub struct SecretManagerClient {
    client: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    base_url: String,
    project: String,
}

#[derive(Debug, Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    data: String,
}

impl SecretManagerClient {
    /// Create a client for secrets in `project`.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        tokens: Arc<dyn TokenProvider>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            client,
            tokens,
            base_url: DEFAULT_SECRET_MANAGER_URL.to_string(),
            project: project.into(),
        }
    }

    /// Override the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn latest_version_url(&self, secret: &str) -> String {
        format!(
            "{}/v1/projects/{}/secrets/{secret}/versions/latest:access",
            self.base_url, self.project
        )
    }

    /// Read the latest version of `secret` as UTF-8 text.
    pub async fn access_latest(&self, secret: &str) -> Result<String, GoogleApiError> {
        let token = self.tokens.access_token().await?;

        let response = self
            .client
            .get(self.latest_version_url(secret))
            .bearer_auth(token)
            .send()
            .await?;

        let body: AccessSecretVersionResponse = parse_response(response).await?;
        decode_payload(&body.payload.data)
    }
}

fn decode_payload(data: &str) -> Result<String, GoogleApiError> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| GoogleApiError::invalid_response(format!("secret payload is not base64: {e}")))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| GoogleApiError::invalid_response("secret payload is not UTF-8"))?;
    Ok(text.trim().to_string())
}

/// Resolve the Gemini API key: a configured key wins, otherwise the key is
/// read from Secret Manager.
pub async fn resolve_api_key(
    configured: Option<&str>,
    secrets: &SecretManagerClient,
    secret_name: &str,
) -> Result<String, GoogleApiError> {
    let key = match configured.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => {
            info!("Using Gemini API key from configuration");
            key.to_string()
        }
        None => {
            info!(secret = secret_name, "Fetching Gemini API key from Secret Manager");
            secrets.access_latest(secret_name).await?
        }
    };

    if key.is_empty() {
        return Err(GoogleApiError::Credentials(format!(
            "secret '{secret_name}' is empty"
        )));
    }

    info!(key = %mask_secret(&key), "Gemini API key retrieved");
    Ok(key)
}

/// First and last five characters of a secret, for logs.
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 10 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..5].iter().collect();
    let tail: String = chars[chars.len() - 5..].iter().collect();
    format!("{head}...{tail}")
}
