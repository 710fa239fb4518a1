//! OAuth access tokens for Google APIs.
//!
//! On Cloud Run and GCE the metadata server hands out tokens for the
//! attached service account. Elsewhere a token can be supplied directly,
//! e.g. from `gcloud auth print-access-token`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::error::GoogleApiError;
use crate::http::parse_response;

/// Default metadata server token endpoint.
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Tokens this close to expiry are refreshed.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Source of bearer tokens.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// A currently valid access token.
    async fn access_token(&self) -> Result<String, GoogleApiError>;
}

/// A fixed token.
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    /// Wrap a token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, GoogleApiError> {
        if self.token.trim().is_empty() {
            return Err(GoogleApiError::Credentials(
                "static access token is empty".to_string(),
            ));
        }
        Ok(self.token.clone())
    }
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Tokens from the GCE / Cloud Run metadata server, reused until near expiry.
pub struct MetadataServerToken {
    client: reqwest::Client,
    url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl MetadataServerToken {
    /// Create a provider against the default metadata endpoint.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_url(client, METADATA_TOKEN_URL)
    }

    /// Create a provider against a custom endpoint.
    #[must_use]
    pub fn with_url(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            cached: Mutex::new(None),
        }
    }

    async fn fetch(&self) -> Result<MetadataToken, GoogleApiError> {
        let response = self
            .client
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| GoogleApiError::Credentials(format!("metadata server unreachable: {e}")))?;

        parse_response(response).await
    }
}

#[async_trait]
impl TokenProvider for MetadataServerToken {
    async fn access_token(&self) -> Result<String, GoogleApiError> {
        let mut cached = self.cached.lock().await;

        if let Some(entry) = cached.as_ref()
            && Instant::now() + EXPIRY_MARGIN < entry.expires_at
        {
            return Ok(entry.token.clone());
        }

        let fresh = self.fetch().await?;
        debug!(expires_in = fresh.expires_in, "Fetched access token from metadata server");

        let token = fresh.access_token.clone();
        *cached = Some(CachedToken {
            token: fresh.access_token,
            expires_at: Instant::now() + Duration::from_secs(fresh.expires_in),
        });
        Ok(token)
    }
}
