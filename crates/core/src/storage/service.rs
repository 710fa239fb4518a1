//! Storage service implementation using Apache OpenDAL.

use opendal::{ErrorKind, Operator, services};
use tracing::{debug, info};

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Storage service for job artifacts.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::Gcs {
                bucket,
                credential_path,
                endpoint,
            } => {
                let mut builder = services::Gcs::default().bucket(bucket);
                if let Some(path) = credential_path {
                    builder = builder.credential_path(path);
                }
                if let Some(endpoint) = endpoint {
                    builder = builder.endpoint(endpoint);
                }

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::LocalFs { root, .. } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
        }
    }

    /// Upload bytes under `key` and return the object's `gs://` URI.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn upload_bytes(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let size = bytes.len();

        // Filesystem backends reject content-type hints.
        if self
            .operator
            .info()
            .full_capability()
            .write_with_content_type
        {
            self.operator
                .write_with(key, bytes)
                .content_type(content_type)
                .await?;
        } else {
            self.operator.write(key, bytes).await?;
        }

        let uri = self.gcs_uri(key);
        info!(uri = %uri, size, content_type, "Uploaded object");
        Ok(uri)
    }

    /// Check if a file exists in storage.
    pub async fn exists(&self, key: &str) -> bool {
        match self.operator.stat(key).await {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                debug!(key, error = %e, "Stat failed");
                false
            }
        }
    }

    /// `gs://{bucket}/{key}`.
    #[must_use]
    pub fn gcs_uri(&self, key: &str) -> String {
        format!("gs://{}/{key}", self.bucket())
    }

    /// Public HTTPS URL of an object.
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{key}", self.config.public_base_url, self.bucket())
    }

    /// Extract the object key from a `gs://` URI in the configured bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI points elsewhere.
    pub fn key_from_gcs_uri<'a>(&self, uri: &'a str) -> Result<&'a str, StorageError> {
        let prefix = format!("gs://{}/", self.bucket());
        uri.strip_prefix(&prefix)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| StorageError::foreign_uri(uri, self.bucket()))
    }

    /// Translate a `gs://` URI in the configured bucket to its public URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI points elsewhere.
    pub fn public_url_from_gcs_uri(&self, uri: &str) -> Result<String, StorageError> {
        self.key_from_gcs_uri(uri).map(|key| self.public_url(key))
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.config.provider.bucket()
    }
}
