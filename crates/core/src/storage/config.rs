//! Storage configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use sketchmotion_shared::config::StorageSettings;

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// Google Cloud Storage.
    Gcs {
        /// GCS bucket name.
        bucket: String,
        /// Service account JSON file. Ambient credentials are used when absent.
        credential_path: Option<String>,
        /// Custom endpoint (emulators).
        endpoint: Option<String>,
    },
    /// Local filesystem (development only).
    ///
    /// The bucket name is kept so `gs://` URIs stay meaningful.
    LocalFs {
        /// Root directory path.
        root: PathBuf,
        /// Logical bucket name.
        bucket: String,
    },
}

impl StorageProvider {
    /// Create a Google Cloud Storage provider using ambient credentials.
    #[must_use]
    pub fn gcs(bucket: impl Into<String>) -> Self {
        Self::Gcs {
            bucket: bucket.into(),
            credential_path: None,
            endpoint: None,
        }
    }

    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self::LocalFs {
            root: root.into(),
            bucket: bucket.into(),
        }
    }

    /// Get the provider name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gcs { .. } => "gcs",
            Self::LocalFs { .. } => "local",
        }
    }

    /// Get the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::Gcs { bucket, .. } | Self::LocalFs { bucket, .. } => bucket,
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Base of public object URLs, without trailing slash.
    pub public_base_url: String,
}

impl StorageConfig {
    /// Default public URL base for GCS objects.
    pub const DEFAULT_PUBLIC_BASE_URL: &'static str = "https://storage.googleapis.com";

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            public_base_url: Self::DEFAULT_PUBLIC_BASE_URL.to_string(),
        }
    }

    /// Set the public URL base.
    #[must_use]
    pub fn with_public_base_url(mut self, base: impl Into<String>) -> Self {
        self.public_base_url = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Build from application settings. A `local_root` selects the
    /// filesystem provider.
    #[must_use]
    pub fn from_settings(settings: &StorageSettings) -> Self {
        let provider = match &settings.local_root {
            Some(root) => StorageProvider::local_fs(root, &settings.bucket),
            None => StorageProvider::Gcs {
                bucket: settings.bucket.clone(),
                credential_path: settings.credential_path.clone(),
                endpoint: None,
            },
        };

        Self::new(provider).with_public_base_url(&settings.public_base_url)
    }
}
