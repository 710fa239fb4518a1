//! Application-wide error types.

use thiserror::Error;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A provider call (image, video, storage) failed.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// A long-running provider operation did not finish in time.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Provider clients were not initialized at start-up.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The request body exceeded the configured limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::PayloadTooLarge(_) => 413,
            Self::Timeout(_) => 504,
            Self::ExternalService(_) | Self::Unavailable(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Unavailable(_) => "SERVICE_UNAVAILABLE",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
        }
    }

    /// Returns the message without the category prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(msg)
            | Self::ExternalService(msg)
            | Self::Timeout(msg)
            | Self::Unavailable(msg)
            | Self::PayloadTooLarge(msg) => msg,
        }
    }
}
