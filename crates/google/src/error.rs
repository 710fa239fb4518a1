//! Errors from the Google REST layer.

/// Errors from the Google REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum GoogleApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("Google API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The API answered 2xx with a body we could not interpret.
    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    /// No usable credential could be obtained.
    #[error("credential error: {0}")]
    Credentials(String),
}

impl GoogleApiError {
    /// Create an invalid response error.
    #[must_use]
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}
