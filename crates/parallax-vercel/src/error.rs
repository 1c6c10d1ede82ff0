//! Error types for the Vercel client.

/// Result type alias using [`VercelError`].
pub type VercelResult<T> = Result<T, VercelError>;

/// Errors that can occur when talking to the provider API.
#[derive(Debug, thiserror::Error)]
pub enum VercelError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message reported by the provider, or the raw body.
        message: String,
    },

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The client was misconfigured.
    #[error("configuration error: {0}")]
    Config(String),
}

impl VercelError {
    /// Create an API error.
    #[must_use]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a not-found error.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}
