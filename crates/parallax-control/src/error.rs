//! Error types for parallax-control.

/// Result type alias using [`ControlError`].
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in the control service.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Provider API error.
    #[error("provider error: {0}")]
    Provider(#[from] parallax_vercel::VercelError),

    /// Tenant not found.
    #[error("tenant not found: {0}")]
    TenantNotFound(String),

    /// Deployment record not found.
    #[error("deployment not found: {0}")]
    DeploymentNotFound(String),

    /// Environment variable record not found.
    #[error("environment variable not found: {0}")]
    EnvVariableNotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialisation error.
    #[error("serialisation error: {0}")]
    Serialisation(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ControlError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
