//! CLI error types.

use dbfed_federation::FederationError;
use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Resource not found.
    #[error("{resource_type} not found: {id}")]
    NotFound {
        /// Type of resource.
        resource_type: String,
        /// Resource identifier.
        id: String,
    },

    /// The presented password was rejected.
    #[error("password rejected for {0}")]
    CredentialRejected(String),

    /// Federation provider error.
    #[error(transparent)]
    Federation(#[from] FederationError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Creates a user not found error.
    #[must_use]
    pub fn user_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: "user".to_string(),
            id: id.into(),
        }
    }
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
