//! Federation error types.

use dbfed_storage::StorageError;
use thiserror::Error;

/// Errors that can occur during federation operations.
#[derive(Debug, Error)]
pub enum FederationError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Connection error to the user database.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The database rejected a write.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// User lookup error.
    #[error("User lookup error: {0}")]
    UserLookup(String),

    /// Host user id that is not a valid storage id.
    #[error("Invalid storage id: {0}")]
    InvalidStorageId(String),

    /// Operation not supported by this provider.
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Any other storage error.
    #[error("Storage error: {0}")]
    Storage(StorageError),

    /// Internal error.
    #[error("Internal federation error: {0}")]
    Internal(String),
}

impl FederationError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Checks if this is a connection error.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Checks if this is a configuration error.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Checks if the database rejected a write.
    #[must_use]
    pub const fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation(_))
    }
}

impl From<StorageError> for FederationError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Connection(msg) => Self::Connection(msg),
            StorageError::ConstraintViolation(msg) => Self::ConstraintViolation(msg),
            StorageError::Configuration(msg) => Self::Configuration(msg),
            StorageError::Unsupported(op) => Self::NotSupported(op.to_string()),
            StorageError::NotFound { .. } => Self::UserLookup(err.to_string()),
            other => Self::Storage(other),
        }
    }
}

/// Result type for federation operations.
pub type FederationResult<T> = Result<T, FederationError>;
