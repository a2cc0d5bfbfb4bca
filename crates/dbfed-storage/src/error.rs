//! Storage error types.

use thiserror::Error;

/// Errors that can occur during directory storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Entity not found.
    #[error("Entity not found: {entity_type} '{key}'")]
    NotFound {
        /// Type of entity (e.g., "User").
        entity_type: &'static str,
        /// Lookup key that matched nothing.
        key: String,
    },

    /// Unique, foreign key, not-null or check constraint rejected a write.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Invalid data returned by the directory.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Database query error.
    #[error("Database query error: {0}")]
    Query(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Repository is missing required configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Operation is not configured for this directory.
    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),

    /// Credential hashing or verification error.
    #[error("Credential error: {0}")]
    Credential(String),

    /// Internal error.
    #[error("Internal storage error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Creates a not found error for an entity.
    #[must_use]
    pub fn not_found(entity_type: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            key: key.into(),
        }
    }

    /// Creates a constraint violation error.
    #[must_use]
    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::ConstraintViolation(msg.into())
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Checks if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Checks if this is a connection failure.
    #[must_use]
    pub const fn is_connection_failure(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Checks if this is a constraint violation.
    #[must_use]
    pub const fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation(_))
    }

    /// Checks if the operation is not configured.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
