//! Credential error types.

use std::fmt;

/// Credential hashing and verification errors.
#[derive(Debug)]
pub enum AuthError {
    /// Presented secret does not match the stored hash.
    InvalidCredentials,
    /// Stored hash could not be parsed.
    MalformedHash(String),
    /// Hash algorithm parameters are invalid.
    InvalidPolicy(String),
    /// Internal error.
    Internal(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::MalformedHash(msg) => write!(f, "malformed stored hash: {msg}"),
            Self::InvalidPolicy(msg) => write!(f, "invalid password policy: {msg}"),
            Self::Internal(msg) => write!(f, "internal credential error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl AuthError {
    /// Returns true if the secret simply did not match.
    #[must_use]
    pub const fn is_mismatch(&self) -> bool {
        matches!(self, Self::InvalidCredentials)
    }
}

/// Result type for credential operations.
pub type AuthResult<T> = Result<T, AuthError>;
