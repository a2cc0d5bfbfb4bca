//! # dbfed-auth
//!
//! Credential hashing for database user federation.
//!
//! Directories store password hashes produced by many different systems.
//! This crate recognises the stored format from its tag, verifies presented
//! secrets in constant time, and produces new hashes with the configured
//! algorithm.
//!
//! ## Supported Formats
//!
//! - Argon2id PHC strings (`$argon2id$...`)
//! - bcrypt (`$2a$`, `$2b$`, `$2y$`)
//! - Unsalted SHA-256 / SHA-512 hex digests (`{SHA256}...`, `{SHA512}...`,
//!   or untagged legacy columns)
//!
//! ## Example
//!
//! ```ignore
//! use dbfed_auth::{HashAlgorithm, PasswordHasherService, PasswordPolicy};
//!
//! let hasher = PasswordHasherService::new(PasswordPolicy::new(HashAlgorithm::Argon2id));
//! let hash = hasher.hash("password123")?;
//! hasher.verify("password123", &hash)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod password;

pub use error::{AuthError, AuthResult};
pub use password::{HashAlgorithm, PasswordHasherService, PasswordPolicy};
