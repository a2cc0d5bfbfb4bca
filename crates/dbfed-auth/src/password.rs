//! Password hashing and verification.
//!
//! Stored hashes are self-describing where possible:
//! - Argon2id and bcrypt hashes carry their algorithm, salt and cost
//! - SHA digests are written as `{SHA256}<hex>` / `{SHA512}<hex>`
//!
//! An untagged value is read with the configured algorithm, which lets a
//! directory keep a legacy column of bare hex digests.
//!
//! All comparisons are constant-time.

use std::fmt;
use std::str::FromStr;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;

use crate::error::{AuthError, AuthResult};

// ============================================================================
// Hash Algorithm
// ============================================================================

/// Algorithm used to hash new passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Argon2id, PHC string format.
    #[default]
    Argon2id,
    /// bcrypt (Blowfish), modular crypt format.
    Bcrypt,
    /// Unsalted SHA-256 hex digest.
    Sha256,
    /// Unsalted SHA-512 hex digest.
    Sha512,
}

impl HashAlgorithm {
    /// Returns the configuration name of the algorithm.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Argon2id => "argon2id",
            Self::Bcrypt => "bcrypt",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Detects the algorithm a stored hash was produced with.
    ///
    /// Returns `None` for untagged values.
    #[must_use]
    pub fn detect(stored: &str) -> Option<Self> {
        if stored.starts_with("$argon2") {
            Some(Self::Argon2id)
        } else if ["$2a$", "$2b$", "$2x$", "$2y$"]
            .iter()
            .any(|p| stored.starts_with(p))
        {
            Some(Self::Bcrypt)
        } else if stored.starts_with(Self::Sha256.digest_tag()) {
            Some(Self::Sha256)
        } else if stored.starts_with(Self::Sha512.digest_tag()) {
            Some(Self::Sha512)
        } else {
            None
        }
    }

    const fn digest_tag(&self) -> &'static str {
        match self {
            Self::Sha256 => "{SHA256}",
            Self::Sha512 => "{SHA512}",
            Self::Argon2id | Self::Bcrypt => "",
        }
    }

    fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha512 => Sha512::digest(data).to_vec(),
            _ => Sha256::digest(data).to_vec(),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "argon2" | "argon2id" => Ok(Self::Argon2id),
            "bcrypt" | "blowfish" | "blowfishbcrypt" => Ok(Self::Bcrypt),
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(AuthError::InvalidPolicy(format!(
                "unknown hash algorithm '{s}'"
            ))),
        }
    }
}

// ============================================================================
// Password Policy
// ============================================================================

/// Password hashing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
    /// Algorithm for new hashes and untagged stored values.
    pub algorithm: HashAlgorithm,
    /// Argon2 memory cost in KiB.
    pub memory_cost: u32,
    /// Argon2 time cost (iterations).
    pub time_cost: u32,
    /// Argon2 parallelism factor.
    pub parallelism: u32,
    /// Argon2 output hash length.
    pub hash_length: u32,
    /// bcrypt cost factor.
    pub bcrypt_cost: u32,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        // OWASP recommended settings for Argon2id
        Self {
            algorithm: HashAlgorithm::Argon2id,
            memory_cost: 19 * 1024, // 19 MiB
            time_cost: 2,
            parallelism: 1,
            hash_length: 32,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl PasswordPolicy {
    /// Creates a policy for the given algorithm with default parameters.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            ..Self::default()
        }
    }

    /// Sets the Argon2 memory cost in KiB.
    #[must_use]
    pub const fn memory_cost(mut self, kib: u32) -> Self {
        self.memory_cost = kib;
        self
    }

    /// Sets the Argon2 time cost (iterations).
    #[must_use]
    pub const fn time_cost(mut self, iterations: u32) -> Self {
        self.time_cost = iterations;
        self
    }

    /// Sets the Argon2 parallelism factor.
    #[must_use]
    pub const fn parallelism(mut self, p: u32) -> Self {
        self.parallelism = p;
        self
    }

    /// Sets the bcrypt cost factor.
    #[must_use]
    pub const fn bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    #[allow(clippy::missing_const_for_fn)] // Params::new is not const
    fn build_params(&self) -> Result<Params, argon2::Error> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.hash_length as usize),
        )
    }
}

// ============================================================================
// Hasher Service
// ============================================================================

/// Hashes and verifies directory passwords.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasherService {
    policy: PasswordPolicy,
}

impl PasswordHasherService {
    /// Creates a new password hasher with the given policy.
    #[must_use]
    pub const fn new(policy: PasswordPolicy) -> Self {
        Self { policy }
    }

    /// Returns the active policy.
    #[must_use]
    pub const fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Hashes a password with the configured algorithm.
    ///
    /// # Errors
    ///
    /// Returns an error if the policy parameters are invalid.
    pub fn hash(&self, password: &str) -> AuthResult<String> {
        match self.policy.algorithm {
            HashAlgorithm::Argon2id => {
                let salt = SaltString::generate(&mut OsRng);
                let params = self
                    .policy
                    .build_params()
                    .map_err(|e| AuthError::InvalidPolicy(e.to_string()))?;

                let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
                let hash = argon2
                    .hash_password(password.as_bytes(), &salt)
                    .map_err(|e| AuthError::Internal(e.to_string()))?;

                Ok(hash.to_string())
            }
            HashAlgorithm::Bcrypt => bcrypt::hash(password, self.policy.bcrypt_cost)
                .map_err(|e| AuthError::InvalidPolicy(e.to_string())),
            algorithm @ (HashAlgorithm::Sha256 | HashAlgorithm::Sha512) => Ok(format!(
                "{}{}",
                algorithm.digest_tag(),
                hex::encode(algorithm.digest(password.as_bytes()))
            )),
        }
    }

    /// Verifies a password against a stored hash.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` on mismatch and
    /// `AuthError::MalformedHash` if the stored value cannot be read.
    pub fn verify(&self, password: &str, stored: &str) -> AuthResult<()> {
        if self.matches(password, stored)? {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Returns whether a password matches a stored hash.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MalformedHash` if the stored value cannot be read.
    pub fn matches(&self, password: &str, stored: &str) -> AuthResult<bool> {
        let algorithm = HashAlgorithm::detect(stored).unwrap_or(self.policy.algorithm);

        match algorithm {
            HashAlgorithm::Argon2id => {
                let parsed =
                    PasswordHash::new(stored).map_err(|e| AuthError::MalformedHash(e.to_string()))?;

                // Argon2::default() can verify any Argon2 variant
                match Argon2::default().verify_password(password.as_bytes(), &parsed) {
                    Ok(()) => Ok(true),
                    Err(argon2::password_hash::Error::Password) => Ok(false),
                    Err(e) => Err(AuthError::Internal(e.to_string())),
                }
            }
            HashAlgorithm::Bcrypt => bcrypt::verify(password, stored)
                .map_err(|e| AuthError::MalformedHash(e.to_string())),
            HashAlgorithm::Sha256 | HashAlgorithm::Sha512 => {
                let hex_digest = stored.strip_prefix(algorithm.digest_tag()).unwrap_or(stored);
                let expected = hex::decode(hex_digest.trim())
                    .map_err(|e| AuthError::MalformedHash(e.to_string()))?;
                let actual = algorithm.digest(password.as_bytes());

                Ok(bool::from(actual.as_slice().ct_eq(expected.as_slice())))
            }
        }
    }
}
