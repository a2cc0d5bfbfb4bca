//! Credential kinds and presented credentials.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// The type of a credential, as named by the host.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CredentialKind {
    /// A password.
    Password,
    /// A one-time password.
    Otp,
    /// A WebAuthn authenticator.
    WebAuthn,
    /// Any other host-defined type.
    Other(String),
}

impl CredentialKind {
    /// Returns the host's name for this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Password => "password",
            Self::Otp => "otp",
            Self::WebAuthn => "webauthn",
            Self::Other(kind) => kind,
        }
    }

    /// Returns true for passwords.
    #[must_use]
    pub const fn is_password(&self) -> bool {
        matches!(self, Self::Password)
    }
}

impl From<&str> for CredentialKind {
    fn from(kind: &str) -> Self {
        match kind {
            "password" => Self::Password,
            "otp" => Self::Otp,
            "webauthn" => Self::WebAuthn,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for CredentialKind {
    fn from(kind: String) -> Self {
        Self::from(kind.as_str())
    }
}

impl From<CredentialKind> for String {
    fn from(kind: CredentialKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A credential presented for validation or update.
///
/// The secret is redacted from `Debug` output.
#[derive(Debug, Clone)]
pub struct CredentialInput {
    kind: CredentialKind,
    secret: SecretString,
}

impl CredentialInput {
    /// Creates a credential of any kind.
    #[must_use]
    pub fn new(kind: CredentialKind, secret: impl Into<String>) -> Self {
        Self {
            kind,
            secret: SecretString::new(secret.into()),
        }
    }

    /// Creates a password credential.
    #[must_use]
    pub fn password(secret: impl Into<String>) -> Self {
        Self::new(CredentialKind::Password, secret)
    }

    /// Returns the credential kind.
    #[must_use]
    pub const fn kind(&self) -> &CredentialKind {
        &self.kind
    }

    /// Returns the secret value.
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        self.secret.expose_secret()
    }
}
