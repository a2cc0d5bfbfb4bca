//! Types the identity host hands to the provider.
//!
//! The host owns realms, user handles and the user cache. The provider only
//! sees them through the narrow views in this module.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FederationError, FederationResult};

/// The realm a call is made in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmContext {
    /// Realm ID.
    pub id: Uuid,
    /// Realm name.
    pub name: String,
}

impl RealmContext {
    /// Creates a realm context.
    #[must_use]
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A group handed to group-scoped queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    /// Group ID.
    pub id: String,
    /// Group name.
    pub name: String,
}

/// A role handed to role lifecycle hooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    /// Role ID.
    pub id: String,
    /// Role name.
    pub name: String,
}

/// A cached snapshot of a user held by the host.
pub trait CachedIdentity: Send + Sync {
    /// Time since the snapshot was loaded.
    fn snapshot_age(&self) -> Duration;

    /// Drops the snapshot so the next access reloads it.
    fn invalidate(&self);
}

/// A host-side user handle.
///
/// Handles returned by this provider are [`FederatedUser`]s; handles served
/// from the host cache additionally expose [`CachedIdentity`].
///
/// [`FederatedUser`]: crate::mapper::FederatedUser
pub trait HostUser: Send + Sync {
    /// Host storage id, usually `f:<provider-id>:<external-id>`.
    fn id(&self) -> &str;

    /// Username as the host currently sees it.
    fn username(&self) -> &str;

    /// Email as the host currently sees it.
    fn email(&self) -> Option<&str>;

    /// Cache view, if this handle is a cached snapshot.
    fn cached(&self) -> Option<&dyn CachedIdentity> {
        None
    }
}

/// A host user id, which names the providing component for federated users.
///
/// ```
/// use dbfed_federation::StorageId;
///
/// let id = StorageId::parse("f:users-db:42").unwrap();
/// assert_eq!(id.provider_id(), Some("users-db"));
/// assert_eq!(id.external_id(), "42");
/// assert_eq!(id.to_string(), "f:users-db:42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageId {
    provider_id: Option<String>,
    external_id: String,
}

impl StorageId {
    /// Prefix of federated ids.
    pub const PREFIX: &'static str = "f:";

    /// Creates a federated storage id.
    #[must_use]
    pub fn new(provider_id: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            provider_id: Some(provider_id.into()),
            external_id: external_id.into(),
        }
    }

    /// Parses a host id.
    ///
    /// An id without the `f:` prefix is a plain external id.
    ///
    /// # Errors
    ///
    /// Returns `FederationError::InvalidStorageId` if the id is empty or a
    /// prefixed id lacks either part.
    pub fn parse(id: &str) -> FederationResult<Self> {
        let Some(rest) = id.strip_prefix(Self::PREFIX) else {
            if id.is_empty() {
                return Err(FederationError::InvalidStorageId(id.to_string()));
            }
            return Ok(Self {
                provider_id: None,
                external_id: id.to_string(),
            });
        };

        match rest.split_once(':') {
            Some((provider, external)) if !provider.is_empty() && !external.is_empty() => {
                Ok(Self::new(provider, external))
            }
            _ => Err(FederationError::InvalidStorageId(id.to_string())),
        }
    }

    /// Returns the external part of a host id without allocating.
    ///
    /// Unprefixed or malformed ids are returned unchanged.
    #[must_use]
    pub fn external_id_of(id: &str) -> &str {
        id.strip_prefix(Self::PREFIX)
            .and_then(|rest| rest.split_once(':'))
            .map_or(id, |(_, external)| external)
    }

    /// Returns the provider component id, if federated.
    #[must_use]
    pub fn provider_id(&self) -> Option<&str> {
        self.provider_id.as_deref()
    }

    /// Returns the id within the user database.
    #[must_use]
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    /// Returns true if the id names a provider.
    #[must_use]
    pub const fn is_federated(&self) -> bool {
        self.provider_id.is_some()
    }
}

impl fmt::Display for StorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.provider_id {
            Some(provider) => write!(f, "{}{provider}:{}", Self::PREFIX, self.external_id),
            None => f.write_str(&self.external_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_federated_id() {
        let id = StorageId::parse("f:c0ffee:17").unwrap();
        assert!(id.is_federated());
        assert_eq!(id.provider_id(), Some("c0ffee"));
        assert_eq!(id.external_id(), "17");
    }

    #[test]
    fn external_id_may_contain_colons() {
        let id = StorageId::parse("f:db:urn:user:9").unwrap();
        assert_eq!(id.external_id(), "urn:user:9");
        assert_eq!(StorageId::external_id_of("f:db:urn:user:9"), "urn:user:9");
    }

    #[test]
    fn plain_id_is_external() {
        let id = StorageId::parse("42").unwrap();
        assert!(!id.is_federated());
        assert_eq!(id.to_string(), "42");
        assert_eq!(StorageId::external_id_of("42"), "42");
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(StorageId::parse("").is_err());
        assert!(StorageId::parse("f:db").is_err());
        assert!(StorageId::parse("f::42").is_err());
        assert!(StorageId::parse("f:db:").is_err());
    }
}
