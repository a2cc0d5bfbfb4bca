//! Identity record mapping.
//!
//! Wraps directory rows as host-facing user handles.

use std::collections::BTreeMap;

use dbfed_storage::IdentityRecord;

use crate::host::{HostUser, StorageId};

/// Column names read as the first name, in lookup order.
const FIRST_NAME_COLUMNS: [&str; 3] = ["firstName", "first_name", "firstname"];

/// Column names read as the last name, in lookup order.
const LAST_NAME_COLUMNS: [&str; 3] = ["lastName", "last_name", "lastname"];

// ============================================================================
// Identity Mapper
// ============================================================================

/// Wraps [`IdentityRecord`]s for one provider.
#[derive(Debug, Clone)]
pub struct IdentityMapper {
    provider_id: String,
    allow_overwrite: bool,
}

impl IdentityMapper {
    /// Creates a mapper.
    ///
    /// With `allow_overwrite`, directory values replace cached host values.
    #[must_use]
    pub fn new(provider_id: impl Into<String>, allow_overwrite: bool) -> Self {
        Self {
            provider_id: provider_id.into(),
            allow_overwrite,
        }
    }

    /// Returns the provider component id.
    #[must_use]
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// Wraps a record.
    #[must_use]
    pub fn wrap(&self, record: IdentityRecord) -> FederatedUser {
        let storage_id = StorageId::new(self.provider_id.clone(), record.id());
        FederatedUser {
            id: storage_id.to_string(),
            storage_id,
            record,
            allow_overwrite: self.allow_overwrite,
        }
    }

    /// Wraps every record, keeping order.
    #[must_use]
    pub fn wrap_all(&self, records: Vec<IdentityRecord>) -> Vec<FederatedUser> {
        records.into_iter().map(|r| self.wrap(r)).collect()
    }
}

// ============================================================================
// Federated User
// ============================================================================

/// A directory user as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedUser {
    id: String,
    storage_id: StorageId,
    record: IdentityRecord,
    allow_overwrite: bool,
}

impl FederatedUser {
    /// Returns the storage id.
    #[must_use]
    pub const fn storage_id(&self) -> &StorageId {
        &self.storage_id
    }

    /// Returns the id within the user database.
    #[must_use]
    pub fn external_id(&self) -> &str {
        self.record.id()
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        self.record.username()
    }

    /// Returns the email.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.record.email()
    }

    /// Returns the first name.
    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        FIRST_NAME_COLUMNS.iter().find_map(|c| self.record.get(c))
    }

    /// Returns the last name.
    #[must_use]
    pub fn last_name(&self) -> Option<&str> {
        LAST_NAME_COLUMNS.iter().find_map(|c| self.record.get(c))
    }

    /// Returns any attribute by column name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.record.get(name)
    }

    /// Returns the underlying record.
    #[must_use]
    pub const fn record(&self) -> &IdentityRecord {
        &self.record
    }

    /// Merges directory values with the host's cached copy.
    ///
    /// Without a cached copy the directory values are used as-is. With one,
    /// directory values win only if overwrite is allowed; otherwise the
    /// cached copy is returned unchanged.
    #[must_use]
    pub fn resolve_attributes(&self, cached: Option<&IdentityRecord>) -> BTreeMap<String, String> {
        match cached {
            None => self.record.clone().into_attributes(),
            Some(cached) if self.allow_overwrite => {
                let mut merged = cached.clone().into_attributes();
                merged.extend(
                    self.record
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string())),
                );
                merged
            }
            Some(cached) => cached.clone().into_attributes(),
        }
    }
}

impl HostUser for FederatedUser {
    fn id(&self) -> &str {
        &self.id
    }

    fn username(&self) -> &str {
        self.record.username()
    }

    fn email(&self) -> Option<&str> {
        self.record.email()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> IdentityRecord {
        IdentityRecord::new("1", "alice")
            .with_attribute("email", "alice@example.com")
            .with_attribute("first_name", "Alice")
    }

    #[test]
    fn wrap_builds_storage_id() {
        let mapper = IdentityMapper::new("users-db", false);
        let user = mapper.wrap(alice());

        assert_eq!(HostUser::id(&user), "f:users-db:1");
        assert_eq!(user.external_id(), "1");
        assert_eq!(user.storage_id().provider_id(), Some("users-db"));
    }

    #[test]
    fn accessors_never_fail() {
        let user = IdentityMapper::new("db", false).wrap(alice());

        assert_eq!(user.username(), "alice");
        assert_eq!(user.email(), Some("alice@example.com"));
        assert_eq!(user.first_name(), Some("Alice"));
        assert_eq!(user.last_name(), None);
        assert_eq!(user.attribute("phone"), None);
    }

    #[test]
    fn camel_case_name_columns_take_precedence() {
        let record = IdentityRecord::new("2", "bob")
            .with_attribute("lastName", "Builder")
            .with_attribute("last_name", "ignored");
        let user = IdentityMapper::new("db", false).wrap(record);

        assert_eq!(user.last_name(), Some("Builder"));
    }

    #[test]
    fn overwrite_lets_directory_win() {
        let cached = IdentityRecord::new("1", "alice")
            .with_attribute("email", "old@example.com")
            .with_attribute("locale", "fr");
        let user = IdentityMapper::new("db", true).wrap(alice());

        let resolved = user.resolve_attributes(Some(&cached));
        assert_eq!(resolved["email"], "alice@example.com");
        assert_eq!(resolved["locale"], "fr");
        assert_eq!(resolved["first_name"], "Alice");
    }

    #[test]
    fn without_overwrite_cached_copy_wins() {
        let cached = IdentityRecord::new("1", "alice").with_attribute("email", "old@example.com");
        let user = IdentityMapper::new("db", false).wrap(alice());

        let resolved = user.resolve_attributes(Some(&cached));
        assert_eq!(resolved["email"], "old@example.com");
        assert!(!resolved.contains_key("first_name"));

        let fresh = user.resolve_attributes(None);
        assert_eq!(fresh["email"], "alice@example.com");
    }
}
