//! Identity records read from the directory.
//!
//! The column set of the backing store is defined by configuration, so a
//! record is a plain attribute map rather than a fixed struct. Every record
//! carries at least an `id` and a `username`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// A single directory user as attribute name to value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct IdentityRecord {
    attributes: BTreeMap<String, String>,
}

impl IdentityRecord {
    /// Attribute holding the directory's primary identity key.
    pub const ID: &'static str = "id";

    /// Attribute holding the login name.
    pub const USERNAME: &'static str = "username";

    /// Attribute holding the email address.
    pub const EMAIL: &'static str = "email";

    /// Creates a minimal record with only `id` and `username`.
    #[must_use]
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(Self::ID.to_string(), id.into());
        attributes.insert(Self::USERNAME.to_string(), username.into());
        Self { attributes }
    }

    /// Builds a record from a raw attribute map.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidData` if `id` or `username` is missing.
    pub fn from_attributes(attributes: BTreeMap<String, String>) -> StorageResult<Self> {
        for required in [Self::ID, Self::USERNAME] {
            if !attributes.contains_key(required) {
                return Err(StorageError::InvalidData(format!(
                    "directory row has no '{required}' column"
                )));
            }
        }
        Ok(Self { attributes })
    }

    /// Adds an attribute, replacing any previous value.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Returns the directory identity key.
    #[must_use]
    pub fn id(&self) -> &str {
        self.get(Self::ID).unwrap_or_default()
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        self.get(Self::USERNAME).unwrap_or_default()
    }

    /// Returns the email, if the directory provides one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.get(Self::EMAIL)
    }

    /// Gets an attribute value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Checks whether the record has an attribute.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Iterates over attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Always false, a record holds at least `id` and `username`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Consumes the record, returning the raw attributes.
    #[must_use]
    pub fn into_attributes(self) -> BTreeMap<String, String> {
        self.attributes
    }
}

impl TryFrom<BTreeMap<String, String>> for IdentityRecord {
    type Error = StorageError;

    fn try_from(attributes: BTreeMap<String, String>) -> StorageResult<Self> {
        Self::from_attributes(attributes)
    }
}

impl From<IdentityRecord> for BTreeMap<String, String> {
    fn from(record: IdentityRecord) -> Self {
        record.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_record() {
        let record = IdentityRecord::new("1", "alice");

        assert_eq!(record.id(), "1");
        assert_eq!(record.username(), "alice");
        assert_eq!(record.email(), None);
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn from_attributes_requires_identity_columns() {
        let mut attrs = BTreeMap::new();
        attrs.insert("id".to_string(), "7".to_string());

        let err = IdentityRecord::from_attributes(attrs.clone()).unwrap_err();
        assert!(matches!(err, StorageError::InvalidData(_)));

        attrs.insert("username".to_string(), "bob".to_string());
        attrs.insert("email".to_string(), "b@x.com".to_string());
        let record = IdentityRecord::from_attributes(attrs).unwrap();
        assert_eq!(record.email(), Some("b@x.com"));
    }

    #[test]
    fn attributes_iterate_in_name_order() {
        let record = IdentityRecord::new("1", "alice")
            .with_attribute("lastName", "Liddell")
            .with_attribute("email", "a@x.com");

        let names: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["email", "id", "lastName", "username"]);
    }

    #[test]
    fn deserialize_rejects_incomplete_record() {
        let result: Result<IdentityRecord, _> = serde_json::from_str(r#"{"username":"x"}"#);
        assert!(result.is_err());

        let record: IdentityRecord =
            serde_json::from_str(r#"{"id":"3","username":"carol"}"#).unwrap();
        assert_eq!(record.username(), "carol");
    }
}
