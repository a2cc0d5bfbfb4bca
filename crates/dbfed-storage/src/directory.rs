//! Directory repository trait.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::paging::PagingWindow;
use crate::record::IdentityRecord;

/// Access to the external user directory.
///
/// Implementations must be thread-safe and hold no per-request state.
/// Every read produces fresh [`IdentityRecord`]s owned by the caller.
///
/// ## Security Note
///
/// Presented and new secrets pass through [`validate_credential`] and
/// [`update_credential`] in cleartext and must never be logged.
///
/// [`validate_credential`]: DirectoryRepository::validate_credential
/// [`update_credential`]: DirectoryRepository::update_credential
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    /// Finds a user by the directory's primary identity key.
    ///
    /// Returns `Ok(None)` when no row matches.
    async fn find_by_id(&self, external_id: &str) -> StorageResult<Option<IdentityRecord>>;

    /// Finds a user by username.
    ///
    /// Case sensitivity follows the backing store's collation.
    async fn find_by_username(&self, username: &str) -> StorageResult<Option<IdentityRecord>>;

    /// Counts users, optionally restricted to a search term.
    async fn count(&self, search: Option<&str>) -> StorageResult<u64>;

    /// Lists users matching an optional search term.
    ///
    /// Results are ordered by identity key so that consecutive windows over
    /// unchanged data neither skip nor repeat rows.
    async fn search(
        &self,
        search: Option<&str>,
        window: Option<PagingWindow>,
    ) -> StorageResult<Vec<IdentityRecord>>;

    /// Checks a presented secret against the stored credential.
    ///
    /// Returns `Ok(false)` if the user has no stored credential.
    async fn validate_credential(&self, username: &str, secret: &str) -> StorageResult<bool>;

    /// Replaces the stored credential with a fresh hash of `secret`.
    ///
    /// Returns `Ok(false)` if the username does not exist.
    async fn update_credential(&self, username: &str, secret: &str) -> StorageResult<bool>;

    /// Inserts a minimal user row and returns its identity key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConstraintViolation` if the store rejects the row
    /// and `StorageError::Unsupported` if user creation is not configured.
    async fn create_user(&self, username: &str) -> StorageResult<String>;

    /// Deletes the user with the given identity key.
    ///
    /// Returns `Ok(false)` if nothing was removed.
    async fn remove_user(&self, external_id: &str) -> StorageResult<bool>;

    /// Checks that the directory is reachable.
    async fn test_connection(&self) -> StorageResult<()> {
        Ok(())
    }
}
