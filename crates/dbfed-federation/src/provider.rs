//! User storage provider traits and the database-backed provider.
//!
//! ## Security
//!
//! - Presented passwords are never logged
//! - Stored hashes are compared inside the repository and never returned

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use dbfed_auth::PasswordHasherService;
use dbfed_storage::{DirectoryRepository, IdentityRecord, PagingWindow};
use dbfed_storage_sql::SqlDirectoryRepository;
use tracing::{debug, info};

use crate::config::{PROVIDER_TYPE, ProviderConfig};
use crate::credential::{CredentialInput, CredentialKind};
use crate::error::FederationResult;
use crate::host::{GroupRef, HostUser, RealmContext, RoleRef, StorageId};
use crate::mapper::{FederatedUser, IdentityMapper};
use crate::reconcile::{ReconcileOutcome, ReconciliationPolicy};

// ============================================================================
// User Storage Provider
// ============================================================================

/// Which users a count covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UserCountQuery {
    /// Every user.
    #[default]
    All,
    /// Every user, with or without service accounts.
    IncludingServiceAccounts(bool),
    /// Members of the given groups.
    InGroups(BTreeSet<String>),
    /// Users matching a search term.
    Search(String),
    /// Users matching a search term within groups.
    SearchInGroups {
        /// Search term.
        search: String,
        /// Group IDs.
        groups: BTreeSet<String>,
    },
    /// Users matching attribute parameters.
    Params(BTreeMap<String, String>),
    /// Users matching attribute parameters within groups.
    ParamsInGroups {
        /// Attribute parameters.
        params: BTreeMap<String, String>,
        /// Group IDs.
        groups: BTreeSet<String>,
    },
}

impl UserCountQuery {
    /// Returns the search term the count is filtered by.
    ///
    /// Group and parameter filters are not supported and count every user.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        match self {
            Self::Search(search) | Self::SearchInGroups { search, .. } => Some(search),
            _ => None,
        }
    }
}

/// Trait for user storage federation providers.
///
/// Paging windows arrive already normalized; see
/// [`PagingWindow::normalize`].
#[allow(async_fn_in_trait)]
pub trait UserStorageProvider: Send + Sync {
    /// Returns the provider configuration.
    fn config(&self) -> &ProviderConfig;

    /// Returns the provider type identifier.
    fn provider_type(&self) -> &'static str;

    /// Validates the provider configuration.
    async fn validate_config(&self) -> FederationResult<()>;

    /// Tests the connection to the external store.
    async fn test_connection(&self) -> FederationResult<()>;

    // === User Lookup ===

    /// Gets a user by host storage id.
    async fn get_user_by_id(
        &self,
        realm: &RealmContext,
        id: &str,
    ) -> FederationResult<Option<FederatedUser>>;

    /// Gets a user by username.
    async fn get_user_by_username(
        &self,
        realm: &RealmContext,
        username: &str,
    ) -> FederationResult<Option<FederatedUser>>;

    /// Gets a user by email.
    async fn get_user_by_email(
        &self,
        realm: &RealmContext,
        email: &str,
    ) -> FederationResult<Option<FederatedUser>>;

    // === User Query ===

    /// Lists users.
    async fn get_users(
        &self,
        realm: &RealmContext,
        window: Option<PagingWindow>,
    ) -> FederationResult<Vec<FederatedUser>>;

    /// Searches users by a free-text term.
    async fn search_users(
        &self,
        realm: &RealmContext,
        search: &str,
        window: Option<PagingWindow>,
    ) -> FederationResult<Vec<FederatedUser>>;

    /// Searches users by attribute parameters.
    async fn search_users_by_params(
        &self,
        realm: &RealmContext,
        params: &BTreeMap<String, String>,
        window: Option<PagingWindow>,
    ) -> FederationResult<Vec<FederatedUser>>;

    /// Counts users.
    async fn count_users(
        &self,
        realm: &RealmContext,
        query: &UserCountQuery,
    ) -> FederationResult<u64>;

    /// Lists members of a group.
    async fn get_group_members(
        &self,
        _realm: &RealmContext,
        _group: &GroupRef,
        _window: Option<PagingWindow>,
    ) -> FederationResult<Vec<FederatedUser>> {
        Ok(Vec::new())
    }

    /// Finds users by a single attribute value.
    async fn search_users_by_attribute(
        &self,
        _realm: &RealmContext,
        _name: &str,
        _value: &str,
    ) -> FederationResult<Vec<FederatedUser>> {
        Ok(Vec::new())
    }

    // === User Registration ===

    /// Creates a user in the external store.
    ///
    /// Returns `Ok(None)` if this provider does not create users, so the
    /// host can try the next one.
    async fn add_user(
        &self,
        realm: &RealmContext,
        username: &str,
    ) -> FederationResult<Option<FederatedUser>>;

    /// Removes a user from the external store.
    ///
    /// Returns `Ok(false)` if nothing was removed.
    async fn remove_user(
        &self,
        realm: &RealmContext,
        user: &dyn HostUser,
    ) -> FederationResult<bool>;

    // === Lifecycle ===

    /// Called before a realm is removed.
    fn pre_remove_realm(&self, _realm: &RealmContext) {}

    /// Called before a group is removed.
    fn pre_remove_group(&self, _realm: &RealmContext, _group: &GroupRef) {}

    /// Called before a role is removed.
    fn pre_remove_role(&self, _realm: &RealmContext, _role: &RoleRef) {}

    /// Closes the provider, releasing any resources.
    async fn close(&self) -> FederationResult<()> {
        Ok(())
    }
}

// ============================================================================
// Credential Validator
// ============================================================================

/// Trait for validating credentials against the external store.
///
/// Secrets must never be logged.
#[allow(async_fn_in_trait)]
pub trait CredentialValidator: Send + Sync {
    /// Checks if the provider handles this credential kind.
    fn supports_credential_type(&self, kind: &CredentialKind) -> bool;

    /// Checks if `user` has a credential of this kind.
    fn is_configured_for(
        &self,
        _realm: &RealmContext,
        _user: &dyn HostUser,
        kind: &CredentialKind,
    ) -> bool {
        self.supports_credential_type(kind)
    }

    /// Validates a presented credential.
    ///
    /// Returns `Ok(false)` for unsupported kinds.
    async fn is_valid(
        &self,
        realm: &RealmContext,
        user: &dyn HostUser,
        input: &CredentialInput,
    ) -> FederationResult<bool>;

    /// Replaces a stored credential.
    ///
    /// Returns `Ok(false)` if the credential was not updated.
    async fn update_credential(
        &self,
        realm: &RealmContext,
        user: &dyn HostUser,
        input: &CredentialInput,
    ) -> FederationResult<bool>;

    /// Disables a credential kind for a user.
    fn disable_credential_type(
        &self,
        _realm: &RealmContext,
        _user: &dyn HostUser,
        _kind: &CredentialKind,
    ) {
    }

    /// Credential kinds that can be disabled for a user.
    fn disableable_credential_types(
        &self,
        _realm: &RealmContext,
        _user: &dyn HostUser,
    ) -> BTreeSet<CredentialKind> {
        BTreeSet::new()
    }
}

// ============================================================================
// Database Provider
// ============================================================================

/// User storage provider backed by a relational database.
pub struct DbUserStorageProvider {
    config: Arc<ProviderConfig>,
    repository: Arc<dyn DirectoryRepository>,
    mapper: IdentityMapper,
    policy: ReconciliationPolicy,
}

impl DbUserStorageProvider {
    /// Creates a provider over an existing repository.
    #[must_use]
    pub fn new(config: ProviderConfig, repository: Arc<dyn DirectoryRepository>) -> Self {
        let mapper = IdentityMapper::new(config.id.clone(), config.allow_database_to_overwrite);
        Self {
            config: Arc::new(config),
            repository,
            mapper,
            policy: ReconciliationPolicy::default(),
        }
    }

    /// Connects to the configured database and creates a provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the pool cannot
    /// be created.
    pub async fn connect(config: ProviderConfig) -> FederationResult<Self> {
        config.validate()?;
        let hasher = PasswordHasherService::new(config.password_policy.clone());
        let repository = SqlDirectoryRepository::connect(
            &config.pool,
            config.dialect,
            config.queries.clone(),
            hasher,
        )
        .await?;

        info!(
            provider_id = %config.id,
            dialect = %config.dialect,
            url = %config.pool.redacted_url(),
            "User database connected"
        );
        Ok(Self::new(config, Arc::new(repository)))
    }

    /// Replaces the reconciliation policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ReconciliationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the reconciliation policy.
    #[must_use]
    pub const fn policy(&self) -> ReconciliationPolicy {
        self.policy
    }

    async fn find(
        &self,
        search: Option<&str>,
        window: Option<PagingWindow>,
    ) -> FederationResult<Vec<FederatedUser>> {
        let records = self.repository.search(search, window).await?;
        Ok(self.mapper.wrap_all(records))
    }
}

impl UserStorageProvider for DbUserStorageProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn provider_type(&self) -> &'static str {
        PROVIDER_TYPE
    }

    async fn validate_config(&self) -> FederationResult<()> {
        self.config.validate()
    }

    async fn test_connection(&self) -> FederationResult<()> {
        self.repository.test_connection().await.map_err(Into::into)
    }

    async fn get_user_by_id(
        &self,
        realm: &RealmContext,
        id: &str,
    ) -> FederationResult<Option<FederatedUser>> {
        info!(realm_id = %realm.id, user_id = id, "Lookup user by id");

        let external_id = StorageId::external_id_of(id);
        let record = self.repository.find_by_id(external_id).await?;
        if record.is_none() {
            debug!(external_id, "No user for id, expect a login error");
        }
        Ok(record.map(|r| self.mapper.wrap(r)))
    }

    async fn get_user_by_username(
        &self,
        realm: &RealmContext,
        username: &str,
    ) -> FederationResult<Option<FederatedUser>> {
        info!(realm_id = %realm.id, username, "Lookup user by username");

        let record = self.repository.find_by_username(username).await?;
        Ok(record.map(|r| self.mapper.wrap(r)))
    }

    async fn get_user_by_email(
        &self,
        realm: &RealmContext,
        email: &str,
    ) -> FederationResult<Option<FederatedUser>> {
        info!(realm_id = %realm.id, email, "Lookup user by email");

        // Emails are looked up as usernames.
        self.get_user_by_username(realm, email).await
    }

    async fn get_users(
        &self,
        realm: &RealmContext,
        window: Option<PagingWindow>,
    ) -> FederationResult<Vec<FederatedUser>> {
        info!(realm_id = %realm.id, ?window, "List users");
        self.find(None, window).await
    }

    async fn search_users(
        &self,
        realm: &RealmContext,
        search: &str,
        window: Option<PagingWindow>,
    ) -> FederationResult<Vec<FederatedUser>> {
        info!(realm_id = %realm.id, search, ?window, "Search users");
        self.find(Some(search), window).await
    }

    async fn search_users_by_params(
        &self,
        realm: &RealmContext,
        params: &BTreeMap<String, String>,
        window: Option<PagingWindow>,
    ) -> FederationResult<Vec<FederatedUser>> {
        info!(realm_id = %realm.id, ?params, ?window, "Search users by params");
        let search = params.values().next().map(String::as_str);
        self.find(search, window).await
    }

    async fn count_users(
        &self,
        realm: &RealmContext,
        query: &UserCountQuery,
    ) -> FederationResult<u64> {
        debug!(realm_id = %realm.id, ?query, "Count users");
        Ok(self.repository.count(query.search_term()).await?)
    }

    async fn get_group_members(
        &self,
        realm: &RealmContext,
        group: &GroupRef,
        window: Option<PagingWindow>,
    ) -> FederationResult<Vec<FederatedUser>> {
        info!(realm_id = %realm.id, group_id = %group.id, ?window, "Search group members");
        Ok(Vec::new())
    }

    async fn search_users_by_attribute(
        &self,
        realm: &RealmContext,
        name: &str,
        value: &str,
    ) -> FederationResult<Vec<FederatedUser>> {
        info!(realm_id = %realm.id, attr_name = name, attr_value = value, "Search users by attribute");
        Ok(Vec::new())
    }

    async fn add_user(
        &self,
        realm: &RealmContext,
        username: &str,
    ) -> FederationResult<Option<FederatedUser>> {
        match self.repository.create_user(username).await {
            Ok(id) => {
                info!(realm_id = %realm.id, user_id = %id, username, "Added user");
                Ok(Some(self.mapper.wrap(IdentityRecord::new(id, username))))
            }
            Err(e) if e.is_unsupported() => {
                debug!(username, "User creation not configured, skipping provider");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_user(
        &self,
        realm: &RealmContext,
        user: &dyn HostUser,
    ) -> FederationResult<bool> {
        let external_id = StorageId::external_id_of(user.id());
        let removed = self.repository.remove_user(external_id).await?;
        if removed {
            info!(
                realm_id = %realm.id,
                user_id = user.id(),
                username = user.username(),
                "Deleted user"
            );
        }
        Ok(removed)
    }

    fn pre_remove_realm(&self, realm: &RealmContext) {
        info!(realm_id = %realm.id, "Pre-remove realm");
    }

    fn pre_remove_group(&self, realm: &RealmContext, group: &GroupRef) {
        info!(realm_id = %realm.id, group_id = %group.id, "Pre-remove group");
    }

    fn pre_remove_role(&self, realm: &RealmContext, role: &RoleRef) {
        info!(realm_id = %realm.id, role_id = %role.id, "Pre-remove role");
    }

    async fn close(&self) -> FederationResult<()> {
        debug!(provider_id = %self.config.id, "Closing");
        Ok(())
    }
}

impl CredentialValidator for DbUserStorageProvider {
    fn supports_credential_type(&self, kind: &CredentialKind) -> bool {
        kind.is_password()
    }

    async fn is_valid(
        &self,
        realm: &RealmContext,
        user: &dyn HostUser,
        input: &CredentialInput,
    ) -> FederationResult<bool> {
        info!(realm_id = %realm.id, user_id = user.id(), "Validate user credential");

        if !self.supports_credential_type(input.kind()) {
            return Ok(false);
        }

        let username = match user.cached() {
            Some(cache) if self.config.allow_database_to_overwrite => {
                match self
                    .policy
                    .reconcile(user, cache, self.repository.as_ref())
                    .await?
                {
                    ReconcileOutcome::Proceed { username, .. } => username,
                    ReconcileOutcome::Vanished => return Ok(false),
                }
            }
            _ => user.username().to_string(),
        };

        Ok(self
            .repository
            .validate_credential(&username, input.expose_secret())
            .await?)
    }

    async fn update_credential(
        &self,
        realm: &RealmContext,
        user: &dyn HostUser,
        input: &CredentialInput,
    ) -> FederationResult<bool> {
        info!(realm_id = %realm.id, username = user.username(), "Update credential");

        if !self.supports_credential_type(input.kind()) {
            return Ok(false);
        }

        match self
            .repository
            .update_credential(user.username(), input.expose_secret())
            .await
        {
            Ok(updated) => Ok(updated),
            Err(e) if e.is_unsupported() => {
                debug!("Password update not configured");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use dbfed_storage::{StorageError, StorageResult};
    use uuid::Uuid;

    use super::*;
    use crate::error::FederationError;
    use crate::host::CachedIdentity;

    // Mock repository for testing
    #[derive(Default)]
    struct MockDirectory {
        users: Mutex<Vec<IdentityRecord>>,
        passwords: Mutex<HashMap<String, String>>,
        writable: bool,
        fail_lookups: AtomicBool,
        find_by_id_calls: AtomicUsize,
        store_calls: AtomicUsize,
        validated_as: Mutex<Vec<String>>,
    }

    impl MockDirectory {
        fn new(writable: bool) -> Self {
            let directory = Self {
                writable,
                ..Self::default()
            };
            directory.insert("1", "alice", "alice@example.com", "wonderland");
            directory.insert("2", "bob", "bob@example.com", "builder");
            directory
        }

        fn insert(&self, id: &str, username: &str, email: &str, password: &str) {
            let record = IdentityRecord::new(id, username).with_attribute("email", email);
            self.users.lock().unwrap().push(record);
            self.passwords
                .lock()
                .unwrap()
                .insert(username.to_string(), password.to_string());
        }

        fn matching(&self, search: Option<&str>) -> Vec<IdentityRecord> {
            self.users
                .lock()
                .unwrap()
                .iter()
                .filter(|r| {
                    search.map_or(true, |s| {
                        r.username().contains(s) || r.email().is_some_and(|e| e.contains(s))
                    })
                })
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl DirectoryRepository for MockDirectory {
        async fn find_by_id(&self, external_id: &str) -> StorageResult<Option<IdentityRecord>> {
            self.find_by_id_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_lookups.load(Ordering::SeqCst) {
                return Err(StorageError::connection("connection refused"));
            }
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|r| r.id() == external_id).cloned())
        }

        async fn find_by_username(&self, username: &str) -> StorageResult<Option<IdentityRecord>> {
            self.store_calls.fetch_add(1, Ordering::SeqCst);
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|r| r.username() == username).cloned())
        }

        async fn count(&self, search: Option<&str>) -> StorageResult<u64> {
            Ok(self.matching(search).len() as u64)
        }

        async fn search(
            &self,
            search: Option<&str>,
            window: Option<PagingWindow>,
        ) -> StorageResult<Vec<IdentityRecord>> {
            let window = window.unwrap_or_default();
            let offset = usize::try_from(window.offset).unwrap();
            let limit = window.limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap());
            Ok(self
                .matching(search)
                .into_iter()
                .skip(offset)
                .take(limit)
                .collect())
        }

        async fn validate_credential(&self, username: &str, secret: &str) -> StorageResult<bool> {
            self.store_calls.fetch_add(1, Ordering::SeqCst);
            self.validated_as.lock().unwrap().push(username.to_string());
            let passwords = self.passwords.lock().unwrap();
            Ok(passwords.get(username).is_some_and(|p| p == secret))
        }

        async fn update_credential(&self, username: &str, secret: &str) -> StorageResult<bool> {
            self.store_calls.fetch_add(1, Ordering::SeqCst);
            if !self.writable {
                return Err(StorageError::Unsupported("update password"));
            }
            let mut passwords = self.passwords.lock().unwrap();
            match passwords.get_mut(username) {
                Some(stored) => {
                    *stored = secret.to_string();
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn create_user(&self, username: &str) -> StorageResult<String> {
            if !self.writable {
                return Err(StorageError::Unsupported("insert user"));
            }
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|r| r.username() == username) {
                return Err(StorageError::constraint("duplicate username"));
            }
            let id = (users.len() + 1).to_string();
            users.push(IdentityRecord::new(id.clone(), username));
            Ok(id)
        }

        async fn remove_user(&self, external_id: &str) -> StorageResult<bool> {
            let mut users = self.users.lock().unwrap();
            let before = users.len();
            users.retain(|r| r.id() != external_id);
            Ok(users.len() < before)
        }
    }

    // A user handle served from the host cache
    struct CachedUser {
        id: String,
        username: String,
        email: Option<String>,
        age: Duration,
        invalidations: AtomicUsize,
    }

    impl CachedUser {
        fn new(external_id: &str, username: &str, email: &str, age_ms: u64) -> Self {
            Self {
                id: format!("f:users-db:{external_id}"),
                username: username.to_string(),
                email: Some(email.to_string()),
                age: Duration::from_millis(age_ms),
                invalidations: AtomicUsize::new(0),
            }
        }

        fn invalidations(&self) -> usize {
            self.invalidations.load(Ordering::SeqCst)
        }
    }

    impl CachedIdentity for CachedUser {
        fn snapshot_age(&self) -> Duration {
            self.age
        }

        fn invalidate(&self) {
            self.invalidations.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl HostUser for CachedUser {
        fn id(&self) -> &str {
            &self.id
        }

        fn username(&self) -> &str {
            &self.username
        }

        fn email(&self) -> Option<&str> {
            self.email.as_deref()
        }

        fn cached(&self) -> Option<&dyn CachedIdentity> {
            Some(self)
        }
    }

    fn realm() -> RealmContext {
        RealmContext::new(Uuid::now_v7(), "test")
    }

    fn provider(overwrite: bool, writable: bool) -> (DbUserStorageProvider, Arc<MockDirectory>) {
        let config = ProviderConfig::builder()
            .id("users-db")
            .url("sqlite::memory:")
            .allow_database_to_overwrite(overwrite)
            .build()
            .unwrap();
        let directory = Arc::new(MockDirectory::new(writable));
        let provider = DbUserStorageProvider::new(config, directory.clone());
        (provider, directory)
    }

    #[tokio::test]
    async fn fresh_snapshot_is_not_refetched() {
        let (provider, directory) = provider(true, false);
        let user = CachedUser::new("1", "alice", "alice@example.com", 400);

        let valid = provider
            .is_valid(&realm(), &user, &CredentialInput::password("wonderland"))
            .await
            .unwrap();

        assert!(valid);
        assert_eq!(directory.find_by_id_calls.load(Ordering::SeqCst), 0);
        assert_eq!(user.invalidations(), 0);
    }

    #[tokio::test]
    async fn custom_policy_threshold_is_used() {
        let (provider, directory) = provider(true, false);
        let provider =
            provider.with_policy(ReconciliationPolicy::with_threshold(Duration::ZERO));
        let user = CachedUser::new("1", "alice", "alice@example.com", 1);

        let valid = provider
            .is_valid(&realm(), &user, &CredentialInput::password("wonderland"))
            .await
            .unwrap();

        assert!(valid);
        assert_eq!(provider.policy().threshold(), Duration::ZERO);
        assert_eq!(directory.find_by_id_calls.load(Ordering::SeqCst), 1);
        assert_eq!(user.invalidations(), 0);
    }

    #[tokio::test]
    async fn stale_snapshot_with_changed_email_is_invalidated() {
        let (provider, directory) = provider(true, false);
        let user = CachedUser::new("1", "alice", "old@example.com", 600);

        let valid = provider
            .is_valid(&realm(), &user, &CredentialInput::password("wonderland"))
            .await
            .unwrap();

        assert!(valid);
        assert_eq!(directory.find_by_id_calls.load(Ordering::SeqCst), 1);
        assert_eq!(user.invalidations(), 1);
    }

    #[tokio::test]
    async fn stale_snapshot_uses_fresh_username() {
        let (provider, directory) = provider(true, false);
        let user = CachedUser::new("2", "robert", "bob@example.com", 600);

        let valid = provider
            .is_valid(&realm(), &user, &CredentialInput::password("builder"))
            .await
            .unwrap();

        assert!(valid);
        assert_eq!(user.invalidations(), 1);
        assert_eq!(*directory.validated_as.lock().unwrap(), vec!["bob".to_string()]);
    }

    #[tokio::test]
    async fn stale_snapshot_of_deleted_user_is_rejected() {
        let (provider, directory) = provider(true, false);
        let user = CachedUser::new("99", "ghost", "ghost@example.com", 600);

        let valid = provider
            .is_valid(&realm(), &user, &CredentialInput::password("boo"))
            .await
            .unwrap();

        assert!(!valid);
        assert_eq!(user.invalidations(), 1);
        assert!(directory.validated_as.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_unchanged_snapshot_is_kept() {
        let (provider, directory) = provider(true, false);
        let user = CachedUser::new("1", "alice", "alice@example.com", 600);

        let valid = provider
            .is_valid(&realm(), &user, &CredentialInput::password("wonderland"))
            .await
            .unwrap();

        assert!(valid);
        assert_eq!(directory.find_by_id_calls.load(Ordering::SeqCst), 1);
        assert_eq!(user.invalidations(), 0);
    }

    #[tokio::test]
    async fn reconciliation_needs_overwrite() {
        let (provider, directory) = provider(false, false);
        let user = CachedUser::new("99", "alice", "alice@example.com", 60_000);

        let valid = provider
            .is_valid(&realm(), &user, &CredentialInput::password("wonderland"))
            .await
            .unwrap();

        assert!(valid);
        assert_eq!(directory.find_by_id_calls.load(Ordering::SeqCst), 0);
        assert_eq!(user.invalidations(), 0);
    }

    #[tokio::test]
    async fn lookup_failure_during_reconciliation_propagates() {
        let (provider, directory) = provider(true, false);
        directory.fail_lookups.store(true, Ordering::SeqCst);
        let user = CachedUser::new("1", "alice", "alice@example.com", 600);

        let err = provider
            .is_valid(&realm(), &user, &CredentialInput::password("wonderland"))
            .await
            .unwrap_err();

        assert!(matches!(err, FederationError::Connection(_)));
        assert_eq!(user.invalidations(), 0);
    }

    #[tokio::test]
    async fn unsupported_credential_kind_skips_store() {
        let (provider, directory) = provider(true, true);
        let user = CachedUser::new("1", "alice", "alice@example.com", 600);
        let otp = CredentialInput::new(CredentialKind::Otp, "123456");

        assert!(!provider.is_valid(&realm(), &user, &otp).await.unwrap());
        assert!(!provider.update_credential(&realm(), &user, &otp).await.unwrap());
        assert_eq!(directory.store_calls.load(Ordering::SeqCst), 0);
        assert_eq!(directory.find_by_id_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn credential_type_surface() {
        let (provider, _) = provider(false, false);
        let user = CachedUser::new("1", "alice", "alice@example.com", 0);
        let realm = realm();

        assert!(provider.supports_credential_type(&CredentialKind::Password));
        assert!(!provider.supports_credential_type(&CredentialKind::WebAuthn));
        assert!(provider.is_configured_for(&realm, &user, &CredentialKind::Password));
        assert!(!provider.is_configured_for(&realm, &user, &CredentialKind::Otp));
        provider.disable_credential_type(&realm, &user, &CredentialKind::Password);
        assert!(provider.disableable_credential_types(&realm, &user).is_empty());
    }

    #[tokio::test]
    async fn update_then_validate() {
        let (provider, _) = provider(false, true);
        let user = provider
            .get_user_by_username(&realm(), "bob")
            .await
            .unwrap()
            .unwrap();

        let new_password = CredentialInput::password("can-we-fix-it");
        assert!(provider.update_credential(&realm(), &user, &new_password).await.unwrap());
        assert!(provider.is_valid(&realm(), &user, &new_password).await.unwrap());
        assert!(
            !provider
                .is_valid(&realm(), &user, &CredentialInput::password("builder"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn update_without_statement_is_declined() {
        let (provider, _) = provider(false, false);
        let user = CachedUser::new("1", "alice", "alice@example.com", 0);

        let updated = provider
            .update_credential(&realm(), &user, &CredentialInput::password("new"))
            .await
            .unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn email_lookup_is_username_lookup() {
        let (provider, _) = provider(false, false);
        let realm = realm();

        for key in ["alice", "alice@example.com", "nobody"] {
            let by_email = provider.get_user_by_email(&realm, key).await.unwrap();
            let by_username = provider.get_user_by_username(&realm, key).await.unwrap();
            assert_eq!(by_email, by_username);
        }
        assert!(
            provider
                .get_user_by_email(&realm, "alice@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn get_user_by_id_strips_storage_prefix() {
        let (provider, _) = provider(false, false);
        let realm = realm();

        let alice = provider
            .get_user_by_id(&realm, "f:users-db:1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(alice.username(), "alice");
        assert_eq!(HostUser::id(&alice), "f:users-db:1");

        let plain = provider.get_user_by_id(&realm, "2").await.unwrap().unwrap();
        assert_eq!(plain.username(), "bob");

        assert!(provider.get_user_by_id(&realm, "f:users-db:9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn paging_and_counting() {
        let (provider, _) = provider(false, false);
        let realm = realm();

        let first = provider
            .get_users(&realm, Some(PagingWindow::normalize(0, 1)))
            .await
            .unwrap();
        let second = provider
            .get_users(&realm, Some(PagingWindow::normalize(1, 1)))
            .await
            .unwrap();
        assert_eq!(first[0].username(), "alice");
        assert_eq!(second[0].username(), "bob");

        let everyone = provider
            .get_users(&realm, Some(PagingWindow::normalize(-1, 0)))
            .await
            .unwrap();
        assert_eq!(everyone.len(), 2);

        assert_eq!(provider.count_users(&realm, &UserCountQuery::All).await.unwrap(), 2);
        let search = UserCountQuery::Search("ali".to_string());
        assert_eq!(provider.count_users(&realm, &search).await.unwrap(), 1);
        let grouped = UserCountQuery::InGroups(BTreeSet::from(["admins".to_string()]));
        assert_eq!(provider.count_users(&realm, &grouped).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn search_by_params_uses_first_value() {
        let (provider, _) = provider(false, false);
        let params = BTreeMap::from([
            ("email".to_string(), "bob".to_string()),
            ("username".to_string(), "alice".to_string()),
        ]);

        let users = provider
            .search_users_by_params(&realm(), &params, None)
            .await
            .unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username(), "bob");
    }

    #[tokio::test]
    async fn group_and_attribute_queries_are_empty() {
        let (provider, _) = provider(false, false);
        let realm = realm();
        let group = GroupRef {
            id: "g1".to_string(),
            name: "admins".to_string(),
        };

        assert!(provider.get_group_members(&realm, &group, None).await.unwrap().is_empty());
        assert!(
            provider
                .search_users_by_attribute(&realm, "email", "alice@example.com")
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn add_user() {
        let (provider, _) = provider(false, true);
        let realm = realm();

        let carol = provider.add_user(&realm, "carol").await.unwrap().unwrap();
        assert_eq!(carol.username(), "carol");
        assert_eq!(HostUser::id(&carol), "f:users-db:3");

        let err = provider.add_user(&realm, "alice").await.unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[tokio::test]
    async fn add_user_without_statement_skips_provider() {
        let (provider, _) = provider(false, false);
        assert!(provider.add_user(&realm(), "carol").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_user() {
        let (provider, _) = provider(true, false);
        let realm = realm();

        let missing = CachedUser::new("99", "ghost", "ghost@example.com", 600);
        assert!(!provider.remove_user(&realm, &missing).await.unwrap());
        assert_eq!(missing.invalidations(), 0);

        let bob = provider.get_user_by_username(&realm, "bob").await.unwrap().unwrap();
        assert!(provider.remove_user(&realm, &bob).await.unwrap());
        assert!(provider.get_user_by_username(&realm, "bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lifecycle_hooks() {
        let (provider, _) = provider(false, false);
        let realm = realm();

        provider.pre_remove_realm(&realm);
        provider.pre_remove_role(
            &realm,
            &RoleRef {
                id: "r1".to_string(),
                name: "admin".to_string(),
            },
        );
        provider.close().await.unwrap();
        provider.test_connection().await.unwrap();
        provider.validate_config().await.unwrap();
        assert_eq!(provider.provider_type(), "db-user-provider");
    }
}
