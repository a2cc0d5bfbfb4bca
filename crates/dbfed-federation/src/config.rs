//! Provider configuration.
//!
//! A [`ProviderConfig`] is built once, validated, and then shared read-only
//! by every call on the provider. It can come from the builder, from a
//! deserialized document, or from the host's flat component settings via
//! [`ProviderConfig::from_component`].

use std::collections::HashMap;
use std::str::FromStr;

use dbfed_auth::{HashAlgorithm, PasswordPolicy};
use dbfed_storage_sql::{Dialect, PoolConfig, QueryConfig};
use serde::{Deserialize, Serialize};

use crate::error::{FederationError, FederationResult};

/// Component setting keys understood by [`ProviderConfig::from_component`].
pub mod keys {
    /// JDBC-style connection URL.
    pub const URL: &str = "url";
    /// Database user, merged into the URL.
    pub const USER: &str = "user";
    /// Database password, merged into the URL.
    pub const PASSWORD: &str = "password";
    /// Database product.
    pub const RDBMS: &str = "rdbms";
    /// Total user count query.
    pub const COUNT: &str = "count";
    /// List-all query.
    pub const LIST_ALL: &str = "listAll";
    /// Lookup by id query.
    pub const FIND_BY_ID: &str = "findById";
    /// Lookup by username query.
    pub const FIND_BY_USERNAME: &str = "findByUsername";
    /// Search query.
    pub const FIND_BY_SEARCH_TERM: &str = "findBySearchTerm";
    /// Password hash query.
    pub const FIND_PASSWORD_HASH: &str = "findPasswordHash";
    /// Password update statement.
    pub const UPDATE_PASSWORD: &str = "updatePassword";
    /// User insert statement.
    pub const INSERT_USER: &str = "insertUser";
    /// User delete statement.
    pub const DELETE_USER: &str = "deleteUser";
    /// Hash algorithm name.
    pub const HASH_FUNCTION: &str = "hashFunction";
    /// Report removals as successful without a delete statement.
    pub const ALLOW_HOST_DELETE: &str = "allowKeycloakDelete";
    /// Let database values replace cached host values.
    pub const ALLOW_OVERWRITE: &str = "allowDatabaseToOverwriteKeycloak";
}

/// Provider type identifier.
pub const PROVIDER_TYPE: &str = "db-user-provider";

/// Configuration for a database user storage provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Component id, embedded in every storage id.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Connection pool settings.
    pub pool: PoolConfig,

    /// SQL dialect.
    pub dialect: Dialect,

    /// SQL statements.
    pub queries: QueryConfig,

    /// Password hashing.
    #[serde(default)]
    pub password_policy: PasswordPolicy,

    /// Let database values replace cached host values, and re-check stale
    /// cached users before validating credentials.
    #[serde(default)]
    pub allow_database_to_overwrite: bool,
}

impl ProviderConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ProviderConfigBuilder {
        ProviderConfigBuilder::new()
    }

    /// Returns true if removals are reported without a delete statement.
    #[must_use]
    pub const fn allow_host_delete(&self) -> bool {
        self.queries.allow_host_delete
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `FederationError::Configuration` describing the first problem.
    pub fn validate(&self) -> FederationResult<()> {
        if self.id.trim().is_empty() {
            return Err(FederationError::config("provider id is required"));
        }
        if self.pool.url.trim().is_empty() {
            return Err(FederationError::config("connection url is required"));
        }
        if self.pool.max_connections == 0 {
            return Err(FederationError::config("max_connections must be positive"));
        }
        self.queries.validate().map_err(FederationError::from)
    }

    /// Builds a configuration from the host's flat component settings.
    ///
    /// Statements that are not set fall back to the defaults for the
    /// dialect. A blank optional statement disables that write.
    ///
    /// # Errors
    ///
    /// Returns `FederationError::Configuration` for a missing URL, an unknown
    /// dialect or hash function, or a malformed boolean.
    pub fn from_component(
        id: impl Into<String>,
        settings: &HashMap<String, String>,
    ) -> FederationResult<Self> {
        let get = |key: &str| {
            settings
                .get(key)
                .map(String::as_str)
                .filter(|v| !v.trim().is_empty())
        };

        let url = get(keys::URL)
            .ok_or_else(|| FederationError::config("connection url is required"))?;
        let url = with_credentials(url, get(keys::USER), get(keys::PASSWORD));

        let mut builder = Self::builder().id(id).url(url);
        if let Some(rdbms) = get(keys::RDBMS) {
            builder = builder.dialect(Dialect::from_str(rdbms).map_err(FederationError::config)?);
        }
        if let Some(name) = get(keys::HASH_FUNCTION) {
            let algorithm = HashAlgorithm::from_str(name)
                .map_err(|e| FederationError::config(e.to_string()))?;
            builder = builder.hash_algorithm(algorithm);
        }
        if let Some(flag) = get(keys::ALLOW_HOST_DELETE) {
            builder = builder.allow_host_delete(parse_flag(keys::ALLOW_HOST_DELETE, flag)?);
        }
        if let Some(flag) = get(keys::ALLOW_OVERWRITE) {
            builder = builder.allow_database_to_overwrite(parse_flag(keys::ALLOW_OVERWRITE, flag)?);
        }

        let required = [
            keys::COUNT,
            keys::LIST_ALL,
            keys::FIND_BY_ID,
            keys::FIND_BY_USERNAME,
            keys::FIND_BY_SEARCH_TERM,
            keys::FIND_PASSWORD_HASH,
        ];
        for key in required {
            if let Some(sql) = get(key) {
                builder = builder.query(key, sql);
            }
        }
        for key in [keys::UPDATE_PASSWORD, keys::INSERT_USER, keys::DELETE_USER] {
            if let Some(value) = settings.get(key) {
                builder = builder.query(key, value.trim());
            }
        }

        builder.build()
    }
}

fn parse_flag(key: &str, value: &str) -> FederationResult<bool> {
    value
        .trim()
        .parse()
        .map_err(|_| FederationError::config(format!("'{key}' must be true or false, got '{value}'")))
}

/// Adds `user:password@` to a URL that has no credentials of its own.
fn with_credentials(url: &str, user: Option<&str>, password: Option<&str>) -> String {
    let Some(user) = user else {
        return url.to_string();
    };
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    if rest.split('/').next().is_some_and(|authority| authority.contains('@')) {
        return url.to_string();
    }
    match password {
        Some(password) => format!(
            "{scheme}://{}:{}@{rest}",
            urlencoding::encode(user),
            urlencoding::encode(password)
        ),
        None => format!("{scheme}://{}@{rest}", urlencoding::encode(user)),
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ProviderConfig`].
#[derive(Debug, Default)]
pub struct ProviderConfigBuilder {
    id: Option<String>,
    name: Option<String>,
    url: Option<String>,
    pool: PoolConfig,
    dialect: Option<Dialect>,
    queries: Option<QueryConfig>,
    overrides: Vec<(String, String)>,
    password_policy: PasswordPolicy,
    allow_host_delete: Option<bool>,
    allow_database_to_overwrite: bool,
}

impl ProviderConfigBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the component id.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the display name. Defaults to the id.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the connection URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets pool settings. A URL set with [`url`](Self::url) takes precedence.
    #[must_use]
    pub fn pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Sets the dialect. Inferred from the URL if not set.
    #[must_use]
    pub const fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Sets the complete statement set.
    #[must_use]
    pub fn queries(mut self, queries: QueryConfig) -> Self {
        self.queries = Some(queries);
        self
    }

    /// Overrides one statement by its component key, e.g. `findById`.
    ///
    /// An empty value clears an optional statement.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, sql: impl Into<String>) -> Self {
        self.overrides.push((key.into(), sql.into()));
        self
    }

    /// Sets the password policy.
    #[must_use]
    pub fn password_policy(mut self, policy: PasswordPolicy) -> Self {
        self.password_policy = policy;
        self
    }

    /// Sets the hash algorithm, keeping other policy parameters.
    #[must_use]
    pub const fn hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.password_policy.algorithm = algorithm;
        self
    }

    /// Sets whether removals are reported without a delete statement.
    #[must_use]
    pub const fn allow_host_delete(mut self, allow: bool) -> Self {
        self.allow_host_delete = Some(allow);
        self
    }

    /// Sets whether database values replace cached host values.
    #[must_use]
    pub const fn allow_database_to_overwrite(mut self, allow: bool) -> Self {
        self.allow_database_to_overwrite = allow;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `FederationError::Configuration` if the id or URL is missing,
    /// the dialect cannot be inferred, a statement key is unknown, or a
    /// required statement is blank.
    pub fn build(self) -> FederationResult<ProviderConfig> {
        let id = self
            .id
            .ok_or_else(|| FederationError::config("provider id is required"))?;
        let mut pool = self.pool;
        if let Some(url) = self.url {
            pool.url = url;
        }
        let dialect = self
            .dialect
            .or_else(|| Dialect::from_url(&pool.url))
            .ok_or_else(|| {
                FederationError::config("rdbms is required when the url does not name one")
            })?;

        let mut queries = self
            .queries
            .unwrap_or_else(|| QueryConfig::for_dialect(dialect));
        for (key, sql) in self.overrides {
            apply_override(&mut queries, &key, sql)?;
        }
        if let Some(allow) = self.allow_host_delete {
            queries.allow_host_delete = allow;
        }

        let config = ProviderConfig {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            pool,
            dialect,
            queries,
            password_policy: self.password_policy,
            allow_database_to_overwrite: self.allow_database_to_overwrite,
        };
        config.validate()?;
        Ok(config)
    }
}

fn apply_override(queries: &mut QueryConfig, key: &str, sql: String) -> FederationResult<()> {
    let optional = |sql: String| (!sql.trim().is_empty()).then_some(sql);
    match key {
        keys::COUNT => queries.count = sql,
        keys::LIST_ALL => queries.list_all = sql,
        keys::FIND_BY_ID => queries.find_by_id = sql,
        keys::FIND_BY_USERNAME => queries.find_by_username = sql,
        keys::FIND_BY_SEARCH_TERM => queries.find_by_search_term = sql,
        keys::FIND_PASSWORD_HASH => queries.find_password_hash = sql,
        keys::UPDATE_PASSWORD => queries.update_password = optional(sql),
        keys::INSERT_USER => queries.insert_user = optional(sql),
        keys::DELETE_USER => queries.delete_user = optional(sql),
        other => {
            return Err(FederationError::config(format!("unknown query '{other}'")));
        }
    }
    Ok(())
}
