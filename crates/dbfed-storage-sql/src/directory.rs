//! SQL implementation of the directory repository.

use async_trait::async_trait;
use dbfed_auth::PasswordHasherService;
use dbfed_storage::{
    DirectoryRepository, IdentityRecord, PagingWindow, StorageError, StorageResult,
};
use sqlx::any::{Any, AnyArguments};
use sqlx::AnyPool;
use sqlx::query::Query;
use sqlx::Row;
use tracing::{debug, warn};

use crate::convert::record_from_row;
use crate::dialect::{Dialect, trim_statement};
use crate::error::from_sqlx_error;
use crate::pool::{PoolConfig, create_pool};
use crate::query::{QueryConfig, search_pattern};

/// Directory repository over a SQL database.
#[derive(Debug, Clone)]
pub struct SqlDirectoryRepository {
    pool: AnyPool,
    dialect: Dialect,
    queries: QueryConfig,
    hasher: PasswordHasherService,
}

impl SqlDirectoryRepository {
    /// Creates a repository over an existing pool.
    #[must_use]
    pub const fn new(
        pool: AnyPool,
        dialect: Dialect,
        queries: QueryConfig,
        hasher: PasswordHasherService,
    ) -> Self {
        Self {
            pool,
            dialect,
            queries,
            hasher,
        }
    }

    /// Opens a pool and creates a repository.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Configuration` if a required statement is blank,
    /// or `StorageError::Connection` if the pool cannot be created.
    pub async fn connect(
        pool_config: &PoolConfig,
        dialect: Dialect,
        queries: QueryConfig,
        hasher: PasswordHasherService,
    ) -> StorageResult<Self> {
        queries.validate()?;
        debug!(url = %pool_config.redacted_url(), %dialect, "Opening directory pool");
        let pool = create_pool(pool_config).await?;
        Ok(Self::new(pool, dialect, queries, hasher))
    }

    /// Returns the SQL dialect.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Returns the configured statements.
    #[must_use]
    pub const fn queries(&self) -> &QueryConfig {
        &self.queries
    }

    /// Returns the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Binds `value` to every parameter slot of `sql`.
    fn statement<'q>(&self, sql: &'q str, value: &str) -> Query<'q, Any, AnyArguments<'q>> {
        let mut query = sqlx::query::<Any>(sql);
        for _ in 0..self.dialect.parameter_count(sql) {
            query = query.bind(value.to_owned());
        }
        query
    }

    async fn find_one(&self, sql: &str, value: &str) -> StorageResult<Option<IdentityRecord>> {
        let sql = trim_statement(sql);
        let row = self
            .statement(sql, value)
            .fetch_optional(&self.pool)
            .await
            .map_err(from_sqlx_error)?;

        row.as_ref().map(record_from_row).transpose()
    }
}

#[async_trait]
impl DirectoryRepository for SqlDirectoryRepository {
    async fn find_by_id(&self, external_id: &str) -> StorageResult<Option<IdentityRecord>> {
        self.find_one(&self.queries.find_by_id, external_id).await
    }

    async fn find_by_username(&self, username: &str) -> StorageResult<Option<IdentityRecord>> {
        self.find_one(&self.queries.find_by_username, username).await
    }

    async fn count(&self, search: Option<&str>) -> StorageResult<u64> {
        let pattern = search_pattern(search);
        let sql = match pattern {
            Some(_) => self.dialect.count_query(&self.queries.find_by_search_term),
            None => trim_statement(&self.queries.count).to_string(),
        };
        let query = match &pattern {
            Some(pattern) => self.statement(&sql, pattern),
            None => sqlx::query::<Any>(&sql),
        };
        let row = query
            .fetch_one(&self.pool)
            .await
            .map_err(from_sqlx_error)?;

        let count: i64 = row.try_get(0).map_err(from_sqlx_error)?;
        u64::try_from(count)
            .map_err(|_| StorageError::InvalidData(format!("negative user count {count}")))
    }

    async fn search(
        &self,
        search: Option<&str>,
        window: Option<PagingWindow>,
    ) -> StorageResult<Vec<IdentityRecord>> {
        let window = window.unwrap_or_default();
        let pattern = search_pattern(search);
        let base = match pattern {
            Some(_) => &self.queries.find_by_search_term,
            None => &self.queries.list_all,
        };
        let sql = self
            .dialect
            .ordered_page(base, &self.queries.order_by, window);
        debug!(sql = %sql, offset = window.offset, limit = ?window.limit, "Searching directory");

        let query = match &pattern {
            Some(pattern) => self.statement(&sql, pattern),
            None => sqlx::query::<Any>(&sql),
        };
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(from_sqlx_error)?;

        rows.iter().map(record_from_row).collect()
    }

    async fn validate_credential(&self, username: &str, secret: &str) -> StorageResult<bool> {
        let sql = trim_statement(&self.queries.find_password_hash);
        let row = self
            .statement(sql, username)
            .fetch_optional(&self.pool)
            .await
            .map_err(from_sqlx_error)?;

        let stored: Option<String> = match row {
            Some(row) => row.try_get(0).map_err(from_sqlx_error)?,
            None => None,
        };
        let Some(stored) = stored else {
            debug!(username, "No stored credential");
            return Ok(false);
        };

        match self.hasher.matches(secret, &stored) {
            Ok(valid) => Ok(valid),
            Err(e) => {
                warn!(username, error = %e, "Stored credential could not be checked");
                Ok(false)
            }
        }
    }

    async fn update_credential(&self, username: &str, secret: &str) -> StorageResult<bool> {
        let Some(sql) = self.queries.update_password.as_deref() else {
            return Err(StorageError::Unsupported("update password"));
        };
        let hash = self
            .hasher
            .hash(secret)
            .map_err(|e| StorageError::Credential(e.to_string()))?;

        let result = sqlx::query::<Any>(trim_statement(sql))
            .bind(hash)
            .bind(username.to_owned())
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;

        debug!(username, rows = result.rows_affected(), "Updated credential");
        Ok(result.rows_affected() > 0)
    }

    async fn create_user(&self, username: &str) -> StorageResult<String> {
        let Some(sql) = self.queries.insert_user.as_deref() else {
            return Err(StorageError::Unsupported("insert user"));
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Transaction(e.to_string()))?;

        self.statement(trim_statement(sql), username)
            .execute(&mut *tx)
            .await
            .map_err(from_sqlx_error)?;

        let row = self
            .statement(trim_statement(&self.queries.find_by_username), username)
            .fetch_optional(&mut *tx)
            .await
            .map_err(from_sqlx_error)?;
        let record = row
            .as_ref()
            .map(record_from_row)
            .transpose()?
            .ok_or_else(|| {
                StorageError::InvalidData(format!("inserted user '{username}' cannot be read back"))
            })?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Transaction(e.to_string()))?;

        debug!(username, id = record.id(), "Inserted directory user");
        Ok(record.id().to_string())
    }

    async fn remove_user(&self, external_id: &str) -> StorageResult<bool> {
        match self.queries.delete_user.as_deref() {
            Some(sql) => {
                let result = self
                    .statement(trim_statement(sql), external_id)
                    .execute(&self.pool)
                    .await
                    .map_err(from_sqlx_error)?;
                Ok(result.rows_affected() > 0)
            }
            None => {
                let exists = self.find_by_id(external_id).await?.is_some();
                Ok(exists && self.queries.allow_host_delete)
            }
        }
    }

    async fn test_connection(&self) -> StorageResult<()> {
        sqlx::query::<Any>(self.dialect.test_query())
            .execute(&self.pool)
            .await
            .map_err(from_sqlx_error)?;
        Ok(())
    }
}
