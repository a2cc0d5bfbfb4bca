//! # dbfed-storage-sql
//!
//! SQLx-based directory repository for database user federation.
//!
//! The repository runs operator-configured SQL against any database the
//! `sqlx` `Any` driver can reach (PostgreSQL, MySQL/MariaDB, SQLite). Paging
//! clauses are rendered per [`Dialect`], which also covers SQL Server and
//! Oracle syntax.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod convert;
pub mod dialect;
pub mod directory;
pub mod error;
pub mod pool;
pub mod query;

pub use dialect::Dialect;
pub use directory::SqlDirectoryRepository;
pub use pool::{PoolConfig, create_pool};
pub use query::QueryConfig;
