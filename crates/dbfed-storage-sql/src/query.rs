//! Operator-supplied SQL statements.
//!
//! Every statement is plain SQL for the configured [`Dialect`]. Read queries
//! must return at least an `id` and a `username` column; any other column
//! becomes a user attribute under its returned name.
//!
//! | Statement            | Parameters           | Returns                |
//! |----------------------|----------------------|------------------------|
//! | `count`              | none                 | one integer            |
//! | `list_all`           | none                 | user rows              |
//! | `find_by_id`         | id                   | zero or one user row   |
//! | `find_by_username`   | username             | zero or one user row   |
//! | `find_by_search_term`| pattern (each slot)  | user rows              |
//! | `find_password_hash` | username             | one hash column        |
//! | `update_password`    | hash, username       | affected rows          |
//! | `insert_user`        | username             | affected rows          |
//! | `delete_user`        | id                   | affected rows          |

use dbfed_storage::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;

/// SQL statements run by the directory repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Total number of users.
    pub count: String,
    /// Every user.
    pub list_all: String,
    /// One user by identity key.
    pub find_by_id: String,
    /// One user by username.
    pub find_by_username: String,
    /// Users matching a `%term%` pattern.
    pub find_by_search_term: String,
    /// The stored credential hash for a username.
    pub find_password_hash: String,
    /// Replaces a stored credential hash.
    #[serde(default)]
    pub update_password: Option<String>,
    /// Inserts a user with only a username.
    #[serde(default)]
    pub insert_user: Option<String>,
    /// Deletes a user by identity key.
    #[serde(default)]
    pub delete_user: Option<String>,
    /// Column used to order paged results.
    #[serde(default = "default_order_by")]
    pub order_by: String,
    /// Report removals as successful when no `delete_user` is configured.
    #[serde(default)]
    pub allow_host_delete: bool,
}

fn default_order_by() -> String {
    "id".to_string()
}

impl QueryConfig {
    /// Statements for a conventional `users` table:
    ///
    /// ```sql
    /// CREATE TABLE users (
    ///     id         INTEGER PRIMARY KEY,
    ///     username   VARCHAR(255) NOT NULL UNIQUE,
    ///     email      VARCHAR(255),
    ///     first_name VARCHAR(255),
    ///     last_name  VARCHAR(255),
    ///     password   VARCHAR(255)
    /// );
    /// ```
    #[must_use]
    pub fn for_dialect(dialect: Dialect) -> Self {
        let p1 = dialect.placeholder(1);
        let p2 = dialect.placeholder(2);
        let columns = "SELECT id, username, email, first_name, last_name FROM users";
        let (id_match, like) = match dialect {
            Dialect::Postgres => (format!("CAST(id AS TEXT) = {p1}"), "ILIKE"),
            _ => (format!("id = {p1}"), "LIKE"),
        };

        Self {
            count: "SELECT COUNT(*) FROM users".to_string(),
            list_all: columns.to_string(),
            find_by_id: format!("{columns} WHERE {id_match}"),
            find_by_username: format!("{columns} WHERE username = {p1}"),
            find_by_search_term: format!(
                "{columns} WHERE username {like} {p1} OR email {like} {}",
                dialect.placeholder(if dialect == Dialect::Postgres { 1 } else { 2 })
            ),
            find_password_hash: format!("SELECT password FROM users WHERE username = {p1}"),
            update_password: Some(format!(
                "UPDATE users SET password = {p1} WHERE username = {p2}"
            )),
            insert_user: Some(format!("INSERT INTO users (username) VALUES ({p1})")),
            delete_user: Some(format!("DELETE FROM users WHERE {id_match}")),
            order_by: default_order_by(),
            allow_host_delete: false,
        }
    }

    /// Checks that every required statement is present.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Configuration` naming the first blank statement.
    pub fn validate(&self) -> StorageResult<()> {
        let required = [
            ("count", &self.count),
            ("listAll", &self.list_all),
            ("findById", &self.find_by_id),
            ("findByUsername", &self.find_by_username),
            ("findBySearchTerm", &self.find_by_search_term),
            ("findPasswordHash", &self.find_password_hash),
            ("orderBy", &self.order_by),
        ];
        for (name, sql) in required {
            if sql.trim().is_empty() {
                return Err(StorageError::Configuration(format!(
                    "query '{name}' is required"
                )));
            }
        }
        Ok(())
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self::for_dialect(Dialect::default())
    }
}

/// Turns a host search string into a `LIKE` pattern.
///
/// Blank input and the bare `*` wildcard mean "no filter".
#[must_use]
pub fn search_pattern(search: Option<&str>) -> Option<String> {
    let term = search.map(str::trim).filter(|t| !t.is_empty() && *t != "*")?;
    Some(format!("%{term}%"))
}
