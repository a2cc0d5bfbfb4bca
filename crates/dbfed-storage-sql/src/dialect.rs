//! SQL dialects.
//!
//! Configured queries are plain `SELECT` statements. The repository wraps
//! them to add a stable ordering, a paging clause, or a row count, and the
//! exact syntax for that depends on the backing database.

use std::fmt;
use std::str::FromStr;

use dbfed_storage::PagingWindow;
use serde::{Deserialize, Serialize};

/// A relational database family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// PostgreSQL.
    #[default]
    Postgres,
    /// MySQL and MariaDB.
    #[serde(alias = "mariadb")]
    MySql,
    /// SQLite.
    Sqlite,
    /// Microsoft SQL Server (2012 and later).
    #[serde(alias = "mssql")]
    SqlServer,
    /// Oracle Database (12c and later).
    Oracle,
}

impl Dialect {
    /// Infers the dialect from a connection URL scheme.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split(':').next()?.to_ascii_lowercase();
        match scheme.as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::MySql),
            "sqlite" => Some(Self::Sqlite),
            "sqlserver" | "mssql" => Some(Self::SqlServer),
            "oracle" => Some(Self::Oracle),
            _ => None,
        }
    }

    /// Returns the dialect name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::SqlServer => "sqlserver",
            Self::Oracle => "oracle",
        }
    }

    /// Returns the bind placeholder for the 1-based parameter `index`.
    #[must_use]
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::Postgres => format!("${index}"),
            _ => "?".to_string(),
        }
    }

    /// Number of values to bind when every placeholder takes the same value.
    ///
    /// Numbered placeholders (`$1`, `$2`) are bound once per distinct index.
    /// Positional `?` placeholders are bound once per occurrence. Text inside
    /// single-quoted literals is ignored.
    #[must_use]
    pub fn parameter_count(&self, sql: &str) -> usize {
        match self {
            Self::Postgres => max_numbered_placeholder(sql),
            _ => outside_literals(sql).filter(|c| *c == '?').count(),
        }
    }

    /// Appends the paging clause for `window` to an ordered query.
    #[must_use]
    pub fn paginate(&self, sql: &str, window: PagingWindow) -> String {
        let mut out = trim_statement(sql).to_string();
        out.push_str(&self.paging_clause(window));
        out
    }

    /// Wraps `sql` so rows come back in `order_by` order within `window`.
    ///
    /// The inner query must not carry its own `ORDER BY` on SQL Server.
    #[must_use]
    pub fn ordered_page(&self, sql: &str, order_by: &str, window: PagingWindow) -> String {
        let ordered = format!(
            "SELECT * FROM ({}\n) dir_page ORDER BY {order_by}",
            trim_statement(sql)
        );
        self.paginate(&ordered, window)
    }

    /// Wraps `sql` in a row count.
    ///
    /// The inner statement ends on its own line so a trailing `--` comment
    /// cannot swallow the closing parenthesis.
    #[must_use]
    pub fn count_query(&self, sql: &str) -> String {
        format!("SELECT COUNT(*) FROM ({}\n) dir_count", trim_statement(sql))
    }

    /// Statement used to check connectivity.
    #[must_use]
    pub const fn test_query(&self) -> &'static str {
        match self {
            Self::Oracle => "SELECT 1 FROM DUAL",
            _ => "SELECT 1",
        }
    }

    /// Paging suffix for an already-ordered query, with a leading space.
    ///
    /// Empty for an unbounded window.
    #[must_use]
    pub fn paging_clause(&self, window: PagingWindow) -> String {
        if window.is_unbounded() {
            return String::new();
        }
        let offset = window.offset;
        match (self, window.limit) {
            (Self::SqlServer | Self::Oracle, Some(limit)) => {
                format!(" OFFSET {offset} ROWS FETCH NEXT {limit} ROWS ONLY")
            }
            (Self::SqlServer | Self::Oracle, None) => format!(" OFFSET {offset} ROWS"),
            (_, Some(limit)) => format!(" LIMIT {limit} OFFSET {offset}"),
            (Self::Postgres, None) => format!(" OFFSET {offset}"),
            (Self::Sqlite, None) => format!(" LIMIT -1 OFFSET {offset}"),
            (Self::MySql, None) => format!(" LIMIT {} OFFSET {offset}", u64::MAX),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = String;

    /// Accepts product names with decoration, e.g. `"SQL Server 2012+"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();

        let dialect = [
            ("postgres", Self::Postgres),
            ("mysql", Self::MySql),
            ("mariadb", Self::MySql),
            ("sqlite", Self::Sqlite),
            ("sqlserver", Self::SqlServer),
            ("mssql", Self::SqlServer),
            ("oracle", Self::Oracle),
        ]
        .into_iter()
        .find(|(prefix, _)| normalized.starts_with(prefix))
        .map(|(_, dialect)| dialect);

        dialect.ok_or_else(|| format!("unknown database dialect '{s}'"))
    }
}

/// Strips surrounding whitespace and trailing semicolons.
#[must_use]
pub fn trim_statement(sql: &str) -> &str {
    sql.trim().trim_end_matches(';').trim_end()
}

fn outside_literals(sql: &str) -> impl Iterator<Item = char> + '_ {
    let mut in_literal = false;
    sql.chars().filter(move |c| {
        if *c == '\'' {
            in_literal = !in_literal;
            return false;
        }
        !in_literal
    })
}

fn max_numbered_placeholder(sql: &str) -> usize {
    let chars: Vec<char> = outside_literals(sql).collect();
    let mut max = 0;
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '$' {
            let digits: String = chars[i + 1..]
                .iter()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if let Ok(n) = digits.parse::<usize>() {
                max = max.max(n);
            }
            i += digits.len();
        }
        i += 1;
    }
    max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_from_url() {
        assert_eq!(Dialect::from_url("postgres://h/db"), Some(Dialect::Postgres));
        assert_eq!(Dialect::from_url("postgresql://h/db"), Some(Dialect::Postgres));
        assert_eq!(Dialect::from_url("mariadb://h/db"), Some(Dialect::MySql));
        assert_eq!(Dialect::from_url("sqlite::memory:"), Some(Dialect::Sqlite));
        assert_eq!(Dialect::from_url("ldap://h"), None);
    }

    #[test]
    fn limit_offset_paging() {
        let sql = Dialect::Sqlite.ordered_page("SELECT id FROM users;", "id", PagingWindow::new(1, 1));
        assert_eq!(
            sql,
            "SELECT * FROM (SELECT id FROM users\n) dir_page ORDER BY id LIMIT 1 OFFSET 1"
        );
    }

    #[test]
    fn fetch_next_paging() {
        let clause = Dialect::SqlServer.paging_clause(PagingWindow::new(20, 10));
        assert_eq!(clause, " OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY");
        let clause = Dialect::Oracle.paging_clause(PagingWindow::new(0, 5));
        assert_eq!(clause, " OFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY");
    }

    #[test]
    fn unbounded_window_adds_nothing() {
        for dialect in [Dialect::Postgres, Dialect::MySql, Dialect::Sqlite, Dialect::Oracle] {
            assert_eq!(dialect.paging_clause(PagingWindow::UNBOUNDED), "");
        }
    }

    #[test]
    fn offset_without_limit() {
        let window = PagingWindow {
            offset: 3,
            limit: None,
        };
        assert_eq!(Dialect::Postgres.paging_clause(window), " OFFSET 3");
        assert_eq!(Dialect::Sqlite.paging_clause(window), " LIMIT -1 OFFSET 3");
    }

    #[test]
    fn count_wraps_query() {
        assert_eq!(
            Dialect::MySql.count_query("SELECT * FROM users WHERE username LIKE ?"),
            "SELECT COUNT(*) FROM (SELECT * FROM users WHERE username LIKE ?\n) dir_count"
        );
    }

    #[test]
    fn positional_parameters_count_occurrences() {
        let sql = "SELECT * FROM users WHERE username LIKE ? OR email LIKE ? AND note <> '?'";
        assert_eq!(Dialect::MySql.parameter_count(sql), 2);
    }

    #[test]
    fn numbered_parameters_count_distinct() {
        let sql = "SELECT * FROM users WHERE username ILIKE $1 OR email ILIKE $1";
        assert_eq!(Dialect::Postgres.parameter_count(sql), 1);
        assert_eq!(Dialect::Postgres.parameter_count("SELECT 1"), 0);
    }

    #[test]
    fn dialect_from_str() {
        assert_eq!("MariaDB".parse::<Dialect>().unwrap(), Dialect::MySql);
        assert_eq!("SQL Server 2012+".parse::<Dialect>().unwrap(), Dialect::SqlServer);
        assert_eq!("POSTGRESQL".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("Oracle 12+".parse::<Dialect>().unwrap(), Dialect::Oracle);
        assert!("db2".parse::<Dialect>().is_err());
    }
}
