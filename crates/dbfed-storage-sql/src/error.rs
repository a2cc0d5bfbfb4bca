//! SQL storage error conversion.

use dbfed_storage::StorageError;
use sqlx::Error as SqlxError;
use sqlx::error::ErrorKind;

/// Converts a `SQLx` error to a storage error.
#[allow(clippy::needless_pass_by_value)]
pub fn from_sqlx_error(err: SqlxError) -> StorageError {
    match err {
        SqlxError::RowNotFound => StorageError::not_found("Row", "query returned no rows"),
        SqlxError::Database(db_err) => match db_err.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation => {
                StorageError::ConstraintViolation(db_err.message().to_string())
            }
            _ => StorageError::Query(db_err.to_string()),
        },
        SqlxError::Io(_) | SqlxError::Tls(_) | SqlxError::WorkerCrashed => {
            StorageError::Connection(err.to_string())
        }
        SqlxError::PoolTimedOut => StorageError::Connection("Connection pool timeout".to_string()),
        SqlxError::PoolClosed => StorageError::Connection("Connection pool closed".to_string()),
        SqlxError::Configuration(_) => StorageError::Configuration(err.to_string()),
        SqlxError::ColumnNotFound(_) | SqlxError::ColumnDecode { .. } | SqlxError::Decode(_) => {
            StorageError::InvalidData(err.to_string())
        }
        _ => StorageError::Internal(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_are_connection_failures() {
        assert!(from_sqlx_error(SqlxError::PoolTimedOut).is_connection_failure());
        assert!(from_sqlx_error(SqlxError::PoolClosed).is_connection_failure());
    }

    #[test]
    fn row_not_found_is_not_found() {
        assert!(from_sqlx_error(SqlxError::RowNotFound).is_not_found());
    }

    #[test]
    fn missing_column_is_invalid_data() {
        let err = from_sqlx_error(SqlxError::ColumnNotFound("username".to_string()));
        assert!(matches!(err, StorageError::InvalidData(_)));
    }
}
