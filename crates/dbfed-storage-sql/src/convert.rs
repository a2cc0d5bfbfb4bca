//! Row to record conversion.

use std::collections::BTreeMap;

use dbfed_storage::{IdentityRecord, StorageError, StorageResult};
use sqlx::any::AnyRow;
use sqlx::{Column, Row};

/// Converts a result row into an identity record.
///
/// Every non-null column becomes an attribute under the name the database
/// returned for it. Text, integer, floating point and boolean columns are
/// supported; cast anything else to text in the query.
///
/// # Errors
///
/// Returns `StorageError::InvalidData` for an unsupported column type or a
/// row without `id` and `username` columns.
pub fn record_from_row(row: &AnyRow) -> StorageResult<IdentityRecord> {
    let mut attributes = BTreeMap::new();
    for column in row.columns() {
        if let Some(value) = column_text(row, column.ordinal(), column.name())? {
            attributes.insert(column.name().to_string(), value);
        }
    }
    IdentityRecord::from_attributes(attributes)
}

fn column_text(row: &AnyRow, index: usize, name: &str) -> StorageResult<Option<String>> {
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return Ok(value);
    }
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return Ok(value.map(|v| v.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return Ok(value.map(|v| v.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<bool>, _>(index) {
        return Ok(value.map(|v| v.to_string()));
    }
    Err(StorageError::InvalidData(format!(
        "column '{name}' has a type that cannot be read as text"
    )))
}
