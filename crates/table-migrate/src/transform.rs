//! Row transformation: one fetched source row in, one destination value
//! vector out.

use crate::core::{Row, SqlValue};
use crate::error::{MigrateError, Result};
use crate::mapping::TableMapping;

/// Build the destination values for one source row, in `mapping.columns` order.
///
/// A column whose `source` is present in the row takes the raw value, passed
/// through its transform if any. Otherwise the column falls back to its
/// `default_value`, or NULL.
pub fn transform_row(mapping: &TableMapping, row: &Row) -> Vec<SqlValue> {
    mapping
        .columns
        .iter()
        .map(|column| {
            let raw = column.source.as_deref().and_then(|name| row.get(name));
            match raw {
                Some(value) => match column.transform {
                    Some(transform) => transform.apply(value.clone()),
                    None => value.clone(),
                },
                None => column.default_value.clone().unwrap_or(SqlValue::Null),
            }
        })
        .collect()
}

/// Reject a transformed row in which a `required` column ended up NULL.
pub fn check_required(mapping: &TableMapping, values: &[SqlValue]) -> Result<()> {
    for (column, value) in mapping.columns.iter().zip(values) {
        if column.required && value.is_null() {
            return Err(MigrateError::RequiredColumn {
                table: mapping.destination_table.clone(),
                column: column.destination.clone(),
            });
        }
    }
    Ok(())
}
