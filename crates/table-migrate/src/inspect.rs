//! Schema listing: table and column descriptions dumped to JSON files.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::sql::quote_ident;
use crate::core::{Row, SqlConnection, SqlValue};
use crate::error::Result;

/// Tables of the connection's current database, by name.
pub const LIST_TABLES_SQL: &str = "SELECT TABLE_NAME as tableName, TABLE_TYPE as tableType, \
ENGINE as engine, TABLE_ROWS as rowCount FROM information_schema.TABLES \
WHERE TABLE_SCHEMA = DATABASE() ORDER BY TABLE_NAME";

/// One table and its `DESCRIBE` output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescription {
    pub table_name: String,
    pub table_type: String,
    pub engine: Option<String>,
    /// Estimated by InnoDB; not an exact count.
    pub row_count: Option<u64>,
    pub columns: Vec<ColumnDescription>,
}

/// One `DESCRIBE` row, keyed the way MySQL names the columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ColumnDescription {
    pub field: String,
    #[serde(rename = "Type")]
    pub column_type: String,
    pub null: String,
    pub key: String,
    pub default: Option<String>,
    pub extra: String,
}

/// File written by [`save_structure`].
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureDump {
    pub database: String,
    pub total_tables: usize,
    pub tables: Vec<TableDescription>,
    pub timestamp: String,
}

/// Describe every table in the connection's current database.
pub async fn describe_tables(conn: &mut dyn SqlConnection) -> Result<Vec<TableDescription>> {
    let tables = conn.query(LIST_TABLES_SQL, &[]).await?;
    let mut described = Vec::with_capacity(tables.len());

    for table in &tables {
        let table_name = text(table, "tableName").unwrap_or_default();
        debug!("Describing table: {}", table_name);

        let columns = conn
            .query(&format!("DESCRIBE {}", quote_ident(&table_name)), &[])
            .await?
            .iter()
            .map(|col| ColumnDescription {
                field: text(col, "Field").unwrap_or_default(),
                column_type: text(col, "Type").unwrap_or_default(),
                null: text(col, "Null").unwrap_or_default(),
                key: text(col, "Key").unwrap_or_default(),
                default: text(col, "Default"),
                extra: text(col, "Extra").unwrap_or_default(),
            })
            .collect();

        described.push(TableDescription {
            table_name,
            table_type: text(table, "tableType").unwrap_or_default(),
            engine: text(table, "engine"),
            row_count: table
                .get("rowCount")
                .and_then(SqlValue::as_i64)
                .map(|n| n.max(0) as u64),
            columns,
        });
    }

    Ok(described)
}

/// Write `{label}_structure_{millis}.json` into `dir`, creating it if needed.
pub fn save_structure(tables: &[TableDescription], label: &str, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let now = Utc::now();
    let dump = StructureDump {
        database: label.to_string(),
        total_tables: tables.len(),
        tables: tables.to_vec(),
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    };

    let path = dir.join(format!("{}_structure_{}.json", label, now.timestamp_millis()));
    std::fs::write(&path, serde_json::to_string_pretty(&dump)?)?;
    info!("Saved {} table descriptions to {}", tables.len(), path.display());
    Ok(path)
}

fn text(row: &Row, key: &str) -> Option<String> {
    match row.get(key)? {
        SqlValue::Null => None,
        SqlValue::Text(s) => Some(s.clone()),
        SqlValue::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
        other => Some(other.to_string()),
    }
}
