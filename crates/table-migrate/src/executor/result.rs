//! Per-table results and run summaries.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::core::Row;
use crate::error::Result;
use crate::mapping::TableMapping;

/// How a table migration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    /// Rows were written (individual rows may still have failed).
    Migrated,
    /// Destination already held rows and `skip_if_exists` was set.
    Skipped,
    /// Source table had no rows.
    Empty,
    /// Dry run: rows fetched, nothing written.
    Simulated,
    /// A table-level error stopped the migration.
    Failed,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Migrated => "migrated",
            TableStatus::Skipped => "skipped",
            TableStatus::Empty => "empty",
            TableStatus::Simulated => "simulated",
            TableStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of migrating one table.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationResult {
    /// Source table name.
    pub table_name: String,

    pub destination_table: String,

    pub status: TableStatus,

    /// Source row count.
    pub total_rows: u64,

    /// Rows inserted, or fetched on a dry run.
    pub migrated_rows: u64,

    pub failed_rows: u64,

    /// Row, batch and table-level error messages, in the order they occurred.
    pub errors: Vec<String>,

    /// Wall time for the table.
    #[serde(rename = "duration_seconds", serialize_with = "as_seconds")]
    pub duration: Duration,

    /// First fetched row of a dry run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_row: Option<Row>,

    /// First row returned by the post-migration validation query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<Row>,
}

impl MigrationResult {
    pub(crate) fn new(mapping: &TableMapping) -> Self {
        Self {
            table_name: mapping.source_table.clone(),
            destination_table: mapping.destination_table.clone(),
            status: TableStatus::Migrated,
            total_rows: 0,
            migrated_rows: 0,
            failed_rows: 0,
            errors: Vec::new(),
            duration: Duration::ZERO,
            sample_row: None,
            validation: None,
        }
    }

    /// True when any row failed or any error was recorded.
    pub fn has_failures(&self) -> bool {
        self.failed_rows > 0 || !self.errors.is_empty()
    }
}

/// Results of a batch run, in the order the tables were migrated.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Unique run identifier.
    pub run_id: String,

    pub started_at: DateTime<Utc>,

    #[serde(rename = "duration_seconds", serialize_with = "as_seconds")]
    pub duration: Duration,

    /// Whether the run was a dry run.
    pub dry_run: bool,

    pub tables_total: usize,
    pub tables_failed: usize,
    pub total_rows: u64,
    pub migrated_rows: u64,
    pub failed_rows: u64,

    pub results: Vec<MigrationResult>,
}

impl RunSummary {
    pub(crate) fn new(
        run_id: String,
        started_at: DateTime<Utc>,
        duration: Duration,
        dry_run: bool,
        results: Vec<MigrationResult>,
    ) -> Self {
        Self {
            run_id,
            started_at,
            duration,
            dry_run,
            tables_total: results.len(),
            tables_failed: results.iter().filter(|r| r.has_failures()).count(),
            total_rows: results.iter().map(|r| r.total_rows).sum(),
            migrated_rows: results.iter().map(|r| r.migrated_rows).sum(),
            failed_rows: results.iter().map(|r| r.failed_rows).sum(),
            results,
        }
    }

    /// True when any table reported failures.
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(MigrationResult::has_failures)
    }

    /// Source names of tables that reported failures.
    pub fn failed_tables(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| r.has_failures())
            .map(|r| r.table_name.as_str())
            .collect()
    }

    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn as_seconds<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
