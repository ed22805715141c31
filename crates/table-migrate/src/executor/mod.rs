//! Table migration executor and batch runner.
//!
//! [`Migrator::migrate_table`] copies one table: optional skip check, source
//! count, full fetch, then batched single-row inserts with per-row error
//! isolation. Nothing escapes it; every failure ends up in the returned
//! [`MigrationResult`]. [`Migrator::migrate_tables`] runs a list of tables
//! strictly one after another.

mod result;
#[cfg(test)]
pub(crate) mod testing;

pub use result::{MigrationResult, RunSummary, TableStatus};

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::config::MigrationConfig;
use crate::core::sql::{count_rows, insert_row, select_all};
use crate::core::{Connector, Row, Side, SqlConnection};
use crate::error::{MigrateError, Result};
use crate::mapping::TableMapping;
use crate::transform::{check_required, transform_row};

/// Copies tables from one database to another according to their mappings.
pub struct Migrator {
    source: Arc<dyn Connector>,
    destination: Arc<dyn Connector>,
    options: MigrationConfig,
}

impl Migrator {
    pub fn new(
        source: Arc<dyn Connector>,
        destination: Arc<dyn Connector>,
        options: MigrationConfig,
    ) -> Self {
        Self {
            source,
            destination,
            options,
        }
    }

    pub fn options(&self) -> &MigrationConfig {
        &self.options
    }

    /// Migrate a single table.
    pub async fn migrate_table(&self, mapping: &TableMapping) -> MigrationResult {
        let started = Instant::now();
        let mut result = MigrationResult::new(mapping);

        info!(
            "Migrating {} -> {}{}",
            mapping.source_table,
            mapping.destination_table,
            if self.options.dry_run { " (dry run)" } else { "" }
        );

        let mut source = match self.source.connect().await {
            Ok(conn) => conn,
            Err(e) => {
                fail(&mut result, mapping, e);
                result.duration = started.elapsed();
                return result;
            }
        };

        let mut destination = match self.destination.connect().await {
            Ok(conn) => conn,
            Err(e) => {
                close(source.as_mut(), Side::Source, mapping).await;
                fail(&mut result, mapping, e);
                result.duration = started.elapsed();
                return result;
            }
        };

        if let Err(e) = self
            .run_table(mapping, source.as_mut(), destination.as_mut(), &mut result)
            .await
        {
            fail(&mut result, mapping, e);
        }

        close(source.as_mut(), Side::Source, mapping).await;
        close(destination.as_mut(), Side::Destination, mapping).await;

        result.duration = started.elapsed();
        log_table_summary(&result, self.options.dry_run);
        result
    }

    /// Migrate tables in the given order, one at a time. Never stops early.
    pub async fn migrate_tables(&self, mappings: &[&TableMapping]) -> RunSummary {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let started = Instant::now();

        info!(
            "Starting migration run {}: {} table(s){}",
            run_id,
            mappings.len(),
            if self.options.dry_run { " [DRY RUN]" } else { "" }
        );

        let mut results = Vec::with_capacity(mappings.len());
        for (index, mapping) in mappings.iter().enumerate() {
            debug!("Table {}/{}: {}", index + 1, mappings.len(), mapping.source_table);
            results.push(self.migrate_table(mapping).await);
        }

        let summary = RunSummary::new(
            run_id,
            started_at,
            started.elapsed(),
            self.options.dry_run,
            results,
        );

        info!(
            "Run {} finished in {:.2}s: {} table(s), {} of {} rows migrated, {} failed",
            summary.run_id,
            summary.duration.as_secs_f64(),
            summary.tables_total,
            summary.migrated_rows,
            summary.total_rows,
            summary.failed_rows
        );
        if summary.has_failures() {
            warn!("Tables with failures: {}", summary.failed_tables().join(", "));
        }

        summary
    }

    async fn run_table(
        &self,
        mapping: &TableMapping,
        source: &mut dyn SqlConnection,
        destination: &mut dyn SqlConnection,
        result: &mut MigrationResult,
    ) -> Result<()> {
        if self.options.skip_if_exists {
            let existing = count(destination, &mapping.destination_table).await?;
            if existing > 0 {
                info!(
                    "{}: destination {} already has {} rows, skipping",
                    mapping.source_table, mapping.destination_table, existing
                );
                result.status = TableStatus::Skipped;
                return Ok(());
            }
        }

        result.total_rows = count(source, &mapping.source_table).await?;
        if result.total_rows == 0 {
            info!("{}: source is empty", mapping.source_table);
            result.status = TableStatus::Empty;
            return Ok(());
        }

        let rows = source.query(&select_all(&mapping.source_table), &[]).await?;
        info!("{}: fetched {} rows", mapping.source_table, rows.len());

        if self.options.dry_run {
            result.migrated_rows = rows.len() as u64;
            result.sample_row = rows.into_iter().next();
            if let Some(sample) = &result.sample_row {
                debug!("{}: sample row {:?}", mapping.source_table, sample);
            }
            result.status = TableStatus::Simulated;
            return Ok(());
        }

        self.insert_batches(mapping, destination, &rows, result).await;
        result.status = TableStatus::Migrated;

        if let Some(sql) = &mapping.post_migration_validation {
            match destination.query(sql, &[]).await {
                Ok(rows) => {
                    result.validation = rows.into_iter().next();
                    info!(
                        "{}: validation result {:?}",
                        mapping.destination_table, result.validation
                    );
                }
                Err(e) => warn!("{}: validation query failed: {}", mapping.destination_table, e),
            }
        }

        Ok(())
    }

    async fn insert_batches(
        &self,
        mapping: &TableMapping,
        destination: &mut dyn SqlConnection,
        rows: &[Row],
        result: &mut MigrationResult,
    ) {
        let sql = insert_row(&mapping.destination_table, &mapping.destination_columns());
        let batch_size = self.options.batch_size.max(1);
        let batch_count = rows.len().div_ceil(batch_size);

        for (index, batch) in rows.chunks(batch_size).enumerate() {
            let number = index + 1;

            if let Err(e) = destination.prepare(&sql).await {
                error!("{}: batch {} failed: {}", mapping.destination_table, number, e);
                result.errors.push(format!("Batch {} error: {}", number, e));
                continue;
            }

            for row in batch {
                match self.insert_one(mapping, destination, &sql, row).await {
                    Ok(()) => result.migrated_rows += 1,
                    Err(e) => {
                        debug!("{}: row failed: {}", mapping.destination_table, e);
                        result.failed_rows += 1;
                        result.errors.push(format!("Row error: {}", e));
                    }
                }
            }

            info!(
                "{}: batch {}/{} done, {} rows migrated so far",
                mapping.destination_table, number, batch_count, result.migrated_rows
            );
        }
    }

    async fn insert_one(
        &self,
        mapping: &TableMapping,
        destination: &mut dyn SqlConnection,
        sql: &str,
        row: &Row,
    ) -> Result<()> {
        let values = transform_row(mapping, row);
        if self.options.enforce_required {
            check_required(mapping, &values)?;
        }
        destination.execute(sql, &values).await?;
        Ok(())
    }
}

/// Run `SELECT COUNT(*)` for a table and read the single scalar back.
async fn count(conn: &mut dyn SqlConnection, table: &str) -> Result<u64> {
    let sql = count_rows(table);
    let rows = conn.query(&sql, &[]).await?;
    rows.first()
        .and_then(|row| row.get("count").or_else(|| row.values().next()))
        .and_then(|value| value.as_i64())
        .map(|n| n.max(0) as u64)
        .ok_or_else(|| MigrateError::query(sql, "row count query returned no value"))
}

fn fail(result: &mut MigrationResult, mapping: &TableMapping, e: MigrateError) {
    error!("{}: migration failed: {}", mapping.source_table, e);
    result.status = TableStatus::Failed;
    result.errors.push(format!("Migration error: {}", e));
}

async fn close(conn: &mut dyn SqlConnection, side: Side, mapping: &TableMapping) {
    if let Err(e) = conn.end().await {
        warn!(
            "{}: failed to close {} connection: {}",
            mapping.source_table, side, e
        );
    }
}

fn log_table_summary(result: &MigrationResult, dry_run: bool) {
    let secs = result.duration.as_secs_f64();
    match result.status {
        TableStatus::Failed => error!(
            "{}: failed after {:.2}s ({} error(s))",
            result.table_name,
            secs,
            result.errors.len()
        ),
        _ if dry_run => info!(
            "{}: [simulated] would migrate {} rows ({:.2}s)",
            result.table_name, result.migrated_rows, secs
        ),
        _ if result.failed_rows > 0 => warn!(
            "{}: {} of {} rows migrated, {} failed ({:.2}s)",
            result.table_name, result.migrated_rows, result.total_rows, result.failed_rows, secs
        ),
        _ => info!(
            "{}: {} ({} of {} rows, {:.2}s)",
            result.table_name, result.status, result.migrated_rows, result.total_rows, secs
        ),
    }
}
