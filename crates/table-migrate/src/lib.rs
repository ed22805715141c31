//! # table-migrate
//!
//! Mapping-driven table migration between two MySQL databases.
//!
//! Each source table is described by a [`TableMapping`]: its destination
//! table, a per-column list of renames, transforms and defaults, and the
//! tables it depends on. The library provides:
//!
//! - **Dependency planning** with missing-table and cycle detection
//! - **Row transformation** through named, pure transforms
//! - **Batched copying** with per-row error isolation
//! - **Dry runs** that fetch and report without writing
//! - **Schema listing** of either side to JSON files
//!
//! ## Example
//!
//! ```rust,no_run
//! use table_migrate::{Config, MappingRegistry, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> table_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let registry = MappingRegistry::load("mappings.yaml")?;
//!     let orchestrator = Orchestrator::new(config, registry);
//!     let summary = orchestrator.run(None).await?;
//!     println!("Migrated {} rows", summary.migrated_rows);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod executor;
pub mod inspect;
pub mod mapping;
pub mod orchestrator;
pub mod plan;
pub mod transform;

// Re-exports for convenient access
pub use config::{Config, DatabaseConfig, MigrationConfig};
pub use crate::core::{Connector, Row, Side, SqlConnection, SqlValue};
pub use drivers::MysqlConnector;
pub use error::{MigrateError, Result};
pub use executor::{MigrationResult, Migrator, RunSummary, TableStatus};
pub use inspect::{ColumnDescription, TableDescription};
pub use mapping::{ColumnMapping, MappingRegistry, TableMapping, Transform};
pub use orchestrator::{ConnectionCheck, Orchestrator};
pub use plan::{build_execution_order, validate, MigrationPlan, PlanIssue, ValidationReport};
pub use transform::transform_row;
