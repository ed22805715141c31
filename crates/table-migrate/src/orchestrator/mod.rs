//! Migration orchestrator - main workflow coordinator.
//!
//! Ties the configuration, the mapping registry and the two connectors
//! together: validates the plan, picks the tables, then hands them to the
//! [`Migrator`] in execution order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::core::{Connector, Side, SqlConnection};
use crate::drivers::MysqlConnector;
use crate::error::{MigrateError, Result};
use crate::executor::{Migrator, RunSummary};
use crate::inspect::{describe_tables, TableDescription};
use crate::mapping::MappingRegistry;
use crate::plan::MigrationPlan;

/// Query used to check that a connection is usable.
pub const CONNECTION_TEST_SQL: &str = "SELECT 1 + 1 AS result";

/// Migration orchestrator.
pub struct Orchestrator {
    config: Config,
    registry: MappingRegistry,
    source: Arc<dyn Connector>,
    destination: Arc<dyn Connector>,
}

/// Outcome of [`Orchestrator::test_connection`].
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionCheck {
    pub side: &'static str,
    pub target: String,
    /// Value of `1 + 1` as reported by the server.
    pub result: i64,
    #[serde(rename = "latency_ms", serialize_with = "as_millis")]
    pub latency: Duration,
}

impl Orchestrator {
    /// Create an orchestrator talking to the configured MySQL databases.
    pub fn new(config: Config, registry: MappingRegistry) -> Self {
        let source = Arc::new(MysqlConnector::new(&config.source));
        let destination = Arc::new(MysqlConnector::new(&config.destination));
        Self::with_connectors(config, registry, source, destination)
    }

    /// Create an orchestrator with explicit connectors.
    pub fn with_connectors(
        config: Config,
        registry: MappingRegistry,
        source: Arc<dyn Connector>,
        destination: Arc<dyn Connector>,
    ) -> Self {
        Self {
            config,
            registry,
            source,
            destination,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    /// Validate the mappings and compute the execution order.
    pub fn plan(&self) -> Result<MigrationPlan<'_>> {
        MigrationPlan::build(&self.registry)
    }

    /// Run the migration, optionally limited to a single source table.
    ///
    /// Plan and filter errors are returned before any connection is opened.
    /// Table-level failures are reported inside the summary instead.
    pub async fn run(&self, table: Option<&str>) -> Result<RunSummary> {
        let plan = self.plan()?;
        info!("Execution order: {}", plan.execution_order().join(" -> "));

        let mappings = plan.select(table)?;
        if let Some(name) = table {
            info!("Migrating single table: {}", name);
        }

        info!(
            "Source: {}, destination: {}",
            self.source.describe(),
            self.destination.describe()
        );

        let migrator = Migrator::new(
            self.source.clone(),
            self.destination.clone(),
            self.config.migration.clone(),
        );
        Ok(migrator.migrate_tables(&mappings).await)
    }

    fn connector(&self, side: Side) -> &Arc<dyn Connector> {
        match side {
            Side::Source => &self.source,
            Side::Destination => &self.destination,
        }
    }

    /// Open a connection and run `SELECT 1 + 1`.
    pub async fn test_connection(&self, side: Side) -> Result<ConnectionCheck> {
        let connector = self.connector(side);
        let started = Instant::now();
        let mut conn = connector.connect().await?;
        let outcome = conn.query(CONNECTION_TEST_SQL, &[]).await;
        release(conn.as_mut(), side).await;

        let result = outcome?
            .first()
            .and_then(|row| row.get("result"))
            .and_then(|value| value.as_i64())
            .ok_or_else(|| MigrateError::query(CONNECTION_TEST_SQL, "no result returned"))?;

        Ok(ConnectionCheck {
            side: side.as_str(),
            target: connector.describe(),
            result,
            latency: started.elapsed(),
        })
    }

    /// Describe every table on one side.
    pub async fn list_tables(&self, side: Side) -> Result<Vec<TableDescription>> {
        let mut conn = self.connector(side).connect().await?;
        let tables = describe_tables(conn.as_mut()).await;
        release(conn.as_mut(), side).await;

        let tables = tables?;
        info!("Found {} tables in {} database", tables.len(), side);
        Ok(tables)
    }
}

async fn release(conn: &mut dyn SqlConnection, side: Side) {
    if let Err(e) = conn.end().await {
        warn!("Failed to close {} connection: {}", side, e);
    }
}

fn as_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}
