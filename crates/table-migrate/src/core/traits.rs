//! Database client abstractions used by the migration engine.
//!
//! - [`Connector`]: opens a fresh connection to one logical database
//! - [`SqlConnection`]: executes parameterized statements on that connection
//!
//! The executor only ever talks to these traits, so tests drive it with
//! in-memory fakes and the MySQL driver stays at the edge.

use async_trait::async_trait;

use crate::error::Result;

use super::value::{Row, SqlValue};

/// Which side of the migration a connection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Source,
    Destination,
}

impl Side {
    /// Lowercase label used in logs and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Destination => "destination",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live connection to one database.
#[async_trait]
pub trait SqlConnection: Send {
    /// Run a statement that returns rows.
    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>>;

    /// Prepare a statement for repeated execution.
    ///
    /// Drivers without a statement cache may treat this as a syntax check.
    async fn prepare(&mut self, sql: &str) -> Result<()>;

    /// Run a statement that modifies data, returning the affected row count.
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64>;

    /// Release the connection.
    async fn end(&mut self) -> Result<()>;
}

/// Opens connections to one logical database.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a new connection.
    async fn connect(&self) -> Result<Box<dyn SqlConnection>>;

    /// Human-readable target description, without credentials.
    fn describe(&self) -> String;
}
