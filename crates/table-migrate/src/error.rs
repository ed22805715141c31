//! Error types for the migration library.

use thiserror::Error;

/// Exit code for configuration and mapping errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code when a database connection could not be established.
pub const EXIT_CONNECTION_ERROR: u8 = 2;
/// Exit code when a query failed outside of a table migration.
pub const EXIT_QUERY_ERROR: u8 = 3;
/// Exit code when the run finished but at least one table reported failures.
pub const EXIT_MIGRATION_FAILURES: u8 = 4;
/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mapping definition error (duplicate tables, duplicate columns, unknown transform)
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Mapping dependency graph failed validation
    #[error("Mapping validation failed:\n  - {}", .0.join("\n  - "))]
    InvalidPlan(Vec<String>),

    /// A table filter named a table with no mapping
    #[error("Table mapping not found: {table}. Available tables: {}", .available.join(", "))]
    UnknownTable {
        table: String,
        available: Vec<String>,
    },

    /// Connection could not be opened or closed
    #[error("Connection error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// Query execution failed. The statement is kept for diagnostics but left
    /// out of the message, since row errors are collected per row.
    #[error("Query failed: {message}")]
    Query { sql: String, message: String },

    /// A required destination column resolved to NULL
    #[error("Required column {column} of {table} is NULL")]
    RequiredColumn { table: String, column: String },

    /// The run completed but some tables reported failed rows or errors
    #[error("Migration completed with errors in {0} table(s)")]
    Incomplete(usize),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Connection error with context about where it occurred
    pub fn connection(message: impl ToString, context: impl Into<String>) -> Self {
        MigrateError::Connection {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Query error for the statement that failed
    pub fn query(sql: impl Into<String>, message: impl ToString) -> Self {
        MigrateError::Query {
            sql: sql.into(),
            message: message.to_string(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_)
            | MigrateError::Mapping(_)
            | MigrateError::InvalidPlan(_)
            | MigrateError::UnknownTable { .. }
            | MigrateError::Yaml(_)
            | MigrateError::Json(_) => EXIT_CONFIG_ERROR,
            MigrateError::Connection { .. } => EXIT_CONNECTION_ERROR,
            MigrateError::Query { .. }
            | MigrateError::RequiredColumn { .. } => EXIT_QUERY_ERROR,
            MigrateError::Incomplete(_) => EXIT_MIGRATION_FAILURES,
            MigrateError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);
        if let MigrateError::Query { sql, .. } = self {
            output.push_str(&format!("  Query: {}\n", sql));
        }

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
