//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::{MigrateError, Result};
use std::path::Path;
use tracing::debug;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from `SOURCE_DB_*` and `DEST_DB_*` environment
    /// variables. A `.env` file in the working directory is loaded first;
    /// variables already set in the process take precedence over it.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup. Unset and blank
    /// variables both fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Config {
            source: DatabaseConfig::from_lookup(&lookup, "SOURCE_DB", "vico_accounting")?,
            destination: DatabaseConfig::from_lookup(&lookup, "DEST_DB", "accounting_dev")?,
            migration: MigrationConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl DatabaseConfig {
    fn from_lookup<F>(lookup: &F, prefix: &str, default_database: &str) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{}_{}", prefix, name)).filter(|v| !v.trim().is_empty())
        };

        let port = match var("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                MigrateError::Config(format!("{}_PORT must be a port number, got '{}'", prefix, raw))
            })?,
            None => 3306,
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "localhost".to_string()),
            port,
            database: var("NAME").unwrap_or_else(|| default_database.to_string()),
            user: var("USER").unwrap_or_else(|| "root".to_string()),
            password: var("PASSWORD").unwrap_or_default(),
            ssl_mode: var("SSL_MODE").unwrap_or_else(|| "disable".to_string()),
        })
    }
}
