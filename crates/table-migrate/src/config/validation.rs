//! Configuration validation.

use super::{Config, DatabaseConfig};
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    validate_database(&config.source, "source")?;
    validate_database(&config.destination, "destination")?;

    // Cannot migrate into the database we read from
    if config.source.host == config.destination.host
        && config.source.port == config.destination.port
        && config.source.database == config.destination.database
    {
        return Err(MigrateError::Config(
            "source and destination cannot be the same database".into(),
        ));
    }

    if config.migration.batch_size == 0 {
        return Err(MigrateError::Config(
            "migration.batch_size must be at least 1".into(),
        ));
    }

    Ok(())
}

fn validate_database(db: &DatabaseConfig, section: &str) -> Result<()> {
    if db.host.is_empty() {
        return Err(MigrateError::Config(format!("{}.host is required", section)));
    }
    if db.database.is_empty() {
        return Err(MigrateError::Config(format!(
            "{}.database is required",
            section
        )));
    }
    if db.user.is_empty() {
        return Err(MigrateError::Config(format!("{}.user is required", section)));
    }
    Ok(())
}
