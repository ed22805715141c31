//! MySQL/MariaDB driver built on mysql_async.
//!
//! Every [`MysqlConnector::connect`] call opens a dedicated connection, so
//! each table migration owns its pair of sessions and closes them itself.

mod convert;

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, Params, SslOpts};
use tracing::{debug, warn};

use crate::config::DatabaseConfig;
use crate::core::{Connector, Row, SqlConnection, SqlValue};
use crate::error::{MigrateError, Result};

pub use convert::{from_mysql, to_mysql};

/// Opens connections to one MySQL database.
pub struct MysqlConnector {
    opts: Opts,
    target: String,
}

impl MysqlConnector {
    /// Build a connector from configuration. No connection is made until
    /// [`Connector::connect`] is called.
    pub fn new(config: &DatabaseConfig) -> Self {
        let mut builder = OptsBuilder::default()
            .ip_or_hostname(&config.host)
            .tcp_port(config.port)
            .db_name(Some(&config.database))
            .user(Some(&config.user))
            .pass(Some(&config.password))
            // Use utf8mb4 for full Unicode support
            .init(vec!["SET NAMES utf8mb4"]);

        if let Some(ssl) = ssl_opts(&config.ssl_mode) {
            builder = builder.ssl_opts(ssl);
        }

        Self {
            opts: builder.into(),
            target: config.display_target(),
        }
    }
}

#[async_trait]
impl Connector for MysqlConnector {
    async fn connect(&self) -> Result<Box<dyn SqlConnection>> {
        let conn = Conn::new(self.opts.clone())
            .await
            .map_err(|e| MigrateError::connection(e, format!("connecting to {}", self.target)))?;
        debug!("Connected to MySQL: {}", self.target);

        Ok(Box::new(MysqlConnection {
            conn: Some(conn),
            target: self.target.clone(),
        }))
    }

    fn describe(&self) -> String {
        format!("mysql://{}", self.target)
    }
}

/// Map a configured `ssl_mode` onto mysql_async TLS options.
fn ssl_opts(mode: &str) -> Option<SslOpts> {
    match mode.to_lowercase().as_str() {
        "disable" => {
            warn!("MySQL TLS is disabled. Credentials will be transmitted in plaintext.");
            None
        }
        "prefer" | "require" => Some(SslOpts::default().with_danger_accept_invalid_certs(true)),
        "verify-ca" | "verify_ca" | "verify-full" | "verify_identity" => Some(SslOpts::default()),
        _ => {
            warn!("Unknown ssl_mode '{}', defaulting to Preferred", mode);
            Some(SslOpts::default().with_danger_accept_invalid_certs(true))
        }
    }
}

/// A single open MySQL session.
pub struct MysqlConnection {
    conn: Option<Conn>,
    target: String,
}

impl MysqlConnection {
    fn conn(&mut self) -> Result<&mut Conn> {
        let target = &self.target;
        self.conn
            .as_mut()
            .ok_or_else(|| MigrateError::connection("connection already closed", target.clone()))
    }
}

fn params(values: &[SqlValue]) -> Params {
    if values.is_empty() {
        Params::Empty
    } else {
        Params::Positional(values.iter().map(to_mysql).collect())
    }
}

#[async_trait]
impl SqlConnection for MysqlConnection {
    async fn query(&mut self, sql: &str, values: &[SqlValue]) -> Result<Vec<Row>> {
        let conn = self.conn()?;
        // Parameterless statements use the text protocol so DESCRIBE works.
        let rows: Vec<mysql_async::Row> = if values.is_empty() {
            conn.query::<mysql_async::Row, _>(sql).await
        } else {
            conn.exec::<mysql_async::Row, _, _>(sql, params(values)).await
        }
        .map_err(|e| MigrateError::query(sql, e))?;

        Ok(rows.into_iter().map(convert::row_from_mysql).collect())
    }

    async fn prepare(&mut self, sql: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.prep(sql)
            .await
            .map_err(|e| MigrateError::query(sql, e))?;
        Ok(())
    }

    async fn execute(&mut self, sql: &str, values: &[SqlValue]) -> Result<u64> {
        let conn = self.conn()?;
        conn.exec_drop(sql, params(values))
            .await
            .map_err(|e| MigrateError::query(sql, e))?;
        Ok(conn.affected_rows())
    }

    async fn end(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.disconnect()
                .await
                .map_err(|e| MigrateError::connection(e, format!("closing {}", self.target)))?;
            debug!("Disconnected from MySQL: {}", self.target);
        }
        Ok(())
    }
}
