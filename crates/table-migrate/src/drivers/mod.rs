//! Database drivers.
//!
//! Each driver implements [`Connector`](crate::core::Connector) and
//! [`SqlConnection`](crate::core::SqlConnection) for one database engine.

pub mod mysql;

pub use mysql::{MysqlConnection, MysqlConnector};
