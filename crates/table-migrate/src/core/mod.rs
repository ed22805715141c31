//! Core abstractions shared across the migration engine.
//!
//! - [`value`]: owned SQL values and the fetched [`Row`] type
//! - [`traits`]: the [`Connector`] / [`SqlConnection`] client seam
//! - [`sql`]: generated SQL shapes (count, fetch, insert)

pub mod sql;
pub mod traits;
pub mod value;

pub use traits::{Connector, Side, SqlConnection};
pub use value::{Row, SqlValue};
