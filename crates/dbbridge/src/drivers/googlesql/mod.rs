//! Spanner GoogleSQL driver.
//!
//! - [`GoogleSqlDialect`]: SQL syntax strategy for GoogleSQL read queries

mod dialect;

pub use dialect::GoogleSqlDialect;
