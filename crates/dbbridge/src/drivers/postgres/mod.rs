//! PostgreSQL driver.
//!
//! Covers PostgreSQL sources and the Spanner PostgreSQL interface.
//!
//! - [`PostgresDialect`]: SQL syntax strategy for PostgreSQL read queries

mod dialect;

pub use dialect::PostgresDialect;
