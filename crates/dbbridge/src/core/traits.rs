//! Core traits at the seams between the bridge and its collaborators.
//!
//! - [`Dialect`]: SQL syntax strategy for generated read queries
//! - [`DriverRow`]: physical column access on a row returned by a driver
//! - [`SourceConnector`]: connection lifecycle of an external source driver
//!
//! # Design Patterns
//!
//! - **Strategy**: `Dialect` provides interchangeable projection rules
//! - **Adapter**: `DriverRow` hides the driver's row API from the row mapper

use crate::dialect::UnifiedType;
use crate::error::{Result, RowError};

use super::value::SqlValue;

/// SQL syntax strategy for one relational dialect.
///
/// Implementations are stateless and cheap to clone.
pub trait Dialect: Send + Sync {
    /// Get the dialect identifier (e.g., "googlesql", "postgres").
    fn name(&self) -> &str;

    /// Validate and quote an identifier (table name, column name, alias).
    ///
    /// - GoogleSQL: `` `identifier` ``
    /// - PostgreSQL: `"identifier"`
    fn quote_ident(&self, name: &str) -> Result<String>;

    /// Quote a string literal.
    ///
    /// - GoogleSQL: `"value"`
    /// - PostgreSQL: `'value'`
    fn string_literal(&self, value: &str) -> String;

    /// Projection expression for one column of the table aliased `t`.
    ///
    /// Expressions that transform the value carry an alias so the output
    /// column keeps the source column name.
    fn column_expression(&self, column: &str, ty: &UnifiedType) -> Result<String>;
}

/// Physical column access on a driver row.
pub trait DriverRow {
    /// Read a column by name.
    ///
    /// Returns `Ok(None)` when the row does not carry the column and an error
    /// when the stored value cannot be decoded.
    fn column_value(&self, name: &str) -> std::result::Result<Option<SqlValue<'_>>, RowError>;
}

/// Connection lifecycle of an external source driver.
///
/// Consumed through [`ScopedConnector`](crate::source::ScopedConnector),
/// which guarantees `close` runs on every exit path.
pub trait SourceConnector {
    /// Row type produced by the driver.
    type Row: DriverRow;

    /// Single-pass cursor over the rows of one query.
    type Cursor: Iterator<Item = Self::Row>;

    /// Acquire the underlying connection or session.
    fn open(&mut self) -> Result<()>;

    /// Run a read query and return its cursor.
    fn execute(&mut self, query: &str) -> Result<Self::Cursor>;

    /// Release the connection. Called exactly once per successful `open`.
    fn close(&mut self);
}
