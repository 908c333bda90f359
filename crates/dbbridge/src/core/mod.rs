//! Core abstractions shared by every bridge component.
//!
//! - [`schema`]: source, table and column metadata types
//! - [`value`]: SQL value representation with zero-copy text and bytes
//! - [`identifier`]: identifier validation and quoting
//! - [`traits`]: dialect, driver row and connector seams

pub mod identifier;
pub mod schema;
pub mod traits;
pub mod value;

pub use schema::{ColumnType, DatabaseSchema, SchemaReference, SourceKind, TableSchema};
pub use traits::{Dialect, DriverRow, SourceConnector};
pub use value::SqlValue;
