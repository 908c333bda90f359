//! Source row model, CDC accessors and driver row mapping.
//!
//! - [`SourceRow`]: normalized record backed by structured values or a JSON document
//! - [`cdc`]: `_metadata_*` field names and CDC accessors on `SourceRow`
//! - [`SourceRowMapper`]: driver rows → `SourceRow`, degrading unreadable fields to NULL
//! - [`ScopedConnector`]: closes an external connector on every exit path

pub mod cdc;
mod mapper;
mod row;
mod session;

pub use mapper::{DriverCell, MappedRows, NamedRow, PositionalRow, SourceRowMapper};
pub use row::{FieldDiagnostic, RowPayload, SourceRow, StreamMetadata};
pub use session::ScopedConnector;
