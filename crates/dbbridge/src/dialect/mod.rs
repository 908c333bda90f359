//! Unified type vocabulary and per-source type mapping.
//!
//! Every source type system is mapped into one [`UnifiedType`] vocabulary by
//! a table-driven [`UnifiedTypeMapper`]. Projection generation and row
//! mapping only consume unified types.
//!
//! ```rust,ignore
//! let mapper = UnifiedTypeMapper::with_builtins();
//! let ty = mapper.map_type(SourceKind::GoogleSql, "ARRAY<JSON>", None, None);
//! assert_eq!(ty, UnifiedType::array_of(UnifiedType::Json));
//! ```

mod typemap;
mod unified;

pub use typemap::{TypeTable, UnifiedTypeMapper};
pub use unified::UnifiedType;
