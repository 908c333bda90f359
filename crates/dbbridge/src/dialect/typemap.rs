//! Table-driven mapping from raw source types to [`UnifiedType`].
//!
//! Each source kind owns one static table of `(raw name, unified type)` pairs.
//! Composite types (arrays, lists, sets, maps) are parsed first and their
//! element types are looked up recursively. Anything not found maps to
//! [`UnifiedType::Unsupported`]; the mapper never fails.

use std::collections::HashMap;

use crate::core::schema::{ColumnType, SourceKind};

use super::unified::{parse_shape, RawShape, UnifiedType};

/// Spanner GoogleSQL scalar types.
const GOOGLESQL_TYPES: &[(&str, UnifiedType)] = &[
    ("bool", UnifiedType::Bool),
    ("int64", UnifiedType::Int),
    ("float32", UnifiedType::Float),
    ("float64", UnifiedType::Float),
    ("numeric", UnifiedType::NumericString),
    ("string", UnifiedType::String),
    ("bytes", UnifiedType::Bytes),
    ("date", UnifiedType::Date),
    ("timestamp", UnifiedType::Timestamp),
    ("json", UnifiedType::Json),
    ("uuid", UnifiedType::Uuid),
];

/// PostgreSQL (and the Spanner PostgreSQL interface) scalar types.
const POSTGRES_TYPES: &[(&str, UnifiedType)] = &[
    ("boolean", UnifiedType::Bool),
    ("bool", UnifiedType::Bool),
    ("smallint", UnifiedType::Int),
    ("int2", UnifiedType::Int),
    ("integer", UnifiedType::Int),
    ("int", UnifiedType::Int),
    ("int4", UnifiedType::Int),
    ("bigint", UnifiedType::Int),
    ("int8", UnifiedType::Int),
    ("serial", UnifiedType::Int),
    ("bigserial", UnifiedType::Int),
    ("real", UnifiedType::Float),
    ("float4", UnifiedType::Float),
    ("double precision", UnifiedType::Float),
    ("float8", UnifiedType::Float),
    ("numeric", UnifiedType::NumericString),
    ("decimal", UnifiedType::NumericString),
    ("money", UnifiedType::NumericString),
    ("character varying", UnifiedType::String),
    ("varchar", UnifiedType::String),
    ("character", UnifiedType::String),
    ("char", UnifiedType::String),
    ("bpchar", UnifiedType::String),
    ("text", UnifiedType::String),
    ("citext", UnifiedType::String),
    ("bytea", UnifiedType::Bytes),
    ("date", UnifiedType::Date),
    ("timestamp", UnifiedType::DateTime),
    ("timestamp without time zone", UnifiedType::DateTime),
    ("timestamptz", UnifiedType::Timestamp),
    ("timestamp with time zone", UnifiedType::Timestamp),
    ("spanner.commit_timestamp", UnifiedType::Timestamp),
    ("json", UnifiedType::Json),
    ("jsonb", UnifiedType::Json),
    ("uuid", UnifiedType::Uuid),
];

/// Cassandra CQL native types.
const CASSANDRA_TYPES: &[(&str, UnifiedType)] = &[
    ("ascii", UnifiedType::String),
    ("bigint", UnifiedType::Int),
    ("blob", UnifiedType::Bytes),
    ("boolean", UnifiedType::Bool),
    ("counter", UnifiedType::Int),
    ("date", UnifiedType::Date),
    ("decimal", UnifiedType::NumericString),
    ("double", UnifiedType::Float),
    ("duration", UnifiedType::String),
    ("float", UnifiedType::Float),
    ("inet", UnifiedType::String),
    ("int", UnifiedType::Int),
    ("smallint", UnifiedType::Int),
    ("text", UnifiedType::String),
    // Nanoseconds since midnight.
    ("time", UnifiedType::Int),
    ("timestamp", UnifiedType::Timestamp),
    ("timeuuid", UnifiedType::Uuid),
    ("tinyint", UnifiedType::Int),
    ("uuid", UnifiedType::Uuid),
    ("varchar", UnifiedType::String),
    ("varint", UnifiedType::NumericString),
];

/// MySQL / MariaDB types.
const MYSQL_TYPES: &[(&str, UnifiedType)] = &[
    ("bit", UnifiedType::Bytes),
    ("bool", UnifiedType::Bool),
    ("boolean", UnifiedType::Bool),
    ("tinyint", UnifiedType::Int),
    ("smallint", UnifiedType::Int),
    ("mediumint", UnifiedType::Int),
    ("int", UnifiedType::Int),
    ("integer", UnifiedType::Int),
    ("bigint", UnifiedType::Int),
    ("year", UnifiedType::Int),
    ("float", UnifiedType::Float),
    ("double", UnifiedType::Float),
    ("real", UnifiedType::Float),
    ("decimal", UnifiedType::NumericString),
    ("numeric", UnifiedType::NumericString),
    ("char", UnifiedType::String),
    ("varchar", UnifiedType::String),
    ("tinytext", UnifiedType::String),
    ("text", UnifiedType::String),
    ("mediumtext", UnifiedType::String),
    ("longtext", UnifiedType::String),
    ("enum", UnifiedType::String),
    ("set", UnifiedType::String),
    ("time", UnifiedType::String),
    ("binary", UnifiedType::Bytes),
    ("varbinary", UnifiedType::Bytes),
    ("tinyblob", UnifiedType::Bytes),
    ("blob", UnifiedType::Bytes),
    ("mediumblob", UnifiedType::Bytes),
    ("longblob", UnifiedType::Bytes),
    ("date", UnifiedType::Date),
    ("datetime", UnifiedType::DateTime),
    ("timestamp", UnifiedType::Timestamp),
    ("json", UnifiedType::Json),
];

/// Oracle types. `NUMBER` is refined by precision and scale.
const ORACLE_TYPES: &[(&str, UnifiedType)] = &[
    ("number", UnifiedType::NumericString),
    ("integer", UnifiedType::Int),
    ("float", UnifiedType::Float),
    ("binary_float", UnifiedType::Float),
    ("binary_double", UnifiedType::Float),
    ("char", UnifiedType::String),
    ("nchar", UnifiedType::String),
    ("varchar", UnifiedType::String),
    ("varchar2", UnifiedType::String),
    ("nvarchar2", UnifiedType::String),
    ("clob", UnifiedType::String),
    ("nclob", UnifiedType::String),
    ("long", UnifiedType::String),
    ("rowid", UnifiedType::String),
    ("blob", UnifiedType::Bytes),
    ("raw", UnifiedType::Bytes),
    ("long raw", UnifiedType::Bytes),
    ("date", UnifiedType::DateTime),
    ("timestamp", UnifiedType::DateTime),
    ("timestamp with time zone", UnifiedType::Timestamp),
    ("timestamp with local time zone", UnifiedType::Timestamp),
    ("json", UnifiedType::Json),
];

/// Largest Oracle `NUMBER(p, 0)` precision that always fits in an `i64`.
const ORACLE_MAX_INT_PRECISION: u32 = 18;

/// Built-in mapping table for one source kind.
#[derive(Debug, Clone, Copy)]
pub struct TypeTable {
    kind: SourceKind,
    entries: &'static [(&'static str, UnifiedType)],
}

impl TypeTable {
    /// Built-in table for a source kind.
    pub fn builtin(kind: SourceKind) -> Self {
        let entries = match kind {
            SourceKind::GoogleSql => GOOGLESQL_TYPES,
            SourceKind::PostgreSql => POSTGRES_TYPES,
            SourceKind::Cassandra => CASSANDRA_TYPES,
            SourceKind::MySql => MYSQL_TYPES,
            SourceKind::Oracle => ORACLE_TYPES,
        };
        Self { kind, entries }
    }

    /// Source kind this table belongs to.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// All `(normalized raw name, unified type)` pairs.
    pub fn entries(&self) -> &'static [(&'static str, UnifiedType)] {
        self.entries
    }
}

/// Maps raw source types to unified types.
///
/// Holds one lookup map per source kind, seeded from the built-in tables.
/// Overrides replace or extend entries for a single source kind.
#[derive(Debug, Clone)]
pub struct UnifiedTypeMapper {
    tables: HashMap<SourceKind, HashMap<String, UnifiedType>>,
}

impl Default for UnifiedTypeMapper {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl UnifiedTypeMapper {
    /// Create a mapper seeded with every built-in table.
    pub fn with_builtins() -> Self {
        let tables = SourceKind::ALL
            .iter()
            .map(|kind| {
                let table = TypeTable::builtin(*kind)
                    .entries()
                    .iter()
                    .map(|(name, ty)| ((*name).to_string(), ty.clone()))
                    .collect();
                (*kind, table)
            })
            .collect();
        Self { tables }
    }

    /// Add or replace the mapping of one raw scalar type.
    pub fn with_override(
        mut self,
        kind: SourceKind,
        raw_type: &str,
        unified: UnifiedType,
    ) -> Self {
        self.tables
            .entry(kind)
            .or_default()
            .insert(normalize(raw_type), unified);
        self
    }

    /// Map a column's raw type.
    pub fn map_column(&self, col: &ColumnType) -> UnifiedType {
        self.map_type(col.source_kind, &col.raw_type, col.precision, col.scale)
    }

    /// Map a raw source type to its unified type.
    ///
    /// Total: unknown names, unknown constructors and collections of unknown
    /// elements all yield [`UnifiedType::Unsupported`].
    pub fn map_type(
        &self,
        kind: SourceKind,
        raw_type: &str,
        precision: Option<u32>,
        scale: Option<u32>,
    ) -> UnifiedType {
        match parse_shape(raw_type) {
            RawShape::Array(element) => match self.map_type(kind, element, None, None) {
                UnifiedType::Unsupported => UnifiedType::Unsupported,
                inner => UnifiedType::array_of(inner),
            },
            RawShape::Map(key, value) => {
                let key = self.map_type(kind, key, None, None);
                let value = self.map_type(kind, value, None, None);
                if key.is_unsupported() || value.is_unsupported() {
                    UnifiedType::Unsupported
                } else {
                    UnifiedType::map_of(key, value)
                }
            }
            RawShape::Scalar(name) => {
                let (raw_precision, raw_scale) = size_args(raw_type);
                self.map_scalar(kind, name, precision.or(raw_precision), scale.or(raw_scale))
            }
        }
    }

    fn map_scalar(
        &self,
        kind: SourceKind,
        name: &str,
        precision: Option<u32>,
        scale: Option<u32>,
    ) -> UnifiedType {
        let key = normalize(name);

        match (kind, key.as_str()) {
            // NUMBER(p) is NUMBER(p, 0).
            (SourceKind::Oracle, "number") => {
                if let (Some(p), 0) = (precision, scale.unwrap_or(0)) {
                    if p > 0 && p <= ORACLE_MAX_INT_PRECISION {
                        return UnifiedType::Int;
                    }
                }
            }
            (SourceKind::MySql, "tinyint") if precision == Some(1) => {
                return UnifiedType::Bool;
            }
            _ => {}
        }

        self.tables
            .get(&kind)
            .and_then(|table| table.get(&key))
            .cloned()
            .unwrap_or(UnifiedType::Unsupported)
    }
}

/// Lowercase, drop parenthesized size arguments, collapse whitespace.
fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0u32;
    for c in raw.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c.to_ascii_lowercase()),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Numeric arguments of the first parenthesized group: `NUMBER(10,2)`,
/// `tinyint(1)`. Non-numeric arguments such as `MAX` yield `None`.
fn size_args(raw: &str) -> (Option<u32>, Option<u32>) {
    let args = match raw.split_once('(').and_then(|(_, rest)| rest.split_once(')')) {
        Some((args, _)) => args,
        None => return (None, None),
    };
    let mut parts = args.split(',').map(|p| p.trim().parse::<u32>().ok());
    let precision = parts.next().flatten();
    let scale = parts.next().flatten();
    (precision, scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(kind: SourceKind, raw: &str) -> UnifiedType {
        UnifiedTypeMapper::with_builtins().map_type(kind, raw, None, None)
    }

    #[test]
    fn test_googlesql_types() {
        assert_eq!(map(SourceKind::GoogleSql, "INT64"), UnifiedType::Int);
        assert_eq!(map(SourceKind::GoogleSql, "STRING(MAX)"), UnifiedType::String);
        assert_eq!(map(SourceKind::GoogleSql, "BYTES(1024)"), UnifiedType::Bytes);
        assert_eq!(map(SourceKind::GoogleSql, "JSON"), UnifiedType::Json);
        assert_eq!(
            map(SourceKind::GoogleSql, "ARRAY<NUMERIC>"),
            UnifiedType::array_of(UnifiedType::NumericString)
        );
        assert_eq!(
            map(SourceKind::GoogleSql, "ARRAY<STRING(MAX)>"),
            UnifiedType::array_of(UnifiedType::String)
        );
    }

    #[test]
    fn test_postgres_types() {
        assert_eq!(map(SourceKind::PostgreSql, "character varying(255)"), UnifiedType::String);
        assert_eq!(map(SourceKind::PostgreSql, "jsonb"), UnifiedType::Json);
        assert_eq!(
            map(SourceKind::PostgreSql, "uuid[]"),
            UnifiedType::array_of(UnifiedType::Uuid)
        );
        assert_eq!(
            map(SourceKind::PostgreSql, "timestamp(6) with time zone"),
            UnifiedType::Timestamp
        );
    }

    #[test]
    fn test_cassandra_collections() {
        assert_eq!(
            map(SourceKind::Cassandra, "list<int>"),
            UnifiedType::array_of(UnifiedType::Int)
        );
        assert_eq!(
            map(SourceKind::Cassandra, "frozen<set<timeuuid>>"),
            UnifiedType::array_of(UnifiedType::Uuid)
        );
        assert_eq!(
            map(SourceKind::Cassandra, "map<text, frozen<list<bigint>>>"),
            UnifiedType::map_of(
                UnifiedType::String,
                UnifiedType::array_of(UnifiedType::Int)
            )
        );
    }

    #[test]
    fn test_unknown_types_are_unsupported() {
        for raw in ["UnseenColumnType", "UNSUPPORTED", "", "tuple<int,text>", "list<udt_thing>"] {
            assert_eq!(map(SourceKind::Cassandra, raw), UnifiedType::Unsupported, "{}", raw);
        }
        assert_eq!(map(SourceKind::GoogleSql, "PROTO<my.Msg>"), UnifiedType::Unsupported);
        assert_eq!(
            map(SourceKind::Cassandra, "map<text, udt_thing>"),
            UnifiedType::Unsupported
        );
    }

    #[test]
    fn test_oracle_number_precision() {
        let mapper = UnifiedTypeMapper::with_builtins();
        assert_eq!(
            mapper.map_type(SourceKind::Oracle, "NUMBER", Some(10), Some(0)),
            UnifiedType::Int
        );
        assert_eq!(
            mapper.map_type(SourceKind::Oracle, "NUMBER", Some(10), Some(2)),
            UnifiedType::NumericString
        );
        assert_eq!(
            mapper.map_type(SourceKind::Oracle, "NUMBER", Some(38), Some(0)),
            UnifiedType::NumericString
        );
        assert_eq!(
            mapper.map_type(SourceKind::Oracle, "NUMBER", None, None),
            UnifiedType::NumericString
        );
    }

    #[test]
    fn test_precision_read_from_raw_type() {
        let mapper = UnifiedTypeMapper::with_builtins();
        assert_eq!(
            mapper.map_type(SourceKind::Oracle, "NUMBER(10,0)", None, None),
            UnifiedType::Int
        );
        assert_eq!(
            mapper.map_type(SourceKind::Oracle, "NUMBER(9)", None, None),
            UnifiedType::Int
        );
        assert_eq!(
            mapper.map_type(SourceKind::Oracle, "NUMBER(10, 2)", None, None),
            UnifiedType::NumericString
        );
        assert_eq!(
            mapper.map_type(SourceKind::Oracle, "NUMBER(*,0)", None, None),
            UnifiedType::NumericString
        );
        assert_eq!(
            mapper.map_type(SourceKind::MySql, "tinyint(1)", None, None),
            UnifiedType::Bool
        );
        assert_eq!(
            mapper.map_type(SourceKind::MySql, "TINYINT(4)", None, None),
            UnifiedType::Int
        );
        assert_eq!(size_args("STRING(MAX)"), (None, None));
    }

    #[test]
    fn test_mysql_tinyint_bool() {
        let mapper = UnifiedTypeMapper::with_builtins();
        assert_eq!(
            mapper.map_type(SourceKind::MySql, "tinyint", Some(1), None),
            UnifiedType::Bool
        );
        assert_eq!(
            mapper.map_type(SourceKind::MySql, "tinyint", Some(4), None),
            UnifiedType::Int
        );
    }

    #[test]
    fn test_override_extends_table() {
        let mapper = UnifiedTypeMapper::with_builtins().with_override(
            SourceKind::Cassandra,
            "udt_address",
            UnifiedType::Json,
        );
        assert_eq!(
            mapper.map_type(SourceKind::Cassandra, "list<udt_address>", None, None),
            UnifiedType::array_of(UnifiedType::Json)
        );
        // Other kinds are untouched.
        assert_eq!(
            mapper.map_type(SourceKind::MySql, "udt_address", None, None),
            UnifiedType::Unsupported
        );
    }

    #[test]
    fn test_tables_are_inspectable() {
        for kind in SourceKind::ALL {
            let table = TypeTable::builtin(kind);
            assert_eq!(table.kind(), kind);
            assert!(!table.entries().is_empty());
            for (name, _) in table.entries() {
                assert_eq!(*name, normalize(name), "table key {} is not normalized", name);
            }
        }
    }

    #[test]
    fn test_map_column() {
        let col = ColumnType::new("tags", "ARRAY<JSON>", SourceKind::GoogleSql);
        assert_eq!(
            UnifiedTypeMapper::default().map_column(&col),
            UnifiedType::array_of(UnifiedType::Json)
        );
    }
}
