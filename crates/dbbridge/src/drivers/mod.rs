//! SQL dialect drivers.
//!
//! - [`googlesql`]: Spanner GoogleSQL
//! - [`postgres`]: PostgreSQL and the Spanner PostgreSQL interface
//!
//! # Static dispatch
//!
//! [`SqlDialect`] wraps every dialect in an enum that implements [`Dialect`]
//! with a match, so callers get one concrete type without a vtable. Dialects
//! are resolved by name or source kind once, when a job is built; anything
//! that cannot render SQL fails there with `BridgeError::UnsupportedDialect`.
//!
//! # Adding New Dialects
//!
//! 1. Create a module under `drivers/` implementing [`Dialect`]
//! 2. Add an enum variant to [`SqlDialect`]
//! 3. Accept its names in [`SqlDialect::from_name`]

pub mod googlesql;
pub mod postgres;

pub use googlesql::GoogleSqlDialect;
pub use postgres::PostgresDialect;

use std::str::FromStr;

use crate::core::schema::{ColumnType, SourceKind};
use crate::core::traits::Dialect;
use crate::dialect::{UnifiedType, UnifiedTypeMapper};
use crate::error::{BridgeError, Result};

/// Enum-based static dispatch for SQL dialects.
#[derive(Debug, Clone)]
pub enum SqlDialect {
    GoogleSql(GoogleSqlDialect),
    Postgres(PostgresDialect),
}

impl Dialect for SqlDialect {
    fn name(&self) -> &str {
        match self {
            SqlDialect::GoogleSql(d) => d.name(),
            SqlDialect::Postgres(d) => d.name(),
        }
    }

    fn quote_ident(&self, name: &str) -> Result<String> {
        match self {
            SqlDialect::GoogleSql(d) => d.quote_ident(name),
            SqlDialect::Postgres(d) => d.quote_ident(name),
        }
    }

    fn string_literal(&self, value: &str) -> String {
        match self {
            SqlDialect::GoogleSql(d) => d.string_literal(value),
            SqlDialect::Postgres(d) => d.string_literal(value),
        }
    }

    fn column_expression(&self, column: &str, ty: &UnifiedType) -> Result<String> {
        match self {
            SqlDialect::GoogleSql(d) => d.column_expression(column, ty),
            SqlDialect::Postgres(d) => d.column_expression(column, ty),
        }
    }
}

impl SqlDialect {
    /// Create a dialect from its configured name.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::UnsupportedDialect` if the name is not recognized.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "googlesql" | "google_standard_sql" | "spanner" => {
                Ok(SqlDialect::GoogleSql(GoogleSqlDialect::new()))
            }
            "postgres" | "postgresql" | "pg" => Ok(SqlDialect::Postgres(PostgresDialect::new())),
            other => Err(BridgeError::unsupported_dialect(format!(
                "'{}'. Supported dialects: googlesql, postgres",
                other
            ))),
        }
    }

    /// Dialect that reads a source of the given kind.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::UnsupportedDialect` for kinds without an SQL
    /// read dialect (Cassandra and the CDC-only kinds).
    pub fn for_source_kind(kind: SourceKind) -> Result<Self> {
        match kind {
            SourceKind::GoogleSql => Ok(SqlDialect::GoogleSql(GoogleSqlDialect::new())),
            SourceKind::PostgreSql => Ok(SqlDialect::Postgres(PostgresDialect::new())),
            SourceKind::Cassandra | SourceKind::MySql | SourceKind::Oracle => Err(
                BridgeError::unsupported_dialect(format!("no SQL read dialect for source kind '{}'", kind)),
            ),
        }
    }
}

impl FromStr for SqlDialect {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        SqlDialect::from_name(s)
    }
}

/// Projection expression for a column, typed through the unified mapper.
pub fn column_expression<D: Dialect + ?Sized>(
    column: &ColumnType,
    dialect: &D,
    mapper: &UnifiedTypeMapper,
) -> Result<String> {
    let ty = mapper.map_column(column);
    dialect.column_expression(&column.name, &ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(SqlDialect::from_name("googlesql").unwrap().name(), "googlesql");
        assert_eq!(SqlDialect::from_name("PostgreSQL").unwrap().name(), "postgres");
        assert!(SqlDialect::from_name("pg").is_ok());
        assert!("spanner".parse::<SqlDialect>().is_ok());

        let err = SqlDialect::from_name("cql").unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedDialect(_)));
    }

    #[test]
    fn test_for_source_kind() {
        assert_eq!(
            SqlDialect::for_source_kind(SourceKind::GoogleSql).unwrap().name(),
            "googlesql"
        );
        assert_eq!(
            SqlDialect::for_source_kind(SourceKind::PostgreSql).unwrap().name(),
            "postgres"
        );
        for kind in [SourceKind::Cassandra, SourceKind::MySql, SourceKind::Oracle] {
            assert!(matches!(
                SqlDialect::for_source_kind(kind),
                Err(BridgeError::UnsupportedDialect(_))
            ));
        }
    }

    #[test]
    fn test_enum_dispatch() {
        let dialect = SqlDialect::Postgres(PostgresDialect::new());
        assert_eq!(dialect.quote_ident("table").unwrap(), "\"table\"");
        assert_eq!(dialect.string_literal("t"), "'t'");
    }

    #[test]
    fn test_column_expression_maps_raw_type() {
        let mapper = UnifiedTypeMapper::with_builtins();
        let dialect = SqlDialect::from_name("googlesql").unwrap();

        let col = ColumnType::new("payload", "JSON", SourceKind::GoogleSql);
        assert_eq!(
            column_expression(&col, &dialect, &mapper).unwrap(),
            "CASE WHEN t.`payload` IS NULL THEN NULL ELSE TO_JSON_STRING(t.`payload`) END AS `payload`"
        );

        let col = ColumnType::new("blob", "PROTO<x.Y>", SourceKind::GoogleSql);
        assert_eq!(column_expression(&col, &dialect, &mapper).unwrap(), "t.`blob`");
    }
}
