//! PostgreSQL SQL dialect (Strategy pattern).
//!
//! Identifiers are quoted with double quotes and string literals with single
//! quotes. Only `uuid` needs a conversion; `jsonb` and `numeric` are rendered
//! as text by the PostgreSQL interface itself and keep SQL NULL.

use crate::core::identifier::{pg_string_literal, quote_pg};
use crate::core::traits::Dialect;
use crate::dialect::UnifiedType;
use crate::error::Result;

/// PostgreSQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Create a new PostgreSQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &str {
        "postgres"
    }

    fn quote_ident(&self, name: &str) -> Result<String> {
        quote_pg(name)
    }

    fn string_literal(&self, value: &str) -> String {
        pg_string_literal(value)
    }

    fn column_expression(&self, column: &str, ty: &UnifiedType) -> Result<String> {
        let ident = self.quote_ident(column)?;
        let col = format!("t.{}", ident);

        let expr = match ty {
            UnifiedType::Uuid => format!("{col}::text AS {ident}"),
            UnifiedType::Array(inner) if **inner == UnifiedType::Uuid => format!(
                "CASE WHEN {col} IS NULL THEN NULL \
                 ELSE ARRAY(SELECT e::text FROM UNNEST({col}) AS e) END AS {ident}"
            ),
            _ => col,
        };

        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(column: &str, ty: UnifiedType) -> String {
        PostgresDialect::new().column_expression(column, &ty).unwrap()
    }

    #[test]
    fn test_quote_ident() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.quote_ident("name").unwrap(), "\"name\"");
        assert_eq!(dialect.quote_ident("table\"name").unwrap(), "\"table\"\"name\"");
        assert_eq!(dialect.quote_ident("Users").unwrap(), "\"Users\"");
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(PostgresDialect::new().string_literal("it's"), "'it''s'");
    }

    #[test]
    fn test_native_types_pass_through() {
        assert_eq!(expr("doc", UnifiedType::Json), "t.\"doc\"");
        assert_eq!(expr("amount", UnifiedType::NumericString), "t.\"amount\"");
        assert_eq!(
            expr("scores", UnifiedType::array_of(UnifiedType::Int)),
            "t.\"scores\""
        );
    }

    #[test]
    fn test_uuid_casts() {
        assert_eq!(expr("id", UnifiedType::Uuid), "t.\"id\"::text AS \"id\"");
        assert_eq!(
            expr("refs", UnifiedType::array_of(UnifiedType::Uuid)),
            "CASE WHEN t.\"refs\" IS NULL THEN NULL ELSE ARRAY(SELECT e::text \
             FROM UNNEST(t.\"refs\") AS e) END AS \"refs\""
        );
    }
}
