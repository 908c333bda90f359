//! GoogleSQL dialect (Strategy pattern).
//!
//! Identifiers are quoted with backticks and string literals with double
//! quotes. Types the downstream reader cannot decode natively are converted
//! to text inside the query:
//!
//! - `JSON` is rendered with `TO_JSON_STRING`, keeping SQL NULL as NULL.
//! - `ARRAY<NUMERIC>` and `ARRAY<JSON>` convert each element to text; a NULL
//!   array stays NULL, NULL elements stay NULL and an empty array stays `[]`.
//! - `UUID` and `ARRAY<UUID>` are cast to `STRING`.

use crate::core::identifier::{googlesql_string_literal, quote_googlesql};
use crate::core::traits::Dialect;
use crate::dialect::UnifiedType;
use crate::error::Result;

/// GoogleSQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct GoogleSqlDialect;

impl GoogleSqlDialect {
    /// Create a new GoogleSQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for GoogleSqlDialect {
    fn name(&self) -> &str {
        "googlesql"
    }

    fn quote_ident(&self, name: &str) -> Result<String> {
        quote_googlesql(name)
    }

    fn string_literal(&self, value: &str) -> String {
        googlesql_string_literal(value)
    }

    fn column_expression(&self, column: &str, ty: &UnifiedType) -> Result<String> {
        let ident = self.quote_ident(column)?;
        let col = format!("t.{}", ident);

        let expr = match ty {
            UnifiedType::Json => format!(
                "CASE WHEN {col} IS NULL THEN NULL ELSE TO_JSON_STRING({col}) END AS {ident}"
            ),
            UnifiedType::Uuid => format!("CAST({col} AS STRING) AS {ident}"),
            UnifiedType::Array(inner) => match inner.as_ref() {
                UnifiedType::NumericString => element_to_text(&col, &ident, "CAST(e AS STRING)"),
                UnifiedType::Json => element_to_text(&col, &ident, "TO_JSON_STRING(e)"),
                UnifiedType::Uuid => format!(
                    "CASE WHEN {col} IS NULL THEN NULL \
                     ELSE ARRAY(SELECT CAST(e AS STRING) FROM UNNEST({col}) AS e) END AS {ident}"
                ),
                _ => col,
            },
            _ => col,
        };

        Ok(expr)
    }
}

/// Array projection converting each non-null element with `convert`.
fn element_to_text(col: &str, ident: &str, convert: &str) -> String {
    format!(
        "CASE WHEN {col} IS NULL THEN NULL \
         ELSE IFNULL((SELECT ARRAY_AGG(CASE WHEN e IS NULL THEN NULL ELSE {convert} END) \
         FROM UNNEST({col}) AS e), []) END AS {ident}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(column: &str, ty: UnifiedType) -> String {
        GoogleSqlDialect::new().column_expression(column, &ty).unwrap()
    }

    #[test]
    fn test_quote_ident() {
        let dialect = GoogleSqlDialect::new();
        assert_eq!(dialect.quote_ident("Singers").unwrap(), "`Singers`");
        assert_eq!(dialect.quote_ident("a`b").unwrap(), "`a\\`b`");
        assert!(dialect.quote_ident("").is_err());
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(GoogleSqlDialect::new().string_literal("orders"), "\"orders\"");
    }

    #[test]
    fn test_standard_types_pass_through() {
        assert_eq!(expr("id", UnifiedType::Int), "t.`id`");
        assert_eq!(expr("total", UnifiedType::NumericString), "t.`total`");
        assert_eq!(expr("tags", UnifiedType::array_of(UnifiedType::String)), "t.`tags`");
    }

    #[test]
    fn test_json_preserves_null() {
        assert_eq!(
            expr("meta", UnifiedType::Json),
            "CASE WHEN t.`meta` IS NULL THEN NULL ELSE TO_JSON_STRING(t.`meta`) END AS `meta`"
        );
    }

    #[test]
    fn test_numeric_array() {
        assert_eq!(
            expr("prices", UnifiedType::array_of(UnifiedType::NumericString)),
            "CASE WHEN t.`prices` IS NULL THEN NULL ELSE IFNULL((SELECT ARRAY_AGG(CASE WHEN e IS NULL \
             THEN NULL ELSE CAST(e AS STRING) END) FROM UNNEST(t.`prices`) AS e), []) END AS `prices`"
        );
    }

    #[test]
    fn test_json_array() {
        let out = expr("docs", UnifiedType::array_of(UnifiedType::Json));
        assert!(out.contains("ELSE TO_JSON_STRING(e) END"));
        assert!(out.ends_with("), []) END AS `docs`"));
    }

    #[test]
    fn test_uuid_casts() {
        assert_eq!(expr("id", UnifiedType::Uuid), "CAST(t.`id` AS STRING) AS `id`");
        assert_eq!(
            expr("ids", UnifiedType::array_of(UnifiedType::Uuid)),
            "CASE WHEN t.`ids` IS NULL THEN NULL ELSE ARRAY(SELECT CAST(e AS STRING) \
             FROM UNNEST(t.`ids`) AS e) END AS `ids`"
        );
    }
}
