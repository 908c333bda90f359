//! Identifier validation, identifier quoting and string literal quoting.
//!
//! Table and column names are spliced into generated read queries; they cannot
//! be bound as parameters. Every name is validated and then quoted with the
//! rules of the dialect the query is rendered for.

use crate::error::{BridgeError, Result};

/// Maximum identifier length accepted before quoting.
/// - Spanner: 128 characters
/// - PostgreSQL: 63 bytes (longer names are truncated by the server)
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier.
///
/// Rejects:
/// - Empty identifiers
/// - Identifiers containing null bytes
/// - Identifiers exceeding maximum length
///
/// # Errors
///
/// Returns `BridgeError::InvalidIdentifier` with a descriptive message.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(BridgeError::InvalidIdentifier(
            "identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(BridgeError::InvalidIdentifier(format!(
            "identifier contains null byte: {:?}",
            name
        )));
    }

    if name.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(BridgeError::InvalidIdentifier(format!(
            "identifier exceeds maximum length of {} characters: {:?}",
            MAX_IDENTIFIER_LENGTH, name
        )));
    }

    Ok(())
}

/// Quote a GoogleSQL identifier with backticks.
///
/// Backslashes and backticks inside the name are escaped with a backslash.
///
/// ```ignore
/// assert_eq!(quote_googlesql("Singers")?, "`Singers`");
/// ```
pub fn quote_googlesql(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("`{}`", escape_with_backslash(name, '`')))
}

/// Quote a PostgreSQL identifier.
///
/// Escapes double quotes by doubling them and wraps in double quotes.
///
/// ```ignore
/// assert_eq!(quote_pg("table\"name")?, "\"table\"\"name\"");
/// ```
pub fn quote_pg(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// GoogleSQL string literal (double-quoted, backslash escapes).
pub fn googlesql_string_literal(value: &str) -> String {
    format!("\"{}\"", escape_with_backslash(value, '"'))
}

/// PostgreSQL string literal (single-quoted, quotes doubled).
pub fn pg_string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn escape_with_backslash(value: &str, quote: char) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || c == quote {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("orders").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("bad\0name").is_err());
        assert!(validate_identifier(&"x".repeat(129)).is_err());
        assert!(validate_identifier(&"x".repeat(128)).is_ok());
    }

    #[test]
    fn test_quote_googlesql() {
        assert_eq!(quote_googlesql("Singers").unwrap(), "`Singers`");
        assert_eq!(quote_googlesql("odd`name").unwrap(), "`odd\\`name`");
        assert!(quote_googlesql("").is_err());
    }

    #[test]
    fn test_quote_pg() {
        assert_eq!(quote_pg("users").unwrap(), "\"users\"");
        assert_eq!(quote_pg("table\"name").unwrap(), "\"table\"\"name\"");
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(googlesql_string_literal("orders"), "\"orders\"");
        assert_eq!(googlesql_string_literal("a\"b"), "\"a\\\"b\"");
        assert_eq!(pg_string_literal("orders"), "'orders'");
        assert_eq!(pg_string_literal("O'Brien"), "'O''Brien'");
    }
}
