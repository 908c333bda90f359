//! Error types for the bridge library.
//!
//! Two classes of failure are kept apart:
//!
//! - [`BridgeError`]: configuration and build-time errors. These abort job
//!   construction before any record is processed.
//! - [`RowError`]: per-record conversion errors. These never cross a
//!   [`FailsafeStage`](crate::pipeline::FailsafeStage) boundary; they are captured
//!   next to the original payload and routed to the failure channel.

use thiserror::Error;

/// Main error type for configuration and planning operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dialect name or source kind that cannot render SQL projections.
    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    /// Identifier rejected before quoting.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Schema is inconsistent (duplicate columns, unknown tables, etc.)
    #[error("Schema error: {0}")]
    Schema(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BridgeError {
    /// Create an UnsupportedDialect error.
    pub fn unsupported_dialect(name: impl Into<String>) -> Self {
        BridgeError::UnsupportedDialect(name.into())
    }

    /// Create a Schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        BridgeError::Schema(message.into())
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        format_error_chain(self)
    }
}

/// Per-record conversion error.
#[derive(Error, Debug)]
pub enum RowError {
    /// Payload could not be parsed into a row.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// A field holds a value that cannot be coerced to its column type.
    #[error("Field '{field}' cannot be converted to {expected}: {message}")]
    FieldConversion {
        field: String,
        expected: String,
        message: String,
    },

    /// A metadata field has a shape the row model does not understand.
    #[error("Metadata field '{field}' has unsupported shape: {message}")]
    Metadata { field: String, message: String },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A conversion stage panicked.
    #[error("Stage '{stage}' panicked: {message}")]
    Panicked { stage: String, message: String },
}

impl RowError {
    /// Create a FieldConversion error.
    pub fn field(
        field: impl Into<String>,
        expected: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RowError::FieldConversion {
            field: field.into(),
            expected: expected.into(),
            message: message.into(),
        }
    }

    /// Create a Metadata error.
    pub fn metadata(field: impl Into<String>, message: impl Into<String>) -> Self {
        RowError::Metadata {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Render an error and every `source()` below it.
///
/// Used as the diagnostic trace of failed records.
pub fn format_error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut output = format!("Error: {}\n", err);

    let mut source = err.source();
    let mut depth = 1;
    while let Some(inner) = source {
        output.push_str(&format!("\nCaused by:\n  {}: {}", depth, inner));
        source = inner.source();
        depth += 1;
    }

    output
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
