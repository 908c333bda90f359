//! Configuration type definitions.

use serde::{Deserialize, Serialize};

use crate::core::schema::SourceKind;
use crate::pipeline::{dead_letter_table_or_default, DEFAULT_DEAD_LETTER_SUFFIX};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Source the schema and rows come from.
    pub source: SourceConfig,

    /// Read planning. Only valid for sources with an SQL dialect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportConfig>,

    /// Failed-record output.
    #[serde(default)]
    pub dead_letter: DeadLetterConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Source identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source kind: googlesql, postgres, cassandra, mysql or oracle.
    pub kind: SourceKind,

    /// Database, keyspace or instance name.
    pub name: String,
}

/// Read planning configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// SQL dialect of the generated queries (default: the source kind's dialect).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,

    /// Comma-separated table allow-list. Empty selects every table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables: Option<String>,
}

/// Dead-letter output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetterConfig {
    /// Include the error chain in dead-letter records (default: true).
    #[serde(default = "default_true")]
    pub include_trace: bool,

    /// Dead-letter table. Defaults to the output table plus `table_suffix`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    /// Suffix for the default dead-letter table (default: `_error_records`).
    #[serde(default = "default_table_suffix")]
    pub table_suffix: String,
}

impl DeadLetterConfig {
    /// Dead-letter table for rows written to `output_table_spec`.
    pub fn table_for(&self, output_table_spec: &str) -> String {
        dead_letter_table_or_default(self.table.as_deref(), output_table_spec, &self.table_suffix)
    }
}

impl Default for DeadLetterConfig {
    fn default() -> Self {
        Self {
            include_trace: true,
            table: None,
            table_suffix: default_table_suffix(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level: error, warn, info, debug or trace (default: info).
    #[serde(default = "default_verbosity")]
    pub verbosity: String,

    /// Output format: text or json (default: text).
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            verbosity: default_verbosity(),
            format: default_format(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_table_suffix() -> String {
    DEFAULT_DEAD_LETTER_SUFFIX.to_string()
}

fn default_verbosity() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}
