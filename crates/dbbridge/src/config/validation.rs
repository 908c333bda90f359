//! Configuration validation.

use super::BridgeConfig;
use crate::core::schema::SourceKind;
use crate::drivers::SqlDialect;
use crate::error::{BridgeError, Result};

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];
const LOG_FORMATS: &[&str] = &["text", "json"];

/// Validate the configuration.
pub fn validate(config: &BridgeConfig) -> Result<()> {
    if config.source.name.trim().is_empty() {
        return Err(BridgeError::Config("source.name is required".into()));
    }

    if let Some(export) = &config.export {
        if config.source.kind == SourceKind::Cassandra {
            return Err(BridgeError::Config(
                "export is not supported for cassandra sources: no SQL dialect".into(),
            ));
        }

        match &export.dialect {
            Some(name) => {
                SqlDialect::from_name(name)?;
            }
            None => {
                SqlDialect::for_source_kind(config.source.kind)?;
            }
        }
    }

    if config.dead_letter.table.is_none() && config.dead_letter.table_suffix.is_empty() {
        return Err(BridgeError::Config(
            "dead_letter.table_suffix must not be empty without dead_letter.table".into(),
        ));
    }

    let verbosity = config.logging.verbosity.to_lowercase();
    if !LOG_LEVELS.contains(&verbosity.as_str()) {
        return Err(BridgeError::Config(format!(
            "logging.verbosity must be one of {}, got '{}'",
            LOG_LEVELS.join(", "),
            config.logging.verbosity
        )));
    }

    let format = config.logging.format.to_lowercase();
    if !LOG_FORMATS.contains(&format.as_str()) {
        return Err(BridgeError::Config(format!(
            "logging.format must be 'text' or 'json', got '{}'",
            config.logging.format
        )));
    }

    Ok(())
}
