//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::core::schema::SchemaReference;
use crate::drivers::SqlDialect;
use crate::error::{BridgeError, Result};
use crate::orchestrator::parse_table_list;
use std::path::Path;

impl BridgeConfig {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: BridgeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Schema reference of the configured source.
    pub fn schema_reference(&self) -> Result<SchemaReference> {
        SchemaReference::new(&self.source.name, self.source.kind)
    }

    /// Dialect of generated read queries.
    ///
    /// # Errors
    ///
    /// `BridgeError::Config` when no export is configured, otherwise the
    /// dialect resolution error.
    pub fn export_dialect(&self) -> Result<SqlDialect> {
        let export = self
            .export
            .as_ref()
            .ok_or_else(|| BridgeError::Config("export section is not configured".into()))?;
        match &export.dialect {
            Some(name) => SqlDialect::from_name(name),
            None => SqlDialect::for_source_kind(self.source.kind),
        }
    }

    /// Parsed table allow-list. Empty selects every table.
    pub fn table_list(&self) -> Vec<String> {
        self.export
            .as_ref()
            .and_then(|e| e.tables.as_deref())
            .map(parse_table_list)
            .unwrap_or_default()
    }
}
