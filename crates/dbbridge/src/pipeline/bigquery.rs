//! BigQuery destination naming and column types.
//!
//! Rows bound for BigQuery are routed by templates resolved against each row's
//! string fields, and failed rows go to a dead-letter table that defaults to
//! the output table plus [`DEFAULT_DEAD_LETTER_SUFFIX`].

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::core::schema::TableSchema;
use crate::dialect::{UnifiedType, UnifiedTypeMapper};
use crate::error::{BridgeError, Result};
use crate::source::SourceRow;

/// Appended to the output table spec when no dead-letter table is configured.
pub const DEFAULT_DEAD_LETTER_SUFFIX: &str = "_error_records";

/// BigQuery legacy SQL column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BigQueryType {
    Boolean,
    Bytes,
    Date,
    DateTime,
    Float,
    Integer,
    Numeric,
    Record,
    String,
    Time,
    Timestamp,
}

impl BigQueryType {
    pub const ALL: [BigQueryType; 11] = [
        BigQueryType::Boolean,
        BigQueryType::Bytes,
        BigQueryType::Date,
        BigQueryType::DateTime,
        BigQueryType::Float,
        BigQueryType::Integer,
        BigQueryType::Numeric,
        BigQueryType::Record,
        BigQueryType::String,
        BigQueryType::Time,
        BigQueryType::Timestamp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BigQueryType::Boolean => "BOOLEAN",
            BigQueryType::Bytes => "BYTES",
            BigQueryType::Date => "DATE",
            BigQueryType::DateTime => "DATETIME",
            BigQueryType::Float => "FLOAT",
            BigQueryType::Integer => "INTEGER",
            BigQueryType::Numeric => "NUMERIC",
            BigQueryType::Record => "RECORD",
            BigQueryType::String => "STRING",
            BigQueryType::Time => "TIME",
            BigQueryType::Timestamp => "TIMESTAMP",
        }
    }

    /// Look up a type name. Names outside the table are `STRING`.
    pub fn from_type_string(name: &str) -> Self {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == name)
            .unwrap_or(BigQueryType::String)
    }

    /// Column type for a unified type. Arrays take their element's type.
    pub fn for_unified(ty: &UnifiedType) -> Self {
        match ty {
            UnifiedType::Bool => BigQueryType::Boolean,
            UnifiedType::Int => BigQueryType::Integer,
            UnifiedType::Float => BigQueryType::Float,
            UnifiedType::NumericString => BigQueryType::Numeric,
            UnifiedType::Bytes => BigQueryType::Bytes,
            UnifiedType::Date => BigQueryType::Date,
            UnifiedType::DateTime => BigQueryType::DateTime,
            UnifiedType::Timestamp => BigQueryType::Timestamp,
            UnifiedType::Map(_, _) => BigQueryType::Record,
            UnifiedType::Array(inner) => Self::for_unified(inner),
            UnifiedType::String
            | UnifiedType::Json
            | UnifiedType::Uuid
            | UnifiedType::Unsupported => BigQueryType::String,
        }
    }
}

impl fmt::Display for BigQueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BigQueryType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_type_string(&name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldMode {
    #[default]
    Nullable,
    Required,
    Repeated,
}

/// One column of a BigQuery table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BigQueryField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: BigQueryType,
    #[serde(default)]
    pub mode: FieldMode,
}

impl BigQueryField {
    /// Fields for the sourced columns of `table`, in declaration order.
    pub fn for_table(table: &TableSchema, mapper: &UnifiedTypeMapper) -> Vec<Self> {
        table
            .sourced_columns()
            .map(|col| {
                let unified = mapper.map_column(col);
                let mode = match unified {
                    UnifiedType::Array(_) => FieldMode::Repeated,
                    _ => FieldMode::Nullable,
                };
                Self {
                    name: col.name.clone(),
                    ty: BigQueryType::for_unified(&unified),
                    mode,
                }
            })
            .collect()
    }

    /// Parse a JSON schema: `[{"name": "id", "type": "INTEGER", "mode": "REQUIRED"}]`.
    pub fn schema_from_json(json: &str) -> Result<Vec<Self>> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Output table location, given either as templates or as a full table spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigQueryTableConfig {
    project_id: String,
    dataset_template: String,
    table_template: String,
}

impl BigQueryTableConfig {
    /// Use the templates when both are present, otherwise split
    /// `output_table_spec` (`project:dataset.table`).
    ///
    /// A missing project falls back to the spec's project.
    pub fn resolve(
        project_id: Option<&str>,
        dataset_template: Option<&str>,
        table_template: Option<&str>,
        output_table_spec: Option<&str>,
    ) -> Result<Self> {
        let from_spec = output_table_spec.map(Self::from_table_spec).transpose()?;

        match (dataset_template, table_template) {
            (Some(dataset), Some(table)) => {
                let project = project_id
                    .map(str::to_string)
                    .or_else(|| from_spec.map(|c| c.project_id))
                    .ok_or_else(|| {
                        BridgeError::Config(
                            "a project id or an output table spec is required".into(),
                        )
                    })?;
                Ok(Self {
                    project_id: project,
                    dataset_template: dataset.to_string(),
                    table_template: table.to_string(),
                })
            }
            _ => from_spec.ok_or_else(|| {
                BridgeError::Config(
                    "output table spec is required without dataset and table templates".into(),
                )
            }),
        }
    }

    /// Split `project:dataset.table`.
    pub fn from_table_spec(spec: &str) -> Result<Self> {
        let parts: Vec<&str> = spec.split([':', '.']).collect();
        match parts.as_slice() {
            [project, dataset, table]
                if !project.is_empty() && !dataset.is_empty() && !table.is_empty() =>
            {
                Ok(Self {
                    project_id: project.to_string(),
                    dataset_template: dataset.to_string(),
                    table_template: table.to_string(),
                })
            }
            _ => Err(BridgeError::Config(format!(
                "output table spec must be project:dataset.table, got '{}'",
                spec
            ))),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn dataset_template(&self) -> &str {
        &self.dataset_template
    }

    pub fn table_template(&self) -> &str {
        &self.table_template
    }

    /// `project:dataset.table` with the templates unresolved.
    pub fn output_table_spec(&self) -> String {
        format!(
            "{}:{}.{}",
            self.project_id, self.dataset_template, self.table_template
        )
    }

    /// Destination for one row, with dataset and table names sanitized.
    pub fn destination(&self, row: &SourceRow) -> TableDestination {
        TableDestination {
            project_id: self.project_id.clone(),
            dataset: row.format_template_for_bigquery_dataset(&self.dataset_template),
            table: row.format_template_for_bigquery(&self.table_template),
        }
    }
}

/// A resolved BigQuery table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TableDestination {
    pub project_id: String,
    pub dataset: String,
    pub table: String,
}

impl fmt::Display for TableDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}.{}", self.project_id, self.dataset, self.table)
    }
}

/// The configured dead-letter table, or `output_table_spec` + `suffix`.
pub fn dead_letter_table_or_default(
    dead_letter_table: Option<&str>,
    output_table_spec: &str,
    suffix: &str,
) -> String {
    match dead_letter_table {
        Some(table) => table.to_string(),
        None => format!("{}{}", output_table_spec, suffix),
    }
}
