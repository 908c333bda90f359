//! Schema and metadata types for sources, tables and columns.
//!
//! These types are produced once per job by schema discovery (an external
//! collaborator) and are read-only inputs to the rest of the library.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{BridgeError, Result};

/// Kind of database a schema or a change event originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Spanner GoogleSQL (backtick identifiers, double-quoted literals).
    GoogleSql,
    /// PostgreSQL, including the Spanner PostgreSQL interface.
    #[serde(alias = "postgres")]
    PostgreSql,
    /// Apache Cassandra and CQL-compatible stores.
    Cassandra,
    /// MySQL / MariaDB CDC source.
    MySql,
    /// Oracle CDC source.
    Oracle,
}

impl SourceKind {
    /// All known source kinds.
    pub const ALL: [SourceKind; 5] = [
        SourceKind::GoogleSql,
        SourceKind::PostgreSql,
        SourceKind::Cassandra,
        SourceKind::MySql,
        SourceKind::Oracle,
    ];

    /// Canonical lowercase name, as written by CDC producers.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::GoogleSql => "googlesql",
            SourceKind::PostgreSql => "postgresql",
            SourceKind::Cassandra => "cassandra",
            SourceKind::MySql => "mysql",
            SourceKind::Oracle => "oracle",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "googlesql" | "google_standard_sql" | "spanner" => Ok(SourceKind::GoogleSql),
            "postgresql" | "postgres" | "pg" => Ok(SourceKind::PostgreSql),
            "cassandra" | "astra" => Ok(SourceKind::Cassandra),
            "mysql" | "mariadb" => Ok(SourceKind::MySql),
            "oracle" => Ok(SourceKind::Oracle),
            other => Err(BridgeError::Config(format!(
                "Unknown source kind: '{}'. Supported kinds: googlesql, postgres, cassandra, mysql, oracle",
                other
            ))),
        }
    }
}

/// Identifies a logical source: a database, keyspace or instance plus its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaReference {
    name: String,
    kind: SourceKind,
}

impl SchemaReference {
    /// Create a schema reference. The name must not be blank.
    pub fn new(name: impl Into<String>, kind: SourceKind) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BridgeError::schema(format!(
                "{} schema reference requires a non-empty name",
                kind
            )));
        }
        Ok(Self { name, kind })
    }

    /// Database, keyspace or instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source kind.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }
}

impl fmt::Display for SchemaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// A column as reported by schema discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnType {
    /// Column name.
    pub name: String,

    /// Raw source type string (e.g. "ARRAY<JSON>", "uuid[]", "list<int>").
    pub raw_type: String,

    /// Source kind the raw type belongs to.
    pub source_kind: SourceKind,

    /// Numeric precision, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,

    /// Numeric scale, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,

    /// Generated (computed) column. Never part of a projection.
    #[serde(default)]
    pub is_generated: bool,
}

impl ColumnType {
    /// Create a plain column with no precision or scale.
    pub fn new(
        name: impl Into<String>,
        raw_type: impl Into<String>,
        source_kind: SourceKind,
    ) -> Self {
        Self {
            name: name.into(),
            raw_type: raw_type.into(),
            source_kind,
            precision: None,
            scale: None,
            is_generated: false,
        }
    }

    /// Set numeric precision and scale.
    pub fn with_precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Mark the column as generated.
    pub fn generated(mut self) -> Self {
        self.is_generated = true;
        self
    }
}

/// Table metadata: name plus columns in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTableSchema", into = "RawTableSchema")]
pub struct TableSchema {
    name: String,
    columns: Vec<ColumnType>,
    parent_table: Option<String>,
    foreign_keys: Vec<String>,
}

impl TableSchema {
    /// Create a table schema.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::Schema` for a blank table name or duplicate column names.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnType>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BridgeError::schema("table name cannot be empty"));
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(BridgeError::schema(format!(
                    "table {} declares column '{}' more than once",
                    name, col.name
                )));
            }
        }

        Ok(Self {
            name,
            columns,
            parent_table: None,
            foreign_keys: Vec::new(),
        })
    }

    /// Set the interleaving parent of this table.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_table = Some(parent.into());
        self
    }

    /// Add a table referenced by one of this table's foreign keys.
    pub fn with_foreign_key(mut self, referenced: impl Into<String>) -> Self {
        let referenced = referenced.into();
        if !self.foreign_keys.contains(&referenced) {
            self.foreign_keys.push(referenced);
        }
        self
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All columns in declaration order.
    pub fn columns(&self) -> &[ColumnType] {
        &self.columns
    }

    /// Columns that are read from the source (generated columns excluded).
    pub fn sourced_columns(&self) -> impl Iterator<Item = &ColumnType> {
        self.columns.iter().filter(|c| !c.is_generated)
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnType> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Interleaving parent, if any.
    pub fn parent_table(&self) -> Option<&str> {
        self.parent_table.as_deref()
    }

    /// Tables referenced by foreign keys.
    pub fn foreign_key_tables(&self) -> &[String] {
        &self.foreign_keys
    }
}

#[derive(Serialize, Deserialize)]
struct RawTableSchema {
    name: String,
    columns: Vec<ColumnType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_table: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    foreign_keys: Vec<String>,
}

impl TryFrom<RawTableSchema> for TableSchema {
    type Error = BridgeError;

    fn try_from(raw: RawTableSchema) -> Result<Self> {
        let mut table = TableSchema::new(raw.name, raw.columns)?;
        table.parent_table = raw.parent_table;
        Ok(raw
            .foreign_keys
            .into_iter()
            .fold(table, TableSchema::with_foreign_key))
    }
}

impl From<TableSchema> for RawTableSchema {
    fn from(table: TableSchema) -> Self {
        Self {
            name: table.name,
            columns: table.columns,
            parent_table: table.parent_table,
            foreign_keys: table.foreign_keys,
        }
    }
}

/// A discovered database: source identity plus its tables in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDatabaseSchema", into = "RawDatabaseSchema")]
pub struct DatabaseSchema {
    reference: SchemaReference,
    tables: Vec<TableSchema>,
}

impl DatabaseSchema {
    /// Create a database schema.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::Schema` when two tables share a name.
    pub fn new(reference: SchemaReference, tables: Vec<TableSchema>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(tables.len());
        for table in &tables {
            if !seen.insert(table.name()) {
                return Err(BridgeError::schema(format!(
                    "schema {} declares table '{}' more than once",
                    reference,
                    table.name()
                )));
            }
        }
        Ok(Self { reference, tables })
    }

    /// Parse a discovered schema from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Source identity.
    pub fn reference(&self) -> &SchemaReference {
        &self.reference
    }

    /// Tables in discovery order.
    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name() == name)
    }
}

#[derive(Serialize, Deserialize)]
struct RawDatabaseSchema {
    reference: SchemaReference,
    tables: Vec<TableSchema>,
}

impl TryFrom<RawDatabaseSchema> for DatabaseSchema {
    type Error = BridgeError;

    fn try_from(raw: RawDatabaseSchema) -> Result<Self> {
        DatabaseSchema::new(raw.reference, raw.tables)
    }
}

impl From<DatabaseSchema> for RawDatabaseSchema {
    fn from(schema: DatabaseSchema) -> Self {
        Self {
            reference: schema.reference,
            tables: schema.tables,
        }
    }
}
