//! # dbbridge
//!
//! Schema and type bridge for moving rows between heterogeneous databases.
//!
//! This library provides:
//!
//! - **Unified types**: one type system for GoogleSQL, PostgreSQL, Cassandra,
//!   MySQL and Oracle column types
//! - **Read planning**: per-table `SELECT` statements in the source dialect,
//!   with expressions for types drivers cannot read natively
//! - **Row mapping**: driver rows and CDC JSON documents normalized into
//!   [`SourceRow`]s
//! - **Fail-safe conversion**: stages that route failures to a dead-letter
//!   output while keeping the original payload
//!
//! ## Example
//!
//! ```rust,no_run
//! use dbbridge::{BridgeConfig, DatabaseSchema, ReadPlanner};
//!
//! fn main() -> dbbridge::Result<()> {
//!     let config = BridgeConfig::load("bridge.yaml")?;
//!     let schema = DatabaseSchema::from_json(&std::fs::read_to_string("schema.json")?)?;
//!     let planner = ReadPlanner::new(config.export_dialect()?);
//!     let reads = planner.plan(&schema, &config.table_list())?;
//!     for read in &reads {
//!         println!("{}: {}", read.table_name, read.query);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod dialect;
pub mod drivers;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod source;
pub mod telemetry;

// Re-exports for convenient access
pub use config::{BridgeConfig, DeadLetterConfig, ExportConfig, LoggingConfig, SourceConfig};
pub use self::core::{
    ColumnType, DatabaseSchema, Dialect, DriverRow, SchemaReference, SourceConnector, SourceKind,
    SqlValue, TableSchema,
};
pub use dialect::{UnifiedType, UnifiedTypeMapper};
pub use drivers::SqlDialect;
pub use error::{BridgeError, Result, RowError};
pub use orchestrator::{build_reads, ReadPlanner, ReadSpec, MAX_PARTITIONS};
pub use pipeline::{
    BigQueryTableConfig, BigQueryType, ConversionStage, DeadLetterRecord, FailsafeRecord,
    FailsafeStage, JsonToRow, RowToJson, RowToTargetRow,
};
pub use source::{ScopedConnector, SourceRow, SourceRowMapper};
pub use telemetry::{init_logging, Telemetry, TelemetrySnapshot};
