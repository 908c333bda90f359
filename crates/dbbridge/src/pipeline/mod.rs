//! Fail-safe conversion pipeline.
//!
//! Every record carries its original payload through all stages. Each stage
//! splits its input into a success output and a failure output; a failing
//! record never stops the pipeline and never loses its original.
//!
//! - [`FailsafeRecord`]: original payload, current payload, optional error
//! - [`ConversionStage`]: one fallible transformation
//! - [`FailsafeStage`]: applies a stage with failure capture and counters
//! - [`converters`]: provided stages and dead-letter output
//! - [`bigquery`]: BigQuery column types, table routing and dead-letter table names
//!
//! ```rust,ignore
//! let parse = FailsafeStage::new(JsonToRow::new(schema_ref, "orders"));
//! let out = parse.process_all(lines.into_iter().map(FailsafeRecord::of));
//! for failed in &out.failures {
//!     let dlq = DeadLetterRecord::from_failure(failed, parse.name(), true);
//! }
//! ```

pub mod bigquery;
pub mod converters;
mod failsafe;
mod stage;

pub use bigquery::{
    dead_letter_table_or_default, BigQueryField, BigQueryTableConfig, BigQueryType, FieldMode,
    TableDestination, DEFAULT_DEAD_LETTER_SUFFIX,
};
pub use converters::{wrap_insert_error, DeadLetterRecord, JsonToRow, RowToJson, RowToTargetRow};
pub use failsafe::{ErrorDetail, FailsafeRecord};
pub use stage::{
    ConversionStage, FailsafeStage, StageCounters, StageCounts, StageOutputs, StageOutputsOf,
    StageResult, StageResultOf,
};
