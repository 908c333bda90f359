//! Logging setup and counter snapshots.
//!
//! Counters live next to the code that updates them (stage counters, row
//! mapper counters). [`Telemetry`] only collects handles and reads them; it
//! never affects conversion.

use std::sync::Arc;

use serde::Serialize;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{BridgeError, Result};
use crate::pipeline::{ConversionStage, FailsafeStage, StageCounters, StageCounts};
use crate::source::SourceRowMapper;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG`, when set, takes precedence. Otherwise `verbosity` is one of
/// error, warn, info, debug, trace (unknown values fall back to info).
/// `format` is `text` or `json`.
///
/// # Errors
///
/// Returns `BridgeError::Config` if a global subscriber is already installed.
pub fn init_logging(verbosity: &str, format: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(verbosity)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false);

    let installed = if format.eq_ignore_ascii_case("json") {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };

    installed.map_err(|e| BridgeError::Config(format!("failed to install logger: {}", e)))
}

fn level_directive(verbosity: &str) -> &'static str {
    match verbosity.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    }
}

/// [`init_logging`] from the `logging` config section.
pub fn init_from_config(config: &LoggingConfig) -> Result<()> {
    init_logging(&config.verbosity, &config.format)
}

/// Counts of one named stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSnapshot {
    pub stage: String,
    pub success: u64,
    pub failed: u64,
}

/// Point-in-time view of all tracked counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TelemetrySnapshot {
    pub stages: Vec<StageSnapshot>,
    pub rows_mapped: u64,
    pub degraded_fields: u64,
}

impl TelemetrySnapshot {
    /// Total records routed to failure outputs.
    pub fn total_failed(&self) -> u64 {
        self.stages.iter().map(|s| s.failed).sum()
    }

    /// Format a human-readable summary.
    pub fn summary(&self) -> String {
        let stages = self
            .stages
            .iter()
            .map(|s| format!("{}: {} ok, {} failed", s.stage, s.success, s.failed))
            .collect::<Vec<_>>()
            .join("; ");
        format!(
            "Mapped {} rows ({} fields degraded). Stages: {}",
            self.rows_mapped,
            self.degraded_fields,
            if stages.is_empty() { "none" } else { &stages }
        )
    }
}

/// Collects counter handles of a running job.
#[derive(Debug, Default)]
pub struct Telemetry {
    stages: Vec<(String, Arc<StageCounters>)>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a stage's counters under its name.
    pub fn track<S: ConversionStage>(&mut self, stage: &FailsafeStage<S>) {
        self.stages.push((stage.name().to_string(), stage.counters()));
    }

    /// Read every tracked stage plus the given row mappers.
    pub fn snapshot(&self, mappers: &[&SourceRowMapper]) -> TelemetrySnapshot {
        let stages = self
            .stages
            .iter()
            .map(|(name, counters)| {
                let StageCounts { success, failed } = counters.snapshot();
                StageSnapshot {
                    stage: name.clone(),
                    success,
                    failed,
                }
            })
            .collect();

        TelemetrySnapshot {
            stages,
            rows_mapped: mappers.iter().map(|m| m.rows_mapped()).sum(),
            degraded_fields: mappers.iter().map(|m| m.degraded_fields()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{SchemaReference, SourceKind};
    use crate::pipeline::{FailsafeRecord, JsonToRow};

    #[test]
    fn test_snapshot_reads_stage_counters() {
        let schema = SchemaReference::new("shop", SourceKind::GoogleSql).unwrap();
        let stage = FailsafeStage::new(JsonToRow::new(schema, "orders"));
        let mut telemetry = Telemetry::new();
        telemetry.track(&stage);

        let inputs = vec![
            FailsafeRecord::of(r#"{"id":1}"#.to_string()),
            FailsafeRecord::of("not json".to_string()),
        ];
        let _ = stage.process_all(inputs);

        let snapshot = telemetry.snapshot(&[]);
        assert_eq!(
            snapshot.stages,
            vec![StageSnapshot {
                stage: "json_to_row".to_string(),
                success: 1,
                failed: 1
            }]
        );
        assert_eq!(snapshot.total_failed(), 1);
        assert_eq!(
            snapshot.summary(),
            "Mapped 0 rows (0 fields degraded). Stages: json_to_row: 1 ok, 1 failed"
        );
    }

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive("DEBUG"), "debug");
        assert_eq!(level_directive("trace"), "trace");
        assert_eq!(level_directive("loud"), "info");
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(
            TelemetrySnapshot::default().summary(),
            "Mapped 0 rows (0 fields degraded). Stages: none"
        );
    }
}
