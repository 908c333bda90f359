//! Conversion stages with separate success and failure outputs.
//!
//! A [`ConversionStage`] is a plain fallible function. [`FailsafeStage`] wraps
//! it so that a failure (returned error or panic) never escapes: the record is
//! routed to the failure output with its original and input payload intact.

use std::any::Any;
use std::error::Error as StdError;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::RowError;

use super::failsafe::{ErrorDetail, FailsafeRecord};

/// One fallible transformation step.
pub trait ConversionStage: Send + Sync {
    type Input;
    type Output;
    type Error: StdError + 'static;

    /// Stage name, used in logs, counters and dead-letter records.
    fn name(&self) -> &str;

    /// Convert one payload.
    fn convert(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// Monotonic per-stage counters.
#[derive(Debug, Default)]
pub struct StageCounters {
    success: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`StageCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub success: u64,
    pub failed: u64,
}

impl StageCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StageCounts {
        StageCounts {
            success: self.success.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Result of applying a stage to one record.
#[derive(Debug)]
pub enum StageResult<O, I, T> {
    /// Converted record, same original.
    Success(FailsafeRecord<O, T>),
    /// Unchanged record with the error attached.
    Failure(FailsafeRecord<O, I>),
}

/// Records split by outcome, in input order within each side.
#[derive(Debug)]
pub struct StageOutputs<O, I, T> {
    pub successes: Vec<FailsafeRecord<O, T>>,
    pub failures: Vec<FailsafeRecord<O, I>>,
}

impl<O, I, T> Default for StageOutputs<O, I, T> {
    fn default() -> Self {
        Self {
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Output type aliases for a wrapped stage.
pub type StageResultOf<O, S> =
    StageResult<O, <S as ConversionStage>::Input, <S as ConversionStage>::Output>;
pub type StageOutputsOf<O, S> =
    StageOutputs<O, <S as ConversionStage>::Input, <S as ConversionStage>::Output>;

/// A stage wrapped with failure capture and counters.
#[derive(Debug)]
pub struct FailsafeStage<S> {
    stage: S,
    counters: Arc<StageCounters>,
}

impl<S: ConversionStage> FailsafeStage<S> {
    pub fn new(stage: S) -> Self {
        Self {
            stage,
            counters: Arc::new(StageCounters::new()),
        }
    }

    pub fn name(&self) -> &str {
        self.stage.name()
    }

    pub fn inner(&self) -> &S {
        &self.stage
    }

    /// Shared handle to this stage's counters.
    pub fn counters(&self) -> Arc<StageCounters> {
        Arc::clone(&self.counters)
    }

    /// Apply the stage to one record.
    ///
    /// Records that already carry an error are passed to the failure side
    /// without being converted again.
    pub fn process<O>(&self, record: FailsafeRecord<O, S::Input>) -> StageResultOf<O, S> {
        if record.is_failed() {
            return StageResult::Failure(record);
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| self.stage.convert(record.payload())));

        let detail = match outcome {
            Ok(Ok(output)) => {
                self.counters.record_success();
                return StageResult::Success(record.with_payload(output));
            }
            Ok(Err(e)) => ErrorDetail::from_error(&e),
            Err(panic) => {
                let err = RowError::Panicked {
                    stage: self.stage.name().to_string(),
                    message: panic_message(panic.as_ref()),
                };
                ErrorDetail::from_error(&err)
            }
        };

        self.counters.record_failure();
        warn!("Stage {} failed: {}", self.stage.name(), detail.message);
        debug!("{}", detail.trace);
        StageResult::Failure(record.with_error(detail))
    }

    /// Apply the stage to every record of a batch.
    pub fn process_all<O, I>(&self, records: I) -> StageOutputsOf<O, S>
    where
        I: IntoIterator<Item = FailsafeRecord<O, S::Input>>,
    {
        let mut out = StageOutputs::default();
        for record in records {
            match self.process(record) {
                StageResult::Success(r) => out.successes.push(r),
                StageResult::Failure(r) => out.failures.push(r),
            }
        }
        out
    }

    /// Drain `input`, sending each record to `success` or `failure`.
    ///
    /// Stops when the input closes, either output closes, or `cancel` fires.
    /// Returns the stage counters at exit.
    pub async fn run<O>(
        &self,
        mut input: mpsc::Receiver<FailsafeRecord<O, S::Input>>,
        success: mpsc::Sender<FailsafeRecord<O, S::Output>>,
        failure: mpsc::Sender<FailsafeRecord<O, S::Input>>,
        cancel: CancellationToken,
    ) -> StageCounts {
        loop {
            let record = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Stage {} cancelled", self.stage.name());
                    break;
                }
                next = input.recv() => match next {
                    Some(record) => record,
                    None => break,
                },
            };

            let (sent, side) = match self.process(record) {
                StageResult::Success(r) => (forward(&success, r, &cancel).await, "success"),
                StageResult::Failure(r) => (forward(&failure, r, &cancel).await, "failure"),
            };
            match sent {
                Forwarded::Sent => {}
                Forwarded::Cancelled => {
                    warn!(
                        "Stage {} cancelled while sending to {} output, record dropped",
                        self.stage.name(),
                        side
                    );
                    break;
                }
                Forwarded::Closed => {
                    warn!(
                        "Stage {}: {} output channel closed, record dropped, stopping",
                        self.stage.name(),
                        side
                    );
                    break;
                }
            }
        }

        self.counters.snapshot()
    }
}

enum Forwarded {
    Sent,
    Closed,
    Cancelled,
}

async fn forward<R>(tx: &mpsc::Sender<R>, record: R, cancel: &CancellationToken) -> Forwarded {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Forwarded::Cancelled,
        sent = tx.send(record) => match sent {
            Ok(()) => Forwarded::Sent,
            Err(_) => Forwarded::Closed,
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
