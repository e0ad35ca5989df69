//! Step reporting sinks.
//!
//! The sequencer reports every named check, pass or fail, to a [`StepSink`].
//! Scoring is the harness's business; the oracle only reports.

use std::sync::Mutex;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum CheckOutcome {
    Passed,
    Failed(String),
    /// The check was in flight when the run was cancelled.
    Incomplete(String),
}

impl CheckOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, CheckOutcome::Passed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRecord {
    /// Run sequence number; distinguishes concurrent runs.
    pub run: u64,
    pub check: String,
    #[serde(flatten)]
    pub outcome: CheckOutcome,
}

pub trait StepSink: Send + Sync {
    fn record(&self, record: CheckRecord);
}

/// Emits each record as a tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl StepSink for TracingSink {
    fn record(&self, record: CheckRecord) {
        match &record.outcome {
            CheckOutcome::Passed => {
                tracing::debug!(run = record.run, check = %record.check, "check passed")
            }
            CheckOutcome::Failed(message) => {
                tracing::warn!(run = record.run, check = %record.check, error = %message, "check failed")
            }
            CheckOutcome::Incomplete(message) => {
                tracing::warn!(run = record.run, check = %record.check, reason = %message, "check incomplete")
            }
        }
    }
}

/// Collects records in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<CheckRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<CheckRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Records belonging to one run.
    pub fn for_run(&self, run: u64) -> Vec<CheckRecord> {
        self.records().into_iter().filter(|r| r.run == run).collect()
    }
}

impl StepSink for MemorySink {
    fn record(&self, record: CheckRecord) {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        records.push(record);
    }
}

/// Fan a record out to several sinks.
pub struct TeeSink(pub Vec<std::sync::Arc<dyn StepSink>>);

impl StepSink for TeeSink {
    fn record(&self, record: CheckRecord) {
        for sink in &self.0 {
            sink.record(record.clone());
        }
    }
}
