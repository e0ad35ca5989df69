//! Terminal output: one line per check, one line per run.

use colored::Colorize;
use serde_json::json;

use rankcheck_core::{CheckOutcome, CheckRecord, OracleError, RunSummary, StepSink};

/// Prints every check outcome to stdout as it happens.
pub struct ConsoleSink {
    json: bool,
}

impl ConsoleSink {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl StepSink for ConsoleSink {
    fn record(&self, record: CheckRecord) {
        if self.json {
            match serde_json::to_string(&record) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::error!(error = %e, "failed to serialize check record"),
            }
        } else {
            println!("{}", format_record(&record));
        }
    }
}

pub fn format_record(record: &CheckRecord) -> String {
    match &record.outcome {
        CheckOutcome::Passed => format!("[run {}] {} {}", record.run, "  OK".green(), record.check),
        CheckOutcome::Failed(message) => format!(
            "[run {}] {} {}: {}",
            record.run,
            "FAIL".red().bold(),
            record.check,
            message
        ),
        CheckOutcome::Incomplete(message) => format!(
            "[run {}] {} {}: {}",
            record.run,
            "SKIP".yellow(),
            record.check,
            message
        ),
    }
}

pub fn format_run(run: u64, result: &Result<RunSummary, OracleError>, json: bool) -> String {
    match (result, json) {
        (Ok(summary), true) => json!({ "run": run, "passed": true, "summary": summary }).to_string(),
        (Err(e), true) => json!({
            "run": run,
            "passed": false,
            "check": e.check,
            "error": e.kind.to_string(),
        })
        .to_string(),
        (Ok(summary), false) => format!(
            "run {run}: {} tenant={} competition={} checks={}",
            "PASSED".green().bold(),
            summary.tenant_name,
            summary.competition_id,
            summary.checks_passed
        ),
        (Err(e), false) => format!("run {run}: {} {e}", "FAILED".red().bold()),
    }
}
