use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber with the configured log level.
///
/// Maps config log levels to tracing levels:
/// - "DISABLED" -> no subscriber installed
/// - "WARNING" -> WARN
/// - "CRITICAL" -> ERROR
/// - Others map directly (DEBUG, INFO, ERROR)
///
/// Logs go to stderr; stdout is reserved for parser output.
pub fn init_tracing(log_level: &str) {
    let level = log_level.to_uppercase();

    if level == "DISABLED" {
        return;
    }

    let tracing_level = match level.as_str() {
        "WARNING" => "WARN",
        "CRITICAL" => "ERROR",
        other => other,
    };

    let filter = EnvFilter::try_new(tracing_level).unwrap_or_else(|_| EnvFilter::new("INFO"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Per-stream counters collected by the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub chunks: u64,
    /// Chunks that carried at least one tool call.
    pub accepted: u64,
    /// Chunks answered from recovery state (repeat-last-good or placeholder).
    pub recovered: u64,
    pub validation_failures: u64,
}

impl StreamStats {
    pub fn record_chunk(&mut self, carried_tool_call: bool) {
        self.chunks += 1;
        if carried_tool_call {
            self.accepted += 1;
        } else {
            self.recovered += 1;
        }
    }

    pub fn record_validation_failure(&mut self) {
        self.validation_failures += 1;
    }
}

/// Log the summary of a finished stream.
pub fn log_stream_complete(stats: &StreamStats, elapsed: Duration) {
    info!(
        chunks = stats.chunks,
        accepted = stats.accepted,
        recovered = stats.recovered,
        validation_failures = stats.validation_failures,
        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        "stream complete"
    );
}
