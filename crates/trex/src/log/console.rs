//! Console logging backend.

use super::MetricLogger;
use std::collections::HashMap;

/// Emits metrics as tracing events.
#[derive(Default)]
pub struct ConsoleLogger;

impl ConsoleLogger {
    pub fn new() -> Self {
        Self
    }
}

impl MetricLogger for ConsoleLogger {
    fn log_scalar(&self, tag: &str, value: f64, step: u64) {
        tracing::info!(step, tag, value, "metric");
    }

    fn log_metrics(&self, metrics: &HashMap<String, f64>, step: u64) {
        // One line per step
        let mut sorted: Vec<_> = metrics.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let line = sorted
            .iter()
            .map(|(tag, value)| format!("{}={:.4}", tag, value))
            .collect::<Vec<_>>()
            .join(", ");

        tracing::info!(step, "{}", line);
    }
}
