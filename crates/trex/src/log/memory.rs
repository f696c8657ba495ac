//! In-memory logging backend.

use super::MetricLogger;
use std::sync::Mutex;

/// One recorded scalar.
#[derive(Clone, Debug, PartialEq)]
pub struct Scalar {
    pub tag: String,
    pub value: f64,
    pub step: u64,
}

/// Keeps every scalar it receives.
#[derive(Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<Scalar>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in arrival order.
    pub fn records(&self) -> Vec<Scalar> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// `(step, value)` pairs recorded under `tag`.
    pub fn values(&self, tag: &str) -> Vec<(u64, f64)> {
        self.records()
            .into_iter()
            .filter(|r| r.tag == tag)
            .map(|r| (r.step, r.value))
            .collect()
    }

    /// Latest value recorded under `tag`.
    pub fn last(&self, tag: &str) -> Option<f64> {
        self.values(tag).last().map(|&(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetricLogger for MemoryLogger {
    fn log_scalar(&self, tag: &str, value: f64, step: u64) {
        if let Ok(mut records) = self.records.lock() {
            records.push(Scalar {
                tag: tag.to_string(),
                value,
                step,
            });
        }
    }
}
