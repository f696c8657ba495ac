//! TensorBoard logging backend.

use super::MetricLogger;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tensorboard_rs::summary_writer::SummaryWriter;

/// Writes scalars to TensorBoard event files under one run directory.
///
/// Single scalars are buffered; `log_metrics`, `flush` and `close` push them
/// to disk.
pub struct TensorBoardLogger {
    log_dir: PathBuf,
    writer: Mutex<SummaryWriter>,
}

impl TensorBoardLogger {
    pub fn new(log_dir: impl AsRef<Path>) -> Self {
        let log_dir = log_dir.as_ref().to_path_buf();
        let writer = SummaryWriter::new(log_dir.as_path());
        Self {
            log_dir,
            writer: Mutex::new(writer),
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    fn writer(&self) -> Option<MutexGuard<'_, SummaryWriter>> {
        match self.writer.lock() {
            Ok(writer) => Some(writer),
            Err(_) => {
                tracing::warn!(
                    dir = %self.log_dir.display(),
                    "TensorBoard writer poisoned, dropping metrics"
                );
                None
            }
        }
    }
}

impl MetricLogger for TensorBoardLogger {
    fn log_scalar(&self, tag: &str, value: f64, step: u64) {
        if let Some(mut writer) = self.writer() {
            writer.add_scalar(tag, value as f32, step as usize);
        }
    }

    fn log_metrics(&self, metrics: &HashMap<String, f64>, step: u64) {
        if let Some(mut writer) = self.writer() {
            for (tag, value) in metrics {
                writer.add_scalar(tag, *value as f32, step as usize);
            }
            writer.flush();
        }
    }

    fn flush(&self) {
        if let Some(mut writer) = self.writer() {
            writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_event_file() {
        let dir = tempfile::tempdir().unwrap();
        let logger = TensorBoardLogger::new(dir.path());
        assert_eq!(logger.log_dir(), dir.path());

        logger.log_scalar("trex_reward/train_loss_iteration", 0.7, 1);
        logger.log_metrics(
            &HashMap::from([("trex_reward/estimate_reward_mean".to_string(), 0.1)]),
            1,
        );
        logger.close();

        let files = std::fs::read_dir(dir.path()).unwrap().count();
        assert!(files > 0);
    }
}
