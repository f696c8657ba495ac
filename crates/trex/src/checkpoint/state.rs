//! Checkpoint metadata.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Sub-directory of the experiment directory holding checkpoints.
pub const CHECKPOINT_DIR: &str = "ckpt_reward_model";
/// File stem of the most recent checkpoint.
pub const CHECKPOINT_NAME: &str = "latest";
/// Trainer configuration saved next to the weights.
pub const CONFIG_FILE: &str = "config.json";

/// Trainer state saved alongside the weights.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CheckpointMetadata {
    /// Completed training epochs
    pub train_iter: u64,
    /// Completed estimation calls
    pub estimate_iter: u64,
    /// Pairwise accuracy at the end of the last `train` call
    pub accuracy: Option<f64>,
    /// Size of the training set at save time
    pub num_pairs: usize,
    /// Crate version that wrote the checkpoint
    pub version: String,
    /// Seconds since the Unix epoch
    pub timestamp: String,
}

impl CheckpointMetadata {
    pub fn new(train_iter: u64, estimate_iter: u64, accuracy: Option<f64>, num_pairs: usize) -> Self {
        Self {
            train_iter,
            estimate_iter,
            accuracy,
            num_pairs,
            version: crate::VERSION.to_string(),
            timestamp: unix_timestamp(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

/// Metadata file belonging to a weights file.
pub fn metadata_path(weights: &Path) -> PathBuf {
    weights.with_extension("json")
}

/// Configuration file belonging to a weights file.
pub fn config_path(weights: &Path) -> PathBuf {
    weights.with_file_name(CONFIG_FILE)
}

fn unix_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}", duration.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_path_swaps_extension() {
        let path = Path::new("exp/ckpt_reward_model/latest.pt");
        assert_eq!(metadata_path(path), PathBuf::from("exp/ckpt_reward_model/latest.json"));
        assert_eq!(config_path(path), PathBuf::from("exp/ckpt_reward_model/config.json"));
    }

    #[test]
    fn test_metadata_write_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latest.json");
        let meta = CheckpointMetadata::new(12, 3, Some(0.75), 600);
        meta.write(&path).unwrap();

        let restored = CheckpointMetadata::read(&path).unwrap();
        assert_eq!(restored, meta);
        assert_eq!(restored.version, crate::VERSION);
    }
}
