//! Reward model checkpoints.
//!
//! Weights are written by the tensor backend next to a JSON
//! `CheckpointMetadata` file carrying the trainer counters and the
//! `TrexConfig` the network was built from.

mod state;

pub use state::{
    config_path, metadata_path, CheckpointMetadata, CHECKPOINT_DIR, CHECKPOINT_NAME, CONFIG_FILE,
};
