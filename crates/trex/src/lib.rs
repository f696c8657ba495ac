//! # T-REX
//!
//! Preference-based reward learning from ranked demonstrations.
//!
//! ## Overview
//!
//! The crate provides:
//! - `Demonstrations` grouped into bins of increasing quality
//! - `TrainingSet` of trajectory pairs sampled with a progress prior
//! - `TrexNetwork`, a scalar reward network - requires `torch` feature
//! - `TrexRewardModel`, the trainer that learns from pairwise preferences
//!   and relabels transition batches - requires `torch` feature
//!
//! ## Features
//!
//! - `default` - Demonstrations, sampling, configuration and logging
//! - `torch` - Enable the reward network and trainer (requires libtorch)
//! - `tensorboard` - Enable the TensorBoard metric sink
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trex::prelude::*;
//!
//! let config = TrexConfig::default().with_exp_dir("experiments/hopper");
//! let mut model = TrexRewardModel::new(config, Box::new(ConsoleLogger::new()))?;
//! let report = model.train()?;
//! let relabeled = model.estimate(&batch)?;
//! ```

use std::path::PathBuf;

pub mod checkpoint;
pub mod config;
pub mod dataset;
pub mod demo;
pub mod log;
pub mod transition;
pub mod utils;

// Modules that require libtorch
#[cfg(feature = "torch")]
pub mod network;
#[cfg(feature = "torch")]
pub mod reward;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{EncoderConfig, EpochMode, TrexConfig};
    pub use crate::dataset::{PairKind, SamplingParams, SamplingReport, Span, TrainingPair, TrainingSet};
    pub use crate::demo::{DemoStore, Demonstrations, LearningReturn, Trajectory};
    pub use crate::transition::Transition;

    #[cfg(feature = "tensorboard")]
    pub use crate::log::TensorBoardLogger;
    pub use crate::log::{CompositeLogger, ConsoleLogger, MemoryLogger, MetricLogger, NoOpLogger};

    #[cfg(feature = "torch")]
    pub use crate::network::{RewardNetwork, TrexNetwork};
    #[cfg(feature = "torch")]
    pub use crate::reward::{TrainReport, TrexRewardModel};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for the library
#[derive(Debug, thiserror::Error)]
pub enum TrexError {
    #[error("Demonstration file not found: {}", path.display())]
    MissingDemonstrations { path: PathBuf },

    #[error("At least 2 demonstration bins are required, got {0}")]
    TooFewBins(usize),

    #[error("Invalid demonstrations: {0}")]
    InvalidDemonstrations(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Array shape error: {0}")]
    ArrayError(#[from] ndarray::ShapeError),

    #[cfg(feature = "torch")]
    #[error("Tensor error: {0}")]
    TensorError(#[from] tch::TchError),
}

pub type Result<T> = std::result::Result<T, TrexError>;
