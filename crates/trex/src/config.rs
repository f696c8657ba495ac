//! Reward trainer configuration.

use crate::dataset::SamplingParams;
use crate::{Result, TrexError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
#[cfg(feature = "torch")]
use tch::Device;

/// How many pairs a training epoch consumes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpochMode {
    /// Every pair of the shuffled set is used once per epoch.
    #[default]
    FullEpoch,
    /// Only the first pair of the shuffled set is used per epoch.
    FirstSample,
}

/// Layout of the reward network's feature encoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Hidden sizes. For image observations the first `kernel_size.len()`
    /// entries are conv channel counts and the rest are linear layers.
    pub hidden_size_list: Vec<i64>,
    /// Conv kernel sizes (image observations only)
    pub kernel_size: Option<Vec<i64>>,
    /// Conv strides (image observations only)
    pub stride: Option<Vec<i64>>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            hidden_size_list: vec![128, 64],
            kernel_size: None,
            stride: None,
        }
    }
}

/// Configuration for the T-REX reward trainer
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TrexConfig {
    // Experiment
    /// Directory holding `episodes_data.json` and `learning_returns.json`
    pub exp_dir: PathBuf,

    // Optimization
    /// Learning rate
    pub learning_rate: f64,
    /// Number of epochs per call to `train`
    pub update_per_collect: usize,
    /// Weight of the L1 penalty on absolute predicted rewards
    pub l1_reg: f64,
    /// Pairs consumed per epoch
    pub epoch_mode: EpochMode,

    // Dataset
    /// Number of down-sampled full trajectory pairs
    pub num_trajs: usize,
    /// Number of short snippet pairs
    pub num_snippets: usize,
    /// Minimum snippet length (inclusive)
    pub min_snippet_length: usize,
    /// Maximum snippet length (exclusive), clamped to the shortest demonstration
    pub max_snippet_length: usize,
    /// Clear the training set every N iterations (None = never)
    pub clear_buffer_per_iters: Option<u64>,

    // Network
    /// Shape of a single observation frame
    pub obs_shape: Vec<usize>,
    /// Encoder layout
    pub encoder: EncoderConfig,

    // Device
    /// Device to train on ("cpu", "cuda" or "cuda:N")
    pub device: String,

    // Random seed
    pub seed: u64,
}

impl Default for TrexConfig {
    fn default() -> Self {
        Self {
            exp_dir: PathBuf::from("."),

            learning_rate: 1e-5,
            update_per_collect: 100,
            l1_reg: 0.0,
            epoch_mode: EpochMode::FullEpoch,

            num_trajs: 0,
            num_snippets: 6000,
            min_snippet_length: 30,
            max_snippet_length: 100,
            clear_buffer_per_iters: None,

            obs_shape: vec![11],
            encoder: EncoderConfig::default(),

            device: "cpu".to_string(),
            seed: 0,
        }
    }
}

impl TrexConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    /// Set experiment directory
    pub fn with_exp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.exp_dir = dir.into();
        self
    }

    /// Set learning rate
    pub fn with_lr(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set observation shape
    pub fn with_obs_shape(mut self, shape: Vec<usize>) -> Self {
        self.obs_shape = shape;
        self
    }

    /// Set pair counts
    pub fn with_pairs(mut self, num_trajs: usize, num_snippets: usize) -> Self {
        self.num_trajs = num_trajs;
        self.num_snippets = num_snippets;
        self
    }

    /// Set snippet length bounds
    pub fn with_snippet_lengths(mut self, min: usize, max: usize) -> Self {
        self.min_snippet_length = min;
        self.max_snippet_length = max;
        self
    }

    /// Set epochs per `train` call
    pub fn with_updates(mut self, update_per_collect: usize) -> Self {
        self.update_per_collect = update_per_collect;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sampling parameters for dataset construction
    pub fn sampling_params(&self) -> SamplingParams {
        SamplingParams {
            num_trajs: self.num_trajs,
            num_snippets: self.num_snippets,
            min_snippet_length: self.min_snippet_length,
            max_snippet_length: self.max_snippet_length,
        }
    }

    /// Check the options that do not depend on the demonstrations.
    pub fn validate(&self) -> Result<()> {
        if self.update_per_collect == 0 {
            return Err(TrexError::InvalidConfig(
                "update_per_collect must be at least 1".into(),
            ));
        }
        if self.min_snippet_length == 0 {
            return Err(TrexError::InvalidConfig(
                "min_snippet_length must be at least 1".into(),
            ));
        }
        if self.min_snippet_length >= self.max_snippet_length {
            return Err(TrexError::InvalidConfig(format!(
                "min_snippet_length ({}) must be smaller than max_snippet_length ({})",
                self.min_snippet_length, self.max_snippet_length
            )));
        }
        if self.learning_rate.is_nan() || self.learning_rate <= 0.0 {
            return Err(TrexError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.obs_shape.is_empty() || self.obs_shape.contains(&0) {
            return Err(TrexError::InvalidConfig(format!(
                "invalid obs_shape {:?}",
                self.obs_shape
            )));
        }
        if self.encoder.hidden_size_list.is_empty() {
            return Err(TrexError::InvalidConfig(
                "encoder.hidden_size_list must not be empty".into(),
            ));
        }
        if let Some(kernels) = &self.encoder.kernel_size {
            let strides = self.encoder.stride.as_ref().map(Vec::len);
            if strides != Some(kernels.len()) {
                return Err(TrexError::InvalidConfig(
                    "encoder.kernel_size and encoder.stride must have the same length".into(),
                ));
            }
            if kernels.len() >= self.encoder.hidden_size_list.len() {
                return Err(TrexError::InvalidConfig(
                    "encoder.hidden_size_list needs a linear size after the conv channels".into(),
                ));
            }
        }
        parse_device(&self.device)?;
        Ok(())
    }

    /// Resolve the configured device
    #[cfg(feature = "torch")]
    pub fn tch_device(&self) -> Result<Device> {
        Ok(match parse_device(&self.device)? {
            None => Device::Cpu,
            Some(index) => Device::Cuda(index),
        })
    }
}

/// Parse a device string. `None` is the CPU, `Some(i)` the i-th CUDA device.
fn parse_device(device: &str) -> Result<Option<usize>> {
    match device {
        "cpu" => Ok(None),
        "cuda" => Ok(Some(0)),
        other => other
            .strip_prefix("cuda:")
            .and_then(|index| index.parse().ok())
            .map(Some)
            .ok_or_else(|| TrexError::InvalidConfig(format!("unknown device '{}'", other))),
    }
}
