//! Preference reward trainer.
//!
//! Provides:
//! - `TrexRewardModel` - Learns a reward from ranked demonstrations and relabels transitions
//! - `TrainReport` - Diagnostics returned by `TrexRewardModel::train`

mod report;
mod trainer;

pub use report::{PredictionComparison, ReturnComparison, RewardStats, TrainReport};
pub use trainer::TrexRewardModel;

/// Cumulative loss of one training epoch
pub const TRAIN_LOSS_TAG: &str = "trex_reward/train_loss_iteration";
/// Statistics of estimated rewards
pub const ESTIMATE_MEAN_TAG: &str = "trex_reward/estimate_reward_mean";
pub const ESTIMATE_STD_TAG: &str = "trex_reward/estimate_reward_std";
pub const ESTIMATE_MAX_TAG: &str = "trex_reward/estimate_reward_max";
pub const ESTIMATE_MIN_TAG: &str = "trex_reward/estimate_reward_min";
