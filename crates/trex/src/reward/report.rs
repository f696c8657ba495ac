//! Training diagnostics.

use serde::Serialize;
use std::fmt;

/// Predicted and ground-truth return of one bin.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReturnComparison {
    pub bin: usize,
    pub predicted: f64,
    pub actual: f64,
}

/// Result of a call to `train`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrainReport {
    /// Cumulative loss of each epoch
    pub losses: Vec<f64>,
    /// Bins ordered by increasing true return
    pub returns: Vec<ReturnComparison>,
    /// Length of the first trajectory of each bin
    pub demo_lengths: Vec<usize>,
    pub min_snippet_length: usize,
    /// Maximum snippet length after clamping
    pub max_snippet_length: usize,
    pub num_pairs: usize,
    /// Pairwise ranking accuracy over the whole training set
    pub accuracy: f64,
}

impl TrainReport {
    pub fn final_loss(&self) -> Option<f64> {
        self.losses.last().copied()
    }
}

impl fmt::Display for TrainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "demo_length: {:?}", self.demo_lengths)?;
        writeln!(f, "min_snippet_length: {}", self.min_snippet_length)?;
        writeln!(f, "max_snippet_length: {}", self.max_snippet_length)?;
        writeln!(f, "num_training_pairs: {}", self.num_pairs)?;
        writeln!(f, "accuracy: {:.4}", self.accuracy)?;
        for (rank, r) in self.returns.iter().enumerate() {
            writeln!(
                f,
                "{} bin={} predicted={:.4} actual={:.4}",
                rank, r.bin, r.predicted, r.actual
            )?;
        }
        Ok(())
    }
}

/// Real and predicted returns of evaluation episodes.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PredictionComparison {
    pub real: Vec<f64>,
    pub pred: Vec<f64>,
}

/// Summary of a batch of estimated rewards.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RewardStats {
    pub mean: f64,
    /// Sample standard deviation, 0 for fewer than two rewards
    pub std: f64,
    pub max: f64,
    pub min: f64,
}

impl RewardStats {
    /// `None` for an empty batch.
    pub fn from_rewards(rewards: &[f32]) -> Option<Self> {
        if rewards.is_empty() {
            return None;
        }
        let n = rewards.len() as f64;
        let mean = rewards.iter().map(|&r| f64::from(r)).sum::<f64>() / n;
        let std = if rewards.len() < 2 {
            0.0
        } else {
            let var = rewards
                .iter()
                .map(|&r| (f64::from(r) - mean).powi(2))
                .sum::<f64>()
                / (n - 1.0);
            var.sqrt()
        };
        let max = rewards.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let min = rewards.iter().copied().fold(f32::INFINITY, f32::min);

        Some(Self {
            mean,
            std,
            max: f64::from(max),
            min: f64::from(min),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_stats() {
        let stats = RewardStats::from_rewards(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(stats.mean, 2.5);
        assert!((stats.std - 1.2909944).abs() < 1e-6);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.min, 1.0);
    }

    #[test]
    fn test_reward_stats_single_and_empty() {
        let stats = RewardStats::from_rewards(&[-0.5]).unwrap();
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.max, -0.5);
        assert!(RewardStats::from_rewards(&[]).is_none());
    }

    #[test]
    fn test_report_display() {
        let report = TrainReport {
            losses: vec![0.9, 0.7],
            returns: vec![ReturnComparison {
                bin: 1,
                predicted: 2.0,
                actual: 10.0,
            }],
            demo_lengths: vec![50, 60],
            min_snippet_length: 5,
            max_snippet_length: 20,
            num_pairs: 10,
            accuracy: 0.5,
        };
        let text = report.to_string();
        assert!(text.contains("accuracy: 0.5000"));
        assert!(text.contains("demo_length: [50, 60]"));
        assert_eq!(report.final_loss(), Some(0.7));
    }
}
