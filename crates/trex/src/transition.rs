//! Transition records relabelled by the reward model.

use crate::{Result, TrexError};
use ndarray::{ArrayD, ArrayView, Axis, IxDyn};
use serde::{Deserialize, Serialize};

/// A single environment step as stored by a replay buffer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub obs: ArrayD<f32>,
    pub action: ArrayD<f32>,
    #[serde(default)]
    pub reward: f32,
    #[serde(default)]
    pub done: bool,
}

impl Transition {
    pub fn new(obs: ArrayD<f32>, action: ArrayD<f32>, reward: f32, done: bool) -> Self {
        Self {
            obs,
            action,
            reward,
            done,
        }
    }
}

/// Stack the observations of a batch into a `[N, ...obs]` array.
pub fn collect_states(batch: &[Transition]) -> Result<ArrayD<f32>> {
    let Some(first) = batch.first() else {
        return Ok(ArrayD::zeros(IxDyn(&[0])));
    };
    let expected = first.obs.shape();
    if let Some(bad) = batch.iter().find(|t| t.obs.shape() != expected) {
        return Err(TrexError::ShapeMismatch {
            expected: expected.to_vec(),
            actual: bad.obs.shape().to_vec(),
        });
    }

    let views: Vec<ArrayView<f32, IxDyn>> = batch.iter().map(|t| t.obs.view()).collect();
    Ok(ndarray::stack(Axis(0), &views)?)
}

/// Sum of recorded rewards of an episode.
pub fn episode_return(episode: &[Transition]) -> f64 {
    episode.iter().map(|t| f64::from(t.reward)).sum()
}
