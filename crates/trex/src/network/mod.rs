//! Reward networks.
//!
//! Provides:
//! - `RewardNetwork` - Scalar reward with the pairwise comparison heads
//! - `TrexNetwork` - Encoder + linear head, MLP or CNN depending on the observation shape

mod encoder;
mod model;

pub use encoder::{build_encoder, EncoderKind};
pub use model::TrexNetwork;

use crate::Result;
use ndarray::ArrayD;
use tch::{nn, Device, Kind, Tensor};

/// Trait for networks that own a VarStore for optimization
pub trait HasVarStore {
    /// Get mutable reference to the VarStore
    fn var_store_mut(&mut self) -> &mut nn::VarStore;

    /// Get reference to the VarStore
    fn var_store(&self) -> &nn::VarStore;
}

/// A network mapping observation frames to scalar rewards.
pub trait RewardNetwork: HasVarStore {
    /// Per-frame rewards `[T, 1]` for a batch of frames `[T, ...obs]`.
    fn forward(&self, observations: &Tensor) -> Tensor;

    /// Weight of the L1 penalty on absolute rewards in `learn`.
    fn l1_reg(&self) -> f64 {
        0.0
    }

    /// Predicted return of a trajectory and the sum of absolute rewards.
    fn cum_return(&self, traj: &Tensor) -> (Tensor, Tensor) {
        let rewards = self.forward(traj);
        (rewards.sum(Kind::Float), rewards.abs().sum(Kind::Float))
    }

    /// Two-way logits `[return_i, return_j]` and the combined reward magnitude.
    fn outputs_abs_reward(&self, traj_i: &Tensor, traj_j: &Tensor) -> (Tensor, Tensor) {
        let (return_i, abs_i) = self.cum_return(traj_i);
        let (return_j, abs_j) = self.cum_return(traj_j);
        (Tensor::stack(&[return_i, return_j], 0), abs_i + abs_j)
    }

    /// Pairwise ranking loss: cross entropy of the logits against the label
    /// (index of the preferred trajectory), plus the L1 penalty.
    fn learn(&self, traj_i: &Tensor, traj_j: &Tensor, labels: &Tensor) -> Tensor {
        let (outputs, abs_rewards) = self.outputs_abs_reward(traj_i, traj_j);
        let loss = outputs.unsqueeze(0).cross_entropy_for_logits(labels);
        loss + abs_rewards * self.l1_reg()
    }
}

/// Copy an array into a float tensor of the same shape on `device`.
pub fn to_tensor(array: &ArrayD<f32>, device: Device) -> Result<Tensor> {
    let shape: Vec<i64> = array.shape().iter().map(|&d| d as i64).collect();
    let data: Vec<f32> = array.iter().copied().collect();
    Ok(Tensor::from_slice(&data)
        .f_reshape(shape.as_slice())?
        .to_device(device))
}
