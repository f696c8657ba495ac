//! T-REX reward network.

use super::{build_encoder, EncoderKind, HasVarStore, RewardNetwork};
use crate::config::EncoderConfig;
use crate::Result;
use tch::{nn, nn::Module, Device, Tensor};

/// Encoder followed by a linear head producing one reward per frame.
pub struct TrexNetwork {
    /// Variable store for parameters
    vs: nn::VarStore,
    /// Feature encoder
    encoder: nn::Sequential,
    /// Reward head
    head: nn::Linear,
    /// Encoder layout in use
    kind: EncoderKind,
    /// L1 penalty weight
    l1_reg: f64,
    /// Device
    device: Device,
}

impl TrexNetwork {
    /// Create a network for frames of `obs_shape`.
    pub fn new(
        obs_shape: &[usize],
        config: &EncoderConfig,
        l1_reg: f64,
        device: Device,
    ) -> Result<Self> {
        let vs = nn::VarStore::new(device);
        let root = vs.root();

        let (encoder, features) = build_encoder(&(&root / "encoder"), obs_shape, config)?;
        let head = nn::linear(&root / "head", features, 1, Default::default());

        Ok(Self {
            vs,
            encoder,
            head,
            kind: EncoderKind::for_shape(obs_shape, config),
            l1_reg,
            device,
        })
    }

    pub fn kind(&self) -> EncoderKind {
        self.kind
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Get the number of parameters
    pub fn num_parameters(&self) -> i64 {
        self.vs.variables().values().map(|v| v.numel() as i64).sum()
    }
}

impl HasVarStore for TrexNetwork {
    fn var_store_mut(&mut self) -> &mut nn::VarStore {
        &mut self.vs
    }

    fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }
}

impl RewardNetwork for TrexNetwork {
    fn forward(&self, observations: &Tensor) -> Tensor {
        let obs = observations.to_device(self.device);
        self.head.forward(&self.encoder.forward(&obs))
    }

    fn l1_reg(&self) -> f64 {
        self.l1_reg
    }
}
