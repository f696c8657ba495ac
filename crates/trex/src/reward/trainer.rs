//! T-REX reward model trainer.

use super::report::{PredictionComparison, ReturnComparison, RewardStats, TrainReport};
use super::{
    ESTIMATE_MAX_TAG, ESTIMATE_MEAN_TAG, ESTIMATE_MIN_TAG, ESTIMATE_STD_TAG, TRAIN_LOSS_TAG,
};
use crate::checkpoint::{
    config_path, metadata_path, CheckpointMetadata, CHECKPOINT_DIR, CHECKPOINT_NAME,
};
use crate::config::{EpochMode, TrexConfig};
use crate::dataset::{self, SamplingReport, TrainingSet};
use crate::demo::{DemoStore, Demonstrations, Trajectory};
use crate::log::MetricLogger;
use crate::network::{to_tensor, RewardNetwork, TrexNetwork};
use crate::transition::{collect_states, episode_return, Transition};
use crate::{utils, Result, TrexError};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tch::{nn, nn::OptimizerConfig, Device, Kind, Tensor};

/// Learns a reward function from ranked demonstrations.
///
/// The trainer owns the demonstrations, the accumulated training pairs, the
/// network with its optimizer and the random generator used for sampling and
/// shuffling.
pub struct TrexRewardModel<N: RewardNetwork = TrexNetwork> {
    /// Configuration
    config: TrexConfig,
    /// Reward network
    network: N,
    /// Optimizer bound to the network's VarStore
    optimizer: nn::Optimizer,
    /// Ranked demonstrations
    demos: Demonstrations,
    /// Accumulated preference pairs
    training_set: TrainingSet,
    /// Sampling and shuffling randomness
    rng: StdRng,
    /// Scalar metric sink
    logger: Box<dyn MetricLogger>,
    /// Completed training epochs
    train_iter: u64,
    /// Completed estimation calls
    estimate_iter: u64,
    /// Accuracy at the end of the last `train`
    last_accuracy: Option<f64>,
}

impl TrexRewardModel<TrexNetwork> {
    /// Load the demonstrations of `config.exp_dir` and build the training set.
    pub fn new(config: TrexConfig, logger: Box<dyn MetricLogger>) -> Result<Self> {
        config.validate()?;
        let demos = DemoStore::new(&config.exp_dir).load()?;
        let rng = utils::set_seed(config.seed);
        Self::from_demonstrations(config, demos, rng, logger)
    }

    /// Build a trainer over in-memory demonstrations with an explicit generator.
    pub fn from_demonstrations(
        config: TrexConfig,
        demos: Demonstrations,
        rng: StdRng,
        logger: Box<dyn MetricLogger>,
    ) -> Result<Self> {
        let network = Self::build_network(&config)?;
        Self::with_network(config, demos, network, rng, logger)
    }

    /// Build a model for relabelling: the network is created but no training
    /// pairs are sampled, so snippet bounds need not fit the demonstrations.
    /// Load weights with `load_checkpoint` before calling `estimate`.
    pub fn for_inference(
        config: TrexConfig,
        demos: Demonstrations,
        logger: Box<dyn MetricLogger>,
    ) -> Result<Self> {
        let network = Self::build_network(&config)?;
        let rng = utils::set_seed(config.seed);
        Self::assemble(config, demos, network, rng, logger)
    }

    fn build_network(config: &TrexConfig) -> Result<TrexNetwork> {
        config.validate()?;
        let network = TrexNetwork::new(
            &config.obs_shape,
            &config.encoder,
            config.l1_reg,
            config.tch_device()?,
        )?;
        tracing::info!(
            params = network.num_parameters(),
            kind = ?network.kind(),
            "Created reward network"
        );
        Ok(network)
    }
}

impl<N: RewardNetwork> TrexRewardModel<N> {
    /// Build a trainer around an existing network and sample its training set.
    pub fn with_network(
        config: TrexConfig,
        demos: Demonstrations,
        network: N,
        rng: StdRng,
        logger: Box<dyn MetricLogger>,
    ) -> Result<Self> {
        let mut model = Self::assemble(config, demos, network, rng, logger)?;
        model.create_training_data()?;
        tracing::info!(pairs = model.training_set.len(), "Reward model ready");
        Ok(model)
    }

    fn assemble(
        config: TrexConfig,
        demos: Demonstrations,
        network: N,
        rng: StdRng,
        logger: Box<dyn MetricLogger>,
    ) -> Result<Self> {
        config.validate()?;
        if demos.frame_shape() != config.obs_shape.as_slice() {
            return Err(TrexError::ShapeMismatch {
                expected: config.obs_shape.clone(),
                actual: demos.frame_shape().to_vec(),
            });
        }

        let optimizer = nn::Adam::default().build(network.var_store(), config.learning_rate)?;

        Ok(Self {
            config,
            network,
            optimizer,
            demos,
            training_set: TrainingSet::new(),
            rng,
            logger,
            train_iter: 0,
            estimate_iter: 0,
            last_accuracy: None,
        })
    }

    /// Sample `num_trajs` full-trajectory pairs and `num_snippets` snippet
    /// pairs and append them to the training set.
    pub fn create_training_data(&mut self) -> Result<SamplingReport> {
        dataset::create_training_data(
            &self.demos,
            &self.config.sampling_params(),
            &mut self.rng,
            &mut self.training_set,
        )
    }

    /// Number of pairs one epoch trains on.
    pub fn pairs_per_epoch(&self) -> usize {
        match self.config.epoch_mode {
            EpochMode::FullEpoch => self.training_set.len(),
            EpochMode::FirstSample => self.training_set.len().min(1),
        }
    }

    /// Run `update_per_collect` shuffled epochs, then evaluate.
    pub fn train(&mut self) -> Result<TrainReport> {
        let epochs = self.config.update_per_collect;
        tracing::info!(
            device = ?self.device(),
            epochs,
            pairs = self.training_set.len(),
            pairs_per_epoch = self.pairs_per_epoch(),
            "Training reward model"
        );

        let progress = ProgressBar::new(epochs as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            progress.set_style(style.progress_chars("#>-"));
        }

        let mut losses = Vec::with_capacity(epochs);
        for epoch in 0..epochs {
            self.training_set.shuffle(&mut self.rng);
            let loss = self.train_epoch()?;
            self.train_iter += 1;

            tracing::debug!(epoch, loss, "Epoch finished");
            self.logger.log_scalar(TRAIN_LOSS_TAG, loss, self.train_iter);
            progress.set_message(format!("loss {:.4}", loss));
            progress.inc(1);
            losses.push(loss);
        }
        progress.finish_and_clear();
        self.logger.flush();
        if let Some(loss) = losses.last() {
            tracing::info!(train_iter = self.train_iter, loss, "Finished training epochs");
        }

        let mut returns = Vec::with_capacity(self.demos.num_bins());
        for (rank, bin) in self.demos.ranked_by_return().into_iter().enumerate() {
            let predicted = self.predict_traj_return(self.demos.trajectory(bin, 0))?;
            let actual = self.demos.learning_returns()[bin].episode_return;
            tracing::info!(rank, bin, predicted, actual, "Predicted vs true return");
            returns.push(ReturnComparison {
                bin,
                predicted,
                actual,
            });
        }

        let accuracy = self.calc_accuracy()?;
        self.last_accuracy = Some(accuracy);

        let max_snippet_length = self
            .config
            .max_snippet_length
            .min(self.demos.shortest_len());
        let report = TrainReport {
            losses,
            returns,
            demo_lengths: self.demos.bins().iter().map(|bin| bin[0].len()).collect(),
            min_snippet_length: self.config.min_snippet_length,
            max_snippet_length,
            num_pairs: self.training_set.len(),
            accuracy,
        };
        tracing::info!("accuracy and comparison:\n{}", report);
        Ok(report)
    }

    /// One pass over the training set in its current order.
    ///
    /// Returns the cumulative loss of the processed pairs.
    pub fn train_epoch(&mut self) -> Result<f64> {
        let device = self.device();
        let take = self.pairs_per_epoch();
        let mut cum_loss = 0.0;

        for pair in &self.training_set.pairs()[..take] {
            let traj_i = to_tensor(&self.demos.stack(&pair.i)?, device)?;
            let traj_j = to_tensor(&self.demos.stack(&pair.j)?, device)?;
            let labels = Tensor::from_slice(&[pair.target()]).to_device(device);

            let loss = self.network.learn(&traj_i, &traj_j, &labels);
            self.optimizer.zero_grad();
            loss.backward();
            self.optimizer.step();

            cum_loss += loss.double_value(&[]);
        }
        Ok(cum_loss)
    }

    /// Fraction of training pairs whose preferred trajectory gets the higher
    /// predicted return.
    pub fn calc_accuracy(&self) -> Result<f64> {
        if self.training_set.is_empty() {
            tracing::warn!("Accuracy requested on an empty training set");
            return Ok(0.0);
        }

        let device = self.device();
        let correct = tch::no_grad(|| -> Result<usize> {
            let mut correct = 0;
            for pair in &self.training_set {
                let traj_i = to_tensor(&self.demos.stack(&pair.i)?, device)?;
                let traj_j = to_tensor(&self.demos.stack(&pair.j)?, device)?;
                let (outputs, _) = self.network.outputs_abs_reward(&traj_i, &traj_j);
                if outputs.argmax(0, false).int64_value(&[]) == pair.target() {
                    correct += 1;
                }
            }
            Ok(correct)
        })?;

        Ok(correct as f64 / self.training_set.len() as f64)
    }

    /// Sum of predicted per-frame rewards over a trajectory.
    pub fn predict_traj_return(&self, traj: &Trajectory) -> Result<f64> {
        let frames = to_tensor(&traj.stack()?, self.device())?;
        let rewards = tch::no_grad(|| self.network.forward(&frames));
        Ok(rewards.sum(Kind::Double).double_value(&[]))
    }

    /// Recorded and predicted return of each episode.
    pub fn pred_data(&self, episodes: &[Vec<Transition>]) -> Result<PredictionComparison> {
        let mut comparison = PredictionComparison::default();
        for episode in episodes {
            comparison.real.push(episode_return(episode));
            let rewards = self.predict_transitions(episode)?;
            comparison.pred.push(rewards.iter().map(|&r| f64::from(r)).sum());
        }
        Ok(comparison)
    }

    /// Copy `batch` and replace every reward with the learned one.
    ///
    /// The input is never modified; records held elsewhere (e.g. by a replay
    /// buffer) keep their environment reward.
    pub fn estimate(&mut self, batch: &[Transition]) -> Result<Vec<Transition>> {
        let mut augmented = batch.to_vec();
        let rewards = self.predict_transitions(&augmented)?;

        if let Some(stats) = RewardStats::from_rewards(&rewards) {
            let metrics = HashMap::from([
                (ESTIMATE_MEAN_TAG.to_string(), stats.mean),
                (ESTIMATE_STD_TAG.to_string(), stats.std),
                (ESTIMATE_MAX_TAG.to_string(), stats.max),
                (ESTIMATE_MIN_TAG.to_string(), stats.min),
            ]);
            self.logger.log_metrics(&metrics, self.train_iter);
        }

        for (item, reward) in augmented.iter_mut().zip(rewards) {
            item.reward = reward;
        }
        self.estimate_iter += 1;
        Ok(augmented)
    }

    /// Per-transition rewards from the network.
    fn predict_transitions(&self, batch: &[Transition]) -> Result<Vec<f32>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let states = collect_states(batch)?;
        if states.shape()[1..] != self.config.obs_shape[..] {
            return Err(TrexError::ShapeMismatch {
                expected: self.config.obs_shape.clone(),
                actual: states.shape()[1..].to_vec(),
            });
        }
        let states = to_tensor(&states, self.device())?;
        let rewards = tch::no_grad(|| self.network.forward(&states))
            .flatten(0, -1)
            .to_kind(Kind::Float)
            .to_device(Device::Cpu);
        let rewards = Vec::<f32>::try_from(&rewards)?;
        if rewards.len() != batch.len() {
            return Err(TrexError::ShapeMismatch {
                expected: vec![batch.len()],
                actual: vec![rewards.len()],
            });
        }
        Ok(rewards)
    }

    /// Reserved for learning from freshly collected data; does nothing.
    pub fn collect_data(&mut self, _batch: &[Transition]) {}

    /// Clear the training set when `iteration` is a multiple of
    /// `clear_buffer_per_iters`. Returns whether the set was cleared.
    pub fn clear_data(&mut self, iteration: u64) -> bool {
        match self.config.clear_buffer_per_iters {
            Some(period) if period > 0 && iteration % period == 0 => {
                tracing::info!(iteration, cleared = self.training_set.len(), "Clearing training data");
                self.training_set.clear();
                true
            }
            _ => false,
        }
    }

    /// Save weights, counters and configuration under `<exp_dir>/ckpt_reward_model/`.
    pub fn save_checkpoint(&self) -> Result<PathBuf> {
        let dir = self.config.exp_dir.join(CHECKPOINT_DIR);
        std::fs::create_dir_all(&dir)?;

        let weights = dir.join(format!("{}.pt", CHECKPOINT_NAME));
        self.network.var_store().save(&weights)?;

        let metadata = CheckpointMetadata::new(
            self.train_iter,
            self.estimate_iter,
            self.last_accuracy,
            self.training_set.len(),
        );
        metadata.write(&metadata_path(&weights))?;
        self.config.save(config_path(&weights))?;

        tracing::info!(path = %weights.display(), train_iter = self.train_iter, "Saved reward model");
        Ok(weights)
    }

    /// Restore weights, and counters when the metadata file is present.
    pub fn load_checkpoint(&mut self, path: &Path) -> Result<()> {
        tracing::info!(path = %path.display(), "Loading reward model");
        self.network.var_store_mut().load(path)?;

        let meta_path = metadata_path(path);
        if meta_path.is_file() {
            let metadata = CheckpointMetadata::read(&meta_path)?;
            self.train_iter = metadata.train_iter;
            self.estimate_iter = metadata.estimate_iter;
            self.last_accuracy = metadata.accuracy;
            tracing::info!(
                train_iter = self.train_iter,
                estimate_iter = self.estimate_iter,
                "Metadata restored"
            );
        } else {
            tracing::warn!(path = %meta_path.display(), "No checkpoint metadata found, keeping counters");
        }
        Ok(())
    }

    pub fn device(&self) -> Device {
        self.network.var_store().device()
    }

    pub fn config(&self) -> &TrexConfig {
        &self.config
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn demonstrations(&self) -> &Demonstrations {
        &self.demos
    }

    pub fn training_set(&self) -> &TrainingSet {
        &self.training_set
    }

    /// Completed training epochs
    pub fn train_iter(&self) -> u64 {
        self.train_iter
    }

    /// Completed estimation calls
    pub fn estimate_iter(&self) -> u64 {
        self.estimate_iter
    }

    pub fn last_accuracy(&self) -> Option<f64> {
        self.last_accuracy
    }
}
