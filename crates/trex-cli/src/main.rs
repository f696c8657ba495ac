//! T-REX CLI
//!
//! Command-line interface for inspecting demonstrations, training reward
//! models and relabelling transition batches.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use trex::config::TrexConfig;
use trex::dataset::{create_training_data, PairKind, TrainingSet};
use trex::demo::{DemoStore, Demonstrations};
use trex::utils;

#[derive(Parser)]
#[command(name = "trex")]
#[command(version, about = "T-REX - Reward learning from ranked demonstrations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load demonstrations and report the sampled training set
    Inspect {
        /// Experiment directory
        exp_dir: PathBuf,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Train a reward model (requires --features torch)
    Train {
        /// Experiment directory
        exp_dir: PathBuf,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Epochs per training call
        #[arg(long)]
        epochs: Option<usize>,

        /// Learning rate
        #[arg(long)]
        lr: Option<f64>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Write scalar metrics to this TensorBoard directory
        #[arg(long)]
        tensorboard: Option<PathBuf>,
    },

    /// Replace the rewards of a JSON transition batch (requires --features torch)
    Relabel {
        /// Experiment directory
        exp_dir: PathBuf,

        /// Input transitions
        input: PathBuf,

        /// Output transitions
        output: PathBuf,

        /// Weights to load (defaults to the latest checkpoint)
        #[arg(long)]
        checkpoint: Option<PathBuf>,

        /// JSON config file (defaults to the one saved with the checkpoint)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { exp_dir, config } => {
            inspect(&exp_dir, config.as_deref())?;
        }
        Commands::Train {
            exp_dir,
            config,
            epochs,
            lr,
            seed,
            tensorboard,
        } => {
            let from_file = config.is_some();
            let mut config = load_config(&exp_dir, config.as_deref())?;
            if let Some(epochs) = epochs {
                config = config.with_updates(epochs);
            }
            if let Some(lr) = lr {
                config = config.with_lr(lr);
            }
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }

            #[cfg(feature = "torch")]
            {
                train(config, from_file, tensorboard.as_deref())?;
            }
            #[cfg(not(feature = "torch"))]
            {
                let _ = (config, from_file, tensorboard);
                anyhow::bail!(
                    "Training requires the 'torch' feature. Rebuild with: cargo build --features torch"
                );
            }
        }
        Commands::Relabel {
            exp_dir,
            input,
            output,
            checkpoint,
            config,
        } => {
            #[cfg(feature = "torch")]
            {
                relabel(
                    &exp_dir,
                    &input,
                    &output,
                    checkpoint.as_deref(),
                    config.as_deref(),
                )?;
            }
            #[cfg(not(feature = "torch"))]
            {
                let _ = (exp_dir, input, output, checkpoint, config);
                anyhow::bail!(
                    "Relabelling requires the 'torch' feature. Rebuild with: cargo build --features torch"
                );
            }
        }
    }

    Ok(())
}

/// Config from `path` (or defaults) pointed at `exp_dir`.
fn load_config(exp_dir: &Path, path: Option<&Path>) -> Result<TrexConfig> {
    let config = match path {
        Some(path) => TrexConfig::from_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => TrexConfig::default(),
    };
    Ok(config.with_exp_dir(exp_dir))
}

/// Load demonstrations. Without a config file the observation shape is taken
/// from the frames on disk.
fn load_demos(config: &mut TrexConfig, from_file: bool) -> Result<Demonstrations> {
    let demos = DemoStore::new(&config.exp_dir)
        .load()
        .with_context(|| format!("failed to load demonstrations from {}", config.exp_dir.display()))?;
    if !from_file {
        config.obs_shape = demos.frame_shape().to_vec();
    }
    Ok(demos)
}

fn inspect(exp_dir: &Path, config_path: Option<&Path>) -> Result<()> {
    let start = Instant::now();
    let mut config = load_config(exp_dir, config_path)?;
    let demos = load_demos(&mut config, config_path.is_some())?;

    let mut rng = utils::set_seed(config.seed);
    let mut set = TrainingSet::new();
    let report = create_training_data(&demos, &config.sampling_params(), &mut rng, &mut set)?;

    let full = set
        .iter()
        .filter(|p| p.kind == PairKind::FullTrajectory)
        .count();
    let preferred_j = set.labels().iter().filter(|&&l| l == 1).count();

    println!("Experiment: {}", exp_dir.display());
    println!("  bins:               {}", demos.num_bins());
    println!("  frame shape:        {:?}", demos.frame_shape());
    println!("  demo lengths:       {:?}", report.demo_lengths);
    println!("  ranking (by return):");
    for (rank, bin) in demos.ranked_by_return().into_iter().enumerate() {
        let learning_return = &demos.learning_returns()[bin];
        println!(
            "    {} bin={} return={:.3} id={}",
            rank, bin, learning_return.episode_return, learning_return.id
        );
    }
    println!("Training set:");
    println!("  pairs:              {}", set.len());
    println!("  full trajectories:  {}", full);
    println!("  snippets:           {}", set.len() - full);
    println!("  label=1 pairs:      {}", preferred_j);
    println!(
        "  snippet length:     [{}, {})",
        report.min_snippet_length, report.max_snippet_length
    );
    println!("  max pair length:    {}", report.max_traj_length);
    println!(
        "Done in {}",
        utils::format_duration(start.elapsed().as_secs_f64())
    );

    Ok(())
}

#[cfg(feature = "torch")]
fn metric_logger(tensorboard: Option<&Path>) -> Box<dyn trex::log::MetricLogger> {
    use trex::log::{CompositeLogger, ConsoleLogger};

    let mut logger = CompositeLogger::new(Vec::new());
    logger.add(Box::new(ConsoleLogger::new()));
    if let Some(dir) = tensorboard {
        #[cfg(feature = "tensorboard")]
        {
            tracing::info!(dir = %dir.display(), "Writing TensorBoard metrics");
            logger.add(Box::new(trex::log::TensorBoardLogger::new(dir)));
        }
        #[cfg(not(feature = "tensorboard"))]
        {
            tracing::warn!(
                dir = %dir.display(),
                "TensorBoard output requires the 'tensorboard' feature, ignoring"
            );
        }
    }
    Box::new(logger)
}

#[cfg(feature = "torch")]
fn build_model(
    mut config: TrexConfig,
    from_file: bool,
    logger: Box<dyn trex::log::MetricLogger>,
) -> Result<trex::reward::TrexRewardModel> {
    if config.device == "cpu" && tch::Cuda::is_available() {
        tracing::info!("CUDA is available, set \"device\": \"cuda\" in the config to use it");
    }
    let demos = load_demos(&mut config, from_file)?;
    let rng = utils::set_seed(config.seed);
    Ok(trex::reward::TrexRewardModel::from_demonstrations(
        config, demos, rng, logger,
    )?)
}

#[cfg(feature = "torch")]
fn train(config: TrexConfig, from_file: bool, tensorboard: Option<&Path>) -> Result<()> {
    let start = Instant::now();
    tracing::info!(
        exp_dir = %config.exp_dir.display(),
        epochs = config.update_per_collect,
        lr = config.learning_rate,
        seed = config.seed,
        "Starting training"
    );

    let mut model = build_model(config, from_file, metric_logger(tensorboard))?;
    let report = model.train()?;
    let path = model.save_checkpoint()?;

    print!("{}", report);
    if let Some(loss) = report.final_loss() {
        println!("final loss: {:.4}", loss);
    }
    println!("checkpoint: {}", path.display());
    println!(
        "Done in {}",
        utils::format_duration(start.elapsed().as_secs_f64())
    );
    Ok(())
}

#[cfg(feature = "torch")]
fn relabel(
    exp_dir: &Path,
    input: &Path,
    output: &Path,
    checkpoint: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<()> {
    use trex::checkpoint::{config_path as saved_config, CHECKPOINT_DIR, CHECKPOINT_NAME};
    use trex::reward::TrexRewardModel;
    use trex::transition::Transition;

    let weights = match checkpoint {
        Some(path) => path.to_path_buf(),
        None => exp_dir
            .join(CHECKPOINT_DIR)
            .join(format!("{}.pt", CHECKPOINT_NAME)),
    };

    // The network must be rebuilt with the layout it was trained with.
    let saved = saved_config(&weights);
    let config_path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None if saved.is_file() => Some(saved),
        None => {
            tracing::warn!(
                path = %saved.display(),
                "No saved config found, using defaults"
            );
            None
        }
    };
    let mut config = load_config(exp_dir, config_path.as_deref())?;
    let demos = load_demos(&mut config, config_path.is_some())?;
    let mut model =
        TrexRewardModel::for_inference(config, demos, Box::new(trex::log::NoOpLogger))?;

    model
        .load_checkpoint(&weights)
        .with_context(|| format!("failed to load checkpoint {}", weights.display()))?;

    let file = std::fs::File::open(input)
        .with_context(|| format!("failed to open {}", input.display()))?;
    let batch: Vec<Transition> = serde_json::from_reader(std::io::BufReader::new(file))?;

    let relabelled = model.estimate(&batch)?;

    let file = std::fs::File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    serde_json::to_writer(std::io::BufWriter::new(file), &relabelled)?;

    tracing::info!(
        transitions = relabelled.len(),
        output = %output.display(),
        "Relabelled batch"
    );
    Ok(())
}
