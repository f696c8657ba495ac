//! Preference training data.
//!
//! Provides:
//! - `Span` - A strided view into one demonstration trajectory
//! - `TrainingPair` / `TrainingSet` - Labelled trajectory pairs
//! - `create_training_data` - Pair sampling with the progress prior

mod pairs;
mod sampler;

pub use pairs::{PairKind, Span, TrainingPair, TrainingSet};
pub use sampler::{create_training_data, SamplingParams, SamplingReport};
