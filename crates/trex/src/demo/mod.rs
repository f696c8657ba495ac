//! Ranked demonstrations.
//!
//! Provides:
//! - `Trajectory` - An immutable sequence of observation frames
//! - `Demonstrations` - Trajectories grouped into bins of increasing quality
//! - `DemoStore` - Loading and saving demonstrations in an experiment directory

mod store;
mod trajectory;

pub use store::{DemoStore, EPISODES_FILE, RETURNS_FILE};
pub use trajectory::{Demonstrations, LearningReturn, Trajectory};
