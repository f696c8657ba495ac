//! Scalar metric sinks.
//!
//! Provides:
//! - `MetricLogger` trait for composable backends
//! - `ConsoleLogger` for tracing output
//! - `MemoryLogger` for in-process inspection of emitted metrics
//! - `TensorBoardLogger` for event files (optional)
//! - `CompositeLogger` for multi-backend logging

mod console;
mod logger;
mod memory;
#[cfg(feature = "tensorboard")]
mod tensorboard;

pub use console::ConsoleLogger;
pub use logger::{CompositeLogger, MetricLogger, NoOpLogger};
pub use memory::{MemoryLogger, Scalar};
#[cfg(feature = "tensorboard")]
pub use tensorboard::TensorBoardLogger;
