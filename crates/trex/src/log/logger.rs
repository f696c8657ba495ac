//! Metric logger trait and composites.

use std::collections::HashMap;
use std::sync::Arc;

/// Sink for scalar metrics tagged with an iteration count.
pub trait MetricLogger: Send + Sync {
    /// Record one scalar (e.g. loss, mean estimated reward).
    fn log_scalar(&self, tag: &str, value: f64, step: u64);

    /// Record several scalars at the same step.
    fn log_metrics(&self, metrics: &HashMap<String, f64>, step: u64) {
        for (tag, value) in metrics {
            self.log_scalar(tag, *value, step);
        }
    }

    /// Push buffered records to their destination.
    fn flush(&self) {}

    /// Flush and release the sink.
    fn close(&self) {
        self.flush();
    }
}

/// Discards everything.
pub struct NoOpLogger;

impl MetricLogger for NoOpLogger {
    fn log_scalar(&self, _tag: &str, _value: f64, _step: u64) {}
}

/// Shared handles log into the same sink, so a caller can keep one to inspect.
impl<L: MetricLogger + ?Sized> MetricLogger for Arc<L> {
    fn log_scalar(&self, tag: &str, value: f64, step: u64) {
        (**self).log_scalar(tag, value, step);
    }

    fn log_metrics(&self, metrics: &HashMap<String, f64>, step: u64) {
        (**self).log_metrics(metrics, step);
    }

    fn flush(&self) {
        (**self).flush();
    }

    fn close(&self) {
        (**self).close();
    }
}

/// Dispatches to several backends.
#[derive(Default)]
pub struct CompositeLogger {
    loggers: Vec<Box<dyn MetricLogger>>,
}

impl CompositeLogger {
    pub fn new(loggers: Vec<Box<dyn MetricLogger>>) -> Self {
        Self { loggers }
    }

    pub fn add(&mut self, logger: Box<dyn MetricLogger>) {
        self.loggers.push(logger);
    }

    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }
}

impl MetricLogger for CompositeLogger {
    fn log_scalar(&self, tag: &str, value: f64, step: u64) {
        for logger in &self.loggers {
            logger.log_scalar(tag, value, step);
        }
    }

    fn log_metrics(&self, metrics: &HashMap<String, f64>, step: u64) {
        for logger in &self.loggers {
            logger.log_metrics(metrics, step);
        }
    }

    fn flush(&self) {
        for logger in &self.loggers {
            logger.flush();
        }
    }

    fn close(&self) {
        for logger in &self.loggers {
            logger.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::MemoryLogger;

    #[test]
    fn test_composite_fans_out() {
        let a = Arc::new(MemoryLogger::new());
        let b = Arc::new(MemoryLogger::new());
        let composite = CompositeLogger::new(vec![Box::new(a.clone()), Box::new(b.clone())]);

        composite.log_scalar("trex_reward/train_loss_iteration", 0.5, 3);

        assert_eq!(a.values("trex_reward/train_loss_iteration"), vec![(3, 0.5)]);
        assert_eq!(b.values("trex_reward/train_loss_iteration"), vec![(3, 0.5)]);
    }

    #[derive(Default)]
    struct FlushCounter(std::sync::atomic::AtomicUsize);

    impl MetricLogger for FlushCounter {
        fn log_scalar(&self, _tag: &str, _value: f64, _step: u64) {}

        fn flush(&self) {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[test]
    fn test_flush_and_close_reach_every_sink() {
        let a = Arc::new(FlushCounter::default());
        let b = Arc::new(FlushCounter::default());
        let composite = CompositeLogger::new(vec![Box::new(a.clone()), Box::new(b.clone())]);

        composite.flush();
        composite.close();

        for counter in [&a, &b] {
            assert_eq!(counter.0.load(std::sync::atomic::Ordering::SeqCst), 2);
        }
    }

    #[test]
    fn test_log_metrics_default_splits_into_scalars() {
        let memory = MemoryLogger::new();
        let mut metrics = HashMap::new();
        metrics.insert("a".to_string(), 1.0);
        metrics.insert("b".to_string(), 2.0);
        memory.log_metrics(&metrics, 7);

        assert_eq!(memory.len(), 2);
        assert_eq!(memory.last("b"), Some(2.0));
    }
}
