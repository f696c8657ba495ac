//! Utility functions.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Seed libtorch (when enabled) and return a generator for pair sampling.
pub fn set_seed(seed: u64) -> StdRng {
    #[cfg(feature = "torch")]
    tch::manual_seed(seed as i64);
    StdRng::seed_from_u64(seed)
}

/// Format duration in human-readable form
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 {
        return "0s".to_string();
    }

    let secs = seconds as u64;
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;

    if h > 0 {
        format!("{}h {}m {}s", h, m, s)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else if seconds < 1.0 {
        format!("{}ms", (seconds * 1000.0) as u64)
    } else {
        format!("{}s", s)
    }
}
