//! Automated-input detection over inter-keystroke intervals.

use crate::metrics::mean;

/// Intervals below this are faster than human motor timing allows (seconds)
pub const MIN_INTERVAL_SECS: f64 = 0.030;
/// Spread below this is machine-like consistency (seconds)
pub const MAX_STD_DEV_SECS: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheatPolicy {
    pub min_interval_secs: f64,
    pub max_std_dev_secs: f64,
}

impl Default for CheatPolicy {
    fn default() -> Self {
        Self {
            min_interval_secs: MIN_INTERVAL_SECS,
            max_std_dev_secs: MAX_STD_DEV_SECS,
        }
    }
}

impl CheatPolicy {
    /// Flags a session when its fastest keystroke beats the floor and the
    /// timing is too consistent. An empty sequence carries no signal.
    ///
    /// A single interval has a standard deviation of 0, so one very fast
    /// keystroke on its own is flagged.
    pub fn is_automated(&self, intervals: &[f64]) -> bool {
        let Some(fastest) = intervals.iter().copied().reduce(f64::min) else {
            return false;
        };
        let spread = population_std_dev(intervals).unwrap_or(0.0);

        fastest < self.min_interval_secs && spread < self.max_std_dev_secs
    }
}

/// Runs the default policy
pub fn detect_automated_input(intervals: &[f64]) -> bool {
    CheatPolicy::default().is_automated(intervals)
}

/// Population standard deviation; `None` for an empty slice
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance = values
        .iter()
        .map(|value| {
            let diff = avg - *value;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;

    Some(variance.sqrt())
}
