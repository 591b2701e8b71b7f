use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One instant captured on both clocks: the wall clock for human-readable
/// session records, and seconds elapsed on the run's monotonic stopwatch for
/// duration arithmetic. Both fields describe the same moment; subtracting two
/// `elapsed_s` values stays valid even if the wall clock is later adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimestampPair {
    pub wall: DateTime<Local>,
    pub elapsed_s: f64,
}

impl TimestampPair {
    pub fn new(wall: DateTime<Local>, elapsed_s: f64) -> Self {
        Self { wall, elapsed_s }
    }

    /// Seconds between this pair and an earlier one, on the monotonic axis.
    pub fn seconds_since(&self, earlier: &TimestampPair) -> f64 {
        self.elapsed_s - earlier.elapsed_s
    }
}
