use std::time::Instant;

use chrono::{DateTime, Local};

use cadence_core::TimestampPair;

/// Wall-clock anchor plus monotonic origin for one run. The monotonic origin
/// never moves except on an explicit `reset`, so `elapsed_seconds` is
/// non-decreasing between reads.
#[derive(Debug, Clone)]
pub struct Stopwatch {
    start_wall: DateTime<Local>,
    start_mono: Instant,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            start_wall: Local::now(),
            start_mono: Instant::now(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn start_wall(&self) -> DateTime<Local> {
        self.start_wall
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.start_mono.elapsed().as_secs_f64()
    }

    pub fn elapsed_ms(&self) -> u64 {
        (self.elapsed_seconds() * 1000.0) as u64
    }

    /// Both clocks sampled back-to-back with no intervening work, so the pair
    /// describes a single instant.
    pub fn timestamp_pair(&self) -> TimestampPair {
        TimestampPair::new(Local::now(), self.elapsed_seconds())
    }

    /// The pair describing the stopwatch's own origin.
    pub fn origin_pair(&self) -> TimestampPair {
        TimestampPair::new(self.start_wall, 0.0)
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}
