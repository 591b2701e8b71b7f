pub mod config;
pub mod error;
pub mod gonogo;
pub mod metrics;
pub mod rhythm;
pub mod schedule;

pub use config::{GoNogoConfig, RhythmConfig};
pub use error::ConfigError;
pub use gonogo::{GoNogoRunner, RunPhase};
pub use metrics::compute_go_nogo_metrics;
pub use rhythm::RhythmRunner;
pub use schedule::{build_trial_schedule, compute_go_ratio, generate_trial_schedule};
