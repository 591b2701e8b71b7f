use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cadence_core::{BlockPart, CueKind, VisualCueStyle};

use crate::error::ConfigError;
use crate::schedule::compute_go_ratio;

/// Parameters of one Go/No-Go session. Durations are seconds. Validation
/// happens once, before a runner is constructed; the state machine itself
/// trusts these fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoNogoConfig {
    pub paradigm_name: String,
    pub output_folder: String,
    pub go_digits: Vec<u8>,
    pub nogo_digits: Vec<u8>,
    pub digit_weights: BTreeMap<u8, f64>,
    pub n_blocks: usize,
    pub n_trials_per_block: usize,
    pub rest_duration_s: f64,
    pub post_block_rest_duration_s: f64,
    pub inter_block_interval_s: f64,
    pub stimulus_duration_s: f64,
    pub inter_trial_interval_s: f64,
    pub max_response_window_s: f64,
    pub test_mode: bool,
}

impl Default for GoNogoConfig {
    fn default() -> Self {
        Self {
            paradigm_name: "GoNoGo".to_string(),
            output_folder: ".".to_string(),
            go_digits: (0..=8).collect(),
            nogo_digits: vec![9],
            digit_weights: (0..=9).map(|d| (d, 1.0)).collect(),
            n_blocks: 4,
            n_trials_per_block: 75,
            rest_duration_s: 10.0,
            post_block_rest_duration_s: 10.0,
            inter_block_interval_s: 30.0,
            stimulus_duration_s: 0.3,
            inter_trial_interval_s: 1.0,
            max_response_window_s: 0.8,
            test_mode: false,
        }
    }
}

impl GoNogoConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_blocks == 0 {
            return Err(ConfigError::NonPositive { field: "n_blocks" });
        }
        if self.n_trials_per_block == 0 {
            return Err(ConfigError::NonPositive {
                field: "n_trials_per_block",
            });
        }
        for (field, value) in [
            ("rest_duration_s", self.rest_duration_s),
            (
                "post_block_rest_duration_s",
                self.post_block_rest_duration_s,
            ),
            ("inter_block_interval_s", self.inter_block_interval_s),
            ("inter_trial_interval_s", self.inter_trial_interval_s),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative { field });
            }
        }
        for (field, value) in [
            ("stimulus_duration_s", self.stimulus_duration_s),
            ("max_response_window_s", self.max_response_window_s),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { field });
            }
        }
        // Digit-set and weight checks, including overlap and class totals.
        compute_go_ratio(&self.go_digits, &self.nogo_digits, &self.digit_weights)?;
        Ok(())
    }
}

/// Parameters of one rhythmic-movement session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RhythmConfig {
    pub paradigm_name: String,
    pub output_folder: String,
    pub cue: CueKind,
    pub cue_frequency_hz: f64,
    pub cue_tone_hz: f64,
    pub cue_on_time_ms: u32,
    pub visual_cue: VisualCueStyle,
    pub num_blocks: usize,
    pub inter_block_interval_s: f64,
    pub part_durations_s: BTreeMap<BlockPart, f64>,
    pub test_mode: bool,
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self {
            paradigm_name: "Rhythm".to_string(),
            output_folder: ".".to_string(),
            cue: CueKind::Audio,
            cue_frequency_hz: 1.0,
            cue_tone_hz: 880.0,
            cue_on_time_ms: 300,
            visual_cue: VisualCueStyle::default(),
            num_blocks: 2,
            inter_block_interval_s: 5.0,
            part_durations_s: BTreeMap::from([
                (BlockPart::RestPre, 5.0),
                (BlockPart::CuedMovement, 15.0),
                (BlockPart::RestInstruction, 5.0),
                (BlockPart::InternalMovement, 15.0),
                (BlockPart::RestPost, 5.0),
            ]),
            test_mode: false,
        }
    }
}

impl RhythmConfig {
    pub fn part_duration_s(&self, part: BlockPart) -> f64 {
        self.part_durations_s.get(&part).copied().unwrap_or(0.0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_blocks == 0 {
            return Err(ConfigError::NonPositive {
                field: "num_blocks",
            });
        }
        if self.cue_frequency_hz <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "cue_frequency_hz",
            });
        }
        if self.cue_tone_hz <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "cue_tone_hz",
            });
        }
        if self.inter_block_interval_s < 0.0 {
            return Err(ConfigError::Negative {
                field: "inter_block_interval_s",
            });
        }
        for part in BlockPart::ORDERED {
            if self.part_duration_s(part) < 0.0 {
                return Err(ConfigError::Negative {
                    field: "part_durations_s",
                });
            }
        }
        let color = &self.visual_cue.color_hex;
        if !color.starts_with('#') || color.len() != 7 {
            return Err(ConfigError::BadColor {
                value: color.clone(),
            });
        }
        Ok(())
    }
}
