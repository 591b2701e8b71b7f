use serde::{Deserialize, Serialize};

/// Which modality the rhythmic cue train uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueKind {
    Audio,
    Visual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualCueStyle {
    pub color_hex: String,
    pub radius_px: u32,
}

impl Default for VisualCueStyle {
    fn default() -> Self {
        Self {
            color_hex: "#FF0000".to_string(),
            radius_px: 160,
        }
    }
}

/// Short notification sequences played at run boundaries and stimulus onsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    StartSequence,
    EndSequence,
    HighBeep,
}

/// Semantic instruction shown to the subject. Translation to display text is
/// the presentation layer's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionKind {
    Start,
    End,
    Rest,
    FollowCue,
    InternalRhythm,
}

/// Presentation and audio side effects consumed by the paradigm runners.
///
/// Every method is fire-and-forget: implementations must return promptly and
/// never block the timing loop. A dropped or late cue rendering must not
/// stall the schedule.
pub trait StimulusSink {
    fn show_instruction(&mut self, kind: InstructionKind);
    fn show_digit(&mut self, digit: u8);
    /// Inter-block rest display with a live countdown.
    fn show_block_rest(&mut self, finished_block: usize, remaining_ms: u64);
    fn clear(&mut self);
    fn play_tone(&mut self, frequency_hz: f64, duration_ms: u32);
    fn play_notification(&mut self, kind: NotificationKind);
    fn show_visual_cue(&mut self, style: &VisualCueStyle, on_time_ms: u32);
    fn hide_visual_cue(&mut self);
}

/// Sink that discards everything. Used by tests and headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl StimulusSink for NullSink {
    fn show_instruction(&mut self, _kind: InstructionKind) {}
    fn show_digit(&mut self, _digit: u8) {}
    fn show_block_rest(&mut self, _finished_block: usize, _remaining_ms: u64) {}
    fn clear(&mut self) {}
    fn play_tone(&mut self, _frequency_hz: f64, _duration_ms: u32) {}
    fn play_notification(&mut self, _kind: NotificationKind) {}
    fn show_visual_cue(&mut self, _style: &VisualCueStyle, _on_time_ms: u32) {}
    fn hide_visual_cue(&mut self) {}
}
