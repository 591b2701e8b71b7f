use cadence_core::{InstructionKind, NotificationKind, StimulusSink, VisualCueStyle};
use cadence_timing::format_countdown_text;
use tracing::info;

/// Terminal-only presentation for headless runs. Audio and visual cues are
/// reported rather than rendered; a GUI host supplies its own sink.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    last_rest_text: String,
}

impl ConsoleSink {
    fn instruction_text(kind: InstructionKind) -> &'static str {
        match kind {
            InstructionKind::Start => "Start",
            InstructionKind::End => "End",
            InstructionKind::Rest => "Rest",
            InstructionKind::FollowCue => "Follow the cue",
            InstructionKind::InternalRhythm => "Move according to the previous rhythm",
        }
    }
}

impl StimulusSink for ConsoleSink {
    fn show_instruction(&mut self, kind: InstructionKind) {
        info!("[screen] {}", Self::instruction_text(kind));
    }

    fn show_digit(&mut self, digit: u8) {
        info!("[screen] {digit}");
    }

    fn show_block_rest(&mut self, finished_block: usize, remaining_ms: u64) {
        // The countdown refreshes far faster than a log should; only whole
        // seconds are worth a line.
        let text = format_countdown_text(remaining_ms);
        if remaining_ms % 1000 < 100 && text != self.last_rest_text {
            info!("[screen] block {finished_block} finished, rest {text}");
            self.last_rest_text = text;
        }
    }

    fn clear(&mut self) {}

    fn play_tone(&mut self, frequency_hz: f64, duration_ms: u32) {
        info!("[audio] tone {frequency_hz} Hz for {duration_ms} ms");
    }

    fn play_notification(&mut self, kind: NotificationKind) {
        info!("[audio] {kind:?}");
    }

    fn show_visual_cue(&mut self, style: &VisualCueStyle, on_time_ms: u32) {
        info!(
            "[screen] visual cue {} r={}px for {on_time_ms} ms",
            style.color_hex, style.radius_px
        );
    }

    fn hide_visual_cue(&mut self) {}
}
