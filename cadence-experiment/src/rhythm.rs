use std::time::{Duration, Instant};

use cadence_core::{
    AbortReason, BlockPart, CueKind, InstructionKind, NotificationKind, RhythmLog, RunMeta,
    StimulusSink,
};
use cadence_timing::{
    AbortFlag, CountdownOutcome, PeriodicSchedule, Stopwatch, high_precision_sleep,
    run_blocking_countdown,
};
use tracing::{debug, info};

use crate::config::RhythmConfig;

/// Start and end screens hold for this long.
const SCREEN_HOLD_S: f64 = 0.8;
/// Poll step inside the cue train. Fine-grained so cue emission lands within
/// a millisecond of its scheduled slot.
const CUE_POLL: Duration = Duration::from_millis(1);
/// Poll step for plain waits and rest countdowns.
const WAIT_POLL: Duration = Duration::from_millis(10);

/// Rhythmic-movement paradigm runner. Unlike the Go/No-Go machine this one
/// owns its thread: `run` blocks until the session completes or the shared
/// abort flag is raised. Every wait polls the flag at `WAIT_POLL` or finer,
/// so an abort lands within one poll step.
pub struct RhythmRunner {
    config: RhythmConfig,
    stopwatch: Stopwatch,
    log: RhythmLog<RhythmConfig>,
    abort: AbortFlag,
}

impl RhythmRunner {
    pub fn new(config: RhythmConfig, meta: RunMeta) -> Self {
        let log = RhythmLog::new(meta, config.clone());
        Self {
            config,
            stopwatch: Stopwatch::new(),
            log,
            abort: AbortFlag::new(),
        }
    }

    /// Handle the input side can use to request an abort while `run` blocks.
    pub fn abort_flag(&self) -> AbortFlag {
        self.abort.clone()
    }

    /// Execute the whole session and hand back the finished log.
    pub fn run(mut self, sink: &mut dyn StimulusSink) -> RhythmLog<RhythmConfig> {
        self.stopwatch.reset();
        self.log.start(self.stopwatch.origin_pair());
        self.log.init_blocks(self.config.num_blocks);
        info!(paradigm = %self.config.paradigm_name, "run started");

        sink.play_notification(NotificationKind::StartSequence);
        sink.show_instruction(InstructionKind::Start);
        self.wait_abortable(SCREEN_HOLD_S);
        sink.clear();

        for block_index in 0..self.config.num_blocks {
            if self.abort.is_set() {
                break;
            }
            info!(block = block_index + 1, "block started");
            self.log
                .mark_block_start(block_index, self.stopwatch.timestamp_pair());
            self.run_block(block_index, sink);
            if self.abort.is_set() {
                break;
            }
            if block_index + 1 < self.config.num_blocks {
                self.log.mark_interval_start(
                    block_index,
                    self.config.inter_block_interval_s,
                    self.stopwatch.timestamp_pair(),
                );
                self.rest_between_blocks(block_index, sink);
            }
        }

        let end = self.stopwatch.timestamp_pair();
        if self.abort.is_set() {
            self.log.abort(AbortReason::EscPressed, end);
            sink.hide_visual_cue();
            sink.clear();
            info!("run aborted");
        } else {
            self.log.finish(end);
            sink.play_notification(NotificationKind::EndSequence);
            sink.show_instruction(InstructionKind::End);
            self.wait_abortable(SCREEN_HOLD_S);
            sink.clear();
            info!("run completed");
        }
        self.log
    }

    fn run_block(&mut self, block_index: usize, sink: &mut dyn StimulusSink) {
        for part in BlockPart::ORDERED {
            if self.abort.is_set() {
                break;
            }
            let duration_s = self.config.part_duration_s(part);
            self.log.mark_part_start(
                block_index,
                part,
                duration_s,
                self.stopwatch.timestamp_pair(),
            );
            self.run_part(block_index, part, duration_s, sink);
        }
    }

    fn run_part(
        &mut self,
        block_index: usize,
        part: BlockPart,
        duration_s: f64,
        sink: &mut dyn StimulusSink,
    ) {
        debug!(block = block_index + 1, ?part, duration_s, "part started");
        sink.show_instruction(part.instruction());
        if part.emits_cues() {
            self.run_cue_train(block_index, part, duration_s, sink);
        } else {
            self.wait_abortable(duration_s);
        }
        sink.hide_visual_cue();
    }

    /// Emit cues every `1 / frequency` seconds for the part duration. The
    /// next cue time accumulates period by period, so a late poll delays one
    /// cue without shifting the rest of the train.
    fn run_cue_train(
        &mut self,
        block_index: usize,
        part: BlockPart,
        duration_s: f64,
        sink: &mut dyn StimulusSink,
    ) {
        if self.config.cue_frequency_hz <= 0.0 {
            self.wait_abortable(duration_s);
            return;
        }
        let period_s = 1.0 / self.config.cue_frequency_hz;
        let start = Instant::now();
        let mut schedule = PeriodicSchedule::new(0.0, period_s);
        while start.elapsed().as_secs_f64() < duration_s {
            if self.abort.is_set() {
                break;
            }
            if schedule.fire_due(start.elapsed().as_secs_f64()) {
                self.trigger_cue(block_index, part, sink);
            }
            high_precision_sleep(CUE_POLL);
        }
        sink.hide_visual_cue();
    }

    fn trigger_cue(&mut self, block_index: usize, part: BlockPart, sink: &mut dyn StimulusSink) {
        self.log
            .log_cue(block_index, part, self.stopwatch.timestamp_pair());
        match self.config.cue {
            CueKind::Audio => sink.play_tone(self.config.cue_tone_hz, self.config.cue_on_time_ms),
            CueKind::Visual => {
                sink.show_visual_cue(&self.config.visual_cue, self.config.cue_on_time_ms)
            }
        }
    }

    fn rest_between_blocks(&mut self, block_index: usize, sink: &mut dyn StimulusSink) {
        let abort = self.abort.clone();
        let finished_block = block_index + 1;
        let outcome = run_blocking_countdown(
            self.config.inter_block_interval_s,
            WAIT_POLL,
            |remaining_ms| sink.show_block_rest(finished_block, remaining_ms),
            || abort.is_set(),
        );
        if outcome == CountdownOutcome::Completed {
            sink.show_instruction(InstructionKind::Rest);
        }
    }

    fn wait_abortable(&self, duration_s: f64) {
        let abort = self.abort.clone();
        run_blocking_countdown(duration_s, WAIT_POLL, |_| {}, || abort.is_set());
    }
}
