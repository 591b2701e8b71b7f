use cadence_core::{
    AbortReason, BlockRecord, GoNogoLog, InstructionKind, NotificationKind, RunMeta, StimulusSink,
    TrialRecord, TrialSpec,
};
use cadence_timing::{Countdown, CountdownEvent, Stopwatch};
use tracing::{debug, info};

use crate::config::GoNogoConfig;
use crate::metrics::compute_go_nogo_metrics;

const START_SCREEN_S: f64 = 1.0;

/// Phase of the discrete-trial run. `Aborted` is absorbing: every transition
/// checks for it first, and nothing leaves it.
#[derive(Debug)]
pub enum RunPhase {
    Idle,
    StartScreen {
        until_s: f64,
    },
    /// Blank pre-task rest at the top of each block.
    PreBlockRest {
        until_s: f64,
    },
    /// Blank inter-trial interval before every trial except the block's first.
    TrialGap {
        until_s: f64,
    },
    /// Stimulus shown; both the stimulus-visible and the response-window
    /// deadlines run concurrently. Only the window deadline decides outcome.
    TrialActive {
        stimulus_off_s: f64,
        window_off_s: f64,
        stimulus_visible: bool,
    },
    /// Post-block rest plus inter-block interval, with a live countdown.
    InterBlockRest {
        countdown: Countdown,
        finished_block: usize,
    },
    Results,
    Aborted,
}

enum Step {
    Noop,
    BeginBlock,
    BeginTask,
    ShowStimulus,
    HideStimulus,
    ExpireWindow,
    RestTick { finished_block: usize, remaining_ms: u64 },
}

/// Discrete-trial Go/No-Go state machine, advanced by the host loop.
///
/// The host calls `update` at its own cadence (every frame, or a few times
/// per millisecond headless), forwards the subject's response via `respond`,
/// and requests termination via `abort`. All timing decisions are made
/// against the run stopwatch inside `update`, so the host cadence only
/// bounds latency, never correctness.
pub struct GoNogoRunner {
    config: GoNogoConfig,
    schedule: Vec<Vec<TrialSpec>>,
    stopwatch: Stopwatch,
    log: GoNogoLog<GoNogoConfig>,
    phase: RunPhase,
    /// 0-based cursor of the block being run (or about to run).
    block_cursor: usize,
    /// 0-based cursor of the next trial within the current block.
    trial_cursor: usize,
    first_trial_in_block: bool,
}

impl GoNogoRunner {
    /// `schedule` comes from [`crate::schedule::build_trial_schedule`] and
    /// must have one entry per configured block.
    pub fn new(config: GoNogoConfig, schedule: Vec<Vec<TrialSpec>>, meta: RunMeta) -> Self {
        let log = GoNogoLog::new(meta, config.clone());
        Self {
            config,
            schedule,
            stopwatch: Stopwatch::new(),
            log,
            phase: RunPhase::Idle,
            block_cursor: 0,
            trial_cursor: 0,
            first_trial_in_block: true,
        }
    }

    /// Begin the run: anchor the stopwatch, show the start screen. Only valid
    /// from `Idle`; a runner never starts twice.
    pub fn start(&mut self, sink: &mut dyn StimulusSink) {
        if !matches!(self.phase, RunPhase::Idle) {
            return;
        }
        self.stopwatch.reset();
        self.log.start(self.stopwatch.origin_pair());
        sink.play_notification(NotificationKind::StartSequence);
        sink.show_instruction(InstructionKind::Start);
        self.phase = RunPhase::StartScreen {
            until_s: START_SCREEN_S,
        };
        info!(paradigm = %self.config.paradigm_name, "run started");
    }

    /// Advance the state machine against the current clock.
    pub fn update(&mut self, sink: &mut dyn StimulusSink) {
        let now_s = self.stopwatch.elapsed_seconds();
        let step = match &mut self.phase {
            RunPhase::Idle | RunPhase::Results | RunPhase::Aborted => Step::Noop,
            RunPhase::StartScreen { until_s } if now_s >= *until_s => Step::BeginBlock,
            RunPhase::StartScreen { .. } => Step::Noop,
            RunPhase::PreBlockRest { until_s } if now_s >= *until_s => Step::BeginTask,
            RunPhase::PreBlockRest { .. } => Step::Noop,
            RunPhase::TrialGap { until_s } if now_s >= *until_s => Step::ShowStimulus,
            RunPhase::TrialGap { .. } => Step::Noop,
            RunPhase::TrialActive {
                stimulus_off_s,
                window_off_s,
                stimulus_visible,
            } => {
                if now_s >= *window_off_s {
                    Step::ExpireWindow
                } else if *stimulus_visible && now_s >= *stimulus_off_s {
                    *stimulus_visible = false;
                    Step::HideStimulus
                } else {
                    Step::Noop
                }
            }
            RunPhase::InterBlockRest {
                countdown,
                finished_block,
            } => match countdown.poll() {
                Some(CountdownEvent::Tick { remaining_ms }) => Step::RestTick {
                    finished_block: *finished_block,
                    remaining_ms,
                },
                Some(CountdownEvent::Finished) => Step::BeginBlock,
                None => Step::Noop,
            },
        };

        match step {
            Step::Noop => {}
            Step::BeginBlock => self.begin_block(sink),
            Step::BeginTask => self.begin_task(sink),
            Step::ShowStimulus => self.show_stimulus(sink),
            Step::HideStimulus => sink.clear(),
            Step::ExpireWindow => self.expire_response_window(sink),
            Step::RestTick {
                finished_block,
                remaining_ms,
            } => sink.show_block_rest(finished_block, remaining_ms),
        }
    }

    /// The subject's qualifying input. Only the first press inside an open
    /// response window counts; it resolves the trial, cancels both trial
    /// deadlines and advances immediately.
    pub fn respond(&mut self, sink: &mut dyn StimulusSink) {
        if !matches!(self.phase, RunPhase::TrialActive { .. }) {
            return;
        }
        let at = self.stopwatch.timestamp_pair();
        sink.clear();
        if let Some(trial) = self.current_trial_mut() {
            trial.resolve(Some(at));
            debug!(
                trial = trial.trial_index,
                rt_s = trial.reaction_time_s,
                "response recorded"
            );
        }
        self.trial_cursor += 1;
        self.next_trial(sink);
    }

    /// Terminal abort from any non-terminal phase: drops every pending
    /// deadline, freezes the end timestamps, records the reason, and still
    /// computes metrics over whatever trials exist.
    pub fn abort(&mut self, reason: AbortReason, sink: &mut dyn StimulusSink) {
        if matches!(
            self.phase,
            RunPhase::Idle | RunPhase::Results | RunPhase::Aborted
        ) {
            return;
        }
        let at = self.stopwatch.timestamp_pair();
        self.log.abort(reason, at);
        self.log.metrics = Some(compute_go_nogo_metrics(&self.log));
        sink.clear();
        sink.play_notification(NotificationKind::EndSequence);
        self.phase = RunPhase::Aborted;
        info!("run aborted");
    }

    pub fn phase(&self) -> &RunPhase {
        &self.phase
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, RunPhase::Results | RunPhase::Aborted)
    }

    pub fn log(&self) -> &GoNogoLog<GoNogoConfig> {
        &self.log
    }

    pub fn into_log(self) -> GoNogoLog<GoNogoConfig> {
        self.log
    }

    fn begin_block(&mut self, sink: &mut dyn StimulusSink) {
        if self.block_cursor >= self.config.n_blocks {
            self.finish(sink);
            return;
        }
        let block_number = self.block_cursor + 1;
        info!(block = block_number, "block started");
        let mut block = BlockRecord::begin(block_number, self.stopwatch.timestamp_pair());
        sink.clear();
        let rest = self.stopwatch.timestamp_pair();
        block.rest_start = Some(rest);
        self.log.blocks.push(block);
        self.phase = RunPhase::PreBlockRest {
            until_s: rest.elapsed_s + self.config.rest_duration_s,
        };
    }

    fn begin_task(&mut self, sink: &mut dyn StimulusSink) {
        let at = self.stopwatch.timestamp_pair();
        if let Some(block) = self.log.blocks.last_mut() {
            block.task_start = Some(at);
        }
        self.trial_cursor = 0;
        self.first_trial_in_block = true;
        self.next_trial(sink);
    }

    fn next_trial(&mut self, sink: &mut dyn StimulusSink) {
        let block_len = self
            .schedule
            .get(self.block_cursor)
            .map(Vec::len)
            .unwrap_or(0);
        if self.trial_cursor >= block_len {
            self.finish_block(sink);
            return;
        }
        sink.clear();
        if self.first_trial_in_block {
            self.first_trial_in_block = false;
            self.show_stimulus(sink);
        } else {
            self.phase = RunPhase::TrialGap {
                until_s: self.stopwatch.elapsed_seconds() + self.config.inter_trial_interval_s,
            };
        }
    }

    fn show_stimulus(&mut self, sink: &mut dyn StimulusSink) {
        let Some(spec) = self
            .schedule
            .get(self.block_cursor)
            .and_then(|block| block.get(self.trial_cursor))
            .copied()
        else {
            self.finish_block(sink);
            return;
        };
        sink.show_digit(spec.digit);
        sink.play_notification(NotificationKind::HighBeep);
        let onset = self.stopwatch.timestamp_pair();
        debug!(
            trial = self.trial_cursor + 1,
            digit = spec.digit,
            is_go = spec.is_go,
            "stimulus onset"
        );
        if let Some(block) = self.log.blocks.last_mut() {
            block
                .trials
                .push(TrialRecord::at_onset(self.trial_cursor + 1, spec, onset));
        }
        self.phase = RunPhase::TrialActive {
            stimulus_off_s: onset.elapsed_s + self.config.stimulus_duration_s,
            window_off_s: onset.elapsed_s + self.config.max_response_window_s,
            stimulus_visible: true,
        };
    }

    /// No input arrived before the window closed; the trial resolves on the
    /// no-response branch. Mutually exclusive with `respond` by construction:
    /// whichever fires first replaces `TrialActive`, so the other never runs.
    fn expire_response_window(&mut self, sink: &mut dyn StimulusSink) {
        if let Some(trial) = self.current_trial_mut() {
            trial.resolve(None);
        }
        self.trial_cursor += 1;
        self.next_trial(sink);
    }

    fn finish_block(&mut self, sink: &mut dyn StimulusSink) {
        let finished_block = self.block_cursor + 1;
        let is_last = finished_block >= self.config.n_blocks;
        info!(block = finished_block, "block finished");
        if is_last {
            self.block_cursor += 1;
            self.finish(sink);
            return;
        }
        let post_rest = self.stopwatch.timestamp_pair();
        if let Some(block) = self.log.blocks.last_mut() {
            block.post_rest_start = Some(post_rest);
        }
        self.log
            .inter_block_intervals
            .insert(finished_block, self.stopwatch.timestamp_pair());
        self.block_cursor += 1;
        let total_s =
            self.config.post_block_rest_duration_s + self.config.inter_block_interval_s;
        self.phase = RunPhase::InterBlockRest {
            countdown: Countdown::new(total_s),
            finished_block,
        };
    }

    fn finish(&mut self, sink: &mut dyn StimulusSink) {
        let at = self.stopwatch.timestamp_pair();
        self.log.finish(at);
        self.log.metrics = Some(compute_go_nogo_metrics(&self.log));
        sink.play_notification(NotificationKind::EndSequence);
        self.phase = RunPhase::Results;
        info!("run completed");
    }

    fn current_trial_mut(&mut self) -> Option<&mut TrialRecord> {
        self.log.blocks.last_mut().and_then(|b| b.trials.last_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{RunState, TrialOutcome, VisualCueStyle};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::time::{Duration, Instant};

    /// Sink that remembers what was shown, for asserting on side effects.
    #[derive(Default)]
    struct RecordingSink {
        digits: Vec<u8>,
        notifications: Vec<NotificationKind>,
        rest_ticks: Vec<u64>,
        clears: usize,
    }

    impl StimulusSink for RecordingSink {
        fn show_instruction(&mut self, _kind: InstructionKind) {}
        fn show_digit(&mut self, digit: u8) {
            self.digits.push(digit);
        }
        fn show_block_rest(&mut self, _finished_block: usize, remaining_ms: u64) {
            self.rest_ticks.push(remaining_ms);
        }
        fn clear(&mut self) {
            self.clears += 1;
        }
        fn play_tone(&mut self, _frequency_hz: f64, _duration_ms: u32) {}
        fn play_notification(&mut self, kind: NotificationKind) {
            self.notifications.push(kind);
        }
        fn show_visual_cue(&mut self, _style: &VisualCueStyle, _on_time_ms: u32) {}
        fn hide_visual_cue(&mut self) {}
    }

    fn fast_config(n_blocks: usize, n_trials_per_block: usize) -> GoNogoConfig {
        GoNogoConfig {
            go_digits: vec![0, 1, 2],
            nogo_digits: vec![9],
            n_blocks,
            n_trials_per_block,
            rest_duration_s: 0.01,
            post_block_rest_duration_s: 0.01,
            inter_block_interval_s: 0.02,
            stimulus_duration_s: 0.01,
            inter_trial_interval_s: 0.005,
            max_response_window_s: 0.03,
            test_mode: true,
            ..GoNogoConfig::default()
        }
    }

    fn runner_for(config: GoNogoConfig) -> GoNogoRunner {
        let mut rng = StdRng::seed_from_u64(99);
        let schedule =
            crate::schedule::build_trial_schedule(&config, &mut rng).expect("valid config");
        let meta = RunMeta::new(&config.paradigm_name, "");
        GoNogoRunner::new(config, schedule, meta)
    }

    fn drive_to_completion(
        runner: &mut GoNogoRunner,
        sink: &mut RecordingSink,
        respond_to_every_stimulus: bool,
    ) {
        let deadline = Instant::now() + Duration::from_secs(30);
        let mut responded_digits = 0;
        runner.start(sink);
        while !runner.is_terminal() {
            assert!(Instant::now() < deadline, "runner did not terminate");
            runner.update(sink);
            if respond_to_every_stimulus && sink.digits.len() > responded_digits {
                responded_digits = sink.digits.len();
                runner.respond(sink);
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn completed_run_resolves_every_trial() {
        let mut runner = runner_for(fast_config(2, 4));
        let mut sink = RecordingSink::default();
        drive_to_completion(&mut runner, &mut sink, false);

        let log = runner.into_log();
        assert_eq!(log.status.state, RunState::Completed);
        assert!(log.status.completed());
        assert_eq!(log.blocks.len(), 2);

        let trials: Vec<_> = log.trials().collect();
        assert_eq!(trials.len(), 8);
        for trial in &trials {
            assert!(!trial.outcome.is_pending());
            // No response was ever injected.
            assert!(trial.response.is_none());
            assert!(matches!(
                trial.outcome,
                TrialOutcome::Miss | TrialOutcome::CorrectWithholding
            ));
            assert!(trial.reaction_time_s.is_nan());
        }
        assert!(log.metrics.is_some());
        assert_eq!(log.inter_block_intervals.len(), 1);
        assert!(!sink.rest_ticks.is_empty(), "rest countdown was displayed");
        assert_eq!(sink.digits.len(), 8);
        assert!(sink.clears > 0);
        assert_eq!(
            sink.notifications.first(),
            Some(&NotificationKind::StartSequence)
        );
        assert_eq!(
            sink.notifications.last(),
            Some(&NotificationKind::EndSequence)
        );
    }

    #[test]
    fn responded_trials_are_hits_or_commissions() {
        let mut runner = runner_for(fast_config(1, 6));
        let mut sink = RecordingSink::default();
        drive_to_completion(&mut runner, &mut sink, true);

        let log = runner.into_log();
        assert_eq!(log.status.state, RunState::Completed);
        for trial in log.trials() {
            assert!(trial.response.is_some());
            assert!(trial.reaction_time_s.is_finite());
            assert!(trial.reaction_time_s >= 0.0);
            if trial.is_go {
                assert_eq!(trial.outcome, TrialOutcome::Hit);
            } else {
                assert_eq!(trial.outcome, TrialOutcome::CommissionError);
            }
        }
    }

    #[test]
    fn respond_outside_a_window_is_ignored() {
        let mut runner = runner_for(fast_config(1, 2));
        let mut sink = RecordingSink::default();
        runner.start(&mut sink);
        // Still on the start screen: no trial open, press must be dropped.
        runner.respond(&mut sink);
        assert!(runner.log().trials().next().is_none());
    }

    #[test]
    fn abort_mid_block_freezes_a_consistent_log() {
        let mut runner = runner_for(fast_config(3, 5));
        let mut sink = RecordingSink::default();
        runner.start(&mut sink);

        // Run until the first stimulus is up, then abort.
        let deadline = Instant::now() + Duration::from_secs(10);
        while sink.digits.is_empty() {
            assert!(Instant::now() < deadline, "no stimulus appeared");
            runner.update(&mut sink);
            std::thread::sleep(Duration::from_millis(1));
        }
        runner.abort(AbortReason::EscPressed, &mut sink);
        assert!(runner.is_terminal());

        // Absorbing: further updates and inputs change nothing.
        let trials_before = runner.log().trials().count();
        runner.update(&mut sink);
        runner.respond(&mut sink);
        runner.abort(AbortReason::EscPressed, &mut sink);
        assert_eq!(runner.log().trials().count(), trials_before);

        let log = runner.into_log();
        assert_eq!(log.status.state, RunState::Aborted);
        assert!(!log.status.completed());
        assert_eq!(log.status.abort_reason, Some(AbortReason::EscPressed));
        assert!(log.metrics.is_some(), "metrics still computed on abort");

        let end = log.experiment_end.expect("end pair frozen");
        for block in &log.blocks {
            for stamp in [
                Some(block.block_start),
                block.rest_start,
                block.task_start,
                block.post_rest_start,
            ]
            .into_iter()
            .flatten()
            {
                assert!(end.elapsed_s >= stamp.elapsed_s);
            }
            for trial in &block.trials {
                assert!(end.elapsed_s >= trial.onset.elapsed_s);
            }
        }
    }

    #[test]
    fn block_timeline_is_ordered() {
        let mut runner = runner_for(fast_config(2, 3));
        let mut sink = RecordingSink::default();
        drive_to_completion(&mut runner, &mut sink, false);

        let log = runner.into_log();
        for block in &log.blocks {
            let rest = block.rest_start.expect("rest recorded");
            let task = block.task_start.expect("task recorded");
            assert!(rest.elapsed_s >= block.block_start.elapsed_s);
            assert!(task.elapsed_s >= rest.elapsed_s);
            let mut last = task.elapsed_s;
            for trial in &block.trials {
                assert!(trial.onset.elapsed_s >= last);
                last = trial.onset.elapsed_s;
            }
        }
        // Only the non-final block carries a post-rest marker.
        assert!(log.blocks[0].post_rest_start.is_some());
        assert!(log.blocks[1].post_rest_start.is_none());
    }
}
