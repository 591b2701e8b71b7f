use std::time::{Duration, Instant};

use crate::periodic::PeriodicSchedule;
use crate::sleep::high_precision_sleep;

/// Tick gate for the host-polled countdown.
pub const UI_TICK_INTERVAL: Duration = Duration::from_millis(50);
/// Sleep step for the blocking countdown loop.
pub const BLOCKING_STEP: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    Tick { remaining_ms: u64 },
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownOutcome {
    Completed,
    Aborted,
}

/// Cooperative countdown, polled by the host loop.
///
/// The first poll emits a tick with the full remaining time rounded up to the
/// millisecond; later ticks are gated to the configured interval. Remaining
/// time is always recomputed from the monotonic clock, never accumulated from
/// tick counts. The poll on which remaining reaches zero emits `Tick { 0 }`;
/// the next poll emits `Finished` exactly once. `cancel` suppresses
/// `Finished` and is idempotent.
#[derive(Debug, Clone)]
pub struct Countdown {
    start: Instant,
    duration_s: f64,
    ticks: PeriodicSchedule,
    started: bool,
    reached_zero: bool,
    finished: bool,
    cancelled: bool,
}

impl Countdown {
    /// Negative durations clamp to zero: one `Tick { 0 }`, then `Finished`.
    pub fn new(duration_s: f64) -> Self {
        Self::with_interval(duration_s, UI_TICK_INTERVAL)
    }

    pub fn with_interval(duration_s: f64, interval: Duration) -> Self {
        Self {
            start: Instant::now(),
            duration_s: duration_s.max(0.0),
            ticks: PeriodicSchedule::new(0.0, interval.as_secs_f64()),
            started: false,
            reached_zero: false,
            finished: false,
            cancelled: false,
        }
    }

    pub fn remaining_ms(&self) -> u64 {
        remaining_ms(self.duration_s, self.start.elapsed().as_secs_f64())
    }

    pub fn poll(&mut self) -> Option<CountdownEvent> {
        if self.cancelled || self.finished {
            return None;
        }
        if self.reached_zero {
            self.finished = true;
            return Some(CountdownEvent::Finished);
        }

        let now_s = self.start.elapsed().as_secs_f64();
        let ms = remaining_ms(self.duration_s, now_s);

        if !self.started {
            self.started = true;
            self.ticks.fire_due_coalesced(now_s);
            if ms == 0 {
                self.reached_zero = true;
            }
            return Some(CountdownEvent::Tick { remaining_ms: ms });
        }

        if ms == 0 {
            self.reached_zero = true;
            return Some(CountdownEvent::Tick { remaining_ms: 0 });
        }

        if self.ticks.fire_due_coalesced(now_s) {
            return Some(CountdownEvent::Tick { remaining_ms: ms });
        }
        None
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// True once `Finished` has been emitted (natural completion only).
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Blocking countdown loop for contexts that own their thread.
///
/// Checks `should_abort` every iteration, calls `on_tick` only when the
/// millisecond bucket changes (including the final zero), and sleeps `step`
/// between polls with the high-precision sleep. The caller's completion
/// action must run only on `Completed`.
pub fn run_blocking_countdown(
    duration_s: f64,
    step: Duration,
    mut on_tick: impl FnMut(u64),
    mut should_abort: impl FnMut() -> bool,
) -> CountdownOutcome {
    let duration_s = duration_s.max(0.0);
    let start = Instant::now();
    let mut last_ms: Option<u64> = None;
    loop {
        if should_abort() {
            return CountdownOutcome::Aborted;
        }
        let elapsed = start.elapsed().as_secs_f64();
        let ms = remaining_ms(duration_s, elapsed);
        if last_ms != Some(ms) {
            on_tick(ms);
            last_ms = Some(ms);
        }
        if elapsed >= duration_s {
            return CountdownOutcome::Completed;
        }
        high_precision_sleep(step);
    }
}

/// `%06.3fs` countdown string, monospace-friendly.
pub fn format_countdown_text(remaining_ms: u64) -> String {
    format!("{:06.3}s", remaining_ms as f64 / 1000.0)
}

fn remaining_ms(duration_s: f64, elapsed_s: f64) -> u64 {
    (((duration_s - elapsed_s) * 1000.0).ceil()).max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(countdown: &mut Countdown, budget: Duration) -> Vec<CountdownEvent> {
        let deadline = Instant::now() + budget;
        let mut events = Vec::new();
        while Instant::now() < deadline {
            match countdown.poll() {
                Some(CountdownEvent::Finished) => {
                    events.push(CountdownEvent::Finished);
                    break;
                }
                Some(event) => events.push(event),
                None => std::thread::sleep(Duration::from_millis(1)),
            }
        }
        events
    }

    #[test]
    fn zero_duration_is_one_tick_then_finished() {
        let mut countdown = Countdown::new(0.0);
        assert_eq!(
            countdown.poll(),
            Some(CountdownEvent::Tick { remaining_ms: 0 })
        );
        assert_eq!(countdown.poll(), Some(CountdownEvent::Finished));
        assert_eq!(countdown.poll(), None);
    }

    #[test]
    fn negative_duration_clamps_to_zero() {
        let mut countdown = Countdown::new(-3.0);
        assert_eq!(
            countdown.poll(),
            Some(CountdownEvent::Tick { remaining_ms: 0 })
        );
        assert_eq!(countdown.poll(), Some(CountdownEvent::Finished));
    }

    #[test]
    fn ticks_are_non_increasing_and_end_at_zero() {
        let mut countdown = Countdown::with_interval(0.08, Duration::from_millis(10));
        let events = drain(&mut countdown, Duration::from_secs(2));

        let ticks: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                CountdownEvent::Tick { remaining_ms } => Some(*remaining_ms),
                CountdownEvent::Finished => None,
            })
            .collect();
        assert!(ticks.len() >= 2, "initial tick plus final zero expected");
        assert!(ticks.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(*ticks.last().expect("at least one tick"), 0);
        assert_eq!(events.last(), Some(&CountdownEvent::Finished));
    }

    #[test]
    fn initial_tick_is_full_duration_rounded_up() {
        let mut countdown = Countdown::new(2.5);
        match countdown.poll() {
            Some(CountdownEvent::Tick { remaining_ms }) => {
                assert!(remaining_ms <= 2500);
                assert!(remaining_ms > 2400);
            }
            other => panic!("expected initial tick, got {other:?}"),
        }
        countdown.cancel();
    }

    #[test]
    fn cancel_is_idempotent_and_suppresses_finished() {
        let mut countdown = Countdown::new(0.0);
        assert!(countdown.poll().is_some());
        countdown.cancel();
        countdown.cancel();
        assert!(countdown.is_cancelled());
        assert_eq!(countdown.poll(), None);
        assert!(!countdown.is_finished());
    }

    #[test]
    fn blocking_countdown_completes_with_final_zero_tick() {
        let mut ticks = Vec::new();
        let outcome = run_blocking_countdown(
            0.05,
            Duration::from_millis(5),
            |ms| ticks.push(ms),
            || false,
        );
        assert_eq!(outcome, CountdownOutcome::Completed);
        assert!(ticks.windows(2).all(|w| w[1] < w[0]), "deduped ticks decrease");
        assert_eq!(*ticks.last().expect("ticks recorded"), 0);
    }

    #[test]
    fn blocking_countdown_abort_fires_no_ticks() {
        let mut ticks = Vec::new();
        let outcome = run_blocking_countdown(
            1.0,
            Duration::from_millis(5),
            |ms| ticks.push(ms),
            || true,
        );
        assert_eq!(outcome, CountdownOutcome::Aborted);
        assert!(ticks.is_empty());
    }

    #[test]
    fn countdown_text_is_fixed_width() {
        assert_eq!(format_countdown_text(5000), "05.000s");
        assert_eq!(format_countdown_text(0), "00.000s");
        assert_eq!(format_countdown_text(123456), "123.456s");
    }
}
