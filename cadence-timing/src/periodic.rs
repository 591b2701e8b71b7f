/// Drift-free periodic schedule. The next fire time advances by adding the
/// period to the previous scheduled time, never by recomputing from
/// `elapsed / period`, so a late poll delays one fire without shifting the
/// rest of the train. Used by the cue train and by countdown tick gating.
#[derive(Debug, Clone)]
pub struct PeriodicSchedule {
    next_s: f64,
    period_s: f64,
}

impl PeriodicSchedule {
    /// `period_s` must be positive.
    pub fn new(start_s: f64, period_s: f64) -> Self {
        debug_assert!(period_s > 0.0);
        Self {
            next_s: start_s,
            period_s,
        }
    }

    pub fn period_s(&self) -> f64 {
        self.period_s
    }

    pub fn next_s(&self) -> f64 {
        self.next_s
    }

    /// If the scheduled time has arrived, advance the schedule by one period
    /// and report that a fire is due. A caller that fell behind sees one fire
    /// per call until it has caught up.
    pub fn fire_due(&mut self, now_s: f64) -> bool {
        if now_s >= self.next_s {
            self.next_s += self.period_s;
            true
        } else {
            false
        }
    }

    /// Drain every overdue slot, reporting whether at least one was due.
    /// For consumers that want a single coalesced fire after a stall.
    pub fn fire_due_coalesced(&mut self, now_s: f64) -> bool {
        let mut fired = false;
        while self.fire_due(now_s) {
            fired = true;
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_at_exact_multiples_of_the_period() {
        // 2 Hz over 3 s: fires at t = 0, 0.5, ..., 2.5.
        let mut schedule = PeriodicSchedule::new(0.0, 0.5);
        let mut fire_times = Vec::new();
        let mut now = 0.0;
        while now < 3.0 {
            if schedule.fire_due(now) {
                fire_times.push(now);
            }
            now += 0.001;
        }
        assert_eq!(fire_times.len(), 6);
        for (i, t) in fire_times.iter().enumerate() {
            assert!((t - i as f64 * 0.5).abs() < 0.002);
        }
    }

    #[test]
    fn late_poll_does_not_shift_the_schedule() {
        let mut schedule = PeriodicSchedule::new(0.0, 0.5);
        assert!(schedule.fire_due(0.0));
        // Poll arrives 0.3 s late for the t=0.5 fire.
        assert!(schedule.fire_due(0.8));
        // The following fire is still anchored at t=1.0, not 1.3.
        assert!(!schedule.fire_due(0.9));
        assert!(schedule.fire_due(1.0));
    }

    #[test]
    fn catches_up_one_fire_per_call() {
        let mut schedule = PeriodicSchedule::new(0.0, 0.5);
        // Stall past three scheduled fires.
        assert!(schedule.fire_due(1.2));
        assert!(schedule.fire_due(1.2));
        assert!(schedule.fire_due(1.2));
        assert!(!schedule.fire_due(1.2));
    }

    #[test]
    fn coalesced_drain_skips_missed_slots() {
        let mut schedule = PeriodicSchedule::new(0.0, 0.5);
        assert!(schedule.fire_due_coalesced(1.2));
        assert!(!schedule.fire_due_coalesced(1.2));
        assert!(schedule.fire_due_coalesced(1.5));
    }
}
