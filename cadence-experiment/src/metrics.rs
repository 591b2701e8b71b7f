use cadence_core::{GoNogoLog, GoNogoMetrics, TrialOutcome, TrialRecord};

/// Aggregate hit/commission rates and mean reaction times from a finished
/// (or aborted) Go/No-Go log. Pure function; any metric whose denominator is
/// empty comes back as `None`.
pub fn compute_go_nogo_metrics<C>(log: &GoNogoLog<C>) -> GoNogoMetrics {
    let go: Vec<&TrialRecord> = log.trials().filter(|t| t.is_go).collect();
    let nogo: Vec<&TrialRecord> = log.trials().filter(|t| !t.is_go).collect();

    let hits: Vec<&TrialRecord> = go
        .iter()
        .copied()
        .filter(|t| t.outcome == TrialOutcome::Hit)
        .collect();
    let commissions: Vec<&TrialRecord> = nogo
        .iter()
        .copied()
        .filter(|t| t.outcome == TrialOutcome::CommissionError)
        .collect();

    GoNogoMetrics {
        go_hit_percent: percent(hits.len(), go.len()),
        nogo_commission_percent: percent(commissions.len(), nogo.len()),
        mean_rt_go_hit: mean_reaction_time(hits.iter().copied()),
        mean_rt_nogo_commission: mean_reaction_time(commissions.iter().copied()),
    }
}

fn percent(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    Some(numerator as f64 / denominator as f64 * 100.0)
}

fn mean_reaction_time<'a>(trials: impl Iterator<Item = &'a TrialRecord>) -> Option<f64> {
    let rts: Vec<f64> = trials
        .map(|t| t.reaction_time_s)
        .filter(|rt| rt.is_finite())
        .collect();
    if rts.is_empty() {
        return None;
    }
    Some(rts.iter().sum::<f64>() / rts.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{BlockRecord, RunMeta, TimestampPair, TrialSpec};
    use chrono::Local;

    fn pair(elapsed_s: f64) -> TimestampPair {
        TimestampPair::new(Local::now(), elapsed_s)
    }

    fn trial(index: usize, digit: u8, is_go: bool, response_delay_s: Option<f64>) -> TrialRecord {
        let onset = pair(index as f64);
        let mut record = TrialRecord::at_onset(index, TrialSpec { digit, is_go }, onset);
        record.resolve(response_delay_s.map(|d| pair(onset.elapsed_s + d)));
        record
    }

    fn log_with(trials: Vec<TrialRecord>) -> GoNogoLog<()> {
        let mut log = GoNogoLog::new(RunMeta::new("GoNoGo", ""), ());
        let mut block = BlockRecord::begin(1, pair(0.0));
        block.trials = trials;
        log.blocks.push(block);
        log
    }

    #[test]
    fn rates_and_reaction_times() {
        let log = log_with(vec![
            trial(1, 1, true, Some(0.30)),
            trial(2, 2, true, Some(0.50)),
            trial(3, 3, true, None),
            trial(4, 9, false, None),
            trial(5, 9, false, Some(0.20)),
        ]);
        let metrics = compute_go_nogo_metrics(&log);

        let hit = metrics.go_hit_percent.expect("go trials exist");
        assert!((hit - 200.0 / 3.0).abs() < 1e-9);
        let commission = metrics.nogo_commission_percent.expect("nogo trials exist");
        assert!((commission - 50.0).abs() < 1e-9);
        let mean_rt = metrics.mean_rt_go_hit.expect("hits exist");
        assert!((mean_rt - 0.40).abs() < 1e-9);
        let mean_commission_rt = metrics.mean_rt_nogo_commission.expect("commissions exist");
        assert!((mean_commission_rt - 0.20).abs() < 1e-9);
    }

    #[test]
    fn empty_denominators_are_unavailable() {
        let metrics = compute_go_nogo_metrics(&log_with(vec![]));
        assert_eq!(metrics.go_hit_percent, None);
        assert_eq!(metrics.nogo_commission_percent, None);
        assert_eq!(metrics.mean_rt_go_hit, None);
        assert_eq!(metrics.mean_rt_nogo_commission, None);
    }

    #[test]
    fn misses_do_not_contribute_reaction_times() {
        let log = log_with(vec![trial(1, 1, true, None), trial(2, 9, false, None)]);
        let metrics = compute_go_nogo_metrics(&log);
        assert_eq!(metrics.go_hit_percent, Some(0.0));
        assert_eq!(metrics.mean_rt_go_hit, None);
        assert_eq!(metrics.nogo_commission_percent, Some(0.0));
    }
}
