use serde::{Deserialize, Serialize};

use crate::timestamp::TimestampPair;

/// A single planned trial: which digit to show and whether it belongs to the
/// respond ("go") or withhold ("no-go") class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSpec {
    pub digit: u8,
    pub is_go: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialOutcome {
    Hit,
    Miss,
    CommissionError,
    CorrectWithholding,
    Pending,
}

impl TrialOutcome {
    /// Outcome is a pure function of the trial class and whether any
    /// qualifying response arrived inside the window.
    pub fn classify(is_go: bool, responded: bool) -> Self {
        match (is_go, responded) {
            (true, true) => TrialOutcome::Hit,
            (true, false) => TrialOutcome::Miss,
            (false, true) => TrialOutcome::CommissionError,
            (false, false) => TrialOutcome::CorrectWithholding,
        }
    }

    pub fn is_pending(self) -> bool {
        self == TrialOutcome::Pending
    }
}

/// Log entry for one trial. Created at stimulus onset with a `Pending`
/// outcome, then resolved exactly once, either by the first qualifying
/// response or by response-window expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialRecord {
    pub trial_index: usize,
    pub digit: u8,
    pub is_go: bool,
    pub onset: TimestampPair,
    pub response: Option<TimestampPair>,
    pub response_key: Option<String>,
    pub outcome: TrialOutcome,
    /// NaN until a response is recorded; reaction times only exist for
    /// responded trials.
    pub reaction_time_s: f64,
}

impl TrialRecord {
    pub fn at_onset(trial_index: usize, spec: TrialSpec, onset: TimestampPair) -> Self {
        Self {
            trial_index,
            digit: spec.digit,
            is_go: spec.is_go,
            onset,
            response: None,
            response_key: None,
            outcome: TrialOutcome::Pending,
            reaction_time_s: f64::NAN,
        }
    }

    /// Fill in the response fields and classify the outcome. `None` means the
    /// window expired without input.
    pub fn resolve(&mut self, response: Option<TimestampPair>) {
        self.outcome = TrialOutcome::classify(self.is_go, response.is_some());
        if let Some(at) = response {
            self.reaction_time_s = at.seconds_since(&self.onset);
            self.response_key = Some("space".to_string());
        }
        self.response = response;
    }

    pub fn responded(&self) -> bool {
        self.response.is_some()
    }
}
