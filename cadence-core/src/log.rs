use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::phase::BlockPart;
use crate::timestamp::TimestampPair;
use crate::trial::TrialRecord;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub paradigm_name: String,
    pub software_version: String,
    pub operator: String,
    pub notes: String,
    pub created_at: DateTime<Local>,
}

impl RunMeta {
    pub fn new(paradigm_name: &str, notes: &str) -> Self {
        Self {
            paradigm_name: paradigm_name.to_string(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            operator: String::new(),
            notes: notes.to_string(),
            created_at: Local::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    EscPressed,
    HostShutdown,
    Other(String),
}

/// Terminal status of a run. `Completed` and `Aborted` are mutually
/// exclusive; once either is reached the status never changes again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatus {
    pub state: RunState,
    pub abort_reason: Option<AbortReason>,
    pub abort_time: Option<TimestampPair>,
}

impl RunStatus {
    pub fn new() -> Self {
        Self {
            state: RunState::NotStarted,
            abort_reason: None,
            abort_time: None,
        }
    }

    pub fn completed(&self) -> bool {
        self.state == RunState::Completed
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, RunState::Completed | RunState::Aborted)
    }
}

impl Default for RunStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-block timeline of the discrete-trial paradigm. Fields are filled in
/// strictly increasing temporal order and never revisited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRecord {
    pub block_index: usize,
    pub block_start: TimestampPair,
    pub rest_start: Option<TimestampPair>,
    pub task_start: Option<TimestampPair>,
    pub post_rest_start: Option<TimestampPair>,
    pub trials: Vec<TrialRecord>,
}

impl BlockRecord {
    pub fn begin(block_index: usize, block_start: TimestampPair) -> Self {
        Self {
            block_index,
            block_start,
            rest_start: None,
            task_start: None,
            post_rest_start: None,
            trials: Vec::new(),
        }
    }
}

/// Aggregate statistics over a finished discrete-trial log. `None` marks a
/// value whose denominator was empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoNogoMetrics {
    pub go_hit_percent: Option<f64>,
    pub nogo_commission_percent: Option<f64>,
    pub mean_rt_go_hit: Option<f64>,
    pub mean_rt_nogo_commission: Option<f64>,
}

/// Complete record of one discrete-trial run. Owned and mutated exclusively
/// by the runner, then handed off by value.
#[derive(Debug, Clone, Serialize)]
pub struct GoNogoLog<C> {
    pub meta: RunMeta,
    pub config: C,
    pub experiment_start: Option<TimestampPair>,
    pub experiment_end: Option<TimestampPair>,
    pub blocks: Vec<BlockRecord>,
    pub inter_block_intervals: BTreeMap<usize, TimestampPair>,
    pub status: RunStatus,
    pub metrics: Option<GoNogoMetrics>,
}

impl<C> GoNogoLog<C> {
    pub fn new(meta: RunMeta, config: C) -> Self {
        Self {
            meta,
            config,
            experiment_start: None,
            experiment_end: None,
            blocks: Vec::new(),
            inter_block_intervals: BTreeMap::new(),
            status: RunStatus::new(),
            metrics: None,
        }
    }

    pub fn start(&mut self, at: TimestampPair) {
        self.experiment_start = Some(at);
        self.status.state = RunState::Running;
    }

    /// Natural completion. Writes the end pair exactly once; a no-op if the
    /// run already reached a terminal state.
    pub fn finish(&mut self, at: TimestampPair) {
        if self.status.is_terminal() {
            return;
        }
        self.experiment_end = Some(at);
        self.status.state = RunState::Completed;
    }

    /// Terminal abort. The end pair and abort time are the same instant.
    pub fn abort(&mut self, reason: AbortReason, at: TimestampPair) {
        if self.status.is_terminal() {
            return;
        }
        self.experiment_end = Some(at);
        self.status.state = RunState::Aborted;
        self.status.abort_reason = Some(reason);
        self.status.abort_time = Some(at);
    }

    pub fn trials(&self) -> impl Iterator<Item = &TrialRecord> {
        self.blocks.iter().flat_map(|b| b.trials.iter())
    }
}

/// Start time and planned length of one part of one rhythmic block, plus the
/// cue emission times observed while it ran.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartRecord {
    pub start: Option<TimestampPair>,
    pub planned_duration_s: f64,
    pub cue_events: Vec<TimestampPair>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalRecord {
    pub start: TimestampPair,
    pub planned_duration_s: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RhythmBlockRecord {
    pub block_index: usize,
    pub block_start: Option<TimestampPair>,
    pub parts: BTreeMap<BlockPart, PartRecord>,
    pub interval_after_block: Option<IntervalRecord>,
}

impl RhythmBlockRecord {
    pub fn empty(block_index: usize) -> Self {
        let parts = BlockPart::ORDERED
            .into_iter()
            .map(|p| (p, PartRecord::default()))
            .collect();
        Self {
            block_index,
            block_start: None,
            parts,
            interval_after_block: None,
        }
    }
}

/// Complete record of one rhythmic-paradigm run.
#[derive(Debug, Clone, Serialize)]
pub struct RhythmLog<C> {
    pub meta: RunMeta,
    pub config: C,
    pub paradigm_start: Option<TimestampPair>,
    pub paradigm_end: Option<TimestampPair>,
    pub blocks: Vec<RhythmBlockRecord>,
    pub status: RunStatus,
}

impl<C> RhythmLog<C> {
    pub fn new(meta: RunMeta, config: C) -> Self {
        Self {
            meta,
            config,
            paradigm_start: None,
            paradigm_end: None,
            blocks: Vec::new(),
            status: RunStatus::new(),
        }
    }

    pub fn start(&mut self, at: TimestampPair) {
        self.paradigm_start = Some(at);
        self.status.state = RunState::Running;
    }

    /// Pre-create every block record so cue events can be appended without
    /// reshaping the log mid-run.
    pub fn init_blocks(&mut self, num_blocks: usize) {
        self.blocks = (0..num_blocks).map(RhythmBlockRecord::empty).collect();
    }

    pub fn mark_block_start(&mut self, block_index: usize, at: TimestampPair) {
        if let Some(block) = self.blocks.get_mut(block_index) {
            block.block_start = Some(at);
        }
    }

    pub fn mark_part_start(
        &mut self,
        block_index: usize,
        part: BlockPart,
        planned_duration_s: f64,
        at: TimestampPair,
    ) {
        if let Some(record) = self
            .blocks
            .get_mut(block_index)
            .and_then(|b| b.parts.get_mut(&part))
        {
            record.start = Some(at);
            record.planned_duration_s = planned_duration_s;
        }
    }

    pub fn log_cue(&mut self, block_index: usize, part: BlockPart, at: TimestampPair) {
        if let Some(record) = self
            .blocks
            .get_mut(block_index)
            .and_then(|b| b.parts.get_mut(&part))
        {
            record.cue_events.push(at);
        }
    }

    pub fn mark_interval_start(
        &mut self,
        block_index: usize,
        planned_duration_s: f64,
        at: TimestampPair,
    ) {
        if let Some(block) = self.blocks.get_mut(block_index) {
            block.interval_after_block = Some(IntervalRecord {
                start: at,
                planned_duration_s,
            });
        }
    }

    pub fn finish(&mut self, at: TimestampPair) {
        if self.status.is_terminal() {
            return;
        }
        self.paradigm_end = Some(at);
        self.status.state = RunState::Completed;
    }

    pub fn abort(&mut self, reason: AbortReason, at: TimestampPair) {
        if self.status.is_terminal() {
            return;
        }
        self.paradigm_end = Some(at);
        self.status.state = RunState::Aborted;
        self.status.abort_reason = Some(reason);
        self.status.abort_time = Some(at);
    }
}
