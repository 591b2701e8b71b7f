pub mod log;
pub mod phase;
pub mod stimulus;
pub mod timestamp;
pub mod trial;

pub use log::{
    AbortReason, BlockRecord, GoNogoLog, GoNogoMetrics, IntervalRecord, PartRecord,
    RhythmBlockRecord, RhythmLog, RunMeta, RunState, RunStatus,
};
pub use phase::BlockPart;
pub use stimulus::{CueKind, InstructionKind, NotificationKind, NullSink, StimulusSink, VisualCueStyle};
pub use timestamp::TimestampPair;
pub use trial::{TrialOutcome, TrialRecord, TrialSpec};
