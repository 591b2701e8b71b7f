use serde::{Deserialize, Serialize};

use crate::stimulus::InstructionKind;

/// The five parts of one rhythmic-paradigm block, in execution order. The key
/// set is closed; `ORDERED` is the only sequence blocks ever run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockPart {
    RestPre,
    CuedMovement,
    RestInstruction,
    InternalMovement,
    RestPost,
}

impl BlockPart {
    pub const ORDERED: [BlockPart; 5] = [
        BlockPart::RestPre,
        BlockPart::CuedMovement,
        BlockPart::RestInstruction,
        BlockPart::InternalMovement,
        BlockPart::RestPost,
    ];

    /// Only the externally-cued movement part emits a cue train; every other
    /// part is a plain timed wait.
    pub fn emits_cues(self) -> bool {
        matches!(self, BlockPart::CuedMovement)
    }

    pub fn instruction(self) -> InstructionKind {
        match self {
            BlockPart::CuedMovement => InstructionKind::FollowCue,
            BlockPart::InternalMovement => InstructionKind::InternalRhythm,
            BlockPart::RestPre | BlockPart::RestInstruction | BlockPart::RestPost => {
                InstructionKind::Rest
            }
        }
    }
}
