pub mod abort;
pub mod countdown;
pub mod periodic;
pub mod sleep;
pub mod stopwatch;

pub use abort::AbortFlag;
pub use countdown::{
    format_countdown_text, run_blocking_countdown, Countdown, CountdownEvent, CountdownOutcome,
    BLOCKING_STEP, UI_TICK_INTERVAL,
};
pub use periodic::PeriodicSchedule;
pub use sleep::high_precision_sleep;
pub use stopwatch::Stopwatch;
