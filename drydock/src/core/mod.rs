//! Core types shared across the runner.

mod outcome;
mod status;

pub use outcome::{FailureCause, StageOutcome};
pub use status::StageStatus;
