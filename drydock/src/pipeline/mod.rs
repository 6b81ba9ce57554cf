//! Pipeline building and execution.
//!
//! This module provides:
//! - Pipeline builder with validation
//! - Sequential, fail-fast execution
//! - Run reports

mod builder;
mod report;
mod runner;

#[cfg(test)]
mod integration_tests;

pub use builder::PipelineBuilder;
pub use report::{RunOutcome, RunReport, StageRecord};
pub use runner::Pipeline;
