//! Test support.
//!
//! Stage doubles for pipeline tests, exported so downstream crates can
//! test their own pipelines without spawning real processes.

mod mocks;

pub use mocks::{FailingStage, InvocationLog, MockStage, SlowStage};
