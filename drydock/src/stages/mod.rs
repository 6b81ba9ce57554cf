//! Stage trait and implementations.
//!
//! Stages are the units of work a pipeline executes in order. Each stage
//! performs exactly one external action and reports success or failure
//! through its outcome.

mod command;
mod docker;
#[cfg(feature = "upload")]
mod upload;

pub use command::CommandStage;
pub use docker::{ContainerRunStage, ImageBuildStage};
#[cfg(feature = "upload")]
pub use upload::UploadStage;

use crate::context::RunContext;
use crate::core::StageOutcome;
use crate::exec::{CommandRunner, CommandSpec};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt::Debug;

/// Trait for pipeline stages.
///
/// A stage is a named unit of work. Once registered in a pipeline it is
/// immutable; all of its effects are external.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Executes the stage.
    ///
    /// Failures are reported through the returned outcome; a stage must
    /// not panic on an expected failure such as a non-zero exit.
    async fn execute(&self, ctx: &RunContext) -> StageOutcome;
}

/// Runs a command through the runner and maps its exit to an outcome.
///
/// Spawn and wait errors become failure outcomes, not panics.
pub(crate) async fn run_to_outcome(runner: &dyn CommandRunner, spec: &CommandSpec) -> StageOutcome {
    match runner.run(spec).await {
        Ok(exit) => exit
            .failure_cause()
            .map_or_else(StageOutcome::ok, StageOutcome::fail),
        Err(err) => StageOutcome::fail_message(err.to_string()),
    }
}

/// A simple function-based stage.
pub struct FnStage<F>
where
    F: Fn(&RunContext) -> StageOutcome + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(&RunContext) -> StageOutcome + Send + Sync,
{
    /// Creates a new function-based stage.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnStage<F>
where
    F: Fn(&RunContext) -> StageOutcome + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(&RunContext) -> StageOutcome + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &RunContext) -> StageOutcome {
        (self.func)(ctx)
    }
}

/// An async function-based stage.
///
/// The future is boxed so the stage type stays object-safe regardless of
/// the closure's concrete future.
pub struct AsyncFnStage {
    name: String,
    func: Box<dyn Fn(RunContext) -> BoxFuture<'static, StageOutcome> + Send + Sync>,
}

impl AsyncFnStage {
    /// Creates a new async function-based stage.
    pub fn new<F, Fut>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(RunContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = StageOutcome> + Send + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(move |ctx| Box::pin(func(ctx))),
        }
    }
}

impl Debug for AsyncFnStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFnStage")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl Stage for AsyncFnStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &RunContext) -> StageOutcome {
        (self.func)(ctx.clone()).await
    }
}

/// A no-op stage that always succeeds.
#[derive(Debug, Clone)]
pub struct NoOpStage {
    name: String,
}

impl NoOpStage {
    /// Creates a new no-op stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Stage for NoOpStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &RunContext) -> StageOutcome {
        StageOutcome::ok()
    }
}
