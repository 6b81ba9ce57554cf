//! Stage that runs a single external command.

use super::{run_to_outcome, Stage};
use crate::context::RunContext;
use crate::core::StageOutcome;
use crate::exec::{CommandRunner, CommandSpec, ProcessRunner};
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Runs one external command and succeeds when it exits zero.
///
/// This is the generic leaf stage; anything a shell one-liner can do
/// fits here.
pub struct CommandStage {
    name: String,
    spec: CommandSpec,
    runner: Arc<dyn CommandRunner>,
}

impl CommandStage {
    /// Creates a stage that runs the given command.
    #[must_use]
    pub fn new(name: impl Into<String>, spec: CommandSpec) -> Self {
        Self {
            name: name.into(),
            spec,
            runner: Arc::new(ProcessRunner::new()),
        }
    }

    /// Replaces the command runner.
    #[must_use]
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Returns the command this stage will run.
    #[must_use]
    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }
}

impl Debug for CommandStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandStage")
            .field("name", &self.name)
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Stage for CommandStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &RunContext) -> StageOutcome {
        run_to_outcome(self.runner.as_ref(), &self.spec).await
    }
}
