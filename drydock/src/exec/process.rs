//! Process-backed command runner.

use super::{CommandRunner, CommandSpec, ProcessExit, Redactor};
use crate::errors::ExecError;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

/// Runs commands as real child processes.
///
/// Stdio is inherited so stage output streams straight to the console,
/// which is what a CI run on a terminal expects.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    redactor: Redactor,
}

impl ProcessRunner {
    /// Creates a runner with the default redactor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn display(&self, spec: &CommandSpec) -> String {
        let mut line = spec.display_line();
        for (_, value) in &spec.secret_env {
            if !value.is_empty() {
                line = line.replace(value.as_str(), "[redacted]");
            }
        }
        self.redactor.mask(&line)
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<ProcessExit, ExecError> {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }
        for (key, value) in spec.env.iter().chain(&spec.secret_env) {
            command.env(key, value);
        }

        info!("running: {}", self.display(spec));

        let mut child = command.spawn().map_err(|source| ExecError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        let status = child.wait().await.map_err(|source| ExecError::Wait {
            program: spec.program.clone(),
            source,
        })?;

        let exit = ProcessExit::from_status(&status);
        debug!(code = ?exit.code, signal = ?exit.signal, "process finished");
        Ok(exit)
    }
}
