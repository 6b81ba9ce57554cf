//! Command execution layer.
//!
//! Stages describe the process they need as a [`CommandSpec`] and hand it
//! to a [`CommandRunner`]. The production runner spawns real processes;
//! tests substitute a mock.

mod process;
mod redact;

pub use process::ProcessRunner;
pub use redact::Redactor;

use crate::core::FailureCause;
use crate::errors::ExecError;
use async_trait::async_trait;
use std::path::PathBuf;

/// Description of a process to spawn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandSpec {
    /// Program to execute.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
    /// Working directory, when different from the caller's.
    pub current_dir: Option<PathBuf>,
    /// Environment variables safe to show in logs.
    pub env: Vec<(String, String)>,
    /// Environment variables whose values are masked in logs.
    pub secret_env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Creates a spec for the given program with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Appends a single argument.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Adds an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Adds an environment variable whose value must not be logged.
    #[must_use]
    pub fn with_secret_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.secret_env.push((key.into(), value.into()));
        self
    }

    /// Renders the command as a single line for logging.
    ///
    /// Arguments containing whitespace are quoted. Secret values are the
    /// caller's problem; [`ProcessRunner`] masks them before logging.
    #[must_use]
    pub fn display_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                parts.push(format!("'{arg}'"));
            } else {
                parts.push(arg.clone());
            }
        }
        parts.join(" ")
    }
}

/// How a spawned process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    /// Exit code, when the process exited normally.
    pub code: Option<i32>,
    /// Terminating signal, when the process was killed (unix only).
    pub signal: Option<i32>,
}

impl ProcessExit {
    /// Creates an exit with the given code.
    #[must_use]
    pub fn with_code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    /// Creates an exit for a process killed by a signal.
    #[must_use]
    pub fn with_signal(signal: i32) -> Self {
        Self {
            code: None,
            signal: Some(signal),
        }
    }

    /// Extracts code and signal from an exit status.
    #[must_use]
    pub fn from_status(status: &std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }

    /// Returns true when the process exited with code zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Maps a non-successful exit to its failure cause.
    ///
    /// Returns `None` for a successful exit.
    #[must_use]
    pub fn failure_cause(&self) -> Option<FailureCause> {
        if self.success() {
            return None;
        }
        match (self.code, self.signal) {
            (Some(code), _) => Some(FailureCause::ExitCode(code)),
            (None, Some(signal)) => Some(FailureCause::Signal(signal)),
            (None, None) => Some(FailureCause::Error(
                "process terminated without an exit status".to_string(),
            )),
        }
    }
}

/// Trait for spawning processes and waiting for them to finish.
///
/// Stages depend on this trait instead of `tokio::process` directly so
/// tests can substitute a mock runner.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the command to completion and reports how it exited.
    ///
    /// # Errors
    ///
    /// Returns an error when the process cannot be spawned or waited on.
    /// A process that runs and exits non-zero is NOT an error here; that
    /// is reported through [`ProcessExit`].
    async fn run(&self, spec: &CommandSpec) -> Result<ProcessExit, ExecError>;
}
