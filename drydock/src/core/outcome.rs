//! Stage outcome and failure cause types.

use crate::core::StageStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Why a stage failed.
///
/// Mirrors what the underlying external action can report: a non-zero exit
/// code, death by signal, or an error raised before a process exit was
/// observed (spawn failure, missing file, rejected upload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// The external process exited with a non-zero code.
    ExitCode(i32),
    /// The external process was terminated by a signal.
    Signal(i32),
    /// The stage errored without an observable exit status.
    Error(String),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExitCode(code) => write!(f, "exit code {code}"),
            Self::Signal(signal) => write!(f, "signal {signal}"),
            Self::Error(message) => write!(f, "{message}"),
        }
    }
}

/// The result of executing a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutcome {
    /// Terminal status of the stage.
    pub status: StageStatus,
    /// Why the stage failed, when it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<FailureCause>,
    /// Data reported by the stage (artifact digests, image tags, ...).
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl StageOutcome {
    /// Creates a successful outcome with no data.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: StageStatus::Succeeded,
            cause: None,
            data: HashMap::new(),
        }
    }

    /// Creates a successful outcome carrying data.
    #[must_use]
    pub fn ok_with(data: HashMap<String, serde_json::Value>) -> Self {
        Self {
            status: StageStatus::Succeeded,
            cause: None,
            data,
        }
    }

    /// Creates a failed outcome with a cause.
    #[must_use]
    pub fn fail(cause: FailureCause) -> Self {
        Self {
            status: StageStatus::Failed,
            cause: Some(cause),
            data: HashMap::new(),
        }
    }

    /// Creates a failed outcome from an error message.
    #[must_use]
    pub fn fail_message(message: impl Into<String>) -> Self {
        Self::fail(FailureCause::Error(message.into()))
    }

    /// Adds a data entry.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Returns true if the stage succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns true if the stage failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }

    /// Returns a data value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_outcome() {
        let outcome = StageOutcome::ok();
        assert!(outcome.is_success());
        assert!(!outcome.is_failure());
        assert!(outcome.cause.is_none());
        assert!(outcome.data.is_empty());
    }

    #[test]
    fn test_fail_outcome() {
        let outcome = StageOutcome::fail(FailureCause::ExitCode(1));
        assert!(outcome.is_failure());
        assert_eq!(outcome.cause, Some(FailureCause::ExitCode(1)));
    }

    #[test]
    fn test_fail_message_outcome() {
        let outcome = StageOutcome::fail_message("upload rejected");
        assert!(outcome.is_failure());
        assert_eq!(
            outcome.cause,
            Some(FailureCause::Error("upload rejected".to_string()))
        );
    }

    #[test]
    fn test_with_entry() {
        let outcome = StageOutcome::ok()
            .with_entry("image", serde_json::json!("buildenv:latest"))
            .with_entry("size_bytes", serde_json::json!(1024));

        assert_eq!(outcome.get("image"), Some(&serde_json::json!("buildenv:latest")));
        assert_eq!(outcome.get("size_bytes"), Some(&serde_json::json!(1024)));
        assert_eq!(outcome.get("missing"), None);
    }

    #[test]
    fn test_failure_cause_display() {
        assert_eq!(FailureCause::ExitCode(1).to_string(), "exit code 1");
        assert_eq!(FailureCause::Signal(9).to_string(), "signal 9");
        assert_eq!(
            FailureCause::Error("spawn failed".to_string()).to_string(),
            "spawn failed"
        );
    }

    #[test]
    fn test_failure_cause_serialize() {
        let cause = FailureCause::ExitCode(7);
        let json = serde_json::to_string(&cause).unwrap();
        assert_eq!(json, r#"{"exit_code":7}"#);

        let deserialized: FailureCause = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, cause);
    }

    #[test]
    fn test_outcome_serialize_skips_empty_cause() {
        let outcome = StageOutcome::ok();
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(!json.contains("cause"));
    }
}
