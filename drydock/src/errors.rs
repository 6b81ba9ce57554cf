//! Error types for the drydock runner.
//!
//! The error taxonomy is deliberately small: configuration problems are
//! surfaced before any stage executes, and everything that goes wrong while
//! a stage runs is reported through its outcome rather than an `Err`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for drydock operations.
#[derive(Debug, Error)]
pub enum DrydockError {
    /// A pipeline configuration error occurred.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata about a configuration error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigErrorInfo {
    /// Error code (e.g., "CONFIG-001-EMPTY").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ConfigErrorInfo {
    /// Creates a new config error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Error raised when a pipeline is misconfigured.
///
/// Always produced before any stage executes.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{message}")]
pub struct ConfigError {
    /// The error message.
    pub message: String,
    /// The stage involved in the error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Structured error info with a stable code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_info: Option<ConfigErrorInfo>,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stage: None,
            error_info: None,
        }
    }

    /// Sets the stage involved.
    #[must_use]
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Sets the structured error info.
    #[must_use]
    pub fn with_error_info(mut self, info: ConfigErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// An empty stage sequence.
    #[must_use]
    pub fn empty() -> Self {
        Self::new("Pipeline has no stages").with_error_info(
            ConfigErrorInfo::new("CONFIG-001-EMPTY", "Cannot build an empty pipeline")
                .with_fix_hint("Add at least one stage to the pipeline before building."),
        )
    }

    /// A stage name declared more than once.
    #[must_use]
    pub fn duplicate_stage(name: &str) -> Self {
        Self::new(format!("Stage '{name}' is declared more than once"))
            .with_stage(name)
            .with_error_info(
                ConfigErrorInfo::new(
                    "CONFIG-002-DUPLICATE",
                    format!("Duplicate stage name '{name}'"),
                )
                .with_fix_hint("Give every stage a unique name.")
                .with_context_entry("stage", name),
            )
    }

    /// A stage with a blank name.
    #[must_use]
    pub fn blank_name(position: usize) -> Self {
        Self::new(format!("Stage at position {position} has a blank name")).with_error_info(
            ConfigErrorInfo::new("CONFIG-003-BLANK_NAME", "Stage names must be non-empty")
                .with_fix_hint("Name the stage after the work it performs.")
                .with_context_entry("position", position.to_string()),
        )
    }

    /// An unreadable or malformed manifest.
    #[must_use]
    pub fn manifest(detail: impl Into<String>) -> Self {
        Self::new(format!("Pipeline manifest is invalid: {}", detail.into())).with_error_info(
            ConfigErrorInfo::new("CONFIG-004-MANIFEST", "Manifest could not be parsed")
                .with_fix_hint("Check the manifest against the documented stage kinds and fields."),
        )
    }

    /// Returns the stable error code, if structured info is attached.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|info| info.code.as_str())
    }
}

/// Errors from the external process layer.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The program could not be started at all.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The spawned process could not be waited on.
    #[error("failed waiting on '{program}': {source}")]
    Wait {
        /// The program being waited on.
        program: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Provides default suggestions for common configuration error codes.
pub struct ConfigSuggestions;

impl ConfigSuggestions {
    /// Gets a suggestion for a given error code.
    #[must_use]
    pub fn get(code: &str) -> Option<&'static str> {
        match code {
            "CONFIG-001-EMPTY" => Some(
                "Add at least one stage to the pipeline before building.",
            ),
            "CONFIG-002-DUPLICATE" => Some(
                "Stage names identify stages in reports and logs. \
                 Rename one of the conflicting stages.",
            ),
            "CONFIG-003-BLANK_NAME" => Some(
                "Every stage needs a non-empty name. \
                 Name it after the work it performs, e.g. 'compile' or 'upload'.",
            ),
            "CONFIG-004-MANIFEST" => Some(
                "Check the manifest for syntax errors and unknown stage kinds. \
                 Run the 'check' command to validate without executing.",
            ),
            _ => None,
        }
    }
}
