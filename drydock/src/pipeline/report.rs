//! Run reports.

use crate::core::{FailureCause, StageOutcome, StageStatus};
use crate::errors::DrydockError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Record of one executed stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage name.
    pub name: String,
    /// 1-based position in the pipeline.
    pub position: usize,
    /// Final status.
    pub status: StageStatus,
    /// When the stage started.
    pub started_at: DateTime<Utc>,
    /// When the stage finished.
    pub ended_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: f64,
    /// Failure cause when the stage failed.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cause: Option<FailureCause>,
    /// Data the stage reported.
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl StageRecord {
    pub(crate) fn from_outcome(
        name: &str,
        position: usize,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        duration_ms: f64,
        outcome: &StageOutcome,
    ) -> Self {
        Self {
            name: name.to_string(),
            position,
            status: outcome.status,
            started_at,
            ended_at,
            duration_ms,
            cause: outcome.cause.clone(),
            data: outcome.data.clone(),
        }
    }
}

/// Final outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every stage succeeded.
    Completed,
    /// A stage failed and halted the run.
    Failed {
        /// Name of the failing stage.
        stage: String,
        /// 1-based position of the failing stage.
        position: usize,
        /// Why it failed.
        cause: FailureCause,
    },
}

impl RunOutcome {
    /// Returns true when every stage succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns the failure cause, when the run failed.
    #[must_use]
    pub fn cause(&self) -> Option<&FailureCause> {
        match self {
            Self::Completed => None,
            Self::Failed { cause, .. } => Some(cause),
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed {
                stage,
                position,
                cause,
            } => write!(f, "failed at stage {position} ('{stage}'): {cause}"),
        }
    }
}

/// Full report of one pipeline run.
///
/// Contains a record for every stage that executed; stages after the
/// first failure never ran and have no record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Pipeline name.
    pub pipeline: String,
    /// Run identifier.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run ended.
    pub ended_at: DateTime<Utc>,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: f64,
    /// Records for the stages that executed, in order.
    pub stages: Vec<StageRecord>,
    /// Final outcome.
    pub outcome: RunOutcome,
}

impl RunReport {
    /// Returns true when every stage succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Returns the record of the failing stage, when the run failed.
    #[must_use]
    pub fn failed_stage(&self) -> Option<&StageRecord> {
        self.stages.iter().find(|r| r.status.is_failure())
    }

    /// Serializes the report to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization fails.
    pub fn to_json(&self) -> Result<String, DrydockError> {
        serde_json::to_string_pretty(self).map_err(|e| DrydockError::Serialization(e.to_string()))
    }

    /// Renders a human-readable report.
    #[must_use]
    pub fn render_text(&self) -> String {
        let run: String = self.run_id.to_string().chars().take(8).collect();
        let mut lines = Vec::with_capacity(self.stages.len() + 1);
        lines.push(format!(
            "pipeline '{}' {} in {:.0}ms (run {run})",
            self.pipeline, self.outcome, self.duration_ms
        ));
        for record in &self.stages {
            let mut line = format!(
                "  {}. {:<20} {:<9} {:>7.0}ms",
                record.position, record.name, record.status, record.duration_ms
            );
            if let Some(cause) = &record.cause {
                line.push_str(&format!("  {cause}"));
            }
            lines.push(line);
        }
        lines.join("\n")
    }
}
