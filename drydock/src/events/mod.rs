//! Pipeline event system for observability.
//!
//! Events describe the lifecycle of a run: stages starting, completing and
//! failing, and the run reaching its terminal state. They are delivered to
//! an [`EventSink`]; when no sink is configured, events are discarded.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// The kind of a pipeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    /// A stage is about to execute.
    #[serde(rename = "stage.started")]
    StageStarted,
    /// A stage finished successfully.
    #[serde(rename = "stage.completed")]
    StageCompleted,
    /// A stage failed; the run halts after this event.
    #[serde(rename = "stage.failed")]
    StageFailed,
    /// Every stage succeeded.
    #[serde(rename = "pipeline.completed")]
    PipelineCompleted,
    /// The run ended at its first failing stage.
    #[serde(rename = "pipeline.failed")]
    PipelineFailed,
}

impl EventKind {
    /// Returns the dotted event name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StageStarted => "stage.started",
            Self::StageCompleted => "stage.completed",
            Self::StageFailed => "stage.failed",
            Self::PipelineCompleted => "pipeline.completed",
            Self::PipelineFailed => "pipeline.failed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single pipeline lifecycle event.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineEvent {
    /// What happened.
    pub kind: EventKind,
    /// The pipeline the event belongs to.
    pub pipeline: String,
    /// The run the event belongs to.
    pub run_id: Uuid,
    /// The stage involved, for stage-scoped events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// 1-based position of the stage in the pipeline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
    /// Extra payload (duration, failure cause, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl PipelineEvent {
    /// Creates a new event.
    #[must_use]
    pub fn new(kind: EventKind, pipeline: impl Into<String>, run_id: Uuid) -> Self {
        Self {
            kind,
            pipeline: pipeline.into(),
            run_id,
            stage: None,
            position: None,
            timestamp: Utc::now(),
            detail: None,
        }
    }

    /// Scopes the event to a stage.
    #[must_use]
    pub fn with_stage(mut self, stage: impl Into<String>, position: usize) -> Self {
        self.stage = Some(stage.into());
        self.position = Some(position);
        self
    }

    /// Attaches an extra payload.
    #[must_use]
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

// Process-wide default sink, used when a run context is built without one.
static GLOBAL_EVENT_SINK: RwLock<Option<Arc<dyn EventSink>>> = RwLock::new(None);

/// Sets the current global event sink.
pub fn set_event_sink(sink: Arc<dyn EventSink>) {
    *GLOBAL_EVENT_SINK.write() = Some(sink);
}

/// Clears the current global event sink.
pub fn clear_event_sink() {
    *GLOBAL_EVENT_SINK.write() = None;
}

/// Gets the current global event sink.
///
/// Returns a `NoOpEventSink` if no sink is set.
#[must_use]
pub fn get_event_sink() -> Arc<dyn EventSink> {
    GLOBAL_EVENT_SINK
        .read()
        .clone()
        .unwrap_or_else(|| Arc::new(NoOpEventSink))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_names() {
        assert_eq!(EventKind::StageStarted.as_str(), "stage.started");
        assert_eq!(EventKind::PipelineFailed.to_string(), "pipeline.failed");
    }

    #[test]
    fn test_event_builder() {
        let run_id = Uuid::new_v4();
        let event = PipelineEvent::new(EventKind::StageFailed, "release", run_id)
            .with_stage("upload", 3)
            .with_detail(serde_json::json!({"cause": "exit code 1"}));

        assert_eq!(event.pipeline, "release");
        assert_eq!(event.stage.as_deref(), Some("upload"));
        assert_eq!(event.position, Some(3));
        assert!(event.detail.is_some());
    }

    #[test]
    fn test_event_serialize_skips_empty_fields() {
        let event = PipelineEvent::new(EventKind::PipelineCompleted, "release", Uuid::new_v4());
        let json = serde_json::to_string(&event).unwrap();

        assert!(json.contains("pipeline.completed"));
        assert!(!json.contains("\"stage\""));
        assert!(!json.contains("\"detail\""));
    }

    #[test]
    fn test_global_sink_default() {
        clear_event_sink();
        let sink = get_event_sink();
        sink.try_emit(PipelineEvent::new(
            EventKind::StageStarted,
            "test",
            Uuid::new_v4(),
        ));
    }

    #[test]
    fn test_set_and_get_sink() {
        let sink: Arc<dyn EventSink> = Arc::new(LoggingEventSink::default());
        set_event_sink(sink);

        let retrieved = get_event_sink();
        retrieved.try_emit(PipelineEvent::new(
            EventKind::StageCompleted,
            "test",
            Uuid::new_v4(),
        ));

        clear_event_sink();
    }
}
