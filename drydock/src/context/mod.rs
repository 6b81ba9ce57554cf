//! Per-run context threaded through stage execution.

mod identity;

pub use identity::RunIdentity;

use crate::events::{get_event_sink, EventSink, PipelineEvent};
use std::sync::Arc;
use uuid::Uuid;

/// Context handed to each stage during a run.
///
/// Carries the run identity and the event sink. Stages receive a shared
/// reference; the context itself holds no stage output.
#[derive(Clone)]
pub struct RunContext {
    identity: RunIdentity,
    event_sink: Arc<dyn EventSink>,
}

impl RunContext {
    /// Creates a context with a fresh identity and the global event sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            identity: RunIdentity::new(),
            event_sink: get_event_sink(),
        }
    }

    /// Replaces the run identity.
    #[must_use]
    pub fn with_identity(mut self, identity: RunIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Returns the run identity.
    #[must_use]
    pub fn identity(&self) -> RunIdentity {
        self.identity
    }

    /// Returns the run id.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.identity.run_id
    }

    /// Returns the event sink.
    #[must_use]
    pub fn event_sink(&self) -> Arc<dyn EventSink> {
        Arc::clone(&self.event_sink)
    }

    /// Emits an event without blocking.
    pub fn try_emit(&self, event: PipelineEvent) {
        self.event_sink.try_emit(event);
    }

    /// Emits an event asynchronously.
    pub async fn emit(&self, event: PipelineEvent) {
        self.event_sink.emit(event).await;
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
