//! Event sink trait and implementations.

use super::{EventKind, PipelineEvent};
use async_trait::async_trait;
use tracing::{debug, info, warn, Level};

/// Trait for sinks that receive pipeline events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers an event asynchronously.
    async fn emit(&self, event: PipelineEvent);

    /// Delivers an event without blocking.
    ///
    /// Must never panic; delivery problems are swallowed.
    fn try_emit(&self, event: PipelineEvent);
}

/// A sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: PipelineEvent) {}

    fn try_emit(&self, _event: PipelineEvent) {}
}

/// A sink that logs events through the tracing framework.
///
/// Failure events are logged at WARN regardless of the configured level.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log_event(&self, event: &PipelineEvent) {
        if matches!(event.kind, EventKind::StageFailed | EventKind::PipelineFailed) {
            warn!(
                pipeline = %event.pipeline,
                run_id = %event.run_id,
                stage = ?event.stage,
                position = ?event.position,
                detail = ?event.detail,
                "event: {}", event.kind
            );
            return;
        }

        if self.level == Level::DEBUG {
            debug!(
                pipeline = %event.pipeline,
                run_id = %event.run_id,
                stage = ?event.stage,
                position = ?event.position,
                detail = ?event.detail,
                "event: {}", event.kind
            );
        } else {
            info!(
                pipeline = %event.pipeline,
                run_id = %event.run_id,
                stage = ?event.stage,
                position = ?event.position,
                detail = ?event.detail,
                "event: {}", event.kind
            );
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event: PipelineEvent) {
        self.log_event(&event);
    }

    fn try_emit(&self, event: PipelineEvent) {
        self.log_event(&event);
    }
}

/// A collecting sink for tests.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<PipelineEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.read().clone()
    }

    /// Returns the collected event kinds, in arrival order.
    #[must_use]
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.read().iter().map(|e| e.kind).collect()
    }

    /// Returns events of one kind.
    #[must_use]
    pub fn of_kind(&self, kind: EventKind) -> Vec<PipelineEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event: PipelineEvent) {
        self.events.write().push(event);
    }

    fn try_emit(&self, event: PipelineEvent) {
        self.events.write().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn event(kind: EventKind) -> PipelineEvent {
        PipelineEvent::new(kind, "test", Uuid::new_v4())
    }

    #[test]
    fn test_noop_sink() {
        let sink = NoOpEventSink;
        tokio_test::block_on(sink.emit(event(EventKind::StageStarted)));
        sink.try_emit(event(EventKind::StageCompleted));
    }

    #[test]
    fn test_logging_sink() {
        let sink = LoggingEventSink::debug();
        tokio_test::block_on(sink.emit(event(EventKind::StageStarted)));
        sink.try_emit(event(EventKind::StageFailed));
    }

    #[tokio::test]
    async fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit(event(EventKind::StageStarted)).await;
        sink.try_emit(event(EventKind::StageCompleted));

        assert_eq!(sink.len(), 2);
        assert_eq!(
            sink.kinds(),
            vec![EventKind::StageStarted, EventKind::StageCompleted]
        );
    }

    #[tokio::test]
    async fn test_collecting_sink_filter() {
        let sink = CollectingEventSink::new();
        sink.emit(event(EventKind::StageStarted)).await;
        sink.emit(event(EventKind::StageCompleted)).await;
        sink.emit(event(EventKind::StageStarted)).await;

        assert_eq!(sink.of_kind(EventKind::StageStarted).len(), 2);
        assert_eq!(sink.of_kind(EventKind::PipelineFailed).len(), 0);
    }

    #[test]
    fn test_collecting_sink_clear() {
        let sink = CollectingEventSink::new();
        sink.try_emit(event(EventKind::PipelineCompleted));
        assert_eq!(sink.len(), 1);

        sink.clear();
        assert!(sink.is_empty());
    }
}
