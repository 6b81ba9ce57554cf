//! Mock stages for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::context::RunContext;
use crate::core::{FailureCause, StageOutcome};
use crate::stages::Stage;

/// Shared, ordered log of stage invocations.
///
/// Hand one log to several stages to assert on cross-stage execution
/// order and per-stage invocation counts.
#[derive(Debug, Clone, Default)]
pub struct InvocationLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl InvocationLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one invocation.
    pub fn record(&self, name: &str) {
        self.entries.lock().push(name.to_string());
    }

    /// Returns the invocations in execution order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Returns how many times the named stage was invoked.
    #[must_use]
    pub fn count_for(&self, name: &str) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.as_str() == name)
            .count()
    }

    /// Returns the total number of invocations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// A mock stage that records calls and returns a configurable outcome.
#[derive(Debug)]
pub struct MockStage {
    name: String,
    outcome: Mutex<StageOutcome>,
    call_count: Mutex<usize>,
    log: InvocationLog,
}

impl MockStage {
    /// Creates a new mock stage that succeeds.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: Mutex::new(StageOutcome::ok()),
            call_count: Mutex::new(0),
            log: InvocationLog::new(),
        }
    }

    /// Shares an invocation log with other stages.
    #[must_use]
    pub fn with_log(mut self, log: &InvocationLog) -> Self {
        self.log = log.clone();
        self
    }

    /// Sets the outcome to return.
    pub fn set_outcome(&self, outcome: StageOutcome) {
        *self.outcome.lock() = outcome;
    }

    /// Returns the number of times the stage was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }

    /// Resets call tracking.
    pub fn reset(&self) {
        *self.call_count.lock() = 0;
    }
}

#[async_trait]
impl Stage for MockStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &RunContext) -> StageOutcome {
        *self.call_count.lock() += 1;
        self.log.record(&self.name);
        self.outcome.lock().clone()
    }
}

/// A stage that always fails with a fixed cause.
#[derive(Debug)]
pub struct FailingStage {
    name: String,
    cause: FailureCause,
    log: InvocationLog,
}

impl FailingStage {
    /// Creates a new failing stage.
    #[must_use]
    pub fn new(name: impl Into<String>, cause: FailureCause) -> Self {
        Self {
            name: name.into(),
            cause,
            log: InvocationLog::new(),
        }
    }

    /// Creates a stage that fails with the given exit code.
    #[must_use]
    pub fn exit_code(name: impl Into<String>, code: i32) -> Self {
        Self::new(name, FailureCause::ExitCode(code))
    }

    /// Shares an invocation log with other stages.
    #[must_use]
    pub fn with_log(mut self, log: &InvocationLog) -> Self {
        self.log = log.clone();
        self
    }
}

#[async_trait]
impl Stage for FailingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &RunContext) -> StageOutcome {
        self.log.record(&self.name);
        StageOutcome::fail(self.cause.clone())
    }
}

/// A stage that takes time to execute.
#[derive(Debug)]
pub struct SlowStage {
    name: String,
    delay: Duration,
}

impl SlowStage {
    /// Creates a new slow stage.
    #[must_use]
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            name: name.into(),
            delay,
        }
    }

    /// Creates a slow stage with delay in milliseconds.
    #[must_use]
    pub fn with_delay_ms(name: impl Into<String>, ms: u64) -> Self {
        Self::new(name, Duration::from_millis(ms))
    }
}

#[async_trait]
impl Stage for SlowStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &RunContext) -> StageOutcome {
        tokio::time::sleep(self.delay).await;
        StageOutcome::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_stage() {
        let stage = MockStage::new("test");
        let ctx = RunContext::new();

        let outcome = stage.execute(&ctx).await;
        assert!(outcome.is_success());
        assert_eq!(stage.call_count(), 1);

        stage.set_outcome(StageOutcome::fail(FailureCause::ExitCode(1)));
        let outcome = stage.execute(&ctx).await;
        assert!(outcome.is_failure());
        assert_eq!(stage.call_count(), 2);

        stage.reset();
        assert_eq!(stage.call_count(), 0);
    }

    #[tokio::test]
    async fn test_shared_log_records_order() {
        let log = InvocationLog::new();
        let first = MockStage::new("first").with_log(&log);
        let second = MockStage::new("second").with_log(&log);
        let ctx = RunContext::new();

        first.execute(&ctx).await;
        second.execute(&ctx).await;
        first.execute(&ctx).await;

        assert_eq!(log.entries(), vec!["first", "second", "first"]);
        assert_eq!(log.count_for("first"), 2);
        assert_eq!(log.len(), 3);
    }

    #[tokio::test]
    async fn test_failing_stage() {
        let stage = FailingStage::exit_code("fail", 3);
        let outcome = stage.execute(&RunContext::new()).await;

        assert!(outcome.is_failure());
        assert_eq!(outcome.cause, Some(FailureCause::ExitCode(3)));
    }

    #[tokio::test]
    async fn test_slow_stage() {
        let stage = SlowStage::with_delay_ms("slow", 10);

        let start = std::time::Instant::now();
        let outcome = stage.execute(&RunContext::new()).await;
        let elapsed = start.elapsed();

        assert!(outcome.is_success());
        assert!(elapsed >= Duration::from_millis(10));
    }
}
