//! Sequential pipeline execution.

use super::builder::PipelineBuilder;
use super::report::{RunOutcome, RunReport, StageRecord};
use crate::context::RunContext;
use crate::core::FailureCause;
use crate::events::{EventKind, PipelineEvent};
use crate::stages::Stage;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// An ordered sequence of named stages, executed strictly one at a time.
///
/// Construct through [`PipelineBuilder`]; a pipeline that builds
/// successfully is non-empty, immutable, and always runnable. Each run
/// starts from the first stage; nothing is cached between runs.
#[derive(Debug)]
pub struct Pipeline {
    name: String,
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    /// Returns a builder for a pipeline with the given name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder::new(name)
    }

    pub(crate) fn from_parts(name: String, stages: Vec<Arc<dyn Stage>>) -> Self {
        Self { name, stages }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true when the pipeline has no stages.
    ///
    /// Always false for a built pipeline; validation rejects an empty
    /// sequence.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs every stage in order, stopping at the first failure.
    ///
    /// A fresh run context (new run id, global event sink) is created
    /// for the run.
    pub async fn run(&self) -> RunReport {
        self.run_with_context(&RunContext::new()).await
    }

    /// Runs with a caller-supplied context.
    ///
    /// Stage *i + 1* never starts before stage *i* reports success; the
    /// first failure halts the run and the remaining stages are not
    /// executed. The report always says what happened; errors inside
    /// stages surface as failure outcomes, never as panics.
    pub async fn run_with_context(&self, ctx: &RunContext) -> RunReport {
        let run_start = Instant::now();
        let started_at = Utc::now();
        let run_id = ctx.run_id();

        info!(
            pipeline = %self.name,
            run = %ctx.identity().short(),
            stages = self.stages.len(),
            "run started"
        );

        let mut records = Vec::with_capacity(self.stages.len());
        let mut failure: Option<(String, usize, FailureCause)> = None;

        for (index, stage) in self.stages.iter().enumerate() {
            let position = index + 1;
            let name = stage.name().to_string();
            let stage_start = Instant::now();
            let stage_started_at = Utc::now();

            ctx.try_emit(
                PipelineEvent::new(EventKind::StageStarted, &self.name, run_id)
                    .with_stage(name.as_str(), position),
            );
            info!(stage = %name, position, "stage started");

            let outcome = stage.execute(ctx).await;
            let duration_ms = stage_start.elapsed().as_secs_f64() * 1000.0;
            let record = StageRecord::from_outcome(
                &name,
                position,
                stage_started_at,
                Utc::now(),
                duration_ms,
                &outcome,
            );

            if outcome.is_success() {
                ctx.try_emit(
                    PipelineEvent::new(EventKind::StageCompleted, &self.name, run_id)
                        .with_stage(name.as_str(), position)
                        .with_detail(json!({ "duration_ms": duration_ms })),
                );
                info!(stage = %name, position, "stage completed");
                records.push(record);
                continue;
            }

            let cause = outcome.cause.clone().unwrap_or_else(|| {
                FailureCause::Error("stage failed without a reported cause".to_string())
            });
            ctx.try_emit(
                PipelineEvent::new(EventKind::StageFailed, &self.name, run_id)
                    .with_stage(name.as_str(), position)
                    .with_detail(json!({
                        "cause": cause.to_string(),
                        "duration_ms": duration_ms,
                    })),
            );
            warn!(stage = %name, position, %cause, "stage failed");
            records.push(record);
            failure = Some((name, position, cause));
            break;
        }

        let duration_ms = run_start.elapsed().as_secs_f64() * 1000.0;
        let outcome = match failure {
            None => {
                ctx.try_emit(
                    PipelineEvent::new(EventKind::PipelineCompleted, &self.name, run_id)
                        .with_detail(json!({
                            "stages": records.len(),
                            "duration_ms": duration_ms,
                        })),
                );
                info!(pipeline = %self.name, "run completed");
                RunOutcome::Completed
            }
            Some((stage, position, cause)) => {
                ctx.try_emit(
                    PipelineEvent::new(EventKind::PipelineFailed, &self.name, run_id)
                        .with_detail(json!({
                            "stage": stage,
                            "position": position,
                            "cause": cause.to_string(),
                        })),
                );
                warn!(pipeline = %self.name, stage = %stage, position, "run failed");
                RunOutcome::Failed {
                    stage,
                    position,
                    cause,
                }
            }
        };

        RunReport {
            pipeline: self.name.clone(),
            run_id,
            started_at,
            ended_at: Utc::now(),
            duration_ms,
            stages: records,
            outcome,
        }
    }
}
