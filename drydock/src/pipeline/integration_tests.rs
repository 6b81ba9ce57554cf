//! End-to-end pipeline execution tests.

use crate::context::RunContext;
use crate::core::{FailureCause, StageOutcome};
use crate::events::{CollectingEventSink, EventKind, EventSink};
use crate::pipeline::{Pipeline, RunOutcome};
use crate::stages::{AsyncFnStage, Stage};
use crate::testing::{FailingStage, InvocationLog, MockStage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn abc_with_failing_c(log: &InvocationLog) -> Pipeline {
    Pipeline::builder("kernel-ci")
        .add_stage(MockStage::new("A").with_log(log))
        .add_stage(MockStage::new("B").with_log(log))
        .add_stage(FailingStage::exit_code("C", 1).with_log(log))
        .add_stage(MockStage::new("D").with_log(log))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_all_succeeding_stages_run_once_in_order() {
    let log = InvocationLog::new();
    let pipeline = Pipeline::builder("kernel-ci")
        .add_stage(MockStage::new("A").with_log(&log))
        .add_stage(MockStage::new("B").with_log(&log))
        .add_stage(MockStage::new("C").with_log(&log))
        .build()
        .unwrap();

    let report = pipeline.run().await;

    assert!(report.is_success());
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(log.entries(), vec!["A", "B", "C"]);
    assert_eq!(report.stages.len(), 3);
    assert!(report.stages.iter().all(|r| r.status.is_success()));
}

#[tokio::test]
async fn test_first_failure_halts_the_run() {
    let log = InvocationLog::new();
    let pipeline = abc_with_failing_c(&log);

    let report = pipeline.run().await;

    assert_eq!(
        report.outcome,
        RunOutcome::Failed {
            stage: "C".to_string(),
            position: 3,
            cause: FailureCause::ExitCode(1),
        }
    );
    assert_eq!(log.entries(), vec!["A", "B", "C"]);
    assert_eq!(log.count_for("A"), 1);
    assert_eq!(log.count_for("B"), 1);
    assert_eq!(log.count_for("D"), 0);
    assert_eq!(report.stages.len(), 3);
}

#[tokio::test]
async fn test_failure_report_names_stage_and_cause() {
    let log = InvocationLog::new();
    let report = abc_with_failing_c(&log).run().await;

    assert_eq!(
        report.outcome.to_string(),
        "failed at stage 3 ('C'): exit code 1"
    );
    let failed = report.failed_stage().unwrap();
    assert_eq!(failed.name, "C");
    assert_eq!(failed.position, 3);
    assert_eq!(failed.cause, Some(FailureCause::ExitCode(1)));
}

#[tokio::test]
async fn test_rerun_executes_every_stage_again() {
    let log = InvocationLog::new();
    let first: Arc<MockStage> = Arc::new(MockStage::new("A").with_log(&log));
    let second: Arc<MockStage> = Arc::new(MockStage::new("B").with_log(&log));
    let pipeline = Pipeline::builder("kernel-ci")
        .add_shared(first.clone())
        .add_shared(second.clone())
        .build()
        .unwrap();

    assert!(pipeline.run().await.is_success());
    assert!(pipeline.run().await.is_success());

    assert_eq!(first.call_count(), 2);
    assert_eq!(second.call_count(), 2);
    assert_eq!(log.entries(), vec!["A", "B", "A", "B"]);
}

#[tokio::test]
async fn test_stages_never_overlap() {
    let busy = Arc::new(AtomicBool::new(false));
    let overlapping_stage = |name: &str| {
        let busy = Arc::clone(&busy);
        AsyncFnStage::new(name, move |_ctx| {
            let busy = Arc::clone(&busy);
            async move {
                assert!(!busy.swap(true, Ordering::SeqCst), "stages overlapped");
                tokio::time::sleep(Duration::from_millis(5)).await;
                busy.store(false, Ordering::SeqCst);
                StageOutcome::ok()
            }
        })
    };

    let report = Pipeline::builder("kernel-ci")
        .add_stage(overlapping_stage("first"))
        .add_stage(overlapping_stage("second"))
        .add_stage(overlapping_stage("third"))
        .build()
        .unwrap()
        .run()
        .await;

    assert!(report.is_success());
}

#[tokio::test]
async fn test_empty_pipeline_is_always_a_config_error() {
    for _ in 0..2 {
        let err = Pipeline::builder("kernel-ci").build().unwrap_err();
        assert_eq!(err.code(), Some("CONFIG-001-EMPTY"));
    }
}

#[tokio::test]
async fn test_events_follow_execution_order() {
    let sink = Arc::new(CollectingEventSink::new());
    let ctx = RunContext::new().with_event_sink(sink.clone() as Arc<dyn EventSink>);
    let log = InvocationLog::new();

    let pipeline = Pipeline::builder("kernel-ci")
        .add_stage(MockStage::new("A").with_log(&log))
        .add_stage(FailingStage::exit_code("B", 7).with_log(&log))
        .build()
        .unwrap();

    let report = pipeline.run_with_context(&ctx).await;
    assert!(!report.is_success());

    assert_eq!(
        sink.kinds(),
        vec![
            EventKind::StageStarted,
            EventKind::StageCompleted,
            EventKind::StageStarted,
            EventKind::StageFailed,
            EventKind::PipelineFailed,
        ]
    );

    let failed = &sink.of_kind(EventKind::StageFailed)[0];
    assert_eq!(failed.stage.as_deref(), Some("B"));
    assert_eq!(failed.position, Some(2));
    assert_eq!(failed.run_id, ctx.run_id());
}

#[tokio::test]
async fn test_completed_pipeline_emits_completion_event() {
    let sink = Arc::new(CollectingEventSink::new());
    let ctx = RunContext::new().with_event_sink(sink.clone() as Arc<dyn EventSink>);

    let pipeline = Pipeline::builder("kernel-ci")
        .add_stage(MockStage::new("A"))
        .build()
        .unwrap();

    let report = pipeline.run_with_context(&ctx).await;
    assert!(report.is_success());
    assert_eq!(sink.of_kind(EventKind::PipelineCompleted).len(), 1);
    assert_eq!(sink.of_kind(EventKind::PipelineFailed).len(), 0);
}

#[tokio::test]
async fn test_failure_without_cause_still_reports() {
    #[derive(Debug)]
    struct BareFailure;

    #[async_trait::async_trait]
    impl Stage for BareFailure {
        fn name(&self) -> &str {
            "bare"
        }

        async fn execute(&self, _ctx: &RunContext) -> StageOutcome {
            StageOutcome {
                status: crate::core::StageStatus::Failed,
                cause: None,
                data: std::collections::HashMap::new(),
            }
        }
    }

    let report = Pipeline::builder("kernel-ci")
        .add_stage(BareFailure)
        .build()
        .unwrap()
        .run()
        .await;

    match report.outcome {
        RunOutcome::Failed { cause: FailureCause::Error(message), .. } => {
            assert!(message.contains("without a reported cause"));
        }
        other => panic!("expected synthesized error cause, got {other:?}"),
    }
}
