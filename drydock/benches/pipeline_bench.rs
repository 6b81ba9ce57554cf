//! Benchmarks for pipeline execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use drydock::pipeline::Pipeline;
use drydock::stages::NoOpStage;

fn pipeline_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");

    let pipeline = Pipeline::builder("bench")
        .add_stage(NoOpStage::new("a"))
        .add_stage(NoOpStage::new("b"))
        .add_stage(NoOpStage::new("c"))
        .build()
        .expect("valid pipeline");

    c.bench_function("run_three_noop_stages", |b| {
        b.iter(|| runtime.block_on(async { black_box(pipeline.run().await) }));
    });

    c.bench_function("build_ten_stage_pipeline", |b| {
        b.iter(|| {
            let mut builder = Pipeline::builder("bench");
            for i in 0..10 {
                builder = builder.add_stage(NoOpStage::new(format!("stage-{i}")));
            }
            black_box(builder.build().expect("valid pipeline"))
        });
    });
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
