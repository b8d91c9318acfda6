//! Benchmarks for sampling plans, synthetic extraction, and exports.
//!
//! Run with: cargo bench
//!
//! Uses the in-memory frame source from the integration tests, so no media
//! fixtures are needed.

#[path = "../tests/common/mod.rs"]
mod common;

use criterion::Criterion;
use scenecut::{ExportService, ExtractionConfig, FrameSampler, SamplingPlan};

use common::{SyntheticSource, analysis, options, scene};

fn benchmark_plan(criterion: &mut Criterion) {
    criterion.bench_function("plan 2h source at 1s, budget 60", |bencher| {
        bencher.iter(|| {
            let plan = SamplingPlan::compute(7_200.0, &options(1.0, 60)).unwrap();
            plan.timestamps().count()
        });
    });
}

fn benchmark_sampling(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("synthetic sampling");

    for &(width, height) in &[(160_u32, 90_u32), (640, 360)] {
        group.bench_function(format!("60 frames at {width}x{height}"), |bencher| {
            bencher.iter(|| {
                let mut source = SyntheticSource::new(120.0);
                source.width = width;
                source.height = height;
                FrameSampler::new(options(1.0, 60))
                    .sample(source, &ExtractionConfig::new())
                    .unwrap()
                    .scenes
                    .len()
            });
        });
    }

    group.finish();
}

fn benchmark_tsv(criterion: &mut Criterion) {
    let scenes: Vec<_> = (1..=500)
        .map(|n| {
            let mut scene = scene(n, f64::from(n) * 1.5);
            scene.analysis = Some(analysis("A person walks along the shore", &["beach", "walk"]));
            scene
        })
        .collect();
    let export = ExportService::new();

    criterion.bench_function("tsv report for 500 scenes", |bencher| {
        bencher.iter(|| export.tsv_report(&scenes).len());
    });

    let report = export.tsv_report(&scenes);
    criterion.bench_function("parse tsv report of 500 scenes", |bencher| {
        bencher.iter(|| ExportService::parse_tsv(&report).unwrap().len());
    });
}

criterion::criterion_group!(benches, benchmark_plan, benchmark_sampling, benchmark_tsv);
criterion::criterion_main!(benches);
