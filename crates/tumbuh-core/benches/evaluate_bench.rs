//! # Evaluation Benchmarks
//!
//! Performance benchmarks for tumbuh-core lookup and evaluation.
//!
//! Run with: `cargo bench -p tumbuh-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use tumbuh_core::{
    Evaluator, EvaluatorConfig, Indicator, Measurement, ReferenceSet, Sex, Standard,
};

fn evaluator(restrict_tails: bool) -> Evaluator {
    Evaluator::new(
        Arc::new(ReferenceSet::embedded().expect("embedded tables")),
        EvaluatorConfig { restrict_tails },
    )
}

/// Measurements spread over the supported age range.
fn create_cohort(size: usize) -> Vec<Measurement> {
    (0..size)
        .map(|i| {
            let age = (i % 600) as f64 / 10.0;
            let sex = if i % 2 == 0 { Sex::Male } else { Sex::Female };
            Measurement::new(sex, age)
                .with_weight(3.5 + age * 0.25)
                .with_height(50.0 + age * 1.1)
                .with_head_circumference(34.0 + age * 0.2)
        })
        .collect()
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_load_embedded(c: &mut Criterion) {
    c.bench_function("load_embedded", |b| {
        b.iter(|| black_box(ReferenceSet::embedded()));
    });
}

fn bench_lookup(c: &mut Criterion) {
    let set = ReferenceSet::embedded().expect("embedded tables");
    let mut group = c.benchmark_group("lookup");

    group.bench_function("exact_month", |b| {
        b.iter(|| black_box(set.lookup(Indicator::WeightForAge, Sex::Male, 12.0, None)));
    });
    group.bench_function("interpolated_month", |b| {
        b.iter(|| black_box(set.lookup(Indicator::WeightForAge, Sex::Male, 12.37, None)));
    });
    group.bench_function("height_key", |b| {
        b.iter(|| {
            black_box(set.lookup(Indicator::WeightForHeight, Sex::Female, 36.0, Some(95.3)))
        });
    });

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let plain = evaluator(false);
    let restricted = evaluator(true);
    let m = Measurement::new(Sex::Female, 18.5)
        .with_weight(10.2)
        .with_height(80.4)
        .with_head_circumference(46.1);

    group.bench_function("plain", |b| b.iter(|| black_box(plain.evaluate(&m))));
    group.bench_function("restricted_tails", |b| {
        b.iter(|| black_box(restricted.evaluate(&m)));
    });

    group.finish();
}

fn bench_evaluate_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_batch");
    let ev = evaluator(false);

    for size in [100, 1000, 5000].iter() {
        let cohort = create_cohort(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &cohort, |b, cohort| {
            b.iter(|| black_box(ev.evaluate_batch(cohort)));
        });
    }

    group.finish();
}

fn bench_sd_curve(c: &mut Criterion) {
    let ev = evaluator(false);
    c.bench_function("sd_curve_wfl", |b| {
        b.iter(|| black_box(ev.sd_curve(Standard::WeightForLength, Sex::Male, -2.0)));
    });
}

criterion_group!(
    benches,
    bench_load_embedded,
    bench_lookup,
    bench_evaluate,
    bench_evaluate_batch,
    bench_sd_curve,
);
criterion_main!(benches);
