//! Inference benchmarks: greedy vs stochastic vs exhaustive per instance,
//! and batch prediction through the high-level model.
//!
//! Run with: `cargo bench --bench inference`

use std::sync::Arc;
use std::time::Duration;

use labelchain::chain::{ChainModel, ChainOrder, ChainStructure};
use labelchain::classifier::FrequencyFactory;
use labelchain::inference::{greedy_predict, ExhaustiveSearch, StochasticSearch};
use labelchain::model::{ChainConfig, ClassifierChain, InferenceMode};
use labelchain::testing::synthetic_multilabel;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(5))
        .sample_size(10)
}

// =============================================================================
// Per-instance inference
// =============================================================================

fn bench_single_instance(c: &mut Criterion) {
    let mut group = c.benchmark_group("inference/instance");

    for n_labels in [4usize, 8, 12] {
        let ds = synthetic_multilabel(500, 8, n_labels, 0.15, 42).expect("synthetic data");
        let model = ChainModel::build(
            ChainStructure::plain(ChainOrder::identity(n_labels)),
            &ds,
            &FrequencyFactory::default(),
        )
        .expect("chain trains");
        let x = ds.instance(0);

        group.bench_with_input(BenchmarkId::new("greedy", n_labels), &x, |b, x| {
            b.iter(|| black_box(greedy_predict(&model, *x)))
        });

        let stochastic = StochasticSearch::new(50);
        group.bench_with_input(BenchmarkId::new("stochastic_50", n_labels), &x, |b, x| {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
            b.iter(|| black_box(stochastic.predict(&model, *x, &mut rng)))
        });

        let exhaustive = ExhaustiveSearch::default();
        group.bench_with_input(BenchmarkId::new("exhaustive", n_labels), &x, |b, x| {
            b.iter(|| black_box(exhaustive.predict(&model, *x)))
        });
    }

    group.finish();
}

// =============================================================================
// Batch prediction
// =============================================================================

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("inference/batch");
    let ds = synthetic_multilabel(2_000, 8, 6, 0.15, 7).expect("synthetic data");
    group.throughput(Throughput::Elements(ds.n_samples() as u64));

    for n_threads in [1usize, 0] {
        let config = ChainConfig::builder()
            .initial_order((0..6).collect())
            .inference(InferenceMode::Stochastic { iterations: 20 })
            .n_threads(n_threads)
            .build()
            .expect("valid config");
        let chain = ClassifierChain::train(&ds, Arc::new(FrequencyFactory::default()), config)
            .expect("chain trains");

        group.bench_function(BenchmarkId::new("stochastic_20", n_threads), |b| {
            b.iter(|| black_box(chain.predict(ds.features())))
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = default_criterion();
    targets = bench_single_instance, bench_batch
}
criterion_main!(benches);
