//! Integration tests for chain order search.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rstest::rstest;

use labelchain::chain::{ChainOrder, RebuildStrategy};
use labelchain::classifier::FrequencyFactory;
use labelchain::evaluation::{Metric, MetricEvaluator};
use labelchain::search::{search_chain_order, OrderSearch, OrderSearchParams, SwapProposal};
use labelchain::testing::synthetic_multilabel;
use labelchain::Verbosity;

#[rstest]
#[case::exact_match(Metric::ExactMatch)]
#[case::hamming_loss(Metric::HammingLoss)]
#[case::jaccard(Metric::JaccardIndex)]
fn payoff_trace_is_monotone(#[case] metric: Metric) {
    let ds = synthetic_multilabel(60, 3, 5, 0.25, 3).unwrap();
    let evaluator = MetricEvaluator::new(metric.clone());
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(17);
    let outcome = search_chain_order(&ds, &FrequencyFactory::default(), &evaluator, 25, &mut rng)
        .unwrap();

    assert_eq!(outcome.trace.len(), 26);
    let higher_is_better = labelchain::MetricFn::higher_is_better(&metric);
    for pair in outcome.trace.windows(2) {
        if higher_is_better {
            assert!(pair[1] >= pair[0]);
        } else {
            assert!(pair[1] <= pair[0]);
        }
    }
    assert_eq!(outcome.payoff.value, *outcome.trace.last().unwrap());
    assert_eq!(outcome.model.order(), &outcome.order);
}

#[test]
fn reuse_rebuild_matches_full_rebuild() {
    let ds = synthetic_multilabel(50, 2, 4, 0.2, 5).unwrap();
    let run = |rebuild| {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
        OrderSearch::new(OrderSearchParams {
            iterations: 15,
            rebuild,
            ..Default::default()
        })
        .search(
            &ds,
            Some(ChainOrder::identity(4)),
            &FrequencyFactory::default(),
            &MetricEvaluator::default(),
            &mut rng,
        )
        .unwrap()
    };
    let full = run(RebuildStrategy::Full);
    let reuse = run(RebuildStrategy::ReuseUnchanged);
    assert_eq!(full.order, reuse.order);
    assert_eq!(full.trace, reuse.trace);
}

#[test]
fn annealed_search_keeps_invariants() {
    let subscriber = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("labelchain=debug")
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let ds = synthetic_multilabel(40, 2, 6, 0.3, 8).unwrap();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
    let outcome = OrderSearch::new(OrderSearchParams {
        iterations: 20,
        proposal: SwapProposal::annealed(),
        verbosity: Verbosity::Debug,
        ..Default::default()
    })
    .search(
        &ds,
        None,
        &FrequencyFactory::default(),
        &MetricEvaluator::default(),
        &mut rng,
    )
    .unwrap();

    let mut labels = outcome.order.as_slice().to_vec();
    labels.sort_unstable();
    assert_eq!(labels, (0..6).collect::<Vec<_>>());
    assert!(outcome.accepted <= 20);
}

#[test]
fn single_label_search_is_trivial() {
    let ds = synthetic_multilabel(10, 1, 1, 0.0, 1).unwrap();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
    let outcome = search_chain_order(
        &ds,
        &FrequencyFactory::default(),
        &MetricEvaluator::default(),
        5,
        &mut rng,
    )
    .unwrap();
    assert_eq!(outcome.order.as_slice(), &[0]);
    assert_eq!(outcome.accepted, 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn proposals_are_single_swaps(n in 2usize..12, seed in any::<u64>(), iteration in 0usize..200) {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let order = ChainOrder::random(n, &mut rng);
        for proposal in [SwapProposal::Uniform, SwapProposal::annealed()] {
            let next = proposal.propose(&order, iteration, &mut rng);
            let moved = order
                .iter()
                .zip(next.iter())
                .filter(|(a, b)| a != b)
                .count();
            prop_assert_eq!(moved, 2);
            let mut sorted = next.as_slice().to_vec();
            sorted.sort_unstable();
            prop_assert_eq!(sorted, (0..n).collect::<Vec<_>>());
        }
    }
}
