//! Local search over chain orders.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::SwapProposal;
use crate::chain::{ChainModel, ChainOrder, ChainStructure, RebuildStrategy};
use crate::classifier::ClassifierFactory;
use crate::data::MultiLabelDataset;
use crate::evaluation::{chain_payoff, Evaluator, MetricValue};
use crate::error::Result;
use crate::logger::{SearchLogger, Verbosity};

/// Parameters for [`OrderSearch`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderSearchParams {
    /// Number of proposals. `0` keeps the initial order.
    pub iterations: usize,
    /// How neighbouring orders are proposed.
    pub proposal: SwapProposal,
    /// How candidate chains are rebuilt.
    pub rebuild: RebuildStrategy,
    /// Fraction of samples held out for the payoff. `None` measures the
    /// payoff on the training data itself.
    pub holdout_fraction: Option<f64>,
    pub verbosity: Verbosity,
}

impl Default for OrderSearchParams {
    fn default() -> Self {
        Self {
            iterations: 10,
            proposal: SwapProposal::Uniform,
            rebuild: RebuildStrategy::Full,
            holdout_fraction: None,
            verbosity: Verbosity::Silent,
        }
    }
}

/// Result of an order search.
#[derive(Debug, Clone)]
pub struct OrderSearchOutcome {
    /// Best order found.
    pub order: ChainOrder,
    /// Chain for `order`, trained on the full dataset.
    pub model: ChainModel,
    /// Payoff of `order` as measured during the search.
    pub payoff: MetricValue,
    /// Incumbent payoff before the first proposal and after every
    /// iteration: `iterations + 1` entries, never getting worse.
    pub trace: Vec<f64>,
    /// Number of accepted proposals.
    pub accepted: usize,
}

/// Incumbent threaded through the search loop.
struct SearchState {
    order: ChainOrder,
    model: ChainModel,
    payoff: MetricValue,
    trace: Vec<f64>,
}

/// Single-swap hill climbing over plain chain orders.
///
/// Each iteration swaps two distinct positions of the incumbent order,
/// rebuilds the chain and scores it with the [`Evaluator`]. The candidate
/// replaces the incumbent only if its payoff is strictly better, so the
/// payoff never gets worse over the run.
#[derive(Debug, Clone, Default)]
pub struct OrderSearch {
    params: OrderSearchParams,
}

impl OrderSearch {
    pub fn new(params: OrderSearchParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &OrderSearchParams {
        &self.params
    }

    /// Run the search.
    ///
    /// Starts from `initial`, or from a random order drawn from `rng`.
    ///
    /// # Errors
    ///
    /// Structural errors for an `initial` order of the wrong size, dataset
    /// errors for an invalid holdout fraction; classifier and evaluator
    /// failures abort the search.
    pub fn search(
        &self,
        dataset: &MultiLabelDataset,
        initial: Option<ChainOrder>,
        factory: &dyn ClassifierFactory,
        evaluator: &dyn Evaluator,
        rng: &mut dyn RngCore,
    ) -> Result<OrderSearchOutcome> {
        let params = &self.params;
        let initial = initial.unwrap_or_else(|| ChainOrder::random(dataset.n_labels(), rng));

        let split = params
            .holdout_fraction
            .map(|fraction| dataset.train_holdout_split(fraction, rng))
            .transpose()?;
        let (train, holdout) = match &split {
            Some((train, holdout)) => (train, holdout),
            None => (dataset, dataset),
        };

        let model = ChainModel::build(ChainStructure::plain(initial.clone()), train, factory)?;
        let payoff = chain_payoff(&model, holdout, evaluator)?;

        let mut logger = SearchLogger::new("order", params.verbosity);
        logger.start(params.iterations, &payoff);

        let state = SearchState {
            trace: vec![payoff.value],
            order: initial,
            model,
            payoff,
        };

        let state = (1..=params.iterations).try_fold(state, |mut state, iteration| {
            let candidate = params.proposal.propose(&state.order, iteration, rng);
            let model = state.model.rebuild(
                ChainStructure::plain(candidate.clone()),
                train,
                factory,
                params.rebuild,
            )?;
            let payoff = chain_payoff(&model, holdout, evaluator)?;

            if payoff.is_better_than(&state.payoff) {
                logger.log_accept(iteration, candidate.as_slice(), &payoff);
                state.order = candidate;
                state.model = model;
                state.payoff = payoff;
            } else {
                logger.log_reject(iteration, &payoff);
            }
            state.trace.push(state.payoff.value);
            Ok::<_, crate::ChainError>(state)
        })?;

        logger.finish(&state.payoff);

        // A holdout search trained on part of the data; refit on all of it.
        let model = if split.is_some() {
            ChainModel::build(ChainStructure::plain(state.order.clone()), dataset, factory)?
        } else {
            state.model
        };

        Ok(OrderSearchOutcome {
            order: state.order,
            model,
            payoff: state.payoff,
            trace: state.trace,
            accepted: logger.accepted(),
        })
    }
}

/// Order search from a random order with default parameters and
/// `iterations` proposals.
pub fn search_chain_order(
    dataset: &MultiLabelDataset,
    factory: &dyn ClassifierFactory,
    evaluator: &dyn Evaluator,
    iterations: usize,
    rng: &mut dyn RngCore,
) -> Result<OrderSearchOutcome> {
    OrderSearch::new(OrderSearchParams {
        iterations,
        ..OrderSearchParams::default()
    })
    .search(dataset, None, factory, evaluator, rng)
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    use super::*;
    use crate::classifier::FrequencyFactory;
    use crate::data::DatasetError;
    use crate::evaluation::{Metric, MetricEvaluator};
    use crate::ChainError;

    fn dataset() -> MultiLabelDataset {
        let features = ndarray::Array2::<f32>::zeros((8, 1));
        let labels = array![
            [1, 1, 0],
            [1, 1, 0],
            [0, 0, 1],
            [0, 0, 1],
            [1, 0, 0],
            [0, 1, 1],
            [1, 1, 1],
            [0, 0, 0]
        ];
        MultiLabelDataset::new(features.view(), labels.view()).unwrap()
    }

    #[test]
    fn zero_iterations_keeps_initial_order() {
        let ds = dataset();
        let initial = ChainOrder::new(vec![2, 0, 1]).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let search = OrderSearch::new(OrderSearchParams {
            iterations: 0,
            ..Default::default()
        });
        let outcome = search
            .search(
                &ds,
                Some(initial.clone()),
                &FrequencyFactory::default(),
                &MetricEvaluator::default(),
                &mut rng,
            )
            .unwrap();
        assert_eq!(outcome.order, initial);
        assert_eq!(outcome.trace.len(), 1);
        assert_eq!(outcome.accepted, 0);
    }

    #[test]
    fn payoff_trace_is_monotone() {
        let ds = dataset();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let outcome = search_chain_order(
            &ds,
            &FrequencyFactory::default(),
            &MetricEvaluator::new(Metric::HammingScore),
            25,
            &mut rng,
        )
        .unwrap();
        assert_eq!(outcome.trace.len(), 26);
        assert!(outcome.trace.windows(2).all(|w| w[1] >= w[0]));
        approx::assert_abs_diff_eq!(outcome.payoff.value, *outcome.trace.last().unwrap());
        assert_eq!(outcome.model.order(), &outcome.order);
    }

    #[test]
    fn lower_is_better_metrics_never_increase() {
        let ds = dataset();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let outcome = search_chain_order(
            &ds,
            &FrequencyFactory::default(),
            &MetricEvaluator::new(Metric::HammingLoss),
            25,
            &mut rng,
        )
        .unwrap();
        assert!(outcome.trace.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn same_seed_same_outcome() {
        let ds = dataset();
        let run = |seed| {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
            let params = OrderSearchParams {
                iterations: 15,
                proposal: SwapProposal::annealed(),
                rebuild: RebuildStrategy::ReuseUnchanged,
                ..Default::default()
            };
            let outcome = OrderSearch::new(params)
                .search(
                    &ds,
                    None,
                    &FrequencyFactory::default(),
                    &MetricEvaluator::default(),
                    &mut rng,
                )
                .unwrap();
            (outcome.order, outcome.trace)
        };
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn holdout_search_refits_on_full_data() {
        let ds = dataset();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(8);
        let params = OrderSearchParams {
            iterations: 5,
            holdout_fraction: Some(0.25),
            ..Default::default()
        };
        let outcome = OrderSearch::new(params)
            .search(
                &ds,
                None,
                &FrequencyFactory::default(),
                &MetricEvaluator::default(),
                &mut rng,
            )
            .unwrap();
        let reference = ChainModel::build(
            ChainStructure::plain(outcome.order.clone()),
            &ds,
            &FrequencyFactory::default(),
        )
        .unwrap();
        let x = ds.instance(0);
        let labels = [1, 1, 0];
        approx::assert_abs_diff_eq!(
            outcome.model.path_probability(x, &labels).unwrap(),
            reference.path_probability(x, &labels).unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn invalid_holdout_fraction_is_a_dataset_error() {
        let ds = dataset();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(8);
        let params = OrderSearchParams {
            holdout_fraction: Some(1.5),
            ..Default::default()
        };
        let err = OrderSearch::new(params)
            .search(
                &ds,
                None,
                &FrequencyFactory::default(),
                &MetricEvaluator::default(),
                &mut rng,
            )
            .unwrap_err();
        assert!(matches!(err, ChainError::Dataset(DatasetError::InvalidFraction(_))));
    }
}
