//! Weighted populations of chains.
//!
//! Instead of betting on one order, a population keeps `M` chains and
//! weights each by how likely it makes the training labels. Prediction draws
//! chains in proportion to their weight and hill-climbs over the paths they
//! sample.
//!
//! - [`ChainPopulation`]: trainer (tournament replacement of the weakest
//!   slot)
//! - [`PopulationModel`]: trained slots and weighted inference
//! - [`WeightAggregation`]: how likelihood factors become one weight

mod model;
mod train;
mod weights;

pub use model::{PopulationModel, PopulationSlot};
pub use train::{ChainPopulation, PopulationParams};
pub use weights::WeightAggregation;

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ndarray::{array, Array2};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    use super::*;
    use crate::classifier::{ClassifierFactory, FrequencyFactory, LabelClassifier, NodeTrainingSet};
    use crate::data::MultiLabelDataset;
    use crate::error::CollaboratorError;
    use crate::evaluation::MetricEvaluator;
    use crate::search::{OrderSearch, OrderSearchParams, SwapProposal};

    #[derive(Default)]
    struct CountingFactory {
        inner: FrequencyFactory,
        builds: AtomicUsize,
    }

    impl ClassifierFactory for CountingFactory {
        fn build(
            &self,
            training: &NodeTrainingSet<'_>,
        ) -> Result<Box<dyn LabelClassifier>, CollaboratorError> {
            self.builds.fetch_add(1, Ordering::Relaxed);
            self.inner.build(training)
        }
    }

    fn dataset() -> MultiLabelDataset {
        let labels = array![
            [1, 1, 0, 1],
            [1, 1, 0, 0],
            [0, 0, 1, 1],
            [0, 1, 1, 0],
            [1, 0, 0, 1],
            [0, 1, 1, 1],
            [1, 1, 1, 0],
            [0, 0, 0, 0],
            [1, 1, 0, 1],
            [0, 0, 1, 0]
        ];
        let features = Array2::<f32>::zeros((labels.nrows(), 2));
        MultiLabelDataset::new(features.view(), labels.view()).unwrap()
    }

    fn params(aggregation: WeightAggregation) -> PopulationParams {
        PopulationParams {
            population_size: 4,
            iterations: 20,
            aggregation,
            probability_floor: None,
            proposal: SwapProposal::Uniform,
            ..Default::default()
        }
    }

    #[test]
    fn weights_are_normalized() {
        for aggregation in [
            WeightAggregation::Product,
            WeightAggregation::LogSum,
            WeightAggregation::Sum,
        ] {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
            let population = ChainPopulation::new(params(aggregation))
                .train(
                    &dataset(),
                    &FrequencyFactory::default(),
                    &MetricEvaluator::default(),
                    &mut rng,
                )
                .unwrap();
            assert!(population.len() <= 4);
            let weights = population.weights();
            assert!(weights.iter().all(|&w| w >= 0.0));
            approx::assert_abs_diff_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn best_slot_has_largest_score() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(6);
        let population = ChainPopulation::new(params(WeightAggregation::LogSum))
            .train(
                &dataset(),
                &FrequencyFactory::default(),
                &MetricEvaluator::default(),
                &mut rng,
            )
            .unwrap();
        let best = population.best_slot();
        assert!(population.slots().iter().all(|s| s.score <= best.score));
        assert!(population.slots().iter().all(|s| s.weight <= best.weight));
    }

    #[test]
    fn population_builds_as_many_chains_as_order_search() {
        let ds = dataset();
        let iterations = 5;

        let population_factory = CountingFactory::default();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
        ChainPopulation::new(PopulationParams {
            population_size: 2,
            iterations,
            ..Default::default()
        })
        .train(&ds, &population_factory, &MetricEvaluator::default(), &mut rng)
        .unwrap();

        let search_factory = CountingFactory::default();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
        OrderSearch::new(OrderSearchParams {
            iterations,
            ..Default::default()
        })
        .search(&ds, None, &search_factory, &MetricEvaluator::default(), &mut rng)
        .unwrap();

        // Full rebuilds: one node per label for the first chain and each proposal.
        let expected = (iterations + 1) * ds.n_labels();
        assert_eq!(population_factory.builds.load(Ordering::Relaxed), expected);
        assert_eq!(search_factory.builds.load(Ordering::Relaxed), expected);
    }

    #[test]
    fn too_few_iterations_degrade_to_one_chain() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(6);
        let population = ChainPopulation::new(PopulationParams {
            population_size: 5,
            iterations: 5,
            ..Default::default()
        })
        .train(
            &dataset(),
            &FrequencyFactory::default(),
            &MetricEvaluator::default(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(population.len(), 1);
        assert_eq!(population.weights(), vec![1.0]);
    }

    #[test]
    fn zero_inference_iterations_return_greedy_path_of_best_chain() {
        let ds = dataset();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let population = ChainPopulation::new(params(WeightAggregation::LogSum))
            .train(&ds, &FrequencyFactory::default(), &MetricEvaluator::default(), &mut rng)
            .unwrap();
        let x = ds.instance(0);
        let greedy = population.best_slot().model.predict(x).unwrap();
        let result = population.predict(x, 0, None, &mut rng).unwrap();
        assert_eq!(result.path, greedy);
    }

    #[test]
    fn inference_never_worse_than_start() {
        let ds = dataset();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let population = ChainPopulation::new(params(WeightAggregation::Sum))
            .train(&ds, &FrequencyFactory::default(), &MetricEvaluator::default(), &mut rng)
            .unwrap();
        for sample in 0..ds.n_samples() {
            let x = ds.instance(sample);
            let start = population.best_slot().model.predict(x).unwrap();
            let result = population.predict(x, 30, None, &mut rng).unwrap();
            assert!(result.confidence_product >= start.joint_confidence(None));
        }
    }

    #[test]
    fn training_is_deterministic() {
        let run = || {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(9);
            let population = ChainPopulation::new(params(WeightAggregation::LogSum))
                .train(
                    &dataset(),
                    &FrequencyFactory::default(),
                    &MetricEvaluator::default(),
                    &mut rng,
                )
                .unwrap();
            population
                .slots()
                .iter()
                .map(|s| (s.order.clone(), s.weight))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
