//! High-level weighted population model.

use std::sync::Arc;

use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use super::chain::collect_rows;
use super::config::PopulationConfig;
use crate::classifier::ClassifierFactory;
use crate::data::MultiLabelDataset;
use crate::error::Result;
use crate::evaluation::MetricEvaluator;
use crate::inference::StochasticPrediction;
use crate::population::{ChainPopulation, PopulationModel};
use crate::utils::run_with_threads;

/// A trained population of chains with its configuration.
///
/// Predictions start from the heaviest chain's greedy path and improve it
/// with paths sampled from weight-drawn chains.
#[derive(Debug, Clone)]
pub struct PopulationChain {
    population: PopulationModel,
    config: PopulationConfig,
}

impl PopulationChain {
    /// Train a population on `dataset`, seeded with `config.seed`.
    ///
    /// `config.metric` only matters when training degrades to a single
    /// searched chain.
    pub fn train(
        dataset: &MultiLabelDataset,
        factory: Arc<dyn ClassifierFactory>,
        config: PopulationConfig,
    ) -> Result<Self> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);
        let evaluator = MetricEvaluator::new(config.metric.clone());
        let population = ChainPopulation::new(config.population_params()).train(
            dataset,
            factory.as_ref(),
            &evaluator,
            &mut rng,
        )?;
        Ok(Self { population, config })
    }

    /// Weighted stochastic inference for one instance.
    pub fn predict_instance(
        &self,
        features: ArrayView1<'_, f32>,
        rng: &mut dyn RngCore,
    ) -> Result<StochasticPrediction> {
        self.population.predict(
            features,
            self.config.inference_iterations,
            self.config.probability_floor,
            rng,
        )
    }

    /// Predict every row of `features`, returning `[n_samples, n_labels]`.
    ///
    /// Row `i` draws from a generator seeded with `seed + i`.
    pub fn predict(&self, features: ArrayView2<'_, f32>) -> Result<Array2<usize>> {
        let seed = self.config.seed;
        let rows = run_with_threads(self.config.n_threads, |parallelism| {
            parallelism.maybe_par_map(0..features.nrows(), |row| {
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed.wrapping_add(row as u64));
                self.predict_instance(features.row(row), &mut rng)
                    .map(|p| p.path.labels)
            })
        });
        collect_rows(rows, self.population.best_slot().model.n_labels())
    }

    pub fn population(&self) -> &PopulationModel {
        &self.population
    }

    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }
}
