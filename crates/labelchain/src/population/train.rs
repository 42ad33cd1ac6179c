//! Population training: tournament replacement over proposed orders.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::{PopulationModel, PopulationSlot, WeightAggregation};
use crate::chain::{ChainModel, ChainOrder, ChainStructure, RebuildStrategy};
use crate::classifier::ClassifierFactory;
use crate::data::MultiLabelDataset;
use crate::error::{ChainError, Result};
use crate::evaluation::{Evaluator, MetricValue};
use crate::logger::{SearchLogger, Verbosity};
use crate::search::{OrderSearch, OrderSearchParams, SwapProposal};

/// Parameters for [`ChainPopulation`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationParams {
    /// Number of slots `M`. A population always holds at least one chain.
    pub population_size: usize,
    /// Number of proposals built after the first chain. Must exceed
    /// `population_size`, otherwise training degrades to one searched chain.
    pub iterations: usize,
    pub proposal: SwapProposal,
    pub aggregation: WeightAggregation,
    /// Clamp for probabilities entering the weights.
    pub probability_floor: Option<f64>,
    pub rebuild: RebuildStrategy,
    pub verbosity: Verbosity,
}

impl Default for PopulationParams {
    fn default() -> Self {
        Self {
            population_size: 10,
            iterations: 50,
            proposal: SwapProposal::annealed(),
            aggregation: WeightAggregation::Product,
            probability_floor: None,
            rebuild: RebuildStrategy::Full,
            verbosity: Verbosity::Silent,
        }
    }
}

/// Incumbent population threaded through the training loop.
struct PopulationState {
    slots: Vec<PopulationSlot>,
    capacity: usize,
    /// Index of the best slot so far.
    best: usize,
}

impl PopulationState {
    /// Slot to replace next and the score a candidate must beat.
    ///
    /// While the population is not full the next slot is empty (`None`) and
    /// any candidate with a score above `-inf` fills it. Otherwise the slot
    /// with the lowest score is chosen, the first on ties.
    fn weakest(&self) -> (Option<usize>, f64) {
        if self.slots.len() < self.capacity {
            return (None, f64::NEG_INFINITY);
        }
        self.slots
            .iter()
            .enumerate()
            .fold((None, f64::INFINITY), |weakest, (i, slot)| {
                if slot.score < weakest.1 {
                    (Some(i), slot.score)
                } else {
                    weakest
                }
            })
    }

    fn insert(&mut self, index: Option<usize>, slot: PopulationSlot) {
        match index {
            Some(i) => self.slots[i] = slot,
            None => self.slots.push(slot),
        }
        self.best = best_index(&self.slots);
    }
}

/// Trains a weighted population of chains.
///
/// Slot 0 starts from a random order. Every further iteration proposes a
/// neighbour of the best order so far, trains and weighs it, and replaces
/// the weakest slot iff the candidate's weight is strictly greater. Weights
/// are normalized to sum to 1 once the loop ends.
#[derive(Debug, Clone, Default)]
pub struct ChainPopulation {
    params: PopulationParams,
}

impl ChainPopulation {
    pub fn new(params: PopulationParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PopulationParams {
        &self.params
    }

    /// Train the population.
    ///
    /// When `iterations <= population_size` there are not enough proposals
    /// to fill the slots; an [`OrderSearch`] with the same iteration count
    /// scored by `evaluator` produces a single chain of weight 1 instead.
    ///
    /// # Errors
    ///
    /// Classifier failures abort training, as do evaluator failures on the
    /// single-chain path.
    pub fn train(
        &self,
        dataset: &MultiLabelDataset,
        factory: &dyn ClassifierFactory,
        evaluator: &dyn Evaluator,
        rng: &mut dyn RngCore,
    ) -> Result<PopulationModel> {
        let params = &self.params;
        if params.iterations <= params.population_size {
            return self.train_single(dataset, factory, evaluator, rng);
        }

        let aggregation = params.aggregation;
        let floor = params.probability_floor;

        let order = ChainOrder::random(dataset.n_labels(), rng);
        let model = ChainModel::build(ChainStructure::plain(order.clone()), dataset, factory)?;
        let score = aggregation.weigh(&model, dataset, floor)?;

        let state = PopulationState {
            slots: vec![PopulationSlot {
                order,
                model,
                score,
                weight: 0.0,
            }],
            capacity: params.population_size,
            best: 0,
        };

        let mut logger = SearchLogger::new("population", params.verbosity);
        logger.start(params.iterations, &weight_value(score));

        let state = (1..=params.iterations).try_fold(state, |mut state, iteration| {
            let best = &state.slots[state.best];
            let order = params.proposal.propose(&best.order, iteration, rng);
            let model = best.model.rebuild(
                ChainStructure::plain(order.clone()),
                dataset,
                factory,
                params.rebuild,
            )?;
            let score = aggregation.weigh(&model, dataset, floor)?;

            let (weakest, threshold) = state.weakest();
            if score > threshold {
                logger.log_accept(iteration, order.as_slice(), &weight_value(score));
                let slot = PopulationSlot {
                    order,
                    model,
                    score,
                    weight: 0.0,
                };
                state.insert(weakest, slot);
            } else {
                logger.log_reject(iteration, &weight_value(score));
            }
            Ok::<_, ChainError>(state)
        })?;

        let mut slots = state.slots;
        let raw: Vec<f64> = slots.iter().map(|s| s.score).collect();
        for (slot, weight) in slots.iter_mut().zip(aggregation.normalize(&raw)) {
            slot.weight = weight;
        }

        let population = PopulationModel::from_slots(slots);
        logger.finish(&weight_value(population.best_slot().score));
        tracing::debug!(
            slots = population.len(),
            weights = ?population.weights(),
            "population trained"
        );
        Ok(population)
    }

    fn train_single(
        &self,
        dataset: &MultiLabelDataset,
        factory: &dyn ClassifierFactory,
        evaluator: &dyn Evaluator,
        rng: &mut dyn RngCore,
    ) -> Result<PopulationModel> {
        let params = &self.params;
        SearchLogger::new("population", params.verbosity).warn(&format!(
            "{} iterations do not exceed population size {}; training a single chain",
            params.iterations, params.population_size
        ));

        let search = OrderSearch::new(OrderSearchParams {
            iterations: params.iterations,
            proposal: params.proposal,
            rebuild: params.rebuild,
            holdout_fraction: None,
            verbosity: params.verbosity,
        });
        let outcome = search.search(dataset, None, factory, evaluator, rng)?;
        let score = params
            .aggregation
            .weigh(&outcome.model, dataset, params.probability_floor)?;

        Ok(PopulationModel::from_slots(vec![PopulationSlot {
            order: outcome.order,
            model: outcome.model,
            score,
            weight: 1.0,
        }]))
    }
}

/// First index with the highest score.
fn best_index(slots: &[PopulationSlot]) -> usize {
    (0..slots.len())
        .reduce(|best, i| if slots[i].score > slots[best].score { i } else { best })
        .unwrap_or(0)
}

fn weight_value(score: f64) -> MetricValue {
    MetricValue::new("chain weight", score, true)
}
