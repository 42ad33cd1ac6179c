//! Trained population and weighted inference.

use ndarray::ArrayView1;
use rand::distributions::{Distribution, WeightedIndex};
use rand::RngCore;

use crate::chain::{ChainModel, ChainOrder};
use crate::error::Result;
use crate::inference::{greedy_predict, sample_path, StochasticPrediction, StochasticSearch};
use crate::utils::confidence_product;

/// One member of a population.
#[derive(Debug, Clone)]
pub struct PopulationSlot {
    pub order: ChainOrder,
    pub model: ChainModel,
    /// Raw aggregate weight measured during training.
    pub score: f64,
    /// Normalized weight; all slots of a population sum to 1.
    pub weight: f64,
}

/// A weighted set of chains over the same labels.
#[derive(Debug, Clone)]
pub struct PopulationModel {
    slots: Vec<PopulationSlot>,
    /// Index of the heaviest slot, ties broken by raw score.
    best: usize,
}

impl PopulationModel {
    /// Wrap a non-empty set of slots whose weights are already normalized.
    pub(crate) fn from_slots(slots: Vec<PopulationSlot>) -> Self {
        let best = (0..slots.len())
            .reduce(|best, i| {
                let (candidate, incumbent) = (&slots[i], &slots[best]);
                let heavier = candidate
                    .weight
                    .total_cmp(&incumbent.weight)
                    .then(candidate.score.total_cmp(&incumbent.score));
                if heavier.is_gt() {
                    i
                } else {
                    best
                }
            })
            .unwrap_or(0);
        Self { slots, best }
    }

    pub fn slots(&self) -> &[PopulationSlot] {
        &self.slots
    }

    /// Number of chains, at least 1.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Normalized weight of every slot.
    pub fn weights(&self) -> Vec<f64> {
        self.slots.iter().map(|s| s.weight).collect()
    }

    /// Slot with the largest weight. Equal weights (e.g. after every score
    /// underflowed to zero) go to the larger raw score, then to the first slot.
    pub fn best_slot(&self) -> &PopulationSlot {
        &self.slots[self.best]
    }

    /// Weighted stochastic inference.
    ///
    /// Starts from the greedy path of the heaviest chain. For `iterations`
    /// rounds a slot is drawn with probability equal to its weight, a full
    /// path is sampled from that slot's chain, and the path replaces the
    /// incumbent iff its confidence product is strictly larger.
    pub fn predict(
        &self,
        features: ArrayView1<'_, f32>,
        iterations: usize,
        probability_floor: Option<f64>,
        rng: &mut dyn RngCore,
    ) -> Result<StochasticPrediction> {
        let best = self.best_slot();
        let start = greedy_predict(&best.model, features)?;
        let start_score = confidence_product(&start.confidences, probability_floor);

        let search = StochasticSearch {
            iterations,
            probability_floor,
        };
        let chooser = WeightedIndex::new(self.weights()).ok();
        search.climb(start, start_score, rng, |rng| {
            let model = match &chooser {
                Some(dist) => &self.slots[dist.sample(rng)].model,
                None => &best.model,
            };
            sample_path(model, features, rng)
        })
    }

    /// Models in slot order.
    pub fn models(&self) -> impl Iterator<Item = &ChainModel> {
        self.slots.iter().map(|s| &s.model)
    }
}
