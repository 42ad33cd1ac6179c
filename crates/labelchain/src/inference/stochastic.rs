//! Randomized hill-climbing over complete label paths.

use ndarray::ArrayView1;
use rand::RngCore;

use super::greedy::{greedy_predict, sample_path};
use super::ChainPrediction;
use crate::chain::ChainModel;
use crate::error::Result;
use crate::utils::confidence_product;

/// Result of [`StochasticSearch::predict`].
#[derive(Debug, Clone, PartialEq)]
pub struct StochasticPrediction {
    /// Best path found and its per-label confidences.
    pub path: ChainPrediction,
    /// Payoff of `path`: the product of its confidences.
    pub confidence_product: f64,
    /// Number of sampled paths that replaced the incumbent.
    pub accepted: usize,
}

/// Zero-temperature path search.
///
/// Starts from the greedy path, then for exactly `iterations` rounds draws a
/// complete new path from the chain and keeps it only if its confidence
/// product is strictly larger. There is no early exit; with `iterations = 0`
/// the greedy path is returned unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StochasticSearch {
    /// Number of sampled paths.
    pub iterations: usize,
    /// Clamp each confidence to at least this value before multiplying.
    /// `None` keeps raw probabilities, so zero-probability nodes make every
    /// candidate score zero.
    pub probability_floor: Option<f64>,
}

impl StochasticSearch {
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            probability_floor: None,
        }
    }

    pub fn with_probability_floor(mut self, floor: f64) -> Self {
        self.probability_floor = Some(floor);
        self
    }

    /// Run the search for one instance.
    pub fn predict(
        &self,
        model: &ChainModel,
        features: ArrayView1<'_, f32>,
        rng: &mut dyn RngCore,
    ) -> Result<StochasticPrediction> {
        let start = greedy_predict(model, features)?;
        let score = confidence_product(&start.confidences, self.probability_floor);
        self.climb(start, score, rng, |rng| sample_path(model, features, rng))
    }

    /// Hill-climb from `start` with candidates drawn by `draw`.
    ///
    /// Shared with population inference, which draws each candidate from a
    /// randomly chosen chain.
    pub(crate) fn climb<F>(
        &self,
        start: ChainPrediction,
        start_score: f64,
        rng: &mut dyn RngCore,
        mut draw: F,
    ) -> Result<StochasticPrediction>
    where
        F: FnMut(&mut dyn RngCore) -> Result<ChainPrediction>,
    {
        let initial = StochasticPrediction {
            path: start,
            confidence_product: start_score,
            accepted: 0,
        };

        (0..self.iterations).try_fold(initial, |best, _| {
            let candidate = draw(&mut *rng)?;
            let score = confidence_product(&candidate.confidences, self.probability_floor);
            Ok(if score > best.confidence_product {
                StochasticPrediction {
                    path: candidate,
                    confidence_product: score,
                    accepted: best.accepted + 1,
                }
            } else {
                best
            })
        })
    }
}

/// Stochastic prediction with raw probabilities; see [`StochasticSearch`].
pub fn stochastic_predict(
    model: &ChainModel,
    features: ArrayView1<'_, f32>,
    iterations: usize,
    rng: &mut dyn RngCore,
) -> Result<StochasticPrediction> {
    StochasticSearch::new(iterations).predict(model, features, rng)
}
