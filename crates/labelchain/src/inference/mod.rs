//! Inference over trained chains.
//!
//! Three ways to turn a [`ChainModel`](crate::chain::ChainModel) and one
//! feature vector into a label vector:
//!
//! | Routine | Cost | Result |
//! |---------|------|--------|
//! | [`greedy_predict`] | one pass | argmax per node, conditioned on earlier predictions |
//! | [`StochasticSearch`] | `T` sampled paths | best path by confidence product |
//! | [`ExhaustiveSearch`] | `min(Π K_j, cap)` forced paths | joint mode, flagged if truncated |
//!
//! Every routine accepts plain and tree chains alike. Weighted inference over
//! several chains lives in [`population`](crate::population).

mod exhaustive;
mod greedy;
mod stochastic;

pub use exhaustive::{
    Combinations, ExhaustivePrediction, ExhaustiveSearch, DEFAULT_MAX_COMBINATIONS,
};
pub use greedy::{greedy_predict, sample_path};
pub use stochastic::{stochastic_predict, StochasticPrediction, StochasticSearch};

use crate::utils::confidence_product;

/// A predicted label vector with per-label confidences.
///
/// Both vectors are indexed by label, not by chain position.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainPrediction {
    /// Predicted value of every label.
    pub labels: Vec<usize>,
    /// Probability the label's node assigned to its predicted value.
    pub confidences: Vec<f64>,
}

impl ChainPrediction {
    /// Product of the confidences, the joint-probability proxy of the path.
    ///
    /// See [`confidence_product`] for the meaning of `floor`.
    #[inline]
    pub fn joint_confidence(&self, floor: Option<f64>) -> f64 {
        confidence_product(&self.confidences, floor)
    }

    #[inline]
    pub fn n_labels(&self) -> usize {
        self.labels.len()
    }
}
