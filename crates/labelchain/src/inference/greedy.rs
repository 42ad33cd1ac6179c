//! Greedy one-pass inference and single path sampling.

use ndarray::ArrayView1;
use rand::RngCore;

use super::ChainPrediction;
use crate::chain::ChainModel;
use crate::error::Result;

/// Predict by walking the chain once, taking each node's most probable value.
///
/// Node `j` sees the values already predicted for its parents. The
/// confidence of each label is the probability of the chosen value.
///
/// # Errors
///
/// [`FeatureCountMismatch`](crate::ChainError::FeatureCountMismatch) for a
/// wrongly sized instance; classifier errors propagate unchanged.
pub fn greedy_predict(model: &ChainModel, features: ArrayView1<'_, f32>) -> Result<ChainPrediction> {
    model.check_features(features)?;

    let n_labels = model.n_labels();
    let mut labels = vec![0; n_labels];
    let mut confidences = vec![0.0; n_labels];
    for node in model.nodes() {
        let (value, p) = node.classify(features, &labels)?;
        labels[node.label()] = value;
        confidences[node.label()] = p;
    }

    Ok(ChainPrediction {
        labels,
        confidences,
    })
}

/// Draw one complete path: every node samples from its predicted
/// distribution given the values sampled for its parents.
pub fn sample_path(
    model: &ChainModel,
    features: ArrayView1<'_, f32>,
    rng: &mut dyn RngCore,
) -> Result<ChainPrediction> {
    model.check_features(features)?;

    let n_labels = model.n_labels();
    let mut labels = vec![0; n_labels];
    let mut confidences = vec![0.0; n_labels];
    for node in model.nodes() {
        let (value, p) = node.sample(features, &labels, rng)?;
        labels[node.label()] = value;
        confidences[node.label()] = p;
    }

    Ok(ChainPrediction {
        labels,
        confidences,
    })
}

impl ChainModel {
    /// Greedy prediction; see [`greedy_predict`].
    pub fn predict(&self, features: ArrayView1<'_, f32>) -> Result<ChainPrediction> {
        greedy_predict(self, features)
    }
}
