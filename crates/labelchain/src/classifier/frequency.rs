//! Conditional frequency table classifier.
//!
//! Estimates `P(y_j | parents)` by counting label values per observed tuple
//! of parent values, with additive (Laplace) smoothing. Tuples never seen in
//! training fall back to the label's marginal distribution. Features are
//! ignored, which makes the model cheap and fully deterministic: a useful
//! baseline and the reference collaborator in tests and benches.

use std::collections::HashMap;

use ndarray::Axis;

use super::{ClassifierFactory, ConditionalInput, LabelClassifier, NodeTrainingSet};
use crate::error::CollaboratorError;

/// Laplace-smoothed conditional frequency table.
#[derive(Debug, Clone)]
pub struct FrequencyClassifier {
    n_values: usize,
    smoothing: f64,
    marginal: Vec<f64>,
    conditional: HashMap<Box<[usize]>, Vec<f64>>,
}

impl FrequencyClassifier {
    /// Count value frequencies in `training`.
    pub fn fit(training: &NodeTrainingSet<'_>, smoothing: f64) -> Self {
        let n_values = training.n_values;
        let mut marginal = vec![0.0; n_values];
        let mut conditional: HashMap<Box<[usize]>, Vec<f64>> = HashMap::new();

        for (row, &value) in training
            .parent_values
            .axis_iter(Axis(0))
            .zip(training.target.iter())
        {
            marginal[value] += 1.0;
            let key: Box<[usize]> = row.iter().copied().collect();
            conditional.entry(key).or_insert_with(|| vec![0.0; n_values])[value] += 1.0;
        }

        Self {
            n_values,
            smoothing,
            marginal,
            conditional,
        }
    }

    /// Number of distinct parent tuples seen in training.
    pub fn n_contexts(&self) -> usize {
        self.conditional.len()
    }

    fn normalized(&self, counts: &[f64]) -> Vec<f64> {
        let total: f64 = counts.iter().sum::<f64>() + self.smoothing * self.n_values as f64;
        if total <= 0.0 {
            return vec![1.0 / self.n_values as f64; self.n_values];
        }
        counts
            .iter()
            .map(|&c| (c + self.smoothing) / total)
            .collect()
    }
}

impl LabelClassifier for FrequencyClassifier {
    fn distribution(&self, input: ConditionalInput<'_>) -> Result<Vec<f64>, CollaboratorError> {
        let counts = self
            .conditional
            .get(input.parent_values)
            .unwrap_or(&self.marginal);
        Ok(self.normalized(counts))
    }
}

/// Factory producing [`FrequencyClassifier`]s.
#[derive(Debug, Clone, Copy)]
pub struct FrequencyFactory {
    /// Additive smoothing per value. Default: 1.0.
    pub smoothing: f64,
}

impl FrequencyFactory {
    pub fn new(smoothing: f64) -> Self {
        Self { smoothing }
    }
}

impl Default for FrequencyFactory {
    fn default() -> Self {
        Self { smoothing: 1.0 }
    }
}

impl ClassifierFactory for FrequencyFactory {
    fn build(
        &self,
        training: &NodeTrainingSet<'_>,
    ) -> Result<Box<dyn LabelClassifier>, CollaboratorError> {
        if !(self.smoothing >= 0.0) {
            return Err(format!("smoothing must be >= 0, got {}", self.smoothing).into());
        }
        Ok(Box::new(FrequencyClassifier::fit(training, self.smoothing)))
    }
}
