//! Payoff evaluation for chain search.
//!
//! Order search and the degraded population path score candidate chains
//! with an [`Evaluator`]: a named scalar computed from greedy predictions and
//! the ground truth. [`MetricEvaluator`] adapts any [`Metric`] to that
//! contract; callers with their own scoring implement [`Evaluator`]
//! directly.

mod metrics;

pub use metrics::{
    CustomMetric, CustomMetricFn, ExactMatch, HammingLoss, HammingScore, JaccardIndex, Metric,
    MetricFn,
};

use ndarray::{Array2, ArrayView2};

use crate::chain::ChainModel;
use crate::data::MultiLabelDataset;
use crate::error::{ChainError, CollaboratorError, Result};
use crate::inference::greedy_predict;

// =============================================================================
// MetricValue
// =============================================================================

/// A computed metric value with metadata.
///
/// Wraps a metric value with its name and direction information.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricValue {
    /// Name of the metric (e.g., "Exact match").
    pub name: String,
    /// The computed value.
    pub value: f64,
    /// Whether higher values are better (true for exact match, false for
    /// Hamming loss).
    pub higher_is_better: bool,
}

impl MetricValue {
    /// Create a new metric value.
    pub fn new(name: impl Into<String>, value: f64, higher_is_better: bool) -> Self {
        Self {
            name: name.into(),
            value,
            higher_is_better,
        }
    }

    /// Returns true if this value is strictly better than another.
    pub fn is_better_than(&self, other: &Self) -> bool {
        self.is_better_than_value(other.value)
    }

    /// Returns true if this value is strictly better than a raw value.
    pub fn is_better_than_value(&self, other_value: f64) -> bool {
        if self.higher_is_better {
            self.value > other_value
        } else {
            self.value < other_value
        }
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:.6}", self.name, self.value)
    }
}

// =============================================================================
// Evaluator
// =============================================================================

/// Scores a matrix of predicted label vectors against the truth.
///
/// Both matrices are `[n_samples, n_labels]`.
pub trait Evaluator: Send + Sync {
    /// Name reported in [`MetricValue::name`].
    fn name(&self) -> &str;

    /// Whether higher scores are better.
    fn higher_is_better(&self) -> bool;

    fn evaluate(
        &self,
        predictions: ArrayView2<'_, usize>,
        truth: ArrayView2<'_, usize>,
    ) -> std::result::Result<f64, CollaboratorError>;
}

/// [`Evaluator`] backed by a [`Metric`].
#[derive(Debug, Clone, Default)]
pub struct MetricEvaluator {
    metric: Metric,
}

impl MetricEvaluator {
    pub fn new(metric: Metric) -> Self {
        Self { metric }
    }

    pub fn metric(&self) -> &Metric {
        &self.metric
    }
}

impl Evaluator for MetricEvaluator {
    fn name(&self) -> &str {
        self.metric.name()
    }

    fn higher_is_better(&self) -> bool {
        self.metric.higher_is_better()
    }

    fn evaluate(
        &self,
        predictions: ArrayView2<'_, usize>,
        truth: ArrayView2<'_, usize>,
    ) -> std::result::Result<f64, CollaboratorError> {
        if predictions.dim() != truth.dim() {
            return Err(format!(
                "prediction shape {:?} does not match truth shape {:?}",
                predictions.dim(),
                truth.dim()
            )
            .into());
        }
        Ok(self.metric.compute(predictions, truth))
    }
}

// =============================================================================
// Chain payoff
// =============================================================================

/// Greedy predictions for every sample, `[n_samples, n_labels]`.
pub fn predict_dataset(model: &ChainModel, dataset: &MultiLabelDataset) -> Result<Array2<usize>> {
    let mut predictions = Array2::zeros((dataset.n_samples(), model.n_labels()));
    for (sample, mut row) in predictions.rows_mut().into_iter().enumerate() {
        let prediction = greedy_predict(model, dataset.instance(sample))?;
        row.iter_mut()
            .zip(prediction.labels)
            .for_each(|(slot, value)| *slot = value);
    }
    Ok(predictions)
}

/// Payoff of a chain: the evaluator's score of its greedy predictions on
/// `dataset`.
///
/// # Errors
///
/// Classifier failures propagate; evaluator failures become
/// [`ChainError::Evaluator`].
pub fn chain_payoff(
    model: &ChainModel,
    dataset: &MultiLabelDataset,
    evaluator: &dyn Evaluator,
) -> Result<MetricValue> {
    let predictions = predict_dataset(model, dataset)?;
    let value = evaluator
        .evaluate(predictions.view(), dataset.labels())
        .map_err(ChainError::Evaluator)?;
    Ok(MetricValue::new(
        evaluator.name(),
        value,
        evaluator.higher_is_better(),
    ))
}
