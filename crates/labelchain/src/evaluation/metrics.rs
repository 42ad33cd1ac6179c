//! Multi-label payoff metrics.
//!
//! Metrics compare a prediction matrix with the ground truth, both
//! `[n_samples, n_labels]` of label values. A label counts as *relevant* in
//! a row when its value is non-zero (used by set-based metrics).
//!
//! # Available Metrics
//!
//! - [`ExactMatch`]: fraction of rows predicted perfectly (default payoff)
//! - [`HammingScore`]: fraction of individual labels predicted correctly
//! - [`HammingLoss`]: `1 - HammingScore`, lower is better
//! - [`JaccardIndex`]: mean intersection-over-union of relevant label sets

use std::sync::Arc;

use ndarray::{ArrayView2, Axis, Zip};

// =============================================================================
// MetricFn Trait
// =============================================================================

/// A metric computed from predicted and true label matrices.
pub trait MetricFn: Send + Sync {
    /// Compute the metric. Shapes are checked by the caller.
    fn compute(&self, predictions: ArrayView2<usize>, truth: ArrayView2<usize>) -> f64;

    /// Whether higher values indicate better performance.
    fn higher_is_better(&self) -> bool;

    /// Name of the metric (for logging).
    fn name(&self) -> &'static str;
}

// =============================================================================
// Built-in Metrics
// =============================================================================

/// Fraction of rows where every label is correct.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl MetricFn for ExactMatch {
    fn compute(&self, predictions: ArrayView2<usize>, truth: ArrayView2<usize>) -> f64 {
        let n_rows = predictions.nrows();
        if n_rows == 0 {
            return 0.0;
        }
        let exact = predictions
            .axis_iter(Axis(0))
            .zip(truth.axis_iter(Axis(0)))
            .filter(|(p, t)| p == t)
            .count();
        exact as f64 / n_rows as f64
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "Exact match"
    }
}

/// Fraction of `(row, label)` entries predicted correctly.
#[derive(Debug, Clone, Copy, Default)]
pub struct HammingScore;

impl MetricFn for HammingScore {
    fn compute(&self, predictions: ArrayView2<usize>, truth: ArrayView2<usize>) -> f64 {
        let n = predictions.len();
        if n == 0 {
            return 0.0;
        }
        let mut correct = 0usize;
        Zip::from(&predictions).and(&truth).for_each(|p, t| {
            if p == t {
                correct += 1;
            }
        });
        correct as f64 / n as f64
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "Hamming score"
    }
}

/// Fraction of `(row, label)` entries predicted wrongly.
#[derive(Debug, Clone, Copy, Default)]
pub struct HammingLoss;

impl MetricFn for HammingLoss {
    fn compute(&self, predictions: ArrayView2<usize>, truth: ArrayView2<usize>) -> f64 {
        if predictions.is_empty() {
            return 0.0;
        }
        1.0 - HammingScore.compute(predictions, truth)
    }

    fn higher_is_better(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "Hamming loss"
    }
}

/// Mean Jaccard index of the relevant label sets.
///
/// A row where neither side has a relevant label scores 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct JaccardIndex;

impl MetricFn for JaccardIndex {
    fn compute(&self, predictions: ArrayView2<usize>, truth: ArrayView2<usize>) -> f64 {
        let n_rows = predictions.nrows();
        if n_rows == 0 {
            return 0.0;
        }
        let total: f64 = predictions
            .axis_iter(Axis(0))
            .zip(truth.axis_iter(Axis(0)))
            .map(|(p, t)| {
                let (mut intersection, mut union) = (0usize, 0usize);
                for (&pv, &tv) in p.iter().zip(t.iter()) {
                    let (pr, tr) = (pv != 0, tv != 0);
                    if pr && tr && pv == tv {
                        intersection += 1;
                    }
                    if pr || tr {
                        union += 1;
                    }
                }
                if union == 0 {
                    1.0
                } else {
                    intersection as f64 / union as f64
                }
            })
            .sum();
        total / n_rows as f64
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "Jaccard index"
    }
}

// =============================================================================
// Custom Metric
// =============================================================================

/// Type alias for the custom metric compute function.
pub type CustomMetricFn =
    Box<dyn Fn(ArrayView2<usize>, ArrayView2<usize>) -> f64 + Send + Sync + 'static>;

/// A user-provided metric defined by a closure.
///
/// ```
/// use labelchain::evaluation::{CustomMetric, Metric, MetricFn};
///
/// // fraction of rows whose first label is right
/// let first_label = Metric::custom(CustomMetric::new(
///     "first label",
///     |pred, truth| {
///         let hits = pred.column(0).iter().zip(truth.column(0)).filter(|(p, t)| p == t).count();
///         hits as f64 / pred.nrows() as f64
///     },
///     true,
/// ));
/// assert_eq!(first_label.name(), "first label");
/// ```
pub struct CustomMetric {
    /// Name of the metric (for logging).
    pub name: &'static str,
    compute_fn: CustomMetricFn,
    /// Whether higher values indicate better performance.
    pub higher_is_better: bool,
}

impl CustomMetric {
    pub fn new(
        name: &'static str,
        compute_fn: impl Fn(ArrayView2<usize>, ArrayView2<usize>) -> f64 + Send + Sync + 'static,
        higher_is_better: bool,
    ) -> Self {
        Self {
            name,
            compute_fn: Box::new(compute_fn),
            higher_is_better,
        }
    }

    pub fn compute(&self, predictions: ArrayView2<usize>, truth: ArrayView2<usize>) -> f64 {
        (self.compute_fn)(predictions, truth)
    }
}

impl std::fmt::Debug for CustomMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomMetric")
            .field("name", &self.name)
            .field("higher_is_better", &self.higher_is_better)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Metric Enum
// =============================================================================

/// A runtime-selected payoff metric.
#[derive(Clone, Default)]
pub enum Metric {
    /// Exact match ratio.
    #[default]
    ExactMatch,
    /// Hamming score.
    HammingScore,
    /// Hamming loss.
    HammingLoss,
    /// Jaccard index.
    JaccardIndex,
    /// Custom user-provided metric.
    Custom(Arc<CustomMetric>),
}

impl std::fmt::Debug for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExactMatch => f.write_str("ExactMatch"),
            Self::HammingScore => f.write_str("HammingScore"),
            Self::HammingLoss => f.write_str("HammingLoss"),
            Self::JaccardIndex => f.write_str("JaccardIndex"),
            Self::Custom(inner) => f.debug_tuple("Custom").field(inner).finish(),
        }
    }
}

impl Metric {
    /// Custom user-provided metric.
    pub fn custom(metric: CustomMetric) -> Self {
        Self::Custom(Arc::new(metric))
    }

    /// Look up a built-in metric by its display name or a snake_case alias.
    ///
    /// Matching ignores case: `"Exact match"`, `"exact_match"` and
    /// `"EXACT MATCH"` all resolve to [`Metric::ExactMatch`].
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "exact match" | "subset accuracy" => Some(Self::ExactMatch),
            "hamming score" | "accuracy per label" => Some(Self::HammingScore),
            "hamming loss" => Some(Self::HammingLoss),
            "jaccard index" | "jaccard" => Some(Self::JaccardIndex),
            _ => None,
        }
    }
}

impl MetricFn for Metric {
    fn compute(&self, predictions: ArrayView2<usize>, truth: ArrayView2<usize>) -> f64 {
        match self {
            Self::ExactMatch => ExactMatch.compute(predictions, truth),
            Self::HammingScore => HammingScore.compute(predictions, truth),
            Self::HammingLoss => HammingLoss.compute(predictions, truth),
            Self::JaccardIndex => JaccardIndex.compute(predictions, truth),
            Self::Custom(inner) => inner.compute(predictions, truth),
        }
    }

    fn higher_is_better(&self) -> bool {
        match self {
            Self::ExactMatch => ExactMatch.higher_is_better(),
            Self::HammingScore => HammingScore.higher_is_better(),
            Self::HammingLoss => HammingLoss.higher_is_better(),
            Self::JaccardIndex => JaccardIndex.higher_is_better(),
            Self::Custom(inner) => inner.higher_is_better,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::ExactMatch => ExactMatch.name(),
            Self::HammingScore => HammingScore.name(),
            Self::HammingLoss => HammingLoss.name(),
            Self::JaccardIndex => JaccardIndex.name(),
            Self::Custom(inner) => inner.name,
        }
    }
}
