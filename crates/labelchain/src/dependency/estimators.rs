//! Mutual-information dependence estimators.

use std::sync::Arc;

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use super::DependencyEstimator;
use crate::chain::ChainNode;
use crate::classifier::ClassifierFactory;
use crate::data::MultiLabelDataset;
use crate::error::CollaboratorError;

/// Mutual information (in nats) between two discrete columns.
///
/// `a` takes values in `[0, k_a)` and `b` in `[0, k_b)`. Empty columns have
/// zero mutual information.
pub fn mutual_information(
    a: ArrayView1<'_, usize>,
    b: ArrayView1<'_, usize>,
    k_a: usize,
    k_b: usize,
) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }

    let mut joint = Array2::<f64>::zeros((k_a, k_b));
    for (&va, &vb) in a.iter().zip(b.iter()) {
        joint[[va, vb]] += 1.0;
    }
    joint /= n as f64;
    let p_a = joint.sum_axis(Axis(1));
    let p_b = joint.sum_axis(Axis(0));

    joint
        .indexed_iter()
        .filter(|&(_, &p)| p > 0.0)
        .map(|((i, j), &p)| p * (p / (p_a[i] * p_b[j])).ln())
        .sum::<f64>()
        .max(0.0)
}

/// Symmetric MI matrix over the columns of `values`, zero diagonal.
fn pairwise_information(values: ArrayView2<'_, usize>, value_space: &[usize]) -> Array2<f64> {
    let n_labels = values.ncols();
    let mut matrix = Array2::zeros((n_labels, n_labels));
    for a in 0..n_labels {
        for b in (a + 1)..n_labels {
            let mi = mutual_information(
                values.column(a),
                values.column(b),
                value_space[a],
                value_space[b],
            );
            matrix[[a, b]] = mi;
            matrix[[b, a]] = mi;
        }
    }
    matrix
}

// =============================================================================
// Frequency-based
// =============================================================================

/// Dependence as the mutual information of label co-occurrence.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarginalDependence;

impl DependencyEstimator for MarginalDependence {
    fn estimate(&self, dataset: &MultiLabelDataset) -> Result<Array2<f64>, CollaboratorError> {
        Ok(pairwise_information(dataset.labels(), dataset.value_space()))
    }
}

// =============================================================================
// Error-based
// =============================================================================

/// Dependence as the mutual information of per-label prediction errors.
///
/// One classifier per label is trained without parents; for every sample
/// the indicator "label `j` was mispredicted" is recorded. Labels whose
/// errors co-occur are dependent given the features.
#[derive(Clone)]
pub struct ConditionalDependence {
    factory: Arc<dyn ClassifierFactory>,
}

impl ConditionalDependence {
    pub fn new(factory: Arc<dyn ClassifierFactory>) -> Self {
        Self { factory }
    }
}

impl std::fmt::Debug for ConditionalDependence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionalDependence").finish_non_exhaustive()
    }
}

impl DependencyEstimator for ConditionalDependence {
    fn estimate(&self, dataset: &MultiLabelDataset) -> Result<Array2<f64>, CollaboratorError> {
        let n_labels = dataset.n_labels();
        let mut errors = Array2::<usize>::zeros((dataset.n_samples(), n_labels));

        for label in 0..n_labels {
            let node = ChainNode::train(label, &[], dataset, self.factory.as_ref())?;
            for (sample, &truth) in dataset.label_column(label).iter().enumerate() {
                let (value, _) = node.classify(dataset.instance(sample), &[])?;
                errors[[sample, label]] = usize::from(value != truth);
            }
        }

        Ok(pairwise_information(errors.view(), &vec![2; n_labels]))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::classifier::{ConditionalInput, FrequencyFactory, LabelClassifier, NodeTrainingSet};

    #[test]
    fn identical_balanced_columns_share_one_bit() {
        let a = array![0usize, 1, 0, 1];
        let mi = mutual_information(a.view(), a.view(), 2, 2);
        approx::assert_abs_diff_eq!(mi, std::f64::consts::LN_2, epsilon = 1e-12);
    }

    #[test]
    fn independent_columns_have_zero_information() {
        let a = array![0usize, 0, 1, 1];
        let b = array![0usize, 1, 0, 1];
        approx::assert_abs_diff_eq!(mutual_information(a.view(), b.view(), 2, 2), 0.0);
    }

    #[test]
    fn marginal_matrix_is_symmetric_with_zero_diagonal() {
        let features = array![[0.0f32], [1.0], [2.0], [3.0]];
        let labels = array![[0, 0, 0], [1, 1, 0], [0, 0, 1], [1, 1, 1]];
        let ds = MultiLabelDataset::new(features.view(), labels.view()).unwrap();
        let m = MarginalDependence.estimate(&ds).unwrap();
        assert_eq!(m.dim(), (3, 3));
        for i in 0..3 {
            assert_eq!(m[[i, i]], 0.0);
            for j in 0..3 {
                assert_eq!(m[[i, j]], m[[j, i]]);
            }
        }
        assert!(m[[0, 1]] > m[[0, 2]]);
    }

    /// Predicts value 1 whenever the first feature is positive.
    struct Threshold;

    impl LabelClassifier for Threshold {
        fn distribution(&self, input: ConditionalInput<'_>) -> Result<Vec<f64>, CollaboratorError> {
            Ok(if input.features[0] > 0.0 {
                vec![0.0, 1.0]
            } else {
                vec![1.0, 0.0]
            })
        }
    }

    #[test]
    fn conditional_dependence_tracks_shared_errors() {
        let factory = |_: &NodeTrainingSet<'_>| -> Result<Box<dyn LabelClassifier>, CollaboratorError> {
            Ok(Box::new(Threshold))
        };
        // labels 0 and 1 are wrong on the same samples, label 2 never is
        let features = array![[1.0f32], [-1.0], [1.0], [-1.0]];
        let labels = array![[0, 0, 1], [1, 1, 0], [1, 1, 1], [0, 0, 0]];
        let ds = MultiLabelDataset::new(features.view(), labels.view()).unwrap();

        let m = ConditionalDependence::new(Arc::new(factory)).estimate(&ds).unwrap();
        approx::assert_abs_diff_eq!(m[[0, 1]], std::f64::consts::LN_2, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(m[[0, 2]], 0.0);
    }

    #[test]
    fn conditional_dependence_with_frequency_factory() {
        let features = array![[0.0f32], [1.0], [2.0], [3.0]];
        let labels = array![[0, 0], [1, 1], [0, 0], [1, 0]];
        let ds = MultiLabelDataset::new(features.view(), labels.view()).unwrap();
        let estimator = ConditionalDependence::new(Arc::new(FrequencyFactory::default()));
        let m = estimator.estimate(&ds).unwrap();
        assert!(m.iter().all(|v| v.is_finite() && *v >= 0.0));
    }
}
