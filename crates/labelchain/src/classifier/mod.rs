//! Conditional classifier contract.
//!
//! A chain never trains a model itself. For every label it asks a
//! [`ClassifierFactory`] to build a [`LabelClassifier`] from a
//! [`NodeTrainingSet`]: the features plus the *true* values of the label's
//! parents. At prediction time the classifier receives a
//! [`ConditionalInput`]: the features plus the parents' predicted (or forced)
//! values, in the same parent order used during training.
//!
//! Only [`LabelClassifier::distribution`] is required; `classify` and
//! `sample` derive from it unless a classifier has a cheaper way.

mod frequency;

pub use frequency::{FrequencyClassifier, FrequencyFactory};

use ndarray::{ArrayView1, ArrayView2};
use rand::RngCore;

use crate::error::CollaboratorError;
use crate::utils::{argmax, sample_index};

// =============================================================================
// Inputs
// =============================================================================

/// Input for one conditional prediction.
#[derive(Debug, Clone, Copy)]
pub struct ConditionalInput<'a> {
    /// Features of the instance.
    pub features: ArrayView1<'a, f32>,
    /// Values of the parent labels, in parent-set order.
    pub parent_values: &'a [usize],
}

impl<'a> ConditionalInput<'a> {
    pub fn new(features: ArrayView1<'a, f32>, parent_values: &'a [usize]) -> Self {
        Self {
            features,
            parent_values,
        }
    }
}

/// Training data for one chain node.
#[derive(Debug, Clone, Copy)]
pub struct NodeTrainingSet<'a> {
    /// Label this node predicts.
    pub label: usize,
    /// Parent labels, in the column order of `parent_values`.
    pub parents: &'a [usize],
    /// Size of the label's value space.
    pub n_values: usize,
    /// Features `[n_samples, n_features]`.
    pub features: ArrayView2<'a, f32>,
    /// True parent values `[n_samples, n_parents]`.
    pub parent_values: ArrayView2<'a, usize>,
    /// True values of the label, length `n_samples`.
    pub target: ArrayView1<'a, usize>,
}

impl NodeTrainingSet<'_> {
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.target.len()
    }
}

// =============================================================================
// Traits
// =============================================================================

/// A trained conditional model for one label.
///
/// Implementations must be immutable after training: the same instance is
/// shared across threads and across chains.
pub trait LabelClassifier: Send + Sync {
    /// Probability of every value of the label, length `K_j`.
    fn distribution(&self, input: ConditionalInput<'_>) -> Result<Vec<f64>, CollaboratorError>;

    /// Most probable value and its probability. Ties go to the lowest value.
    fn classify(&self, input: ConditionalInput<'_>) -> Result<(usize, f64), CollaboratorError> {
        let dist = self.distribution(input)?;
        let value = argmax(&dist);
        Ok((value, dist.get(value).copied().unwrap_or(0.0)))
    }

    /// Draw a value from the predicted distribution.
    ///
    /// Returns the value and the probability the model assigned to it.
    fn sample(
        &self,
        input: ConditionalInput<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<(usize, f64), CollaboratorError> {
        let dist = self.distribution(input)?;
        let value = sample_index(&dist, rng);
        Ok((value, dist.get(value).copied().unwrap_or(0.0)))
    }
}

/// Builds a [`LabelClassifier`] for one chain node.
pub trait ClassifierFactory: Send + Sync {
    fn build(
        &self,
        training: &NodeTrainingSet<'_>,
    ) -> Result<Box<dyn LabelClassifier>, CollaboratorError>;
}

impl<F> ClassifierFactory for F
where
    F: Fn(&NodeTrainingSet<'_>) -> Result<Box<dyn LabelClassifier>, CollaboratorError>
        + Send
        + Sync,
{
    fn build(
        &self,
        training: &NodeTrainingSet<'_>,
    ) -> Result<Box<dyn LabelClassifier>, CollaboratorError> {
        self(training)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    struct Fixed(Vec<f64>);

    impl LabelClassifier for Fixed {
        fn distribution(&self, _: ConditionalInput<'_>) -> Result<Vec<f64>, CollaboratorError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn default_classify_is_argmax() {
        let x = array![1.0f32];
        let clf = Fixed(vec![0.2, 0.5, 0.3]);
        let (value, p) = clf.classify(ConditionalInput::new(x.view(), &[])).unwrap();
        assert_eq!(value, 1);
        approx::assert_abs_diff_eq!(p, 0.5);
    }

    #[test]
    fn default_sample_reports_probability_of_drawn_value() {
        let x = array![1.0f32];
        let clf = Fixed(vec![0.25, 0.75]);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        for _ in 0..50 {
            let (value, p) = clf.sample(ConditionalInput::new(x.view(), &[]), &mut rng).unwrap();
            let expected = if value == 0 { 0.25 } else { 0.75 };
            approx::assert_abs_diff_eq!(p, expected);
        }
    }

    #[test]
    fn closures_are_factories() {
        let factory = |_: &NodeTrainingSet<'_>| -> Result<Box<dyn LabelClassifier>, CollaboratorError> {
            Ok(Box::new(Fixed(vec![1.0, 0.0])))
        };
        let features = array![[0.0f32]];
        let parents = ndarray::Array2::<usize>::zeros((1, 0));
        let target = array![0usize];
        let training = NodeTrainingSet {
            label: 0,
            parents: &[],
            n_values: 2,
            features: features.view(),
            parent_values: parents.view(),
            target: target.view(),
        };
        let clf = factory.build(&training).unwrap();
        let x = array![0.0f32];
        assert_eq!(clf.classify(ConditionalInput::new(x.view(), &[])).unwrap().0, 0);
    }
}
