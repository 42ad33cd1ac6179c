//! [`ChainNode`]: one label's conditional model inside a chain.

use std::sync::Arc;

use ndarray::{ArrayView1, Axis};
use rand::RngCore;

use crate::classifier::{ClassifierFactory, ConditionalInput, LabelClassifier, NodeTrainingSet};
use crate::data::MultiLabelDataset;
use crate::error::{ChainError, Result};

/// A trained conditional classifier for one label and its parent set.
///
/// Nodes are immutable once trained. Cloning shares the classifier, which
/// lets a rebuilt chain reuse nodes whose parent set did not change.
#[derive(Clone)]
pub struct ChainNode {
    label: usize,
    parents: Box<[usize]>,
    n_values: usize,
    classifier: Arc<dyn LabelClassifier>,
}

impl ChainNode {
    /// Train the node for `label` on the true values of `parents`.
    pub(crate) fn train(
        label: usize,
        parents: &[usize],
        dataset: &MultiLabelDataset,
        factory: &dyn ClassifierFactory,
    ) -> Result<Self> {
        let n_values = dataset.value_space()[label];
        let parent_values = dataset.labels().select(Axis(1), parents);
        let training = NodeTrainingSet {
            label,
            parents,
            n_values,
            features: dataset.features(),
            parent_values: parent_values.view(),
            target: dataset.label_column(label),
        };

        let classifier = factory
            .build(&training)
            .map_err(|source| ChainError::Classifier { label, source })?;

        Ok(Self {
            label,
            parents: parents.into(),
            n_values,
            classifier: Arc::from(classifier),
        })
    }

    /// Wrap an already trained classifier.
    pub fn from_parts(
        label: usize,
        parents: Vec<usize>,
        n_values: usize,
        classifier: Arc<dyn LabelClassifier>,
    ) -> Self {
        Self {
            label,
            parents: parents.into_boxed_slice(),
            n_values,
            classifier,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn label(&self) -> usize {
        self.label
    }

    #[inline]
    pub fn parents(&self) -> &[usize] {
        &self.parents
    }

    #[inline]
    pub fn n_values(&self) -> usize {
        self.n_values
    }

    pub fn classifier(&self) -> &Arc<dyn LabelClassifier> {
        &self.classifier
    }

    // =========================================================================
    // Conditional prediction
    // =========================================================================

    /// Parent values read out of a full label vector.
    #[inline]
    fn parent_values(&self, labels: &[usize]) -> Vec<usize> {
        self.parents.iter().map(|&p| labels[p]).collect()
    }

    /// Distribution over this label's values given the parents' values in
    /// `labels` (indexed by label, entries of non-parents are ignored).
    pub fn distribution(&self, features: ArrayView1<'_, f32>, labels: &[usize]) -> Result<Vec<f64>> {
        let parent_values = self.parent_values(labels);
        let dist = self
            .classifier
            .distribution(ConditionalInput::new(features.view(), &parent_values))
            .map_err(|source| self.failure(source))?;
        if dist.len() != self.n_values {
            return Err(ChainError::DistributionLength {
                label: self.label,
                expected: self.n_values,
                got: dist.len(),
            });
        }
        Ok(dist)
    }

    /// Most probable value and its probability.
    pub fn classify(&self, features: ArrayView1<'_, f32>, labels: &[usize]) -> Result<(usize, f64)> {
        let parent_values = self.parent_values(labels);
        let (value, p) = self
            .classifier
            .classify(ConditionalInput::new(features.view(), &parent_values))
            .map_err(|source| self.failure(source))?;
        self.check_value(value)?;
        Ok((value, p))
    }

    /// Value drawn from the predicted distribution and its probability.
    pub fn sample(
        &self,
        features: ArrayView1<'_, f32>,
        labels: &[usize],
        rng: &mut dyn RngCore,
    ) -> Result<(usize, f64)> {
        let parent_values = self.parent_values(labels);
        let (value, p) = self
            .classifier
            .sample(ConditionalInput::new(features.view(), &parent_values), rng)
            .map_err(|source| self.failure(source))?;
        self.check_value(value)?;
        Ok((value, p))
    }

    fn check_value(&self, value: usize) -> Result<()> {
        if value >= self.n_values {
            return Err(self.failure(
                format!("value {value} outside value space of size {}", self.n_values).into(),
            ));
        }
        Ok(())
    }

    fn failure(&self, source: crate::error::CollaboratorError) -> ChainError {
        ChainError::Classifier {
            label: self.label,
            source,
        }
    }
}

impl std::fmt::Debug for ChainNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainNode")
            .field("label", &self.label)
            .field("parents", &self.parents)
            .field("n_values", &self.n_values)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    use super::*;
    use crate::error::CollaboratorError;

    /// Puts all mass on the value of its single parent.
    struct CopyParent;

    impl LabelClassifier for CopyParent {
        fn distribution(
            &self,
            input: ConditionalInput<'_>,
        ) -> std::result::Result<Vec<f64>, CollaboratorError> {
            let mut dist = vec![0.0; 3];
            dist[input.parent_values[0]] = 1.0;
            Ok(dist)
        }
    }

    fn node() -> ChainNode {
        ChainNode::from_parts(2, vec![0], 3, Arc::new(CopyParent))
    }

    #[test]
    fn parent_values_are_read_from_the_label_vector() {
        let node = node();
        let x = array![0.5f32, 1.5];
        // Label 1 is not a parent and is ignored.
        let labels = [2, 1, 0];

        assert_eq!(node.distribution(x.view(), &labels).unwrap(), vec![0.0, 0.0, 1.0]);
        assert_eq!(node.classify(x.view(), &labels).unwrap(), (2, 1.0));
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        assert_eq!(node.sample(x.view(), &labels, &mut rng).unwrap(), (2, 1.0));
    }

    #[test]
    fn wrong_distribution_length_is_reported() {
        struct Short;
        impl LabelClassifier for Short {
            fn distribution(
                &self,
                _: ConditionalInput<'_>,
            ) -> std::result::Result<Vec<f64>, CollaboratorError> {
                Ok(vec![1.0])
            }
        }
        let node = ChainNode::from_parts(0, vec![], 2, Arc::new(Short));
        let x = array![0.0f32];
        let err = node.distribution(x.view(), &[0]).unwrap_err();
        assert!(matches!(
            err,
            ChainError::DistributionLength { label: 0, expected: 2, got: 1 }
        ));
    }
}
