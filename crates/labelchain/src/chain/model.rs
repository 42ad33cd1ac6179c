//! [`ChainModel`]: trained nodes laid out along a [`ChainStructure`].

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use super::{ChainNode, ChainOrder, ChainStructure};
use crate::classifier::ClassifierFactory;
use crate::data::MultiLabelDataset;
use crate::error::{ChainError, Result};

/// How a chain is rebuilt after its order changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebuildStrategy {
    /// Retrain every node.
    #[default]
    Full,
    /// Keep nodes whose label has exactly the same parent sequence as in the
    /// previous chain and retrain the rest.
    ///
    /// Only valid when the factory is deterministic and the chain is rebuilt
    /// on the same dataset, since reused nodes are not retrained. For a
    /// single swap of positions `i < k` in a plain chain this reuses the
    /// nodes before position `i`.
    ReuseUnchanged,
}

/// A trained chain: one [`ChainNode`] per label, stored in chain order.
#[derive(Debug, Clone)]
pub struct ChainModel {
    structure: ChainStructure,
    /// Nodes in processing order.
    nodes: Box<[ChainNode]>,
    /// `positions[label]` is the index of the label's node.
    positions: Box<[usize]>,
    n_features: usize,
}

impl ChainModel {
    /// Train one node per label in chain order.
    ///
    /// Node `j` is trained on the features plus the true values of
    /// `ParentSet(j)`. Because nodes are visited in order, every parent's
    /// node exists before its children.
    ///
    /// # Errors
    ///
    /// Structural errors if `structure` is invalid or sized for a different
    /// number of labels; [`ChainError::Classifier`] if any node fails to
    /// train. No node is retried.
    pub fn build(
        structure: ChainStructure,
        dataset: &MultiLabelDataset,
        factory: &dyn ClassifierFactory,
    ) -> Result<Self> {
        Self::check_structure(&structure, dataset)?;

        let nodes = structure
            .order()
            .iter()
            .map(|label| ChainNode::train(label, structure.parents_of(label), dataset, factory))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::assemble(structure, nodes, dataset.n_features()))
    }

    /// Build a chain for `structure`, reusing this chain's nodes as allowed by
    /// `strategy`.
    pub fn rebuild(
        &self,
        structure: ChainStructure,
        dataset: &MultiLabelDataset,
        factory: &dyn ClassifierFactory,
        strategy: RebuildStrategy,
    ) -> Result<Self> {
        match strategy {
            RebuildStrategy::Full => Self::build(structure, dataset, factory),
            RebuildStrategy::ReuseUnchanged => {
                Self::check_structure(&structure, dataset)?;
                if structure.n_labels() != self.n_labels() {
                    return Err(ChainError::LabelCountMismatch {
                        expected: self.n_labels(),
                        got: structure.n_labels(),
                    });
                }

                let nodes = structure
                    .order()
                    .iter()
                    .map(|label| {
                        let parents = structure.parents_of(label);
                        let previous = self.node(label);
                        if previous.parents() == parents {
                            Ok(previous.clone())
                        } else {
                            ChainNode::train(label, parents, dataset, factory)
                        }
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok(Self::assemble(structure, nodes, dataset.n_features()))
            }
        }
    }

    /// Assemble a chain from pre-trained nodes given in chain order.
    ///
    /// # Errors
    ///
    /// Fails if the nodes do not follow the structure's order and parent sets.
    pub fn from_nodes(
        structure: ChainStructure,
        nodes: Vec<ChainNode>,
        n_features: usize,
    ) -> Result<Self> {
        structure.validate()?;
        if nodes.len() != structure.n_labels() {
            return Err(ChainError::LabelCountMismatch {
                expected: structure.n_labels(),
                got: nodes.len(),
            });
        }
        for (node, label) in nodes.iter().zip(structure.order().iter()) {
            if node.label() != label || node.parents() != structure.parents_of(label) {
                let parent = node.parents().first().copied().unwrap_or(node.label());
                return Err(ChainError::MalformedParents {
                    label: node.label(),
                    parent,
                });
            }
            if node.n_values() == 0 {
                return Err(ChainError::InvalidValueSpace {
                    label,
                    n_values: 0,
                });
            }
        }
        Ok(Self::assemble(structure, nodes, n_features))
    }

    fn check_structure(structure: &ChainStructure, dataset: &MultiLabelDataset) -> Result<()> {
        structure.validate()?;
        if structure.n_labels() != dataset.n_labels() {
            return Err(ChainError::LabelCountMismatch {
                expected: dataset.n_labels(),
                got: structure.n_labels(),
            });
        }
        Ok(())
    }

    fn assemble(structure: ChainStructure, nodes: Vec<ChainNode>, n_features: usize) -> Self {
        let positions = structure.order().ranks().into_boxed_slice();
        Self {
            structure,
            nodes: nodes.into_boxed_slice(),
            positions,
            n_features,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn structure(&self) -> &ChainStructure {
        &self.structure
    }

    #[inline]
    pub fn order(&self) -> &ChainOrder {
        self.structure.order()
    }

    #[inline]
    pub fn n_labels(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Nodes in processing order.
    #[inline]
    pub fn nodes(&self) -> &[ChainNode] {
        &self.nodes
    }

    /// Node of `label`.
    ///
    /// # Panics
    ///
    /// Panics if `label >= n_labels()`.
    #[inline]
    pub fn node(&self, label: usize) -> &ChainNode {
        &self.nodes[self.positions[label]]
    }

    /// Value space size per label (indexed by label).
    pub fn value_space(&self) -> Vec<usize> {
        (0..self.n_labels())
            .map(|label| self.node(label).n_values())
            .collect()
    }

    /// Fail unless `features` has the training feature count.
    pub(crate) fn check_features(&self, features: ArrayView1<'_, f32>) -> Result<()> {
        if features.len() != self.n_features {
            return Err(ChainError::FeatureCountMismatch {
                expected: self.n_features,
                got: features.len(),
            });
        }
        Ok(())
    }

    /// Per-label conditional probability of a forced path.
    ///
    /// Every node evaluates `P(labels[j] | x, labels[parents(j)])` instead of
    /// making its own prediction. The result is indexed by label.
    pub fn path_probabilities(
        &self,
        features: ArrayView1<'_, f32>,
        labels: &[usize],
    ) -> Result<Vec<f64>> {
        self.check_features(features)?;
        if labels.len() != self.n_labels() {
            return Err(ChainError::LabelCountMismatch {
                expected: self.n_labels(),
                got: labels.len(),
            });
        }

        let mut probabilities = vec![0.0; self.n_labels()];
        for node in self.nodes.iter() {
            let dist = node.distribution(features, labels)?;
            let value = labels[node.label()];
            probabilities[node.label()] = dist.get(value).copied().unwrap_or(0.0);
        }
        Ok(probabilities)
    }

    /// Joint probability of a forced path: the product of
    /// [`path_probabilities`](Self::path_probabilities).
    pub fn path_probability(&self, features: ArrayView1<'_, f32>, labels: &[usize]) -> Result<f64> {
        Ok(self.path_probabilities(features, labels)?.iter().product())
    }
}
