//! Tree linearization and the estimator-backed builder.

use std::sync::Arc;

use super::kruskal::minimum_spanning_tree;
use crate::chain::{ChainOrder, ChainStructure};
use crate::data::MultiLabelDataset;
use crate::dependency::{estimate_dependencies, DependencyEstimator, DependencyMatrix};
use crate::error::{ChainError, Result};

/// Build a tree chain from a dependency matrix, rooted at `root`.
///
/// The spanning tree maximizes total dependence. A depth-first walk from
/// `root` visits neighbours in ascending label order, assigns every label its
/// rank at first visit and records the label it was reached from as its
/// parent. The chain order lists labels by rank, so every parent precedes
/// its children.
///
/// # Errors
///
/// [`ChainError::RootOutOfRange`] if `root >= L`.
pub fn build_dependency_tree(matrix: &DependencyMatrix, root: usize) -> Result<ChainStructure> {
    let n_labels = matrix.n_labels();
    if root >= n_labels {
        return Err(ChainError::RootOutOfRange { root, n_labels });
    }

    let edges = minimum_spanning_tree(n_labels, |a, b| -matrix.get(a, b));

    let mut neighbours = vec![Vec::new(); n_labels];
    for edge in &edges {
        neighbours[edge.a].push(edge.b);
        neighbours[edge.b].push(edge.a);
    }
    for list in &mut neighbours {
        list.sort_unstable();
    }

    let mut ranks = vec![usize::MAX; n_labels];
    let mut parents = vec![None; n_labels];
    let mut next_rank = 0;
    let mut stack = vec![(root, None)];
    while let Some((label, parent)) = stack.pop() {
        if ranks[label] != usize::MAX {
            continue;
        }
        ranks[label] = next_rank;
        parents[label] = parent;
        next_rank += 1;
        // Reversed so the smallest neighbour is popped first.
        stack.extend(
            neighbours[label]
                .iter()
                .rev()
                .filter(|&&n| ranks[n] == usize::MAX)
                .map(|&n| (n, Some(label))),
        );
    }

    if next_rank != n_labels {
        return Err(ChainError::InvalidDependencyMatrix {
            reason: format!("spanning tree reaches {next_rank} of {n_labels} labels"),
        });
    }

    let order = ChainOrder::from_ranks(&ranks)?;
    ChainStructure::tree(order, parents)
}

/// Estimates dependencies on a dataset and builds the tree chain.
#[derive(Clone)]
pub struct DependencyTreeBuilder {
    estimator: Arc<dyn DependencyEstimator>,
}

impl DependencyTreeBuilder {
    pub fn new(estimator: Arc<dyn DependencyEstimator>) -> Self {
        Self { estimator }
    }

    /// Estimate the dependency matrix of `dataset` and build the tree rooted
    /// at `root`.
    pub fn build(&self, dataset: &MultiLabelDataset, root: usize) -> Result<ChainStructure> {
        let matrix = estimate_dependencies(self.estimator.as_ref(), dataset)?;
        tracing::debug!(n_labels = matrix.n_labels(), root, "building dependency tree");
        build_dependency_tree(&matrix, root)
    }
}

impl std::fmt::Debug for DependencyTreeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyTreeBuilder").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{array, Array2};

    use super::*;
    use crate::dependency::MarginalDependence;

    fn star() -> DependencyMatrix {
        // label 0 is strongly tied to every other label
        DependencyMatrix::new(array![
            [0.0, 0.8, 0.7, 0.9],
            [0.8, 0.0, 0.1, 0.1],
            [0.7, 0.1, 0.0, 0.1],
            [0.9, 0.1, 0.1, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn star_rooted_at_center() {
        let tree = build_dependency_tree(&star(), 0).unwrap();
        assert_eq!(tree.order().as_slice(), &[0, 1, 2, 3]);
        for label in 1..4 {
            assert_eq!(tree.parents_of(label), &[0]);
        }
        assert!(tree.parents_of(0).is_empty());
    }

    #[test]
    fn star_rooted_at_leaf_walks_depth_first() {
        let tree = build_dependency_tree(&star(), 2).unwrap();
        assert_eq!(tree.order().as_slice(), &[2, 0, 1, 3]);
        assert_eq!(tree.parents_of(0), &[2]);
        assert_eq!(tree.parents_of(3), &[0]);
    }

    #[test]
    fn root_out_of_range_is_structural() {
        let err = build_dependency_tree(&star(), 4).unwrap_err();
        assert!(matches!(err, ChainError::RootOutOfRange { root: 4, n_labels: 4 }));
        assert!(err.is_structural());
    }

    #[test]
    fn single_label_tree() {
        let matrix = DependencyMatrix::new(Array2::zeros((1, 1))).unwrap();
        let tree = build_dependency_tree(&matrix, 0).unwrap();
        assert_eq!(tree.order().as_slice(), &[0]);
        assert!(tree.is_tree());
    }

    #[test]
    fn builder_uses_estimator() {
        let features = array![[0.0f32], [1.0], [2.0], [3.0]];
        let labels = array![[0, 0, 0], [1, 1, 0], [0, 0, 1], [1, 1, 1]];
        let ds = MultiLabelDataset::new(features.view(), labels.view()).unwrap();
        let builder = DependencyTreeBuilder::new(Arc::new(MarginalDependence));
        let tree = builder.build(&ds, 0).unwrap();
        // labels 0 and 1 are identical, so 1 hangs off 0
        assert_eq!(tree.parents_of(1), &[0]);
        assert_eq!(tree.order().label_at(0), 0);
    }
}
