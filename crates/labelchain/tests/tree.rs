//! Integration tests for dependency tree chains.

use std::sync::Arc;

use ndarray::{array, Array2};
use proptest::prelude::*;

use labelchain::classifier::FrequencyFactory;
use labelchain::dependency::{ConditionalDependence, DependencyMatrix, MarginalDependence};
use labelchain::tree::{build_dependency_tree, DependencyTreeBuilder};
use labelchain::testing::synthetic_multilabel;
use labelchain::{ChainError, ChainModel};

// =============================================================================
// Strategies
// =============================================================================

/// Symmetric matrices with finite entries and a zero diagonal.
fn arb_matrix() -> impl Strategy<Value = Array2<f64>> {
    (1usize..9).prop_flat_map(|n| {
        prop::collection::vec(-10.0f64..10.0, n * n).prop_map(move |values| {
            Array2::from_shape_fn((n, n), |(i, j)| match i.cmp(&j) {
                std::cmp::Ordering::Equal => 0.0,
                std::cmp::Ordering::Less => values[i * n + j],
                std::cmp::Ordering::Greater => values[j * n + i],
            })
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn tree_is_valid_for_any_matrix(matrix in arb_matrix(), root_pick in any::<prop::sample::Index>()) {
        let n = matrix.nrows();
        let root = root_pick.index(n);
        let dm = DependencyMatrix::new(matrix).unwrap();
        let tree = build_dependency_tree(&dm, root).unwrap();

        // Root first, parentless; every other label has exactly one parent
        // that is processed before it.
        let order = tree.order();
        prop_assert_eq!(order.label_at(0), root);
        prop_assert!(tree.parents_of(root).is_empty());
        let ranks = order.ranks();
        let mut edges = 0;
        for label in 0..n {
            if label == root {
                continue;
            }
            let parents = tree.parents_of(label);
            prop_assert_eq!(parents.len(), 1);
            prop_assert!(ranks[parents[0]] < ranks[label]);
            edges += 1;
        }
        prop_assert_eq!(edges, n - 1);
    }

    #[test]
    fn tree_maximizes_total_dependence_for_three_labels(
        a in 0.0f64..1.0, b in 0.0f64..1.0, c in 0.0f64..1.0,
    ) {
        prop_assume!(a != b && b != c && a != c);
        let dm = DependencyMatrix::new(array![
            [0.0, a, b],
            [a, 0.0, c],
            [b, c, 0.0],
        ]).unwrap();
        let tree = build_dependency_tree(&dm, 0).unwrap();

        let total: f64 = (1..3)
            .map(|label| {
                let parent = tree.parents_of(label)[0];
                dm.get(label, parent)
            })
            .sum();
        let best = [a + b, a + c, b + c].into_iter().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!((total - best).abs() < 1e-12);
    }
}

#[test]
fn root_out_of_range_is_rejected() {
    let dm = DependencyMatrix::new(Array2::zeros((3, 3))).unwrap();
    let err = build_dependency_tree(&dm, 3).unwrap_err();
    assert!(matches!(err, ChainError::RootOutOfRange { root: 3, n_labels: 3 }));
}

#[test]
fn single_label_tree() {
    let dm = DependencyMatrix::new(Array2::zeros((1, 1))).unwrap();
    let tree = build_dependency_tree(&dm, 0).unwrap();
    assert_eq!(tree.order().as_slice(), &[0]);
    assert!(tree.parents_of(0).is_empty());
}

#[test]
fn estimated_trees_train_chains() {
    let ds = synthetic_multilabel(80, 3, 5, 0.1, 12).unwrap();
    let factory = Arc::new(FrequencyFactory::default());
    for builder in [
        DependencyTreeBuilder::new(Arc::new(MarginalDependence)),
        DependencyTreeBuilder::new(Arc::new(ConditionalDependence::new(factory.clone()))),
    ] {
        let structure = builder.build(&ds, 2).unwrap();
        assert!(structure.is_tree());
        assert_eq!(structure.order().label_at(0), 2);
        let model = ChainModel::build(structure, &ds, factory.as_ref()).unwrap();
        assert!(model.nodes().iter().all(|n| n.parents().len() <= 1));
    }
}

#[test]
fn neighbouring_labels_are_linked_by_marginal_dependence() {
    // Each label copies its predecessor with 5% flips, so the strongest
    // dependencies are between neighbours and the tree is the path 0-1-2-3.
    let ds = synthetic_multilabel(400, 2, 4, 0.05, 3).unwrap();
    let structure = DependencyTreeBuilder::new(Arc::new(MarginalDependence))
        .build(&ds, 0)
        .unwrap();
    assert_eq!(structure.order().as_slice(), &[0, 1, 2, 3]);
    for label in 1..4 {
        assert_eq!(structure.parents_of(label), &[label - 1]);
    }
}
