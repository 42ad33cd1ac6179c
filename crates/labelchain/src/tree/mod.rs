//! Dependency-driven tree chains.
//!
//! A tree chain gives every label at most one parent. The tree is the
//! maximum-dependence spanning tree of the labels: the dependency matrix is
//! negated, Kruskal's algorithm finds the minimum spanning tree of the
//! complete graph, and a depth-first walk from a root label turns the
//! undirected tree into a chain order plus parent pointers.
//!
//! ```
//! use labelchain::dependency::DependencyMatrix;
//! use labelchain::tree::build_dependency_tree;
//! use ndarray::array;
//!
//! let matrix = DependencyMatrix::new(array![
//!     [0.0, 0.9, 0.1],
//!     [0.9, 0.0, 0.5],
//!     [0.1, 0.5, 0.0],
//! ])
//! .unwrap();
//! let tree = build_dependency_tree(&matrix, 2).unwrap();
//! assert_eq!(tree.order().as_slice(), &[2, 1, 0]);
//! assert_eq!(tree.parents_of(0), &[1]);
//! ```

mod builder;
mod kruskal;

pub use builder::{build_dependency_tree, DependencyTreeBuilder};
pub use kruskal::{minimum_spanning_tree, Edge};
