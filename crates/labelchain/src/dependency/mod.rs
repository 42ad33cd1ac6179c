//! Pairwise label dependence.
//!
//! A [`DependencyMatrix`] is a square `L × L` matrix of finite reals where a
//! larger entry means stronger dependence between two labels. It drives the
//! tree builder in [`tree`](crate::tree). Matrices come from a
//! [`DependencyEstimator`]; two estimators are provided:
//!
//! - [`MarginalDependence`]: mutual information of the label values
//!   themselves (frequency-based).
//! - [`ConditionalDependence`]: mutual information of the *errors* of
//!   independently trained per-label classifiers, i.e. dependence that
//!   remains after conditioning on the features (error-based).

mod estimators;

pub use estimators::{mutual_information, ConditionalDependence, MarginalDependence};

use ndarray::{Array2, ArrayView2};

use crate::data::MultiLabelDataset;
use crate::error::{ChainError, CollaboratorError, Result};

/// Validated square matrix of pairwise label dependence.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyMatrix(Array2<f64>);

impl DependencyMatrix {
    /// Wrap a matrix after checking it is square, non-empty and finite.
    ///
    /// Symmetry is not required; the tree builder only reads the upper
    /// triangle.
    pub fn new(matrix: Array2<f64>) -> Result<Self> {
        let (rows, cols) = matrix.dim();
        if rows == 0 {
            return Err(ChainError::InvalidDependencyMatrix {
                reason: "matrix is empty".into(),
            });
        }
        if rows != cols {
            return Err(ChainError::InvalidDependencyMatrix {
                reason: format!("matrix is {rows}x{cols}, expected square"),
            });
        }
        if let Some(((i, j), v)) = matrix.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ChainError::InvalidDependencyMatrix {
                reason: format!("entry ({i}, {j}) is {v}"),
            });
        }
        Ok(Self(matrix))
    }

    #[inline]
    pub fn n_labels(&self) -> usize {
        self.0.nrows()
    }

    #[inline]
    pub fn get(&self, a: usize, b: usize) -> f64 {
        self.0[[a, b]]
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.0.view()
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.0
    }
}

impl TryFrom<Array2<f64>> for DependencyMatrix {
    type Error = ChainError;

    fn try_from(matrix: Array2<f64>) -> Result<Self> {
        Self::new(matrix)
    }
}

/// Estimates pairwise label dependence from a dataset.
pub trait DependencyEstimator: Send + Sync {
    /// Raw `L × L` matrix; validated by [`estimate_dependencies`].
    fn estimate(
        &self,
        dataset: &MultiLabelDataset,
    ) -> std::result::Result<Array2<f64>, CollaboratorError>;
}

/// Run `estimator` and validate its output against the dataset.
///
/// # Errors
///
/// [`ChainError::DependencyEstimator`] if the estimator fails;
/// [`ChainError::InvalidDependencyMatrix`] if its matrix is not
/// `n_labels × n_labels` or has non-finite entries.
pub fn estimate_dependencies(
    estimator: &dyn DependencyEstimator,
    dataset: &MultiLabelDataset,
) -> Result<DependencyMatrix> {
    let raw = estimator
        .estimate(dataset)
        .map_err(ChainError::DependencyEstimator)?;
    let matrix = DependencyMatrix::new(raw)?;
    if matrix.n_labels() != dataset.n_labels() {
        return Err(ChainError::InvalidDependencyMatrix {
            reason: format!(
                "matrix covers {} labels, dataset has {}",
                matrix.n_labels(),
                dataset.n_labels()
            ),
        });
    }
    Ok(matrix)
}
