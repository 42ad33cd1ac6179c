//! Error types shared across the crate.
//!
//! [`ChainError`] covers three families of failure:
//!
//! - **Structural**: an order that is not a permutation, a tree root outside
//!   `[0, L)`, parent sets that reference labels processed later, or a
//!   dependency matrix of the wrong shape. These are caller mistakes and are
//!   never retried.
//! - **Collaborator**: an error returned by a [`LabelClassifier`],
//!   [`Evaluator`] or [`DependencyEstimator`]. The original error is kept as
//!   the `source` and aborts the current build, search or prediction call.
//! - **Data**: wrapped [`DatasetError`]s.
//!
//! Truncated exhaustive enumeration is *not* an error; it is reported through
//! [`ExhaustivePrediction::truncated`](crate::inference::ExhaustivePrediction).
//!
//! [`LabelClassifier`]: crate::classifier::LabelClassifier
//! [`Evaluator`]: crate::evaluation::Evaluator
//! [`DependencyEstimator`]: crate::dependency::DependencyEstimator

use crate::data::DatasetError;

/// Boxed error returned by external collaborators.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type Result<T, E = ChainError> = std::result::Result<T, E>;

/// Errors raised by chain construction, search and inference.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The order does not contain every label in `[0, n_labels)` exactly once.
    #[error("chain order {order:?} is not a permutation of 0..{n_labels}")]
    NotAPermutation { order: Vec<usize>, n_labels: usize },

    /// A structure or input was sized for a different number of labels.
    #[error("expected {expected} labels, got {got}")]
    LabelCountMismatch { expected: usize, got: usize },

    /// Tree root index outside `[0, n_labels)`.
    #[error("tree root {root} is out of range for {n_labels} labels")]
    RootOutOfRange { root: usize, n_labels: usize },

    /// A label's parent is out of range or is not processed before it.
    #[error("label {label} has parent {parent} which is not processed before it")]
    MalformedParents { label: usize, parent: usize },

    /// The dependency matrix cannot be turned into a tree.
    #[error("invalid dependency matrix: {reason}")]
    InvalidDependencyMatrix { reason: String },

    /// A label's value space is empty or disagrees with its classifier.
    #[error("label {label} has invalid value space size {n_values}")]
    InvalidValueSpace { label: usize, n_values: usize },

    /// A classifier returned a distribution of the wrong length.
    #[error("classifier for label {label} returned {got} probabilities, expected {expected}")]
    DistributionLength {
        label: usize,
        expected: usize,
        got: usize,
    },

    /// Feature vector length disagrees with the training data.
    #[error("expected {expected} features, got {got}")]
    FeatureCountMismatch { expected: usize, got: usize },

    /// The conditional classifier for a label failed to build or predict.
    #[error("classifier for label {label} failed")]
    Classifier {
        label: usize,
        #[source]
        source: CollaboratorError,
    },

    /// The payoff evaluator failed.
    #[error("evaluator failed")]
    Evaluator(#[source] CollaboratorError),

    /// The dependency estimator failed.
    #[error("dependency estimator failed")]
    DependencyEstimator(#[source] CollaboratorError),

    /// Dataset construction or validation failed.
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

impl ChainError {
    /// Returns `true` for errors caused by an invalid chain or tree structure.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::NotAPermutation { .. }
                | Self::LabelCountMismatch { .. }
                | Self::RootOutOfRange { .. }
                | Self::MalformedParents { .. }
                | Self::InvalidDependencyMatrix { .. }
                | Self::InvalidValueSpace { .. }
        )
    }

    /// Returns `true` for errors propagated from an external collaborator.
    pub fn is_collaborator(&self) -> bool {
        matches!(
            self,
            Self::Classifier { .. } | Self::Evaluator(_) | Self::DependencyEstimator(_)
        )
    }
}
