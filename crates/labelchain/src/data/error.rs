//! Dataset validation errors.

/// Errors raised while constructing or slicing a [`MultiLabelDataset`](super::MultiLabelDataset).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatasetError {
    /// Dataset has no labels.
    #[error("dataset must have at least one label")]
    NoLabels,

    /// Dataset has no samples.
    #[error("dataset must have at least one sample")]
    NoSamples,

    /// Sample counts (or value-space lengths) disagree.
    #[error("{field}: expected {expected}, got {got}")]
    ShapeMismatch {
        expected: usize,
        got: usize,
        field: &'static str,
    },

    /// A label value is outside its declared value space.
    #[error("label {label} has value {value} outside value space of size {n_values}")]
    ValueOutOfRange {
        label: usize,
        value: usize,
        n_values: usize,
    },

    /// A declared value space is empty.
    #[error("label {label} has empty value space")]
    EmptyValueSpace { label: usize },

    /// A sample index passed to `subset` is out of range.
    #[error("sample index {index} out of range for {n_samples} samples")]
    SampleOutOfRange { index: usize, n_samples: usize },

    /// Holdout fraction outside `(0, 1)`.
    #[error("holdout fraction must be in (0, 1), got {0}")]
    InvalidFraction(f64),
}
