//! [`MultiLabelDataset`] container.

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;

use super::error::DatasetError;

/// Features and label vectors for chain training and evaluation.
///
/// # Example
///
/// ```
/// use labelchain::data::MultiLabelDataset;
/// use ndarray::array;
///
/// // 3 samples, 2 features, 2 binary labels
/// let features = array![[0.1, 1.0], [0.2, 0.0], [0.9, 1.0]];
/// let labels = array![[1, 0], [0, 0], [1, 1]];
/// let ds = MultiLabelDataset::new(features.view(), labels.view()).unwrap();
///
/// assert_eq!(ds.n_samples(), 3);
/// assert_eq!(ds.n_labels(), 2);
/// assert_eq!(ds.value_space(), &[2, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct MultiLabelDataset {
    /// Feature data: `[n_samples, n_features]`.
    features: Array2<f32>,
    /// Label values: `[n_samples, n_labels]`.
    labels: Array2<usize>,
    /// Value space size per label.
    value_space: Box<[usize]>,
}

impl MultiLabelDataset {
    /// Create a dataset, inferring each label's value space as `max + 1`
    /// (at least 2).
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] when there are no labels, no samples, or the
    /// feature and label sample counts differ.
    pub fn new(
        features: ArrayView2<f32>,
        labels: ArrayView2<usize>,
    ) -> Result<Self, DatasetError> {
        let value_space: Vec<usize> = labels
            .axis_iter(Axis(1))
            .map(|column| column.iter().copied().max().map_or(2, |m| (m + 1).max(2)))
            .collect();
        Self::with_value_space(features, labels, value_space)
    }

    /// Create a dataset with explicit value space sizes.
    ///
    /// # Errors
    ///
    /// In addition to the checks of [`new`](Self::new), fails when
    /// `value_space.len() != n_labels`, a size is zero, or any label value is
    /// outside its declared space.
    pub fn with_value_space(
        features: ArrayView2<f32>,
        labels: ArrayView2<usize>,
        value_space: Vec<usize>,
    ) -> Result<Self, DatasetError> {
        let n_samples = labels.nrows();
        let n_labels = labels.ncols();

        if n_labels == 0 {
            return Err(DatasetError::NoLabels);
        }
        if n_samples == 0 {
            return Err(DatasetError::NoSamples);
        }
        if features.nrows() != n_samples {
            return Err(DatasetError::ShapeMismatch {
                expected: n_samples,
                got: features.nrows(),
                field: "features",
            });
        }
        if value_space.len() != n_labels {
            return Err(DatasetError::ShapeMismatch {
                expected: n_labels,
                got: value_space.len(),
                field: "value_space",
            });
        }

        for (label, (column, &n_values)) in labels
            .axis_iter(Axis(1))
            .zip(value_space.iter())
            .enumerate()
        {
            if n_values == 0 {
                return Err(DatasetError::EmptyValueSpace { label });
            }
            if let Some(&value) = column.iter().find(|&&v| v >= n_values) {
                return Err(DatasetError::ValueOutOfRange {
                    label,
                    value,
                    n_values,
                });
            }
        }

        Ok(Self {
            features: features.to_owned(),
            labels: labels.to_owned(),
            value_space: value_space.into_boxed_slice(),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of samples.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.labels.nrows()
    }

    /// Number of features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Number of labels `L`.
    #[inline]
    pub fn n_labels(&self) -> usize {
        self.labels.ncols()
    }

    /// Value space size `K_j` for every label.
    #[inline]
    pub fn value_space(&self) -> &[usize] {
        &self.value_space
    }

    /// Feature matrix `[n_samples, n_features]`.
    #[inline]
    pub fn features(&self) -> ArrayView2<'_, f32> {
        self.features.view()
    }

    /// Label matrix `[n_samples, n_labels]`.
    #[inline]
    pub fn labels(&self) -> ArrayView2<'_, usize> {
        self.labels.view()
    }

    /// Values of one label across all samples.
    #[inline]
    pub fn label_column(&self, label: usize) -> ArrayView1<'_, usize> {
        self.labels.column(label)
    }

    /// Features of one sample.
    #[inline]
    pub fn instance(&self, sample: usize) -> ArrayView1<'_, f32> {
        self.features.row(sample)
    }

    /// Label vector of one sample.
    #[inline]
    pub fn label_row(&self, sample: usize) -> ArrayView1<'_, usize> {
        self.labels.row(sample)
    }

    // =========================================================================
    // Slicing
    // =========================================================================

    /// Copy the given samples into a new dataset with the same value space.
    ///
    /// # Errors
    ///
    /// Fails if `indices` is empty or contains an out-of-range index.
    pub fn subset(&self, indices: &[usize]) -> Result<Self, DatasetError> {
        if indices.is_empty() {
            return Err(DatasetError::NoSamples);
        }
        let n_samples = self.n_samples();
        if let Some(&index) = indices.iter().find(|&&i| i >= n_samples) {
            return Err(DatasetError::SampleOutOfRange { index, n_samples });
        }

        Ok(Self {
            features: self.features.select(Axis(0), indices),
            labels: self.labels.select(Axis(0), indices),
            value_space: self.value_space.clone(),
        })
    }

    /// Shuffle the samples and split off `fraction` of them as a holdout set.
    ///
    /// Returns `(train, holdout)`. Both parts keep at least one sample.
    ///
    /// # Errors
    ///
    /// Fails if `fraction` is outside `(0, 1)` or the dataset has fewer than
    /// two samples.
    pub fn train_holdout_split<R: Rng + ?Sized>(
        &self,
        fraction: f64,
        rng: &mut R,
    ) -> Result<(Self, Self), DatasetError> {
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(DatasetError::InvalidFraction(fraction));
        }
        let n_samples = self.n_samples();
        if n_samples < 2 {
            return Err(DatasetError::ShapeMismatch {
                expected: 2,
                got: n_samples,
                field: "samples for holdout split",
            });
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        indices.shuffle(rng);

        let n_holdout = ((n_samples as f64 * fraction).round() as usize).clamp(1, n_samples - 1);
        let (holdout, train) = indices.split_at(n_holdout);
        Ok((self.subset(train)?, self.subset(holdout)?))
    }
}
