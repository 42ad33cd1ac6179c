//! Bayes-optimal inference by enumerating label combinations.

use ndarray::ArrayView1;

use crate::chain::ChainModel;
use crate::error::{ChainError, Result};
use crate::utils::confidence_product;

/// Default cap on the number of scored combinations.
pub const DEFAULT_MAX_COMBINATIONS: usize = 1_000_000;

// =============================================================================
// Combinations
// =============================================================================

/// Lazy mixed-radix counter over `[0, K_0) × … × [0, K_{L-1})`.
///
/// Starts at all zeros. Digit `j` is label `j`; it increments first at digit
/// 0 and carries into digit `j + 1` on overflow. Yields every combination
/// exactly once, then stops until [`restart`](Self::restart) is called.
///
/// ```
/// use labelchain::inference::Combinations;
///
/// let all: Vec<_> = Combinations::new(vec![2, 3]).collect();
/// assert_eq!(all.len(), 6);
/// assert_eq!(all[0], vec![0, 0]);
/// assert_eq!(all[1], vec![1, 0]);
/// assert_eq!(all[2], vec![0, 1]);
/// ```
#[derive(Debug, Clone)]
pub struct Combinations {
    radices: Box<[usize]>,
    digits: Box<[usize]>,
    done: bool,
}

impl Combinations {
    /// Counter over the given radices. Any zero radix makes the space empty.
    pub fn new(radices: Vec<usize>) -> Self {
        let done = radices.iter().any(|&k| k == 0);
        let digits = vec![0; radices.len()].into_boxed_slice();
        Self {
            radices: radices.into_boxed_slice(),
            digits,
            done,
        }
    }

    /// Rewind to all zeros.
    pub fn restart(&mut self) {
        self.digits.iter_mut().for_each(|d| *d = 0);
        self.done = self.radices.iter().any(|&k| k == 0);
    }

    /// Size of the full cross product, `None` if it overflows `usize`.
    pub fn total(&self) -> Option<usize> {
        self.radices
            .iter()
            .try_fold(1usize, |acc, &k| acc.checked_mul(k))
    }

    pub fn radices(&self) -> &[usize] {
        &self.radices
    }

    /// Advance the digits; returns `false` after the last combination.
    fn increment(&mut self) -> bool {
        for (digit, &radix) in self.digits.iter_mut().zip(self.radices.iter()) {
            *digit += 1;
            if *digit < radix {
                return true;
            }
            *digit = 0;
        }
        false
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.digits.to_vec();
        self.done = !self.increment();
        Some(current)
    }
}

// =============================================================================
// Exhaustive search
// =============================================================================

/// Result of [`ExhaustiveSearch::predict`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExhaustivePrediction {
    /// Most probable combination among those scored. Indexed by label.
    pub labels: Vec<usize>,
    /// Per-label conditional probabilities along `labels`.
    pub confidences: Vec<f64>,
    /// Product of `confidences`, after the optional floor.
    pub joint_probability: f64,
    /// Number of combinations scored.
    pub evaluated: usize,
    /// `true` when the cap stopped enumeration before the full cross product.
    /// The result is then only the best of the scored prefix.
    pub truncated: bool,
}

/// Joint-mode search over every label combination.
///
/// Each combination is scored by forcing the chain down that path and
/// multiplying the conditional probability of every label given its parents'
/// forced values. The first combination with the maximal score wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExhaustiveSearch {
    /// Enumeration stops after this many combinations.
    pub max_combinations: usize,
    /// Optional clamp for every factor; see [`confidence_product`].
    pub probability_floor: Option<f64>,
}

impl Default for ExhaustiveSearch {
    fn default() -> Self {
        Self {
            max_combinations: DEFAULT_MAX_COMBINATIONS,
            probability_floor: None,
        }
    }
}

impl ExhaustiveSearch {
    pub fn new(max_combinations: usize) -> Self {
        Self {
            max_combinations,
            ..Self::default()
        }
    }

    pub fn with_probability_floor(mut self, floor: f64) -> Self {
        self.probability_floor = Some(floor);
        self
    }

    /// Enumerate each label's full value space.
    pub fn predict(
        &self,
        model: &ChainModel,
        features: ArrayView1<'_, f32>,
    ) -> Result<ExhaustivePrediction> {
        self.predict_with_value_space(model, features, &model.value_space())
    }

    /// Enumerate `[0, value_space[j])` for every label `j`.
    ///
    /// Passing a smaller space than the model's restricts the search, e.g. to
    /// the binary part of a multi-valued label.
    ///
    /// # Errors
    ///
    /// [`ChainError::LabelCountMismatch`] if `value_space` is not one entry
    /// per label, [`ChainError::InvalidValueSpace`] if an entry is zero or
    /// larger than the label's node supports. Classifier errors propagate.
    pub fn predict_with_value_space(
        &self,
        model: &ChainModel,
        features: ArrayView1<'_, f32>,
        value_space: &[usize],
    ) -> Result<ExhaustivePrediction> {
        model.check_features(features)?;
        if value_space.len() != model.n_labels() {
            return Err(ChainError::LabelCountMismatch {
                expected: model.n_labels(),
                got: value_space.len(),
            });
        }
        for (label, &n_values) in value_space.iter().enumerate() {
            if n_values == 0 || n_values > model.node(label).n_values() {
                return Err(ChainError::InvalidValueSpace { label, n_values });
            }
        }

        let combinations = Combinations::new(value_space.to_vec());
        let truncated = combinations
            .total()
            .map_or(true, |total| total > self.max_combinations);
        if truncated {
            tracing::warn!(
                total = ?combinations.total(),
                cap = self.max_combinations,
                "exhaustive inference truncated; result is the best of the enumerated prefix"
            );
        }

        let mut best = ExhaustivePrediction {
            labels: vec![0; model.n_labels()],
            confidences: vec![0.0; model.n_labels()],
            joint_probability: -1.0,
            evaluated: 0,
            truncated,
        };
        for combination in combinations.take(self.max_combinations) {
            let confidences = model.path_probabilities(features, &combination)?;
            let score = confidence_product(&confidences, self.probability_floor);
            best.evaluated += 1;
            if score > best.joint_probability {
                best.labels = combination;
                best.confidences = confidences;
                best.joint_probability = score;
            }
        }

        if best.evaluated == 0 {
            best.joint_probability = 0.0;
        }
        Ok(best)
    }
}
