//! Chain weights from training-set likelihood.

use serde::{Deserialize, Serialize};

use crate::chain::ChainModel;
use crate::data::MultiLabelDataset;
use crate::error::Result;

/// How per-instance, per-label probabilities of the true values are combined
/// into one chain weight.
///
/// All three are monotone in every factor, so they rank chains the same way
/// whenever no factor is zero. They differ in numerical range: `Product`
/// underflows to zero on all but tiny datasets, `LogSum` does not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightAggregation {
    /// `Π_n Π_j P(y_nj | x_n, parents)`.
    #[default]
    Product,
    /// `Σ_n Σ_j ln P(y_nj | x_n, parents)`.
    LogSum,
    /// `Σ_n Σ_j P(y_nj | x_n, parents)`.
    Sum,
}

impl WeightAggregation {
    /// Raw weight of `model` on `dataset`.
    ///
    /// With `floor = Some(eps)` every factor is clamped to at least `eps`.
    pub fn weigh(
        self,
        model: &ChainModel,
        dataset: &MultiLabelDataset,
        floor: Option<f64>,
    ) -> Result<f64> {
        let mut total = match self {
            Self::Product => 1.0,
            Self::LogSum | Self::Sum => 0.0,
        };
        for sample in 0..dataset.n_samples() {
            let truth = dataset.label_row(sample).to_vec();
            let factors = model.path_probabilities(dataset.instance(sample), &truth)?;
            for p in factors {
                let p = floor.map_or(p, |eps| p.max(eps));
                match self {
                    Self::Product => total *= p,
                    Self::LogSum => total += p.ln(),
                    Self::Sum => total += p,
                }
            }
        }
        Ok(total)
    }

    /// Turn raw weights into non-negative weights summing to 1.
    ///
    /// `LogSum` weights are exponentiated relative to their maximum first.
    /// When no weight carries mass (all zero, or all `-inf` log weights) the
    /// result is uniform.
    pub fn normalize(self, raw: &[f64]) -> Vec<f64> {
        if raw.is_empty() {
            return Vec::new();
        }
        let masses: Vec<f64> = match self {
            Self::LogSum => {
                let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                if max == f64::NEG_INFINITY || max.is_nan() {
                    vec![0.0; raw.len()]
                } else {
                    raw.iter().map(|&w| (w - max).exp()).collect()
                }
            }
            Self::Product | Self::Sum => raw
                .iter()
                .map(|&w| if w.is_finite() && w > 0.0 { w } else { 0.0 })
                .collect(),
        };

        let total: f64 = masses.iter().sum();
        if !(total > 0.0 && total.is_finite()) {
            return vec![1.0 / raw.len() as f64; raw.len()];
        }
        masses.iter().map(|&m| m / total).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::product(WeightAggregation::Product, vec![0.2, 0.6, 0.2])]
    #[case::sum(WeightAggregation::Sum, vec![1.0, 3.0, 1.0])]
    fn linear_weights_normalize_proportionally(
        #[case] aggregation: WeightAggregation,
        #[case] raw: Vec<f64>,
    ) {
        let w = aggregation.normalize(&raw);
        approx::assert_abs_diff_eq!(w[1], 0.6, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn log_weights_are_exponentiated() {
        let w = WeightAggregation::LogSum.normalize(&[-1000.0, -1000.0 + 2f64.ln()]);
        approx::assert_abs_diff_eq!(w[0], 1.0 / 3.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(w[1], 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn massless_weights_become_uniform() {
        assert_eq!(WeightAggregation::Product.normalize(&[0.0, 0.0]), vec![0.5, 0.5]);
        assert_eq!(
            WeightAggregation::LogSum.normalize(&[f64::NEG_INFINITY; 4]),
            vec![0.25; 4]
        );
        assert!(WeightAggregation::Sum.normalize(&[]).is_empty());
    }
}
