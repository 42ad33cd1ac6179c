//! Seeded synthetic data for tests, benches and doc examples.

use ndarray::Array2;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::{DatasetError, MultiLabelDataset};

/// Generate random features, uniform in `[min, max]`.
pub fn random_features(rows: usize, cols: usize, seed: u64, min: f32, max: f32) -> Array2<f32> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let width = max - min;
    Array2::from_shape_fn((rows, cols), |_| min + rng.gen::<f32>() * width)
}

/// Generate a binary multi-label dataset with correlated labels.
///
/// Label 0 thresholds a random linear score of the features at zero. Each
/// following label copies the previous one and is flipped with probability
/// `flip_probability`, so neighbouring labels are strongly dependent while
/// distant ones drift apart. Features are uniform in `[-1, 1]`.
pub fn synthetic_multilabel(
    n_samples: usize,
    n_features: usize,
    n_labels: usize,
    flip_probability: f64,
    seed: u64,
) -> Result<MultiLabelDataset, DatasetError> {
    let features = random_features(n_samples, n_features, seed, -1.0, 1.0);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed.wrapping_add(1));
    let weights: Vec<f32> = (0..n_features).map(|_| rng.gen::<f32>() * 2.0 - 1.0).collect();

    let mut labels = Array2::zeros((n_samples, n_labels));
    for (x, mut y) in features.rows().into_iter().zip(labels.rows_mut()) {
        let score: f32 = x.iter().zip(&weights).map(|(a, w)| a * w).sum();
        let mut value = usize::from(score > 0.0);
        for slot in y.iter_mut() {
            *slot = value;
            if rng.gen_bool(flip_probability.clamp(0.0, 1.0)) {
                value = 1 - value;
            }
        }
    }

    MultiLabelDataset::new(features.view(), labels.view())
}
