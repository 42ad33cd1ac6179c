//! Common utilities used across the crate.
//!
//! Probability helpers shared by the inference routines, and the
//! parallelism switch used by batch prediction.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rayon::prelude::*;

// =============================================================================
// Probability Utilities
// =============================================================================

/// Index of the largest probability. Ties resolve to the first index and
/// NaN entries never win.
///
/// Returns `0` for an empty slice.
#[inline]
pub fn argmax(probabilities: &[f64]) -> usize {
    probabilities
        .iter()
        .map(|&p| if p.is_nan() { f64::NEG_INFINITY } else { p })
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, p)| {
            if p.total_cmp(&best.1).is_gt() {
                (i, p)
            } else {
                best
            }
        })
        .0
}

/// Draw an index proportionally to `weights`.
///
/// Weights need not sum to one. When they do not form a valid distribution
/// (all zero, negative, NaN, or an infinite total) the draw falls back to
/// [`argmax`], so a degenerate distribution still yields a value.
pub fn sample_index<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().sum();
    if !total.is_finite() {
        return argmax(weights);
    }
    match WeightedIndex::new(weights) {
        Ok(dist) => dist.sample(rng),
        Err(_) => argmax(weights),
    }
}

/// Product of per-label confidences, the joint-probability proxy of a path.
///
/// With `floor = Some(eps)` every factor is clamped to at least `eps` before
/// multiplying, which keeps zero-probability nodes from collapsing every
/// candidate to the same payoff. `None` multiplies the raw values.
#[inline]
pub fn confidence_product(confidences: &[f64], floor: Option<f64>) -> f64 {
    match floor {
        Some(eps) => confidences.iter().map(|&p| p.max(eps)).product(),
        None => confidences.iter().product(),
    }
}

// =============================================================================
// Parallelism Configuration
// =============================================================================

/// Whether parallel execution is allowed.
///
/// Components that iterate over independent instances may use `rayon`
/// parallel iterators when this is `Parallel`. The thread pool itself is set
/// up by [`run_with_threads`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics.
    ///
    /// - 0 = auto (parallel if the rayon pool has multiple threads)
    /// - 1 = sequential
    /// - >1 = parallel
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Map over `iter`, in parallel when allowed. Output order matches input order.
    #[inline]
    pub fn maybe_par_map<T, B, I, F>(self, iter: I, f: F) -> Vec<B>
    where
        T: Send,
        B: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> B + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().map(f).collect()
        } else {
            iter.into_iter().map(f).collect()
        }
    }
}

// =============================================================================
// Thread Pool Setup
// =============================================================================

/// Run a closure with the appropriate thread pool.
///
/// Thread count semantics:
/// - `0` = auto (use the global rayon pool)
/// - `1` = sequential (no thread pool)
/// - `n > 1` = use exactly `n` threads
///
/// If a dedicated pool cannot be created the closure runs on the global pool.
#[inline]
pub fn run_with_threads<T: Send>(n_threads: usize, f: impl FnOnce(Parallelism) -> T + Send) -> T {
    let parallelism = Parallelism::from_threads(n_threads);

    match parallelism {
        Parallelism::Sequential => f(Parallelism::Sequential),
        Parallelism::Parallel if n_threads == 0 => f(Parallelism::Parallel),
        Parallelism::Parallel => match rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build()
        {
            Ok(pool) => pool.install(|| f(Parallelism::Parallel)),
            Err(err) => {
                tracing::warn!(%err, "failed to build thread pool, using global pool");
                f(Parallelism::Parallel)
            }
        },
    }
}
