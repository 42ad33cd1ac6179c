//! Swap proposals over chain orders.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::chain::ChainOrder;
use crate::utils::sample_index;

/// Default annealing rate of [`SwapProposal::Annealed`].
pub const DEFAULT_BETA: f64 = 0.03;

/// How a neighbouring order is proposed: swap two distinct positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum SwapProposal {
    /// Both positions uniform; the second is redrawn until it differs.
    #[default]
    Uniform,
    /// Position `j` is chosen with weight `(1/L)^(beta * t / (1 + j))` at
    /// iteration `t`.
    ///
    /// At `t = 0` (or `beta = 0`) this is uniform. As `t` grows, early
    /// positions freeze and swaps concentrate at the end of the chain.
    Annealed { beta: f64 },
}

impl SwapProposal {
    pub fn annealed() -> Self {
        Self::Annealed { beta: DEFAULT_BETA }
    }

    /// A new order with two distinct positions of `order` swapped.
    ///
    /// Orders with fewer than two labels have no neighbour and are returned
    /// unchanged.
    pub fn propose(
        &self,
        order: &ChainOrder,
        iteration: usize,
        rng: &mut dyn RngCore,
    ) -> ChainOrder {
        let n = order.len();
        if n < 2 {
            return order.clone();
        }
        let (i, j) = match *self {
            Self::Uniform => uniform_pair(n, rng),
            Self::Annealed { beta } => {
                let mut weights = position_weights(n, beta, iteration);
                let i = sample_index(&weights, rng);
                weights[i] = 0.0;
                if weights.iter().all(|&w| w <= 0.0) {
                    uniform_pair(n, rng)
                } else {
                    (i, sample_index(&weights, rng))
                }
            }
        };
        order.swapped(i, j)
    }
}

fn uniform_pair(n: usize, rng: &mut dyn RngCore) -> (usize, usize) {
    let i = rng.gen_range(0..n);
    let mut j = rng.gen_range(0..n);
    while j == i {
        j = rng.gen_range(0..n);
    }
    (i, j)
}

/// Annealed position weights, scaled so the largest is 1.
///
/// Computed in log space: `ln p_j = -ln(L) * beta * t / (1 + j)`, which stays
/// finite where the raw power would underflow to zero for every position.
pub fn position_weights(n_labels: usize, beta: f64, iteration: usize) -> Vec<f64> {
    let scale = -(n_labels as f64).ln() * beta * iteration as f64;
    let log_weights: Vec<f64> = (0..n_labels).map(|j| scale / (1 + j) as f64).collect();
    let max = log_weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    log_weights.iter().map(|&lw| (lw - max).exp()).collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    use super::*;

    fn differs_in_exactly_two(a: &ChainOrder, b: &ChainOrder) -> bool {
        a.iter().zip(b.iter()).filter(|(x, y)| x != y).count() == 2
    }

    #[test]
    fn uniform_swaps_two_positions() {
        let order = ChainOrder::identity(5);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
        for t in 0..50 {
            let next = SwapProposal::Uniform.propose(&order, t, &mut rng);
            assert!(differs_in_exactly_two(&order, &next));
        }
        assert_eq!(order, ChainOrder::identity(5));
    }

    #[test]
    fn annealed_swaps_two_positions() {
        let order = ChainOrder::identity(6);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
        for t in 0..200 {
            let next = SwapProposal::Annealed { beta: 0.5 }.propose(&order, t, &mut rng);
            assert!(differs_in_exactly_two(&order, &next));
        }
    }

    #[test]
    fn short_orders_are_unchanged() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
        let single = ChainOrder::identity(1);
        assert_eq!(SwapProposal::Uniform.propose(&single, 3, &mut rng), single);
        let two = ChainOrder::identity(2);
        assert_eq!(
            SwapProposal::annealed().propose(&two, 0, &mut rng).as_slice(),
            &[1, 0]
        );
    }

    #[test]
    fn weights_start_uniform_and_favor_late_positions() {
        let w0 = position_weights(4, 0.03, 0);
        assert!(w0.iter().all(|&w| (w - 1.0).abs() < 1e-12));

        let w = position_weights(4, 0.03, 100);
        assert!(w.windows(2).all(|pair| pair[0] < pair[1]));
        approx::assert_abs_diff_eq!(w[3], 1.0);
    }

    #[test]
    fn weights_survive_extreme_annealing() {
        let w = position_weights(50, 10.0, 1_000_000);
        assert!(w.iter().all(|v| v.is_finite()));
        assert!(w.iter().any(|&v| v > 0.0));
    }
}
