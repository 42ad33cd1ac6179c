//! [`ChainOrder`]: the label visitation sequence.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ChainError, Result};

/// A permutation of `0..L` giving the order in which labels are trained and
/// predicted.
///
/// Orders are values: every edit (such as [`swapped`](Self::swapped))
/// returns a new order and leaves the original untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct ChainOrder(Box<[usize]>);

impl ChainOrder {
    /// Validate and wrap a permutation.
    ///
    /// # Errors
    ///
    /// [`ChainError::NotAPermutation`] if `order` is not a permutation of
    /// `0..order.len()`.
    pub fn new(order: Vec<usize>) -> Result<Self> {
        let n = order.len();
        let mut seen = vec![false; n];
        let is_permutation = order
            .iter()
            .all(|&label| label < n && !std::mem::replace(&mut seen[label], true));
        if !is_permutation {
            return Err(ChainError::NotAPermutation { order, n_labels: n });
        }
        Ok(Self(order.into_boxed_slice()))
    }

    /// `[0, 1, ..., n_labels - 1]`.
    pub fn identity(n_labels: usize) -> Self {
        Self((0..n_labels).collect())
    }

    /// Uniformly random permutation.
    pub fn random<R: Rng + ?Sized>(n_labels: usize, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..n_labels).collect();
        order.shuffle(rng);
        Self(order.into_boxed_slice())
    }

    /// Build from labels sorted by rank: `ranks[label]` is the label's position.
    pub fn from_ranks(ranks: &[usize]) -> Result<Self> {
        let n = ranks.len();
        let mut order = vec![usize::MAX; n];
        for (label, &rank) in ranks.iter().enumerate() {
            if rank >= n || order[rank] != usize::MAX {
                return Err(ChainError::NotAPermutation {
                    order: ranks.to_vec(),
                    n_labels: n,
                });
            }
            order[rank] = label;
        }
        Ok(Self(order.into_boxed_slice()))
    }

    /// A new order with positions `i` and `j` exchanged.
    ///
    /// # Panics
    ///
    /// Panics if either position is out of range.
    pub fn swapped(&self, i: usize, j: usize) -> Self {
        let mut order = self.0.clone();
        order.swap(i, j);
        Self(order)
    }

    /// Number of labels.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Label at chain position `position`.
    #[inline]
    pub fn label_at(&self, position: usize) -> usize {
        self.0[position]
    }

    /// Position of every label: `ranks()[label]`.
    pub fn ranks(&self) -> Vec<usize> {
        let mut ranks = vec![0; self.0.len()];
        for (position, &label) in self.0.iter().enumerate() {
            ranks[label] = position;
        }
        ranks
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

impl TryFrom<Vec<usize>> for ChainOrder {
    type Error = ChainError;

    fn try_from(order: Vec<usize>) -> Result<Self> {
        Self::new(order)
    }
}

impl From<ChainOrder> for Vec<usize> {
    fn from(order: ChainOrder) -> Self {
        order.0.into_vec()
    }
}

impl AsRef<[usize]> for ChainOrder {
    fn as_ref(&self) -> &[usize] {
        &self.0
    }
}

impl std::fmt::Display for ChainOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", &self.0)
    }
}
