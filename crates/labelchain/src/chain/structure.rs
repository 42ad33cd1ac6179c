//! [`ChainStructure`]: order plus parent-set kind.

use serde::{Deserialize, Serialize};

use super::ChainOrder;
use crate::error::{ChainError, Result};

/// How a chain's parent sets are derived.
///
/// - `Plain`: every label conditions on all labels before it in the order.
/// - `Tree`: every label conditions on at most one tree parent, which always
///   comes earlier in the order.
///
/// Both kinds are consumed identically by training and inference; only
/// [`parents_of`](Self::parents_of) differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainStructure {
    Plain {
        order: ChainOrder,
    },
    Tree {
        order: ChainOrder,
        /// `parents[label]` is the tree parent, `None` for a root.
        parents: Box<[Option<usize>]>,
    },
}

impl ChainStructure {
    /// Plain chain over `order`.
    pub fn plain(order: ChainOrder) -> Self {
        Self::Plain { order }
    }

    /// Tree chain; `parents[label]` is the label's single parent.
    ///
    /// # Errors
    ///
    /// [`ChainError::LabelCountMismatch`] if `parents` and `order` differ in
    /// length, [`ChainError::MalformedParents`] if a parent is out of range
    /// or not placed strictly earlier in `order`.
    pub fn tree(order: ChainOrder, parents: Vec<Option<usize>>) -> Result<Self> {
        let structure = Self::Tree {
            order,
            parents: parents.into_boxed_slice(),
        };
        structure.validate()?;
        Ok(structure)
    }

    /// Check parent sets against the order.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Plain { .. } => Ok(()),
            Self::Tree { order, parents } => {
                if parents.len() != order.len() {
                    return Err(ChainError::LabelCountMismatch {
                        expected: order.len(),
                        got: parents.len(),
                    });
                }
                let ranks = order.ranks();
                for (label, parent) in parents.iter().enumerate() {
                    if let Some(parent) = *parent {
                        if parent >= order.len() || ranks[parent] >= ranks[label] {
                            return Err(ChainError::MalformedParents { label, parent });
                        }
                    }
                }
                Ok(())
            }
        }
    }

    #[inline]
    pub fn order(&self) -> &ChainOrder {
        match self {
            Self::Plain { order } | Self::Tree { order, .. } => order,
        }
    }

    #[inline]
    pub fn n_labels(&self) -> usize {
        self.order().len()
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, Self::Tree { .. })
    }

    /// ParentSet of `label`, in the column order its classifier sees.
    ///
    /// # Panics
    ///
    /// Panics if `label` is not in the order.
    pub fn parents_of(&self, label: usize) -> &[usize] {
        match self {
            Self::Plain { order } => &order.as_slice()[..order.ranks()[label]],
            Self::Tree { parents, .. } => parents[label].as_slice(),
        }
    }

    /// Same parent-set kind over a new order.
    ///
    /// Only defined for plain chains; a tree's parents are tied to its order.
    pub fn with_order(&self, order: ChainOrder) -> Result<Self> {
        if order.len() != self.n_labels() {
            return Err(ChainError::LabelCountMismatch {
                expected: self.n_labels(),
                got: order.len(),
            });
        }
        match self {
            Self::Plain { .. } => Ok(Self::Plain { order }),
            Self::Tree { parents, .. } => Self::tree(order, parents.to_vec()),
        }
    }
}
