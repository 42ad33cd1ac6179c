//! Chain structures and trained chains.
//!
//! - [`ChainOrder`]: permutation of labels
//! - [`ChainStructure`]: order plus parent-set kind (plain or tree)
//! - [`ChainNode`]: one label's trained conditional model
//! - [`ChainModel`]: all nodes of a chain, ready for inference
//!
//! A model is rebuilt from scratch whenever its order changes unless a
//! caller opts into [`RebuildStrategy::ReuseUnchanged`].

mod model;
mod node;
mod order;
mod structure;

pub use model::{ChainModel, RebuildStrategy};
pub use node::ChainNode;
pub use order::ChainOrder;
pub use structure::ChainStructure;
