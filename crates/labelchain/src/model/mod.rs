//! High-level model types.
//!
//! - [`ClassifierChain`]: one plain, searched or tree chain
//! - [`PopulationChain`]: a weighted population of plain chains
//!
//! Both own their configuration, seed every random choice from it and take
//! the classifier factory as a shared `Arc` so tree chains can hand it to a
//! conditional dependence estimator.

mod chain;
mod config;
mod population;

pub use chain::ClassifierChain;
pub use config::{
    ChainConfig, ConfigError, DependenceKind, InferenceMode, PopulationConfig, StructureKind,
};
pub use population::PopulationChain;
