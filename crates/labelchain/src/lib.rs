//! labelchain: classifier chains for multi-label and multi-target prediction.
//!
//! A classifier chain predicts `L` labels with `L` conditional classifiers
//! processed in a fixed order, each seeing the features plus the values of
//! its parent labels. This crate builds chains, searches their order, builds
//! dependency-driven tree chains, and keeps weighted populations of chains.
//!
//! # Key Types
//!
//! - [`ClassifierChain`] / [`PopulationChain`] - High-level models with train/predict
//! - [`ChainConfig`] / [`PopulationConfig`] - Configuration builders
//! - [`ChainModel`] - A trained chain and its path probabilities
//! - [`LabelClassifier`] / [`ClassifierFactory`] - Per-label collaborator contract
//! - [`MultiLabelDataset`] - Data handling
//!
//! # Inference
//!
//! - Greedy: [`inference::greedy_predict`]
//! - Stochastic hill-climbing over sampled paths: [`inference::StochasticSearch`]
//! - Bayes-optimal joint mode with a combination cap: [`inference::ExhaustiveSearch`]
//!
//! # Structure
//!
//! - Order search: [`search::OrderSearch`]
//! - Tree chains: [`tree::build_dependency_tree`]
//! - Populations: [`population::ChainPopulation`]
//!
//! # Logging
//!
//! Search loops and truncation warnings are emitted through `tracing`;
//! install any subscriber to see them.

pub mod chain;
pub mod classifier;
pub mod data;
pub mod dependency;
pub mod error;
pub mod evaluation;
pub mod inference;
pub mod logger;
pub mod model;
pub mod population;
pub mod search;
pub mod testing;
pub mod tree;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// High-level model types
pub use model::{ClassifierChain, PopulationChain};

// Configuration types
pub use model::{
    ChainConfig, ConfigError, DependenceKind, InferenceMode, PopulationConfig, StructureKind,
};

// Core chain types
pub use chain::{ChainModel, ChainOrder, ChainStructure, RebuildStrategy};
pub use classifier::{ClassifierFactory, ConditionalInput, LabelClassifier, NodeTrainingSet};
pub use inference::ChainPrediction;

// Evaluation
pub use evaluation::{Evaluator, Metric, MetricEvaluator, MetricFn, MetricValue};

// Data and errors
pub use data::{DatasetError, MultiLabelDataset};
pub use error::{ChainError, CollaboratorError, Result};

// Shared utilities
pub use logger::Verbosity;
pub use utils::{run_with_threads, Parallelism};
