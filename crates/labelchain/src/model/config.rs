//! High-level configuration with builder pattern.
//!
//! [`ChainConfig`] configures a single chain (plain, searched or tree) and
//! its inference mode; [`PopulationConfig`] configures a weighted
//! population. Both use the `bon` crate for builder generation with
//! validation at build time.
//!
//! # Example
//!
//! ```
//! use labelchain::model::{ChainConfig, InferenceMode, StructureKind, DependenceKind};
//!
//! // All defaults: plain chain over a random order, greedy inference
//! let config = ChainConfig::builder().build().unwrap();
//!
//! // Tree chain with Bayes-optimal inference
//! let config = ChainConfig::builder()
//!     .structure(StructureKind::Tree { dependence: DependenceKind::Marginal })
//!     .inference(InferenceMode::Exhaustive { max_combinations: 10_000 })
//!     .build()
//!     .unwrap();
//! ```

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::chain::RebuildStrategy;
use crate::evaluation::Metric;
use crate::logger::Verbosity;
use crate::population::{PopulationParams, WeightAggregation};
use crate::search::{OrderSearchParams, SwapProposal};

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Probability floor outside `(0, 1)`.
    #[error("probability_floor must be in (0, 1), got {0}")]
    InvalidProbabilityFloor(f64),
    /// Exhaustive inference must score at least one combination.
    #[error("max_combinations must be at least 1")]
    InvalidMaxCombinations,
    /// Holdout fraction outside `(0, 1)`.
    #[error("holdout_fraction must be in (0, 1), got {0}")]
    InvalidHoldoutFraction(f64),
    /// Initial order is not a permutation.
    #[error("initial_order {0:?} is not a permutation")]
    InvalidInitialOrder(Vec<usize>),
    /// Order search only applies to plain chains.
    #[error("order search is not available for tree chains")]
    SearchOnTree,
    /// Population must hold at least one chain.
    #[error("population_size must be at least 1")]
    InvalidPopulationSize,
    /// Annealing rate must be finite and non-negative.
    #[error("annealing beta must be finite and non-negative, got {0}")]
    InvalidBeta(f64),
}

// =============================================================================
// Kinds
// =============================================================================

/// Pairwise dependence used to build a tree chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependenceKind {
    /// Mutual information of the labels.
    #[default]
    Marginal,
    /// Mutual information of per-label prediction errors.
    Conditional,
}

/// Parent-set kind of a single chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructureKind {
    /// Every label conditions on all earlier labels.
    #[default]
    Plain,
    /// Maximum-dependence spanning tree, one parent per label.
    Tree { dependence: DependenceKind },
}

/// How a trained chain turns features into labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InferenceMode {
    /// One greedy pass.
    #[default]
    Greedy,
    /// Greedy start plus `iterations` sampled paths.
    Stochastic { iterations: usize },
    /// Joint mode over at most `max_combinations` combinations.
    Exhaustive { max_combinations: usize },
}

fn check_floor(floor: Option<f64>) -> Result<(), ConfigError> {
    match floor {
        Some(eps) if !(eps > 0.0 && eps < 1.0) => Err(ConfigError::InvalidProbabilityFloor(eps)),
        _ => Ok(()),
    }
}

// =============================================================================
// ChainConfig
// =============================================================================

/// Configuration of a [`ClassifierChain`](super::ClassifierChain).
///
/// # Structure
///
/// - **Structure**: plain or tree, initial order and tree root
/// - **Search**: order search iterations, payoff metric, proposals
/// - **Inference**: greedy, stochastic or exhaustive
/// - **Resources**: seed, threads and logging
#[derive(Debug, Clone, Builder)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct ChainConfig {
    // === Structure ===
    /// Parent-set kind. Default: plain.
    #[builder(default)]
    pub structure: StructureKind,

    /// Starting order of a plain chain. `None` draws a random order.
    pub initial_order: Option<Vec<usize>>,

    /// Root of a tree chain. `None` uses the seed as the root index, which
    /// fails unless `seed < n_labels`.
    pub tree_root: Option<usize>,

    // === Order search ===
    /// Order search proposals. Default: 0 (keep the initial order).
    #[builder(default = 0)]
    pub search_iterations: usize,

    /// Payoff metric of the order search. Default: exact match.
    #[builder(default)]
    pub metric: Metric,

    /// Swap proposal of the order search. Default: uniform.
    #[builder(default)]
    pub proposal: SwapProposal,

    /// How searched chains are rebuilt. Default: full retraining.
    #[builder(default)]
    pub rebuild: RebuildStrategy,

    /// Fraction held out to measure the search payoff.
    pub holdout_fraction: Option<f64>,

    // === Inference ===
    /// Default: greedy.
    #[builder(default)]
    pub inference: InferenceMode,

    /// Clamp for confidences entering path scores. `None` keeps raw
    /// probabilities.
    pub probability_floor: Option<f64>,

    // === Resources ===
    /// Random seed. Default: 0.
    #[builder(default = 0)]
    pub seed: u64,

    /// Threads for batch prediction: 0 = auto, 1 = sequential. Default: 0.
    #[builder(default = 0)]
    pub n_threads: usize,

    /// Default: `Silent`.
    #[builder(default)]
    pub verbosity: Verbosity,
}

impl<S: chain_config_builder::IsComplete> ChainConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any parameter is invalid:
    /// - `probability_floor` or `holdout_fraction` outside (0, 1)
    /// - `max_combinations == 0`
    /// - `initial_order` not a permutation
    /// - order search requested for a tree chain
    /// - negative or non-finite annealing `beta`
    pub fn build(self) -> Result<ChainConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl ChainConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_floor(self.probability_floor)?;

        if let InferenceMode::Exhaustive {
            max_combinations: 0,
        } = self.inference
        {
            return Err(ConfigError::InvalidMaxCombinations);
        }

        if let Some(fraction) = self.holdout_fraction {
            if !(fraction > 0.0 && fraction < 1.0) {
                return Err(ConfigError::InvalidHoldoutFraction(fraction));
            }
        }

        if let Some(order) = &self.initial_order {
            let mut sorted = order.clone();
            sorted.sort_unstable();
            if sorted.iter().enumerate().any(|(i, &label)| i != label) {
                return Err(ConfigError::InvalidInitialOrder(order.clone()));
            }
        }

        if matches!(self.structure, StructureKind::Tree { .. }) && self.search_iterations > 0 {
            return Err(ConfigError::SearchOnTree);
        }

        if let SwapProposal::Annealed { beta } = self.proposal {
            if !(beta >= 0.0 && beta.is_finite()) {
                return Err(ConfigError::InvalidBeta(beta));
            }
        }

        Ok(())
    }

    /// Order search parameters derived from this config.
    pub fn order_search_params(&self) -> OrderSearchParams {
        OrderSearchParams {
            iterations: self.search_iterations,
            proposal: self.proposal,
            rebuild: self.rebuild,
            holdout_fraction: self.holdout_fraction,
            verbosity: self.verbosity,
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::builder().build().expect("default config is valid")
    }
}

// =============================================================================
// PopulationConfig
// =============================================================================

/// Configuration of a [`PopulationChain`](super::PopulationChain).
#[derive(Debug, Clone, Builder)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct PopulationConfig {
    /// Number of slots. Default: 10.
    #[builder(default = 10)]
    pub population_size: usize,

    /// Proposals built after the first chain. Default: 50.
    #[builder(default = 50)]
    pub iterations: usize,

    /// Sampled paths per predicted instance. Default: 10.
    #[builder(default = 10)]
    pub inference_iterations: usize,

    /// Default: annealed with `beta = 0.03`.
    #[builder(default = SwapProposal::annealed())]
    pub proposal: SwapProposal,

    /// Default: product.
    #[builder(default)]
    pub aggregation: WeightAggregation,

    /// Clamp for probabilities in weights and path scores.
    pub probability_floor: Option<f64>,

    /// Payoff when training degrades to a single searched chain.
    #[builder(default)]
    pub metric: Metric,

    #[builder(default)]
    pub rebuild: RebuildStrategy,

    /// Random seed. Default: 0.
    #[builder(default = 0)]
    pub seed: u64,

    /// Threads for batch prediction: 0 = auto, 1 = sequential. Default: 0.
    #[builder(default = 0)]
    pub n_threads: usize,

    #[builder(default)]
    pub verbosity: Verbosity,
}

impl<S: population_config_builder::IsComplete> PopulationConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for `population_size == 0`, an invalid
    /// annealing `beta` or a probability floor outside (0, 1).
    pub fn build(self) -> Result<PopulationConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl PopulationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::InvalidPopulationSize);
        }
        if let SwapProposal::Annealed { beta } = self.proposal {
            if !(beta >= 0.0 && beta.is_finite()) {
                return Err(ConfigError::InvalidBeta(beta));
            }
        }
        check_floor(self.probability_floor)
    }

    /// Trainer parameters derived from this config.
    pub fn population_params(&self) -> PopulationParams {
        PopulationParams {
            population_size: self.population_size,
            iterations: self.iterations,
            proposal: self.proposal,
            aggregation: self.aggregation,
            probability_floor: self.probability_floor,
            rebuild: self.rebuild,
            verbosity: self.verbosity,
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self::builder().build().expect("default config is valid")
    }
}

// =============================================================================
// Tests
// =============================================================================
