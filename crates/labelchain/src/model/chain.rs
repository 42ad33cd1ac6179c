//! High-level single-chain model.

use std::sync::Arc;

use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use super::config::{ChainConfig, DependenceKind, InferenceMode, StructureKind};
use crate::chain::{ChainModel, ChainOrder, ChainStructure};
use crate::classifier::ClassifierFactory;
use crate::data::MultiLabelDataset;
use crate::dependency::{ConditionalDependence, DependencyEstimator, MarginalDependence};
use crate::error::{ChainError, Result};
use crate::evaluation::{MetricEvaluator, MetricValue};
use crate::inference::{ChainPrediction, ExhaustiveSearch, StochasticSearch};
use crate::search::OrderSearch;
use crate::tree::DependencyTreeBuilder;
use crate::utils::run_with_threads;

/// A trained classifier chain with its configuration.
///
/// Wraps a [`ChainModel`] and remembers how to build and query it: plain or
/// tree structure, optional order search, and the inference mode used by
/// [`predict`](Self::predict).
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use labelchain::classifier::FrequencyFactory;
/// use labelchain::data::MultiLabelDataset;
/// use labelchain::model::{ChainConfig, ClassifierChain};
/// use ndarray::array;
///
/// let features = array![[0.0f32], [1.0], [0.0], [1.0]];
/// let labels = array![[0, 0], [1, 1], [0, 0], [1, 1]];
/// let dataset = MultiLabelDataset::new(features.view(), labels.view()).unwrap();
///
/// let config = ChainConfig::builder().initial_order(vec![1, 0]).build().unwrap();
/// let chain = ClassifierChain::train(&dataset, Arc::new(FrequencyFactory::default()), config).unwrap();
/// let predictions = chain.predict(dataset.features()).unwrap();
/// assert_eq!(predictions.dim(), (4, 2));
/// ```
#[derive(Debug, Clone)]
pub struct ClassifierChain {
    model: ChainModel,
    config: ChainConfig,
    /// Search payoff, when an order search ran.
    payoff: Option<MetricValue>,
}

impl ClassifierChain {
    // =========================================================================
    // Training
    // =========================================================================

    /// Train a chain on `dataset`.
    ///
    /// All randomness (initial order, proposals, holdout split) comes from a
    /// generator seeded with `config.seed`, so equal inputs give equal
    /// chains.
    ///
    /// # Errors
    ///
    /// Structural errors for an initial order or tree root that does not fit
    /// the dataset; collaborator failures abort training.
    pub fn train(
        dataset: &MultiLabelDataset,
        factory: Arc<dyn ClassifierFactory>,
        config: ChainConfig,
    ) -> Result<Self> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);
        let (model, payoff) = match config.structure {
            StructureKind::Plain => Self::train_plain(dataset, factory.as_ref(), &config, &mut rng)?,
            StructureKind::Tree { dependence } => {
                let root = Self::tree_root(&config, dataset.n_labels())?;
                let estimator: Arc<dyn DependencyEstimator> = match dependence {
                    DependenceKind::Marginal => Arc::new(MarginalDependence),
                    DependenceKind::Conditional => {
                        Arc::new(ConditionalDependence::new(Arc::clone(&factory)))
                    }
                };
                let structure = DependencyTreeBuilder::new(estimator).build(dataset, root)?;
                (ChainModel::build(structure, dataset, factory.as_ref())?, None)
            }
        };

        tracing::debug!(
            order = %model.order(),
            tree = model.structure().is_tree(),
            "chain trained"
        );
        Ok(Self {
            model,
            config,
            payoff,
        })
    }

    fn train_plain(
        dataset: &MultiLabelDataset,
        factory: &dyn ClassifierFactory,
        config: &ChainConfig,
        rng: &mut dyn RngCore,
    ) -> Result<(ChainModel, Option<MetricValue>)> {
        let initial = config
            .initial_order
            .clone()
            .map(ChainOrder::new)
            .transpose()?;
        if let Some(order) = &initial {
            if order.len() != dataset.n_labels() {
                return Err(ChainError::LabelCountMismatch {
                    expected: dataset.n_labels(),
                    got: order.len(),
                });
            }
        }

        if config.search_iterations == 0 {
            let order = initial.unwrap_or_else(|| ChainOrder::random(dataset.n_labels(), rng));
            let model = ChainModel::build(ChainStructure::plain(order), dataset, factory)?;
            return Ok((model, None));
        }

        let evaluator = MetricEvaluator::new(config.metric.clone());
        let outcome = OrderSearch::new(config.order_search_params())
            .search(dataset, initial, factory, &evaluator, rng)?;
        Ok((outcome.model, Some(outcome.payoff)))
    }

    fn tree_root(config: &ChainConfig, n_labels: usize) -> Result<usize> {
        let root = match config.tree_root {
            Some(root) => root,
            None => usize::try_from(config.seed).map_err(|_| ChainError::RootOutOfRange {
                root: usize::MAX,
                n_labels,
            })?,
        };
        if root >= n_labels {
            return Err(ChainError::RootOutOfRange { root, n_labels });
        }
        Ok(root)
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Predict one instance with the configured inference mode.
    ///
    /// Stochastic inference draws from `rng`; the other modes ignore it.
    pub fn predict_instance(
        &self,
        features: ArrayView1<'_, f32>,
        rng: &mut dyn RngCore,
    ) -> Result<ChainPrediction> {
        let floor = self.config.probability_floor;
        match self.config.inference {
            InferenceMode::Greedy => self.model.predict(features),
            InferenceMode::Stochastic { iterations } => {
                let search = StochasticSearch {
                    iterations,
                    probability_floor: floor,
                };
                Ok(search.predict(&self.model, features, rng)?.path)
            }
            InferenceMode::Exhaustive { max_combinations } => {
                let search = ExhaustiveSearch {
                    max_combinations,
                    probability_floor: floor,
                };
                let result = search.predict(&self.model, features)?;
                Ok(ChainPrediction {
                    labels: result.labels,
                    confidences: result.confidences,
                })
            }
        }
    }

    /// Predict every row of `features`, returning `[n_samples, n_labels]`.
    ///
    /// Rows are predicted in parallel according to `config.n_threads`. Row
    /// `i` draws from a generator seeded with `seed + i`, so the result does
    /// not depend on the thread count.
    pub fn predict(&self, features: ArrayView2<'_, f32>) -> Result<Array2<usize>> {
        let seed = self.config.seed;
        let rows = run_with_threads(self.config.n_threads, |parallelism| {
            parallelism.maybe_par_map(0..features.nrows(), |row| {
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed.wrapping_add(row as u64));
                self.predict_instance(features.row(row), &mut rng)
                    .map(|p| p.labels)
            })
        });
        collect_rows(rows, self.model.n_labels())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get reference to the trained chain.
    pub fn model(&self) -> &ChainModel {
        &self.model
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn order(&self) -> &ChainOrder {
        self.model.order()
    }

    /// Best payoff of the order search, `None` if no search ran.
    pub fn payoff(&self) -> Option<&MetricValue> {
        self.payoff.as_ref()
    }
}

/// Stack per-row label vectors into a matrix, stopping at the first error.
pub(crate) fn collect_rows(
    rows: Vec<Result<Vec<usize>>>,
    n_labels: usize,
) -> Result<Array2<usize>> {
    let mut out = Array2::zeros((rows.len(), n_labels));
    for (mut dst, row) in out.rows_mut().into_iter().zip(rows) {
        for (slot, value) in dst.iter_mut().zip(row?) {
            *slot = value;
        }
    }
    Ok(out)
}
