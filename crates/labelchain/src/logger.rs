//! Verbosity-gated progress logging for search loops.
//!
//! Events are emitted through `tracing` under the `labelchain::search`
//! target; install any subscriber to see them. [`Verbosity`] decides which
//! events are produced at all, so a `Silent` search does no formatting work.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::evaluation::MetricValue;

/// Verbosity level for search and training output.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Verbosity {
    /// No output.
    #[default]
    Silent,
    /// Only warnings.
    Warning,
    /// Start, accepted proposals and summary.
    Info,
    /// Every proposal, accepted or not.
    Debug,
}

/// Logger for one search run (order search or population refinement).
#[derive(Debug)]
pub struct SearchLogger {
    verbosity: Verbosity,
    name: &'static str,
    started: Option<Instant>,
    accepted: usize,
}

impl SearchLogger {
    pub fn new(name: &'static str, verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            name,
            started: None,
            accepted: 0,
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Record the start of a run with the initial payoff.
    pub fn start(&mut self, iterations: usize, initial: &MetricValue) {
        self.started = Some(Instant::now());
        self.accepted = 0;
        if self.verbosity >= Verbosity::Info {
            tracing::info!(
                target: "labelchain::search",
                search = self.name,
                iterations,
                initial = %initial,
                "starting search"
            );
        }
    }

    /// Record an accepted candidate.
    pub fn log_accept(&mut self, iteration: usize, order: &[usize], payoff: &MetricValue) {
        self.accepted += 1;
        if self.verbosity >= Verbosity::Info {
            tracing::info!(
                target: "labelchain::search",
                search = self.name,
                iteration,
                ?order,
                payoff = %payoff,
                "accepted"
            );
        }
    }

    /// Record a rejected candidate.
    pub fn log_reject(&self, iteration: usize, payoff: &MetricValue) {
        if self.verbosity >= Verbosity::Debug {
            tracing::debug!(
                target: "labelchain::search",
                search = self.name,
                iteration,
                payoff = %payoff,
                "rejected"
            );
        }
    }

    pub fn warn(&self, message: &str) {
        if self.verbosity >= Verbosity::Warning {
            tracing::warn!(target: "labelchain::search", search = self.name, "{message}");
        }
    }

    /// Record the end of a run.
    pub fn finish(&self, best: &MetricValue) {
        if self.verbosity >= Verbosity::Info {
            let elapsed_ms = self
                .started
                .map(|t| t.elapsed().as_secs_f64() * 1e3)
                .unwrap_or_default();
            tracing::info!(
                target: "labelchain::search",
                search = self.name,
                accepted = self.accepted,
                best = %best,
                elapsed_ms,
                "search finished"
            );
        }
    }

    /// Number of accepted candidates since [`start`](Self::start).
    pub fn accepted(&self) -> usize {
        self.accepted
    }
}
