/*
 * SPDX-FileCopyrightText: 2025 The RankGraph Authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{Error, Result};
use rankgraph::traits::Graph;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Selects the distribution **u** used to redistribute the rank of dangling
/// nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Uses the preference vector **v** as the dangling-node distribution
    /// (**u** = **v**; uniform if no preference is set). This is the default.
    #[default]
    StronglyPreferential,
    /// Uses a uniform dangling-node distribution (**u** = **1**/*n*) regardless
    /// of the preference vector.
    WeaklyPreferential,
    /// Zeroes out the dangling-node contribution (**u** = **0**). The
    /// resulting vector is not stochastic, but since all engines normalize
    /// their output it coincides with the
    /// [strongly preferential](Mode::StronglyPreferential) one.
    PseudoRank,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::StronglyPreferential => f.write_str("strongly preferential"),
            Mode::WeaklyPreferential => f.write_str("weakly preferential"),
            Mode::PseudoRank => f.write_str("pseudorank"),
        }
    }
}

/// Selects the weight of arcs.
///
/// The probability of following an arc is its weight divided by the sum of
/// the weights of the arcs leaving the same node; nodes whose outgoing
/// weights sum to zero are dangling. Weights are not validated: negative
/// weights yield meaningless results.
pub enum EdgeWeight<N> {
    /// Every arc has weight 1.
    Unit,
    /// Uses the [weight](rankgraph::traits::Edge::weight) stored in the
    /// graph, or 1 for arcs without weight.
    Attribute,
    /// Computes the weight from the identifiers of the endpoints.
    Custom(Arc<dyn Fn(&N, &N) -> f64 + Send + Sync>),
}

impl<N> EdgeWeight<N> {
    /// Wraps a closure into a [`Custom`](EdgeWeight::Custom) weight.
    pub fn custom(f: impl Fn(&N, &N) -> f64 + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    /// Returns the weight of the arc from `src` to `dst`.
    pub fn weight<G: Graph<Node = N>>(&self, graph: &G, src: usize, dst: usize) -> f64 {
        match self {
            EdgeWeight::Unit => 1.0,
            EdgeWeight::Attribute => graph.edge(src, dst).map_or(1.0, |e| e.weight_or_one()),
            EdgeWeight::Custom(f) => f(graph.node(src), graph.node(dst)),
        }
    }
}

impl<N> Default for EdgeWeight<N> {
    fn default() -> Self {
        Self::Unit
    }
}

impl<N> Clone for EdgeWeight<N> {
    fn clone(&self) -> Self {
        match self {
            EdgeWeight::Unit => EdgeWeight::Unit,
            EdgeWeight::Attribute => EdgeWeight::Attribute,
            EdgeWeight::Custom(f) => EdgeWeight::Custom(Arc::clone(f)),
        }
    }
}

impl<N> std::fmt::Debug for EdgeWeight<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeWeight::Unit => f.write_str("Unit"),
            EdgeWeight::Attribute => f.write_str("Attribute"),
            EdgeWeight::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl<N> std::fmt::Display for EdgeWeight<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeWeight::Unit => f.write_str("unit"),
            EdgeWeight::Attribute => f.write_str("arc attribute"),
            EdgeWeight::Custom(_) => f.write_str("custom"),
        }
    }
}

/// Options shared by all PageRank engines.
///
/// Fields can be set directly or with the chainable setters:
///
/// ```
/// use rankgraph_algo::rank::{EdgeWeight, Options};
///
/// let options = Options::<&str>::default()
///     .alpha(0.9)
///     .tolerance(1E-9)
///     .max_iterations(1000)
///     .preference([("home", 1.0)])
///     .weights(EdgeWeight::Attribute);
///
/// assert_eq!(options.alpha, 0.9);
/// assert_eq!(options.activity_threshold(), options.tolerance / 10.0);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Options<N> {
    /// The damping factor α, in [0 . . 1].
    pub alpha: f64,
    /// The convergence tolerance ε.
    pub tolerance: f64,
    /// The maximum number of iterations.
    pub max_iterations: usize,
    /// The activity threshold under which a pending delta is not propagated;
    /// if `None`, [ε/10](Options::activity_threshold) is used.
    pub threshold: Option<f64>,
    /// The (unnormalized) preference vector; if `None`, the preference is
    /// uniform. Nodes not appearing in the map have preference zero.
    pub preference: Option<HashMap<N, f64>>,
    /// The weight of arcs.
    pub weights: EdgeWeight<N>,
    /// The treatment of dangling nodes.
    pub mode: Mode,
    /// The maximum number of releases of the priority scheduler; if `None`,
    /// the maximum number of iterations times the number of nodes.
    pub push_budget: Option<usize>,
}

impl<N> Options<N> {
    pub const DEFAULT_ALPHA: f64 = 0.85;
    pub const DEFAULT_TOLERANCE: f64 = 1E-6;
    pub const DEFAULT_MAX_ITERATIONS: usize = 100;
}

impl<N> Default for Options<N> {
    fn default() -> Self {
        Self {
            alpha: Self::DEFAULT_ALPHA,
            tolerance: Self::DEFAULT_TOLERANCE,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            threshold: None,
            preference: None,
            weights: EdgeWeight::Unit,
            mode: Mode::default(),
            push_budget: None,
        }
    }
}

impl<N: Eq + Hash> Options<N> {
    /// Sets the damping factor α.
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the convergence tolerance ε.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the maximum number of iterations.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the activity threshold.
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Sets the preference (personalization) vector.
    ///
    /// The values are normalized at computation time, so they need not sum
    /// to one.
    pub fn preference(mut self, preference: impl IntoIterator<Item = (N, f64)>) -> Self {
        self.preference = Some(preference.into_iter().collect());
        self
    }

    /// Sets the weight of arcs.
    pub fn weights(mut self, weights: EdgeWeight<N>) -> Self {
        self.weights = weights;
        self
    }

    /// Sets the [mode](Mode).
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the maximum number of releases of the priority scheduler.
    pub fn push_budget(mut self, push_budget: usize) -> Self {
        self.push_budget = Some(push_budget);
        self
    }

    /// Returns the activity threshold: the value set, or ε/10.
    pub fn activity_threshold(&self) -> f64 {
        self.threshold.unwrap_or(self.tolerance / 10.0)
    }

    /// Checks that all options are within their domain.
    ///
    /// The sum of the preference vector can be checked only against a
    /// graph, and it is checked when a computation starts.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(Error::InvalidParameter(format!(
                "The damping factor must be in [0 . . 1], got {}",
                self.alpha
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "The tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        if let Some(threshold) = self.threshold {
            if !(threshold.is_finite() && threshold >= 0.0) {
                return Err(Error::InvalidParameter(format!(
                    "The activity threshold must be nonnegative and finite, got {threshold}"
                )));
            }
        }
        if let Some(preference) = &self.preference {
            if let Some(&x) = preference.values().find(|x| !(x.is_finite() && **x >= 0.0)) {
                return Err(Error::InvalidParameter(format!(
                    "The preference entries must be nonnegative and finite, got {x}"
                )));
            }
        }
        Ok(())
    }
}
