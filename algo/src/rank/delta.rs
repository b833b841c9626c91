/*
 * SPDX-FileCopyrightText: 2025 The RankGraph Authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Delta PageRank with incremental recomputation.
//!
//! The engine keeps for each node an accumulated _score_ *sᵢ* and a pending
//! _delta_ *δᵢ*. Releasing a node moves its delta into its score and adds
//! α *δᵢ* *pᵢⱼ* to the delta of each successor *j*; the deltas released by
//! dangling nodes are pooled, and the pool is spread as α · pool · *uⱼ* over
//! all nodes. If *M* = *P* + **d**ᵀ**u** is the patched transition matrix,
//! releases keep
//!
//! > **s** + **δ** (*I* − α*M*)⁻¹
//!
//! invariant. Seeding with **s** = **0** and **δ** = **v** makes the
//! invariant equal to **v** (*I* − α*M*)⁻¹, that is, PageRank multiplied by
//! 1 / (1 − α); scores are normalized when building the [`Ranking`], so the
//! scale factor does not matter.
//!
//! After the graph has been edited, the transition matrix changes to *M'*,
//! and [`update`](DeltaPageRank::update) restores the invariant for the new
//! matrix by setting
//!
//! > **δ** = **v** − **s** + α **s** *M'*,
//!
//! so that propagating the new deltas converges to PageRank on the edited
//! graph. Where the edit had no effect the new deltas are zero, so only the
//! affected part of the graph is visited.
//!
//! Each _sweep_ releases every node of the frontier whose delta is at least
//! the [activity threshold](super::Options::activity_threshold) in absolute
//! value; all deltas are taken out before propagating, so the sweep is
//! synchronous. The next frontier contains the nodes whose delta is above
//! the threshold at the end of the sweep. Sweeps stop when the largest
//! pending delta is below the [tolerance](super::Options::tolerance), when
//! the frontier is empty, or after
//! [`max_iterations`](super::Options::max_iterations) sweeps.

use super::preds::{MaxDelta, MaxIter, PredParams};
use super::preference::Preference;
use super::transition::Transition;
use super::{EdgeWeight, Error, Options, Ranking, Result};
use dsi_progress_logger::{ProgressLog, no_logging};
use kahan::KahanSum;
use predicates::Predicate;
use predicates::prelude::PredicateBooleanExt;
use rankgraph::traits::Graph;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Whether a pending delta must be propagated.
#[inline(always)]
pub(super) fn is_active(delta: f64, threshold: f64) -> bool {
    delta != 0.0 && delta.abs() >= threshold
}

/// The statistics of a propagation.
#[derive(Debug, Clone, Copy)]
pub(super) struct Outcome {
    pub(super) iterations: usize,
    pub(super) releases: usize,
    pub(super) residual: f64,
    pub(super) converged: bool,
}

/// Delta PageRank.
///
/// The engine does not borrow the graph: the graph is passed to every call,
/// so it can be edited between a [`compute`](Self::compute) and the
/// following [`update`](Self::update). The state is kept between calls and
/// reused by `update`; calls on the same engine must be serialized.
///
/// # Examples
///
/// ```
/// use rankgraph::prelude::*;
/// use rankgraph_algo::rank::{DeltaPageRank, Error, Options};
///
/// let mut g = MapGraph::from_arcs([(0, 1), (1, 2), (2, 0), (2, 3)]);
/// let options = Options::default().tolerance(1E-10).max_iterations(1000);
///
/// let mut pr = DeltaPageRank::new(&g)?;
/// let before = pr.compute(&g, &options)?;
/// assert!(before.converged);
///
/// // Node 4 is new
/// g.add_arc(3, 4);
/// g.add_arc(4, 0);
/// let after = pr.update(&g, [3, 4], &options)?;
/// assert_eq!(after.len(), 5);
/// assert!((after.total() - 1.0).abs() < 1E-9);
///
/// // Undirected graphs are rejected
/// assert_eq!(
///     DeltaPageRank::new(&MapGraph::<u32>::undirected()).unwrap_err(),
///     Error::UndirectedGraph
/// );
/// # Ok::<(), Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DeltaPageRank<N> {
    /// The node identifiers at the last call, in index order.
    pub(super) nodes: Vec<N>,
    pub(super) scores: Vec<f64>,
    pub(super) deltas: Vec<f64>,
    /// Nodes to be examined by the next sweep, without duplicates.
    pub(super) frontier: Vec<usize>,
    pub(super) transition: Transition,
}

impl<N: Clone + Eq + Hash + Debug> DeltaPageRank<N> {
    /// Creates a new engine for a directed graph.
    ///
    /// Scores are zero, every node has delta 1/*n* and is active, and the
    /// out-weights are the outdegrees.
    pub fn new<G: Graph<Node = N>>(graph: &G) -> Result<Self> {
        Self::check(graph)?;
        let n = graph.num_nodes();
        Ok(Self {
            nodes: graph.nodes().cloned().collect(),
            scores: vec![0.0; n],
            deltas: vec![1.0 / n as f64; n],
            frontier: (0..n).collect(),
            transition: Transition::new(graph, &EdgeWeight::Unit),
        })
    }

    fn check<G: Graph<Node = N>>(graph: &G) -> Result<()> {
        if graph.is_directed() {
            Ok(())
        } else {
            Err(Error::UndirectedGraph)
        }
    }

    /// Returns the node identifiers, in the index order of the last call.
    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    /// Returns the accumulated scores, indexed like [`nodes`](Self::nodes).
    ///
    /// Scores are not normalized.
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Returns the pending deltas, indexed like [`nodes`](Self::nodes).
    ///
    /// After an [`update`](Self::update) deltas can be negative.
    pub fn deltas(&self) -> &[f64] {
        &self.deltas
    }

    /// Returns the sum of the weights of the arcs leaving each node.
    pub fn out_weights(&self) -> &[f64] {
        self.transition.out_weights()
    }

    /// Returns the indices of the dangling nodes, in increasing order.
    pub fn dangling_nodes(&self) -> &[usize] {
        self.transition.dangling()
    }

    /// Computes PageRank from scratch.
    pub fn compute<G: Graph<Node = N>>(
        &mut self,
        graph: &G,
        options: &Options<N>,
    ) -> Result<Ranking<N>> {
        self.compute_with_logging(graph, options, no_logging![])
    }

    /// Computes PageRank from scratch, logging sweeps on `pl`.
    pub fn compute_with_logging<G: Graph<Node = N>>(
        &mut self,
        graph: &G,
        options: &Options<N>,
        pl: &mut impl ProgressLog,
    ) -> Result<Ranking<N>> {
        let Some(preference) = self.seed(graph, options)? else {
            return Ok(Ranking::empty());
        };
        let outcome = self.sweep(options, &preference, pl)?;
        Ok(self.ranking(graph, outcome))
    }

    /// Recomputes PageRank after `graph` has been edited, starting from the
    /// current scores.
    ///
    /// `modified` should contain the endpoints of the arcs that have been
    /// added, removed or reweighted; identifiers not in the graph are
    /// ignored. Nodes can be added to the graph: they start with score zero.
    pub fn update<G: Graph<Node = N>>(
        &mut self,
        graph: &G,
        modified: impl IntoIterator<Item = impl Borrow<N>>,
        options: &Options<N>,
    ) -> Result<Ranking<N>> {
        self.update_with_logging(graph, modified, options, no_logging![])
    }

    /// Recomputes PageRank after `graph` has been edited, logging sweeps on
    /// `pl`.
    pub fn update_with_logging<G: Graph<Node = N>>(
        &mut self,
        graph: &G,
        modified: impl IntoIterator<Item = impl Borrow<N>>,
        options: &Options<N>,
        pl: &mut impl ProgressLog,
    ) -> Result<Ranking<N>> {
        let Some(preference) = self.reseed(graph, modified, options)? else {
            return Ok(Ranking::empty());
        };
        let outcome = self.sweep(options, &preference, pl)?;
        Ok(self.ranking(graph, outcome))
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.scores.clear();
        self.deltas.clear();
        self.frontier.clear();
        self.transition = Transition::default();
    }

    /// Resets the state to **s** = **0**, **δ** = **v**, with all nodes in
    /// the frontier.
    ///
    /// Returns `None` on the empty graph.
    pub(super) fn seed<G: Graph<Node = N>>(
        &mut self,
        graph: &G,
        options: &Options<N>,
    ) -> Result<Option<Preference>> {
        options.validate()?;
        Self::check(graph)?;
        let n = graph.num_nodes();
        if n == 0 {
            self.clear();
            return Ok(None);
        }
        let preference = Preference::new(graph, options)?;
        Self::log_options(options, &preference);

        self.nodes = graph.nodes().cloned().collect();
        self.transition = Transition::new(graph, &options.weights);
        self.scores = vec![0.0; n];
        self.deltas = (0..n).map(|i| preference.value(i)).collect();
        self.frontier = (0..n).collect();
        Ok(Some(preference))
    }

    /// Aligns the scores with the nodes of the edited graph, rebuilds the
    /// transition matrix and recomputes the deltas so that the invariant
    /// holds for the edited graph.
    ///
    /// Returns `None` on the empty graph.
    pub(super) fn reseed<G: Graph<Node = N>>(
        &mut self,
        graph: &G,
        modified: impl IntoIterator<Item = impl Borrow<N>>,
        options: &Options<N>,
    ) -> Result<Option<Preference>> {
        options.validate()?;
        Self::check(graph)?;
        let n = graph.num_nodes();

        let mut scores = vec![0.0; n];
        let mut added = 0;
        {
            let old = self
                .nodes
                .iter()
                .enumerate()
                .map(|(i, node)| (node, i))
                .collect::<HashMap<_, _>>();
            for (i, node) in graph.nodes().enumerate() {
                match old.get(node) {
                    Some(&k) => scores[i] = self.scores[k],
                    None => added += 1,
                }
            }
        }
        let removed = (self.nodes.len() + added).saturating_sub(n);
        if added + removed > 0 {
            log::info!("{added} nodes added, {removed} nodes removed");
        }
        if n == 0 {
            self.clear();
            return Ok(None);
        }

        let preference = Preference::new(graph, options)?;
        Self::log_options(options, &preference);
        self.nodes = graph.nodes().cloned().collect();
        self.scores = scores;
        self.transition = Transition::new(graph, &options.weights);

        // δ = v − s + α s M'
        let alpha = options.alpha;
        let mut deltas = (0..n)
            .map(|i| preference.value(i) - self.scores[i])
            .collect::<Vec<_>>();
        let mut pool = KahanSum::<f64>::new();
        for (i, &s) in self.scores.iter().enumerate() {
            if s == 0.0 {
                continue;
            }
            if self.transition.is_dangling(i) {
                pool += s;
            } else {
                for (j, p) in self.transition.successors(i) {
                    deltas[j] += alpha * s * p;
                }
            }
        }
        self.deltas = deltas;
        self.spread(pool.sum(), alpha, &preference, &mut |_, _| {});

        let threshold = options.activity_threshold();
        let mut in_frontier = vec![false; n];
        let mut frontier = vec![];
        fn push(i: usize, in_frontier: &mut [bool], frontier: &mut Vec<usize>) {
            if !in_frontier[i] {
                in_frontier[i] = true;
                frontier.push(i);
            }
        }
        let mut unknown = 0;
        for node in modified {
            let Some(i) = graph.index_of(node.borrow()) else {
                unknown += 1;
                continue;
            };
            push(i, &mut in_frontier, &mut frontier);
            for j in graph.successors(i).chain(graph.predecessors(i)) {
                push(j, &mut in_frontier, &mut frontier);
            }
        }
        if unknown > 0 {
            log::debug!("Ignoring {unknown} modified nodes not in the graph");
        }
        let neighborhood = frontier.len();
        for (i, &delta) in self.deltas.iter().enumerate() {
            if is_active(delta, threshold) {
                push(i, &mut in_frontier, &mut frontier);
            }
        }
        log::info!(
            "Frontier: {} nodes ({neighborhood} around modified nodes)",
            frontier.len()
        );
        self.frontier = frontier;
        Ok(Some(preference))
    }

    fn log_options(options: &Options<N>, preference: &Preference) {
        log::info!("Mode: {}", options.mode);
        log::info!("Alpha: {}", options.alpha);
        log::info!("Weights: {}", options.weights);
        log::info!(
            "Preference: {}",
            if preference.is_uniform() {
                "uniform"
            } else {
                "custom"
            }
        );
    }

    /// Returns the largest pending delta in absolute value.
    pub(super) fn max_delta(&self) -> f64 {
        self.deltas.iter().fold(0.0, |max, d| d.abs().max(max))
    }

    /// Propagates a released delta to the successors of a node, calling
    /// `touch` with each updated node and its new delta.
    ///
    /// Returns the delta if the node is dangling (it must be pooled), zero
    /// otherwise.
    #[inline(always)]
    pub(super) fn propagate(
        &mut self,
        i: usize,
        delta: f64,
        alpha: f64,
        touch: &mut impl FnMut(usize, f64),
    ) -> f64 {
        if self.transition.is_dangling(i) {
            return delta;
        }
        for (j, p) in self.transition.successors(i) {
            self.deltas[j] += alpha * delta * p;
            touch(j, self.deltas[j]);
        }
        0.0
    }

    /// Spreads the pooled deltas of dangling nodes following **u**, calling
    /// `touch` with each updated node and its new delta.
    pub(super) fn spread(
        &mut self,
        pool: f64,
        alpha: f64,
        preference: &Preference,
        touch: &mut impl FnMut(usize, f64),
    ) {
        if pool == 0.0 || !preference.spreads_dangling() {
            return;
        }
        for (j, delta) in self.deltas.iter_mut().enumerate() {
            let u = preference.dangling(j);
            if u != 0.0 {
                *delta += alpha * pool * u;
                touch(j, *delta);
            }
        }
    }

    /// Runs synchronous sweeps on the frontier.
    fn sweep(
        &mut self,
        options: &Options<N>,
        preference: &Preference,
        pl: &mut impl ProgressLog,
    ) -> Result<Outcome> {
        let n = self.scores.len();
        let alpha = options.alpha;
        let threshold = options.activity_threshold();
        let predicate =
            MaxDelta::try_from(options.tolerance)?.or(MaxIter::from(options.max_iterations));
        log::info!("Activity threshold: {threshold}");
        log::info!("Stopping criterion: {predicate}");

        let mut touched = vec![false; n];
        let mut next = Vec::with_capacity(self.frontier.len());
        let mut released = vec![];
        let mut iterations = 0;
        let mut releases = 0;
        let mut residual = self.max_delta();

        pl.item_name("sweep");
        pl.expected_updates(Some(options.max_iterations));
        pl.start(format!("Propagating deltas (alpha={alpha})..."));

        while !self.frontier.is_empty()
            && !predicate.eval(&PredParams {
                iteration: iterations,
                residual,
            })
        {
            released.clear();
            for &i in &self.frontier {
                let delta = self.deltas[i];
                if is_active(delta, threshold) {
                    self.deltas[i] = 0.0;
                    self.scores[i] += delta;
                    released.push((i, delta));
                }
            }

            {
                let mut touch = |j: usize, _: f64| {
                    if !touched[j] {
                        touched[j] = true;
                        next.push(j);
                    }
                };
                let mut pool = KahanSum::<f64>::new();
                for &(i, delta) in &released {
                    pool += self.propagate(i, delta, alpha, &mut touch);
                }
                self.spread(pool.sum(), alpha, preference, &mut touch);
            }

            for &j in &next {
                touched[j] = false;
            }
            next.retain(|&j| is_active(self.deltas[j], threshold));
            std::mem::swap(&mut self.frontier, &mut next);
            next.clear();

            iterations += 1;
            releases += released.len();
            residual = self.max_delta();
            log::debug!(
                "Sweep {iterations}: {} releases, {} active nodes, max delta = {residual}",
                released.len(),
                self.frontier.len()
            );
            pl.update_and_display();
        }
        pl.done();

        let converged = residual < options.tolerance;
        if converged {
            log::info!("Converged after {iterations} sweeps ({releases} releases)");
        } else {
            log::info!(
                "Stopped after {iterations} sweeps ({releases} releases) with max delta {residual}"
            );
        }
        Ok(Outcome {
            iterations,
            releases,
            residual,
            converged,
        })
    }

    /// Normalizes the current estimate **s** + **δ** into a [`Ranking`].
    pub(super) fn ranking<G: Graph<Node = N>>(&self, graph: &G, outcome: Outcome) -> Ranking<N> {
        let estimate = self
            .scores
            .iter()
            .zip(&self.deltas)
            .map(|(s, d)| (s + d).max(0.0))
            .collect::<Vec<_>>();
        let mut ranking = Ranking::from_scores(graph, &estimate);
        ranking.iterations = outcome.iterations;
        ranking.converged = outcome.converged;
        ranking.residual = outcome.residual;
        ranking.releases = outcome.releases;
        ranking
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankgraph::graphs::map_graph::MapGraph;

    #[test]
    fn test_new() -> Result<()> {
        let g = MapGraph::from_weighted_arcs([(0, 1, 2.0), (0, 2, 1.0), (1, 2, 1.0)]);
        let pr = DeltaPageRank::new(&g)?;
        assert_eq!(pr.scores(), &[0.0; 3]);
        assert_eq!(pr.deltas(), &[1.0 / 3.0; 3]);
        assert_eq!(pr.out_weights(), &[2.0, 1.0, 0.0]);
        assert_eq!(pr.dangling_nodes(), &[2]);
        assert_eq!(pr.frontier, vec![0, 1, 2]);
        Ok(())
    }

    #[test]
    fn test_alpha_zero() -> Result<()> {
        let g = MapGraph::from_arcs([(0, 1), (1, 2)]);
        let mut pr = DeltaPageRank::new(&g)?;
        let ranking = pr.compute(&g, &Options::default().alpha(0.0))?;
        assert_eq!(ranking.iterations, 1);
        assert!(ranking.converged);
        assert_eq!(ranking.releases, 3);
        assert!(pr.deltas().iter().all(|&d| d == 0.0));
        for node in 0..3 {
            assert!((ranking.rank(&node) - 1.0 / 3.0).abs() < 1E-12);
        }
        Ok(())
    }

    #[test]
    fn test_update_without_edits() -> Result<()> {
        let g = MapGraph::from_arcs([(0, 1), (1, 2), (2, 0), (2, 3)]);
        let options = Options::default().tolerance(1E-10).max_iterations(1000);
        let mut pr = DeltaPageRank::new(&g)?;
        let before = pr.compute(&g, &options)?;
        // Deltas are recomputed from the scores: nothing is left to propagate
        let after = pr.update(&g, [0], &options)?;
        assert!(after.converged);
        assert!(after.iterations <= 1);
        for node in 0..4 {
            assert!((before.rank(&node) - after.rank(&node)).abs() < 1E-9);
        }
        Ok(())
    }

    #[test]
    fn test_reseed_invariant() -> Result<()> {
        let mut g = MapGraph::from_arcs([(0, 1), (1, 2), (2, 0)]);
        let options = Options::default().tolerance(1E-12).max_iterations(1000);
        let mut pr = DeltaPageRank::new(&g)?;
        pr.compute(&g, &options)?;
        g.remove_arc(&2, &0);
        pr.reseed(&g, [2], &options)?;
        // Node 2 is now dangling: its whole score is pooled and spread
        let s = pr.scores().to_vec();
        let pool = 0.85 * s[2] / 3.0;
        assert!((pr.deltas()[0] - (1.0 / 3.0 - s[0] + pool)).abs() < 1E-12);
        assert!((pr.deltas()[1] - (1.0 / 3.0 - s[1] + 0.85 * s[0] + pool)).abs() < 1E-12);
        assert_eq!(pr.dangling_nodes(), &[2]);
        assert!(pr.frontier.contains(&1) && pr.frontier.contains(&2));
        Ok(())
    }

    #[test]
    fn test_empty() -> Result<()> {
        let mut g = MapGraph::<u32>::directed();
        let mut pr = DeltaPageRank::new(&g)?;
        let ranking = pr.compute(&g, &Options::default())?;
        assert!(ranking.is_empty());
        assert!(ranking.converged);
        assert_eq!(ranking.iterations, 0);
        g.add_node(7);
        let ranking = pr.update(&g, [7], &Options::default())?;
        assert_eq!(ranking.rank(&7), 1.0);
        Ok(())
    }
}
