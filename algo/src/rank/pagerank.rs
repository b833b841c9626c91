/*
 * SPDX-FileCopyrightText: 2025 The RankGraph Authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Parallel Jacobi PageRank.
//!
//! This is the reference implementation: every node is updated at every
//! iteration, and the other engines are tested against it.
//!
//! # The formula
//!
//! If we denote with *P* the row-normalized weighted adjacency matrix of the
//! graph (with zero rows for dangling nodes), with **d** the characteristic
//! vector of dangling nodes, with **v** the preference vector, with **u** the
//! dangling-node distribution selected by the [`Mode`](super::Mode) and with
//! α the damping factor, PageRank is the solution of
//!
//! > **x** = (1 − α) **v** + α **x** (*P* + **d**ᵀ **u**).
//!
//! # The Jacobi method
//!
//! We start from **x** = **v** and apply the equation above as an update
//! rule, pulling contributions from predecessors:
//!
//! > *xᵢ*⁽*ᵗ* ⁺ ¹⁾ = (1 − α) *vᵢ* + α ( ∑_(*j* → *i*) *pⱼᵢ* *xⱼ*⁽*ᵗ*⁾ + *uᵢ* ∑_(*j* dangling) *xⱼ*⁽*ᵗ*⁾ ).
//!
//! The rank of dangling nodes is summed once at the start of each iteration.
//! Since each new value depends only on the previous vector, nodes are
//! updated in parallel using Rayon; each sum is computed sequentially with
//! [Kahan summation](kahan::KahanSum), so the result does not depend on the
//! number of threads.
//!
//! # Stopping criteria
//!
//! After each iteration we compute the _norm delta_ α / (1 − α) ·
//! ‖**x**⁽ᵗ⁾ − **x**⁽ᵗ⁻¹⁾‖₁, an upper bound on the ℓ₁ error (when α = 1 we use
//! the plain norm of the difference), and stop when it is at most the
//! [tolerance](super::Options::tolerance), or after
//! [`max_iterations`](super::Options::max_iterations) iterations (see
//! [`L1Norm`] and [`MaxIter`]).

use super::preds::{L1Norm, MaxIter, PredParams};
use super::preference::Preference;
use super::transition::Transition;
use super::{Options, Ranking, Result};
use dsi_progress_logger::{ProgressLog, no_logging};
use kahan::KahanSum;
use predicates::Predicate;
use predicates::prelude::PredicateBooleanExt;
use rankgraph::traits::Graph;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefMutIterator, ParallelIterator};

/// Minimum number of nodes passed to a Rayon task.
const RAYON_MIN_LEN: usize = 1024;

/// Computes PageRank using a parallel Jacobi iteration.
///
/// After [`run`](Self::run) the rank vector, indexed like the graph, is
/// available via the [`rank`](Self::rank) method.
///
/// # Examples
///
/// ```
/// use rankgraph::prelude::*;
/// use rankgraph_algo::rank::{Mode, Options, PageRank};
///
/// //   0 → 1, 0 → 2, 1 → 2, 2 → 0, 3 → 0, 4 → 3
/// let g = MapGraph::from_arcs([(0, 1), (0, 2), (1, 2), (2, 0), (3, 0), (4, 3)]);
///
/// let mut pr = PageRank::new(&g);
/// let ranking = pr.run(&Options::default().tolerance(1E-9))?;
///
/// assert!(ranking.converged);
/// assert_eq!(pr.rank().len(), 5);
/// assert!((ranking.total() - 1.0).abs() < 1E-9);
///
/// // Favor node 4, which has no predecessors: all the teleportation mass
/// // goes there, and a fraction α flows on to node 3
/// let options = Options::default()
///     .alpha(0.9)
///     .preference([(4, 1.0)])
///     .mode(Mode::WeaklyPreferential);
/// let ranking = pr.run(&options)?;
/// assert!((ranking.rank(&4) - 0.1).abs() < 1E-6);
/// assert!(ranking.rank(&4) > ranking.rank(&3));
/// # Ok::<(), rankgraph_algo::rank::Error>(())
/// ```
pub struct PageRank<'a, G: Graph> {
    graph: &'a G,
    rank: Box<[f64]>,
    norm_delta: f64,
    iteration: usize,
}

impl<G: Graph> std::fmt::Debug for PageRank<'_, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRank")
            .field("num_nodes", &self.rank.len())
            .field("norm_delta", &self.norm_delta)
            .field("iteration", &self.iteration)
            .finish_non_exhaustive()
    }
}

impl<'a, G: Graph> PageRank<'a, G> {
    /// Creates a new PageRank computation on a graph.
    pub fn new(graph: &'a G) -> Self {
        Self {
            graph,
            rank: vec![0.0; graph.num_nodes()].into_boxed_slice(),
            norm_delta: f64::INFINITY,
            iteration: 0,
        }
    }

    /// Returns the rank vector, indexed like the graph.
    ///
    /// After calling [`run`](Self::run), this contains the computed PageRank
    /// values (not normalized in [pseudorank](super::Mode::PseudoRank)
    /// mode).
    pub fn rank(&self) -> &[f64] {
        &self.rank
    }

    /// Returns the number of iterations performed by the last call to
    /// [`run`](Self::run).
    pub fn iterations(&self) -> usize {
        self.iteration
    }

    /// Returns the norm delta after the last iteration.
    pub fn norm_delta(&self) -> f64 {
        self.norm_delta
    }

    /// Runs the PageRank computation with the given options.
    pub fn run(&mut self, options: &Options<G::Node>) -> Result<Ranking<G::Node>> {
        self.run_with_logging(options, no_logging![])
    }

    /// Runs the PageRank computation with the given options, logging
    /// iterations on `pl`.
    ///
    /// The options of `pl` will be preserved, making thus possible to
    /// customize the logs.
    pub fn run_with_logging(
        &mut self,
        options: &Options<G::Node>,
        pl: &mut impl ProgressLog,
    ) -> Result<Ranking<G::Node>> {
        options.validate()?;
        let graph = self.graph;
        let n = graph.num_nodes();
        self.iteration = 0;
        self.norm_delta = f64::INFINITY;
        if n == 0 {
            self.rank = Box::default();
            self.norm_delta = 0.0;
            return Ok(Ranking::empty());
        }

        let alpha = options.alpha;
        let preference = Preference::new(graph, options)?;
        let predicate =
            L1Norm::try_from(options.tolerance)?.or(MaxIter::from(options.max_iterations));

        log::info!("Mode: {}", options.mode);
        log::info!("Alpha: {alpha}");
        log::info!("Weights: {}", options.weights);
        log::info!(
            "Preference: {}",
            if preference.is_uniform() {
                "uniform"
            } else {
                "custom"
            }
        );
        log::info!("Stopping criterion: {predicate}");

        pl.info(format_args!("Computing transition probabilities..."));
        let transition = Transition::new(graph, &options.weights);
        let pred = transition.predecessors();
        log::info!("{} dangling nodes", transition.dangling().len());

        let mut rank = (0..n).map(|i| preference.value(i)).collect::<Box<[f64]>>();
        let mut next = vec![0.0; n].into_boxed_slice();

        pl.item_name("iteration");
        pl.expected_updates(Some(options.max_iterations));
        pl.start(format!("Computing PageRank (alpha={alpha})..."));

        loop {
            if predicate.eval(&PredParams {
                iteration: self.iteration,
                residual: self.norm_delta,
            }) {
                break;
            }

            let dangling_rank = transition
                .dangling()
                .iter()
                .fold(KahanSum::<f64>::new(), |sum, &j| sum + rank[j])
                .sum();

            next.par_iter_mut()
                .enumerate()
                .with_min_len(RAYON_MIN_LEN)
                .for_each(|(i, x)| {
                    let mut sigma = KahanSum::<f64>::new();
                    for (j, p) in pred.row(i) {
                        sigma += rank[j] * p;
                    }
                    sigma += dangling_rank * preference.dangling(i);
                    *x = (1.0 - alpha) * preference.value(i) + alpha * sigma.sum();
                });

            let norm = next
                .iter()
                .zip(rank.iter())
                .fold(KahanSum::<f64>::new(), |sum, (x, y)| sum + (x - y).abs())
                .sum();
            std::mem::swap(&mut rank, &mut next);

            // Bound on 𝓁₁ error
            self.norm_delta = if alpha < 1.0 {
                norm * alpha / (1.0 - alpha)
            } else {
                norm
            };
            self.iteration += 1;
            log::debug!(
                "Iteration {}: norm delta = {}",
                self.iteration,
                self.norm_delta
            );
            pl.update_and_display();
        }

        pl.done();

        let converged = self.norm_delta <= options.tolerance;
        if !converged {
            log::info!(
                "Stopped after {} iterations without convergence (norm delta = {})",
                self.iteration,
                self.norm_delta
            );
        }
        self.rank = rank;

        let mut ranking = Ranking::from_scores(graph, &self.rank);
        ranking.iterations = self.iteration;
        ranking.converged = converged;
        ranking.residual = self.norm_delta;
        ranking.releases = self.iteration * n;
        Ok(ranking)
    }
}

/// Computes PageRank on a graph with the given options.
///
/// This is a shorthand for [`PageRank::new`] followed by [`PageRank::run`].
pub fn pagerank<G: Graph>(graph: &G, options: &Options<G::Node>) -> Result<Ranking<G::Node>> {
    PageRank::new(graph).run(options)
}
