/*
 * SPDX-FileCopyrightText: 2025 The RankGraph Authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The priority scheduler of [`DeltaPageRank`].
//!
//! Instead of sweeping the frontier, nodes are kept in a
//! [quaternary heap](dary_heap::QuaternaryHeap) keyed by the absolute value
//! of their delta and released one at a time, largest first. A node is
//! pushed again every time its delta crosses the activity threshold, so the
//! heap can contain stale entries: they are recognized on pop because the
//! delta of the node has in the meantime been released.

use super::delta::{DeltaPageRank, Outcome, is_active};
use super::preds::{MaxDelta, PredParams};
use super::preference::Preference;
use super::{Options, Ranking, Result};
use dary_heap::QuaternaryHeap;
use dsi_progress_logger::{ProgressLog, no_logging};
use kahan::KahanSum;
use predicates::Predicate;
use rankgraph::traits::Graph;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt::Debug;
use std::hash::Hash;

/// Number of releases between two convergence checks.
const CHECKPOINT: usize = 1000;

/// A heap entry: a node and the absolute value of its delta when it was
/// pushed.
#[derive(Debug, Clone, Copy)]
struct Pending {
    priority: f64,
    node: usize,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> Ordering {
        // Ties are broken in favor of lower indices
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Pushes a node on the heap if its delta is active.
#[inline(always)]
fn enqueue(heap: &mut QuaternaryHeap<Pending>, node: usize, delta: f64, threshold: f64) {
    if is_active(delta, threshold) {
        heap.push(Pending {
            priority: delta.abs(),
            node,
        });
    }
}

impl<N: Clone + Eq + Hash + Debug> DeltaPageRank<N> {
    /// Computes PageRank from scratch using the priority scheduler.
    ///
    /// Releases stop when the heap is empty, when a checkpoint finds all
    /// deltas below the [tolerance](Options::tolerance), or after
    /// [`push_budget`](Options::push_budget) releases (by default,
    /// [`max_iterations`](Options::max_iterations) times the number of
    /// nodes). Pending deltas are then flushed into the scores.
    ///
    /// # Examples
    ///
    /// ```
    /// use rankgraph::prelude::*;
    /// use rankgraph_algo::rank::{DeltaPageRank, Options};
    ///
    /// let g = MapGraph::from_arcs([("a", "b"), ("b", "c"), ("c", "a"), ("c", "d")]);
    /// let mut pr = DeltaPageRank::new(&g)?;
    /// let exact = pr.compute_with_priority(&g, &Options::default().max_iterations(1000))?;
    /// assert!(exact.converged);
    ///
    /// // A budgeted, approximate computation
    /// let rough = pr.compute_with_priority(&g, &Options::default().push_budget(6))?;
    /// assert_eq!(rough.releases, 6);
    /// assert!(!rough.converged);
    /// assert!((rough.total() - 1.0).abs() < 1E-12);
    /// # Ok::<(), rankgraph_algo::rank::Error>(())
    /// ```
    pub fn compute_with_priority<G: Graph<Node = N>>(
        &mut self,
        graph: &G,
        options: &Options<N>,
    ) -> Result<Ranking<N>> {
        self.compute_with_priority_and_logging(graph, options, no_logging![])
    }

    /// Computes PageRank from scratch using the priority scheduler, logging
    /// releases on `pl`.
    pub fn compute_with_priority_and_logging<G: Graph<Node = N>>(
        &mut self,
        graph: &G,
        options: &Options<N>,
        pl: &mut impl ProgressLog,
    ) -> Result<Ranking<N>> {
        let Some(preference) = self.seed(graph, options)? else {
            return Ok(Ranking::empty());
        };
        let outcome = self.drain(options, &preference, pl)?;
        Ok(self.ranking(graph, outcome))
    }

    /// Recomputes PageRank after `graph` has been edited using the priority
    /// scheduler.
    ///
    /// See [`update`](Self::update) for the meaning of `modified`.
    pub fn update_with_priority<G: Graph<Node = N>>(
        &mut self,
        graph: &G,
        modified: impl IntoIterator<Item = impl Borrow<N>>,
        options: &Options<N>,
    ) -> Result<Ranking<N>> {
        self.update_with_priority_and_logging(graph, modified, options, no_logging![])
    }

    /// Recomputes PageRank after `graph` has been edited using the priority
    /// scheduler, logging releases on `pl`.
    pub fn update_with_priority_and_logging<G: Graph<Node = N>>(
        &mut self,
        graph: &G,
        modified: impl IntoIterator<Item = impl Borrow<N>>,
        options: &Options<N>,
        pl: &mut impl ProgressLog,
    ) -> Result<Ranking<N>> {
        let Some(preference) = self.reseed(graph, modified, options)? else {
            return Ok(Ranking::empty());
        };
        let outcome = self.drain(options, &preference, pl)?;
        Ok(self.ranking(graph, outcome))
    }

    /// Releases nodes in priority order, starting from the frontier.
    fn drain(
        &mut self,
        options: &Options<N>,
        preference: &Preference,
        pl: &mut impl ProgressLog,
    ) -> Result<Outcome> {
        let n = self.scores.len();
        let alpha = options.alpha;
        let threshold = options.activity_threshold();
        let budget = options
            .push_budget
            .unwrap_or_else(|| options.max_iterations.saturating_mul(n));
        let target = MaxDelta::try_from(options.tolerance)?;
        log::info!("Activity threshold: {threshold}");
        log::info!("Stopping criterion: {target} or {budget} releases");

        let mut heap = QuaternaryHeap::with_capacity(self.frontier.len());
        for &node in &self.frontier {
            enqueue(&mut heap, node, self.deltas[node], threshold);
        }
        self.frontier.clear();

        let mut pool = KahanSum::<f64>::new();
        let mut releases = 0;
        let mut stale = 0;
        let mut residual = self.max_delta();
        let mut converged = target.eval(&PredParams {
            iteration: 0,
            residual,
        });

        pl.item_name("release");
        pl.expected_updates(Some(budget));
        pl.start(format!("Releasing deltas by priority (alpha={alpha})..."));

        while !converged && releases < budget {
            let Some(Pending { node, .. }) = heap.pop() else {
                // The heap is empty: restart from the pooled dangling mass, if any
                let amount = std::mem::replace(&mut pool, KahanSum::new()).sum();
                self.spread(amount, alpha, preference, &mut |j, d| {
                    enqueue(&mut heap, j, d, threshold)
                });
                if heap.is_empty() {
                    break;
                }
                continue;
            };
            let delta = self.deltas[node];
            if !is_active(delta, threshold) {
                stale += 1;
                continue;
            }
            self.deltas[node] = 0.0;
            self.scores[node] += delta;
            pool += self.propagate(node, delta, alpha, &mut |j, d| {
                enqueue(&mut heap, j, d, threshold)
            });
            releases += 1;
            pl.light_update();

            if releases % CHECKPOINT == 0 {
                let amount = std::mem::replace(&mut pool, KahanSum::new()).sum();
                self.spread(amount, alpha, preference, &mut |j, d| {
                    enqueue(&mut heap, j, d, threshold)
                });
                residual = self.max_delta();
                converged = target.eval(&PredParams {
                    iteration: releases.div_ceil(n),
                    residual,
                });
                log::debug!(
                    "{releases} releases: {} pending entries, max delta = {residual}",
                    heap.len()
                );
            }
        }
        pl.done_with_count(releases);

        let amount = pool.sum();
        self.spread(amount, alpha, preference, &mut |_, _| {});
        residual = self.max_delta();
        converged = converged || target.eval(&PredParams {
            iteration: releases.div_ceil(n),
            residual,
        });

        // Flush
        for (score, delta) in self.scores.iter_mut().zip(self.deltas.iter_mut()) {
            *score += std::mem::take(delta);
        }

        let iterations = releases.div_ceil(n);
        log::info!(
            "{} after {releases} releases ({stale} stale entries) with max delta {residual}",
            if converged { "Converged" } else { "Stopped" }
        );
        Ok(Outcome {
            iterations,
            releases,
            residual,
            converged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankgraph::graphs::map_graph::MapGraph;

    #[test]
    fn test_pending_order() {
        let mut heap = QuaternaryHeap::new();
        for (priority, node) in [(0.5, 3), (2.0, 1), (0.5, 0), (1.0, 2)] {
            heap.push(Pending { priority, node });
        }
        let order = std::iter::from_fn(|| heap.pop().map(|p| p.node)).collect::<Vec<_>>();
        assert_eq!(order, vec![1, 2, 0, 3]);
    }

    #[test]
    fn test_flush() -> Result<()> {
        let g = MapGraph::from_arcs([(0, 1), (1, 2), (2, 0), (0, 3)]);
        let mut pr = DeltaPageRank::new(&g)?;
        let ranking = pr.compute_with_priority(&g, &Options::default().push_budget(2))?;
        assert_eq!(ranking.releases, 2);
        assert_eq!(ranking.iterations, 1);
        assert!(pr.deltas().iter().all(|&d| d == 0.0));
        assert!((ranking.total() - 1.0).abs() < 1E-12);
        Ok(())
    }

    #[test]
    fn test_alpha_one() -> Result<()> {
        // No decay: the release cap stops the computation
        let g = MapGraph::from_arcs([(0, 1), (1, 0), (1, 2)]);
        let mut pr = DeltaPageRank::new(&g)?;
        let ranking =
            pr.compute_with_priority(&g, &Options::default().alpha(1.0).max_iterations(10))?;
        assert_eq!(ranking.releases, 30);
        assert!(!ranking.converged);
        assert!((ranking.total() - 1.0).abs() < 1E-12);
        Ok(())
    }
}
