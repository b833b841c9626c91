/*
 * SPDX-FileCopyrightText: 2025 The RankGraph Authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use kahan::KahanSum;
use rankgraph::traits::Graph;
use std::collections::HashMap;
use std::hash::Hash;

/// A mapping from node identifiers to ranks.
pub type RankMap<N> = HashMap<N, f64>;

/// The outcome of a PageRank computation.
#[derive(Debug, Clone)]
pub struct Ranking<N> {
    /// The rank of each node; the ranks sum to one, unless the graph is
    /// empty.
    pub ranks: RankMap<N>,
    /// The number of sweeps performed.
    ///
    /// For the priority scheduler, the number of releases divided by the
    /// number of nodes, rounded up.
    pub iterations: usize,
    /// Whether the stopping tolerance was met.
    pub converged: bool,
    /// The final value of the convergence measure.
    pub residual: f64,
    /// The number of node releases; for the standard engine, the number of
    /// node updates.
    pub releases: usize,
    order: Vec<N>,
}

impl<N: Clone + Eq + Hash> Ranking<N> {
    /// The ranking of the empty graph.
    pub fn empty() -> Self {
        Self {
            ranks: HashMap::new(),
            iterations: 0,
            converged: true,
            residual: 0.0,
            releases: 0,
            order: vec![],
        }
    }

    /// Builds a ranking by normalizing nonnegative scores indexed like the
    /// graph.
    ///
    /// If the scores do not have a positive finite sum the ranking is
    /// uniform.
    pub(crate) fn from_scores<G: Graph<Node = N>>(graph: &G, scores: &[f64]) -> Self {
        debug_assert_eq!(scores.len(), graph.num_nodes());
        let n = scores.len();
        let sum = scores
            .iter()
            .fold(KahanSum::<f64>::new(), |sum, &x| sum + x)
            .sum();
        let normalize = |x: f64| {
            if sum > 0.0 && sum.is_finite() {
                x / sum
            } else {
                1.0 / n as f64
            }
        };
        if !(sum > 0.0 && sum.is_finite()) && n > 0 {
            log::warn!("Scores sum to {sum}: returning the uniform distribution");
        }
        let order = graph.nodes().cloned().collect::<Vec<_>>();
        let ranks = order
            .iter()
            .cloned()
            .zip(scores.iter().map(|&x| normalize(x)))
            .collect();
        Self {
            ranks,
            iterations: 0,
            converged: false,
            residual: f64::INFINITY,
            releases: 0,
            order,
        }
    }

    /// Returns the rank of a node, or zero if the node is unknown.
    pub fn rank(&self, node: &N) -> f64 {
        self.ranks.get(node).copied().unwrap_or(0.0)
    }

    /// Returns the `k` nodes with the highest rank, in decreasing order of
    /// rank.
    ///
    /// Ties are broken by the order of the nodes in the graph.
    pub fn top(&self, k: usize) -> Vec<(N, f64)> {
        let mut all = self
            .order
            .iter()
            .map(|node| (node.clone(), self.rank(node)))
            .collect::<Vec<_>>();
        all.sort_by(|(_, x), (_, y)| y.total_cmp(x));
        all.truncate(k);
        all
    }

    /// Returns the sum of the ranks.
    pub fn total(&self) -> f64 {
        self.order
            .iter()
            .fold(KahanSum::<f64>::new(), |sum, node| sum + self.rank(node))
            .sum()
    }

    /// Returns the number of ranked nodes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns the ranked nodes in graph order.
    pub fn nodes(&self) -> &[N] {
        &self.order
    }
}
