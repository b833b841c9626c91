/*
 * SPDX-FileCopyrightText: 2025 The RankGraph Authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::graphs::map_graph::MapGraph;
use crate::traits::Graph;

/// Erdös-Rényi random digraphs.
///
/// The Erdös-Rényi random graph model is a simple model for generating random
/// graphs. It is parameterized by the number of nodes `n` and the probability
/// `p` of an arc between any two nodes. In this implementation, loops are never
/// included.
///
/// The arcs are a pure function of the seed of the [pseudorandom number
/// generator](SmallRng), so the same parameters always yield the same graph.
/// Enumerating the arcs takes time quadratic in `n`.
#[derive(Debug, Clone)]
pub struct ErdosRenyi {
    n: usize,
    p: f64,
    seed: u64,
}

impl ErdosRenyi {
    /// Creates a new Erdös-Rényi random graph, given the number of
    /// nodes, the probability of an arc between any two nodes, and a
    /// seed for the [pseudorandom number generator](SmallRng).
    pub fn new(n: usize, p: f64, seed: u64) -> Self {
        assert!((0.0..=1.0).contains(&p), "p must be in [0..1]");
        Self { n, p, seed }
    }

    /// Returns the number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.n
    }

    /// Returns an iterator on the arcs, in lexicographical order.
    pub fn arcs(&self) -> impl Iterator<Item = (usize, usize)> + use<> {
        let (n, p) = (self.n, self.p);
        let mut rng = SmallRng::seed_from_u64(self.seed);
        (0..n)
            .flat_map(move |x| (0..n).map(move |y| (x, y)))
            .filter(move |&(x, y)| x != y && rng.random_bool(p))
    }

    /// Materializes the graph as a directed [`MapGraph`] whose identifiers
    /// are the nodes 0, 1, …, `n` − 1, isolated nodes included.
    pub fn to_map_graph(&self) -> MapGraph<usize> {
        let mut g = MapGraph::directed();
        g.add_nodes(0..self.n);
        g.add_arcs(self.arcs());
        log::debug!(
            "Generated G({}, {}) with {} arcs (seed {})",
            self.n,
            self.p,
            g.num_arcs(),
            self.seed
        );
        g
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_er() {
        let er = ErdosRenyi::new(10, 0.3, 0);
        let a = er.arcs().collect::<Vec<_>>();
        let b = er.arcs().collect::<Vec<_>>();
        assert_eq!(a, b);
        assert!(a.iter().all(|&(x, y)| x != y && x < 10 && y < 10));
        assert!(a.is_sorted());

        let g = er.to_map_graph();
        assert_eq!(g.num_nodes(), 10);
        assert_eq!(g.num_arcs(), a.len());
        for (x, y) in a {
            assert!(g.has_arc(x, y));
        }
    }

    #[test]
    fn test_extremes() {
        assert_eq!(ErdosRenyi::new(5, 0.0, 1).arcs().count(), 0);
        assert_eq!(ErdosRenyi::new(5, 1.0, 1).arcs().count(), 20);
        assert_eq!(ErdosRenyi::new(0, 0.5, 1).to_map_graph().num_nodes(), 0);
    }
}
