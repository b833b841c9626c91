/*
 * SPDX-FileCopyrightText: 2025 The RankGraph Authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Snapshots of the transition matrix of a graph.

use super::EdgeWeight;
use kahan::KahanSum;
use rankgraph::traits::Graph;

/// A sparse matrix in compressed-row format: the entries of row *i* are
/// `targets[offsets[i]..offsets[i + 1]]` and the corresponding `values`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Csr {
    offsets: Vec<usize>,
    targets: Vec<usize>,
    values: Vec<f64>,
}

impl Csr {
    pub(crate) fn num_rows(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Returns the column indices and the values of a row.
    #[inline(always)]
    pub(crate) fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.offsets[i]..self.offsets[i + 1];
        self.targets[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Returns the transpose of this matrix, with rows sorted by column.
    pub(crate) fn transpose(&self) -> Csr {
        let n = self.num_rows();
        let mut offsets = vec![0; n + 1];
        for &j in &self.targets {
            offsets[j + 1] += 1;
        }
        for i in 0..n {
            offsets[i + 1] += offsets[i];
        }
        let mut cursor = offsets[..n].to_vec();
        let mut targets = vec![0; self.targets.len()];
        let mut values = vec![0.0; self.values.len()];
        for i in 0..n {
            for (j, x) in self.row(i) {
                targets[cursor[j]] = i;
                values[cursor[j]] = x;
                cursor[j] += 1;
            }
        }
        Csr {
            offsets,
            targets,
            values,
        }
    }
}

/// The row-normalized weighted adjacency matrix of a graph, together with
/// the out-weights it was computed from and the list of dangling nodes.
///
/// Nodes whose outgoing weights sum to zero (or less) are dangling and have
/// an empty row.
#[derive(Debug, Clone, Default)]
pub(crate) struct Transition {
    succ: Csr,
    out_weights: Vec<f64>,
    dangling: Vec<usize>,
    is_dangling: Vec<bool>,
}

impl Transition {
    /// Computes the transition matrix of a graph for the given arc weights.
    pub(crate) fn new<G: Graph>(graph: &G, weights: &EdgeWeight<G::Node>) -> Self {
        let n = graph.num_nodes();
        let mut offsets = Vec::with_capacity(n + 1);
        let mut targets = Vec::with_capacity(graph.num_arcs());
        let mut values = Vec::with_capacity(graph.num_arcs());
        let mut out_weights = Vec::with_capacity(n);
        let mut dangling = vec![];
        let mut is_dangling = vec![false; n];
        let mut row = vec![];

        offsets.push(0);
        for i in 0..n {
            row.clear();
            row.extend(
                graph
                    .successors(i)
                    .map(|j| (j, weights.weight(graph, i, j))),
            );
            let out_weight = row
                .iter()
                .fold(KahanSum::<f64>::new(), |sum, &(_, w)| sum + w)
                .sum();
            out_weights.push(out_weight);
            if out_weight > 0.0 {
                for &(j, w) in &row {
                    targets.push(j);
                    values.push(w / out_weight);
                }
            } else {
                dangling.push(i);
                is_dangling[i] = true;
            }
            offsets.push(targets.len());
        }

        Self {
            succ: Csr {
                offsets,
                targets,
                values,
            },
            out_weights,
            dangling,
            is_dangling,
        }
    }

    /// Returns the successors of a node with their transition probability.
    #[inline(always)]
    pub(crate) fn successors(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.succ.row(i)
    }

    /// Returns, for each node, its predecessors with the probability of the
    /// transition towards the node.
    pub(crate) fn predecessors(&self) -> Csr {
        self.succ.transpose()
    }

    pub(crate) fn out_weights(&self) -> &[f64] {
        &self.out_weights
    }

    pub(crate) fn dangling(&self) -> &[usize] {
        &self.dangling
    }

    #[inline(always)]
    pub(crate) fn is_dangling(&self, i: usize) -> bool {
        self.is_dangling[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankgraph::graphs::map_graph::MapGraph;

    #[test]
    fn test_normalization() {
        let g = MapGraph::from_weighted_arcs([(0, 1, 1.0), (0, 2, 3.0), (1, 2, 0.0), (2, 0, 2.0)]);
        let t = Transition::new(&g, &EdgeWeight::Attribute);
        assert_eq!(t.out_weights(), &[4.0, 0.0, 2.0]);
        assert_eq!(t.dangling(), &[1]);
        assert_eq!(t.successors(0).collect::<Vec<_>>(), vec![(1, 0.25), (2, 0.75)]);
        assert_eq!(t.successors(1).count(), 0);

        let t = Transition::new(&g, &EdgeWeight::Unit);
        assert_eq!(t.out_weights(), &[2.0, 1.0, 1.0]);
        assert!(t.dangling().is_empty());
    }

    #[test]
    fn test_predecessors() {
        let mut g = MapGraph::from_arcs([(0, 1), (0, 2), (1, 2), (2, 2)]);
        g.add_node(3);
        let t = Transition::new(&g, &EdgeWeight::custom(|_: &i32, &v: &i32| if v == 2 { 2.0 } else { 1.0 }));
        let pred = t.predecessors();
        assert_eq!(pred.num_rows(), 4);
        assert_eq!(pred.row(0).count(), 0);
        assert_eq!(pred.row(2).collect::<Vec<_>>(), vec![(0, 2.0 / 3.0), (1, 1.0), (2, 1.0)]);
        assert!(t.is_dangling(3));
    }
}
