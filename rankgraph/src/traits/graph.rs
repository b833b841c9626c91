/*
 * SPDX-FileCopyrightText: 2025 The RankGraph Authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

The capability a graph must expose to be ranked.

Nodes are identified in two ways: by an opaque _identifier_ of type
[`Graph::Node`], which is what callers see, and by a dense _index_ in the
interval [0 . . *n*), which is what algorithms use to store per-node state in
plain vectors. The graph owns the translation table between the two
([`node`](Graph::node) and [`index_of`](Graph::index_of)); indices must be
stable as long as the graph is not structurally modified.

Adjacency is exposed through indices: [`successors`](Graph::successors) and
[`predecessors`](Graph::predecessors) return iterators on indices, and
[`edge`](Graph::edge) returns the arc between two indices, if any, together
with its optional weight.

*/

use core::fmt::Debug;
use core::hash::Hash;

/// An arc of a [`Graph`].
///
/// The weight is optional: algorithms asking for weights treat a missing
/// weight as 1.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Edge {
    pub weight: Option<f64>,
}

impl Edge {
    /// Creates an arc without weight.
    pub const fn unweighted() -> Self {
        Self { weight: None }
    }

    /// Creates an arc with the given weight.
    pub const fn weighted(weight: f64) -> Self {
        Self {
            weight: Some(weight),
        }
    }

    /// Returns the weight of the arc, or 1 if the arc has no weight.
    #[inline(always)]
    pub fn weight_or_one(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }
}

/// A graph whose nodes carry identifiers of type [`Node`](Graph::Node).
pub trait Graph {
    /// The type of node identifiers.
    type Node: Clone + Eq + Hash + Debug;

    /// The type of the iterator returned by [`successors`](Graph::successors).
    type Successors<'succ>: Iterator<Item = usize>
    where
        Self: 'succ;

    /// The type of the iterator returned by
    /// [`predecessors`](Graph::predecessors).
    type Predecessors<'pred>: Iterator<Item = usize>
    where
        Self: 'pred;

    /// Returns whether arcs have a direction.
    ///
    /// An undirected graph exposes each edge as two opposite arcs.
    fn is_directed(&self) -> bool;

    /// Returns the number of nodes.
    fn num_nodes(&self) -> usize;

    /// Returns the number of arcs.
    fn num_arcs(&self) -> usize;

    /// Returns the identifier of the node with the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not smaller than [`num_nodes`](Graph::num_nodes).
    fn node(&self, index: usize) -> &Self::Node;

    /// Returns the index of the node with the given identifier, if it exists.
    fn index_of(&self, node: &Self::Node) -> Option<usize>;

    /// Returns the indices of the successors of a node.
    fn successors(&self, index: usize) -> Self::Successors<'_>;

    /// Returns the indices of the predecessors of a node.
    fn predecessors(&self, index: usize) -> Self::Predecessors<'_>;

    /// Returns the arc from `src` to `dst`, if it exists.
    fn edge(&self, src: usize, dst: usize) -> Option<Edge>;

    /// Returns the identifiers of all nodes, in index order.
    ///
    /// The iterator can be restarted by calling this method again.
    fn nodes(&self) -> impl Iterator<Item = &Self::Node> {
        (0..self.num_nodes()).map(|index| self.node(index))
    }

    /// Returns the number of successors of a node.
    ///
    /// Note that the default implementation enumerates the successors.
    fn outdegree(&self, index: usize) -> usize {
        self.successors(index).count()
    }

    /// Returns whether there is an arc from `src` to `dst`.
    fn has_arc(&self, src: usize, dst: usize) -> bool {
        self.edge(src, dst).is_some()
    }
}
