/*
 * SPDX-FileCopyrightText: 2025 The RankGraph Authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::traits::{Edge, Graph};

use std::collections::{BTreeMap, BTreeSet, HashMap, btree_map, btree_set};
use std::hash::Hash;
use std::iter::Copied;

/// A mutable [`Graph`] implementation over arbitrary node identifiers, based
/// on a vector of [`BTreeMap`] (successors, with the arc data) and a vector of
/// [`BTreeSet`] (predecessors).
///
/// Identifiers are assigned dense indices in order of appearance. Nodes are
/// never removed, so indices are stable; arcs can be added and removed in any
/// order.
///
/// In the undirected case each edge is stored as two opposite arcs (a loop is
/// stored once), and [`num_arcs`](Graph::num_arcs) counts stored arcs.
///
/// By setting the feature `serde`, this struct can be serialized and
/// deserialized using [serde](https://crates.io/crates/serde).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct MapGraph<N: Clone + Eq + Hash> {
    directed: bool,
    /// The number of arcs in the graph.
    number_of_arcs: usize,
    /// Node identifiers, in index order.
    ids: Vec<N>,
    /// Inverse of `ids`.
    index: HashMap<N, usize>,
    /// For each node, its successors and the data of the arc.
    succ: Vec<BTreeMap<usize, Edge>>,
    /// For each node, its predecessors.
    pred: Vec<BTreeSet<usize>>,
}

impl<N: Clone + Eq + Hash> PartialEq for MapGraph<N> {
    fn eq(&self, other: &Self) -> bool {
        self.directed == other.directed
            && self.number_of_arcs == other.number_of_arcs
            && self.ids == other.ids
            && self.succ == other.succ
    }
}

impl<N: Clone + Eq + Hash> MapGraph<N> {
    fn with_direction(directed: bool) -> Self {
        Self {
            directed,
            number_of_arcs: 0,
            ids: vec![],
            index: HashMap::new(),
            succ: vec![],
            pred: vec![],
        }
    }

    /// Creates a new empty directed graph.
    pub fn directed() -> Self {
        Self::with_direction(true)
    }

    /// Creates a new empty undirected graph.
    pub fn undirected() -> Self {
        Self::with_direction(false)
    }

    /// Creates a new directed graph from an [`IntoIterator`] of pairs of
    /// identifiers, adding nodes as needed.
    pub fn from_arcs(arcs: impl IntoIterator<Item = (N, N)>) -> Self {
        let mut g = Self::directed();
        g.add_arcs(arcs);
        g
    }

    /// Creates a new directed graph from an [`IntoIterator`] of triples
    /// `(src, dst, weight)`, adding nodes as needed.
    pub fn from_weighted_arcs(arcs: impl IntoIterator<Item = (N, N, f64)>) -> Self {
        let mut g = Self::directed();
        for (u, v, w) in arcs {
            g.add_weighted_arc(u, v, w);
        }
        g
    }

    /// Adds a node, if not already present, and returns its index.
    pub fn add_node(&mut self, node: N) -> usize {
        if let Some(&index) = self.index.get(&node) {
            return index;
        }
        let index = self.ids.len();
        self.index.insert(node.clone(), index);
        self.ids.push(node);
        self.succ.push(BTreeMap::new());
        self.pred.push(BTreeSet::new());
        index
    }

    /// Adds the nodes of an [`IntoIterator`] that are not already present.
    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = N>) {
        for node in nodes {
            self.add_node(node);
        }
    }

    fn insert(&mut self, u: usize, v: usize, edge: Edge, overwrite: bool) -> bool {
        let mut new = false;
        for (s, d) in Self::arc_and_reverse(self.directed, u, v) {
            match self.succ[s].entry(d) {
                btree_map::Entry::Vacant(entry) => {
                    entry.insert(edge);
                    self.pred[d].insert(s);
                    self.number_of_arcs += 1;
                    new = true;
                }
                btree_map::Entry::Occupied(mut entry) => {
                    if overwrite {
                        entry.insert(edge);
                    }
                }
            }
        }
        new
    }

    /// Returns the stored arcs corresponding to the arc from `u` to `v`: just
    /// the arc itself in the directed case, and the arc and its reverse in the
    /// undirected case (unless it is a loop).
    fn arc_and_reverse(directed: bool, u: usize, v: usize) -> impl Iterator<Item = (usize, usize)> {
        let reverse = (!directed && u != v).then_some((v, u));
        std::iter::once((u, v)).chain(reverse)
    }

    /// Adds an unweighted arc, adding its endpoints as needed, and returns
    /// whether it is a new one.
    ///
    /// If the arc exists already it is left unchanged.
    pub fn add_arc(&mut self, u: N, v: N) -> bool {
        let u = self.add_node(u);
        let v = self.add_node(v);
        self.insert(u, v, Edge::unweighted(), false)
    }

    /// Adds a weighted arc, adding its endpoints as needed, and returns
    /// whether it is a new one.
    ///
    /// If the arc exists already its weight is replaced.
    pub fn add_weighted_arc(&mut self, u: N, v: N, weight: f64) -> bool {
        let u = self.add_node(u);
        let v = self.add_node(v);
        self.insert(u, v, Edge::weighted(weight), true)
    }

    /// Adds unweighted arcs from an [`IntoIterator`], adding nodes as needed.
    pub fn add_arcs(&mut self, arcs: impl IntoIterator<Item = (N, N)>) {
        for (u, v) in arcs {
            self.add_arc(u, v);
        }
    }

    /// Removes an arc and returns whether it was present.
    ///
    /// The endpoints stay in the graph, even if they become isolated.
    pub fn remove_arc(&mut self, u: &N, v: &N) -> bool {
        let (Some(&u), Some(&v)) = (self.index.get(u), self.index.get(v)) else {
            return false;
        };
        let mut removed = false;
        for (s, d) in Self::arc_and_reverse(self.directed, u, v) {
            if self.succ[s].remove(&d).is_some() {
                self.pred[d].remove(&s);
                self.number_of_arcs -= 1;
                removed = true;
            }
        }
        removed
    }

    /// Sets the weight of an existing arc and returns whether the arc exists.
    pub fn set_weight(&mut self, u: &N, v: &N, weight: Option<f64>) -> bool {
        let (Some(&u), Some(&v)) = (self.index.get(u), self.index.get(v)) else {
            return false;
        };
        let mut found = false;
        for (s, d) in Self::arc_and_reverse(self.directed, u, v) {
            if let Some(edge) = self.succ[s].get_mut(&d) {
                edge.weight = weight;
                found = true;
            }
        }
        found
    }

    /// Returns the arcs of the graph as triples of identifiers and arc data,
    /// in index order.
    pub fn arcs(&self) -> impl Iterator<Item = (&N, &N, Edge)> {
        self.succ.iter().enumerate().flat_map(move |(u, succ)| {
            succ.iter()
                .map(move |(&v, &edge)| (&self.ids[u], &self.ids[v], edge))
        })
    }

    /// Shrink the capacity of the graph to fit its current size.
    ///
    /// # Implementation Notes
    ///
    /// This method just shrinks the capacity of the node vectors, as the
    /// B-tree collections do not have a `shrink_to_fit` method.
    pub fn shrink_to_fit(&mut self) {
        self.ids.shrink_to_fit();
        self.index.shrink_to_fit();
        self.succ.shrink_to_fit();
        self.pred.shrink_to_fit();
    }
}

impl<N: Clone + Eq + Hash + core::fmt::Debug> Graph for MapGraph<N> {
    type Node = N;
    type Successors<'succ>
        = Copied<btree_map::Keys<'succ, usize, Edge>>
    where
        N: 'succ;
    type Predecessors<'pred>
        = Copied<btree_set::Iter<'pred, usize>>
    where
        N: 'pred;

    #[inline(always)]
    fn is_directed(&self) -> bool {
        self.directed
    }

    #[inline(always)]
    fn num_nodes(&self) -> usize {
        self.ids.len()
    }

    #[inline(always)]
    fn num_arcs(&self) -> usize {
        self.number_of_arcs
    }

    #[inline(always)]
    fn node(&self, index: usize) -> &N {
        &self.ids[index]
    }

    #[inline(always)]
    fn index_of(&self, node: &N) -> Option<usize> {
        self.index.get(node).copied()
    }

    #[inline(always)]
    fn successors(&self, index: usize) -> Self::Successors<'_> {
        self.succ[index].keys().copied()
    }

    #[inline(always)]
    fn predecessors(&self, index: usize) -> Self::Predecessors<'_> {
        self.pred[index].iter().copied()
    }

    #[inline(always)]
    fn edge(&self, src: usize, dst: usize) -> Option<Edge> {
        self.succ.get(src)?.get(&dst).copied()
    }

    #[inline(always)]
    fn nodes(&self) -> impl Iterator<Item = &N> {
        self.ids.iter()
    }

    #[inline(always)]
    fn outdegree(&self, index: usize) -> usize {
        self.succ[index].len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directed() {
        let mut g = MapGraph::directed();
        assert!(g.add_arc('a', 'b'));
        assert!(!g.add_arc('a', 'b'));
        assert!(g.add_weighted_arc('b', 'c', 2.0));
        assert!(!g.add_weighted_arc('b', 'c', 3.0));
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.num_arcs(), 2);
        assert_eq!(g.edge(1, 2), Some(Edge::weighted(3.0)));
        assert_eq!(g.edge(2, 1), None);
        assert_eq!(g.predecessors(2).collect::<Vec<_>>(), vec![1]);

        assert!(g.remove_arc(&'a', &'b'));
        assert!(!g.remove_arc(&'a', &'b'));
        assert!(!g.remove_arc(&'a', &'z'));
        assert_eq!(g.num_arcs(), 1);
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.outdegree(0), 0);
        assert_eq!(g.predecessors(1).count(), 0);
    }

    #[test]
    fn test_undirected() {
        let mut g = MapGraph::undirected();
        assert!(g.add_arc(0, 1));
        assert!(!g.add_arc(1, 0));
        assert!(g.add_arc(2, 2));
        assert!(!g.is_directed());
        assert_eq!(g.num_arcs(), 3);
        assert!(g.has_arc(1, 0));
        assert!(g.set_weight(&1, &0, Some(0.5)));
        assert_eq!(g.edge(0, 1).and_then(|e| e.weight), Some(0.5));
        assert!(g.remove_arc(&0, &1));
        assert_eq!(g.num_arcs(), 1);
    }

    #[test]
    fn test_arcs() {
        let g = MapGraph::from_weighted_arcs([("x", "y", 1.5), ("y", "x", 0.5)]);
        let arcs = g.arcs().map(|(u, v, e)| (*u, *v, e.weight)).collect::<Vec<_>>();
        assert_eq!(arcs, vec![("x", "y", Some(1.5)), ("y", "x", Some(0.5))]);
        assert_eq!(g.nodes().copied().collect::<Vec<_>>(), vec!["x", "y"]);
    }
}
