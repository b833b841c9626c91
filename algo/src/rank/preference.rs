/*
 * SPDX-FileCopyrightText: 2025 The RankGraph Authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{Error, Mode, Options, Result};
use kahan::KahanSum;
use rankgraph::traits::Graph;

/// The normalized preference vector **v** and the dangling-node
/// distribution **u** of a computation, indexed like the graph.
#[derive(Debug, Clone)]
pub(crate) struct Preference {
    /// `None` means uniform.
    values: Option<Box<[f64]>>,
    inv_n: f64,
    mode: Mode,
}

impl Preference {
    /// Resolves the preference map of the options against a nonempty graph.
    ///
    /// Entries naming unknown nodes are ignored with a warning.
    pub(crate) fn new<G: Graph>(graph: &G, options: &Options<G::Node>) -> Result<Self> {
        let n = graph.num_nodes();
        let values = match &options.preference {
            None => None,
            Some(map) => {
                let mut values = vec![0.0; n].into_boxed_slice();
                let mut unknown = 0;
                for (node, &x) in map {
                    match graph.index_of(node) {
                        Some(i) => values[i] = x,
                        None => unknown += 1,
                    }
                }
                if unknown > 0 {
                    log::warn!("Ignoring {unknown} preference entries for nodes not in the graph");
                }
                let sum = values
                    .iter()
                    .fold(KahanSum::<f64>::new(), |sum, &x| sum + x)
                    .sum();
                if !(sum > 0.0 && sum.is_finite()) {
                    return Err(Error::InvalidParameter(format!(
                        "The preference vector must have positive sum on the nodes of the graph, got {sum}"
                    )));
                }
                values.iter_mut().for_each(|x| *x /= sum);
                Some(values)
            }
        };
        Ok(Self {
            values,
            inv_n: 1.0 / n as f64,
            mode: options.mode,
        })
    }

    pub(crate) fn is_uniform(&self) -> bool {
        self.values.is_none()
    }

    /// Returns *vᵢ*.
    #[inline(always)]
    pub(crate) fn value(&self, i: usize) -> f64 {
        match &self.values {
            Some(v) => v[i],
            None => self.inv_n,
        }
    }

    /// Returns *uᵢ*.
    #[inline(always)]
    pub(crate) fn dangling(&self, i: usize) -> f64 {
        match self.mode {
            Mode::StronglyPreferential => self.value(i),
            Mode::WeaklyPreferential => self.inv_n,
            Mode::PseudoRank => 0.0,
        }
    }

    /// Returns whether the rank of dangling nodes is redistributed at all.
    pub(crate) fn spreads_dangling(&self) -> bool {
        self.mode != Mode::PseudoRank
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankgraph::graphs::map_graph::MapGraph;

    #[test]
    fn test_normalization() -> Result<()> {
        let g = MapGraph::from_arcs([("a", "b"), ("b", "c")]);
        let options = Options::default().preference([("a", 3.0), ("c", 1.0), ("z", 100.0)]);
        let p = Preference::new(&g, &options)?;
        assert!(!p.is_uniform());
        assert_eq!(p.value(0), 0.75);
        assert_eq!(p.value(1), 0.0);
        assert_eq!(p.dangling(2), 0.25);

        let p = Preference::new(&g, &options.clone().mode(Mode::WeaklyPreferential))?;
        assert_eq!(p.dangling(1), 1.0 / 3.0);
        let p = Preference::new(&g, &options.mode(Mode::PseudoRank))?;
        assert!(!p.spreads_dangling());
        assert_eq!(p.dangling(0), 0.0);
        Ok(())
    }

    #[test]
    fn test_zero_sum() {
        let g = MapGraph::from_arcs([("a", "b")]);
        for pref in [vec![("a", 0.0)], vec![("z", 1.0)], vec![]] {
            assert!(matches!(
                Preference::new(&g, &Options::default().preference(pref)),
                Err(Error::InvalidParameter(_))
            ));
        }
    }
}
