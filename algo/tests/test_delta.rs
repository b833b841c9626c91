/*
 * SPDX-FileCopyrightText: 2025 The RankGraph Authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rankgraph::graphs::map_graph::MapGraph;
use rankgraph::graphs::random::ErdosRenyi;
use rankgraph::traits::Graph;
use rankgraph_algo::rank::pagerank::pagerank;
use rankgraph_algo::rank::{DeltaPageRank, EdgeWeight, Error, Mode, Options, Ranking};
use std::hash::Hash;

/// Returns the 𝓁-∞ distance between two rankings of the same nodes.
fn l_inf_distance<N: Clone + Eq + Hash>(a: &Ranking<N>, b: &Ranking<N>) -> f64 {
    assert_eq!(a.len(), b.len());
    a.nodes()
        .iter()
        .map(|node| (a.rank(node) - b.rank(node)).abs())
        .fold(0.0, f64::max)
}

fn delta<G: Graph>(graph: &G, options: &Options<G::Node>) -> Result<Ranking<G::Node>> {
    Ok(DeltaPageRank::new(graph)?.compute(graph, options)?)
}

fn equivalence_graph() -> MapGraph<&'static str> {
    MapGraph::from_arcs([
        ("A", "B"),
        ("A", "C"),
        ("B", "C"),
        ("C", "A"),
        ("C", "D"),
        ("D", "C"),
    ])
}

#[test]
fn test_conservation() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let g = ErdosRenyi::new(50, 0.05, 0).to_map_graph();
    for alpha in [0.0, 0.15, 0.5, 0.85, 0.99, 1.0] {
        let ranking = delta(&g, &Options::default().alpha(alpha))?;
        assert!((ranking.total() - 1.0).abs() < 1E-5, "alpha={alpha}");
        assert!(ranking.ranks.values().all(|x| x.is_finite() && *x >= 0.0));
    }
    Ok(())
}

#[test]
fn test_cycle_symmetry() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let g = MapGraph::from_arcs([("A", "B"), ("B", "C"), ("C", "A")]);
    let ranking = delta(&g, &Options::default())?;
    for node in ["A", "B", "C"] {
        assert!((ranking.rank(&node) - 1.0 / 3.0).abs() < 1E-6);
    }
    Ok(())
}

#[test]
fn test_dangling() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let g = MapGraph::from_arcs([("A", "B"), ("B", "C"), ("B", "D"), ("C", "A")]);
    let mut pr = DeltaPageRank::new(&g)?;
    assert_eq!(pr.dangling_nodes(), &[3]);
    for mode in [
        Mode::StronglyPreferential,
        Mode::WeaklyPreferential,
        Mode::PseudoRank,
    ] {
        let ranking = pr.compute(&g, &Options::default().mode(mode))?;
        let d = ranking.rank(&"D");
        assert!(d.is_finite() && d > 0.0, "mode={mode}: {d}");
    }
    // A graph made only of dangling nodes
    let mut g = MapGraph::<u8>::directed();
    g.add_nodes(0..4);
    let ranking = delta(&g, &Options::default())?;
    assert!((ranking.rank(&2) - 0.25).abs() < 1E-12);
    Ok(())
}

#[test]
fn test_equivalence_with_standard() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let g = equivalence_graph();
    let options = Options::default();
    let expected = pagerank(&g, &options)?;
    let ranking = delta(&g, &options)?;
    for node in ["A", "B", "C", "D"] {
        assert!(
            (expected.rank(&node) - ranking.rank(&node)).abs() < 5E-5,
            "{node}: {} != {}",
            expected.rank(&node),
            ranking.rank(&node)
        );
    }
    // C collects from A, B and D
    assert_eq!(ranking.top(1)[0].0, "C");
    Ok(())
}

#[test]
fn test_incremental_consistency() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut rng = SmallRng::seed_from_u64(0);
    let mut g = MapGraph::directed();
    g.add_nodes(0..100);
    for _ in 0..300 {
        let (u, v) = (rng.random_range(0..100), rng.random_range(0..100));
        if u != v {
            g.add_arc(u, v);
        }
    }
    let options = Options::default().tolerance(1E-10).max_iterations(1000);
    let mut pr = DeltaPageRank::new(&g)?;
    pr.compute(&g, &options)?;

    g.add_arc(10, 90);
    g.add_arc(20, 80);
    let updated = pr.update(&g, [10, 90, 20, 80], &options)?;
    assert!(updated.converged);
    let fresh = delta(&g, &options)?;
    assert!(l_inf_distance(&updated, &fresh) < 1E-6);
    for node in 0..100 {
        assert!((updated.rank(&node) - fresh.rank(&node)).abs() < 1E-5);
    }
    assert!(l_inf_distance(&updated, &pagerank(&g, &options)?) < 1E-6);
    Ok(())
}

#[test]
fn test_incremental_consistency_default_options() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let options = Options::default();
    for seed in 0..20 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut g = MapGraph::directed();
        g.add_nodes(0..100);
        for _ in 0..300 {
            let (u, v) = (rng.random_range(0..100), rng.random_range(0..100));
            if u != v {
                g.add_arc(u, v);
            }
        }
        let mut pr = DeltaPageRank::new(&g)?;
        assert!(pr.compute(&g, &options)?.converged);

        g.add_arc(10, 90);
        g.add_arc(20, 80);
        let updated = pr.update(&g, [10, 90, 20, 80], &options)?;
        assert!(updated.converged);
        assert!((updated.total() - 1.0).abs() < 1E-9);
        assert!(l_inf_distance(&updated, &delta(&g, &options)?) < 1E-6);
    }
    Ok(())
}

#[test]
fn test_update_after_removals() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut g = ErdosRenyi::new(200, 0.02, 7).to_map_graph();
    let options = Options::default().tolerance(1E-12).max_iterations(10_000);
    let mut pr = DeltaPageRank::new(&g)?;
    let before = pr.compute(&g, &options)?;

    let removed = g.arcs().take(5).map(|(&u, &v, _)| (u, v)).collect::<Vec<_>>();
    let mut modified = vec![];
    for (u, v) in removed {
        assert!(g.remove_arc(&u, &v));
        modified.extend([u, v]);
    }
    // Make node 0 dangling
    for v in g.successors(0).collect::<Vec<_>>() {
        g.remove_arc(&0, &v);
        modified.extend([0, v]);
    }
    assert_eq!(g.outdegree(0), 0);

    let after = pr.update(&g, &modified, &options)?;
    assert!(after.converged);
    assert!(pr.dangling_nodes().contains(&0));
    assert!(l_inf_distance(&after, &pagerank(&g, &options)?) < 1E-8);
    assert!(l_inf_distance(&after, &before) > 1E-6);
    Ok(())
}

#[test]
fn test_update_adds_nodes() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut g = MapGraph::from_arcs([(0, 1), (1, 2), (2, 0)]);
    let options = Options::default().tolerance(1E-12).max_iterations(1000);
    let mut pr = DeltaPageRank::new(&g)?;
    pr.compute(&g, &options)?;

    g.add_arc(2, 3);
    g.add_arc(3, 4);
    let ranking = pr.update(&g, [2, 3, 4, 99], &options)?;
    assert_eq!(ranking.len(), 5);
    assert_eq!(pr.nodes(), &[0, 1, 2, 3, 4]);
    assert!(ranking.rank(&4) > 0.0);
    assert!(l_inf_distance(&ranking, &pagerank(&g, &options)?) < 1E-9);
    Ok(())
}

#[test]
fn test_update_changes_options() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let g = ErdosRenyi::new(30, 0.1, 4).to_map_graph();
    let mut pr = DeltaPageRank::new(&g)?;
    pr.compute(&g, &Options::default())?;
    // The deltas are recomputed for the new options, so nothing is lost
    let options = Options::default()
        .alpha(0.5)
        .preference([(0, 1.0), (1, 1.0)])
        .tolerance(1E-12)
        .max_iterations(1000);
    let ranking = pr.update(&g, Vec::<usize>::new(), &options)?;
    assert!(l_inf_distance(&ranking, &pagerank(&g, &options)?) < 1E-9);
    Ok(())
}

#[test]
fn test_personalization_skew() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let g = MapGraph::from_arcs([("A", "B"), ("B", "C"), ("C", "D"), ("D", "A")]);
    let ranking = delta(&g, &Options::default().preference([("A", 1.0)]))?;
    for node in ["B", "C", "D"] {
        assert!(ranking.rank(&"A") > ranking.rank(&node));
    }
    // Unknown nodes are ignored; a preference with no known node is an error
    let ranking = delta(
        &g,
        &Options::default().preference([("A", 1.0), ("Z", 100.0)]),
    )?;
    assert!(ranking.rank(&"A") > ranking.rank(&"B"));
    assert!(matches!(
        delta(&g, &Options::default().preference([("Z", 1.0)]))
            .unwrap_err()
            .downcast_ref::<Error>(),
        Some(Error::InvalidParameter(_))
    ));
    Ok(())
}

#[test]
fn test_single_node() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut g = MapGraph::directed();
    g.add_node("A");
    for alpha in [0.0, 0.85, 1.0] {
        let ranking = delta(&g, &Options::default().alpha(alpha))?;
        assert_eq!(ranking.ranks.len(), 1);
        assert_eq!(ranking.rank(&"A"), 1.0);
    }
    Ok(())
}

#[test]
fn test_empty() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let g = MapGraph::<String>::directed();
    let mut pr = DeltaPageRank::new(&g)?;
    let ranking = pr.compute(&g, &Options::default())?;
    assert!(ranking.ranks.is_empty());
    assert!(ranking.converged);
    assert_eq!(ranking.iterations, 0);
    let ranking = pr.update(&g, ["x".to_string()], &Options::default())?;
    assert!(ranking.ranks.is_empty());
    Ok(())
}

#[test]
fn test_invalid_parameters() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let g = equivalence_graph();
    let mut pr = DeltaPageRank::new(&g)?;
    for alpha in [-0.1, 1.1] {
        assert!(matches!(
            pr.compute(&g, &Options::default().alpha(alpha)),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            pr.update(&g, ["A"], &Options::default().alpha(alpha)),
            Err(Error::InvalidParameter(_))
        ));
    }
    assert!(matches!(
        pr.compute(&g, &Options::default().tolerance(0.0)),
        Err(Error::InvalidParameter(_))
    ));

    let mut u = MapGraph::undirected();
    u.add_arc("A", "B");
    assert_eq!(DeltaPageRank::new(&u).unwrap_err(), Error::UndirectedGraph);
    assert_eq!(
        pr.compute(&u, &Options::default()).unwrap_err(),
        Error::UndirectedGraph
    );
    Ok(())
}

#[test]
fn test_weighted_divergence() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut g = MapGraph::from_arcs([("A", "B"), ("A", "C"), ("B", "A"), ("C", "A")]);
    let unweighted = delta(&g, &Options::default())?;
    assert!((unweighted.rank(&"B") - unweighted.rank(&"C")).abs() < 1E-9);

    g.add_weighted_arc("A", "B", 10.0);
    let options = Options::default().weights(EdgeWeight::Attribute);
    let weighted = delta(&g, &options)?;
    assert!(weighted.rank(&"B") > weighted.rank(&"C"));
    assert!((weighted.rank(&"B") - unweighted.rank(&"B")).abs() > 1E-3);

    // Missing weights count as one
    let mut pr = DeltaPageRank::new(&g)?;
    pr.compute(&g, &options)?;
    assert_eq!(pr.out_weights(), &[11.0, 1.0, 1.0]);

    // Custom weights see node identifiers
    let custom = delta(
        &g,
        &Options::default().weights(EdgeWeight::custom(|_: &&str, v: &&str| {
            if *v == "C" { 10.0 } else { 1.0 }
        })),
    )?;
    assert!(custom.rank(&"C") > custom.rank(&"B"));
    Ok(())
}

#[test]
fn test_non_convergence() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let g = ErdosRenyi::new(100, 0.05, 3).to_map_graph();
    let ranking = delta(&g, &Options::default().tolerance(1E-15).max_iterations(3))?;
    assert!(!ranking.converged);
    assert_eq!(ranking.iterations, 3);
    assert!(ranking.residual >= 1E-15);
    assert!((ranking.total() - 1.0).abs() < 1E-9);
    Ok(())
}

#[test]
fn test_erdos_renyi_vs_standard() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    for (n, p, seed) in [(10, 0.2, 0), (100, 0.03, 1), (1000, 0.003, 2)] {
        let g = ErdosRenyi::new(n, p, seed).to_map_graph();
        for mode in [
            Mode::StronglyPreferential,
            Mode::WeaklyPreferential,
            Mode::PseudoRank,
        ] {
            let options = Options::default()
                .preference((0..n).map(|i| (i, (i % 7) as f64)))
                .mode(mode)
                .tolerance(1E-12)
                .max_iterations(10_000);
            let dist = l_inf_distance(&delta(&g, &options)?, &pagerank(&g, &options)?);
            assert!(dist < 1E-7, "n={n} mode={mode}: L∞={dist}");
        }
    }
    Ok(())
}

/// Repeated small edits on a large graph.
#[cfg_attr(feature = "slow_tests", test)]
#[cfg_attr(not(feature = "slow_tests"), allow(dead_code))]
fn test_many_updates() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut rng = SmallRng::seed_from_u64(42);
    let n = 20_000;
    let mut g = ErdosRenyi::new(n, 5.0 / n as f64, 8).to_map_graph();
    let options = Options::default().tolerance(1E-10).max_iterations(10_000);
    let mut pr = DeltaPageRank::new(&g)?;
    let mut ranking = pr.compute(&g, &options)?;
    for _ in 0..20 {
        let (u, v) = (rng.random_range(0..n), rng.random_range(0..n));
        if !g.add_arc(u, v) {
            g.remove_arc(&u, &v);
        }
        ranking = pr.update(&g, [u, v], &options)?;
        assert!(ranking.converged);
    }
    let dist = l_inf_distance(&ranking, &pagerank(&g, &options)?);
    assert!(dist < 1E-7);
    Ok(())
}
