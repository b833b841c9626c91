/*
 * SPDX-FileCopyrightText: 2025 The RankGraph Authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Reading graphs and preference vectors from text files.

use crate::ArcsArgs;
use anyhow::{Context, Result, ensure};
use dsi_progress_logger::ProgressLog;
use itertools::Itertools;
use rankgraph::graphs::map_graph::MapGraph;
use rankgraph::traits::Graph;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Returns the meaningful lines of a reader with their (one-based) line
/// number, skipping empty lines and comments.
fn records(
    reader: impl BufRead,
    comment: char,
) -> impl Iterator<Item = Result<(usize, String)>> {
    reader
        .lines()
        .enumerate()
        .map(|(i, line)| {
            line.map(|line| (i + 1, line))
                .with_context(|| format!("Error reading line {}", i + 1))
        })
        .filter(move |record| {
            record.as_ref().map_or(true, |(_, line)| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with(comment)
            })
        })
}

/// Parses a nonnegative finite weight.
fn parse_weight(value: &str, line_num: usize) -> Result<f64> {
    let weight = value
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Line {line_num}: could not parse weight {value:?}"))?;
    ensure!(
        weight.is_finite() && weight >= 0.0,
        "Line {line_num}: weights must be nonnegative and finite, got {weight}"
    );
    Ok(weight)
}

/// Reads a graph from a file with one arc per line.
///
/// See [`read_graph`].
pub fn load_graph(
    path: impl AsRef<Path>,
    args: &ArcsArgs,
    weighted: bool,
    pl: &mut impl ProgressLog,
) -> Result<MapGraph<String>> {
    let path = path.as_ref();
    log::info!("Loading arcs from {}", path.display());
    let file = File::open(path).with_context(|| format!("Could not open {}", path.display()))?;
    read_graph(BufReader::new(file), args, weighted, pl)
}

/// Reads a graph with one arc per line.
///
/// Each line contains a source and a target label and, if `weighted` is
/// true, an optional weight, separated by [`ArcsArgs::separator`]. Labels
/// are trimmed, and nodes are numbered in order of appearance. Lines with
/// fewer than two columns are skipped with a warning; a weight that cannot
/// be parsed is an error. Lines starting with
/// [`ArcsArgs::line_comment_symbol`] are ignored.
pub fn read_graph(
    reader: impl BufRead,
    args: &ArcsArgs,
    weighted: bool,
    pl: &mut impl ProgressLog,
) -> Result<MapGraph<String>> {
    let mut graph = if args.is_directed() {
        MapGraph::directed()
    } else {
        MapGraph::undirected()
    };

    pl.item_name("line");
    pl.expected_updates(None);
    pl.start("Reading arcs...");

    let mut skipped = 0;
    for record in records(reader, args.line_comment_symbol) {
        let (line_num, line) = record?;
        let mut columns = line.split(args.separator);
        let Some((src, dst)) = columns.next_tuple() else {
            log::warn!(
                "Line {line_num}: {line:?} does not have two columns separated by {:?} (you can change the separator using the --separator option)",
                args.separator
            );
            skipped += 1;
            continue;
        };
        let (src, dst) = (src.trim().to_owned(), dst.trim().to_owned());
        match columns.next().filter(|_| weighted) {
            Some(weight) => {
                let weight = parse_weight(weight, line_num)?;
                graph.add_weighted_arc(src, dst, weight);
            }
            None => {
                graph.add_arc(src, dst);
            }
        }
        pl.light_update();
    }
    pl.done();

    if skipped > 0 {
        log::warn!("{skipped} lines skipped");
    }
    log::info!(
        "Read {} nodes and {} arcs ({})",
        graph.num_nodes(),
        graph.num_arcs(),
        if graph.is_directed() {
            "directed"
        } else {
            "undirected"
        }
    );
    Ok(graph)
}

/// Reads a preference vector from a file with one `NODE<sep>WEIGHT` pair
/// per line.
pub fn load_preference(path: impl AsRef<Path>, args: &ArcsArgs) -> Result<Vec<(String, f64)>> {
    let path = path.as_ref();
    log::info!("Loading the preference vector from {}", path.display());
    let file = File::open(path).with_context(|| format!("Could not open {}", path.display()))?;
    read_preference(BufReader::new(file), args)
        .with_context(|| format!("Invalid preference vector in {}", path.display()))
}

/// Reads a preference vector with one `NODE<sep>WEIGHT` pair per line.
pub fn read_preference(reader: impl BufRead, args: &ArcsArgs) -> Result<Vec<(String, f64)>> {
    records(reader, args.line_comment_symbol)
        .map(|record| {
            let (line_num, line) = record?;
            let (node, weight) = line
                .split(args.separator)
                .collect_tuple()
                .with_context(|| format!("Line {line_num}: expected two columns in {line:?}"))?;
            Ok((node.trim().to_owned(), parse_weight(weight, line_num)?))
        })
        .collect()
}
