/*
 * SPDX-FileCopyrightText: 2025 The RankGraph Authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::{ArcsArgs, GlobalArgs, NumThreadsArg, RankFormat, arcs, get_thread_pool};
use anyhow::{Result, ensure};
use clap::{Parser, ValueEnum};
use dsi_progress_logger::{ProgressLog, progress_logger};
use rankgraph_algo::rank::{DeltaPageRank, EdgeWeight, Mode, Options, PageRank, Ranking};
use std::path::PathBuf;

/// The PageRank mode.
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum CliMode {
    /// Use the preference vector as dangling-node distribution.
    #[default]
    StronglyPreferential,
    /// Use a uniform dangling-node distribution regardless of the preference
    /// vector.
    WeaklyPreferential,
    /// Zero out the dangling-node contribution (pseudorank).
    PseudoRank,
}

impl From<CliMode> for Mode {
    fn from(m: CliMode) -> Self {
        match m {
            CliMode::StronglyPreferential => Mode::StronglyPreferential,
            CliMode::WeaklyPreferential => Mode::WeaklyPreferential,
            CliMode::PseudoRank => Mode::PseudoRank,
        }
    }
}

/// The PageRank engine.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Algorithm {
    /// Parallel power iteration.
    Standard,
    /// Delta propagation by synchronous sweeps.
    #[default]
    Delta,
    /// Delta propagation, largest deltas first.
    Priority,
}

#[derive(Parser, Debug)]
#[command(
    name = "pagerank",
    about = "Compute PageRank on a list of arcs.",
    long_about = None
)]
pub struct CliArgs {
    /// The file containing the arcs of the graph.
    pub arcs: PathBuf,

    #[arg(short, long)]
    /// Where to store the ranking.
    pub output: PathBuf,

    #[clap(flatten)]
    pub arcs_args: ArcsArgs,

    #[arg(long, value_enum, default_value_t = Algorithm::Delta)]
    /// The PageRank engine.
    pub algorithm: Algorithm,

    #[arg(short, long, default_value_t = Options::<String>::DEFAULT_ALPHA)]
    /// The damping factor α (must be in the interval [0 . . 1]).
    pub alpha: f64,

    #[arg(short, long, default_value_t = Options::<String>::DEFAULT_TOLERANCE)]
    /// The tolerance: the ℓ₁ error bound for the standard engine, the
    /// largest pending delta for the delta engines.
    pub tolerance: f64,

    #[arg(long, default_value_t = Options::<String>::DEFAULT_MAX_ITERATIONS)]
    /// Maximum number of iterations.
    pub max_iter: usize,

    #[arg(long)]
    /// Deltas smaller than this value are not propagated (default: a tenth
    /// of the tolerance).
    pub threshold: Option<f64>,

    #[arg(long)]
    /// Use the third column of the arc list as arc weight.
    pub weighted: bool,

    #[arg(short, long, value_enum, default_value_t = CliMode::StronglyPreferential)]
    /// The PageRank mode.
    pub mode: CliMode,

    #[arg(long)]
    /// Maximum number of releases of the priority engine (default: the
    /// maximum number of iterations times the number of nodes).
    pub budget: Option<usize>,

    #[arg(short, long)]
    /// Path to a preference (personalization) vector, one NODE<sep>WEIGHT
    /// pair per line.
    pub preference: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = RankFormat::Ascii)]
    /// The output format for the ranking.
    pub fmt: RankFormat,

    #[arg(long)]
    /// Decimal digits for the ranks.
    pub precision: Option<usize>,

    #[clap(flatten)]
    pub num_threads: NumThreadsArg,
}

pub fn main(global_args: GlobalArgs, args: CliArgs) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&args.alpha),
        "The damping factor must be in [0 . . 1], got {}",
        args.alpha
    );
    ensure!(
        args.budget.is_none() || args.algorithm == Algorithm::Priority,
        "--budget applies only to the priority engine"
    );

    let mut pl = progress_logger![];
    pl.display_memory(true);
    if let Some(log_interval) = global_args.log_interval {
        pl.log_interval(log_interval);
    }

    let graph = arcs::load_graph(&args.arcs, &args.arcs_args, args.weighted, &mut pl)?;

    let mut options = Options::default()
        .alpha(args.alpha)
        .tolerance(args.tolerance)
        .max_iterations(args.max_iter)
        .mode(args.mode.into());
    options.threshold = args.threshold;
    options.push_budget = args.budget;
    if args.weighted {
        options = options.weights(EdgeWeight::Attribute);
    }
    if let Some(path) = &args.preference {
        options = options.preference(arcs::load_preference(path, &args.arcs_args)?);
    }

    let thread_pool = get_thread_pool(args.num_threads.num_threads)?;
    let ranking = thread_pool.install(|| -> Result<Ranking<String>> {
        Ok(match args.algorithm {
            Algorithm::Standard => PageRank::new(&graph).run_with_logging(&options, &mut pl)?,
            Algorithm::Delta => {
                DeltaPageRank::new(&graph)?.compute_with_logging(&graph, &options, &mut pl)?
            }
            Algorithm::Priority => DeltaPageRank::new(&graph)?
                .compute_with_priority_and_logging(&graph, &options, &mut pl)?,
        })
    })?;

    if ranking.converged {
        log::info!(
            "Completed after {} iteration(s), residual = {}",
            ranking.iterations,
            ranking.residual
        );
    } else {
        log::warn!(
            "Stopped after {} iteration(s) without converging, residual = {}",
            ranking.iterations,
            ranking.residual
        );
    }
    if let Some((node, rank)) = ranking.top(1).first() {
        log::info!("Top node: {node} ({rank})");
    }

    args.fmt.store(&args.output, &ranking, args.precision)?;

    Ok(())
}
