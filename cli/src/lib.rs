/*
 * SPDX-FileCopyrightText: 2025 The RankGraph Authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]
#![deny(unstable_features)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(clippy::empty_loop)]
#![deny(unreachable_code)]
#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]
#![deny(unused_doc_comments)]
#![allow(clippy::type_complexity)]

use anyhow::{Context, Result, bail, ensure};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rankgraph_algo::rank::Ranking;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, SystemTime};

pub mod arcs;
pub mod pagerank;

#[derive(Args, Debug)]
/// Shared CLI arguments for reading files containing arcs.
pub struct ArcsArgs {
    #[arg(long, default_value_t = '#')]
    /// Ignore lines that start with this symbol.
    pub line_comment_symbol: char,

    #[arg(long, default_value_t = '\t')]
    /// The column separator.
    pub separator: char,

    #[arg(long, overrides_with = "undirected")]
    /// Arcs are directed (the default).
    pub directed: bool,

    #[arg(long, overrides_with = "directed")]
    /// Each line is an undirected edge. Delta PageRank rejects undirected
    /// graphs.
    pub undirected: bool,
}

impl ArcsArgs {
    /// Returns whether the graph is directed.
    pub fn is_directed(&self) -> bool {
        !self.undirected
    }
}

/// Parses the number of threads from a string.
///
/// This function is meant to be used with `#[arg(...,  value_parser =
/// num_threads_parser)]`.
pub fn num_threads_parser(arg: &str) -> Result<usize> {
    let num_threads = arg.parse::<usize>()?;
    ensure!(num_threads > 0, "Number of threads must be greater than 0");
    Ok(num_threads)
}

/// Shared CLI arguments for commands that specify a number of threads.
#[derive(Args, Debug)]
pub struct NumThreadsArg {
    #[arg(short = 'j', long, default_value_t = rayon::current_num_threads().max(1), value_parser = num_threads_parser)]
    /// The number of threads used by the standard engine.
    pub num_threads: usize,
}

/// Creates a [`ThreadPool`](rayon::ThreadPool) with the given number of threads.
pub fn get_thread_pool(num_threads: usize) -> Result<rayon::ThreadPool> {
    let thread_pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .context("Failed to create thread pool")?;
    log::info!("Using {} threads", thread_pool.current_num_threads());
    Ok(thread_pool)
}

#[derive(Debug, Clone, Copy, ValueEnum)]
/// Formats for storing rankings.
pub enum RankFormat {
    /// One `NODE<TAB>RANK` line per node, by decreasing rank.
    Ascii,
    /// A JSON object mapping nodes to ranks, by decreasing rank.
    Json,
}

impl RankFormat {
    /// Stores a ranking in the specified `path` using the format defined by
    /// `self`.
    ///
    /// If `precision` is `Some`, ranks are written with that number of
    /// decimal digits; otherwise, with the shortest representation that
    /// reads back to the same value.
    pub fn store(
        &self,
        path: impl AsRef<Path>,
        ranking: &Ranking<String>,
        precision: Option<usize>,
    ) -> Result<()> {
        create_parent_dir(&path)?;
        let path_display = path.as_ref().display();
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Could not create ranking at {}", path_display))?;
        let mut file = BufWriter::new(file);
        let fmt = |rank: f64| match precision {
            Some(precision) => format!("{rank:.precision$}"),
            None => format!("{rank}"),
        };

        match self {
            RankFormat::Ascii => {
                log::info!("Storing in ASCII format at {}", path_display);
                for (node, rank) in ranking.top(ranking.len()) {
                    writeln!(file, "{node}\t{}", fmt(rank))
                        .with_context(|| format!("Could not write ranking to {}", path_display))?;
                }
            }
            RankFormat::Json => {
                log::info!("Storing in JSON format at {}", path_display);
                let ranks = json_ranks(ranking.top(ranking.len()), precision);
                serde_json::to_writer(&mut file, &ranks)
                    .with_context(|| format!("Could not write ranking to {}", path_display))?;
            }
        }
        file.flush()
            .with_context(|| format!("Could not write ranking to {}", path_display))?;

        Ok(())
    }
}

/// Collects pairs of nodes and ranks into a JSON object, keeping their order.
///
/// If `precision` is `Some`, ranks are rounded to that number of decimal
/// digits. Non-finite ranks become `null`.
fn json_ranks(
    ranks: impl IntoIterator<Item = (String, f64)>,
    precision: Option<usize>,
) -> serde_json::Map<String, serde_json::Value> {
    ranks
        .into_iter()
        .map(|(node, rank)| {
            let rank = match precision {
                Some(precision) if rank.is_finite() => format!("{rank:.precision$}")
                    .parse()
                    .unwrap_or(rank),
                _ => rank,
            };
            (node, serde_json::Value::from(rank))
        })
        .collect()
}

/// Creates all parent directories of the given file path.
pub fn create_parent_dir(file_path: impl AsRef<Path>) -> Result<()> {
    if let Some(parent_dir) = file_path.as_ref().parent() {
        std::fs::create_dir_all(parent_dir).with_context(|| {
            format!(
                "Failed to create the directory {:?}",
                parent_dir.to_string_lossy()
            )
        })?;
    }
    Ok(())
}

/// Parses a duration from a string.
///
/// A number followed by `s`, `m`, `h` or `d` is a number of seconds, minutes,
/// hours or days; a trailing number without suffix is a number of
/// milliseconds. Whitespace is ignored.
///
/// Example: `1d2h3m4s567` is 1 day, 2 hours, 3 minutes, 4 seconds and 567
/// milliseconds.
fn parse_duration(value: &str) -> Result<Duration> {
    if value.trim().is_empty() {
        bail!("Empty duration string, if you want every 0 milliseconds use `0`.");
    }
    let mut duration = Duration::ZERO;
    let mut acc = String::new();
    for c in value.chars().filter(|c| !c.is_whitespace()) {
        if c.is_ascii_digit() {
            acc.push(c);
            continue;
        }
        let secs = match c {
            's' => 1,
            'm' => 60,
            'h' => 60 * 60,
            'd' => 24 * 60 * 60,
            _ => bail!("Invalid duration suffix: {}", c),
        };
        let count = acc
            .parse::<u64>()
            .with_context(|| format!("Missing number before {c:?} in {value:?}"))?;
        duration += Duration::from_secs(count * secs);
        acc.clear();
    }
    if !acc.is_empty() {
        duration += Duration::from_millis(acc.parse::<u64>()?);
    }
    Ok(duration)
}

/// Initializes the `env_logger` logger with a custom format including
/// timestamps with elapsed time since initialization.
pub fn init_env_logger() -> Result<()> {
    use jiff::SpanRound;
    use jiff::fmt::friendly::{Designator, Spacing, SpanPrinter};

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    let start = std::time::Instant::now();
    let printer = SpanPrinter::new()
        .spacing(Spacing::None)
        .designator(Designator::Compact);
    let span_round = SpanRound::new()
        .largest(jiff::Unit::Day)
        .smallest(jiff::Unit::Millisecond)
        .days_are_24_hours();

    builder.format(move |buf, record| {
        let Ok(ts) = jiff::Timestamp::try_from(SystemTime::now()) else {
            return Err(std::io::Error::other("Failed to get timestamp"));
        };
        let style = buf.default_level_style(record.level());
        let elapsed = start.elapsed();
        let span = jiff::Span::new()
            .seconds(elapsed.as_secs() as i64)
            .milliseconds(elapsed.subsec_millis() as i64)
            .round(span_round)
            .map_err(std::io::Error::other)?;
        writeln!(
            buf,
            "{} {} {style}{}{style:#} [{:?}] {} - {}",
            ts.strftime("%F %T%.3f"),
            printer.span_to_string(&span),
            record.level(),
            std::thread::current().id(),
            record.target(),
            record.args()
        )
    });
    builder.try_init()?;
    Ok(())
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    #[arg(long, value_parser = parse_duration, global=true, display_order = 1000)]
    /// How often to log progress. Default is 10s. You can use the suffixes "s"
    /// for seconds, "m" for minutes, "h" for hours, and "d" for days. If no
    /// suffix is provided it is assumed to be in milliseconds.
    /// Example: "1d2h3m4s567" is parsed as 1 day + 2 hours + 3 minutes + 4
    /// seconds + 567 milliseconds = 93784567 milliseconds.
    pub log_interval: Option<Duration>,
}

#[derive(Subcommand, Debug)]
pub enum SubCommands {
    #[clap(name = "pagerank", visible_alias = "pr")]
    PageRank(pagerank::CliArgs),
}

#[derive(Parser, Debug)]
#[command(name = "rankgraph", version)]
/// Compute PageRank on graphs given as lists of arcs.
///
/// Noteworthy environment variables:
///
/// - RUST_LOG: configuration for env_logger
///   <https://docs.rs/env_logger/latest/env_logger/>
///
/// - RAYON_NUM_THREADS: the default number of threads
pub struct Cli {
    #[command(subcommand)]
    pub command: SubCommands,
    #[clap(flatten)]
    pub args: GlobalArgs,
}

/// The entry point of the command-line interface.
pub fn cli_main<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let start = std::time::Instant::now();
    let cli = Cli::parse_from(args);
    match cli.command {
        SubCommands::PageRank(args) => {
            pagerank::main(cli.args, args)?;
        }
    }

    log::info!(
        "The command took {}",
        pretty_print_elapsed(start.elapsed().as_secs_f64())
    );

    Ok(())
}

/// Pretty-prints seconds in a human-readable format.
fn pretty_print_elapsed(elapsed: f64) -> String {
    const UNITS: [(u64, &str); 4] = [
        (60 * 60 * 24 * 7, "week"),
        (60 * 60 * 24, "day"),
        (60 * 60, "hour"),
        (60, "minute"),
    ];
    let mut result = String::new();
    let mut rest = elapsed as u64;
    for (secs, name) in UNITS {
        match rest / secs {
            0 => {}
            1 => result.push_str(&format!("1 {name} ")),
            count => result.push_str(&format!("{count} {name}s ")),
        }
        rest %= secs;
    }
    result.push_str(&format!("{:.3} seconds ({}s)", elapsed % 60.0, elapsed));
    result
}
