/*
 * SPDX-FileCopyrightText: 2025 The RankGraph Authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! PageRank engines.
//!
//! All engines compute the same vector: the stationary distribution of a
//! random surfer that, with probability α (the _damping factor_), follows an
//! arc leaving the current node chosen with probability proportional to its
//! [weight](EdgeWeight), and otherwise jumps to a node chosen following the
//! _preference_ vector **v** (uniform by default). The rank of _dangling_
//! nodes (nodes without outgoing weight) is redistributed following a vector
//! **u** selected by the [`Mode`].
//!
//! - [`PageRank`] is the standard power iteration and the baseline for
//!   correctness.
//! - [`DeltaPageRank`] propagates only pending rank _deltas_ above a
//!   threshold, and can [update](DeltaPageRank::update) a previous
//!   computation after the graph has been edited.
//! - The priority scheduler of [`DeltaPageRank`]
//!   ([`compute_with_priority`](DeltaPageRank::compute_with_priority))
//!   releases the largest deltas first.
//!
//! Invalid [options](Options) are reported as an [`Error`] before any
//! iteration is performed; failing to converge within the iteration cap is
//! not an error, and is reported by [`Ranking::converged`].

use thiserror::Error;

pub mod delta;
pub mod pagerank;
pub mod preds;

mod options;
pub use options::*;

mod preference;
mod priority;

mod ranking;
pub use ranking::*;

mod transition;

pub use delta::DeltaPageRank;
pub use pagerank::PageRank;

/// Errors reported by the PageRank engines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An option is out of its domain.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Delta PageRank has been requested on an undirected graph.
    #[error("Delta PageRank requires a directed graph")]
    UndirectedGraph,
}

/// Convenience alias for results of this module.
pub type Result<T> = core::result::Result<T, Error>;
