/*
 * SPDX-FileCopyrightText: 2025 The RankGraph Authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Predicates implementing stopping conditions.
//!
//! The PageRank engines build their stopping condition from the
//! [options](super::Options) by combining these predicates: they evaluate to
//! true if the computation should be stopped.
//!
//! You can combine the predicates using the `and` and `or` methods provided
//! by the [`PredicateBooleanExt`](predicates::prelude::PredicateBooleanExt)
//! trait.
//!
//! # Examples
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use predicates::prelude::*;
//! use rankgraph_algo::rank::preds::{MaxDelta, MaxIter, PredParams};
//!
//! let predicate = MaxDelta::try_from(1E-6)?.or(MaxIter::from(100));
//! assert!(predicate.eval(&PredParams { iteration: 100, residual: 1.0 }));
//! assert!(predicate.eval(&PredParams { iteration: 3, residual: 1E-7 }));
//! assert!(!predicate.eval(&PredParams { iteration: 3, residual: 1E-3 }));
//! #     Ok(())
//! # }
//! ```

use super::{Error, Result};
use predicates::{Predicate, reflection::PredicateReflection};
use std::fmt::Display;

#[doc(hidden)]
/// This structure is passed to stopping predicates to provide the
/// information that is needed to evaluate them.
#[derive(Debug)]
pub struct PredParams {
    /// The number of completed iterations.
    pub iteration: usize,
    /// The convergence measure of the engine after the last iteration.
    pub residual: f64,
}

fn check_threshold(threshold: f64) -> Result<f64> {
    if threshold.is_nan() || threshold <= 0.0 {
        return Err(Error::InvalidParameter(format!(
            "The threshold must be positive, got {threshold}"
        )));
    }
    Ok(threshold)
}

/// Stops after at most the provided number of iterations.
#[derive(Debug, Clone)]
pub struct MaxIter {
    max_iter: usize,
}

impl MaxIter {
    pub const DEFAULT_MAX_ITER: usize = usize::MAX;
}

impl From<usize> for MaxIter {
    fn from(max_iter: usize) -> Self {
        MaxIter { max_iter }
    }
}

impl Default for MaxIter {
    fn default() -> Self {
        Self::from(Self::DEFAULT_MAX_ITER)
    }
}

impl Display for MaxIter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("(max iter: {})", self.max_iter))
    }
}

impl PredicateReflection for MaxIter {}

impl Predicate<PredParams> for MaxIter {
    fn eval(&self, pred_params: &PredParams) -> bool {
        pred_params.iteration >= self.max_iter
    }
}

/// Stops when the norm of the difference between successive approximations
/// falls below a given threshold.
///
/// The threshold represents an upper bound on the 𝓁₁ error, approximated
/// by α / (1 − α) · ‖*x*(*t*) − *x*(*t* − 1)‖₁ where *x*(*t*) is
/// the rank vector at iteration *t*. Used by the
/// [standard engine](super::PageRank).
#[derive(Debug, Clone)]
pub struct L1Norm {
    threshold: f64,
}

impl L1Norm {
    pub const DEFAULT_THRESHOLD: f64 = 1E-6;
}

impl TryFrom<f64> for L1Norm {
    type Error = Error;
    fn try_from(threshold: f64) -> Result<Self> {
        Ok(L1Norm {
            threshold: check_threshold(threshold)?,
        })
    }
}

impl Default for L1Norm {
    fn default() -> Self {
        L1Norm {
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }
}

impl Display for L1Norm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("(norm: {})", self.threshold))
    }
}

impl PredicateReflection for L1Norm {}
impl Predicate<PredParams> for L1Norm {
    fn eval(&self, pred_params: &PredParams) -> bool {
        pred_params.residual <= self.threshold
    }
}

/// Stops when the largest pending delta, in absolute value, falls strictly
/// below a given threshold.
///
/// Used by the [delta engines](super::DeltaPageRank).
#[derive(Debug, Clone)]
pub struct MaxDelta {
    threshold: f64,
}

impl MaxDelta {
    pub const DEFAULT_THRESHOLD: f64 = 1E-6;
}

impl TryFrom<f64> for MaxDelta {
    type Error = Error;
    fn try_from(threshold: f64) -> Result<Self> {
        Ok(MaxDelta {
            threshold: check_threshold(threshold)?,
        })
    }
}

impl Default for MaxDelta {
    fn default() -> Self {
        MaxDelta {
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }
}

impl Display for MaxDelta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("(max delta: {})", self.threshold))
    }
}

impl PredicateReflection for MaxDelta {}
impl Predicate<PredParams> for MaxDelta {
    fn eval(&self, pred_params: &PredParams) -> bool {
        pred_params.residual < self.threshold
    }
}
