/*
 * SPDX-FileCopyrightText: 2025 The RankGraph Authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Implementations of graphs.

pub mod map_graph;
pub mod random;

pub mod prelude {
    pub use super::map_graph::MapGraph;
    pub use super::random::ErdosRenyi;
}
