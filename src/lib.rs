// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`vlbi-core`: baseline geometry, UV-plane synthesis and correlation for a
Very Long Baseline Interferometry toolkit.

A [`Context`](context::Context) owns a set of [`Node`](node::Node)s (an
antenna/station plus its sample stream), derives the
[`Baseline`](baseline::Baseline)s between them, and fills named
[`UvGrid`](grid::UvGrid) models by dispatching one worker per baseline
through [`scheduler::fill_grid`]. Host applications that need a file-format
or command-protocol front end are expected to build on top of this library;
none is provided here (see the crate's `DESIGN.md`).
*/

pub mod baseline;
pub mod constants;
pub mod context;
pub mod coord;
pub mod correlate;
pub mod error;
pub mod filters;
pub mod grid;
pub mod model_ops;
pub mod node;
pub mod node_registry;
pub mod registry;
pub mod sample;
pub mod scheduler;
pub mod time;

pub use context::{Context, PlotOptions};
pub use error::{Result, VlbiError};
