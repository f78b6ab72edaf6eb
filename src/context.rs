// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The library-surface façade: a `Context` owns a node registry, a
//! lazily-rebuilt baseline set and a named store of UV-plane models, and
//! exposes the operations a host application drives.

use std::sync::atomic::AtomicBool;
use std::sync::Mutex;

use num_complex::Complex64;

use crate::baseline::{Baseline, BaselineSet, ReferenceMode};
use crate::coord::geodetic::{geodetic_to_ecef, Ecef};
use crate::error::{Result, VlbiError};
use crate::filters::FilterKind;
use crate::grid::{DepositMode, UvGrid};
use crate::node::{Location, SampleStream};
use crate::node_registry::NodeRegistry;
use crate::registry::Registry;
use crate::scheduler::{self, Delegate, SchedulerConfig};

/// One synthesis run's knobs, passed to [`Context::get_uv_plot`]. The
/// projection reference point is not among these: it is ambient `Context`
/// state, set once via [`Context::set_location`], not re-specified per call.
#[derive(Clone, Copy, Debug)]
pub struct PlotOptions {
    pub ra: f64,
    pub dec: f64,
    pub mode: DepositMode,
    pub moving_baseline: bool,
    pub nodelay: bool,
    pub max_threads: usize,
    pub show_progress: bool,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            ra: 0.0,
            dec: 0.0,
            mode: DepositMode::ApertureSynthesis,
            moving_baseline: false,
            nodelay: false,
            max_threads: 1,
            show_progress: false,
        }
    }
}

/// The root object a host application holds: nodes, their derived
/// baselines, and a named store of UV-plane models.
#[derive(Default)]
pub struct Context {
    nodes: NodeRegistry,
    baselines: BaselineSet,
    models: Registry<UvGrid>,
    cancel: AtomicBool,
    /// The array-wide reference point set by [`Context::set_location`]. When
    /// present, baseline projection uses it as the fixed horizontal
    /// reference (`ReferenceMode::Absolute`); otherwise each baseline
    /// projects relative to its own two nodes' midpoint
    /// (`ReferenceMode::Relative`).
    array_location: Option<Ecef>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            nodes: NodeRegistry::new(),
            baselines: BaselineSet::new(),
            models: Registry::new(),
            cancel: AtomicBool::new(false),
            array_location: None,
        }
    }

    // -- Nodes -----------------------------------------------------------

    pub fn add_node(
        &mut self,
        name: &str,
        stream: SampleStream,
        location: (f64, f64, f64),
        geographic: bool,
    ) -> Result<usize> {
        self.nodes.add(name, stream, location, geographic)
    }

    pub fn copy_node(&mut self, new_name: &str, existing_name: &str) -> Result<usize> {
        self.nodes.copy(new_name, existing_name)
    }

    pub fn del_node(&mut self, name: &str) -> Result<()> {
        self.nodes.remove(name)
    }

    pub fn get_node(&self, name: &str) -> Option<&crate::node::Node> {
        self.nodes.get(name)
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.contains(name)
    }

    pub fn list_nodes(&self) -> Vec<String> {
        self.nodes.names()
    }

    /// Move an existing node to a new location. `add_node` only sets a
    /// node's location once, at registration time; this is a convenience for
    /// relocating one afterward, with the same argument shape.
    pub fn set_node_location(
        &mut self,
        name: &str,
        location: (f64, f64, f64),
        geographic: bool,
    ) -> Result<()> {
        let node = self
            .nodes
            .get_mut(name)
            .ok_or_else(|| VlbiError::UnknownName(name.to_string()))?;
        node.location = if geographic {
            Location::Geodetic {
                lat_deg: location.0,
                lon_deg: location.1,
                el_m: location.2,
            }
        } else {
            Location::Geocentric(crate::coord::geodetic::Ecef::new(
                location.0, location.1, location.2,
            ))
        };
        Ok(())
    }

    /// Establish the array's reference location: the fixed horizontal
    /// vantage point baselines project against, instead of each pair's own
    /// midpoint. Switches subsequent `get_uv_plot` calls to
    /// `ReferenceMode::Absolute`.
    pub fn set_location(&mut self, lat_deg: f64, lon_deg: f64, el_m: f64) {
        self.array_location = Some(geodetic_to_ecef(lat_deg, lon_deg, el_m));
    }

    /// The array-wide reference point set by [`Context::set_location`], if
    /// any.
    pub fn array_location(&self) -> Option<Ecef> {
        self.array_location
    }

    fn reference_mode(&self) -> ReferenceMode {
        match self.array_location {
            Some(ecef) => ReferenceMode::Absolute(ecef),
            None => ReferenceMode::Relative,
        }
    }

    pub fn filter_node(
        &mut self,
        kind: FilterKind,
        new_name: &str,
        src_name: &str,
        cutoff_rad: f64,
        cutoff_rad_hi: Option<f64>,
    ) -> Result<usize> {
        self.nodes
            .filter(kind, new_name, src_name, cutoff_rad, cutoff_rad_hi)
    }

    // -- Baselines ---------------------------------------------------------

    /// Rebuild the derived baseline set if nodes have been added or removed
    /// since the last rebuild.
    fn sync_baselines(&mut self) {
        if self.nodes.is_dirty() {
            self.baselines.rebuild(&self.nodes);
            self.nodes.clear_dirty();
        }
    }

    pub fn baselines(&mut self) -> &BaselineSet {
        self.sync_baselines();
        &self.baselines
    }

    pub fn get_baseline(&mut self, name: &str) -> Option<&Baseline> {
        self.sync_baselines();
        self.baselines.get(name)
    }

    pub fn set_baseline_buffer(&mut self, name: &str, buffer: Vec<Complex64>) -> Result<()> {
        self.sync_baselines();
        let baseline = self
            .baselines
            .get_mut(name)
            .ok_or_else(|| VlbiError::UnknownName(name.to_string()))?;
        baseline.lock(buffer);
        Ok(())
    }

    pub fn unlock_baseline(&mut self, name: &str) -> Result<()> {
        self.sync_baselines();
        let baseline = self
            .baselines
            .get_mut(name)
            .ok_or_else(|| VlbiError::UnknownName(name.to_string()))?;
        baseline.unlock();
        Ok(())
    }

    // -- Models --------------------------------------------------------

    /// Run the scheduler over every current baseline, depositing into a
    /// freshly-allocated named model of size `width x height`. `delegate`,
    /// if given, replaces per-sample correlation with `delegate(u, v)` (spec
    /// §4.5 "Delegate override"); pass `None` for the ordinary
    /// (locked-buffer-or-correlate) behaviour.
    pub fn get_uv_plot(
        &mut self,
        name: &str,
        width: usize,
        height: usize,
        t_start: f64,
        t_end: f64,
        options: PlotOptions,
        delegate: Option<Delegate>,
    ) -> Result<usize> {
        self.sync_baselines();
        self.cancel
            .store(false, std::sync::atomic::Ordering::Relaxed);

        let grid = Mutex::new(UvGrid::new(width, height));
        let config = SchedulerConfig {
            max_threads: options.max_threads,
            moving_baseline: options.moving_baseline,
            nodelay: options.nodelay,
            mode: options.mode,
            show_progress: options.show_progress,
            delegate,
        };
        let baselines: Vec<Baseline> = self.baselines.iter().cloned().collect();
        scheduler::fill_grid(
            &baselines,
            &self.nodes,
            &grid,
            t_start,
            t_end,
            options.ra,
            options.dec,
            self.reference_mode(),
            &self.cancel,
            &config,
        )?;

        let grid = grid.into_inner().expect("grid mutex poisoned");
        if self.models.contains(name) {
            self.models.remove(name)?;
        }
        self.models.insert(name, grid)
    }

    /// Request that any in-flight `get_uv_plot` stop at the next sample
    /// boundary it checks. The call still returns `Ok` with whatever the
    /// grid accumulated before the flag was observed (spec §5: "the partial
    /// grid is still returned").
    pub fn cancel(&self) {
        self.cancel
            .store(true, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn get_model(&self, name: &str) -> Option<&UvGrid> {
        self.models.get(name)
    }

    pub fn get_model_mut(&mut self, name: &str) -> Option<&mut UvGrid> {
        self.models.get_mut(name)
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.models.contains(name)
    }

    pub fn del_model(&mut self, name: &str) -> Result<()> {
        self.models.remove(name).map(|_| ())
    }

    pub fn list_models(&self) -> Vec<String> {
        self.models.names().map(|s| s.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_list_nodes_roundtrip() {
        let mut ctx = Context::new();
        ctx.add_node(
            "a",
            SampleStream::new(vec![1.0, 2.0], 0.0, 1.0, 1.0),
            (0.0, 0.0, 0.0),
            true,
        )
        .unwrap();
        assert!(ctx.has_node("a"));
        assert_eq!(ctx.list_nodes(), vec!["a".to_string()]);
    }

    #[test]
    fn baselines_rebuild_lazily_after_node_changes() {
        let mut ctx = Context::new();
        assert_eq!(ctx.baselines().len(), 0);
        ctx.add_node(
            "a",
            SampleStream::new(vec![1.0], 0.0, 1.0, 1.0),
            (0.0, 0.0, 0.0),
            true,
        )
        .unwrap();
        ctx.add_node(
            "b",
            SampleStream::new(vec![1.0], 0.0, 1.0, 1.0),
            (0.0, 1.0, 0.0),
            true,
        )
        .unwrap();
        assert_eq!(ctx.baselines().len(), 1);
    }

    #[test]
    fn get_uv_plot_produces_a_named_model() {
        let mut ctx = Context::new();
        ctx.add_node(
            "a",
            SampleStream::new(vec![1.0, -1.0, 1.0, -1.0], 0.0, 2.0, 1.0),
            (0.0, 0.0, 0.0),
            true,
        )
        .unwrap();
        ctx.add_node(
            "b",
            SampleStream::new(vec![1.0, -1.0, 1.0, -1.0], 0.0, 2.0, 1.0),
            (0.0, 0.001, 0.0),
            true,
        )
        .unwrap();
        let options = PlotOptions {
            dec: 0.3,
            ..Default::default()
        };
        let result = ctx.get_uv_plot("model1", 32, 32, 0.0, 2.0, options, None);
        assert!(result.is_ok());
        assert!(ctx.has_model("model1"));
    }

    #[test]
    fn unknown_baseline_buffer_lock_fails() {
        let mut ctx = Context::new();
        assert!(ctx.set_baseline_buffer("nope", vec![]).is_err());
    }

    #[test]
    fn set_location_switches_to_absolute_reference_mode() {
        let mut ctx = Context::new();
        assert!(ctx.array_location().is_none());
        ctx.set_location(10.0, 20.0, 0.0);
        assert!(ctx.array_location().is_some());
        assert!(matches!(ctx.reference_mode(), ReferenceMode::Absolute(_)));
    }

    #[test]
    fn no_array_location_means_relative_reference_mode() {
        let ctx = Context::new();
        assert!(matches!(ctx.reference_mode(), ReferenceMode::Relative));
    }
}
