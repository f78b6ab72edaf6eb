// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Baselines: the unordered pair of two nodes, their derived geometry, and
//! the baseline set derived from a node registry.

use num_complex::Complex64;

use crate::coord::geodetic::Ecef;
use crate::coord::uvw::Uvw;
use crate::coord::{self, horizontal, uvw};
use crate::node_registry::NodeRegistry;
use crate::time;

/// How the projection's horizontal reference point is chosen.
#[derive(Clone, Copy, Debug)]
pub enum ReferenceMode {
    /// A fixed array-centre location (set once via `set_location`).
    Absolute(Ecef),
    /// The midpoint of the two nodes forming the baseline being projected.
    Relative,
}

fn midpoint(a: Ecef, b: Ecef) -> Ecef {
    Ecef::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0, (a.z + b.z) / 2.0)
}

/// An unordered pair of distinct nodes, canonically ordered so
/// `n1_index < n2_index`.
#[derive(Clone, Debug)]
pub struct Baseline {
    pub n1_name: String,
    pub n2_name: String,
    pub n1_index: usize,
    pub n2_index: usize,
    pub name: String,
    /// Externally supplied, pre-correlated visibilities. Once set, the
    /// correlator must not recompute this baseline.
    locked_buffer: Option<Vec<Complex64>>,
}

impl Baseline {
    /// Construct a baseline between two nodes, canonically ordering them by
    /// index.
    pub fn new(name1: &str, index1: usize, name2: &str, index2: usize) -> Self {
        let (n1_name, n1_index, n2_name, n2_index) = if index1 < index2 {
            (name1.to_string(), index1, name2.to_string(), index2)
        } else {
            (name2.to_string(), index2, name1.to_string(), index1)
        };
        let name = format!("{n1_name}_{n2_name}");
        Self {
            n1_name,
            n2_name,
            n1_index,
            n2_index,
            name,
            locked_buffer: None,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked_buffer.is_some()
    }

    pub fn lock(&mut self, buffer: Vec<Complex64>) {
        self.locked_buffer = Some(buffer);
    }

    pub fn unlock(&mut self) {
        self.locked_buffer = None;
    }

    pub fn locked_buffer(&self) -> Option<&[Complex64]> {
        self.locked_buffer.as_deref()
    }

    /// Project this baseline at time `t` (J2000 seconds) toward `(ra, dec)`
    /// \[radians\], given the two nodes' current ECEF locations and a
    /// wavelength \[m\]. Returns `None` only if the target is below the
    /// horizon for *both* nodes.
    #[allow(clippy::too_many_arguments)]
    pub fn project(
        &self,
        t_j2000: f64,
        ra: f64,
        dec: f64,
        loc1: Ecef,
        loc2: Ecef,
        reference: ReferenceMode,
        wavelength_m: f64,
    ) -> Option<Uvw> {
        let alt_at = |loc: Ecef| {
            let (lat, lon, _el) = coord::ecef_to_geodetic(loc);
            let lst = time::j2000_to_lst(t_j2000, lon);
            horizontal::alt_az_from_ra_dec(lst, ra, dec, lat.to_radians(), lon.to_radians()).0
        };
        let alt1 = alt_at(loc1);
        let alt2 = alt_at(loc2);
        if alt1 <= 0.0 && alt2 <= 0.0 {
            return None;
        }

        let reference_ecef = match reference {
            ReferenceMode::Absolute(e) => e,
            ReferenceMode::Relative => midpoint(loc1, loc2),
        };
        let (ref_lat, ref_lon, _el) = coord::ecef_to_geodetic(reference_ecef);
        let lst = time::j2000_to_lst(t_j2000, ref_lon);
        let (alt, az) = horizontal::alt_az_from_ra_dec(
            lst,
            ra,
            dec,
            ref_lat.to_radians(),
            ref_lon.to_radians(),
        );
        let alt_clamped = coord::clamp_half_pi(alt);
        if (alt - alt_clamped).abs() > f64::EPSILON {
            log::warn!(
                "baseline '{}': elevation {alt} rad out of range, clamped",
                self.name
            );
        }

        let b = loc2.sub(&loc1);
        let (u, v, w) = uvw::rotate(b, alt_clamped, az);
        let tau = w / crate::constants::VEL_C;
        Some(Uvw {
            u: u / wavelength_m,
            v: v / wavelength_m,
            w: w / wavelength_m,
            tau,
        })
    }
}

/// The set of all `N*(N-1)/2` baselines derivable from a node registry,
/// rebuilt deterministically whenever the registry's membership changes.
#[derive(Clone, Debug, Default)]
pub struct BaselineSet {
    baselines: Vec<Baseline>,
}

impl BaselineSet {
    pub fn new() -> Self {
        Self {
            baselines: Vec::new(),
        }
    }

    /// Rebuild the baseline set from the current (live) nodes in `nodes`,
    /// preserving lock state for baselines that survive the rebuild.
    pub fn rebuild(&mut self, nodes: &NodeRegistry) {
        let mut live: Vec<(&str, usize)> = nodes.iter().map(|(n, i, _)| (n, i)).collect();
        live.sort_by_key(|&(_, i)| i);

        let mut new_baselines = Vec::with_capacity(live.len() * live.len().saturating_sub(1) / 2);
        for a in 0..live.len() {
            for b in (a + 1)..live.len() {
                let (name1, index1) = live[a];
                let (name2, index2) = live[b];
                new_baselines.push(Baseline::new(name1, index1, name2, index2));
            }
        }

        // Preserve locked buffers across a rebuild triggered by an unrelated
        // node addition/removal.
        for nb in &mut new_baselines {
            if let Some(old) = self.baselines.iter().find(|ob| ob.name == nb.name) {
                if let Some(buf) = &old.locked_buffer {
                    nb.locked_buffer = Some(buf.clone());
                }
            }
        }

        self.baselines = new_baselines;
    }

    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Baseline> {
        self.baselines.iter().find(|b| b.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Baseline> {
        self.baselines.iter_mut().find(|b| b.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Baseline> {
        self.baselines.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Baseline> {
        self.baselines.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SampleStream;

    fn registry_with_n_nodes(n: usize) -> NodeRegistry {
        let mut reg = NodeRegistry::new();
        for i in 0..n {
            let stream = SampleStream::new(vec![1.0], 0.0, 1.0, 1.0);
            reg.add(
                &format!("node{i}"),
                stream,
                (i as f64, 0.0, 0.0),
                true,
            )
            .unwrap();
        }
        reg
    }

    #[test]
    fn baseline_count_matches_n_choose_2() {
        for n in [0, 1, 2, 3, 5, 8] {
            let reg = registry_with_n_nodes(n);
            let mut set = BaselineSet::new();
            set.rebuild(&reg);
            assert_eq!(set.len(), n * n.saturating_sub(1) / 2);
        }
    }

    #[test]
    fn baseline_endpoints_are_canonically_ordered() {
        let reg = registry_with_n_nodes(4);
        let mut set = BaselineSet::new();
        set.rebuild(&reg);
        for b in set.iter() {
            assert!(b.n1_index < b.n2_index);
            assert_eq!(b.name, format!("{}_{}", b.n1_name, b.n2_name));
        }
    }

    #[test]
    fn removing_a_node_drops_its_baselines_but_keeps_other_indices() {
        let mut reg = registry_with_n_nodes(3);
        reg.remove("node1").unwrap();
        let mut set = BaselineSet::new();
        set.rebuild(&reg);
        assert_eq!(set.len(), 1);
        let b = set.iter().next().unwrap();
        assert_eq!(b.n1_index, 0);
        assert_eq!(b.n2_index, 2);
    }

    #[test]
    fn rebuild_preserves_locked_state() {
        let reg = registry_with_n_nodes(2);
        let mut set = BaselineSet::new();
        set.rebuild(&reg);
        set.get_mut("node0_node1")
            .unwrap()
            .lock(vec![Complex64::new(1.0, 0.0)]);
        set.rebuild(&reg);
        assert!(set.get("node0_node1").unwrap().is_locked());
    }

    #[test]
    fn project_returns_none_when_both_nodes_below_horizon() {
        let b = Baseline::new("a", 0, "b", 1);
        // Target at the antipode: both nodes see it below the horizon at a
        // pole-to-pole baseline across local midnight conditions is overkill
        // to construct exactly; instead directly drive alt via a target at
        // dec = -90 viewed from the north pole (always below horizon there).
        let loc1 = crate::coord::geodetic::geodetic_to_ecef(89.9, 0.0, 0.0);
        let loc2 = crate::coord::geodetic::geodetic_to_ecef(89.9, 1.0, 0.0);
        let result = b.project(
            0.0,
            0.0,
            -1.5,
            loc1,
            loc2,
            ReferenceMode::Relative,
            1.0,
        );
        assert!(result.is_none());
    }
}
