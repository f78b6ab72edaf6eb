// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The node registry: owns a named collection of [`Node`]s and tracks
//! whether the derived baseline set has gone stale.

use crate::error::{Result, VlbiError};
use crate::filters;
use crate::node::{Location, Node, SampleStream};
use crate::registry::Registry;

/// Owns a context's nodes. Membership changes mark the derived baseline set
/// stale; [`NodeRegistry::is_dirty`]/[`NodeRegistry::clear_dirty`] are used
/// by [`crate::context::Context`] to decide whether to rebuild it before the
/// next UV computation.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: Registry<Node>,
    dirty: bool,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            nodes: Registry::new(),
            dirty: false,
        }
    }

    /// Register a new node. `geographic` selects whether `location` is
    /// interpreted as geodetic `(lat_deg, lon_deg, el_m)` or geocentric
    /// `(x, y, z)` metres.
    pub fn add(
        &mut self,
        name: &str,
        stream: SampleStream,
        location: (f64, f64, f64),
        geographic: bool,
    ) -> Result<usize> {
        let location = if geographic {
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
        let index = self.nodes.slot_count();
        let node = Node::new(index, location, stream);
        let assigned = self.nodes.insert(name, node)?;
        debug_assert_eq!(assigned, index);
        self.dirty = true;
        log::debug!("added node '{name}' at index {index}");
        Ok(index)
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains(name)
    }

    pub fn at(&self, index: usize) -> Option<&Node> {
        self.nodes.at(index)
    }

    pub fn remove(&mut self, name: &str) -> Result<()> {
        self.nodes.remove(name)?;
        self.dirty = true;
        Ok(())
    }

    /// Deep-copy a node's sample stream under a new name so that later
    /// mutations of either don't alias.
    pub fn copy(&mut self, new_name: &str, existing_name: &str) -> Result<usize> {
        let existing = self
            .nodes
            .get(existing_name)
            .ok_or_else(|| VlbiError::UnknownName(existing_name.to_string()))?
            .clone();
        let index = self.nodes.slot_count();
        let node = Node::new(index, existing.location, existing.stream);
        let assigned = self.nodes.insert(new_name, node)?;
        debug_assert_eq!(assigned, index);
        self.dirty = true;
        Ok(index)
    }

    /// Register a filtered copy of `src_name`'s stream under `new_name`. The
    /// original stream is untouched.
    pub fn filter(
        &mut self,
        kind: filters::FilterKind,
        new_name: &str,
        src_name: &str,
        cutoff_rad: f64,
        cutoff_rad_hi: Option<f64>,
    ) -> Result<usize> {
        let src = self
            .nodes
            .get(src_name)
            .ok_or_else(|| VlbiError::UnknownName(src_name.to_string()))?;
        let filtered_samples =
            filters::apply(kind, &src.stream.samples, cutoff_rad, cutoff_rad_hi)?;
        let mut new_stream = src.stream.clone();
        new_stream.samples = filtered_samples;
        let location = src.location;
        let index = self.nodes.slot_count();
        let node = Node::new(index, location, new_stream);
        let assigned = self.nodes.insert(new_name, node)?;
        debug_assert_eq!(assigned, index);
        self.dirty = true;
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn slot_count(&self) -> usize {
        self.nodes.slot_count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize, &Node)> {
        self.nodes.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.nodes.names().map(|s| s.to_string()).collect()
    }

    /// True if the node set has changed since the baseline set was last
    /// rebuilt.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag; called by the baseline engine after a rebuild.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream() -> SampleStream {
        SampleStream::new(vec![1.0, 2.0, 3.0], 0.0, 1.0, 1.0)
    }

    #[test]
    fn add_assigns_stable_indices_and_marks_dirty() {
        let mut reg = NodeRegistry::new();
        assert!(!reg.is_dirty());
        let i0 = reg.add("a", stream(), (0.0, 0.0, 0.0), true).unwrap();
        assert_eq!(i0, 0);
        assert!(reg.is_dirty());
        reg.clear_dirty();
        let i1 = reg.add("b", stream(), (0.0, 1.0, 0.0), true).unwrap();
        assert_eq!(i1, 1);
        assert!(reg.is_dirty());
    }

    #[test]
    fn duplicate_add_fails() {
        let mut reg = NodeRegistry::new();
        reg.add("a", stream(), (0.0, 0.0, 0.0), true).unwrap();
        assert!(reg.add("a", stream(), (0.0, 0.0, 0.0), true).is_err());
    }

    #[test]
    fn copy_is_deep() {
        let mut reg = NodeRegistry::new();
        reg.add("a", stream(), (0.0, 0.0, 0.0), true).unwrap();
        reg.copy("a2", "a").unwrap();
        reg.get_mut("a2").unwrap().stream.samples[0] = 99.0;
        assert_eq!(reg.get("a").unwrap().stream.samples[0], 1.0);
    }

    #[test]
    fn remove_keeps_other_indices_stable() {
        let mut reg = NodeRegistry::new();
        reg.add("a", stream(), (0.0, 0.0, 0.0), true).unwrap();
        reg.add("b", stream(), (0.0, 0.0, 0.0), true).unwrap();
        reg.add("c", stream(), (0.0, 0.0, 0.0), true).unwrap();
        reg.remove("b").unwrap();
        assert_eq!(reg.get("a").unwrap().index, 0);
        assert_eq!(reg.get("c").unwrap().index, 2);
        assert!(reg.get("b").is_none());
    }
}
