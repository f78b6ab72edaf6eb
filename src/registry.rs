// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A generic named, insertion-ordered collection with stable indices.
//!
//! One concrete container, parameterized by value type, backs nodes,
//! baselines and models alike. Removed entries leave a tombstone so that
//! `index_of` never changes for surviving entries.

use indexmap::IndexMap;

use crate::error::{Result, VlbiError};

/// A named collection preserving insertion order and stable integer indices.
#[derive(Debug, Default, Clone)]
pub struct Registry<T> {
    // `None` marks a removed slot; the key is dropped from `names` but the
    // index keeps its slot in `slots` so later indices don't shift.
    slots: Vec<Option<T>>,
    names: IndexMap<String, usize>,
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            names: IndexMap::new(),
        }
    }

    /// Insert a new named value. Fails with [`VlbiError::DuplicateName`] if
    /// the name is currently live. A name freed by [`Registry::remove`] may
    /// be reused; it is assigned a fresh index rather than the old
    /// (tombstoned) one.
    pub fn insert(&mut self, name: &str, value: T) -> Result<usize> {
        if self.names.contains_key(name) {
            return Err(VlbiError::DuplicateName(name.to_string()));
        }
        let index = self.slots.len();
        self.slots.push(Some(value));
        self.names.insert(name.to_string(), index);
        Ok(index)
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.names.get(name).and_then(|&i| self.slots[i].as_ref())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        let index = *self.names.get(name)?;
        self.slots[index].as_mut()
    }

    pub fn at(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(|s| s.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    /// Remove a named entry. The index is never reused and never shifts for
    /// other entries.
    pub fn remove(&mut self, name: &str) -> Result<T> {
        let index = self
            .names
            .shift_remove(name)
            .ok_or_else(|| VlbiError::UnknownName(name.to_string()))?;
        self.slots[index]
            .take()
            .ok_or_else(|| VlbiError::UnknownName(name.to_string()))
    }

    /// Number of live (non-removed) entries.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Highest index assigned so far, plus one; i.e. the size of the stable
    /// index space, including tombstoned slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Iterate over `(name, index, value)` for live entries, in insertion
    /// order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize, &T)> {
        self.names
            .iter()
            .map(move |(name, &index)| (name.as_str(), index, self.slots[index].as_ref().unwrap()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(|s| s.as_str())
    }
}
