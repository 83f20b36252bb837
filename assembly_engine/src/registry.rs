//! Part registry: the flat maps every other component reads.
//!
//! `model_parts` marks the parts derived by the last load, `visible_parts` is
//! the current visibility intent and `meshes` points each part at its
//! drawable in the loaded scene graph. Visibility writes for paths that are
//! not in `model_parts` are ignored.

use std::collections::{BTreeMap, BTreeSet};

use assembly_formats::NodeId;

use crate::loader::{LoadedParts, PathCollision};

#[derive(Debug, Clone, Default)]
pub struct PartRegistry {
    model_parts: BTreeMap<String, bool>,
    visible_parts: BTreeMap<String, bool>,
    meshes: BTreeMap<String, NodeId>,
    selection: Vec<NodeId>,
    collisions: Vec<PathCollision>,
}

impl PartRegistry {
    /// Replace the registry contents with a fresh load; every part starts visible.
    pub fn seed(&mut self, loaded: LoadedParts) {
        self.model_parts = loaded.parts.iter().map(|path| (path.clone(), true)).collect();
        self.visible_parts = self.model_parts.clone();
        self.meshes = loaded.meshes;
        self.collisions = loaded.collisions;
        self.selection.clear();
    }

    pub fn reset_all(&mut self) {
        self.model_parts.clear();
        self.visible_parts.clear();
        self.meshes.clear();
        self.selection.clear();
        self.collisions.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.model_parts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.model_parts.len()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.model_parts.contains_key(path)
    }

    pub fn part_paths(&self) -> impl Iterator<Item = &str> {
        self.model_parts.keys().map(String::as_str)
    }

    pub fn model_parts(&self) -> &BTreeMap<String, bool> {
        &self.model_parts
    }

    pub fn visible_parts(&self) -> &BTreeMap<String, bool> {
        &self.visible_parts
    }

    pub fn is_visible(&self, path: &str) -> bool {
        self.visible_parts.get(path).copied().unwrap_or(false)
    }

    pub fn mesh(&self, path: &str) -> Option<NodeId> {
        self.meshes.get(path).copied()
    }

    pub fn meshes(&self) -> &BTreeMap<String, NodeId> {
        &self.meshes
    }

    pub fn collisions(&self) -> &[PathCollision] {
        &self.collisions
    }

    /// Returns `true` when the stored value changed.
    pub fn set_visibility(&mut self, path: &str, visible: bool) -> bool {
        match self.visible_parts.get_mut(path) {
            Some(current) if *current != visible => {
                *current = visible;
                true
            }
            Some(_) => false,
            None => {
                log::trace!("ignoring visibility change for unknown part {path:?}");
                false
            }
        }
    }

    /// Commit a complete visibility map only if it differs from the current one.
    /// Entries for unknown parts are dropped and missing known parts are hidden.
    pub fn apply_visibility(&mut self, next: &BTreeMap<String, bool>) -> bool {
        let candidate: BTreeMap<String, bool> = self
            .model_parts
            .keys()
            .map(|path| (path.clone(), next.get(path).copied().unwrap_or(false)))
            .collect();
        if candidate == self.visible_parts {
            return false;
        }
        self.visible_parts = candidate;
        true
    }

    pub fn show_all(&mut self) -> bool {
        let all = self.model_parts.clone();
        self.apply_visibility(&all)
    }

    pub fn visible_count(&self) -> usize {
        self.visible_parts.values().filter(|visible| **visible).count()
    }

    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    pub fn set_selection(&mut self, nodes: Vec<NodeId>) {
        self.selection = nodes;
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Drawables for the given paths, skipping unknown ones and duplicates.
    pub fn drawables_for<'a, I>(&self, paths: I) -> Vec<NodeId>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = BTreeSet::new();
        paths
            .into_iter()
            .filter_map(|path| self.mesh(path))
            .filter(|id| seen.insert(*id))
            .collect()
    }
}
