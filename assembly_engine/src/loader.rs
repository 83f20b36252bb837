//! Scene loader: derives one addressable part path per drawable.
//!
//! Path contract: the names of every ancestor strictly between the scene root
//! and the drawable, root first, joined with [`PATH_SEPARATOR`]. The
//! drawable's own name is not part of its path. Unnamed ancestors contribute
//! `unnamed_<kind>`. A drawable hanging directly off the scene root falls back
//! to its own name, then to `mesh_<node index>`.
//!
//! When two drawables with different parents resolve to the same path the
//! later one wins the drawable slot; the collision is logged and reported.

use std::collections::{BTreeMap, BTreeSet};

use assembly_formats::{NodeId, RenderFlags, SceneGraph};
use serde::Serialize;

use crate::config::RenderSettings;

pub const PATH_SEPARATOR: &str = " / ";

/// Canonical part path for the drawable `id`.
pub fn part_path(graph: &SceneGraph, id: NodeId) -> String {
    let mut segments: Vec<String> = graph
        .ancestors(id)
        .filter(|(ancestor, _)| *ancestor != graph.root())
        .map(|(_, node)| node.display_name())
        .collect();
    segments.reverse();
    let path = segments.join(PATH_SEPARATOR);
    if !path.is_empty() {
        return path;
    }
    match graph.node(id).and_then(|node| node.name()) {
        Some(name) => name.to_string(),
        None => format!("mesh_{}", id.index()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathCollision {
    pub path: String,
    pub replaced: NodeId,
    pub kept: NodeId,
}

/// Output of a single load pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedParts {
    pub parts: BTreeSet<String>,
    pub meshes: BTreeMap<String, NodeId>,
    pub collisions: Vec<PathCollision>,
    pub drawable_count: usize,
}

/// Walk the graph once and collect every drawable's part path.
pub fn collect_parts(graph: &SceneGraph) -> LoadedParts {
    let mut loaded = LoadedParts::default();
    let mut owners: BTreeMap<String, Option<NodeId>> = BTreeMap::new();

    for id in graph.traverse() {
        let Some(node) = graph.node(id) else {
            continue;
        };
        if !node.is_drawable() {
            continue;
        }
        loaded.drawable_count += 1;
        let path = part_path(graph, id);

        if let Some(previous) = loaded.meshes.insert(path.clone(), id) {
            let previous_parent = owners.get(&path).copied().flatten();
            if previous_parent != node.parent {
                log::warn!(
                    "part path {path:?} is shared by nodes {} and {}; keeping the latter",
                    previous.index(),
                    id.index()
                );
                loaded.collisions.push(PathCollision {
                    path: path.clone(),
                    replaced: previous,
                    kept: id,
                });
            }
        }
        owners.insert(path.clone(), node.parent);
        loaded.parts.insert(path);
    }

    loaded
}

/// Force the viewer's rendering flags and warm the world-bounds cache.
/// Running it again on the same graph changes nothing.
pub fn normalize_drawables(graph: &mut SceneGraph) -> usize {
    let drawables: Vec<NodeId> = graph.drawables().collect();
    let mut touched = 0;
    for id in drawables {
        if let Some(primitive) = graph.node_mut(id).and_then(|node| node.primitive.as_mut()) {
            if primitive.flags != RenderFlags::NORMALIZED {
                primitive.flags = RenderFlags::NORMALIZED;
                touched += 1;
            }
        }
        graph.ensure_world_bounds(id);
    }
    touched
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Unloaded,
    Loading,
    Loaded,
}

/// One-shot loader. Parts are derived on the transition into `Loaded` and
/// never again until [`SceneLoader::reset`].
#[derive(Debug, Default)]
pub struct SceneLoader {
    state: LoadState,
}

impl SceneLoader {
    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn begin(&mut self) {
        if self.state == LoadState::Unloaded {
            self.state = LoadState::Loading;
        }
    }

    /// Derive parts for `graph` unless this loader already finished a load.
    pub fn initialize(
        &mut self,
        graph: &mut SceneGraph,
        settings: &RenderSettings,
    ) -> Option<LoadedParts> {
        if self.state == LoadState::Loaded {
            log::debug!("scene already initialized; skipping part derivation");
            return None;
        }
        if settings.normalize_materials {
            let touched = normalize_drawables(graph);
            log::debug!("normalized render flags on {touched} drawables");
        }
        let loaded = collect_parts(graph);
        log::info!(
            "derived {} parts from {} drawables ({} path collisions)",
            loaded.parts.len(),
            loaded.drawable_count,
            loaded.collisions.len()
        );
        self.state = LoadState::Loaded;
        Some(loaded)
    }

    pub fn reset(&mut self) {
        self.state = LoadState::Unloaded;
    }
}
