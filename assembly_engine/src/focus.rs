//! Focus/camera director: frames the union bounds of a set of drawables.

use assembly_formats::{Aabb, NodeId, SceneGraph};
use glam::Vec3;
use serde::Serialize;

use crate::config::FocusSettings;

/// Orbit-style camera controller the director drives.
pub trait CameraRig {
    fn target(&self) -> Vec3;
    fn position(&self) -> Vec3;
    /// Vertical field of view in degrees.
    fn fov_y_degrees(&self) -> f32;
    fn set_target(&mut self, target: Vec3);
    fn set_position(&mut self, position: Vec3);
    /// Called once after target and position were changed.
    fn update(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub position: Vec3,
    pub fov_y: f32,
    revision: u64,
}

impl OrbitCamera {
    pub fn new(fov_y: f32) -> Self {
        Self {
            target: Vec3::ZERO,
            position: Vec3::new(5.0, 5.0, 5.0),
            fov_y,
            revision: 0,
        }
    }

    /// Number of `update` calls so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        OrbitCamera::new(FocusSettings::default().fov_degrees)
    }
}

impl CameraRig for OrbitCamera {
    fn target(&self) -> Vec3 {
        self.target
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn fov_y_degrees(&self) -> f32 {
        self.fov_y
    }

    fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn update(&mut self) {
        self.revision += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FocusPlan {
    pub target: [f32; 3],
    pub position: [f32; 3],
    pub distance: f32,
    pub bounds: Aabb,
}

/// Union of the world bounds of `nodes`, computing and caching any bounds
/// that are missing. Nodes without bounds are skipped.
pub fn union_bounds(graph: &mut SceneGraph, nodes: &[NodeId]) -> Option<Aabb> {
    let mut union: Option<Aabb> = None;
    for &id in nodes {
        let Some(bounds) = graph.ensure_world_bounds(id) else {
            continue;
        };
        match union.as_mut() {
            Some(current) => current.include_bounds(&bounds),
            None => union = Some(bounds),
        }
    }
    union
}

/// Camera placement that frames `bounds` while looking along `view_dir`.
pub fn frame_bounds(
    bounds: &Aabb,
    view_dir: Vec3,
    fov_y_degrees: f32,
    settings: &FocusSettings,
) -> FocusPlan {
    let center = bounds.center();
    let extent = bounds.size().max(Vec3::splat(settings.min_extent));
    let max_dim = extent.max_element();

    let half_fov = (fov_y_degrees.to_radians() * 0.5).max(f32::EPSILON);
    let fitted = max_dim / (2.0 * half_fov.tan()) * settings.padding;
    let distance = fitted.max(max_dim * 2.0);

    let direction = match view_dir.try_normalize() {
        Some(direction) => direction,
        None => Vec3::ONE.normalize(),
    };
    let position = center + direction * distance;

    FocusPlan {
        target: center.to_array(),
        position: position.to_array(),
        distance,
        bounds: *bounds,
    }
}

/// Point `camera` at the union bounds of `nodes`. Empty input or nodes
/// without bounds leave the camera untouched and return `None`.
pub fn focus<C: CameraRig>(
    graph: &mut SceneGraph,
    nodes: &[NodeId],
    camera: &mut C,
    settings: &FocusSettings,
) -> Option<FocusPlan> {
    if nodes.is_empty() {
        return None;
    }
    let bounds = union_bounds(graph, nodes)?;
    let view_dir = camera.position() - camera.target();
    let plan = frame_bounds(&bounds, view_dir, camera.fov_y_degrees(), settings);
    camera.set_target(Vec3::from_array(plan.target));
    camera.set_position(Vec3::from_array(plan.position));
    camera.update();
    log::debug!(
        "focused {} drawables, distance {:.3}",
        nodes.len(),
        plan.distance
    );
    Some(plan)
}
