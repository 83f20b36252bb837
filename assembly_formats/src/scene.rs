//! Arena-backed scene graph shared by the importers and the engine.
//!
//! Nodes live in a flat table and refer to each other by index, the same way
//! the decoded model hierarchies do. Node 0 is always the scene root. Only
//! `Mesh` nodes are drawable; every other kind exists to group drawables and
//! to give them names.

use glam::{Mat4, Vec3};
use serde::Serialize;

/// Index of a node inside a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Scene,
    Group,
    Object,
    Camera,
    Mesh,
}

impl NodeKind {
    /// Lower-case tag used when a node has no authored name.
    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::Scene => "scene",
            NodeKind::Group => "group",
            NodeKind::Object => "object",
            NodeKind::Camera => "camera",
            NodeKind::Mesh => "mesh",
        }
    }

    pub fn is_drawable(self) -> bool {
        matches!(self, NodeKind::Mesh)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Aabb {
    pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self { min, max }
    }

    pub fn update(&mut self, point: [f32; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(point[axis]);
            self.max[axis] = self.max[axis].max(point[axis]);
        }
    }

    pub fn include_bounds(&mut self, other: &Aabb) {
        self.update(other.min);
        self.update(other.max);
    }

    pub fn center(&self) -> Vec3 {
        (Vec3::from(self.min) + Vec3::from(self.max)) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        Vec3::from(self.max) - Vec3::from(self.min)
    }

    pub fn corners(&self) -> [[f32; 3]; 8] {
        let [x0, y0, z0] = self.min;
        let [x1, y1, z1] = self.max;
        [
            [x0, y0, z0],
            [x1, y0, z0],
            [x0, y1, z0],
            [x1, y1, z0],
            [x0, y0, z1],
            [x1, y0, z1],
            [x0, y1, z1],
            [x1, y1, z1],
        ]
    }

    /// Bounds of this box after applying `transform` to each corner.
    pub fn transformed(&self, transform: &Mat4) -> Aabb {
        let corners = self.corners();
        let first = transform.transform_point3(Vec3::from(corners[0])).to_array();
        let mut out = Aabb::new(first, first);
        for corner in &corners[1..] {
            out.update(transform.transform_point3(Vec3::from(*corner)).to_array());
        }
        out
    }
}

/// Rendering switches the viewer forces on every drawable after a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RenderFlags {
    pub double_sided: bool,
    pub depth_write: bool,
    pub depth_test: bool,
    pub polygon_offset: bool,
}

impl RenderFlags {
    pub const NORMALIZED: RenderFlags = RenderFlags {
        double_sided: true,
        depth_write: true,
        depth_test: true,
        polygon_offset: true,
    };
}

/// Drawable payload attached to `Mesh` nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Primitive {
    pub local_bounds: Option<Aabb>,
    pub flags: RenderFlags,
    #[serde(skip)]
    world_bounds: Option<Aabb>,
}

impl Primitive {
    pub fn new(local_bounds: Option<Aabb>) -> Self {
        Self {
            local_bounds,
            flags: RenderFlags::default(),
            world_bounds: None,
        }
    }

    pub fn cached_world_bounds(&self) -> Option<Aabb> {
        self.world_bounds
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneNode {
    pub name: Option<String>,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Column-major local transform relative to the parent.
    pub local_transform: [[f32; 4]; 4],
    pub primitive: Option<Primitive>,
}

impl SceneNode {
    /// Authored name, treating an empty string as missing.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }

    /// Authored name or `unnamed_<kind>`.
    pub fn display_name(&self) -> String {
        match self.name() {
            Some(name) => name.to_string(),
            None => format!("unnamed_{}", self.kind.tag()),
        }
    }

    pub fn is_drawable(&self) -> bool {
        self.kind.is_drawable() && self.primitive.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SceneGraph {
    pub fn new(scene_name: Option<String>) -> Self {
        Self {
            nodes: vec![SceneNode {
                name: scene_name,
                kind: NodeKind::Scene,
                parent: None,
                children: Vec::new(),
                local_transform: Mat4::IDENTITY.to_cols_array_2d(),
                primitive: None,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn nodes(&self) -> impl ExactSizeIterator<Item = (NodeId, &SceneNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (NodeId(idx), node))
    }

    /// Append a non-drawable node under `parent`. Returns `None` when `parent`
    /// is not a node of this graph.
    pub fn add_node(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        name: Option<&str>,
    ) -> Option<NodeId> {
        self.push(parent, kind, name, None)
    }

    /// Append a drawable primitive under `parent`.
    pub fn add_mesh(
        &mut self,
        parent: NodeId,
        name: Option<&str>,
        bounds: Option<Aabb>,
    ) -> Option<NodeId> {
        self.push(parent, NodeKind::Mesh, name, Some(Primitive::new(bounds)))
    }

    pub fn set_local_transform(&mut self, id: NodeId, transform: Mat4) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.local_transform = transform.to_cols_array_2d();
        }
        self.invalidate_bounds();
    }

    fn push(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        name: Option<&str>,
        primitive: Option<Primitive>,
    ) -> Option<NodeId> {
        let id = NodeId(self.nodes.len());
        self.nodes.get_mut(parent.0)?.children.push(id);
        self.nodes.push(SceneNode {
            name: name.map(str::to_string),
            kind,
            parent: Some(parent),
            children: Vec::new(),
            local_transform: Mat4::IDENTITY.to_cols_array_2d(),
            primitive,
        });
        Some(id)
    }

    /// Ancestors of `id` ordered from the node's parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            graph: self,
            next: self.node(id).and_then(|node| node.parent),
        }
    }

    /// Depth-first pre-order walk that yields every node exactly once.
    pub fn traverse(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(node) = self.node(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    pub fn drawables(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.traverse()
            .into_iter()
            .filter(move |id| self.node(*id).is_some_and(SceneNode::is_drawable))
    }

    pub fn world_transform(&self, id: NodeId) -> Mat4 {
        let mut transform = self
            .node(id)
            .map(|node| Mat4::from_cols_array_2d(&node.local_transform))
            .unwrap_or(Mat4::IDENTITY);
        for ancestor in self.ancestors(id) {
            transform = Mat4::from_cols_array_2d(&ancestor.1.local_transform) * transform;
        }
        transform
    }

    /// World-space bounds of a drawable, computed on first use and cached.
    pub fn ensure_world_bounds(&mut self, id: NodeId) -> Option<Aabb> {
        if let Some(cached) = self
            .node(id)
            .and_then(|node| node.primitive.as_ref())
            .and_then(Primitive::cached_world_bounds)
        {
            return Some(cached);
        }
        let local = self.node(id)?.primitive.as_ref()?.local_bounds?;
        let world = local.transformed(&self.world_transform(id));
        if let Some(primitive) = self.node_mut(id).and_then(|node| node.primitive.as_mut()) {
            primitive.world_bounds = Some(world);
        }
        Some(world)
    }

    fn invalidate_bounds(&mut self) {
        for node in &mut self.nodes {
            if let Some(primitive) = node.primitive.as_mut() {
                primitive.world_bounds = None;
            }
        }
    }
}

pub struct Ancestors<'a> {
    graph: &'a SceneGraph,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = (NodeId, &'a SceneNode);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.graph.node(id)?;
        self.next = node.parent;
        Some((id, node))
    }
}
