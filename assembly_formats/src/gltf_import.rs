//! Build a [`SceneGraph`] from a glTF 2.0 document (`.gltf` JSON or `.glb`).
//!
//! Only the document is parsed; buffers are never resolved because primitive
//! bounds come straight from the POSITION accessor min/max. A glTF node that
//! carries a mesh becomes a `Group` whose `Mesh` children are the primitives,
//! so the node's own name always lands in the part path of its primitives.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::scene::{Aabb, NodeId, NodeKind, SceneGraph};

impl SceneGraph {
    pub fn from_gltf_slice(bytes: &[u8]) -> Result<Self> {
        let gltf = gltf::Gltf::from_slice(bytes).context("parsing glTF document")?;
        import_document(&gltf.document)
    }

    pub fn from_gltf_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_gltf_slice(&bytes).with_context(|| format!("importing {}", path.display()))
    }
}

fn import_document(document: &gltf::Document) -> Result<SceneGraph> {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| anyhow!("glTF document does not define any scene"))?;

    let mut graph = SceneGraph::new(scene.name().map(str::to_string));
    let mut visited: HashSet<usize> = HashSet::new();
    let mut stack: Vec<(gltf::Node<'_>, NodeId)> = scene
        .nodes()
        .map(|node| (node, graph.root()))
        .collect();
    stack.reverse();

    while let Some((node, parent)) = stack.pop() {
        if !visited.insert(node.index()) {
            log::warn!(
                "glTF node {} is referenced more than once; keeping the first instance",
                node.index()
            );
            continue;
        }

        let kind = if node.mesh().is_some() {
            NodeKind::Group
        } else if node.camera().is_some() {
            NodeKind::Camera
        } else {
            NodeKind::Object
        };
        let id = graph
            .add_node(parent, kind, node.name())
            .ok_or_else(|| anyhow!("glTF node {} has no parent in the scene", node.index()))?;
        if let Some(scene_node) = graph.node_mut(id) {
            scene_node.local_transform = node.transform().matrix();
        }

        if let Some(mesh) = node.mesh() {
            let primitive_count = mesh.primitives().count();
            let base_name = mesh.name().unwrap_or_default();
            for primitive in mesh.primitives() {
                let name = if primitive_count > 1 && !base_name.is_empty() {
                    format!("{base_name}_{}", primitive.index())
                } else {
                    base_name.to_string()
                };
                let bounds = primitive
                    .get(&gltf::Semantic::Positions)
                    .map(|_| primitive.bounding_box())
                    .map(|bounds| Aabb::new(bounds.min, bounds.max));
                graph
                    .add_mesh(id, Some(name.as_str()), bounds)
                    .ok_or_else(|| anyhow!("mesh {base_name:?} has no parent node"))?;
            }
        }

        let mut children: Vec<_> = node.children().map(|child| (child, id)).collect();
        children.reverse();
        stack.extend(children);
    }

    log::debug!(
        "imported glTF scene {:?}: {} nodes, {} drawables",
        scene.name(),
        graph.len(),
        graph.drawables().count()
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRACKET: &str = include_str!("../tests/fixtures/bracket.gltf");

    #[test]
    fn imports_nodes_as_groups_with_primitive_children() {
        let graph = SceneGraph::from_gltf_slice(BRACKET.as_bytes()).expect("fixture imports");
        let names: Vec<String> = graph
            .nodes()
            .map(|(_, node)| node.display_name())
            .collect();
        assert_eq!(
            names,
            vec![
                "Bracket",
                "Frame",
                "Plate",
                "plate_mesh",
                "Bolt",
                "bolt_mesh",
                "unnamed_object",
                "Washer",
                "washer_mesh",
            ]
        );
        assert_eq!(graph.drawables().count(), 3);
    }

    #[test]
    fn primitive_bounds_come_from_position_accessor() {
        let mut graph = SceneGraph::from_gltf_slice(BRACKET.as_bytes()).expect("fixture imports");
        let plate = graph
            .nodes()
            .find(|(_, node)| node.name() == Some("plate_mesh"))
            .map(|(id, _)| id)
            .expect("plate mesh");
        let bounds = graph.ensure_world_bounds(plate).expect("bounds");
        assert_eq!(bounds.min, [-1.0, 0.0, -1.0]);
        assert_eq!(bounds.max, [1.0, 0.0, 1.0]);

        let bolt = graph
            .nodes()
            .find(|(_, node)| node.name() == Some("bolt_mesh"))
            .map(|(id, _)| id)
            .expect("bolt mesh");
        // Bolt node is translated two units up.
        let bounds = graph.ensure_world_bounds(bolt).expect("bounds");
        assert_eq!(bounds.min[1], 2.0);
    }

    #[test]
    fn path_errors_name_the_file() {
        let mut file = tempfile::Builder::new().suffix(".gltf").tempfile().unwrap();
        std::io::Write::write_all(&mut file, b"{ not json").unwrap();
        let err = SceneGraph::from_gltf_path(file.path()).unwrap_err();
        assert!(
            format!("{err:#}").contains(&file.path().display().to_string()),
            "{err:#}"
        );

        let mut file = tempfile::Builder::new().suffix(".gltf").tempfile().unwrap();
        std::io::Write::write_all(&mut file, BRACKET.as_bytes()).unwrap();
        let graph = SceneGraph::from_gltf_path(file.path()).expect("fixture imports");
        assert_eq!(graph.drawables().count(), 3);
    }

    #[test]
    fn rejects_documents_without_scenes() {
        let doc = r#"{"asset":{"version":"2.0"}}"#;
        let err = SceneGraph::from_gltf_slice(doc.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("scene"), "{err}");
    }
}
