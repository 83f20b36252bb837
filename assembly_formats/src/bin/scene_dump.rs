//! Print the node table of a glTF/GLB scene, or dump it as JSON.

use std::path::PathBuf;

use anyhow::Result;
use assembly_formats::SceneGraph;
use clap::Parser;

/// Inspect the scene graph that the viewer builds from a model file.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Path to the `.glb` or `.gltf` model to inspect
    path: PathBuf,

    /// Emit the node table as JSON instead of an indented listing
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let graph = SceneGraph::from_gltf_path(&args.path)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&graph)?);
        return Ok(());
    }

    println!(
        "{} nodes, {} drawables in {}",
        graph.len(),
        graph.drawables().count(),
        args.path.display()
    );
    for id in graph.traverse() {
        let Some(node) = graph.node(id) else {
            continue;
        };
        let depth = graph.ancestors(id).count();
        let bounds = node
            .primitive
            .as_ref()
            .and_then(|primitive| primitive.local_bounds)
            .map(|bounds| {
                format!(
                    "  [{:.3}, {:.3}, {:.3}] .. [{:.3}, {:.3}, {:.3}]",
                    bounds.min[0],
                    bounds.min[1],
                    bounds.min[2],
                    bounds.max[0],
                    bounds.max[1],
                    bounds.max[2]
                )
            })
            .unwrap_or_default();
        println!(
            "{:>5}  {:<7} {}{}{}",
            id.index(),
            node.kind.tag(),
            "  ".repeat(depth),
            node.display_name(),
            bounds
        );
    }

    Ok(())
}
