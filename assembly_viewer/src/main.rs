mod cli;
mod upload;

use std::fs;

use anyhow::{Context, Result, anyhow, bail};
use assembly_engine::{AssemblySession, FocusPlan, Resolution, StepPatch, ViewerConfig};
use chrono::Utc;
use clap::Parser;

use crate::cli::Args;

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();

    args.validate()?;

    let config = match args.config.as_ref() {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    let render = &config.render;
    println!(
        "Renderer: resource cache {}, material normalization {}",
        on_off(render.resource_cache),
        on_off(render.normalize_materials)
    );
    let mut session = AssemblySession::new(config);

    let mut items = Vec::new();
    if let Some(dir) = args.upload_dir.as_ref() {
        items.extend(upload::collect_dir(dir)?);
    }
    if let Some(path) = args.model.as_ref() {
        items.push(upload::read_file(path)?);
    }
    if let Some(path) = args.instructions.as_ref() {
        items.push(upload::read_file(path)?);
    }
    if !items.is_empty() {
        let ticket = session.begin_upload();
        let summary = session
            .try_apply_upload(ticket, items)
            .context("applying upload batch")?
            .ok_or_else(|| anyhow!("upload was superseded"))?;
        if let Some(model) = summary.model.as_ref() {
            println!("Loaded {} ({} parts)", model, summary.parts);
            for collision in session.registry().collisions() {
                println!(
                    "  path collision: {:?} (node {} replaced by node {})",
                    collision.path,
                    collision.replaced.index(),
                    collision.kept.index()
                );
            }
        }
        if let Some(steps) = summary.steps {
            println!("Imported {steps} instruction steps");
        }
    }

    apply_edits(&args, &mut session)?;

    if let Some(mode) = args.mode {
        session.set_display_mode(mode);
    }
    if let Some(step) = args.step {
        session.jump_to_step(step);
    }

    if args.tree {
        println!("Part tree:");
        for line in session.part_tree().outline(session.registry().visible_parts()) {
            println!("  {line}");
        }
    }

    if args.walk {
        walk_steps(&mut session);
    } else if args.step.is_some() || args.mode.is_some() {
        print_resolution(&session, session.resolution());
    }

    if args.autoplay {
        run_autoplay(&mut session);
    }

    if let Some(path) = args.focus_part.as_deref() {
        match session.focus_part(path) {
            Some(plan) => print_focus(&format!("part {path:?}"), &plan),
            None => println!("Nothing to focus for part {path:?}"),
        }
    }
    if let Some(id) = args.focus_step {
        match session.focus_step(id) {
            Some(plan) => print_focus(&format!("step {id}"), &plan),
            None => println!("Nothing to focus for step {id}"),
        }
    }

    if let Some(path) = args.export.as_ref() {
        let json = session.export_json(Utc::now(), args.pretty)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!(
            "Exported {} steps to {}",
            session.instructions().len(),
            path.display()
        );
    }

    for notice in session.notices_mut().drain() {
        println!("[{}] {}", notice.level, notice.message);
    }

    Ok(())
}

fn apply_edits(args: &Args, session: &mut AssemblySession) -> Result<()> {
    if let Some(name) = args.add_step.as_deref() {
        let id = session
            .add_step(name, args.description.as_deref(), args.parts())
            .context("adding step")?;
        println!("Added step {id}: {name}");
    }

    if let Some(id) = args.update_step {
        let patch = StepPatch {
            name: args.name.clone(),
            description: args.description.clone().map(Some),
            parts: (!args.parts.is_empty()).then(|| args.parts()),
        };
        if session.update_step(id, patch).context("updating step")? {
            println!("Updated step {id}");
        } else {
            println!("No step with id {id}; nothing updated");
        }
    }

    if let Some(id) = args.delete_step {
        if session.delete_step(id) {
            println!("Deleted step {id}; {} steps remain", session.instructions().len());
        } else {
            println!("No step with id {id}; nothing deleted");
        }
    }

    if let Some(spec) = args.move_step {
        let (from, to) = spec.indices();
        let len = session.instructions().len();
        if from >= len || to >= len {
            bail!("--move-step {}:{} is out of range for {len} steps", spec.from, spec.to);
        }
        session.reorder_steps(from, to).context("moving step")?;
        println!("Moved step {} to position {}", spec.from, spec.to);
    }

    Ok(())
}

fn walk_steps(session: &mut AssemblySession) {
    let count = session.instructions().len();
    for index in 0..=count {
        session.jump_to_step(index);
        print_resolution(session, session.resolution());
    }
}

fn run_autoplay(session: &mut AssemblySession) {
    if session.instructions().is_empty() {
        println!("Auto-play needs at least one step");
        return;
    }
    let interval = session.config().autoplay.interval();
    session.jump_to_step(0);
    session.play();
    println!("Auto-play every {} ms", interval.as_millis());
    while session.is_playing() {
        if session.tick(interval) == 0 {
            break;
        }
        print_resolution(session, session.resolution());
    }
}

fn step_label(session: &AssemblySession) -> String {
    let index = session.navigator().index();
    if index == 0 {
        return String::from("overview");
    }
    match session.instructions().steps().get(index - 1) {
        Some(step) => format!("step {} {:?}", step.id, step.name),
        None => format!("step {index}"),
    }
}

fn print_resolution(session: &AssemblySession, resolution: &Resolution) {
    println!(
        "[{}] {} ({}): {} of {} parts visible",
        session.navigator().index(),
        step_label(session),
        session.display_mode(),
        resolution.visible_count(),
        resolution.visible.len()
    );
    for path in resolution.visible_parts() {
        let mut tags = Vec::new();
        if resolution.highlighted.contains(path) {
            match resolution.tint {
                Some([r, g, b]) => tags.push(format!("highlight {r:.2} {g:.2} {b:.2}")),
                None => tags.push(String::from("highlight")),
            }
        }
        if let Some(opacity) = resolution
            .translucent_opacity
            .filter(|_| resolution.translucent.contains(path))
        {
            tags.push(format!("opacity {opacity:.2}"));
        }
        if tags.is_empty() {
            println!("    {path}");
        } else {
            println!("    {path} [{}]", tags.join(", "));
        }
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

fn print_focus(label: &str, plan: &FocusPlan) {
    println!(
        "Focus {label}: target [{:.3}, {:.3}, {:.3}] position [{:.3}, {:.3}, {:.3}] distance {:.3}",
        plan.target[0],
        plan.target[1],
        plan.target[2],
        plan.position[0],
        plan.position[1],
        plan.position[2],
        plan.distance
    );
}
