use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Result, bail};
use assembly_engine::DisplayMode;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    about = "Headless assembly-instruction viewer: load a glTF model and step through its instructions",
    version
)]
pub struct Args {
    /// glTF/GLB model to load
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Instruction JSON to import after the model
    #[arg(long)]
    pub instructions: Option<PathBuf>,

    /// Directory whose model and instruction files are uploaded as one batch
    #[arg(long)]
    pub upload_dir: Option<PathBuf>,

    /// Optional viewer configuration JSON
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Step cursor to resolve (0 = overview)
    #[arg(long)]
    pub step: Option<usize>,

    /// Display mode: cumulative/all or isolated/selected
    #[arg(long)]
    pub mode: Option<DisplayMode>,

    /// Print visibility for every step from the overview to the last step
    #[arg(long)]
    pub walk: bool,

    /// Print the part hierarchy with visibility markers
    #[arg(long)]
    pub tree: bool,

    /// Append a step with this name (requires --parts)
    #[arg(long, value_name = "NAME")]
    pub add_step: Option<String>,

    /// Comma-separated part paths for --add-step or --update-step
    #[arg(long, value_delimiter = ',')]
    pub parts: Vec<String>,

    /// Step description for --add-step or --update-step
    #[arg(long)]
    pub description: Option<String>,

    /// Edit the step with this id using --name, --description and --parts
    #[arg(long, value_name = "ID")]
    pub update_step: Option<u32>,

    /// New name for --update-step
    #[arg(long)]
    pub name: Option<String>,

    /// Delete the step with this id
    #[arg(long, value_name = "ID")]
    pub delete_step: Option<u32>,

    /// Move a step between 1-based positions, e.g. 3:1
    #[arg(long, value_name = "FROM:TO")]
    pub move_step: Option<MoveSpec>,

    /// Frame a single part and print the camera placement
    #[arg(long, value_name = "PATH")]
    pub focus_part: Option<String>,

    /// Frame every part of a step and print the camera placement
    #[arg(long, value_name = "ID")]
    pub focus_step: Option<u32>,

    /// Simulate auto-play from the overview to the last step
    #[arg(long)]
    pub autoplay: bool,

    /// Write the instruction document to this path
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Pretty-print exported JSON
    #[arg(long)]
    pub pretty: bool,
}

/// `FROM:TO` pair of 1-based step positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveSpec {
    pub from: usize,
    pub to: usize,
}

impl MoveSpec {
    /// Zero-based `(from, to)` indices.
    pub fn indices(self) -> (usize, usize) {
        (self.from - 1, self.to - 1)
    }
}

impl FromStr for MoveSpec {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (from, to) = value
            .split_once(':')
            .ok_or_else(|| format!("expected FROM:TO, got {value:?}"))?;
        let parse = |raw: &str| -> Result<usize, String> {
            match raw.trim().parse::<usize>() {
                Ok(position) if position > 0 => Ok(position),
                _ => Err(format!("step positions start at 1 (got {raw:?})")),
            }
        };
        Ok(MoveSpec {
            from: parse(from)?,
            to: parse(to)?,
        })
    }
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        if self.add_step.is_some() && self.update_step.is_some() {
            bail!("--add-step and --update-step cannot be combined");
        }
        if self.add_step.is_some() && self.parts.is_empty() {
            bail!("--add-step requires --parts");
        }
        if self.name.is_some() && self.update_step.is_none() {
            bail!("--name requires --update-step");
        }
        let editing = self.add_step.is_some() || self.update_step.is_some();
        if !editing && (!self.parts.is_empty() || self.description.is_some()) {
            bail!("--parts and --description require --add-step or --update-step");
        }
        if self.pretty && self.export.is_none() {
            bail!("--pretty requires --export");
        }
        Ok(())
    }

    pub fn parts(&self) -> Vec<String> {
        self.parts
            .iter()
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect()
    }
}
