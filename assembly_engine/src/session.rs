//! Presentation core that owns every engine component and routes user
//! actions between them.
//!
//! Handlers named after user actions (`apply_upload`, `import_instructions`,
//! `save_step`) never return errors: failures are turned into notices and
//! the session is left as it was. The `try_*` variants expose the underlying
//! [`AssemblyResult`] for callers that want it.

use std::collections::BTreeSet;
use std::time::Duration;

use assembly_formats::{
    ArchiveEntry, InstructionDocument, ModelFormat, NodeId, SceneGraph, UploadError, UploadKind,
    select_bundle,
};
use chrono::{DateTime, Utc};

use crate::config::ViewerConfig;
use crate::error::{AssemblyError, AssemblyResult};
use crate::focus::{self, FocusPlan, OrbitCamera};
use crate::hierarchy::{Coverage, PartTree};
use crate::instructions::{InstructionModel, StepPatch};
use crate::loader::{LoadState, SceneLoader};
use crate::navigation::{AutoPlay, StepNavigator};
use crate::notify::NoticeBoard;
use crate::registry::PartRegistry;
use crate::resolver::{
    self, DisplayMode, DisplayPolicy, HighlightSource, ResolveRequest, Resolution,
};

/// Identifies one upload request. Only the most recent ticket is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UploadTicket(u64);

/// One item of a completed upload batch.
#[derive(Debug, Clone)]
pub enum UploadItem {
    File {
        name: String,
        bytes: Vec<u8>,
    },
    /// Result of the external archive reader for `name`.
    Archive {
        name: String,
        entries: Result<Vec<ArchiveEntry>, String>,
    },
}

impl UploadItem {
    pub fn file(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        UploadItem::File {
            name: name.into(),
            bytes,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            UploadItem::File { name, .. } | UploadItem::Archive { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadSummary {
    pub model: Option<String>,
    pub parts: usize,
    pub steps: Option<usize>,
}

/// The currently loaded model resource. Dropped when a new model arrives.
#[derive(Debug, Clone)]
pub struct ModelHandle {
    pub name: String,
    pub format: ModelFormat,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub struct AssemblySession {
    config: ViewerConfig,
    loader: SceneLoader,
    graph: Option<SceneGraph>,
    model: Option<ModelHandle>,
    registry: PartRegistry,
    tree: PartTree,
    instructions: InstructionModel,
    navigator: StepNavigator,
    autoplay: AutoPlay,
    mode: DisplayMode,
    camera: OrbitCamera,
    notices: NoticeBoard,
    authoring: BTreeSet<String>,
    editing: Option<u32>,
    resolution: Resolution,
    issued_tickets: u64,
    pending_ticket: Option<UploadTicket>,
}

impl Default for AssemblySession {
    fn default() -> Self {
        AssemblySession::new(ViewerConfig::default())
    }
}

impl AssemblySession {
    pub fn new(config: ViewerConfig) -> Self {
        let autoplay = AutoPlay::new(config.autoplay.interval());
        let camera = OrbitCamera::new(config.focus.fov_degrees);
        let mode = config.display.mode;
        Self {
            config,
            loader: SceneLoader::default(),
            graph: None,
            model: None,
            registry: PartRegistry::default(),
            tree: PartTree::default(),
            instructions: InstructionModel::new(),
            navigator: StepNavigator::new(0),
            autoplay,
            mode,
            camera,
            notices: NoticeBoard::default(),
            authoring: BTreeSet::new(),
            editing: None,
            resolution: Resolution::default(),
            issued_tickets: 0,
            pending_ticket: None,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn load_state(&self) -> LoadState {
        self.loader.state()
    }

    pub fn graph(&self) -> Option<&SceneGraph> {
        self.graph.as_ref()
    }

    pub fn model(&self) -> Option<&ModelHandle> {
        self.model.as_ref()
    }

    pub fn registry(&self) -> &PartRegistry {
        &self.registry
    }

    pub fn part_tree(&self) -> &PartTree {
        &self.tree
    }

    pub fn instructions(&self) -> &InstructionModel {
        &self.instructions
    }

    pub fn navigator(&self) -> &StepNavigator {
        &self.navigator
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut NoticeBoard {
        &mut self.notices
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn is_playing(&self) -> bool {
        self.autoplay.is_playing()
    }

    /// Parse and install a model. On failure the previous model stays loaded.
    pub fn load_model(
        &mut self,
        name: &str,
        format: ModelFormat,
        bytes: Vec<u8>,
    ) -> AssemblyResult<usize> {
        let graph = SceneGraph::from_gltf_slice(&bytes)
            .map_err(|err| AssemblyError::resource(format!("could not load {name}: {err:#}")))?;
        if let Some(previous) = self.model.take() {
            log::debug!("releasing model {}", previous.name);
        }
        self.model = Some(ModelHandle {
            name: name.to_string(),
            format,
            bytes,
        });
        Ok(self.install_graph(graph))
    }

    /// Install an already-built scene graph, replacing whatever was loaded.
    pub fn install_graph(&mut self, graph: SceneGraph) -> usize {
        self.registry.reset_all();
        self.loader.reset();
        self.authoring.clear();
        self.editing = None;
        self.graph = Some(graph);
        self.loader.begin();
        self.initialize_scene();
        self.registry.len()
    }

    /// Derive parts for the current graph. Only the first call after a load
    /// has an effect; later calls leave the registry untouched.
    pub fn initialize_scene(&mut self) -> bool {
        let Some(graph) = self.graph.as_mut() else {
            return false;
        };
        let Some(loaded) = self.loader.initialize(graph, &self.config.render) else {
            return false;
        };
        if !loaded.collisions.is_empty() {
            self.notices.warn(format!(
                "{} parts share a path with another part; only the last one can be focused",
                loaded.collisions.len()
            ));
        }
        self.registry.seed(loaded);
        self.tree = PartTree::from_paths(self.registry.part_paths());
        self.refresh_visibility();
        true
    }

    /// Start a new upload. Completions for older tickets are discarded.
    pub fn begin_upload(&mut self) -> UploadTicket {
        self.issued_tickets += 1;
        let ticket = UploadTicket(self.issued_tickets);
        self.pending_ticket = Some(ticket);
        ticket
    }

    /// Apply a completed upload batch. Returns `false` when the batch was
    /// stale or failed; failures are reported as notices.
    pub fn apply_upload(&mut self, ticket: UploadTicket, items: Vec<UploadItem>) -> bool {
        match self.try_apply_upload(ticket, items) {
            Ok(Some(summary)) => {
                let mut message = match &summary.model {
                    Some(model) => format!("loaded {model} with {} parts", summary.parts),
                    None => String::from("upload applied"),
                };
                if let Some(steps) = summary.steps {
                    message.push_str(&format!(", {steps} instruction steps"));
                }
                self.notices.info(message);
                true
            }
            Ok(None) => false,
            Err(err) => {
                self.notices.report(&err);
                false
            }
        }
    }

    /// Model files are applied before instruction files regardless of their
    /// order in the batch. `Ok(None)` means the ticket was stale.
    pub fn try_apply_upload(
        &mut self,
        ticket: UploadTicket,
        items: Vec<UploadItem>,
    ) -> AssemblyResult<Option<UploadSummary>> {
        if self.pending_ticket != Some(ticket) {
            log::debug!("discarding stale upload {ticket:?}");
            return Ok(None);
        }
        self.pending_ticket = None;

        let mut model: Option<(String, ModelFormat, Vec<u8>)> = None;
        let mut instructions: Option<(String, Vec<u8>)> = None;
        for item in items {
            match item {
                UploadItem::File { name, bytes } => match UploadKind::from_file_name(&name)? {
                    UploadKind::Model(format) => {
                        if model.is_none() {
                            model = Some((name, format, bytes));
                        }
                    }
                    UploadKind::Instructions => {
                        if instructions.is_none() {
                            instructions = Some((name, bytes));
                        }
                    }
                    UploadKind::Archive => {
                        return Err(AssemblyError::resource(format!(
                            "archive {name} must be extracted before it is applied"
                        )));
                    }
                },
                UploadItem::Archive { name, entries } => {
                    let entries = entries.map_err(UploadError::Extraction)?;
                    let bundle = select_bundle(entries)?;
                    log::debug!("archive {name} provided {}", bundle.model.name);
                    if model.is_none() {
                        let file_name = bundle.model.file_name().to_string();
                        model = Some((file_name, bundle.format, bundle.model.bytes));
                    }
                    if instructions.is_none() {
                        if let Some(entry) = bundle.instructions {
                            instructions = Some((entry.file_name().to_string(), entry.bytes));
                        }
                    }
                }
            }
        }

        let text = instructions
            .map(|(name, bytes)| {
                String::from_utf8(bytes)
                    .map_err(|_| AssemblyError::resource(format!("{name} is not UTF-8 text")))
            })
            .transpose()?;
        // Reject a malformed instruction file before the model replaces the scene.
        let document = text
            .as_deref()
            .map(InstructionDocument::parse)
            .transpose()?;

        let mut summary = UploadSummary::default();
        if let Some((name, format, bytes)) = model {
            summary.parts = self.load_model(&name, format, bytes)?;
            summary.model = Some(name);
        }
        if let Some(document) = document {
            let instructions = InstructionModel::from_document(document);
            summary.steps = Some(self.install_instructions(instructions));
        }
        Ok(Some(summary))
    }

    pub fn import_instructions(&mut self, text: &str) -> bool {
        match self.try_import_instructions(text) {
            Ok(count) => {
                self.notices.info(format!("imported {count} instruction steps"));
                true
            }
            Err(err) => {
                self.notices.report(&err);
                false
            }
        }
    }

    /// Replace all steps; on error nothing changes.
    pub fn try_import_instructions(&mut self, text: &str) -> AssemblyResult<usize> {
        let document = InstructionDocument::parse(text)?;
        Ok(self.install_instructions(InstructionModel::from_document(document)))
    }

    fn install_instructions(&mut self, instructions: InstructionModel) -> usize {
        self.instructions = instructions;
        let count = self.instructions.len();
        self.editing = None;
        self.authoring.clear();
        self.navigator = StepNavigator::new(count);
        self.autoplay.pause();
        self.refresh_visibility();
        count
    }

    pub fn export_instructions(&self, created_at: DateTime<Utc>) -> InstructionDocument {
        self.instructions.export_snapshot(created_at)
    }

    pub fn export_json(&self, created_at: DateTime<Utc>, pretty: bool) -> AssemblyResult<String> {
        Ok(self.export_instructions(created_at).to_json(pretty)?)
    }

    pub fn add_step(
        &mut self,
        name: &str,
        description: Option<&str>,
        parts: Vec<String>,
    ) -> AssemblyResult<u32> {
        let id = self.instructions.add_step(name, description, parts)?.id;
        self.after_structure_change();
        Ok(id)
    }

    pub fn update_step(&mut self, id: u32, patch: StepPatch) -> AssemblyResult<bool> {
        let changed = self.instructions.update_step(id, patch)?;
        if changed {
            self.refresh_visibility();
        }
        Ok(changed)
    }

    /// Delete a step. A step being edited keeps its edit across the
    /// renumbering; deleting the edited step itself ends the edit.
    pub fn delete_step(&mut self, id: u32) -> bool {
        if !self.instructions.delete_step(id) {
            return false;
        }
        self.editing = match self.editing {
            Some(editing) if editing == id => None,
            Some(editing) if editing > id => Some(editing - 1),
            other => other,
        };
        self.after_structure_change();
        true
    }

    /// Move the step at display position `from` to `to` (zero-based).
    pub fn reorder_steps(&mut self, from: usize, to: usize) -> AssemblyResult<()> {
        self.instructions.reorder(from, to)?;
        self.editing = None;
        self.after_structure_change();
        Ok(())
    }

    fn after_structure_change(&mut self) {
        self.navigator.set_step_count(self.instructions.len());
        self.refresh_visibility();
    }

    pub fn authoring_selection(&self) -> &BTreeSet<String> {
        &self.authoring
    }

    pub fn editing_step(&self) -> Option<u32> {
        self.editing
    }

    /// Toggle one part in the authoring selection. Unknown parts are ignored.
    pub fn toggle_part_selection(&mut self, path: &str) -> bool {
        if !self.registry.contains(path) {
            return false;
        }
        if !self.authoring.remove(path) {
            self.authoring.insert(path.to_string());
        }
        true
    }

    /// Select every part under `path`, or deselect them all when the group is
    /// already fully selected.
    pub fn toggle_group_selection(&mut self, path: &str) -> Coverage {
        let leaves: Vec<String> = self
            .tree
            .leaf_paths(path)
            .into_iter()
            .map(str::to_string)
            .collect();
        if self.tree.selection_coverage(path, &self.authoring) == Coverage::Full {
            for leaf in &leaves {
                self.authoring.remove(leaf);
            }
        } else {
            self.authoring.extend(leaves);
        }
        self.tree.selection_coverage(path, &self.authoring)
    }

    pub fn selection_coverage(&self, path: &str) -> Coverage {
        self.tree.selection_coverage(path, &self.authoring)
    }

    pub fn clear_authoring(&mut self) {
        self.authoring.clear();
        self.editing = None;
        self.refresh_visibility();
    }

    /// Load an existing step into the authoring selection for editing.
    pub fn begin_edit(&mut self, id: u32) -> bool {
        let Some(step) = self.instructions.get(id) else {
            return false;
        };
        self.authoring = step.parts.iter().cloned().collect();
        self.editing = Some(id);
        self.refresh_visibility();
        true
    }

    /// Save the authoring selection as a new step, or into the step being
    /// edited. Returns the step id on success.
    pub fn save_step(&mut self, name: &str, description: Option<&str>) -> Option<u32> {
        match self.try_save_step(name, description) {
            Ok(id) => {
                self.notices.info(format!("saved step {id}"));
                Some(id)
            }
            Err(err) => {
                self.notices.report(&err);
                None
            }
        }
    }

    pub fn try_save_step(&mut self, name: &str, description: Option<&str>) -> AssemblyResult<u32> {
        let parts: Vec<String> = self.authoring.iter().cloned().collect();
        let id = match self.editing {
            Some(id) => {
                let patch = StepPatch {
                    name: Some(name.to_string()),
                    description: Some(description.map(str::to_string)),
                    parts: Some(parts),
                };
                if !self.instructions.update_step(id, patch)? {
                    return Err(AssemblyError::resource(format!("step {id} no longer exists")));
                }
                id
            }
            None => self.instructions.add_step(name, description, parts)?.id,
        };
        self.authoring.clear();
        self.editing = None;
        self.after_structure_change();
        Ok(id)
    }

    pub fn set_part_visibility(&mut self, path: &str, visible: bool) -> bool {
        self.registry.set_visibility(path, visible)
    }

    /// Set every part under `path`. Returns how many parts changed.
    pub fn set_group_visibility(&mut self, path: &str, visible: bool) -> usize {
        let leaves: Vec<String> = self
            .tree
            .leaf_paths(path)
            .into_iter()
            .map(str::to_string)
            .collect();
        leaves
            .iter()
            .filter(|leaf| self.registry.set_visibility(leaf, visible))
            .count()
    }

    pub fn next_step(&mut self) -> bool {
        let moved = self.navigator.next();
        if moved {
            self.refresh_visibility();
        }
        moved
    }

    pub fn previous_step(&mut self) -> bool {
        let moved = self.navigator.previous();
        if moved {
            self.refresh_visibility();
        }
        moved
    }

    pub fn jump_to_step(&mut self, index: usize) -> bool {
        let moved = self.navigator.jump_to(index);
        if moved {
            self.refresh_visibility();
        }
        moved
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        self.refresh_visibility();
        true
    }

    pub fn play(&mut self) {
        self.autoplay.play(&mut self.navigator);
        self.refresh_visibility();
    }

    pub fn pause(&mut self) {
        self.autoplay.pause();
    }

    /// Drive time-based state: auto-play and notice expiry.
    pub fn tick(&mut self, elapsed: Duration) -> usize {
        self.notices.tick(elapsed);
        let advanced = self.autoplay.tick(elapsed, &mut self.navigator);
        if advanced > 0 {
            self.refresh_visibility();
        }
        advanced
    }

    fn resolve_request(&self) -> ResolveRequest {
        let highlight = match self.editing {
            Some(id) => HighlightSource::Step(id),
            None => HighlightSource::CurrentStep,
        };
        ResolveRequest {
            step_index: self.navigator.index(),
            mode: self.mode,
            highlight,
        }
    }

    /// Resolve the current cursor without committing anything.
    pub fn resolve_current(&self) -> Resolution {
        resolver::resolve(
            self.registry.part_paths(),
            self.instructions.steps(),
            &self.resolve_request(),
            &DisplayPolicy::from(&self.config.display),
        )
    }

    /// Recompute visibility for the current cursor and commit it only when it
    /// differs from the registry. Without instructions every part is shown.
    pub fn refresh_visibility(&mut self) -> bool {
        let resolution = self.resolve_current();
        let changed = if self.instructions.is_empty() {
            self.registry.show_all()
        } else {
            self.registry.apply_visibility(&resolution.visible)
        };
        self.resolution = resolution;
        changed
    }

    pub fn focus_part(&mut self, path: &str) -> Option<FocusPlan> {
        let nodes = self.registry.drawables_for([path]);
        self.focus_nodes(nodes)
    }

    pub fn focus_step(&mut self, id: u32) -> Option<FocusPlan> {
        let step = self.instructions.get(id)?;
        let nodes = self.registry.drawables_for(step.parts());
        self.focus_nodes(nodes)
    }

    fn focus_nodes(&mut self, nodes: Vec<NodeId>) -> Option<FocusPlan> {
        self.registry.set_selection(nodes);
        let plan = match self.graph.as_mut() {
            Some(graph) => focus::focus(
                graph,
                self.registry.selection(),
                &mut self.camera,
                &self.config.focus,
            ),
            None => None,
        };
        self.registry.clear_selection();
        plan
    }

    /// Drop the model, parts and instructions and return to `Unloaded`.
    pub fn reset(&mut self) {
        self.registry.reset_all();
        self.loader.reset();
        self.graph = None;
        self.model = None;
        self.tree = PartTree::default();
        self.instructions.clear();
        self.navigator = StepNavigator::new(0);
        self.autoplay.pause();
        self.authoring.clear();
        self.editing = None;
        self.resolution = Resolution::default();
        self.pending_ticket = None;
    }
}
