//! The editor context: one diagram plus its interaction, history and save state.

use fl_core::{BlockId, parse_leading_number};
use fl_eval::{DeviceReading, Evaluator};
use fl_graph::{BlockKind, BlockTemplate, Diagram, GraphError, PinRef, Point, Value};
use fl_program::{ProgramInfo, ProgramSpec, from_spec, to_spec};

use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::history::History;
use crate::interaction::{InteractionState, PointerTarget, can_finish_connection, drag_position};
use crate::naming::{DefaultNaming, Naming, filter_invalid_characters};
use crate::params::{ParamEdit, apply_edit};
use crate::projection::{Projection, hit_test, pin_center};
use crate::save::{Persistence, SaveAction, SaveCoordinator, SaveStatus};

/// Input to the editor. Pointer positions are page coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    Load {
        spec: Option<ProgramSpec>,
        displayed_name: String,
    },
    DeviceData(Vec<DeviceReading>),
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    AddBlock(BlockKind),
    DeleteBlock(BlockId),
    RenameBlock { block: BlockId, name: String },
    /// Remove the connection feeding this input pin.
    RemoveConnection(PinRef),
    EditParam { block: BlockId, edit: ParamEdit },
    SetNumberEntry { block: BlockId, text: String },
    Undo,
    SetRunning(bool),
    SaveCompleted { success: bool },
}

/// User-facing messages raised while handling events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// A program holds at most one data storage block.
    DataStorageLimit,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Notice::DataStorageLimit => "Only one data storage block is allowed per program.",
        }
    }
}

/// Editor for a single program.
///
/// Events are handled one at a time to completion. Every change to saved
/// state records a history snapshot and requests a save; derived values are
/// recomputed after anything that can affect them.
pub struct Editor<P, N = DefaultNaming> {
    config: EditorConfig,
    diagram: Diagram,
    info: ProgramInfo,
    evaluator: Evaluator,
    history: History,
    saves: SaveCoordinator,
    state: InteractionState,
    running: bool,
    notices: Vec<Notice>,
    persistence: P,
    naming: N,
}

impl<P: Persistence> Editor<P, DefaultNaming> {
    pub fn new(persistence: P, config: EditorConfig) -> Self {
        Self::with_naming(persistence, DefaultNaming, config)
    }
}

impl<P: Persistence, N: Naming> Editor<P, N> {
    pub fn with_naming(persistence: P, naming: N, config: EditorConfig) -> Self {
        let info = ProgramInfo {
            name: naming.default_program_name(),
            ..ProgramInfo::default()
        };
        let diagram = Diagram::new();
        let mut history = History::new(config.history_capacity);
        history.reset(to_spec(&diagram, &info));
        Self {
            config,
            diagram,
            info,
            evaluator: Evaluator::new(),
            history,
            saves: SaveCoordinator::new(),
            state: InteractionState::Idle,
            running: false,
            notices: Vec::new(),
            persistence,
            naming,
        }
    }

    pub fn handle(&mut self, event: EditorEvent) -> EditorResult<()> {
        match event {
            EditorEvent::Load {
                spec,
                displayed_name,
            } => self.load(spec, &displayed_name),
            EditorEvent::DeviceData(readings) => self.apply_device_data(&readings),
            EditorEvent::PointerDown(page) => self.pointer_down(page),
            EditorEvent::PointerMove(page) => {
                self.pointer_move(page);
                Ok(())
            }
            EditorEvent::PointerUp(page) => self.pointer_up(page),
            EditorEvent::AddBlock(kind) => self.add_block(kind).map(|_| ()),
            EditorEvent::DeleteBlock(id) => self.delete_block(id),
            EditorEvent::RenameBlock { block, name } => self.rename_block(block, &name),
            EditorEvent::RemoveConnection(dest) => self.remove_connection(dest).map(|_| ()),
            EditorEvent::EditParam { block, edit } => self.edit_param(block, &edit),
            EditorEvent::SetNumberEntry { block, text } => self.set_number_entry(block, &text),
            EditorEvent::Undo => self.undo(),
            EditorEvent::SetRunning(running) => {
                self.set_running(running);
                Ok(())
            }
            EditorEvent::SaveCompleted { success } => {
                self.save_completed(success);
                Ok(())
            }
        }
    }

    /// Replace the current program.
    ///
    /// `None` starts an empty program named after the current time, shown as
    /// `displayed_name`. Stored device and timer values are discarded. History
    /// restarts with the loaded state.
    pub fn load(&mut self, spec: Option<ProgramSpec>, displayed_name: &str) -> EditorResult<()> {
        let mut spec = match spec {
            Some(spec) => spec,
            None => ProgramSpec::empty(self.naming.default_program_name(), displayed_name),
        };
        if spec.name.is_empty() {
            spec.name = self.naming.default_program_name();
        }
        for block in &mut spec.blocks {
            if BlockKind::from_type_name(&block.block_type).is_named_source() {
                block.value = None;
            }
        }

        let (diagram, info) = from_spec(&spec)?;
        self.diagram = diagram;
        self.info = info;
        self.evaluator.reset();
        self.state = InteractionState::Idle;
        self.structure_changed()?;
        self.history.reset(self.serialize());
        tracing::info!(
            "Loaded program {} with {} blocks",
            self.info.name,
            self.diagram.len()
        );
        Ok(())
    }

    pub fn serialize(&self) -> ProgramSpec {
        to_spec(&self.diagram, &self.info)
    }

    /// Apply one device data batch. Values are live data, so nothing is
    /// recorded or saved.
    pub fn apply_device_data(&mut self, readings: &[DeviceReading]) -> EditorResult<()> {
        self.evaluator
            .apply_device_data(&mut self.diagram, readings)?;
        Ok(())
    }

    pub fn pointer_down(&mut self, page: Point) -> EditorResult<()> {
        let pointer = self.config.to_canvas(page);
        match hit_test(&self.diagram, pointer, self.config.pin_radius) {
            Some(PointerTarget::Pin(start)) => {
                self.state = InteractionState::DrawingConnection { start, pointer };
            }
            Some(PointerTarget::Block(block)) => {
                if let Some(b) = self.diagram.find_block(block) {
                    let offset = Point::new(b.position.x - pointer.x, b.position.y - pointer.y);
                    self.state = InteractionState::DraggingBlock {
                        block,
                        offset,
                        moved: false,
                    };
                }
            }
            Some(PointerTarget::Connection(dest)) => {
                self.remove_connection(dest)?;
            }
            None => {}
        }
        Ok(())
    }

    pub fn pointer_move(&mut self, page: Point) {
        let pointer = self.config.to_canvas(page);
        match &mut self.state {
            InteractionState::DraggingBlock {
                block,
                offset,
                moved,
            } => {
                if self.running {
                    return;
                }
                let position = drag_position(pointer, *offset);
                if self.diagram.set_position(*block, position).is_ok() {
                    *moved = true;
                }
            }
            InteractionState::DrawingConnection { pointer: end, .. } => *end = pointer,
            InteractionState::Idle => {}
        }
    }

    pub fn pointer_up(&mut self, page: Point) -> EditorResult<()> {
        let pointer = self.config.to_canvas(page);
        match std::mem::take(&mut self.state) {
            InteractionState::DraggingBlock {
                block, moved: true, ..
            } => {
                tracing::debug!("Moved block {}", block);
                self.commit(true);
            }
            InteractionState::DrawingConnection { start, .. } => {
                let Some(PointerTarget::Pin(end)) =
                    hit_test(&self.diagram, pointer, self.config.pin_radius)
                else {
                    return Ok(());
                };
                if !can_finish_connection(start, end) {
                    return Ok(());
                }
                match self.diagram.connect(start, end) {
                    Ok(()) => {
                        self.structure_changed()?;
                        self.commit(false);
                    }
                    Err(err) => tracing::debug!("Ignored connection {:?} -> {:?}: {}", start, end, err),
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Add a block from the palette. A second data storage block is refused
    /// with `Notice::DataStorageLimit` and returns `None`.
    pub fn add_block(&mut self, kind: BlockKind) -> EditorResult<Option<BlockId>> {
        let template = BlockTemplate::for_kind(&kind, &self.info.displayed_name);
        match self.diagram.add_block(template) {
            Ok(id) => {
                self.recompute()?;
                self.commit(false);
                Ok(Some(id))
            }
            Err(GraphError::DataStorageLimit) => {
                tracing::warn!("Program {} already has a data storage block", self.info.name);
                self.notices.push(Notice::DataStorageLimit);
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn delete_block(&mut self, id: BlockId) -> EditorResult<()> {
        let involved = match self.state {
            InteractionState::DraggingBlock { block, .. } => block == id,
            InteractionState::DrawingConnection { start, .. } => start.block == id,
            InteractionState::Idle => false,
        };
        if involved {
            self.state = InteractionState::Idle;
        }
        self.diagram.remove_block(id)?;
        self.structure_changed()?;
        self.commit(false);
        Ok(())
    }

    pub fn rename_block(&mut self, id: BlockId, name: &str) -> EditorResult<()> {
        let block = self
            .diagram
            .find_block(id)
            .ok_or(GraphError::BlockNotFound(id))?;
        if !block.kind.allows_rename() {
            return Err(EditorError::RenameNotAllowed {
                kind: block.kind.to_string(),
            });
        }
        let name = self.naming.validate_block_name(name)?;
        self.diagram.rename_block(id, name)?;
        self.commit(false);
        Ok(())
    }

    /// Remove the connection into `dest`. Returns whether one existed.
    pub fn remove_connection(&mut self, dest: PinRef) -> EditorResult<bool> {
        if !self.diagram.disconnect(dest) {
            return Ok(false);
        }
        self.structure_changed()?;
        self.commit(false);
        Ok(true)
    }

    /// Apply a parameter field edit. Typing updates values live; a commit is
    /// also recorded and saved.
    ///
    /// A map label committed empty falls back to the last recorded label, or
    /// is dropped when there is none.
    pub fn edit_param(&mut self, id: BlockId, edit: &ParamEdit) -> EditorResult<()> {
        let restored;
        let mut edit = edit;
        if edit.commit
            && edit.key.is_some()
            && filter_invalid_characters(&edit.text).trim().is_empty()
        {
            let Some(label) = self.recorded_label(id, edit) else {
                tracing::debug!("Empty {} label on block {} rejected", edit.name, id);
                return Ok(());
            };
            restored = ParamEdit {
                text: label,
                ..edit.clone()
            };
            edit = &restored;
        }

        let block = self
            .diagram
            .find_block_mut(id)
            .ok_or(GraphError::BlockNotFound(id))?;
        let param = block
            .param_mut(&edit.name)
            .ok_or_else(|| EditorError::UnknownParam {
                block: id,
                name: edit.name.clone(),
            })?;
        if apply_edit(param, edit) {
            self.recompute()?;
        }
        if edit.commit {
            self.commit(false);
        }
        Ok(())
    }

    /// The non-empty map label for `edit` in the newest history entry.
    fn recorded_label(&self, id: BlockId, edit: &ParamEdit) -> Option<String> {
        let key = edit.key.as_ref()?;
        self.history
            .current()?
            .block(id)?
            .params
            .iter()
            .find(|p| p.name == edit.name)?
            .value
            .as_ref()?
            .as_map()?
            .get(key)
            .filter(|label| !label.trim().is_empty())
            .cloned()
    }

    /// Set a number entry block from text. Text without a leading number
    /// makes the value unknown.
    pub fn set_number_entry(&mut self, id: BlockId, text: &str) -> EditorResult<()> {
        let block = self
            .diagram
            .find_block(id)
            .ok_or(GraphError::BlockNotFound(id))?;
        if !matches!(block.kind, BlockKind::NumberEntry) {
            return Err(EditorError::NotNumberEntry(id));
        }
        let value = parse_leading_number(text).map(Value::Number);
        self.diagram.set_value(id, value)?;
        self.recompute()?;
        self.commit(false);
        Ok(())
    }

    /// Restore the previous history entry. Ignored mid-gesture.
    pub fn undo(&mut self) -> EditorResult<()> {
        if !self.state.is_idle() {
            tracing::debug!("Undo ignored during pointer interaction");
            return Ok(());
        }
        let Some(spec) = self.history.previous() else {
            return Ok(());
        };
        // A snapshot that no longer converts stays in history
        let (diagram, info) = from_spec(spec)?;
        self.history.undo();
        self.diagram = diagram;
        self.info = info;
        self.structure_changed()?;
        self.request_save();
        Ok(())
    }

    /// While running, block moves are ignored.
    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn save_completed(&mut self, success: bool) {
        if !success {
            tracing::warn!("Saving program {} failed", self.info.name);
        }
        if self.saves.complete(success) == SaveAction::Begin {
            let spec = self.serialize();
            self.persistence.begin_save(spec);
        }
    }

    pub fn projection(&self) -> Projection {
        let mut projection = Projection::new(&self.diagram, &self.info);
        if let InteractionState::DrawingConnection { start, pointer } = self.state {
            projection.transient = pin_center(&self.diagram, start).map(|from| (from, pointer));
        }
        projection.save_status = self.saves.status();
        projection.running = self.running;
        projection.can_undo = self.history.can_undo();
        projection
    }

    /// Drain notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn info(&self) -> &ProgramInfo {
        &self.info
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn save_status(&self) -> SaveStatus {
        self.saves.status()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut P {
        &mut self.persistence
    }

    fn recompute(&mut self) -> EditorResult<()> {
        self.evaluator.recompute(&mut self.diagram)?;
        Ok(())
    }

    fn structure_changed(&mut self) -> EditorResult<()> {
        self.diagram.reconcile_data_storage();
        self.recompute()
    }

    fn commit(&mut self, is_move: bool) {
        let spec = self.serialize();
        self.history.record(spec, is_move);
        self.request_save();
    }

    fn request_save(&mut self) {
        if self.saves.request_save() == SaveAction::Begin {
            let spec = self.serialize();
            self.persistence.begin_save(spec);
        }
    }
}
