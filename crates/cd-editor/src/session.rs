//! Editor session: the one object a UI host talks to.
//!
//! Owns the diagram, its history, the interaction controller and the
//! camera. Screen-space input goes in, [`Feedback`] comes out; the host
//! repaints from [`EditorSession::display_list`] when asked to.

use crate::commands::Command;
use crate::config::EditorConfig;
use crate::history::CommandManager;
use crate::input::{InputEvent, Modifiers};
use crate::interaction::{InteractionController, Mode, Reaction};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use cd_core::clipboard::ClipboardData;
use cd_core::error::{ConnectError, PersistError};
use cd_core::id::NodeId;
use cd_core::model::{Diagram, ForbiddenRule, NodeColor, NodeProperties};
use cd_core::persist;
use cd_render::paint::{DisplayList, build_display_list};
use cd_render::{Camera, Geometry, Point, Size, TextMeasure};
use std::path::Path;

/// What the host should do after a call.
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    None,
    Redraw,
    /// A connection was refused; show the reason to the user.
    Conflict(ConnectError),
    /// Copy or cut produced text for the OS clipboard.
    Clipboard(String),
}

impl Feedback {
    pub fn needs_redraw(&self) -> bool {
        !matches!(self, Feedback::None)
    }
}

pub struct EditorSession {
    diagram: Diagram,
    history: CommandManager,
    controller: InteractionController,
    camera: Camera,
    geometry: Geometry,
    config: EditorConfig,
    clipboard: Option<ClipboardData>,
    /// Screen size, used as the anchor for keyboard zoom.
    viewport: Size,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        let geometry = Geometry::new(config.node_metrics);
        Self::with_geometry(config, geometry)
    }

    /// A session measuring titles with the host's font metrics.
    pub fn with_text_measure(config: EditorConfig, text: impl TextMeasure + 'static) -> Self {
        let geometry = Geometry::with_text_measure(config.node_metrics, text);
        Self::with_geometry(config, geometry)
    }

    fn with_geometry(config: EditorConfig, geometry: Geometry) -> Self {
        Self {
            diagram: Diagram::new(),
            history: CommandManager::with_limit(config.history_limit),
            controller: InteractionController::new(&config),
            camera: Camera::new(config.zoom),
            geometry,
            config,
            clipboard: None,
            viewport: Size::ZERO,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn history(&self) -> &CommandManager {
        &self.history
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.controller.mode()
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.controller.set_mode(&mut self.diagram, mode);
    }

    pub fn selected_node_ids(&self) -> &[NodeId] {
        self.controller.selected_node_ids()
    }

    pub fn set_viewport_size(&mut self, size: Size) {
        self.viewport = size;
    }

    pub fn display_list(&self) -> DisplayList {
        build_display_list(
            &self.diagram,
            &self.geometry,
            &self.camera,
            self.controller.paint_state(&self.diagram),
        )
    }

    // ─── Input ───────────────────────────────────────────────────────────

    pub fn handle_input(&mut self, event: &InputEvent) -> Feedback {
        match event {
            InputEvent::PointerDown { x, y, modifiers } => self.pointer_down(*x, *y, *modifiers),
            InputEvent::PointerMove { x, y, .. } => {
                let (p, hit) = self.locate(*x, *y);
                let reaction = self.controller.handle_pointer_move(&mut self.diagram, p, hit);
                self.apply(reaction)
            }
            InputEvent::PointerUp { x, y, .. } => {
                let (p, hit) = self.locate(*x, *y);
                let reaction = self.controller.handle_pointer_up(&mut self.diagram, p, hit);
                self.apply(reaction)
            }
            InputEvent::Wheel { x, y, delta } => {
                if self.camera.zoom_at(Point::new(*x, *y), *delta) {
                    Feedback::Redraw
                } else {
                    Feedback::None
                }
            }
            InputEvent::Key { key, modifiers } => match ShortcutMap::resolve(key, *modifiers) {
                Some(action) => self.perform(action),
                None => Feedback::None,
            },
        }
    }

    /// Screen point → world point and the node under it.
    fn locate(&self, x: f64, y: f64) -> (Point, Option<NodeId>) {
        let p = self.camera.screen_to_world(Point::new(x, y));
        let hit = self.controller.find_node_at(&self.diagram, &self.geometry, p);
        (p, hit)
    }

    fn pointer_down(&mut self, x: f64, y: f64, modifiers: Modifiers) -> Feedback {
        // Hit-test against restored positions if a release went missing.
        self.controller.abort_gesture(&mut self.diagram);
        let (p, hit) = self.locate(x, y);
        let reaction = self
            .controller
            .handle_pointer_down(&mut self.diagram, p, hit, modifiers);
        let mut feedback = self.apply(reaction);

        // A plain press that missed every node may still land on an edge.
        if self.controller.mode() == Mode::Select && hit.is_none() && !modifiers.toggles_selection()
        {
            let edge = self.geometry.hit_test_edge(
                &self.diagram,
                p,
                self.config.edge_hit_tolerance,
                self.camera.zoom(),
            );
            if edge.is_some() {
                self.controller.select_edge(edge);
                feedback = Feedback::Redraw;
            }
        }
        feedback
    }

    pub fn perform(&mut self, action: ShortcutAction) -> Feedback {
        match action {
            ShortcutAction::ModeSelect => self.switch_mode(Mode::Select),
            ShortcutAction::ModeAddNode => self.switch_mode(Mode::AddNode),
            ShortcutAction::ModeConnect => self.switch_mode(Mode::Connect),
            ShortcutAction::Undo => redraw_if(self.undo().is_some()),
            ShortcutAction::Redo => redraw_if(self.redo().is_some()),
            ShortcutAction::Delete => self.delete_selection(),
            ShortcutAction::SelectAll => self.select_all(),
            ShortcutAction::Copy => self.copy_selection().map_or(Feedback::None, Feedback::Clipboard),
            ShortcutAction::Cut => self.cut_selection().map_or(Feedback::None, Feedback::Clipboard),
            ShortcutAction::Paste => self.paste(),
            ShortcutAction::ZoomIn => self.zoom_keyboard(1.0),
            ShortcutAction::ZoomOut => self.zoom_keyboard(-1.0),
            ShortcutAction::ZoomReset => {
                self.camera.reset();
                Feedback::Redraw
            }
            ShortcutAction::Cancel => self.cancel(),
        }
    }

    fn switch_mode(&mut self, mode: Mode) -> Feedback {
        self.set_mode(mode);
        Feedback::Redraw
    }

    fn zoom_keyboard(&mut self, notches: f64) -> Feedback {
        let center = Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0);
        redraw_if(self.camera.zoom_at(center, notches))
    }

    /// Escape.
    pub fn cancel(&mut self) -> Feedback {
        let reaction = self.controller.cancel(&mut self.diagram);
        self.apply(reaction)
    }

    fn apply(&mut self, reaction: Reaction) -> Feedback {
        match reaction {
            Reaction::None => Feedback::None,
            Reaction::Redraw => Feedback::Redraw,
            Reaction::Execute(command) => self.run(command),
            Reaction::Record(command) => {
                self.history.push_without_executing(command);
                Feedback::Redraw
            }
            Reaction::Rejected(err) => Feedback::Conflict(err),
        }
    }

    fn run(&mut self, command: Command) -> Feedback {
        self.history.execute(&mut self.diagram, command);
        self.controller.retain_existing(&self.diagram);
        Feedback::Redraw
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Undo the newest step. A gesture in flight is abandoned first.
    pub fn undo(&mut self) -> Option<String> {
        self.controller.abort_gesture(&mut self.diagram);
        let desc = self.history.undo(&mut self.diagram)?;
        self.controller.retain_existing(&self.diagram);
        Some(desc)
    }

    pub fn redo(&mut self) -> Option<String> {
        self.controller.abort_gesture(&mut self.diagram);
        let desc = self.history.redo(&mut self.diagram)?;
        self.controller.retain_existing(&self.diagram);
        Some(desc)
    }

    // ─── Editing ─────────────────────────────────────────────────────────

    /// Delete the selected nodes (with their edges), or else the selected
    /// edge.
    pub fn delete_selection(&mut self) -> Feedback {
        let nodes = self.controller.selected_node_ids().to_vec();
        if !nodes.is_empty() {
            self.controller.clear_selection();
            return self.run(Command::batch_delete(nodes));
        }
        if let Some(edge) = self.controller.selected_edge() {
            self.controller.clear_selection();
            return self.run(Command::remove_edge(edge));
        }
        Feedback::None
    }

    pub fn recolor_selection(&mut self, color: NodeColor) -> Feedback {
        let ids = self.controller.selected_node_ids();
        if ids.is_empty() {
            return Feedback::None;
        }
        let command = Command::batch_recolor(&self.diagram, ids, color);
        self.run(command)
    }

    pub fn rename_node(&mut self, id: NodeId, title: impl Into<String>) -> Feedback {
        match Command::rename(&self.diagram, id, title) {
            Some(command) => self.run(command),
            None => {
                log::warn!("rename: {id:?} not found");
                Feedback::None
            }
        }
    }

    pub fn edit_properties(&mut self, id: NodeId, properties: NodeProperties) -> Feedback {
        match Command::edit_properties(&self.diagram, id, properties) {
            Some(command) => self.run(command),
            None => {
                log::warn!("edit properties: {id:?} not found");
                Feedback::None
            }
        }
    }

    pub fn select_all(&mut self) -> Feedback {
        self.controller.select_all(&self.diagram);
        Feedback::Redraw
    }

    // ─── Clipboard ───────────────────────────────────────────────────────

    /// Copy the selected nodes and the edges between them. Returns the JSON
    /// payload for the OS clipboard, or `None` with nothing selected.
    pub fn copy_selection(&mut self) -> Option<String> {
        let ids = self.controller.selected_node_ids();
        if ids.is_empty() {
            return None;
        }
        let data = ClipboardData::capture(&self.diagram, ids);
        log::debug!("copy {} node(s), {} edge(s)", data.nodes.len(), data.edges.len());
        let text = data.to_json();
        self.clipboard = Some(data);
        Some(text)
    }

    pub fn cut_selection(&mut self) -> Option<String> {
        let text = self.copy_selection()?;
        self.delete_selection();
        Some(text)
    }

    /// Paste the last copied group, offset from where it was copied.
    /// Repeated pastes cascade.
    pub fn paste(&mut self) -> Feedback {
        let Some(data) = self.clipboard.take() else {
            return Feedback::None;
        };
        let feedback = self.paste_data(&data);
        if self.clipboard.is_none() {
            self.clipboard = Some(data);
        }
        feedback
    }

    /// Paste a payload from the OS clipboard. Text that is not a payload is
    /// ignored.
    pub fn paste_text(&mut self, text: &str) -> Feedback {
        match ClipboardData::from_json(text) {
            Some(data) => self.paste_data(&data),
            None => {
                log::debug!("paste: clipboard text is not a diagram fragment");
                Feedback::None
            }
        }
    }

    fn paste_data(&mut self, data: &ClipboardData) -> Feedback {
        if data.is_empty() {
            return Feedback::None;
        }
        let (dx, dy) = self.config.paste_offset;
        let (nodes, mut edges) = data.instantiate(dx, dy);
        for edge in &mut edges {
            let category = |id: NodeId| nodes.iter().find(|n| n.id == id).map(|n| n.category);
            edge.forbidden = match (category(edge.from), category(edge.to)) {
                (Some(from), Some(to)) => self
                    .diagram
                    .forbidden_rules
                    .iter()
                    .any(|r| r.matches(from, to)),
                _ => false,
            };
        }
        let pasted: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
        self.clipboard = Some(ClipboardData {
            nodes: nodes.clone(),
            edges: edges.clone(),
        });
        let feedback = self.run(Command::paste_group(nodes, edges));
        self.controller.set_selection(pasted);
        feedback
    }

    // ─── Document ────────────────────────────────────────────────────────

    /// Swap in a new document. History, selection and gestures are reset.
    pub fn replace_diagram(&mut self, mut diagram: Diagram) {
        diagram.clear_highlights();
        let flagged = diagram.refresh_forbidden_flags();
        log::debug!(
            "diagram replaced: {} node(s), {} edge(s), {flagged} forbidden",
            diagram.nodes.len(),
            diagram.edges.len()
        );
        self.diagram = diagram;
        self.history.clear();
        self.controller.reset();
    }

    /// Load from a file. On error the current diagram and history are kept.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let diagram = persist::load_from_path(path)?;
        self.replace_diagram(diagram);
        Ok(())
    }

    pub fn load_str(&mut self, json: &str) -> Result<(), PersistError> {
        let diagram = persist::load_from_str(json)?;
        self.replace_diagram(diagram);
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        persist::save_to_path(&self.diagram, path)
    }

    pub fn save_to_string(&self) -> Result<String, PersistError> {
        persist::save_to_string(&self.diagram)
    }

    /// Replace the advisory rule list and re-flag every edge. Returns how
    /// many edges are now forbidden. Not an undoable step.
    pub fn set_forbidden_rules(&mut self, rules: Vec<ForbiddenRule>) -> usize {
        self.diagram.forbidden_rules = rules;
        self.diagram.refresh_forbidden_flags()
    }
}

fn redraw_if(changed: bool) -> Feedback {
    if changed {
        Feedback::Redraw
    } else {
        Feedback::None
    }
}
