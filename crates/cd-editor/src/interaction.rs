//! Pointer interaction state machine.
//!
//! The controller turns press / move / release into [`Reaction`]s. It owns
//! the selection and in-flight gesture state, but only touches the diagram
//! for live feedback (drag positions, hover highlight). Everything that
//! belongs in history comes back as a command for the caller to run or
//! record.
//!
//! | Mode | Press on node | Press on empty | Move | Release |
//! |------|---------------|----------------|------|---------|
//! | **Select** | select / toggle, start drag | clear selection | drag selection | record `BatchMove` |
//! | **AddNode** | ignored | `AddNode` at pointer | — | — |
//! | **Connect** | start connection | — | rubber band | `AddEdge` or reject |
//!
//! All points are world space.

use crate::commands::{Command, NodeMove};
use crate::config::{EditorConfig, NewNodeTemplate};
use crate::input::Modifiers;
use cd_core::error::ConnectError;
use cd_core::id::{EdgeId, NodeId};
use cd_core::model::{Diagram, Node};
use cd_render::paint::PaintState;
use cd_render::{Geometry, Point, Rect, Vec2, hit_test_node};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Select,
    AddNode,
    Connect,
}

/// What the caller should do after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    /// Nothing changed.
    None,
    /// Transient state changed (selection, drag, rubber band); repaint.
    Redraw,
    /// Run this command through the history.
    Execute(Command),
    /// Already applied by the gesture; push without executing.
    Record(Command),
    /// The requested connection was refused.
    Rejected(ConnectError),
}

impl Reaction {
    pub fn needs_redraw(&self) -> bool {
        !matches!(self, Reaction::None)
    }
}

#[derive(Debug, Clone)]
struct Drag {
    /// The node under the pointer at press.
    primary: NodeId,
    /// Pointer minus primary node center.
    offset: Vec2,
    /// Every dragged node with its position at press.
    origins: Vec<(NodeId, (f64, f64))>,
}

#[derive(Debug, Clone)]
struct Connection {
    start: NodeId,
    temp: Point,
    /// Node currently carrying the hover highlight.
    hover: Option<NodeId>,
}

#[derive(Debug)]
pub struct InteractionController {
    mode: Mode,
    selected: Vec<NodeId>,
    selected_edge: Option<EdgeId>,
    drag: Option<Drag>,
    connection: Option<Connection>,
    /// Node centers must stay inside this rect while dragging.
    drag_bounds: Rect,
    drag_epsilon: f64,
    pub new_node: NewNodeTemplate,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl InteractionController {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            mode: Mode::Select,
            selected: Vec::new(),
            selected_edge: None,
            drag: None,
            connection: None,
            drag_bounds: config.canvas.drag_bounds(),
            drag_epsilon: config.drag_epsilon,
            new_node: config.new_node.clone(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch modes. A pending connection is dropped.
    pub fn set_mode(&mut self, diagram: &mut Diagram, mode: Mode) {
        if self.mode != mode {
            log::debug!("mode {:?} -> {:?}", self.mode, mode);
        }
        self.drop_connection(diagram);
        self.mode = mode;
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn selected_node_ids(&self) -> &[NodeId] {
        &self.selected
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selected.contains(&id)
    }

    pub fn selected_edge(&self) -> Option<EdgeId> {
        self.selected_edge
    }

    pub fn set_selection(&mut self, ids: Vec<NodeId>) {
        self.selected = ids;
        self.selected_edge = None;
    }

    pub fn select_all(&mut self, diagram: &Diagram) {
        self.set_selection(diagram.nodes.iter().map(|n| n.id).collect());
    }

    /// Select a single edge; node selection is cleared when one is picked.
    pub fn select_edge(&mut self, edge: Option<EdgeId>) {
        if edge.is_some() {
            self.selected.clear();
        }
        self.selected_edge = edge;
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
        self.selected_edge = None;
    }

    /// Forget ids that no longer exist (after undo, redo or load), and any
    /// gesture anchored on one.
    pub fn retain_existing(&mut self, diagram: &Diagram) {
        self.selected.retain(|id| diagram.contains_node(*id));
        if self.selected_edge.is_some_and(|e| !diagram.contains_edge(e)) {
            self.selected_edge = None;
        }
        if self
            .drag
            .as_ref()
            .is_some_and(|d| !diagram.contains_node(d.primary))
        {
            self.drag = None;
        }
        if self
            .connection
            .as_ref()
            .is_some_and(|c| !diagram.contains_node(c.start))
        {
            self.connection = None;
        }
    }

    /// Drop all selection and gesture state without touching the diagram.
    pub fn reset(&mut self) {
        self.clear_selection();
        self.drag = None;
        self.connection = None;
    }

    pub fn find_node_at(&self, diagram: &Diagram, geometry: &Geometry, p: Point) -> Option<NodeId> {
        hit_test_node(diagram, geometry, p)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    // ─── Pointer events ──────────────────────────────────────────────────

    /// A press that arrives while a gesture is still live (the host lost
    /// the release) aborts that gesture first, restoring dragged nodes and
    /// clearing the hover highlight.
    pub fn handle_pointer_down(
        &mut self,
        diagram: &mut Diagram,
        p: Point,
        hit: Option<NodeId>,
        modifiers: Modifiers,
    ) -> Reaction {
        if self.abort_gesture(diagram) {
            log::debug!("press without release; previous gesture aborted");
        }
        match self.mode {
            Mode::Select => self.select_press(diagram, p, hit, modifiers),
            Mode::AddNode => {
                if hit.is_some() {
                    return Reaction::None;
                }
                let template = &self.new_node;
                let node = Node::new(template.title.clone(), p.x, p.y)
                    .with_color(template.color)
                    .with_category(template.category);
                log::debug!("add node at ({:.1}, {:.1})", p.x, p.y);
                Reaction::Execute(Command::add_node(node))
            }
            Mode::Connect => match hit {
                Some(id) if self.start_connection(diagram, id) => Reaction::Redraw,
                _ => Reaction::None,
            },
        }
    }

    pub fn handle_pointer_move(
        &mut self,
        diagram: &mut Diagram,
        p: Point,
        hit: Option<NodeId>,
    ) -> Reaction {
        if self.drag.is_some() {
            return self.drag_to(diagram, p);
        }
        if self.connection.is_some() {
            self.update_temp_connection(diagram, p, hit);
            return Reaction::Redraw;
        }
        Reaction::None
    }

    pub fn handle_pointer_up(
        &mut self,
        diagram: &mut Diagram,
        p: Point,
        hit: Option<NodeId>,
    ) -> Reaction {
        if let Some(drag) = self.drag.take() {
            return self.finish_drag(diagram, drag);
        }
        if self.connection.is_some() {
            self.update_temp_connection(diagram, p, hit);
            return self.end_connection(diagram, hit);
        }
        Reaction::None
    }

    /// Escape: undo a live drag, drop a pending connection, or clear the
    /// selection, in that order of precedence.
    pub fn cancel(&mut self, diagram: &mut Diagram) -> Reaction {
        if self.abort_gesture(diagram) {
            return Reaction::Redraw;
        }
        if self.selected.is_empty() && self.selected_edge.is_none() {
            return Reaction::None;
        }
        self.clear_selection();
        Reaction::Redraw
    }

    /// Abandon a drag (restoring the positions it started from) or a
    /// pending connection. Returns whether there was one.
    pub fn abort_gesture(&mut self, diagram: &mut Diagram) -> bool {
        if let Some(drag) = self.drag.take() {
            log::debug!("drag cancelled");
            for (id, pos) in &drag.origins {
                set_position(diagram, *id, *pos);
            }
            return true;
        }
        if self.connection.is_some() {
            log::debug!("connection cancelled");
            self.drop_connection(diagram);
            return true;
        }
        false
    }

    // ─── Select mode ─────────────────────────────────────────────────────

    fn select_press(
        &mut self,
        diagram: &Diagram,
        p: Point,
        hit: Option<NodeId>,
        modifiers: Modifiers,
    ) -> Reaction {
        let Some(id) = hit else {
            if modifiers.toggles_selection() {
                return Reaction::None;
            }
            let had_selection = !self.selected.is_empty() || self.selected_edge.is_some();
            self.clear_selection();
            return if had_selection {
                Reaction::Redraw
            } else {
                Reaction::None
            };
        };

        self.selected_edge = None;
        if modifiers.toggles_selection() {
            if let Some(pos) = self.selected.iter().position(|s| *s == id) {
                self.selected.remove(pos);
            } else {
                self.selected.push(id);
            }
        } else if !self.selected.contains(&id) {
            self.selected = vec![id];
        }

        // A node toggled out of the selection is not dragged.
        if self.selected.contains(&id) {
            self.begin_drag(diagram, id, p);
        }
        Reaction::Redraw
    }

    fn begin_drag(&mut self, diagram: &Diagram, primary: NodeId, p: Point) {
        let Some(node) = diagram.node(primary) else {
            log::warn!("drag: {primary:?} not found");
            return;
        };
        let offset = p - Point::new(node.x, node.y);
        let origins = self
            .selected
            .iter()
            .filter_map(|id| diagram.node(*id).map(|n| (n.id, n.position())))
            .collect();
        self.drag = Some(Drag {
            primary,
            offset,
            origins,
        });
    }

    fn drag_to(&mut self, diagram: &mut Diagram, p: Point) -> Reaction {
        let Some(drag) = &self.drag else {
            return Reaction::None;
        };
        let Some(primary) = diagram.node(drag.primary) else {
            log::warn!("drag: {:?} vanished mid-gesture", drag.primary);
            self.drag = None;
            return Reaction::None;
        };
        let target = p - drag.offset;
        let delta = Vec2::new(target.x - primary.x, target.y - primary.y);
        if delta == Vec2::ZERO {
            return Reaction::None;
        }

        // All or nothing: one node leaving the canvas blocks the whole frame.
        let fits = drag.origins.iter().all(|(id, _)| {
            diagram
                .node(*id)
                .is_none_or(|n| within(self.drag_bounds, n.x + delta.x, n.y + delta.y))
        });
        if !fits {
            log::trace!("drag frame rejected at ({:.1}, {:.1})", p.x, p.y);
            return Reaction::None;
        }

        for (id, _) in &drag.origins {
            if let Some(node) = diagram.node_mut(*id) {
                node.x += delta.x;
                node.y += delta.y;
            }
        }
        log::trace!("drag by ({:.1}, {:.1})", delta.x, delta.y);
        Reaction::Redraw
    }

    fn finish_drag(&mut self, diagram: &mut Diagram, drag: Drag) -> Reaction {
        let moves: Vec<NodeMove> = drag
            .origins
            .iter()
            .filter_map(|(id, from)| {
                diagram.node(*id).map(|n| NodeMove {
                    id: *id,
                    from: *from,
                    to: n.position(),
                })
            })
            .collect();
        let distance = moves.iter().map(NodeMove::distance).fold(0.0, f64::max);
        if distance > self.drag_epsilon {
            log::debug!("drag finished: {} node(s), {distance:.1} units", moves.len());
            return Reaction::Record(Command::batch_move(moves));
        }
        if distance == 0.0 {
            return Reaction::None;
        }
        // Jitter below the threshold is not history; put the nodes back.
        for m in &moves {
            set_position(diagram, m.id, m.from);
        }
        Reaction::Redraw
    }

    // ─── Connect mode ────────────────────────────────────────────────────

    /// Begin a rubber-band connection at `start`'s center. `false` when the
    /// node does not exist.
    pub fn start_connection(&mut self, diagram: &mut Diagram, start: NodeId) -> bool {
        self.drop_connection(diagram);
        let Some(node) = diagram.node(start) else {
            log::warn!("connect: start node {start:?} not found");
            return false;
        };
        log::debug!("connect from {start:?}");
        self.connection = Some(Connection {
            start,
            temp: Point::new(node.x, node.y),
            hover: None,
        });
        true
    }

    /// Move the loose end to `p` and highlight the node under it, if it is
    /// a possible target.
    pub fn update_temp_connection(&mut self, diagram: &mut Diagram, p: Point, hover: Option<NodeId>) {
        let Some(conn) = &mut self.connection else {
            return;
        };
        conn.temp = p;
        let target = hover.filter(|id| *id != conn.start);
        if conn.hover == target {
            return;
        }
        set_highlight(diagram, conn.hover, false);
        set_highlight(diagram, target, true);
        conn.hover = target;
    }

    /// Finish the pending connection over `end`. Releasing over nothing or
    /// over the start node cancels silently.
    pub fn end_connection(&mut self, diagram: &mut Diagram, end: Option<NodeId>) -> Reaction {
        let Some(start) = self.connection.as_ref().map(|c| c.start) else {
            return Reaction::None;
        };
        self.drop_connection(diagram);
        let Some(end) = end.filter(|id| *id != start) else {
            return Reaction::Redraw;
        };
        match diagram.propose_edge(start, end) {
            Ok(edge) => {
                if edge.forbidden {
                    log::debug!("connect {start:?} -> {end:?} matches a forbidden rule");
                }
                Reaction::Execute(Command::add_edge(edge))
            }
            Err(err) => {
                log::debug!("connect {start:?} -> {end:?} rejected: {err}");
                Reaction::Rejected(err)
            }
        }
    }

    /// The pending connection's start node and loose end.
    pub fn pending_connection(&self) -> Option<(NodeId, Point)> {
        self.connection.as_ref().map(|c| (c.start, c.temp))
    }

    fn drop_connection(&mut self, diagram: &mut Diagram) {
        if let Some(conn) = self.connection.take() {
            set_highlight(diagram, conn.hover, false);
        }
    }

    // ─── Paint ───────────────────────────────────────────────────────────

    /// Selection and rubber band in the shape the paint pass expects.
    pub fn paint_state<'a>(&'a self, diagram: &Diagram) -> PaintState<'a> {
        let pending_connection = self.connection.as_ref().and_then(|c| {
            let start = diagram.node(c.start)?;
            Some((Point::new(start.x, start.y), c.temp))
        });
        PaintState {
            selected_nodes: &self.selected,
            selected_edge: self.selected_edge,
            pending_connection,
        }
    }
}

/// Inclusive containment; a center exactly on the margin line is allowed.
fn within(bounds: Rect, x: f64, y: f64) -> bool {
    x >= bounds.x0 && x <= bounds.x1 && y >= bounds.y0 && y <= bounds.y1
}

fn set_position(diagram: &mut Diagram, id: NodeId, (x, y): (f64, f64)) {
    if let Some(node) = diagram.node_mut(id) {
        node.x = x;
        node.y = y;
    }
}

fn set_highlight(diagram: &mut Diagram, id: Option<NodeId>, on: bool) {
    if let Some(node) = id.and_then(|id| diagram.node_mut(id)) {
        node.highlighted = on;
    }
}
