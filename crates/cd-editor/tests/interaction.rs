//! Integration tests: pointer gestures (cd-editor).
//!
//! Drives `InteractionController` the way a host would: hit test in world
//! space, feed the event, run or record whatever comes back.

use cd_core::*;
use cd_editor::commands::Command;
use cd_editor::history::CommandManager;
use cd_editor::input::Modifiers;
use cd_editor::interaction::{InteractionController, Mode, Reaction};
use cd_render::{Geometry, Point};
use pretty_assertions::assert_eq;

struct Harness {
    diagram: Diagram,
    history: CommandManager,
    ctl: InteractionController,
    geometry: Geometry,
}

impl Harness {
    fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self {
            diagram: Diagram::new(),
            history: CommandManager::new(),
            ctl: InteractionController::default(),
            geometry: Geometry::default(),
        }
    }

    fn add(&mut self, title: &str, x: f64, y: f64) -> NodeId {
        let node = Node::new(title, x, y);
        let id = node.id;
        self.history.execute(&mut self.diagram, Command::add_node(node));
        id
    }

    fn hit(&self, x: f64, y: f64) -> Option<NodeId> {
        self.ctl.find_node_at(&self.diagram, &self.geometry, Point::new(x, y))
    }

    fn apply(&mut self, reaction: Reaction) -> Reaction {
        match &reaction {
            Reaction::Execute(cmd) => self.history.execute(&mut self.diagram, cmd.clone()),
            Reaction::Record(cmd) => self.history.push_without_executing(cmd.clone()),
            _ => {}
        }
        reaction
    }

    fn down(&mut self, x: f64, y: f64, modifiers: Modifiers) -> Reaction {
        let hit = self.hit(x, y);
        let r = self
            .ctl
            .handle_pointer_down(&mut self.diagram, Point::new(x, y), hit, modifiers);
        self.apply(r)
    }

    fn drag(&mut self, x: f64, y: f64) -> Reaction {
        let hit = self.hit(x, y);
        let r = self
            .ctl
            .handle_pointer_move(&mut self.diagram, Point::new(x, y), hit);
        self.apply(r)
    }

    fn up(&mut self, x: f64, y: f64) -> Reaction {
        let hit = self.hit(x, y);
        let r = self
            .ctl
            .handle_pointer_up(&mut self.diagram, Point::new(x, y), hit);
        self.apply(r)
    }

    fn pos(&self, id: NodeId) -> (f64, f64) {
        self.diagram.node(id).unwrap().position()
    }

    fn set_mode(&mut self, mode: Mode) {
        self.ctl.set_mode(&mut self.diagram, mode);
    }
}

// ─── Hit testing ────────────────────────────────────────────────────────

#[test]
fn topmost_node_wins() {
    let mut h = Harness::new();
    let _under = h.add("Under", 200.0, 200.0);
    let over = h.add("Over", 230.0, 210.0);
    assert_eq!(h.hit(220.0, 205.0), Some(over));
}

// ─── Select / drag ──────────────────────────────────────────────────────

#[test]
fn drag_records_one_batch_move() {
    let mut h = Harness::new();
    let a = h.add("A", 100.0, 100.0);
    let depth = h.history.undo_depth();

    // Grab 10 units right of center; the offset is kept while dragging.
    h.down(110.0, 100.0, Modifiers::NONE);
    h.drag(160.0, 130.0);
    h.drag(210.0, 160.0);
    assert_eq!(h.pos(a), (200.0, 160.0));
    let r = h.up(210.0, 160.0);
    assert!(matches!(r, Reaction::Record(Command::BatchMove { .. })));
    assert_eq!(h.history.undo_depth(), depth + 1);

    h.history.undo(&mut h.diagram);
    assert_eq!(h.pos(a), (100.0, 100.0));
    h.history.redo(&mut h.diagram);
    assert_eq!(h.pos(a), (200.0, 160.0));
}

#[test]
fn group_drag_moves_all_selected() {
    let mut h = Harness::new();
    let a = h.add("A", 100.0, 100.0);
    let b = h.add("B", 400.0, 100.0);
    h.down(100.0, 100.0, Modifiers::NONE);
    h.up(100.0, 100.0);
    h.down(400.0, 100.0, Modifiers::SHIFT);
    assert_eq!(h.ctl.selected_node_ids(), &[a, b]);

    h.drag(450.0, 150.0);
    h.up(450.0, 150.0);
    assert_eq!(h.pos(a), (150.0, 150.0));
    assert_eq!(h.pos(b), (450.0, 150.0));

    // Pressing an already-selected node keeps the multi-selection.
    h.down(150.0, 150.0, Modifiers::NONE);
    assert_eq!(h.ctl.selected_node_ids().len(), 2);
}

#[test]
fn group_drag_is_all_or_nothing_at_canvas_edge() {
    let mut h = Harness::new();
    let a = h.add("A", 60.0, 300.0);
    let b = h.add("B", 400.0, 300.0);
    h.ctl.set_selection(vec![a, b]);

    h.down(400.0, 300.0, Modifiers::NONE);
    // Would put A at x = 10, inside the 20-unit margin: the whole frame is refused.
    assert_eq!(h.drag(350.0, 300.0), Reaction::None);
    assert_eq!(h.pos(a), (60.0, 300.0));
    assert_eq!(h.pos(b), (400.0, 300.0));

    // A smaller step that keeps A on the margin line is accepted.
    h.drag(360.0, 300.0);
    assert_eq!(h.pos(a), (20.0, 300.0));
    assert_eq!(h.pos(b), (360.0, 300.0));
}

#[test]
fn click_without_motion_records_nothing() {
    let mut h = Harness::new();
    h.add("A", 100.0, 100.0);
    let depth = h.history.undo_depth();
    h.down(100.0, 100.0, Modifiers::NONE);
    assert_eq!(h.up(100.0, 100.0), Reaction::None);
    assert_eq!(h.history.undo_depth(), depth);
}

#[test]
fn escape_during_drag_restores_positions() {
    let mut h = Harness::new();
    let a = h.add("A", 100.0, 100.0);
    let depth = h.history.undo_depth();
    h.down(100.0, 100.0, Modifiers::NONE);
    h.drag(300.0, 300.0);
    assert_eq!(h.ctl.cancel(&mut h.diagram), Reaction::Redraw);
    assert_eq!(h.pos(a), (100.0, 100.0));
    assert_eq!(h.up(300.0, 300.0), Reaction::None);
    assert_eq!(h.history.undo_depth(), depth);
    // Selection survives the first Escape and goes with the second.
    assert_eq!(h.ctl.selected_node_ids(), &[a]);
    h.ctl.cancel(&mut h.diagram);
    assert!(h.ctl.selected_node_ids().is_empty());
}

#[test]
fn lost_release_leaves_no_untracked_move() {
    let mut h = Harness::new();
    let a = h.add("A", 100.0, 100.0);
    let depth = h.history.undo_depth();

    h.down(100.0, 100.0, Modifiers::NONE);
    h.drag(400.0, 300.0);
    // The host dropped the release; a fresh press/release follows.
    h.down(400.0, 300.0, Modifiers::NONE);
    h.up(400.0, 300.0);

    assert_eq!(h.pos(a), (100.0, 100.0));
    assert_eq!(h.history.undo_depth(), depth);
    h.history.undo(&mut h.diagram);
    assert!(h.diagram.nodes.is_empty());
}

// ─── AddNode mode ───────────────────────────────────────────────────────

#[test]
fn add_node_mode_creates_at_pointer() {
    let mut h = Harness::new();
    h.ctl.new_node.color = NodeColor::Red;
    h.set_mode(Mode::AddNode);
    let r = h.down(640.0, 480.0, Modifiers::NONE);
    assert!(matches!(r, Reaction::Execute(Command::AddNode { .. })));
    let node = &h.diagram.nodes[0];
    assert_eq!(node.position(), (640.0, 480.0));
    assert_eq!(node.title, "New factor");
    assert_eq!(node.color, NodeColor::Red);

    // Pressing on a node does nothing in this mode.
    assert_eq!(h.down(640.0, 480.0, Modifiers::NONE), Reaction::None);
    assert_eq!(h.diagram.nodes.len(), 1);
}

// ─── Connect mode ───────────────────────────────────────────────────────

#[test]
fn connect_creates_edge_once_in_either_direction() {
    let mut h = Harness::new();
    let a = h.add("A", 100.0, 100.0);
    let b = h.add("B", 400.0, 100.0);
    h.set_mode(Mode::Connect);

    h.down(100.0, 100.0, Modifiers::NONE);
    assert_eq!(h.ctl.pending_connection(), Some((a, Point::new(100.0, 100.0))));
    h.drag(250.0, 100.0);
    let r = h.up(400.0, 100.0);
    assert!(matches!(r, Reaction::Execute(Command::AddEdge { .. })));
    assert_eq!(h.diagram.edges.len(), 1);
    assert!(h.diagram.edges[0].connects(a, b));

    // Same direction again, then the reverse: both refused.
    h.down(100.0, 100.0, Modifiers::NONE);
    assert_eq!(h.up(400.0, 100.0), Reaction::Rejected(ConnectError::DuplicateEdge));
    h.down(400.0, 100.0, Modifiers::NONE);
    assert_eq!(h.up(100.0, 100.0), Reaction::Rejected(ConnectError::DuplicateEdge));
    assert_eq!(h.diagram.edges.len(), 1);
}

#[test]
fn connect_released_on_nothing_or_self_cancels() {
    let mut h = Harness::new();
    h.add("A", 100.0, 100.0);
    h.set_mode(Mode::Connect);
    let depth = h.history.undo_depth();

    h.down(100.0, 100.0, Modifiers::NONE);
    assert_eq!(h.up(900.0, 900.0), Reaction::Redraw);
    h.down(100.0, 100.0, Modifiers::NONE);
    assert_eq!(h.up(110.0, 105.0), Reaction::Redraw);

    assert!(h.diagram.edges.is_empty());
    assert_eq!(h.history.undo_depth(), depth);
    assert_eq!(h.ctl.pending_connection(), None);
}

#[test]
fn connect_marks_forbidden_relations() {
    let mut h = Harness::new();
    let a = h.add("Operator", 100.0, 100.0);
    let b = h.add("Grid", 400.0, 100.0);
    h.diagram.node_mut(a).unwrap().category = NodeCategory::Human;
    h.diagram.node_mut(b).unwrap().category = NodeCategory::System;
    h.diagram.forbidden_rules.push(ForbiddenRule::new(
        NodeCategory::Human,
        NodeCategory::System,
        "no direct action",
    ));
    h.set_mode(Mode::Connect);
    h.down(100.0, 100.0, Modifiers::NONE);
    h.up(400.0, 100.0);
    assert!(h.diagram.edges[0].forbidden);
    assert!(!h.diagram.node(b).unwrap().highlighted);
}
