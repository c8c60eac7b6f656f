//! Integration tests: the editor session facade (cd-editor).
//!
//! Screen-space events in, diagram + history state out, with the fixture
//! diagram loaded from disk where it matters.

use cd_core::*;
use cd_editor::config::EditorConfig;
use cd_editor::input::{InputEvent, Modifiers};
use cd_editor::interaction::Mode;
use cd_editor::session::{EditorSession, Feedback};
use cd_render::Point;
use cd_render::paint::DisplayItem;
use pretty_assertions::assert_eq;

const FIXTURE: &str = include_str!("fixtures/pump_failure.json");

fn id(s: &str) -> NodeId {
    s.parse().unwrap()
}

fn cavitation() -> NodeId {
    id("0b7e3c4a-51d2-4f8e-9a61-2c5d8e7f1a90")
}

fn loaded() -> EditorSession {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut s = EditorSession::default();
    s.load_str(FIXTURE).unwrap();
    s
}

fn click(s: &mut EditorSession, x: f64, y: f64, modifiers: Modifiers) -> Feedback {
    let fb = s.handle_input(&InputEvent::PointerDown { x, y, modifiers });
    s.handle_input(&InputEvent::PointerUp { x, y, modifiers });
    fb
}

fn key(s: &mut EditorSession, key: &str, modifiers: Modifiers) -> Feedback {
    s.handle_input(&InputEvent::key(key, modifiers))
}

// ─── Document ───────────────────────────────────────────────────────────

#[test]
fn load_flags_forbidden_edges_and_clears_history() {
    let mut s = loaded();
    key(&mut s, "n", Modifiers::NONE);
    click(&mut s, 900.0, 900.0, Modifiers::NONE);
    assert!(s.history().can_undo());

    s.load_str(FIXTURE).unwrap();
    let d = s.diagram();
    assert_eq!(d.nodes.len(), 3);
    assert_eq!(d.edges.len(), 2);
    assert!(!d.edges[0].forbidden);
    assert!(d.edges[1].forbidden);
    assert!(!s.history().can_undo());
    assert!(s.selected_node_ids().is_empty());
}

#[test]
fn failed_load_leaves_everything_untouched() {
    let mut s = loaded();
    s.rename_node(cavitation(), "Cavitation");
    let before = s.diagram().clone();

    let missing = std::env::temp_dir().join("cd-editor-no-such-dir/missing.json");
    assert!(matches!(s.load(&missing), Err(PersistError::Io { .. })));
    assert!(matches!(s.load_str("{ not json"), Err(PersistError::Format(_))));

    assert_eq!(s.diagram(), &before);
    assert_eq!(s.history().undo_description().as_deref(), Some("Rename node"));
}

#[test]
fn save_and_reload_roundtrip() {
    let mut s = loaded();
    s.rename_node(cavitation(), "Cavitation at inlet");
    let path = std::env::temp_dir().join(format!("cd-editor-session-{}.json", NodeId::new()));
    s.save(&path).unwrap();

    let mut other = EditorSession::default();
    other.load(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(other.diagram(), s.diagram());
}

#[test]
fn replacing_rules_reflags_edges() {
    let mut s = loaded();
    assert_eq!(s.set_forbidden_rules(Vec::new()), 0);
    assert!(s.diagram().edges.iter().all(|e| !e.forbidden));
    let rule = ForbiddenRule::new(NodeCategory::Component, NodeCategory::Process, "");
    assert_eq!(s.set_forbidden_rules(vec![rule]), 1);
    assert!(s.diagram().edges[0].forbidden);
}

// ─── Pointer + camera ───────────────────────────────────────────────────

#[test]
fn pointer_input_goes_through_the_camera() {
    let mut s = loaded();
    s.camera_mut().set_zoom_at(Point::ORIGIN, 2.0);
    // Screen (400, 400) is world (200, 200) at 2x.
    assert_eq!(click(&mut s, 400.0, 400.0, Modifiers::NONE), Feedback::Redraw);
    assert_eq!(s.selected_node_ids(), &[cavitation()]);
}

#[test]
fn wheel_zooms_around_cursor() {
    let mut s = loaded();
    let m = Point::new(300.0, 240.0);
    let anchor = s.camera().screen_to_world(m);
    let fb = s.handle_input(&InputEvent::Wheel { x: m.x, y: m.y, delta: 1.0 });
    assert_eq!(fb, Feedback::Redraw);
    assert!((s.camera().zoom() - 1.1).abs() < 1e-9);
    let after = s.camera().screen_to_world(m);
    assert!((after - anchor).hypot() < 1e-3);
}

#[test]
fn reversed_zoom_limits_in_config_are_repaired() {
    let cfg = EditorConfig::from_json(r#"{"zoom":{"min":8.0}}"#).unwrap();
    let mut s = EditorSession::new(cfg);
    assert_eq!(s.camera().zoom(), 5.0);
    s.handle_input(&InputEvent::Wheel { x: 10.0, y: 10.0, delta: 3.0 });
    assert!((s.camera().zoom() - 5.0 * 1.1f64.powi(3)).abs() < 1e-9);
    s.handle_input(&InputEvent::Wheel { x: 10.0, y: 10.0, delta: -30.0 });
    assert_eq!(s.camera().zoom(), 5.0);
}

#[test]
fn keyboard_zoom_and_reset() {
    let mut s = loaded();
    key(&mut s, "=", Modifiers::CTRL);
    assert!(s.camera().zoom() > 1.0);
    key(&mut s, "0", Modifiers::CTRL);
    assert_eq!(s.camera().zoom(), 1.0);
}

#[test]
fn lost_pointer_up_does_not_leak_an_unrecorded_move() {
    let mut s = loaded();
    s.handle_input(&InputEvent::PointerDown { x: 200.0, y: 200.0, modifiers: Modifiers::NONE });
    s.handle_input(&InputEvent::PointerMove { x: 400.0, y: 300.0, modifiers: Modifiers::NONE });
    click(&mut s, 400.0, 300.0, Modifiers::NONE);

    assert_eq!(s.diagram().node(cavitation()).unwrap().position(), (200.0, 200.0));
    assert!(!s.history().can_undo());
}

// ─── Selection and deletion ─────────────────────────────────────────────

#[test]
fn clicking_an_edge_selects_it_and_delete_removes_it() {
    let mut s = loaded();
    let edge = s.diagram().edges[0].id;
    // Midway between the two boxes, 3 units off the line.
    click(&mut s, 350.0, 203.0, Modifiers::NONE);
    assert_eq!(s.controller().selected_edge(), Some(edge));
    assert!(s.selected_node_ids().is_empty());

    key(&mut s, "Delete", Modifiers::NONE);
    assert!(!s.diagram().contains_edge(edge));
    assert_eq!(s.controller().selected_edge(), None);

    key(&mut s, "z", Modifiers::CTRL);
    assert_eq!(s.diagram().edge_index(edge), Some(0));
}

#[test]
fn deleting_a_node_takes_its_edges_and_undo_brings_them_back() {
    let mut s = loaded();
    let before = s.diagram().clone();
    click(&mut s, 200.0, 200.0, Modifiers::NONE);
    assert_eq!(key(&mut s, "Backspace", Modifiers::NONE), Feedback::Redraw);
    assert_eq!(s.diagram().nodes.len(), 2);
    assert!(s.diagram().edges.is_empty());

    s.undo();
    assert_eq!(s.diagram(), &before);
    s.redo();
    assert_eq!(s.diagram().nodes.len(), 2);
    assert!(s.selected_node_ids().is_empty());
}

#[test]
fn escape_clears_selection() {
    let mut s = loaded();
    key(&mut s, "a", Modifiers::CTRL);
    assert_eq!(s.selected_node_ids().len(), 3);
    assert_eq!(key(&mut s, "Escape", Modifiers::NONE), Feedback::Redraw);
    assert!(s.selected_node_ids().is_empty());
    assert_eq!(key(&mut s, "Escape", Modifiers::NONE), Feedback::None);
}

#[test]
fn recolor_selection_is_one_undo_step() {
    let mut s = loaded();
    key(&mut s, "a", Modifiers::CTRL);
    s.recolor_selection(NodeColor::Green);
    assert!(s.diagram().nodes.iter().all(|n| n.color == NodeColor::Green));
    s.undo();
    assert_eq!(s.diagram().node(cavitation()).unwrap().color, NodeColor::Red);
}

#[test]
fn edit_properties_through_session() {
    let mut s = loaded();
    let props = NodeProperties {
        title: "Impeller damage".into(),
        description: "Pitting on vanes".into(),
        weight: 4.0,
        color: NodeColor::Red,
        category: NodeCategory::Subsystem,
    };
    assert_eq!(s.edit_properties(cavitation(), props.clone()), Feedback::Redraw);
    assert_eq!(s.diagram().node(cavitation()).unwrap().properties(), props);
    assert_eq!(s.edit_properties(NodeId::new(), props), Feedback::None);
}

// ─── Modes ──────────────────────────────────────────────────────────────

#[test]
fn add_and_connect_through_keys_and_clicks() {
    let mut s = loaded();
    key(&mut s, "n", Modifiers::NONE);
    assert_eq!(s.mode(), Mode::AddNode);
    click(&mut s, 800.0, 450.0, Modifiers::NONE);
    assert_eq!(s.diagram().nodes.len(), 4);
    let added = s.diagram().nodes[3].id;

    key(&mut s, "c", Modifiers::NONE);
    assert_eq!(s.mode(), Mode::Connect);
    s.handle_input(&InputEvent::PointerDown { x: 500.0, y: 200.0, modifiers: Modifiers::NONE });
    s.handle_input(&InputEvent::PointerMove { x: 700.0, y: 400.0, modifiers: Modifiers::NONE });
    let fb = s.handle_input(&InputEvent::PointerUp { x: 800.0, y: 450.0, modifiers: Modifiers::NONE });
    assert_eq!(fb, Feedback::Redraw);
    let edge = s.diagram().edges.last().unwrap();
    assert_eq!(edge.to, added);

    // The reverse direction is refused with a readable reason.
    s.handle_input(&InputEvent::PointerDown { x: 800.0, y: 450.0, modifiers: Modifiers::NONE });
    let fb = s.handle_input(&InputEvent::PointerUp { x: 500.0, y: 200.0, modifiers: Modifiers::NONE });
    assert_eq!(fb, Feedback::Conflict(ConnectError::DuplicateEdge));
    assert_eq!(ConnectError::DuplicateEdge.to_string(), "these factors are already connected");
}

// ─── Clipboard ──────────────────────────────────────────────────────────

#[test]
fn copy_paste_rekeys_offsets_and_selects() {
    let mut s = loaded();
    key(&mut s, "a", Modifiers::CTRL);
    let Feedback::Clipboard(text) = key(&mut s, "c", Modifiers::CTRL) else {
        panic!("copy produced no clipboard text");
    };
    assert!(text.contains("Pump cavitation"));

    key(&mut s, "v", Modifiers::CTRL);
    let d = s.diagram();
    assert_eq!((d.nodes.len(), d.edges.len()), (6, 4));
    let pasted = s.selected_node_ids().to_vec();
    assert_eq!(pasted.len(), 3);
    assert!(pasted.iter().all(|id| d.node_index(*id).is_some_and(|i| i >= 3)));
    assert_eq!(d.node(pasted[0]).unwrap().position(), (220.0, 220.0));
    assert!(d.edges[3].forbidden);

    // A second paste cascades from the first.
    key(&mut s, "v", Modifiers::CTRL);
    let last = *s.selected_node_ids().first().unwrap();
    assert_eq!(s.diagram().node(last).unwrap().position(), (240.0, 240.0));

    s.undo();
    s.undo();
    assert_eq!(s.diagram().nodes.len(), 3);
}

#[test]
fn cut_then_paste_text() {
    let mut s = loaded();
    click(&mut s, 200.0, 200.0, Modifiers::NONE);
    let text = s.cut_selection().unwrap();
    assert!(!s.diagram().contains_node(cavitation()));
    assert_eq!(s.diagram().edges.len(), 0);

    assert_eq!(s.paste_text(&text), Feedback::Redraw);
    let pasted = s.selected_node_ids()[0];
    assert_ne!(pasted, cavitation());
    assert_eq!(s.diagram().node(pasted).unwrap().title, "Pump cavitation");

    assert_eq!(s.paste_text("just some words"), Feedback::None);
    assert!(s.copy_selection().is_some());
    s.handle_input(&InputEvent::PointerDown { x: 2000.0, y: 1500.0, modifiers: Modifiers::NONE });
    assert_eq!(s.copy_selection(), None);
}

// ─── Paint ──────────────────────────────────────────────────────────────

#[test]
fn display_list_reflects_selection() {
    let mut s = loaded();
    click(&mut s, 200.0, 200.0, Modifiers::NONE);
    let list = s.display_list();
    assert_eq!(list.items.len(), 5);
    let selected = list.items.iter().find_map(|item| match item {
        DisplayItem::Node(n) if n.id == cavitation() => Some(n.stroke_width),
        _ => None,
    });
    assert_eq!(selected, Some(3.0));
}
