//! Reversible diagram commands.
//!
//! Every mutation of a [`Diagram`] is wrapped in a `Command` that carries
//! whatever pre-state it needs to undo itself. Entities are found by id on
//! every execute/undo, so a command keeps working after other commands
//! have been undone and redone around it.
//!
//! Removals remember the index each entity occupied; undo puts it back in
//! the same slot so paint order (and hit-test order) is restored too.
//!
//! A command aimed at an entity that is no longer present does nothing and
//! logs a warning.

use cd_core::id::{EdgeId, NodeId};
use cd_core::model::{Diagram, Edge, Node, NodeColor, NodeProperties};

/// One node's position before and after a move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeMove {
    pub id: NodeId,
    pub from: (f64, f64),
    pub to: (f64, f64),
}

impl NodeMove {
    /// Straight-line displacement, in world units.
    pub fn distance(&self) -> f64 {
        (self.to.0 - self.from.0).hypot(self.to.1 - self.from.1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Append a node.
    AddNode { node: Node },
    /// Remove a node and every edge touching it. Touching edges are
    /// captured when the command runs.
    RemoveNode {
        id: NodeId,
        removed: Option<(usize, Node)>,
        edges: Vec<(usize, Edge)>,
    },
    /// Append an edge.
    AddEdge { edge: Edge },
    /// Remove an edge. Undo re-adds it only if it is not already present.
    RemoveEdge {
        id: EdgeId,
        removed: Option<(usize, Edge)>,
    },
    /// Remove a set of nodes together with every edge touching any of them.
    /// Edges go first so no edge is ever left dangling.
    BatchDelete {
        ids: Vec<NodeId>,
        nodes: Vec<(usize, Node)>,
        edges: Vec<(usize, Edge)>,
    },
    /// Set positions; undo restores the old ones.
    BatchMove { moves: Vec<NodeMove> },
    /// Set one color on several nodes, remembering each node's old color.
    BatchRecolor {
        color: NodeColor,
        previous: Vec<(NodeId, NodeColor)>,
    },
    Rename {
        id: NodeId,
        old_title: String,
        new_title: String,
    },
    /// Apply a whole property snapshot (title, description, weight, color,
    /// category).
    EditProperties {
        id: NodeId,
        old: NodeProperties,
        new: NodeProperties,
    },
    /// Append freshly keyed nodes and edges as a single step.
    PasteGroup { nodes: Vec<Node>, edges: Vec<Edge> },
}

// ─── Constructors ────────────────────────────────────────────────────────

impl Command {
    pub fn add_node(node: Node) -> Self {
        Command::AddNode { node }
    }

    pub fn remove_node(id: NodeId) -> Self {
        Command::RemoveNode {
            id,
            removed: None,
            edges: Vec::new(),
        }
    }

    pub fn add_edge(edge: Edge) -> Self {
        Command::AddEdge { edge }
    }

    pub fn remove_edge(id: EdgeId) -> Self {
        Command::RemoveEdge { id, removed: None }
    }

    pub fn batch_delete(ids: impl IntoIterator<Item = NodeId>) -> Self {
        let mut unique: Vec<NodeId> = Vec::new();
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        Command::BatchDelete {
            ids: unique,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn batch_move(moves: Vec<NodeMove>) -> Self {
        Command::BatchMove { moves }
    }

    /// Capture the current color of every listed node that exists.
    pub fn batch_recolor(diagram: &Diagram, ids: &[NodeId], color: NodeColor) -> Self {
        let previous = ids
            .iter()
            .filter_map(|id| diagram.node(*id).map(|n| (n.id, n.color)))
            .collect();
        Command::BatchRecolor { color, previous }
    }

    /// `None` when the node does not exist.
    pub fn rename(diagram: &Diagram, id: NodeId, title: impl Into<String>) -> Option<Self> {
        let node = diagram.node(id)?;
        Some(Command::Rename {
            id,
            old_title: node.title.clone(),
            new_title: title.into(),
        })
    }

    /// Snapshot the node's current properties as the undo state.
    /// `None` when the node does not exist.
    pub fn edit_properties(diagram: &Diagram, id: NodeId, new: NodeProperties) -> Option<Self> {
        let old = diagram.node(id)?.properties();
        Some(Command::EditProperties { id, old, new })
    }

    pub fn paste_group(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Command::PasteGroup { nodes, edges }
    }

    /// Human-readable label, e.g. for an "Undo …" menu item.
    pub fn description(&self) -> String {
        match self {
            Command::AddNode { .. } => "Add node".to_string(),
            Command::RemoveNode { .. } => "Delete node".to_string(),
            Command::AddEdge { .. } => "Add relation".to_string(),
            Command::RemoveEdge { .. } => "Delete relation".to_string(),
            Command::BatchDelete { ids, .. } => plural("Delete", ids.len()),
            Command::BatchMove { moves } => plural("Move", moves.len()),
            Command::BatchRecolor { previous, .. } => plural("Recolor", previous.len()),
            Command::Rename { .. } => "Rename node".to_string(),
            Command::EditProperties { .. } => "Edit properties".to_string(),
            Command::PasteGroup { nodes, .. } => plural("Paste", nodes.len()),
        }
    }
}

fn plural(verb: &str, n: usize) -> String {
    if n == 1 {
        format!("{verb} node")
    } else {
        format!("{verb} {n} nodes")
    }
}

// ─── Execute / Undo ──────────────────────────────────────────────────────

impl Command {
    pub fn execute(&mut self, diagram: &mut Diagram) {
        match self {
            Command::AddNode { node } => {
                if diagram.contains_node(node.id) {
                    log::warn!("add node: {:?} already present", node.id);
                } else {
                    diagram.push_node(node.clone());
                }
            }
            Command::RemoveNode { id, removed, edges } => {
                *edges = take_edges(diagram, |e| e.touches(*id));
                *removed = diagram.remove_node(*id);
                if removed.is_none() {
                    log::warn!("remove node: {id:?} not found");
                }
            }
            Command::AddEdge { edge } => {
                if diagram.contains_edge(edge.id) {
                    log::warn!("add edge: {:?} already present", edge.id);
                } else {
                    diagram.push_edge(edge.clone());
                }
            }
            Command::RemoveEdge { id, removed } => {
                *removed = diagram.remove_edge(*id);
                if removed.is_none() {
                    log::warn!("remove edge: {id:?} not found");
                }
            }
            Command::BatchDelete { ids, nodes, edges } => {
                *edges = take_edges(diagram, |e| ids.iter().any(|id| e.touches(*id)));
                *nodes = take_nodes(diagram, ids);
                if nodes.len() < ids.len() {
                    log::warn!(
                        "batch delete: {} of {} nodes not found",
                        ids.len() - nodes.len(),
                        ids.len()
                    );
                }
            }
            Command::BatchMove { moves } => {
                for m in moves.iter() {
                    set_position(diagram, m.id, m.to);
                }
            }
            Command::BatchRecolor { color, previous } => {
                for (id, _) in previous.iter() {
                    match diagram.node_mut(*id) {
                        Some(node) => node.color = *color,
                        None => log::warn!("recolor: {id:?} not found"),
                    }
                }
            }
            Command::Rename { id, new_title, .. } => match diagram.node_mut(*id) {
                Some(node) => node.title.clone_from(new_title),
                None => log::warn!("rename: {id:?} not found"),
            },
            Command::EditProperties { id, new, .. } => match diagram.node_mut(*id) {
                Some(node) => node.apply_properties(new),
                None => log::warn!("edit properties: {id:?} not found"),
            },
            Command::PasteGroup { nodes, edges } => {
                for node in nodes.iter() {
                    if !diagram.contains_node(node.id) {
                        diagram.push_node(node.clone());
                    }
                }
                for edge in edges.iter() {
                    if !diagram.contains_edge(edge.id) {
                        diagram.push_edge(edge.clone());
                    }
                }
            }
        }
    }

    pub fn undo(&mut self, diagram: &mut Diagram) {
        match self {
            Command::AddNode { node } => match diagram.remove_node(node.id) {
                // Redo re-adds the node as it was when removed.
                Some((_, current)) => *node = current,
                None => log::warn!("undo add node: {:?} not found", node.id),
            },
            Command::RemoveNode { removed, edges, .. } => {
                if let Some((index, node)) = removed.take() {
                    diagram.insert_node(index, node);
                }
                restore_edges(diagram, std::mem::take(edges));
            }
            Command::AddEdge { edge } => match diagram.remove_edge(edge.id) {
                Some((_, current)) => *edge = current,
                None => log::warn!("undo add edge: {:?} not found", edge.id),
            },
            Command::RemoveEdge { removed, .. } => {
                if let Some((index, edge)) = removed.take() {
                    if diagram.contains_edge(edge.id) {
                        log::warn!("undo remove edge: {:?} already present", edge.id);
                    } else {
                        diagram.insert_edge(index, edge);
                    }
                }
            }
            Command::BatchDelete { nodes, edges, .. } => {
                restore_nodes(diagram, std::mem::take(nodes));
                restore_edges(diagram, std::mem::take(edges));
            }
            Command::BatchMove { moves } => {
                for m in moves.iter() {
                    set_position(diagram, m.id, m.from);
                }
            }
            Command::BatchRecolor { previous, .. } => {
                for (id, color) in previous.iter() {
                    match diagram.node_mut(*id) {
                        Some(node) => node.color = *color,
                        None => log::warn!("undo recolor: {id:?} not found"),
                    }
                }
            }
            Command::Rename { id, old_title, .. } => match diagram.node_mut(*id) {
                Some(node) => node.title.clone_from(old_title),
                None => log::warn!("undo rename: {id:?} not found"),
            },
            Command::EditProperties { id, old, .. } => match diagram.node_mut(*id) {
                Some(node) => node.apply_properties(old),
                None => log::warn!("undo edit properties: {id:?} not found"),
            },
            Command::PasteGroup { nodes, edges } => {
                for edge in edges.iter_mut() {
                    if let Some((_, current)) = diagram.remove_edge(edge.id) {
                        *edge = current;
                    }
                }
                for node in nodes.iter_mut() {
                    if let Some((_, current)) = diagram.remove_node(node.id) {
                        *node = current;
                    }
                }
            }
        }
    }
}

fn set_position(diagram: &mut Diagram, id: NodeId, (x, y): (f64, f64)) {
    match diagram.node_mut(id) {
        Some(node) => {
            node.x = x;
            node.y = y;
        }
        None => log::warn!("move: {id:?} not found"),
    }
}

/// Remove every edge matching `pred`, returning each with its index in the
/// list as it was before any removal (ascending).
fn take_edges(diagram: &mut Diagram, pred: impl Fn(&Edge) -> bool) -> Vec<(usize, Edge)> {
    let mut taken = Vec::new();
    let mut original = 0;
    let mut i = 0;
    while i < diagram.edges.len() {
        if pred(&diagram.edges[i]) {
            taken.push((original, diagram.edges.remove(i)));
        } else {
            i += 1;
        }
        original += 1;
    }
    taken
}

fn take_nodes(diagram: &mut Diagram, ids: &[NodeId]) -> Vec<(usize, Node)> {
    let mut taken = Vec::new();
    let mut original = 0;
    let mut i = 0;
    while i < diagram.nodes.len() {
        if ids.contains(&diagram.nodes[i].id) {
            taken.push((original, diagram.nodes.remove(i)));
        } else {
            i += 1;
        }
        original += 1;
    }
    taken
}

/// Inverse of `take_*`: inserting in ascending original index puts every
/// entity back in its old slot.
fn restore_nodes(diagram: &mut Diagram, nodes: Vec<(usize, Node)>) {
    for (index, node) in nodes {
        if diagram.contains_node(node.id) {
            log::warn!("restore node: {:?} already present", node.id);
            continue;
        }
        diagram.insert_node(index, node);
    }
}

fn restore_edges(diagram: &mut Diagram, edges: Vec<(usize, Edge)>) {
    for (index, edge) in edges {
        if diagram.contains_edge(edge.id) {
            log::warn!("restore edge: {:?} already present", edge.id);
            continue;
        }
        diagram.insert_edge(index, edge);
    }
}
