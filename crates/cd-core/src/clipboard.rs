//! Clipboard payload for copy / cut / paste of node groups.
//!
//! The payload is plain JSON so a host can put it on the OS clipboard
//! as text. Pasting always re-keys every entity with fresh ids.

use crate::id::NodeId;
use crate::model::{Diagram, Edge, Node};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClipboardData {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl ClipboardData {
    /// Capture `ids` in diagram order, plus every edge whose endpoints are
    /// both captured.
    pub fn capture(diagram: &Diagram, ids: &[NodeId]) -> Self {
        let nodes: Vec<Node> = diagram
            .nodes
            .iter()
            .filter(|n| ids.contains(&n.id))
            .cloned()
            .collect();
        let edges = diagram
            .edges
            .iter()
            .filter(|e| ids.contains(&e.from) && ids.contains(&e.to))
            .cloned()
            .collect();
        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn to_json(&self) -> String {
        // Only derived impls over plain fields; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// `None` when `text` is not a clipboard payload.
    pub fn from_json(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }

    /// Fresh copies offset by `(dx, dy)`. Node ids are regenerated and
    /// edges remapped onto them; edges referring to nodes outside the
    /// payload are dropped.
    pub fn instantiate(&self, dx: f64, dy: f64) -> (Vec<Node>, Vec<Edge>) {
        let mut remap: HashMap<NodeId, NodeId> = HashMap::with_capacity(self.nodes.len());
        let nodes: Vec<Node> = self
            .nodes
            .iter()
            .map(|src| {
                let mut node = src.clone();
                node.id = NodeId::new();
                node.x += dx;
                node.y += dy;
                node.highlighted = false;
                remap.insert(src.id, node.id);
                node
            })
            .collect();
        let edges = self
            .edges
            .iter()
            .filter_map(|src| {
                let from = *remap.get(&src.from)?;
                let to = *remap.get(&src.to)?;
                let mut edge = Edge::new(from, to);
                edge.forbidden = src.forbidden;
                Some(edge)
            })
            .collect();
        (nodes, edges)
    }
}
