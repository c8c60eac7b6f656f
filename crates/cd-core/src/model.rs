//! Core data model for causal diagrams.
//!
//! A diagram is two ordered lists: nodes (factors) and edges (causal
//! relations). Order is paint order, so later entries are drawn on top and
//! win hit tests. Entities are addressed by stable ids and mutated in place;
//! nothing here replaces an entity with a new instance.
//!
//! Field names follow the persisted JSON layout (`Nodes`, `Edges`, `Id`,
//! `ColorName`, ...) so the model doubles as the file format.

use crate::error::ConnectError;
use crate::id::{EdgeId, NodeId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ─── Enumerations ────────────────────────────────────────────────────────

/// Declares a fieldless enum persisted as its integer discriminant and
/// accepted back as either the integer or the (case-insensitive) name.
macro_rules! persisted_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident = $value:literal),+ $(,)? }
        default = $default:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }

            pub fn from_index(index: u64) -> Option<Self> {
                match index {
                    $($value => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.name().eq_ignore_ascii_case(name.trim()))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_u8(*self as u8)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                match IndexOrName::deserialize(deserializer)? {
                    IndexOrName::Index(i) => Self::from_index(i).ok_or_else(|| {
                        serde::de::Error::custom(format!(
                            concat!("invalid ", stringify!($name), " index {}"),
                            i
                        ))
                    }),
                    IndexOrName::Name(s) => Self::from_name(&s).ok_or_else(|| {
                        serde::de::Error::custom(format!(
                            concat!("unknown ", stringify!($name), " `{}`"),
                            s
                        ))
                    }),
                }
            }
        }
    };
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IndexOrName {
    Index(u64),
    Name(String),
}

persisted_enum! {
    /// Which level of the analysed system a factor belongs to.
    pub enum NodeCategory {
        System = 0,
        Subsystem = 1,
        Component = 2,
        Process = 3,
        Human = 4,
    }
    default = Component
}

persisted_enum! {
    /// Color classification. Drives both the fill and the outline shape.
    pub enum NodeColor {
        Green = 0,
        Yellow = 1,
        /// Red factors are drawn with rounded corners.
        Red = 2,
    }
    default = Green
}

// ─── Node ────────────────────────────────────────────────────────────────

/// A factor in the diagram. `x`/`y` is the center in world space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub category: NodeCategory,
    #[serde(rename = "ColorName", default)]
    pub color: NodeColor,
    /// Transient visual state, never persisted.
    #[serde(skip)]
    pub highlighted: bool,
}

fn default_title() -> String {
    "Factor".to_string()
}

impl Node {
    /// A new node with a fresh id centred at `(x, y)`.
    pub fn new(title: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: NodeId::new(),
            title: title.into(),
            description: String::new(),
            x,
            y,
            weight: 0.0,
            category: NodeCategory::default(),
            color: NodeColor::default(),
            highlighted: false,
        }
    }

    pub fn with_color(mut self, color: NodeColor) -> Self {
        self.color = color;
        self
    }

    pub fn with_category(mut self, category: NodeCategory) -> Self {
        self.category = category;
        self
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Snapshot of the user-editable properties.
    pub fn properties(&self) -> NodeProperties {
        NodeProperties {
            title: self.title.clone(),
            description: self.description.clone(),
            weight: self.weight,
            color: self.color,
            category: self.category,
        }
    }

    /// Overwrite the user-editable properties in place. Id and position are
    /// left alone.
    pub fn apply_properties(&mut self, props: &NodeProperties) {
        self.title.clone_from(&props.title);
        self.description.clone_from(&props.description);
        self.weight = props.weight;
        self.color = props.color;
        self.category = props.category;
    }
}

/// The property-grid view of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeProperties {
    pub title: String,
    pub description: String,
    pub weight: f64,
    pub color: NodeColor,
    pub category: NodeCategory,
}

// ─── Edge ────────────────────────────────────────────────────────────────

/// A directed causal relation `from → to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    /// Advisory flag derived from the diagram's forbidden rules.
    #[serde(rename = "IsForbidden", default)]
    pub forbidden: bool,
    #[serde(skip)]
    pub highlighted: bool,
}

impl Edge {
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self {
            id: EdgeId::new(),
            from,
            to,
            forbidden: false,
            highlighted: false,
        }
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.from == node || self.to == node
    }

    /// Same endpoints, ignoring direction.
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }
}

// ─── Forbidden rules ─────────────────────────────────────────────────────

/// A category pair whose causal relation is flagged as suspicious.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ForbiddenRule {
    pub from_category: NodeCategory,
    pub to_category: NodeCategory,
    #[serde(default)]
    pub reason: String,
}

impl ForbiddenRule {
    pub fn new(from: NodeCategory, to: NodeCategory, reason: impl Into<String>) -> Self {
        Self {
            from_category: from,
            to_category: to,
            reason: reason.into(),
        }
    }

    pub fn matches(&self, from: NodeCategory, to: NodeCategory) -> bool {
        self.from_category == from && self.to_category == to
    }
}

impl fmt::Display for ForbiddenRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.from_category, self.to_category)?;
        if !self.reason.trim().is_empty() {
            write!(f, ": {}", self.reason)?;
        }
        Ok(())
    }
}

// ─── Diagram ─────────────────────────────────────────────────────────────

/// The whole document: ordered nodes, ordered edges, advisory rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Diagram {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub forbidden_rules: Vec<ForbiddenRule>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn node_index(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node_index(id).is_some()
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.iter_mut().find(|e| e.id == id)
    }

    pub fn edge_index(&self, id: EdgeId) -> Option<usize> {
        self.edges.iter().position(|e| e.id == id)
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edge_index(id).is_some()
    }

    /// Append on top of the paint order.
    pub fn push_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn push_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Insert at `index`, clamped to the current length.
    pub fn insert_node(&mut self, index: usize, node: Node) {
        let index = index.min(self.nodes.len());
        self.nodes.insert(index, node);
    }

    pub fn insert_edge(&mut self, index: usize, edge: Edge) {
        let index = index.min(self.edges.len());
        self.edges.insert(index, edge);
    }

    /// Remove a node (edges untouched). Returns its former index.
    pub fn remove_node(&mut self, id: NodeId) -> Option<(usize, Node)> {
        let index = self.node_index(id)?;
        Some((index, self.nodes.remove(index)))
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Option<(usize, Edge)> {
        let index = self.edge_index(id)?;
        Some((index, self.edges.remove(index)))
    }

    pub fn edges_touching(&self, node: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(move |e| e.touches(node))
    }

    /// The edge joining `a` and `b` in either direction, if any.
    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.connects(a, b))
    }

    /// Validate a prospective `from → to` relation.
    ///
    /// Uniqueness is checked without regard to direction: an existing
    /// `B → A` blocks a new `A → B`.
    pub fn check_connection(&self, from: NodeId, to: NodeId) -> Result<(), ConnectError> {
        if from == to {
            return Err(ConnectError::SelfLoop);
        }
        for id in [from, to] {
            if !self.contains_node(id) {
                return Err(ConnectError::MissingNode(id));
            }
        }
        if self.edge_between(from, to).is_some() {
            return Err(ConnectError::DuplicateEdge);
        }
        Ok(())
    }

    /// Build (but do not insert) a new edge `from → to`, with its forbidden
    /// flag evaluated against the current rules.
    pub fn propose_edge(&self, from: NodeId, to: NodeId) -> Result<Edge, ConnectError> {
        self.check_connection(from, to)?;
        let mut edge = Edge::new(from, to);
        edge.forbidden = self.forbidden_rule_for(from, to).is_some();
        Ok(edge)
    }

    /// First rule matching the categories of `from` and `to`, in that
    /// direction.
    pub fn forbidden_rule_for(&self, from: NodeId, to: NodeId) -> Option<&ForbiddenRule> {
        let from = self.node(from)?.category;
        let to = self.node(to)?.category;
        self.forbidden_rules.iter().find(|r| r.matches(from, to))
    }

    /// Recompute every edge's forbidden flag. Returns how many edges are
    /// flagged afterwards.
    pub fn refresh_forbidden_flags(&mut self) -> usize {
        let flags: Vec<bool> = self
            .edges
            .iter()
            .map(|e| self.forbidden_rule_for(e.from, e.to).is_some())
            .collect();
        for (edge, forbidden) in self.edges.iter_mut().zip(flags) {
            edge.forbidden = forbidden;
        }
        self.edges.iter().filter(|e| e.forbidden).count()
    }

    pub fn clear_highlights(&mut self) {
        self.nodes.iter_mut().for_each(|n| n.highlighted = false);
        self.edges.iter_mut().for_each(|e| e.highlighted = false);
    }

    /// Edges whose endpoints are not both present.
    pub fn dangling_edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges
            .iter()
            .filter(|e| !self.contains_node(e.from) || !self.contains_node(e.to))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}
