//! Diagram → backend-agnostic display list.
//!
//! Items are emitted in paint order: edges, then nodes, then the rubber-band
//! line of a pending connection. Coordinates are world space; backends apply
//! `DisplayList::transform` once. Node boxes come from the same
//! [`Geometry`] the hit tester uses.

use crate::camera::Camera;
use crate::geometry::Geometry;
use cd_core::id::{EdgeId, NodeId};
use cd_core::model::{Diagram, Node, NodeColor};
use kurbo::{Affine, Line, Point, Rect, RoundedRect, Vec2};

const EDGE_WIDTH: f64 = 2.0;
const EDGE_WIDTH_SELECTED: f64 = 4.0;
const ARROW_WIDTH: f64 = 8.0;
const ARROW_LENGTH: f64 = 20.0;
const NODE_STROKE: f64 = 1.0;
const NODE_STROKE_SELECTED: f64 = 3.0;
const RED_CORNER_RADIUS: f64 = 15.0;
const PENDING_WIDTH: f64 = 2.0;
const PENDING_DASH: [f64; 2] = [6.0, 4.0];

/// An sRGB color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const GRAY: Rgb = Rgb(128, 128, 128);
    pub const DODGER_BLUE: Rgb = Rgb(30, 144, 255);
    pub const LIGHT_BLUE: Rgb = Rgb(173, 216, 230);
    pub const LIGHT_GREEN: Rgb = Rgb(144, 238, 144);
    pub const LIGHT_YELLOW: Rgb = Rgb(255, 255, 224);
    pub const LIGHT_CORAL: Rgb = Rgb(240, 128, 128);
    pub const CRIMSON: Rgb = Rgb(220, 20, 60);
    pub const ORANGE: Rgb = Rgb(255, 165, 0);
}

pub fn fill_for(color: NodeColor) -> Rgb {
    match color {
        NodeColor::Green => Rgb::LIGHT_GREEN,
        NodeColor::Yellow => Rgb::LIGHT_YELLOW,
        NodeColor::Red => Rgb::LIGHT_CORAL,
    }
}

/// What the paint pass needs from the interaction layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaintState<'a> {
    pub selected_nodes: &'a [NodeId],
    pub selected_edge: Option<EdgeId>,
    /// Start and current end of a connection being drawn.
    pub pending_connection: Option<(Point, Point)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeShape {
    Rect(Rect),
    Rounded(RoundedRect),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeItem {
    pub id: NodeId,
    pub shape: NodeShape,
    pub bounds: Rect,
    pub fill: Rgb,
    pub stroke: Rgb,
    pub stroke_width: f64,
    /// Drawn centred in `bounds`.
    pub title: String,
}

/// Arrow head as a closed triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowHead {
    pub tip: Point,
    pub left: Point,
    pub right: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeItem {
    pub id: EdgeId,
    pub line: Line,
    pub color: Rgb,
    /// World units; divided by zoom so lines keep a constant screen width.
    pub stroke_width: f64,
    pub arrow: Option<ArrowHead>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayItem {
    Edge(EdgeItem),
    Node(NodeItem),
    PendingConnection {
        line: Line,
        color: Rgb,
        stroke_width: f64,
        dash: [f64; 2],
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayList {
    /// World → screen.
    pub transform: Affine,
    pub items: Vec<DisplayItem>,
}

/// Build the display list for one frame.
pub fn build_display_list(
    diagram: &Diagram,
    geometry: &Geometry,
    camera: &Camera,
    state: PaintState<'_>,
) -> DisplayList {
    let zoom = camera.zoom();
    let mut items = Vec::with_capacity(diagram.edges.len() + diagram.nodes.len() + 1);

    for edge in &diagram.edges {
        let Some(line) = geometry.edge_segment(diagram, edge) else {
            log::trace!("PAINT skip dangling edge {:?}", edge.id);
            continue;
        };
        let selected = state.selected_edge == Some(edge.id);
        let color = if selected {
            Rgb::DODGER_BLUE
        } else if edge.forbidden {
            Rgb::CRIMSON
        } else if edge.highlighted {
            Rgb::ORANGE
        } else {
            Rgb::GRAY
        };
        let base = if selected { EDGE_WIDTH_SELECTED } else { EDGE_WIDTH };
        items.push(DisplayItem::Edge(EdgeItem {
            id: edge.id,
            line,
            color,
            stroke_width: base / zoom,
            arrow: arrow_head(line),
        }));
    }

    for node in &diagram.nodes {
        let selected = state.selected_nodes.contains(&node.id);
        log::trace!("PAINT node {:?} {:?} at ({}, {})", node.id, node.title, node.x, node.y);
        items.push(DisplayItem::Node(node_item(node, geometry, selected)));
    }

    if let Some((start, end)) = state.pending_connection {
        items.push(DisplayItem::PendingConnection {
            line: Line::new(start, end),
            color: Rgb::LIGHT_BLUE,
            stroke_width: PENDING_WIDTH / zoom,
            dash: PENDING_DASH,
        });
    }

    DisplayList {
        transform: camera.transform(),
        items,
    }
}

fn node_item(node: &Node, geometry: &Geometry, selected: bool) -> NodeItem {
    let bounds = geometry.node_bounds(node);
    let shape = match node.color {
        NodeColor::Red => NodeShape::Rounded(bounds.to_rounded_rect(RED_CORNER_RADIUS)),
        NodeColor::Green | NodeColor::Yellow => NodeShape::Rect(bounds),
    };
    let stroke = if selected {
        Rgb::DODGER_BLUE
    } else if node.highlighted {
        Rgb::ORANGE
    } else {
        Rgb::BLACK
    };
    NodeItem {
        id: node.id,
        shape,
        bounds,
        fill: fill_for(node.color),
        stroke,
        stroke_width: if selected { NODE_STROKE_SELECTED } else { NODE_STROKE },
        title: node.title.clone(),
    }
}

/// Triangle with its tip on `line.p1`. `None` for zero-length lines.
fn arrow_head(line: Line) -> Option<ArrowHead> {
    let d = line.p1 - line.p0;
    let len = d.hypot();
    if len < 1e-6 {
        return None;
    }
    let dir = d / len;
    let normal = Vec2::new(-dir.y, dir.x);
    let back = line.p1 - dir * ARROW_LENGTH.min(len);
    let half = ARROW_WIDTH / 2.0;
    Some(ArrowHead {
        tip: line.p1,
        left: back + normal * half,
        right: back - normal * half,
    })
}
