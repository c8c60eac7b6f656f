//! Node geometry: the one place that decides how big a node is.
//!
//! Painting, hit testing and edge endpoints all go through
//! [`Geometry::node_bounds`], so what is drawn is exactly what is clickable.
//! A host with real font metrics plugs them in through [`TextMeasure`].

use cd_core::model::{Diagram, Edge, Node};
use kurbo::{Line, Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Measures the rendered extent of a title string.
pub trait TextMeasure {
    fn measure(&self, text: &str) -> Size;
}

/// Sizing rules for node boxes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeMetrics {
    pub min_width: f64,
    pub min_height: f64,
    /// Space between the title and the border, per side.
    pub padding: f64,
    /// Advance of one glyph for [`ApproxTextMeasure`].
    pub char_width: f64,
    pub line_height: f64,
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self {
            min_width: 120.0,
            min_height: 60.0,
            padding: 10.0,
            char_width: 7.0,
            line_height: 17.0,
        }
    }
}

/// Fixed-advance text metrics. Good enough for headless use and tests;
/// a UI host should supply its font's real metrics instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproxTextMeasure {
    pub char_width: f64,
    pub line_height: f64,
}

impl TextMeasure for ApproxTextMeasure {
    fn measure(&self, text: &str) -> Size {
        let (lines, widest) = text
            .lines()
            .fold((0usize, 0usize), |(n, w), line| (n + 1, w.max(line.chars().count())));
        Size::new(
            widest as f64 * self.char_width,
            lines as f64 * self.line_height,
        )
    }
}

pub struct Geometry {
    pub metrics: NodeMetrics,
    text: Box<dyn TextMeasure>,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(NodeMetrics::default())
    }
}

impl Geometry {
    /// Geometry backed by [`ApproxTextMeasure`] derived from `metrics`.
    pub fn new(metrics: NodeMetrics) -> Self {
        let text = ApproxTextMeasure {
            char_width: metrics.char_width,
            line_height: metrics.line_height,
        };
        Self::with_text_measure(metrics, text)
    }

    pub fn with_text_measure(metrics: NodeMetrics, text: impl TextMeasure + 'static) -> Self {
        Self {
            metrics,
            text: Box::new(text),
        }
    }

    /// Box size for a title: text extent plus padding, never below the
    /// minimum.
    pub fn measure_node_size(&self, title: &str) -> Size {
        let min = Size::new(self.metrics.min_width, self.metrics.min_height);
        if title.is_empty() {
            return min;
        }
        let text = self.text.measure(title);
        let pad = self.metrics.padding * 2.0;
        Size::new(
            min.width.max(text.width + pad),
            min.height.max(text.height + pad),
        )
    }

    /// Axis-aligned box centred on the node's position.
    pub fn node_bounds(&self, node: &Node) -> Rect {
        let size = self.measure_node_size(&node.title);
        Rect::from_center_size(Point::new(node.x, node.y), size)
    }

    /// The visible segment of an edge: from the border of `from` to the
    /// border of `to`. `None` when an endpoint is missing.
    pub fn edge_segment(&self, diagram: &Diagram, edge: &Edge) -> Option<Line> {
        let from = diagram.node(edge.from)?;
        let to = diagram.node(edge.to)?;
        Some(self.segment_between(from, to))
    }

    pub fn segment_between(&self, from: &Node, to: &Node) -> Line {
        let start = boundary_point_towards(self.node_bounds(from), Point::new(to.x, to.y));
        let end = boundary_point_towards(self.node_bounds(to), Point::new(from.x, from.y));
        Line::new(start, end)
    }
}

/// Where the ray from the center of `rect` towards `target` leaves the
/// rectangle. Coincident points yield the center.
pub fn boundary_point_towards(rect: Rect, target: Point) -> Point {
    let center = rect.center();
    let d = target - center;
    let len = d.hypot();
    if len < 1e-4 {
        return center;
    }
    let (ux, uy) = (d.x / len, d.y / len);
    let tx = (rect.width() / 2.0 / ux).abs();
    let ty = (rect.height() / 2.0 / uy).abs();
    let t = tx.min(ty);
    Point::new(center.x + ux * t, center.y + uy * t)
}

/// Distance from `p` to the segment `line`, projecting onto the segment
/// and clamping to its ends.
pub fn distance_to_segment(p: Point, line: Line) -> f64 {
    let ab = line.p1 - line.p0;
    let len_sq = ab.hypot2();
    if len_sq == 0.0 {
        return (p - line.p0).hypot();
    }
    let t = ((p - line.p0).dot(ab) / len_sq).clamp(0.0, 1.0);
    let proj = line.p0 + ab * t;
    (p - proj).hypot()
}
