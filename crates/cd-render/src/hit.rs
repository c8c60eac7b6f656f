//! Hit testing: point → node / edge lookup.
//!
//! Walks the paint order in reverse (last painted = topmost) so the entity
//! the user sees on top is the one that is picked.

use crate::geometry::{Geometry, distance_to_segment};
use cd_core::id::{EdgeId, NodeId};
use cd_core::model::Diagram;
use kurbo::Point;

/// Find the topmost node whose box contains `p` (world space).
pub fn hit_test_node(diagram: &Diagram, geometry: &Geometry, p: Point) -> Option<NodeId> {
    diagram
        .nodes
        .iter()
        .rev()
        .find(|node| geometry.node_bounds(node).contains(p))
        .map(|node| node.id)
}

/// Find the topmost edge passing within `tolerance` of `p`.
///
/// `tolerance` is in screen pixels and is divided by `zoom`, so the
/// clickable width of a line stays the same at every zoom level.
pub fn hit_test_edge(
    diagram: &Diagram,
    geometry: &Geometry,
    p: Point,
    tolerance: f64,
    zoom: f64,
) -> Option<EdgeId> {
    let world_tolerance = tolerance / zoom.max(f64::EPSILON);
    diagram
        .edges
        .iter()
        .rev()
        .find(|edge| {
            geometry
                .edge_segment(diagram, edge)
                .is_some_and(|seg| distance_to_segment(p, seg) <= world_tolerance)
        })
        .map(|edge| edge.id)
}

impl Geometry {
    /// Method form of [`hit_test_node`].
    pub fn hit_test_node(&self, diagram: &Diagram, p: Point) -> Option<NodeId> {
        hit_test_node(diagram, self, p)
    }

    /// Method form of [`hit_test_edge`].
    pub fn hit_test_edge(
        &self,
        diagram: &Diagram,
        p: Point,
        tolerance: f64,
        zoom: f64,
    ) -> Option<EdgeId> {
        hit_test_edge(diagram, self, p, tolerance, zoom)
    }
}
