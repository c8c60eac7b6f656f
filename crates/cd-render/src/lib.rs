pub mod camera;
pub mod geometry;
pub mod hit;
pub mod paint;

pub use camera::{Camera, ZoomLimits};
pub use geometry::{
    ApproxTextMeasure, Geometry, NodeMetrics, TextMeasure, boundary_point_towards,
    distance_to_segment,
};
pub use hit::{hit_test_edge, hit_test_node};
pub use paint::{DisplayItem, DisplayList, PaintState, build_display_list};

// Re-export kurbo types so downstream crates don't need a direct dependency
pub use kurbo::{Affine, Line, Point, Rect, Size, Vec2};
