//! Editor configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes: `{"canvas": {"width": 5000}}` is a complete config.

use cd_core::model::{NodeCategory, NodeColor};
use cd_render::{NodeMetrics, Rect, ZoomLimits};
use serde::{Deserialize, Serialize};

/// World-space drawing area. Dragging keeps node centers inside it,
/// `margin` units away from each edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 3000.0,
            height: 2000.0,
            margin: 20.0,
        }
    }
}

impl CanvasConfig {
    /// The region node centers may occupy.
    pub fn drag_bounds(&self) -> Rect {
        Rect::new(
            self.margin,
            self.margin,
            self.width - self.margin,
            self.height - self.margin,
        )
    }
}

/// What a click in AddNode mode creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewNodeTemplate {
    pub title: String,
    pub color: NodeColor,
    pub category: NodeCategory,
}

impl Default for NewNodeTemplate {
    fn default() -> Self {
        Self {
            title: "New factor".to_string(),
            color: NodeColor::Yellow,
            category: NodeCategory::Component,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub canvas: CanvasConfig,
    pub node_metrics: NodeMetrics,
    pub zoom: ZoomLimits,
    /// Screen pixels; divided by zoom when testing edges.
    pub edge_hit_tolerance: f64,
    /// A drag shorter than this (world units) records no history.
    pub drag_epsilon: f64,
    pub paste_offset: (f64, f64),
    pub new_node: NewNodeTemplate,
    /// Maximum undo depth. `None` is unlimited.
    pub history_limit: Option<usize>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasConfig::default(),
            node_metrics: NodeMetrics::default(),
            zoom: ZoomLimits::default(),
            edge_hit_tolerance: 6.0,
            drag_epsilon: 0.5,
            paste_offset: (20.0, 20.0),
            new_node: NewNodeTemplate::default(),
            history_limit: None,
        }
    }
}

impl EditorConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
