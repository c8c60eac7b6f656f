//! Camera: pan offset + zoom factor, and the world ↔ screen transforms.
//!
//! `screen = world * zoom + pan`. Zooming keeps the world point under the
//! cursor fixed on screen.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Allowed zoom range and the per-notch wheel factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
    /// Multiplier applied per wheel notch.
    pub step: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: 0.1,
            max: 5.0,
            step: 1.1,
        }
    }
}

impl ZoomLimits {
    /// Repair limits read from user config: non-positive or non-finite
    /// bounds fall back to the defaults, and a reversed range is swapped.
    pub fn normalized(self) -> Self {
        let defaults = Self::default();
        let usable = |v: f64| v.is_finite() && v > 0.0;
        let mut min = if usable(self.min) { self.min } else { defaults.min };
        let mut max = if usable(self.max) { self.max } else { defaults.max };
        if min > max {
            log::warn!("zoom limits reversed ({min} > {max}), swapping");
            std::mem::swap(&mut min, &mut max);
        }
        let step = if usable(self.step) { self.step } else { defaults.step };
        Self { min, max, step }
    }

    /// Never panics, even on unnormalized limits.
    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.max(self.min).min(self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    zoom: f64,
    pan: Vec2,
    limits: ZoomLimits,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(ZoomLimits::default())
    }
}

impl Camera {
    pub fn new(limits: ZoomLimits) -> Self {
        let limits = limits.normalized();
        Self {
            zoom: limits.clamp(1.0),
            pan: Vec2::ZERO,
            limits,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn limits(&self) -> ZoomLimits {
        self.limits
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        (p.to_vec2() * self.zoom + self.pan).to_point()
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        ((p.to_vec2() - self.pan) / self.zoom).to_point()
    }

    /// The world → screen transform, for paint backends.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.zoom)
    }

    /// Convert a length in screen pixels to world units.
    pub fn screen_len_to_world(&self, len: f64) -> f64 {
        len / self.zoom
    }

    /// Zoom by `delta` wheel notches around the screen point `m`.
    /// Positive zooms in. Returns whether the zoom changed.
    pub fn zoom_at(&mut self, m: Point, delta: f64) -> bool {
        let target = self.zoom * self.limits.step.powf(delta);
        self.set_zoom_at(m, target)
    }

    /// Set an absolute zoom, keeping `screen_to_world(m)` fixed.
    pub fn set_zoom_at(&mut self, m: Point, zoom: f64) -> bool {
        let new_zoom = self.limits.clamp(zoom);
        let old_zoom = self.zoom;
        if (new_zoom - old_zoom).abs() < f64::EPSILON {
            return false;
        }
        let m = m.to_vec2();
        self.pan = m - (m - self.pan) * (new_zoom / old_zoom);
        self.zoom = new_zoom;
        log::trace!("zoom {old_zoom:.3} -> {new_zoom:.3}, pan {:?}", self.pan);
        true
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    pub fn reset(&mut self) {
        self.zoom = self.limits.clamp(1.0);
        self.pan = Vec2::ZERO;
    }

    /// The world-space region visible in a viewport of `size` pixels.
    pub fn visible_world_rect(&self, size: Size) -> Rect {
        let p0 = self.screen_to_world(Point::ORIGIN);
        let p1 = self.screen_to_world(Point::new(size.width, size.height));
        Rect::from_points(p0, p1)
    }
}
