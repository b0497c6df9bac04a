//! Screen ↔ logical coordinate conversion.
//!
//! Coordinate spaces:
//!
//! - **Screen**: pointer coordinates in device pixels, relative to the canvas.
//! - **Logical**: the diagram's own space, independent of pan/zoom.
//! - **Local**: a node's content space, before its own translate/scale.
//!
//! The view maps logical to screen as `screen = pan + zoom · logical`.

use crate::config::EditorConfig;
use crate::geometry::{Center, affine_is_finite};
use kurbo::{Affine, Point, Vec2};

/// Pan/zoom state and the transform derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateSystem {
    pan: Vec2,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
}

impl Default for CoordinateSystem {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl CoordinateSystem {
    /// An identity view. An unusable zoom range in `config` is replaced
    /// by the default one.
    pub fn new(config: &EditorConfig) -> Self {
        let (min_zoom, max_zoom) = config.zoom_bounds();
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0f64.clamp(min_zoom, max_zoom),
            min_zoom,
            max_zoom,
        }
    }

    pub fn pan_offset(&self) -> Vec2 {
        self.pan
    }

    pub fn zoom_factor(&self) -> f64 {
        self.zoom
    }

    /// Logical → screen matrix.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.zoom)
    }

    /// Screen → logical matrix. Always defined: zoom never reaches zero.
    pub fn inverse(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.pan)
    }

    pub fn screen_to_logical(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.pan.x) / self.zoom,
            (screen.y - self.pan.y) / self.zoom,
        )
    }

    pub fn logical_to_screen(&self, logical: Point) -> Point {
        Point::new(
            logical.x * self.zoom + self.pan.x,
            logical.y * self.zoom + self.pan.y,
        )
    }

    /// Shift the view by a screen-space delta.
    pub fn set_pan(&mut self, delta: Vec2) {
        if !(delta.x.is_finite() && delta.y.is_finite()) {
            log::warn!("ignoring non-finite pan delta {delta:?}");
            return;
        }
        self.pan += delta;
    }

    /// Multiply the zoom by `factor`, keeping the screen point `anchor`
    /// fixed. Returns `false` (and changes nothing) for non-positive or
    /// non-finite factors. The result is clamped to the configured range.
    pub fn set_zoom(&mut self, factor: f64, anchor: Point) -> bool {
        if !(factor.is_finite() && factor > 0.0) {
            log::warn!("rejecting zoom factor {factor}");
            return false;
        }
        self.set_zoom_level(self.zoom * factor, anchor)
    }

    /// Set an absolute zoom level about a screen anchor.
    pub fn set_zoom_level(&mut self, level: f64, anchor: Point) -> bool {
        if !level.is_finite() {
            log::warn!("rejecting zoom level {level}");
            return false;
        }
        let level = level.clamp(self.min_zoom, self.max_zoom);
        let fixed = self.screen_to_logical(anchor);
        self.zoom = level;
        // Re-derive pan so `fixed` lands back on `anchor`.
        self.pan = anchor.to_vec2() - fixed.to_vec2() * level;
        true
    }

    /// Restore the identity view.
    pub fn reset(&mut self) {
        self.pan = Vec2::ZERO;
        self.zoom = 1.0f64.clamp(self.min_zoom, self.max_zoom);
    }

    /// Replace pan and zoom wholesale (zoom is clamped).
    pub fn set_view(&mut self, pan: Vec2, zoom: f64) {
        self.pan = pan;
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    // ─── Local spaces ────────────────────────────────────────────────────

    /// Map a local point through a content matrix. Singular or non-finite
    /// matrices fall back to identity.
    pub fn local_to_screen(&self, local: Point, matrix: &Affine) -> Point {
        if !usable(matrix) {
            log::warn!("unusable content matrix; using identity");
            return local;
        }
        *matrix * local
    }

    pub fn screen_to_local(&self, screen: Point, matrix: &Affine) -> Point {
        if !usable(matrix) {
            log::warn!("unusable content matrix; using identity");
            return screen;
        }
        matrix.inverse() * screen
    }

    /// Scale a local radius by the mean axis scale of `matrix`.
    pub fn transform_radius(&self, radius: f64, matrix: &Affine) -> f64 {
        let [a, b, c, d, _, _] = matrix.as_coeffs();
        let sx = a.hypot(b);
        let sy = c.hypot(d);
        radius * (sx + sy) / 2.0
    }

    pub fn distance(&self, a: Point, b: Point) -> f64 {
        a.distance(b)
    }

    /// The logical point that sits under the same screen position in view
    /// `new` as `logical` did in view `old`.
    pub fn transform_between(logical: Point, old: &CoordinateSystem, new: &CoordinateSystem) -> Point {
        new.screen_to_logical(old.logical_to_screen(logical))
    }

    /// Anchor circle for a node that has never been measured.
    pub fn default_node_center(position: Point, scale: f64, default_radius: f64) -> Center {
        let r = default_radius * scale;
        Center::new(position.x + r, position.y + r, r)
    }
}

fn usable(matrix: &Affine) -> bool {
    affine_is_finite(matrix) && matrix.determinant().abs() > f64::EPSILON
}
