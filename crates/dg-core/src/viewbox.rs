//! Viewport ownership: pan, zoom, reset, fit and the panning gesture.
//!
//! Every mutating call returns a [`ViewChange`] carrying the view before
//! and after, so gesture state expressed in logical space can be
//! re-anchored under the new view.

use crate::config::{EditorConfig, Viewport};
use crate::coords::CoordinateSystem;
use kurbo::{Point, Rect, Vec2};

/// A view transition. `old == new` when the call changed nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewChange {
    pub old: CoordinateSystem,
    pub new: CoordinateSystem,
}

impl ViewChange {
    pub fn is_noop(&self) -> bool {
        self.old == self.new
    }

    /// Logical point now under the screen position `logical` had before.
    pub fn remap(&self, logical: Point) -> Point {
        CoordinateSystem::transform_between(logical, &self.old, &self.new)
    }
}

#[derive(Debug, Clone)]
pub struct ViewBoxManager {
    coords: CoordinateSystem,
    viewport: Viewport,
    /// Last pointer position of an active panning gesture.
    pan_anchor: Option<Point>,
}

impl Default for ViewBoxManager {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl ViewBoxManager {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            coords: CoordinateSystem::new(config),
            viewport: config.viewport,
            pan_anchor: None,
        }
    }

    pub fn coords(&self) -> &CoordinateSystem {
        &self.coords
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn zoom_level(&self) -> f64 {
        self.coords.zoom_factor()
    }

    /// Zoom by `factor` about a screen anchor.
    pub fn zoom(&mut self, factor: f64, anchor: Point) -> ViewChange {
        self.change(|c| {
            c.set_zoom(factor, anchor);
        })
    }

    /// Zoom by `factor` about the centre of the viewport.
    pub fn zoom_centered(&mut self, factor: f64) -> ViewChange {
        let anchor = self.viewport_center();
        self.zoom(factor, anchor)
    }

    pub fn pan(&mut self, delta: Vec2) -> ViewChange {
        self.change(|c| c.set_pan(delta))
    }

    /// Back to zoom 1, no pan.
    pub fn reset_view(&mut self) -> ViewChange {
        self.pan_anchor = None;
        self.change(CoordinateSystem::reset)
    }

    /// Zoom and pan so `bounds` (logical) fills the viewport, centred.
    /// Empty or non-finite bounds leave the view unchanged.
    pub fn fit_to(&mut self, bounds: Rect) -> ViewChange {
        let w = bounds.width();
        let h = bounds.height();
        if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
            log::warn!("cannot fit view to {bounds:?}");
            return self.change(|_| {});
        }
        let zoom = (self.viewport.width / w).min(self.viewport.height / h);
        let center = self.viewport_center();
        self.change(|c| {
            c.set_view(Vec2::ZERO, zoom);
            let z = c.zoom_factor();
            c.set_view(center.to_vec2() - bounds.center().to_vec2() * z, z);
        })
    }

    // ─── Panning gesture ─────────────────────────────────────────────────

    pub fn is_panning(&self) -> bool {
        self.pan_anchor.is_some()
    }

    pub fn start_panning(&mut self, screen: Point) {
        log::debug!("panning started at {screen:?}");
        self.pan_anchor = Some(screen);
    }

    /// Pan by the pointer travel since the last call. No-op when not panning.
    pub fn update_panning(&mut self, screen: Point) -> ViewChange {
        let Some(last) = self.pan_anchor else {
            return self.change(|_| {});
        };
        self.pan_anchor = Some(screen);
        self.pan(screen - last)
    }

    pub fn stop_panning(&mut self) {
        if self.pan_anchor.take().is_some() {
            log::debug!("panning stopped");
        }
    }

    /// The part of logical space currently on screen.
    pub fn visible_logical_rect(&self) -> Rect {
        let a = self.coords.screen_to_logical(Point::ZERO);
        let b = self
            .coords
            .screen_to_logical(Point::new(self.viewport.width, self.viewport.height));
        Rect::from_points(a, b)
    }

    fn viewport_center(&self) -> Point {
        Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0)
    }

    fn change(&mut self, f: impl FnOnce(&mut CoordinateSystem)) -> ViewChange {
        let old = self.coords;
        f(&mut self.coords);
        let change = ViewChange {
            old,
            new: self.coords,
        };
        if !change.is_noop() {
            log::trace!(
                "view: zoom {:.3}, pan {:?}",
                self.coords.zoom_factor(),
                self.coords.pan_offset()
            );
        }
        change
    }
}
