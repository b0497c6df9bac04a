//! Small geometry value types shared by nodes, edges, and the view.
//!
//! Points and matrices are `kurbo` types; this module only adds the
//! diagram-specific shapes on top.

use kurbo::{Affine, Point, Rect};

/// A node's anchor circle: centre plus radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Center {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Center {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self { x, y, radius }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.radius.is_finite() && self.radius >= 0.0
    }

    pub fn contains(&self, p: Point) -> bool {
        self.point().distance(p) <= self.radius
    }
}

/// Outcome of a centre query.
///
/// `Default` is not an error: it is what a node reports before its render
/// binding has been measured (fresh clones, detached nodes).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    Computed(Center),
    Default(Center),
}

impl Geometry {
    pub fn center(&self) -> Center {
        match self {
            Geometry::Computed(c) | Geometry::Default(c) => *c,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Geometry::Computed(_))
    }
}

/// A straight edge segment in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgePath {
    pub start: Point,
    pub end: Point,
}

impl EdgePath {
    /// Segment between two anchor circles, trimmed so it starts and ends
    /// on the circle outlines rather than the centres.
    pub fn between(from: Center, to: Center) -> Self {
        let d = to.point() - from.point();
        let len = d.hypot();
        let len = if len > 0.0 { len } else { 1.0 };
        Self {
            start: from.point() + d * (from.radius / len),
            end: to.point() - d * (to.radius / len),
        }
    }

    /// Segment from an anchor circle outline to a free point (the pointer
    /// end of a temporary edge).
    pub fn to_point(from: Center, target: Point) -> Self {
        let d = target - from.point();
        let len = d.hypot();
        let len = if len > 0.0 { len } else { 1.0 };
        Self {
            start: from.point() + d * (from.radius / len),
            end: target,
        }
    }

    /// SVG path data, `M x1 y1 L x2 y2`.
    pub fn to_svg_d(&self) -> String {
        format!(
            "M {} {} L {} {}",
            self.start.x, self.start.y, self.end.x, self.end.y
        )
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

/// Normalize a drag rectangle from two corner points.
pub fn normalize_rect(a: Point, b: Point) -> Rect {
    Rect::from_points(a, b)
}

pub fn affine_is_finite(m: &Affine) -> bool {
    m.as_coeffs().iter().all(|c| c.is_finite())
}

pub fn rect_is_finite(r: &Rect) -> bool {
    r.x0.is_finite() && r.y0.is_finite() && r.x1.is_finite() && r.y1.is_finite()
}
