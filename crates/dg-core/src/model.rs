//! Node and edge model.
//!
//! Nodes own their logical placement (`position`, `scale`) and hold an
//! opaque [`BindingId`] into the render surface. Edges refer to their
//! endpoints by [`Guid`] only; an endpoint that is not live makes the edge
//! undrawable, never invalid.

use crate::config::EditorConfig;
use crate::coords::CoordinateSystem;
use crate::error::Result;
use crate::geometry::{Center, EdgePath, Geometry, affine_is_finite, rect_is_finite};
use crate::id::Guid;
use crate::render::{BindingId, BindingKind, LayerManager, RenderSurface};
use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Records ─────────────────────────────────────────────────────────────

/// Plain node data as supplied by a loader or produced by `to_record`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: Guid,
    pub x: f64,
    pub y: f64,
    pub svg: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

/// Plain edge data. A missing `id` is generated on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Guid>,
    pub from: Guid,
    pub to: Guid,
    #[serde(default)]
    pub class: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutRecord {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

/// One entry of a position snapshot (worker channel).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub id: Guid,
    pub x: f64,
    pub y: f64,
}

// ─── Anchor capability ───────────────────────────────────────────────────

/// Anything an edge can attach to.
///
/// Implementors supply a measured centre (when the render layer can give
/// one) and a fallback; `transformed_center` picks between them. Every
/// node variant goes through this one contract.
pub trait Anchor {
    /// Centre measured from the render surface, in screen space.
    fn global_center(&self, surface: &dyn RenderSurface) -> Option<Center>;

    /// Centre derived from logical data alone, in screen space.
    fn fallback_center(&self, view: &CoordinateSystem) -> Center;

    fn transformed_center(&self, surface: &dyn RenderSurface, view: &CoordinateSystem) -> Geometry {
        match self.global_center(surface) {
            Some(c) if c.is_finite() => Geometry::Computed(c),
            _ => {
                log::warn!("no measured geometry; using default centre");
                Geometry::Default(self.fallback_center(view))
            }
        }
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// Per-node interaction state, mirrored into the binding's class list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum VisualState {
    #[default]
    Idle,
    Selected,
    Dragging,
    Scaling,
    EdgeSource,
}

impl VisualState {
    pub fn class_name(self) -> Option<&'static str> {
        match self {
            VisualState::Idle => None,
            VisualState::Selected => Some("selected"),
            VisualState::Dragging => Some("dragging"),
            VisualState::Scaling => Some("scaling"),
            VisualState::EdgeSource => Some("edge-source"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: Guid,
    position: Point,
    scale: f64,
    /// Icon/shape reference.
    pub visual: String,
    pub label: String,
    pub class: String,
    pub state: VisualState,
    /// Radius at scale 1, used until the binding has been measured.
    base_radius: f64,
    binding: Option<BindingId>,
}

impl Node {
    pub fn from_record(record: &NodeRecord, config: &EditorConfig) -> Self {
        let scale = record
            .scale
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(1.0);
        Self {
            id: record.id,
            position: Point::new(record.x, record.y),
            scale,
            visual: record.svg.clone(),
            label: record.label.clone(),
            class: record.class.clone(),
            state: VisualState::Idle,
            base_radius: config.default_radius(),
            binding: None,
        }
    }

    pub fn id(&self) -> Guid {
        self.id
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn binding(&self) -> Option<BindingId> {
        self.binding
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    /// Set the scale, clamped below by `min`. Non-finite values are ignored.
    pub fn set_scale(&mut self, scale: f64, min: f64) {
        if !scale.is_finite() {
            log::warn!("ignoring non-finite scale for {}", self.id);
            return;
        }
        self.scale = scale.max(min);
    }

    /// `translate(position) · scale(scale)`, the binding's logical transform.
    pub fn render_transform(&self) -> Affine {
        Affine::translate(self.position.to_vec2()) * Affine::scale(self.scale)
    }

    /// Class list pushed to the binding: own class plus visual state.
    pub fn css_class(&self) -> String {
        let mut out = String::from("node");
        if !self.class.is_empty() {
            out.push(' ');
            out.push_str(&self.class);
        }
        if let Some(state) = self.state.class_name() {
            out.push(' ');
            out.push_str(state);
        }
        out
    }

    /// Create this node's binding on the nodes layer and push its transform.
    pub fn attach(&mut self, surface: &mut dyn RenderSurface, layers: &LayerManager) -> Result<()> {
        let binding = layers.attach(
            surface,
            BindingKind::Node {
                visual: self.visual.clone(),
                class: self.css_class(),
            },
        )?;
        self.binding = Some(binding);
        self.sync(surface);
        Ok(())
    }

    pub fn detach(&mut self, surface: &mut dyn RenderSurface) {
        if let Some(binding) = self.binding.take() {
            surface.detach(binding);
        }
    }

    /// Push transform and class to the binding, if any.
    pub fn sync(&self, surface: &mut dyn RenderSurface) {
        if let Some(binding) = self.binding {
            surface.set_transform(binding, self.render_transform());
            surface.set_class(binding, &self.css_class());
        }
    }

    /// Copy this node under `new_id`, offset by the clone offset, with a fresh
    /// binding on the nodes layer. The copy is immediately usable as a
    /// drag target or edge endpoint even before the surface measures it.
    pub fn clone_onto(
        &self,
        new_id: Guid,
        surface: &mut dyn RenderSurface,
        layers: &LayerManager,
        config: &EditorConfig,
    ) -> Result<Node> {
        let (dx, dy) = config.clone_offset;
        let mut copy = Node {
            id: new_id,
            position: self.position + Vec2::new(dx, dy),
            scale: self.scale,
            visual: self.visual.clone(),
            label: format!("{}{}", self.label, config.clone_label_suffix),
            class: self.class.clone(),
            state: VisualState::Idle,
            base_radius: self.base_radius,
            binding: None,
        };
        copy.attach(surface, layers)?;
        log::debug!("cloned {} as {}", self.id, new_id);
        Ok(copy)
    }

    pub fn to_record(&self) -> NodeRecord {
        NodeRecord {
            id: self.id,
            x: self.position.x,
            y: self.position.y,
            svg: self.visual.clone(),
            label: self.label.clone(),
            class: self.class.clone(),
            scale: (self.scale != 1.0).then_some(self.scale),
        }
    }

    /// Whether a screen point falls inside the node's anchor circle.
    pub fn contains_point(&self, screen: Point, surface: &dyn RenderSurface, view: &CoordinateSystem) -> bool {
        self.transformed_center(surface, view).center().contains(screen)
    }
}

impl Anchor for Node {
    fn global_center(&self, surface: &dyn RenderSurface) -> Option<Center> {
        let binding = self.binding?;
        let bbox = surface.bbox(binding)?;
        let matrix = surface.screen_matrix(binding)?;
        if !rect_is_finite(&bbox) || !affine_is_finite(&matrix) {
            log::warn!("unusable geometry for {}; using default", self.id);
            return None;
        }
        let c = matrix * bbox.center();
        let local_r = bbox.width().min(bbox.height()) / 2.0;
        let [a, b, cc, d, _, _] = matrix.as_coeffs();
        let radius = local_r * (a.hypot(b) + cc.hypot(d)) / 2.0;
        Some(Center::new(c.x, c.y, radius))
    }

    fn fallback_center(&self, view: &CoordinateSystem) -> Center {
        let logical = CoordinateSystem::default_node_center(self.position, self.scale, self.base_radius);
        let p = view.logical_to_screen(logical.point());
        Center::new(p.x, p.y, logical.radius * view.zoom_factor())
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

/// Result of recomputing an edge's path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathUpdate {
    Drawn(EdgePath),
    /// An endpoint is missing or has no usable centre; nothing was drawn.
    Unresolved,
}

impl PathUpdate {
    pub fn is_drawn(&self) -> bool {
        matches!(self, PathUpdate::Drawn(_))
    }

    pub fn path(&self) -> Option<EdgePath> {
        match self {
            PathUpdate::Drawn(p) => Some(*p),
            PathUpdate::Unresolved => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    id: Guid,
    from: Guid,
    to: Guid,
    pub class: String,
    binding: Option<BindingId>,
    path: Option<EdgePath>,
    renderable: bool,
}

impl Edge {
    pub fn new(id: Guid, from: Guid, to: Guid, class: impl Into<String>) -> Self {
        Self {
            id,
            from,
            to,
            class: class.into(),
            binding: None,
            path: None,
            renderable: false,
        }
    }

    pub fn id(&self) -> Guid {
        self.id
    }

    pub fn from(&self) -> Guid {
        self.from
    }

    pub fn to(&self) -> Guid {
        self.to
    }

    pub fn binding(&self) -> Option<BindingId> {
        self.binding
    }

    /// Last path drawn, if the last update resolved.
    pub fn path(&self) -> Option<EdgePath> {
        self.path
    }

    /// Set by the most recent `update_path`.
    pub fn is_renderable(&self) -> bool {
        self.renderable
    }

    pub fn attach(&mut self, surface: &mut dyn RenderSurface, layers: &LayerManager) -> Result<()> {
        let binding = layers.attach(
            surface,
            BindingKind::Edge {
                class: self.class.clone(),
            },
        )?;
        self.binding = Some(binding);
        Ok(())
    }

    pub fn detach(&mut self, surface: &mut dyn RenderSurface) {
        if let Some(binding) = self.binding.take() {
            surface.detach(binding);
        }
    }

    /// Recompute the path from both endpoints' transformed centres.
    pub fn update_path(
        &mut self,
        from: Option<&Node>,
        to: Option<&Node>,
        surface: &mut dyn RenderSurface,
        view: &CoordinateSystem,
    ) -> PathUpdate {
        let update = match (from, to) {
            (Some(a), Some(b)) => {
                let ca = a.transformed_center(surface, view).center();
                let cb = b.transformed_center(surface, view).center();
                if ca.is_finite() && cb.is_finite() {
                    PathUpdate::Drawn(EdgePath::between(ca, cb))
                } else {
                    log::warn!("edge {} has an endpoint without usable geometry", self.id);
                    PathUpdate::Unresolved
                }
            }
            _ => {
                log::warn!("edge {} has a dangling endpoint ({} → {})", self.id, self.from, self.to);
                PathUpdate::Unresolved
            }
        };
        self.path = update.path();
        self.renderable = update.is_drawn();
        if let Some(binding) = self.binding {
            surface.set_path(binding, self.path);
        }
        log::trace!("edge {} path {:?}", self.id, self.path);
        update
    }

    /// Swap the endpoints. The id and binding stay; the path is stale until
    /// the next `update_path`.
    pub fn reverse(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
    }

    /// Replace the class and push it to the binding, if any.
    pub fn set_class(&mut self, class: impl Into<String>, surface: &mut dyn RenderSurface) {
        self.class = class.into();
        if let Some(binding) = self.binding {
            surface.set_class(binding, &self.class);
        }
    }

    pub fn connects_to(&self, node: Guid) -> bool {
        self.from == node || self.to == node
    }

    /// The endpoint opposite `node`, or `None` if the edge does not touch it.
    pub fn other_end(&self, node: Guid) -> Option<Guid> {
        if self.from == node {
            Some(self.to)
        } else if self.to == node {
            Some(self.from)
        } else {
            None
        }
    }

    /// Same unordered endpoint pair.
    pub fn is_equivalent_to(&self, other: &Edge) -> bool {
        self.joins(other.from, other.to)
    }

    pub fn joins(&self, a: Guid, b: Guid) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }

    pub fn to_record(&self) -> EdgeRecord {
        EdgeRecord {
            id: Some(self.id),
            from: self.from,
            to: self.to,
            class: self.class.clone(),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} → {})", self.id, self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::render::Layer;
    use kurbo::Rect;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    /// Surface that measures every binding as a 50×50 box.
    #[derive(Default)]
    struct BoxSurface {
        next: u32,
        transforms: HashMap<BindingId, Affine>,
        paths: HashMap<BindingId, Option<EdgePath>>,
        full: bool,
    }

    impl RenderSurface for BoxSurface {
        fn create_binding(&mut self, _layer: Layer, _kind: BindingKind) -> Result<BindingId> {
            if self.full {
                return Err(Error::SurfaceRejected {
                    reason: "full".into(),
                });
            }
            self.next += 1;
            Ok(BindingId(self.next))
        }
        fn detach(&mut self, binding: BindingId) {
            self.transforms.remove(&binding);
        }
        fn move_to_layer(&mut self, _binding: BindingId, _layer: Layer) -> bool {
            true
        }
        fn set_transform(&mut self, binding: BindingId, transform: Affine) {
            self.transforms.insert(binding, transform);
        }
        fn set_path(&mut self, binding: BindingId, path: Option<EdgePath>) {
            self.paths.insert(binding, path);
        }
        fn set_class(&mut self, _binding: BindingId, _class: &str) {}
        fn set_view_transform(&mut self, _view: Affine) {}
        fn bbox(&self, binding: BindingId) -> Option<Rect> {
            self.transforms
                .contains_key(&binding)
                .then(|| Rect::new(0.0, 0.0, 50.0, 50.0))
        }
        fn screen_matrix(&self, binding: BindingId) -> Option<Affine> {
            self.transforms.get(&binding).copied()
        }
    }

    fn record(id: &str, x: f64, y: f64) -> NodeRecord {
        NodeRecord {
            id: Guid::intern(id),
            x,
            y,
            svg: "server.svg".into(),
            label: "Server".into(),
            class: "infra".into(),
            scale: None,
        }
    }

    #[test]
    fn unattached_node_uses_fallback() {
        let node = Node::from_record(&record("n1", 100.0, 100.0), &EditorConfig::default());
        let surface = BoxSurface::default();
        let geom = node.transformed_center(&surface, &CoordinateSystem::default());
        assert_eq!(geom, Geometry::Default(Center::new(125.0, 125.0, 25.0)));
    }

    #[test]
    fn fallback_follows_view() {
        let node = Node::from_record(&record("n1", 100.0, 100.0), &EditorConfig::default());
        let mut view = CoordinateSystem::default();
        view.set_zoom(2.0, Point::ZERO);
        let c = node.fallback_center(&view);
        assert_eq!(c, Center::new(250.0, 250.0, 50.0));
    }

    #[test]
    fn measured_node_reports_computed_center() {
        let cfg = EditorConfig::default();
        let mut node = Node::from_record(&record("n1", 10.0, 20.0), &cfg);
        let mut surface = BoxSurface::default();
        node.attach(&mut surface, &LayerManager::new()).unwrap();
        let geom = node.transformed_center(&surface, &CoordinateSystem::default());
        assert_eq!(geom, Geometry::Computed(Center::new(35.0, 45.0, 25.0)));
    }

    #[test]
    fn clone_copies_data_with_fresh_id() {
        let cfg = EditorConfig::default();
        let node = Node::from_record(&record("orig", 100.0, 100.0), &cfg);
        let mut surface = BoxSurface::default();
        let copy = node
            .clone_onto(Guid::intern("copy"), &mut surface, &LayerManager::new(), &cfg)
            .unwrap();
        assert_ne!(copy.id(), node.id());
        assert_eq!(copy.position(), Point::new(150.0, 150.0));
        assert_eq!(copy.label, node.label);
        assert_eq!(copy.visual, node.visual);
        assert_eq!(copy.class, node.class);
        assert!(copy.binding().is_some());
    }

    #[test]
    fn configured_suffix_is_appended_to_clone_label() {
        let cfg = EditorConfig {
            clone_label_suffix: " copy".into(),
            ..EditorConfig::default()
        };
        let node = Node::from_record(&record("suffixed", 0.0, 0.0), &cfg);
        let copy = node
            .clone_onto(Guid::intern("suffixed_2"), &mut BoxSurface::default(), &LayerManager::new(), &cfg)
            .unwrap();
        assert_eq!(copy.label, "Server copy");
    }

    #[test]
    fn clone_fails_when_surface_is_full() {
        let cfg = EditorConfig::default();
        let node = Node::from_record(&record("orig", 0.0, 0.0), &cfg);
        let mut surface = BoxSurface {
            full: true,
            ..Default::default()
        };
        let err = node
            .clone_onto(Guid::intern("copy2"), &mut surface, &LayerManager::new(), &cfg)
            .unwrap_err();
        assert!(matches!(err, Error::SurfaceRejected { .. }));
    }

    #[test]
    fn scale_is_clamped() {
        let mut node = Node::from_record(&record("s", 0.0, 0.0), &EditorConfig::default());
        node.set_scale(0.01, 0.1);
        assert_eq!(node.scale(), 0.1);
        node.set_scale(f64::NAN, 0.1);
        assert_eq!(node.scale(), 0.1);
    }

    #[test]
    fn record_omits_unit_scale() {
        let node = Node::from_record(&record("r", 1.0, 2.0), &EditorConfig::default());
        assert_eq!(node.to_record(), record("r", 1.0, 2.0));
    }

    #[test]
    fn dangling_edge_is_unresolved() {
        let cfg = EditorConfig::default();
        let a = Node::from_record(&record("a", 0.0, 0.0), &cfg);
        let mut edge = Edge::new(Guid::intern("e"), a.id(), Guid::intern("missing"), "");
        let mut surface = BoxSurface::default();
        let update = edge.update_path(Some(&a), None, &mut surface, &CoordinateSystem::default());
        assert_eq!(update, PathUpdate::Unresolved);
        assert!(!edge.is_renderable());
    }

    #[test]
    fn edge_endpoints_queries() {
        let a = Guid::intern("a");
        let b = Guid::intern("b");
        let e1 = Edge::new(Guid::intern("e1"), a, b, "");
        let e2 = Edge::new(Guid::intern("e2"), b, a, "");
        assert!(e1.is_equivalent_to(&e2));
        assert_eq!(e1.other_end(a), Some(b));
        assert_eq!(e1.other_end(Guid::intern("c")), None);
        assert!(e1.connects_to(b));
    }

    #[test]
    fn reversed_edge_keeps_id_and_swaps_ends() {
        let a = Guid::intern("ra");
        let b = Guid::intern("rb");
        let mut edge = Edge::new(Guid::intern("re"), a, b, "flow");
        edge.reverse();
        assert_eq!((edge.id(), edge.from(), edge.to()), (Guid::intern("re"), b, a));
        assert_eq!(edge.to_record().class, "flow");
    }

    #[test]
    fn record_json_shape() {
        let json = r#"{"id":"n9","x":1,"y":2,"svg":"db.svg","label":"DB","class":"store","scale":2}"#;
        let rec: NodeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.scale, Some(2.0));
        let edge: EdgeRecord = serde_json::from_str(r#"{"from":"a","to":"b"}"#).unwrap();
        assert_eq!(edge.id, None);
        assert_eq!(edge.class, "");
    }
}
