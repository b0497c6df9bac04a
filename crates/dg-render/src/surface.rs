//! In-memory retained scene.
//!
//! `SceneSurface` keeps one record per binding: its layer, kind,
//! transform, path and class. It is the surface the editor runs against
//! headless and the source the SVG exporter paints from.
//!
//! Node bindings are measured as an icon-sized box. A surface built with
//! [`SceneSurface::deferred`] leaves new bindings unmeasured until the next
//! [`render_pass`](SceneSurface::render_pass), the way a freshly inserted
//! element has no layout yet.

use dg_core::geometry::EdgePath;
use dg_core::{BindingId, BindingKind, Error, Layer, RenderSurface, Result};
use kurbo::{Affine, Rect, Size};
use std::collections::BTreeMap;

/// Default icon box, matching the default node size.
pub const DEFAULT_ICON_SIZE: Size = Size::new(50.0, 50.0);

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub layer: Layer,
    pub kind: BindingKind,
    pub transform: Affine,
    pub path: Option<EdgePath>,
    pub class: String,
    pub measured: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LayerStyle {
    visible: bool,
    opacity: f64,
}

#[derive(Debug, Clone)]
pub struct SceneSurface {
    bindings: BTreeMap<BindingId, Binding>,
    next_id: u32,
    view: Affine,
    layers: [LayerStyle; 7],
    icon_size: Size,
    measure_on_create: bool,
    capacity: Option<usize>,
}

impl Default for SceneSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneSurface {
    /// A surface that measures bindings as soon as they are created.
    pub fn new() -> Self {
        Self {
            bindings: BTreeMap::new(),
            next_id: 0,
            view: Affine::IDENTITY,
            layers: [LayerStyle {
                visible: true,
                opacity: 1.0,
            }; 7],
            icon_size: DEFAULT_ICON_SIZE,
            measure_on_create: true,
            capacity: None,
        }
    }

    /// A surface whose new bindings stay unmeasured until `render_pass`.
    pub fn deferred() -> Self {
        Self {
            measure_on_create: false,
            ..Self::new()
        }
    }

    pub fn with_icon_size(mut self, size: Size) -> Self {
        self.icon_size = size;
        self
    }

    /// Refuse new bindings once `max` are live.
    pub fn with_capacity_limit(mut self, max: usize) -> Self {
        self.capacity = Some(max);
        self
    }

    /// Measure every binding. Returns how many were newly measured.
    pub fn render_pass(&mut self) -> usize {
        let mut n = 0;
        for b in self.bindings.values_mut().filter(|b| !b.measured) {
            b.measured = true;
            n += 1;
        }
        log::trace!("render pass measured {n} bindings");
        n
    }

    pub fn binding(&self, id: BindingId) -> Option<&Binding> {
        self.bindings.get(&id)
    }

    /// Live bindings in creation order.
    pub fn bindings(&self) -> impl Iterator<Item = (BindingId, &Binding)> {
        self.bindings.iter().map(|(id, b)| (*id, b))
    }

    pub fn bindings_on(&self, layer: Layer) -> impl Iterator<Item = (BindingId, &Binding)> {
        self.bindings().filter(move |(_, b)| b.layer == layer)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn view_transform(&self) -> Affine {
        self.view
    }

    pub fn is_layer_visible(&self, layer: Layer) -> bool {
        self.layers[layer as usize].visible
    }

    pub fn layer_opacity(&self, layer: Layer) -> f64 {
        self.layers[layer as usize].opacity
    }

    /// Whether a layer is drawn under the view transform. Edge and
    /// temporary paths are computed in screen space already.
    pub fn is_view_layer(layer: Layer) -> bool {
        !matches!(layer, Layer::Edges | Layer::Temp | Layer::Ui)
    }
}

impl RenderSurface for SceneSurface {
    fn create_binding(&mut self, layer: Layer, kind: BindingKind) -> Result<BindingId> {
        if let Some(max) = self.capacity
            && self.bindings.len() >= max
        {
            return Err(Error::SurfaceRejected {
                reason: format!("surface is limited to {max} bindings"),
            });
        }
        self.next_id += 1;
        let id = BindingId(self.next_id);
        let class = match &kind {
            BindingKind::Node { class, .. } | BindingKind::Edge { class } => class.clone(),
            BindingKind::TempEdge => "temp-edge".to_string(),
        };
        self.bindings.insert(
            id,
            Binding {
                layer,
                kind,
                transform: Affine::IDENTITY,
                path: None,
                class,
                measured: self.measure_on_create,
            },
        );
        Ok(id)
    }

    fn detach(&mut self, binding: BindingId) {
        if self.bindings.remove(&binding).is_none() {
            log::trace!("detach of unknown binding {binding:?}");
        }
    }

    fn move_to_layer(&mut self, binding: BindingId, layer: Layer) -> bool {
        match self.bindings.get_mut(&binding) {
            Some(b) => {
                b.layer = layer;
                true
            }
            None => false,
        }
    }

    fn set_transform(&mut self, binding: BindingId, transform: Affine) {
        if let Some(b) = self.bindings.get_mut(&binding) {
            b.transform = transform;
        }
    }

    fn set_path(&mut self, binding: BindingId, path: Option<EdgePath>) {
        if let Some(b) = self.bindings.get_mut(&binding) {
            b.path = path;
        }
    }

    fn set_class(&mut self, binding: BindingId, class: &str) {
        if let Some(b) = self.bindings.get_mut(&binding) {
            b.class = class.to_string();
        }
    }

    fn set_view_transform(&mut self, view: Affine) {
        self.view = view;
    }

    fn bbox(&self, binding: BindingId) -> Option<Rect> {
        let b = self.bindings.get(&binding)?;
        match b.kind {
            BindingKind::Node { .. } if b.measured => Some(self.icon_size.to_rect()),
            _ => None,
        }
    }

    fn screen_matrix(&self, binding: BindingId) -> Option<Affine> {
        let b = self.bindings.get(&binding)?;
        if Self::is_view_layer(b.layer) {
            Some(self.view * b.transform)
        } else {
            Some(b.transform)
        }
    }

    fn set_layer_visible(&mut self, layer: Layer, visible: bool) {
        self.layers[layer as usize].visible = visible;
    }

    fn set_layer_opacity(&mut self, layer: Layer, opacity: f64) {
        self.layers[layer as usize].opacity = opacity;
    }
}
