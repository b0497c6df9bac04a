//! The capability set the engine needs from a rendering layer.
//!
//! The engine never owns render objects. It asks a [`RenderSurface`] for an
//! opaque [`BindingId`] per node or edge and afterwards only pushes
//! transforms, paths and classes to it, or queries measured geometry back.
//! A binding that was never measured answers `None` to geometry queries.

use crate::error::Result;
use crate::geometry::EdgePath;
use kurbo::{Affine, Rect};

/// Opaque handle to an object owned by the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub u32);

/// Z-ordered layer groups, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Background,
    Grid,
    Edges,
    Nodes,
    Temp,
    Ui,
    Debug,
}

impl Layer {
    pub const ALL: [Layer; 7] = [
        Layer::Background,
        Layer::Grid,
        Layer::Edges,
        Layer::Nodes,
        Layer::Temp,
        Layer::Ui,
        Layer::Debug,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Layer::Background => "background",
            Layer::Grid => "grid",
            Layer::Edges => "edges",
            Layer::Nodes => "nodes",
            Layer::Temp => "temp",
            Layer::Ui => "ui",
            Layer::Debug => "debug",
        }
    }
}

/// What a binding draws.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingKind {
    /// A node icon. `visual` is the icon/shape reference.
    Node { visual: String, class: String },
    Edge { class: String },
    /// The rubber line that follows the pointer while creating an edge.
    TempEdge,
}

pub trait RenderSurface {
    /// Create a binding attached to `layer`.
    fn create_binding(&mut self, layer: Layer, kind: BindingKind) -> Result<BindingId>;

    /// Detach and drop a binding. Unknown ids are ignored.
    fn detach(&mut self, binding: BindingId);

    /// Move a binding to another layer. Returns `false` for unknown ids.
    fn move_to_layer(&mut self, binding: BindingId, layer: Layer) -> bool;

    /// Set a binding's transform in logical space.
    fn set_transform(&mut self, binding: BindingId, transform: Affine);

    /// Set (or clear) the drawn path of an edge binding.
    fn set_path(&mut self, binding: BindingId, path: Option<EdgePath>);

    fn set_class(&mut self, binding: BindingId, class: &str);

    /// Current logical → screen matrix of the whole drawing.
    fn set_view_transform(&mut self, view: Affine);

    /// Local bounding box of the binding's content, if it has been measured.
    fn bbox(&self, binding: BindingId) -> Option<Rect>;

    /// Full local → screen matrix of a binding, if it is attached.
    fn screen_matrix(&self, binding: BindingId) -> Option<Affine>;

    fn set_layer_visible(&mut self, _layer: Layer, _visible: bool) {}

    fn set_layer_opacity(&mut self, _layer: Layer, _opacity: f64) {}
}

// ─── Layer manager ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
struct LayerState {
    visible: bool,
    opacity: f64,
}

/// Organizes bindings into the z-ordered layer groups and tracks
/// per-layer visibility and opacity.
#[derive(Debug, Clone)]
pub struct LayerManager {
    states: [LayerState; 7],
}

impl Default for LayerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerManager {
    pub fn new() -> Self {
        Self {
            states: [LayerState {
                visible: true,
                opacity: 1.0,
            }; 7],
        }
    }

    /// Back-to-front paint order.
    pub fn order(&self) -> &'static [Layer] {
        &Layer::ALL
    }

    /// Layer a binding of this kind belongs to.
    pub fn layer_for(kind: &BindingKind) -> Layer {
        match kind {
            BindingKind::Node { .. } => Layer::Nodes,
            BindingKind::Edge { .. } => Layer::Edges,
            BindingKind::TempEdge => Layer::Temp,
        }
    }

    /// Create a binding on the layer matching its kind.
    pub fn attach<S: RenderSurface + ?Sized>(
        &self,
        surface: &mut S,
        kind: BindingKind,
    ) -> Result<BindingId> {
        let layer = Self::layer_for(&kind);
        let id = surface.create_binding(layer, kind)?;
        log::trace!("binding {:?} attached to {} layer", id, layer.name());
        Ok(id)
    }

    pub fn move_to_layer<S: RenderSurface + ?Sized>(
        &self,
        surface: &mut S,
        binding: BindingId,
        layer: Layer,
    ) -> bool {
        surface.move_to_layer(binding, layer)
    }

    pub fn is_visible(&self, layer: Layer) -> bool {
        self.state(layer).visible
    }

    pub fn opacity(&self, layer: Layer) -> f64 {
        self.state(layer).opacity
    }

    pub fn hide<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, layer: Layer) {
        self.set_visible(surface, layer, false);
    }

    pub fn show<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, layer: Layer) {
        self.set_visible(surface, layer, true);
    }

    /// Flip visibility. Returns the new state.
    pub fn toggle<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, layer: Layer) -> bool {
        let visible = !self.is_visible(layer);
        self.set_visible(surface, layer, visible);
        visible
    }

    pub fn set_opacity<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        layer: Layer,
        opacity: f64,
    ) {
        let opacity = opacity.clamp(0.0, 1.0);
        self.states[layer as usize].opacity = opacity;
        surface.set_layer_opacity(layer, opacity);
    }

    fn set_visible<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, layer: Layer, visible: bool) {
        self.states[layer as usize].visible = visible;
        surface.set_layer_visible(layer, visible);
        log::debug!(
            "{} layer {}",
            layer.name(),
            if visible { "shown" } else { "hidden" }
        );
    }

    fn state(&self, layer: Layer) -> LayerState {
        self.states[layer as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_paint_under_nodes() {
        let layers = LayerManager::new();
        let order = layers.order();
        let edges = order.iter().position(|l| *l == Layer::Edges).unwrap();
        let nodes = order.iter().position(|l| *l == Layer::Nodes).unwrap();
        assert!(edges < nodes);
        assert!(Layer::Edges < Layer::Nodes);
    }

    #[test]
    fn kinds_map_to_layers() {
        assert_eq!(
            LayerManager::layer_for(&BindingKind::Edge { class: "c".into() }),
            Layer::Edges
        );
        assert_eq!(LayerManager::layer_for(&BindingKind::TempEdge), Layer::Temp);
    }
}
