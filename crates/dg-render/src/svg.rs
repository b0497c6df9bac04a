//! SVG export of the current scene.
//!
//! Paints layer groups back to front. Edge paths are already in screen
//! space; nodes are drawn inside a group carrying the view transform.

use crate::surface::{DEFAULT_ICON_SIZE, SceneSurface};
use dg_core::{BindingKind, Layer, LayerManager, NodeStateManager, Viewport};
use kurbo::Affine;
use std::fmt::Write;

pub fn render_svg(
    store: &NodeStateManager,
    surface: &SceneSurface,
    layers: &LayerManager,
    viewport: Viewport,
) -> String {
    let Viewport { width, height } = viewport;
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
    );
    svg.push_str("<style>\n");
    svg.push_str("  text { font-family: Inter, system-ui, sans-serif; font-size: 12px; }\n");
    svg.push_str("  .edge { stroke: #555; stroke-width: 2; fill: none; }\n");
    svg.push_str("  .temp-edge { stroke: #888; stroke-dasharray: 4 4; fill: none; }\n");
    svg.push_str("</style>\n");

    for &layer in layers.order() {
        if !surface.is_layer_visible(layer) {
            continue;
        }
        let opacity = surface.layer_opacity(layer);
        let mut open = format!("<g class=\"layer-{}\"", layer.name());
        if opacity < 1.0 {
            let _ = write!(open, " opacity=\"{opacity}\"");
        }
        if SceneSurface::is_view_layer(layer) {
            let _ = write!(open, " transform=\"{}\"", matrix_attr(surface.view_transform()));
        }
        svg.push_str(&open);
        svg.push_str(">\n");

        match layer {
            Layer::Nodes => render_nodes(&mut svg, store, surface),
            _ => render_paths(&mut svg, surface, layer),
        }
        svg.push_str("</g>\n");
    }

    svg.push_str("</svg>");
    svg
}

fn render_nodes(out: &mut String, store: &NodeStateManager, surface: &SceneSurface) {
    for node in store.nodes() {
        let Some(binding) = node.binding().and_then(|b| surface.binding(b)) else {
            continue;
        };
        if binding.layer != Layer::Nodes {
            continue;
        }
        let _ = writeln!(
            out,
            "  <g id=\"{}\" class=\"{}\" transform=\"{}\">",
            escape(node.id().as_str()),
            escape(&binding.class),
            matrix_attr(binding.transform)
        );
        let _ = writeln!(
            out,
            "    <image href=\"{}\" width=\"{}\" height=\"{}\" />",
            escape(&node.visual),
            DEFAULT_ICON_SIZE.width,
            DEFAULT_ICON_SIZE.height
        );
        if !node.label.is_empty() {
            let _ = writeln!(
                out,
                "    <text x=\"{}\" y=\"{}\" text-anchor=\"middle\">{}</text>",
                DEFAULT_ICON_SIZE.width / 2.0,
                DEFAULT_ICON_SIZE.height + 14.0,
                escape(&node.label)
            );
        }
        out.push_str("  </g>\n");
    }
}

fn render_paths(out: &mut String, surface: &SceneSurface, layer: Layer) {
    for (_, binding) in surface.bindings_on(layer) {
        let Some(path) = binding.path else {
            continue;
        };
        let class = match &binding.kind {
            BindingKind::TempEdge => "temp-edge".to_string(),
            _ if binding.class.is_empty() => "edge".to_string(),
            _ => format!("edge {}", binding.class),
        };
        let _ = writeln!(
            out,
            "  <path class=\"{}\" d=\"{}\" />",
            escape(&class),
            path.to_svg_d()
        );
    }
}

fn matrix_attr(m: Affine) -> String {
    let [a, b, c, d, e, f] = m.as_coeffs();
    format!("matrix({a} {b} {c} {d} {e} {f})")
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_core::{
        CoordinateSystem, EdgeRecord, Guid, GuidRegistry, GuidStrategy, NodeRecord, RenderSurface,
    };

    fn scene() -> (NodeStateManager, SceneSurface, LayerManager) {
        let mut store = NodeStateManager::default();
        let mut registry = GuidRegistry::new(GuidStrategy::Sequential);
        let mut surface = SceneSurface::new();
        let layers = LayerManager::new();
        for (id, x) in [("api", 0.0), ("db", 200.0)] {
            let record = NodeRecord {
                id: Guid::intern(id),
                x,
                y: 0.0,
                svg: format!("{id}.svg"),
                label: format!("<{id}>"),
                class: "svc".into(),
                scale: None,
            };
            store
                .create_node(&record, &mut registry, &mut surface, &layers)
                .unwrap();
        }
        let edge = EdgeRecord {
            id: None,
            from: Guid::intern("api"),
            to: Guid::intern("db"),
            class: String::new(),
        };
        store
            .create_edge(&edge, &mut registry, &mut surface, &layers)
            .unwrap();
        store.redraw_all(&mut surface, &CoordinateSystem::default());
        (store, surface, layers)
    }

    #[test]
    fn export_contains_nodes_and_edges() {
        let (store, surface, layers) = scene();
        let svg = render_svg(&store, &surface, &layers, Viewport::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("id=\"api\""));
        assert!(svg.contains("href=\"db.svg\""));
        assert!(svg.contains("&lt;api&gt;"));
        assert!(svg.contains("d=\"M 50 25 L 200 25\""));
        // Edges paint before nodes.
        let edges_at = svg.find("layer-edges").unwrap();
        let nodes_at = svg.find("layer-nodes").unwrap();
        assert!(edges_at < nodes_at);
    }

    #[test]
    fn hidden_layer_is_skipped() {
        let (store, mut surface, mut layers) = scene();
        layers.hide(&mut surface, Layer::Edges);
        let svg = render_svg(&store, &surface, &layers, Viewport::default());
        assert!(!svg.contains("layer-edges"));
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn view_transform_applies_to_nodes_layer() {
        let (store, mut surface, layers) = scene();
        surface.set_view_transform(Affine::scale(2.0));
        let svg = render_svg(&store, &surface, &layers, Viewport::default());
        assert!(svg.contains("<g class=\"layer-nodes\" transform=\"matrix(2 0 0 2 0 0)\">"));
    }
}
