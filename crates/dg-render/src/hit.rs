//! Hit testing: screen point → node or edge lookup.
//!
//! Walks the live nodes back-to-front (last inserted = topmost) and tests
//! each node's screen-space icon box. The box comes from the node's
//! anchor circle, so nodes that have never been measured are still hit.
//! Edges are hit within a screen-space tolerance of their drawn segment.

use dg_core::model::{Anchor, Node};
use dg_core::{CoordinateSystem, Guid, NodeStateManager, RenderSurface};
use kurbo::{Line, ParamCurveNearest, Point, Rect};

/// Screen-space box of a node.
pub fn node_screen_rect(node: &Node, surface: &dyn RenderSurface, view: &CoordinateSystem) -> Rect {
    let c = node.transformed_center(surface, view).center();
    Rect::new(c.x - c.radius, c.y - c.radius, c.x + c.radius, c.y + c.radius)
}

/// Find the topmost node at a screen point.
/// Returns `None` if no node is hit (background).
pub fn hit_test(
    store: &NodeStateManager,
    surface: &dyn RenderSurface,
    view: &CoordinateSystem,
    screen: Point,
) -> Option<Guid> {
    store.node_ids().iter().rev().copied().find(|id| {
        store
            .node(*id)
            .is_some_and(|n| node_screen_rect(n, surface, view).contains(screen))
    })
}

/// Find all nodes whose box intersects a screen rectangle, in insertion
/// order. Used for rubber-band selection.
pub fn hit_test_rect(
    store: &NodeStateManager,
    surface: &dyn RenderSurface,
    view: &CoordinateSystem,
    rect: Rect,
) -> Vec<Guid> {
    store
        .nodes()
        .filter(|n| overlaps(&node_screen_rect(n, surface, view), &rect))
        .map(Node::id)
        .collect()
}

/// Find the topmost drawn edge within `tolerance` screen px of a point.
/// Edges that did not resolve on their last redraw are never hit.
pub fn hit_test_edge(store: &NodeStateManager, screen: Point, tolerance: f64) -> Option<Guid> {
    let max_sq = tolerance * tolerance;
    store
        .edges()
        .iter()
        .rev()
        .filter(|e| e.is_renderable())
        .find(|e| {
            e.path().is_some_and(|p| {
                Line::new(p.start, p.end).nearest(screen, 1e-6).distance_sq <= max_sq
            })
        })
        .map(|e| e.id())
}

fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.x0 <= b.x1 && a.x1 >= b.x0 && a.y0 <= b.y1 && a.y1 >= b.y0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SceneSurface;
    use dg_core::{EdgeRecord, GuidRegistry, GuidStrategy, LayerManager, NodeRecord};
    use pretty_assertions::assert_eq;

    fn setup() -> (NodeStateManager, SceneSurface) {
        let mut store = NodeStateManager::default();
        let mut registry = GuidRegistry::new(GuidStrategy::Sequential);
        let mut surface = SceneSurface::deferred();
        let layers = LayerManager::new();
        for (id, x, y) in [("low", 0.0, 0.0), ("top", 20.0, 20.0), ("far", 300.0, 300.0)] {
            let record = NodeRecord {
                id: Guid::intern(id),
                x,
                y,
                svg: "box.svg".into(),
                label: String::new(),
                class: String::new(),
                scale: None,
            };
            store
                .create_node(&record, &mut registry, &mut surface, &layers)
                .unwrap();
        }
        (store, surface)
    }

    #[test]
    fn topmost_node_wins() {
        let (store, surface) = setup();
        let view = CoordinateSystem::default();
        // (30, 30) is inside both "low" and "top".
        assert_eq!(
            hit_test(&store, &surface, &view, Point::new(30.0, 30.0)),
            Some(Guid::intern("top"))
        );
        assert_eq!(
            hit_test(&store, &surface, &view, Point::new(5.0, 5.0)),
            Some(Guid::intern("low"))
        );
        assert_eq!(hit_test(&store, &surface, &view, Point::new(200.0, 5.0)), None);
    }

    #[test]
    fn hit_test_respects_zoom() {
        let (store, surface) = setup();
        let mut view = CoordinateSystem::default();
        view.set_zoom(2.0, Point::ZERO);
        assert_eq!(
            hit_test(&store, &surface, &view, Point::new(690.0, 690.0)),
            Some(Guid::intern("far"))
        );
    }

    #[test]
    fn rect_collects_overlapping_nodes() {
        let (store, surface) = setup();
        let view = CoordinateSystem::default();
        let hits = hit_test_rect(&store, &surface, &view, Rect::new(-10.0, -10.0, 25.0, 25.0));
        assert_eq!(hits, vec![Guid::intern("low"), Guid::intern("top")]);
    }

    #[test]
    fn edge_is_hit_near_its_segment_only() {
        let (mut store, mut surface) = setup();
        let mut registry = GuidRegistry::new(GuidStrategy::Sequential);
        let record = EdgeRecord {
            id: Some(Guid::intern("diag")),
            from: Guid::intern("low"),
            to: Guid::intern("far"),
            class: String::new(),
        };
        store
            .create_edge(&record, &mut registry, &mut surface, &LayerManager::new())
            .unwrap();
        let view = CoordinateSystem::default();
        store.redraw_all(&mut surface, &view);

        // Centres (25, 25) and (325, 325): the segment runs along y = x.
        assert_eq!(
            hit_test_edge(&store, Point::new(152.0, 148.0), 4.0),
            Some(Guid::intern("diag"))
        );
        assert_eq!(hit_test_edge(&store, Point::new(170.0, 130.0), 4.0), None);
        // Inside the trimmed-off part under the source node.
        assert_eq!(hit_test_edge(&store, Point::new(26.0, 26.0), 4.0), None);
    }
}
