//! The canonical node/edge store.
//!
//! `NodeStateManager` is the single owner of every live [`Node`] and
//! [`Edge`]. Other components hold ids and resolve them here, so deletion
//! and cloning can never leave a stale handle behind.

use crate::config::EditorConfig;
use crate::coords::CoordinateSystem;
use crate::error::{Error, Result};
use crate::id::{Guid, GuidRegistry, IdKind, validate_guid};
use crate::model::{
    Edge, EdgeRecord, LayoutRecord, Node, NodeRecord, PathUpdate, PositionRecord, VisualState,
};
use crate::render::{LayerManager, RenderSurface};
use kurbo::Point;
use std::collections::{HashMap, HashSet};

/// What `remove_node` took out of the store.
#[derive(Debug)]
pub struct Removed {
    pub node: Node,
    /// Incident edges removed by the cascade.
    pub edges: Vec<Edge>,
}

/// Counts reported by `load`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub nodes: usize,
    pub edges: usize,
    /// Records dropped because their id was malformed or already live.
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct NodeStateManager {
    nodes: HashMap<Guid, Node>,
    /// Insertion order of `nodes`, for stable iteration and paint order.
    order: Vec<Guid>,
    edges: Vec<Edge>,
    config: EditorConfig,
}

impl Default for NodeStateManager {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl NodeStateManager {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
            edges: Vec::new(),
            config: config.clone(),
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn node(&self, id: Guid) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: Guid) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: Guid) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Live nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn node_ids(&self) -> &[Guid] {
        &self.order
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, id: Guid) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id() == id)
    }

    pub fn edges_touching(&self, node: Guid) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.connects_to(node))
    }

    /// Whether any edge joins `a` and `b`, in either direction.
    pub fn has_edge_between(&self, a: Guid, b: Guid) -> bool {
        self.edges.iter().any(|e| e.joins(a, b))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Whether `id` names a live node or a live edge. Both kinds share one
    /// id space.
    pub fn is_live(&self, id: Guid) -> bool {
        self.nodes.contains_key(&id) || self.edge(id).is_some()
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Insert an already-built node. Its id must not be live.
    pub fn add_node(&mut self, node: Node) -> Result<Guid> {
        let id = node.id();
        if self.is_live(id) {
            return Err(Error::DuplicateId(id));
        }
        self.nodes.insert(id, node);
        self.order.push(id);
        Ok(id)
    }

    /// Build a node from a record, register its id and attach a binding.
    pub fn create_node(
        &mut self,
        record: &NodeRecord,
        registry: &mut GuidRegistry,
        surface: &mut dyn RenderSurface,
        layers: &LayerManager,
    ) -> Result<Guid> {
        if !validate_guid(record.id.as_str()) {
            return Err(Error::InvalidGuid(record.id.to_string()));
        }
        if self.is_live(record.id) {
            return Err(Error::DuplicateId(record.id));
        }
        let mut node = Node::from_record(record, &self.config);
        node.attach(surface, layers)?;
        // Previously issued ids (seeded on load) are accepted as-is.
        if !registry.is_used(record.id) {
            registry.register_existing(record.id, IdKind::Node);
        }
        log::debug!("created node {}", record.id);
        self.add_node(node)
    }

    /// Clone one node under a freshly generated id.
    pub fn clone_node(
        &mut self,
        id: Guid,
        registry: &mut GuidRegistry,
        surface: &mut dyn RenderSurface,
        layers: &LayerManager,
    ) -> Result<Guid> {
        let source = self.nodes.get(&id).ok_or(Error::UnknownNode(id))?;
        let new_id = registry.generate(IdKind::Node);
        let copy = source.clone_onto(new_id, surface, layers, &self.config)?;
        self.add_node(copy)
    }

    /// Clone a set of nodes together with every edge running between two
    /// members of the set. Returns `(source, copy)` pairs in input order.
    ///
    /// All or nothing: if any copy or edge cannot be created, the copies
    /// made so far are removed again (their generated ids stay retired).
    pub fn clone_subgraph(
        &mut self,
        ids: &[Guid],
        registry: &mut GuidRegistry,
        surface: &mut dyn RenderSurface,
        layers: &LayerManager,
        view: &CoordinateSystem,
    ) -> Result<Vec<(Guid, Guid)>> {
        let mut mapping = Vec::with_capacity(ids.len());
        match self.clone_members(ids, &mut mapping, registry, surface, layers, view) {
            Ok(edges) => {
                log::debug!("cloned subgraph: {} nodes, {edges} edges", mapping.len());
                Ok(mapping)
            }
            Err(err) => {
                for &(_, copy) in &mapping {
                    // Cascades to the inner edges already created.
                    if let Err(e) = self.remove_node(copy, surface) {
                        log::warn!("rollback of clone {copy} failed: {e}");
                    }
                }
                log::warn!("clone of {} nodes abandoned: {err}", ids.len());
                Err(err)
            }
        }
    }

    fn clone_members(
        &mut self,
        ids: &[Guid],
        mapping: &mut Vec<(Guid, Guid)>,
        registry: &mut GuidRegistry,
        surface: &mut dyn RenderSurface,
        layers: &LayerManager,
        view: &CoordinateSystem,
    ) -> Result<usize> {
        let mut seen = HashSet::new();
        for &id in ids {
            if !seen.insert(id) {
                continue;
            }
            let copy = self.clone_node(id, registry, surface, layers)?;
            mapping.push((id, copy));
        }

        let lookup: HashMap<Guid, Guid> = mapping.iter().copied().collect();
        let inner: Vec<EdgeRecord> = self
            .edges
            .iter()
            .filter_map(|e| {
                Some(EdgeRecord {
                    id: None,
                    from: *lookup.get(&e.from())?,
                    to: *lookup.get(&e.to())?,
                    class: e.class.clone(),
                })
            })
            .collect();
        for record in &inner {
            let edge = self.create_edge(record, registry, surface, layers)?;
            self.update_edge_path(edge, surface, view);
        }
        Ok(inner.len())
    }

    /// Remove a node and every edge touching it. Bindings are detached;
    /// the ids stay registered so they are never reissued.
    pub fn remove_node(&mut self, id: Guid, surface: &mut dyn RenderSurface) -> Result<Removed> {
        let mut node = self.nodes.remove(&id).ok_or(Error::UnknownNode(id))?;
        self.order.retain(|n| *n != id);
        node.detach(surface);

        let (mut gone, kept): (Vec<Edge>, Vec<Edge>) =
            self.edges.drain(..).partition(|e| e.connects_to(id));
        self.edges = kept;
        for edge in &mut gone {
            edge.detach(surface);
        }
        log::debug!("removed node {} and {} incident edges", id, gone.len());
        Ok(Removed { node, edges: gone })
    }

    /// Move a node and push its new transform to the surface.
    pub fn move_node(&mut self, id: Guid, position: Point, surface: &mut dyn RenderSurface) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.set_position(position);
                node.sync(surface);
                true
            }
            None => false,
        }
    }

    /// Set a node's scale (clamped to the configured minimum).
    pub fn scale_node(&mut self, id: Guid, scale: f64, surface: &mut dyn RenderSurface) -> bool {
        let min = self.config.min_node_scale;
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.set_scale(scale, min);
                node.sync(surface);
                true
            }
            None => false,
        }
    }

    pub fn set_node_label(&mut self, id: Guid, label: &str) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.label = label.to_string();
                true
            }
            None => false,
        }
    }

    pub fn set_visual_state(&mut self, id: Guid, state: VisualState, surface: &mut dyn RenderSurface) {
        if let Some(node) = self.nodes.get_mut(&id) {
            if node.state != state {
                node.state = state;
                node.sync(surface);
            }
        }
    }

    // ─── Edges ───────────────────────────────────────────────────────────

    /// Append an edge. An explicit id must be well-formed and not live;
    /// a missing one is generated. Endpoints are not checked: an edge to
    /// a missing node is kept but will not draw.
    pub fn create_edge(
        &mut self,
        record: &EdgeRecord,
        registry: &mut GuidRegistry,
        surface: &mut dyn RenderSurface,
        layers: &LayerManager,
    ) -> Result<Guid> {
        let id = match record.id {
            Some(id) => {
                if !validate_guid(id.as_str()) {
                    return Err(Error::InvalidGuid(id.to_string()));
                }
                if self.is_live(id) {
                    return Err(Error::DuplicateId(id));
                }
                if !registry.is_used(id) {
                    registry.register_existing(id, IdKind::Edge);
                }
                id
            }
            None => registry.generate(IdKind::Edge),
        };
        let mut edge = Edge::new(id, record.from, record.to, record.class.clone());
        edge.attach(surface, layers)?;
        log::debug!("created edge {edge}");
        self.edges.push(edge);
        Ok(id)
    }

    pub fn remove_edge(&mut self, id: Guid, surface: &mut dyn RenderSurface) -> Option<Edge> {
        let pos = self.edges.iter().position(|e| e.id() == id)?;
        let mut edge = self.edges.remove(pos);
        edge.detach(surface);
        Some(edge)
    }

    /// Swap an edge's endpoints in place and redraw it. The id is kept.
    pub fn reverse_edge(
        &mut self,
        id: Guid,
        surface: &mut dyn RenderSurface,
        view: &CoordinateSystem,
    ) -> Option<PathUpdate> {
        let edge = self.edges.iter_mut().find(|e| e.id() == id)?;
        edge.reverse();
        log::debug!("reversed edge {edge}");
        self.update_edge_path(id, surface, view)
    }

    pub fn set_edge_class(&mut self, id: Guid, class: &str, surface: &mut dyn RenderSurface) -> bool {
        match self.edges.iter_mut().find(|e| e.id() == id) {
            Some(edge) => {
                edge.set_class(class, surface);
                true
            }
            None => false,
        }
    }

    /// Recompute one edge's path. `None` if no such edge.
    pub fn update_edge_path(
        &mut self,
        id: Guid,
        surface: &mut dyn RenderSurface,
        view: &CoordinateSystem,
    ) -> Option<PathUpdate> {
        let nodes = &self.nodes;
        let edge = self.edges.iter_mut().find(|e| e.id() == id)?;
        Some(edge.update_path(nodes.get(&edge.from()), nodes.get(&edge.to()), surface, view))
    }

    /// Recompute every edge touching any of `ids`. Returns how many edges
    /// were recomputed.
    pub fn redraw_edges_for(
        &mut self,
        ids: &[Guid],
        surface: &mut dyn RenderSurface,
        view: &CoordinateSystem,
    ) -> usize {
        let nodes = &self.nodes;
        let mut count = 0;
        for edge in self
            .edges
            .iter_mut()
            .filter(|e| ids.iter().any(|id| e.connects_to(*id)))
        {
            edge.update_path(nodes.get(&edge.from()), nodes.get(&edge.to()), surface, view);
            count += 1;
        }
        count
    }

    /// Recompute every edge. Returns how many resolved.
    pub fn redraw_all(&mut self, surface: &mut dyn RenderSurface, view: &CoordinateSystem) -> usize {
        let nodes = &self.nodes;
        self.edges
            .iter_mut()
            .map(|edge| edge.update_path(nodes.get(&edge.from()), nodes.get(&edge.to()), surface, view))
            .filter(PathUpdate::is_drawn)
            .count()
    }

    // ─── Snapshots ───────────────────────────────────────────────────────

    pub fn snapshot_positions(&self) -> Vec<PositionRecord> {
        self.nodes()
            .map(|n| PositionRecord {
                id: n.id(),
                x: n.position().x,
                y: n.position().y,
            })
            .collect()
    }

    /// Apply a position snapshot wholesale. Unknown ids and non-finite
    /// coordinates are skipped. Returns how many nodes moved.
    pub fn apply_positions(&mut self, positions: &[PositionRecord], surface: &mut dyn RenderSurface) -> usize {
        let mut applied = 0;
        for p in positions {
            if !(p.x.is_finite() && p.y.is_finite()) {
                log::warn!("skipping non-finite position for {}", p.id);
                continue;
            }
            if self.move_node(p.id, Point::new(p.x, p.y), surface) {
                applied += 1;
            } else {
                log::trace!("position for unknown node {} ignored", p.id);
            }
        }
        applied
    }

    pub fn to_layout(&self) -> LayoutRecord {
        LayoutRecord {
            nodes: self.nodes().map(Node::to_record).collect(),
            edges: self.edges.iter().map(Edge::to_record).collect(),
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Seed the registry with every id in `layout`, then create its nodes
    /// and edges. Malformed or duplicate records are skipped with a warning.
    pub fn load(
        &mut self,
        layout: &LayoutRecord,
        registry: &mut GuidRegistry,
        surface: &mut dyn RenderSurface,
        layers: &LayerManager,
    ) -> Result<LoadReport> {
        registry.initialize_from_existing(
            layout
                .nodes
                .iter()
                .map(|n| (n.id, IdKind::Node))
                .chain(layout.edges.iter().filter_map(|e| Some((e.id?, IdKind::Edge)))),
        );

        let mut report = LoadReport::default();
        for record in &layout.nodes {
            match self.create_node(record, registry, surface, layers) {
                Ok(_) => report.nodes += 1,
                Err(err @ (Error::DuplicateId(_) | Error::InvalidGuid(_))) => {
                    log::warn!("skipping node record: {err}");
                    report.skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }
        for record in &layout.edges {
            match self.create_edge(record, registry, surface, layers) {
                Ok(_) => report.edges += 1,
                Err(err @ (Error::DuplicateId(_) | Error::InvalidGuid(_))) => {
                    log::warn!("skipping edge record: {err}");
                    report.skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }
        log::debug!("loaded diagram: {report:?}");
        Ok(report)
    }

    /// Drop every node and edge and detach their bindings.
    pub fn reset(&mut self, surface: &mut dyn RenderSurface) {
        for edge in &mut self.edges {
            edge.detach(surface);
        }
        for node in self.nodes.values_mut() {
            node.detach(surface);
        }
        self.edges.clear();
        self.nodes.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Anchor;
    use crate::geometry::EdgePath;
    use crate::id::GuidStrategy;
    use crate::render::{BindingId, BindingKind, Layer};
    use kurbo::{Affine, Rect};
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    /// Surface that never measures anything. With `limit` set it refuses
    /// bindings once that many are live.
    #[derive(Default)]
    struct BlankSurface {
        next: u32,
        live: HashSet<BindingId>,
        classes: HashMap<BindingId, String>,
        limit: Option<usize>,
    }

    impl RenderSurface for BlankSurface {
        fn create_binding(&mut self, _layer: Layer, _kind: BindingKind) -> Result<BindingId> {
            if self.limit.is_some_and(|max| self.live.len() >= max) {
                return Err(Error::SurfaceRejected {
                    reason: "binding limit reached".into(),
                });
            }
            self.next += 1;
            self.live.insert(BindingId(self.next));
            Ok(BindingId(self.next))
        }
        fn detach(&mut self, binding: BindingId) {
            self.live.remove(&binding);
        }
        fn move_to_layer(&mut self, binding: BindingId, _layer: Layer) -> bool {
            self.live.contains(&binding)
        }
        fn set_transform(&mut self, _binding: BindingId, _transform: Affine) {}
        fn set_path(&mut self, _binding: BindingId, _path: Option<EdgePath>) {}
        fn set_class(&mut self, binding: BindingId, class: &str) {
            self.classes.insert(binding, class.to_string());
        }
        fn set_view_transform(&mut self, _view: Affine) {}
        fn bbox(&self, _binding: BindingId) -> Option<Rect> {
            None
        }
        fn screen_matrix(&self, _binding: BindingId) -> Option<Affine> {
            None
        }
    }

    struct Fixture {
        store: NodeStateManager,
        registry: GuidRegistry,
        surface: BlankSurface,
        layers: LayerManager,
        view: CoordinateSystem,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: NodeStateManager::default(),
                registry: GuidRegistry::new(GuidStrategy::Sequential),
                surface: BlankSurface::default(),
                layers: LayerManager::new(),
                view: CoordinateSystem::default(),
            }
        }

        fn node(&mut self, id: &str, x: f64, y: f64) -> Guid {
            let record = NodeRecord {
                id: Guid::intern(id),
                x,
                y,
                svg: "box.svg".into(),
                label: id.to_uppercase(),
                class: "svc".into(),
                scale: None,
            };
            self.store
                .create_node(&record, &mut self.registry, &mut self.surface, &self.layers)
                .unwrap()
        }

        fn edge(&mut self, from: &str, to: &str) -> Guid {
            let record = EdgeRecord {
                id: None,
                from: Guid::intern(from),
                to: Guid::intern(to),
                class: String::new(),
            };
            self.store
                .create_edge(&record, &mut self.registry, &mut self.surface, &self.layers)
                .unwrap()
        }
    }

    #[test]
    fn duplicate_node_id_is_rejected() {
        let mut fx = Fixture::new();
        fx.node("web", 0.0, 0.0);
        let record = NodeRecord {
            id: Guid::intern("web"),
            x: 1.0,
            y: 1.0,
            svg: String::new(),
            label: String::new(),
            class: String::new(),
            scale: None,
        };
        let err = fx
            .store
            .create_node(&record, &mut fx.registry, &mut fx.surface, &fx.layers)
            .unwrap_err();
        assert_eq!(err, Error::DuplicateId(Guid::intern("web")));
    }

    #[test]
    fn edge_cannot_take_a_live_node_id() {
        let mut fx = Fixture::new();
        let a = fx.node("shared", 0.0, 0.0);
        fx.node("other", 90.0, 0.0);
        let record = EdgeRecord {
            id: Some(a),
            from: a,
            to: Guid::intern("other"),
            class: String::new(),
        };
        let err = fx
            .store
            .create_edge(&record, &mut fx.registry, &mut fx.surface, &fx.layers)
            .unwrap_err();
        assert_eq!(err, Error::DuplicateId(a));
        assert!(fx.store.edges().is_empty());
    }

    #[test]
    fn node_cannot_take_a_live_edge_id() {
        let mut fx = Fixture::new();
        fx.node("aaa", 0.0, 0.0);
        fx.node("bbb", 90.0, 0.0);
        let e = fx.edge("aaa", "bbb");
        let record = NodeRecord {
            id: e,
            x: 0.0,
            y: 0.0,
            svg: String::new(),
            label: String::new(),
            class: String::new(),
            scale: None,
        };
        let err = fx
            .store
            .create_node(&record, &mut fx.registry, &mut fx.surface, &fx.layers)
            .unwrap_err();
        assert_eq!(err, Error::DuplicateId(e));
        assert_eq!(fx.store.node_count(), 2);
    }

    #[test]
    fn malformed_id_is_rejected() {
        let mut fx = Fixture::new();
        let record = EdgeRecord {
            id: Some(Guid::intern("a b")),
            from: Guid::intern("x"),
            to: Guid::intern("y"),
            class: String::new(),
        };
        let err = fx
            .store
            .create_edge(&record, &mut fx.registry, &mut fx.surface, &fx.layers)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidGuid(_)));
    }

    #[test]
    fn remove_cascades_and_detaches() {
        let mut fx = Fixture::new();
        fx.node("aaa", 0.0, 0.0);
        fx.node("bbb", 100.0, 0.0);
        fx.node("ccc", 200.0, 0.0);
        fx.edge("aaa", "bbb");
        fx.edge("ccc", "aaa");
        let keep = fx.edge("bbb", "ccc");

        let removed = fx.store.remove_node(Guid::intern("aaa"), &mut fx.surface).unwrap();
        assert_eq!(removed.edges.len(), 2);
        assert_eq!(fx.store.edges().len(), 1);
        assert_eq!(fx.store.edges()[0].id(), keep);
        // Two nodes and one edge still bound.
        assert_eq!(fx.surface.live.len(), 3);
        assert!(fx.registry.is_used(Guid::intern("aaa")));
    }

    #[test]
    fn remove_unknown_node_errors() {
        let mut fx = Fixture::new();
        let err = fx.store.remove_node(Guid::intern("nope"), &mut fx.surface).unwrap_err();
        assert_eq!(err, Error::UnknownNode(Guid::intern("nope")));
    }

    #[test]
    fn subgraph_clone_copies_inner_edges_only() {
        let mut fx = Fixture::new();
        fx.node("src", 0.0, 0.0);
        fx.node("dst", 100.0, 0.0);
        fx.node("out", 300.0, 0.0);
        fx.edge("src", "dst");
        fx.edge("dst", "out");

        let ids = [Guid::intern("src"), Guid::intern("dst")];
        let mapping = fx
            .store
            .clone_subgraph(&ids, &mut fx.registry, &mut fx.surface, &fx.layers, &fx.view)
            .unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(fx.store.node_count(), 5);
        assert_eq!(fx.store.edges().len(), 3);

        let (_, src_copy) = mapping[0];
        let (_, dst_copy) = mapping[1];
        assert!(fx.store.has_edge_between(src_copy, dst_copy));
        let copied = fx.store.edges().last().unwrap();
        assert!(copied.is_renderable());
        assert_eq!(
            fx.store.node(src_copy).unwrap().position(),
            Point::new(50.0, 50.0)
        );
    }

    #[test]
    fn clone_keeps_data_and_starts_unmeasured() {
        let mut fx = Fixture::new();
        let src = fx.node("api", 100.0, 100.0);
        let copy = fx
            .store
            .clone_node(src, &mut fx.registry, &mut fx.surface, &fx.layers)
            .unwrap();

        let (a, b) = (fx.store.node(src).unwrap(), fx.store.node(copy).unwrap());
        assert_ne!(a.id(), b.id());
        assert_eq!((b.label.as_str(), b.class.as_str(), b.visual.as_str()), ("API", "svc", "box.svg"));
        assert_eq!((b.label.as_str(), b.class.as_str()), (a.label.as_str(), a.class.as_str()));
        assert_eq!(b.position(), Point::new(150.0, 150.0));
        assert_eq!(b.scale(), 1.0);
        assert!(matches!(
            b.transformed_center(&fx.surface, &fx.view),
            crate::geometry::Geometry::Default(_)
        ));
    }

    #[test]
    fn failed_subgraph_clone_is_rolled_back() {
        let mut fx = Fixture::new();
        fx.node("aaa", 0.0, 0.0);
        fx.node("bbb", 100.0, 0.0);
        fx.edge("aaa", "bbb");
        // Room for exactly one more binding: the first copy.
        fx.surface.limit = Some(4);

        let ids = [Guid::intern("aaa"), Guid::intern("bbb")];
        let err = fx
            .store
            .clone_subgraph(&ids, &mut fx.registry, &mut fx.surface, &fx.layers, &fx.view)
            .unwrap_err();
        assert!(matches!(err, Error::SurfaceRejected { .. }));
        assert_eq!(fx.store.node_count(), 2);
        assert_eq!(fx.store.edges().len(), 1);
        assert_eq!(fx.surface.live.len(), 3);
    }

    #[test]
    fn failed_inner_edge_rolls_back_copies() {
        let mut fx = Fixture::new();
        fx.node("aaa", 0.0, 0.0);
        fx.node("bbb", 100.0, 0.0);
        fx.edge("aaa", "bbb");
        // Both copies fit; their edge does not.
        fx.surface.limit = Some(5);

        let ids = [Guid::intern("aaa"), Guid::intern("bbb")];
        assert!(
            fx.store
                .clone_subgraph(&ids, &mut fx.registry, &mut fx.surface, &fx.layers, &fx.view)
                .is_err()
        );
        assert_eq!(fx.store.node_ids(), &[Guid::intern("aaa"), Guid::intern("bbb")]);
        assert_eq!(fx.surface.live.len(), 3);
    }

    #[test]
    fn reverse_edge_swaps_ends_in_place() {
        let mut fx = Fixture::new();
        let a = fx.node("aaa", 0.0, 0.0);
        let b = fx.node("bbb", 100.0, 0.0);
        let e = fx.edge("aaa", "bbb");

        let update = fx.store.reverse_edge(e, &mut fx.surface, &fx.view);
        assert!(update.is_some_and(|u| u.is_drawn()));
        let edge = fx.store.edge(e).unwrap();
        assert_eq!((edge.from(), edge.to()), (b, a));
        assert_eq!(fx.store.edges().len(), 1);
        assert_eq!(fx.store.reverse_edge(Guid::intern("nope"), &mut fx.surface, &fx.view), None);
    }

    #[test]
    fn edits_reach_model_and_surface() {
        let mut fx = Fixture::new();
        let a = fx.node("aaa", 0.0, 0.0);
        fx.node("bbb", 100.0, 0.0);
        let e = fx.edge("aaa", "bbb");

        assert!(fx.store.set_node_label(a, "Gateway"));
        assert_eq!(fx.store.node(a).unwrap().label, "Gateway");
        assert!(!fx.store.set_node_label(Guid::intern("nope"), "x"));

        assert!(fx.store.set_edge_class(e, "async", &mut fx.surface));
        let binding = fx.store.edge(e).unwrap().binding().unwrap();
        assert_eq!(fx.surface.classes[&binding], "async");
        assert_eq!(fx.store.to_layout().edges[0].class, "async");
    }

    #[test]
    fn redraw_counts_touching_edges() {
        let mut fx = Fixture::new();
        fx.node("aaa", 0.0, 0.0);
        fx.node("bbb", 100.0, 0.0);
        fx.node("ccc", 200.0, 0.0);
        fx.edge("aaa", "bbb");
        fx.edge("bbb", "ccc");
        fx.edge("aaa", "ghost");

        let n = fx
            .store
            .redraw_edges_for(&[Guid::intern("aaa")], &mut fx.surface, &fx.view);
        assert_eq!(n, 2);
        assert_eq!(fx.store.redraw_all(&mut fx.surface, &fx.view), 2);
    }

    #[test]
    fn apply_positions_ignores_unknown_ids() {
        let mut fx = Fixture::new();
        let a = fx.node("aaa", 0.0, 0.0);
        let moved = fx.store.apply_positions(
            &[
                PositionRecord { id: a, x: 5.0, y: 6.0 },
                PositionRecord {
                    id: Guid::intern("zzz"),
                    x: 1.0,
                    y: 1.0,
                },
            ],
            &mut fx.surface,
        );
        assert_eq!(moved, 1);
        assert_eq!(fx.store.node(a).unwrap().position(), Point::new(5.0, 6.0));
    }

    #[test]
    fn load_seeds_registry_and_skips_duplicates() {
        let mut fx = Fixture::new();
        let layout: LayoutRecord = serde_json::from_str(
            r#"{
                "nodes": [
                    {"id":"node_1","x":0,"y":0,"svg":"a.svg"},
                    {"id":"node_1","x":5,"y":5,"svg":"b.svg"},
                    {"id":"node_2","x":90,"y":0,"svg":"c.svg","scale":2}
                ],
                "edges": [{"id":"edge_1","from":"node_1","to":"node_2"}]
            }"#,
        )
        .unwrap();
        let report = fx
            .store
            .load(&layout, &mut fx.registry, &mut fx.surface, &fx.layers)
            .unwrap();
        assert_eq!(
            report,
            LoadReport {
                nodes: 2,
                edges: 1,
                skipped: 1
            }
        );
        let fresh = fx.registry.generate(IdKind::Node);
        assert!(!fx.store.contains(fresh));
        assert_ne!(fresh.as_str(), "node_1");
        assert_eq!(fx.store.to_layout().nodes[1].scale, Some(2.0));
    }

    #[test]
    fn reset_detaches_everything() {
        let mut fx = Fixture::new();
        fx.node("aaa", 0.0, 0.0);
        fx.node("bbb", 0.0, 0.0);
        fx.edge("aaa", "bbb");
        fx.store.reset(&mut fx.surface);
        assert!(fx.store.is_empty());
        assert!(fx.surface.live.is_empty());
    }
}
