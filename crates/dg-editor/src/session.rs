//! The editing session: one explicit context object per open diagram.
//!
//! `DiagramSession` owns the configuration, id registry, node store, view,
//! layers, drag and interaction state, and the render surface. Input goes
//! in through [`handle_input`](DiagramSession::handle_input); everything
//! else is a direct operation on the diagram.

use crate::drag::DragManager;
use crate::input::InputEvent;
use crate::interaction::{Effect, InteractionManager};
use dg_core::model::Anchor;
use dg_core::{
    BindingId, BindingKind, EdgePath, EdgeRecord, EditorConfig, Guid, GuidRegistry, IdKind,
    Layer, LayerManager, LayoutRecord, LoadReport, NodeRecord, NodeStateManager, PositionRecord,
    RenderSurface, Result, ViewBoxManager, ViewChange, VisualState,
};
use dg_render::{SceneSurface, hit_test, hit_test_edge, hit_test_rect, render_svg};
use kurbo::Point;

/// The rubber line shown while an edge is being drawn.
#[derive(Debug, Clone, Copy)]
struct TempEdge {
    from: Guid,
    binding: BindingId,
}

pub struct DiagramSession<S: RenderSurface> {
    config: EditorConfig,
    registry: GuidRegistry,
    store: NodeStateManager,
    view: ViewBoxManager,
    layers: LayerManager,
    drag: DragManager,
    interaction: InteractionManager,
    surface: S,
    temp_edge: Option<TempEdge>,
}

impl<S: RenderSurface> DiagramSession<S> {
    pub fn new(config: EditorConfig, surface: S) -> Self {
        let mut session = Self {
            registry: GuidRegistry::new(config.guid_strategy),
            store: NodeStateManager::new(&config),
            view: ViewBoxManager::new(&config),
            layers: LayerManager::new(),
            drag: DragManager::new(config.min_node_scale),
            interaction: InteractionManager::new(&config),
            surface,
            temp_edge: None,
            config,
        };
        session.sync_view();
        session
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &NodeStateManager {
        &self.store
    }

    pub fn registry(&self) -> &GuidRegistry {
        &self.registry
    }

    pub fn view(&self) -> &ViewBoxManager {
        &self.view
    }

    pub fn layers(&self) -> &LayerManager {
        &self.layers
    }

    pub fn drag(&self) -> &DragManager {
        &self.drag
    }

    pub fn interaction(&self) -> &InteractionManager {
        &self.interaction
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn selection(&self) -> &[Guid] {
        self.interaction.selection()
    }

    /// Whether an edge is currently being drawn.
    pub fn has_temp_edge(&self) -> bool {
        self.temp_edge.is_some()
    }

    /// Screen → logical under the current view.
    pub fn to_logical(&self, screen: Point) -> Point {
        self.view.coords().screen_to_logical(screen)
    }

    // ─── Diagram operations ──────────────────────────────────────────────

    /// Place a new node with a fresh id at a screen position.
    pub fn place_node(&mut self, visual: &str, label: &str, class: &str, screen: Point) -> Result<Guid> {
        let at = self.to_logical(screen);
        let record = NodeRecord {
            id: self.registry.generate(IdKind::Node),
            x: at.x,
            y: at.y,
            svg: visual.to_string(),
            label: label.to_string(),
            class: class.to_string(),
            scale: None,
        };
        self.store
            .create_node(&record, &mut self.registry, &mut self.surface, &self.layers)
    }

    /// Connect two nodes. Returns `None` (and creates nothing) when an
    /// equivalent edge already exists or both ends are the same node.
    pub fn connect(&mut self, from: Guid, to: Guid, class: &str) -> Result<Option<Guid>> {
        if from == to || self.store.has_edge_between(from, to) {
            log::debug!("edge {from} → {to} not created: duplicate or self-loop");
            return Ok(None);
        }
        let record = EdgeRecord {
            id: None,
            from,
            to,
            class: class.to_string(),
        };
        let id = self
            .store
            .create_edge(&record, &mut self.registry, &mut self.surface, &self.layers)?;
        self.store
            .update_edge_path(id, &mut self.surface, self.view.coords());
        log::debug!("edge {id} committed ({from} → {to})");
        Ok(Some(id))
    }

    /// Replace the diagram with `layout`.
    pub fn load(&mut self, layout: &LayoutRecord) -> Result<LoadReport> {
        self.new_diagram();
        let report = self
            .store
            .load(layout, &mut self.registry, &mut self.surface, &self.layers)?;
        self.store.redraw_all(&mut self.surface, self.view.coords());
        Ok(report)
    }

    /// Clear everything: gestures, nodes, edges, ids, selection, view.
    pub fn new_diagram(&mut self) {
        self.cancel_gestures();
        self.interaction.set_selection(Vec::new());
        self.store.reset(&mut self.surface);
        self.registry.clear();
        self.view.reset_view();
        self.sync_view();
        log::debug!("new diagram");
    }

    /// Clone the selected nodes and the edges between them; the copies
    /// become the selection. On failure nothing is cloned and the
    /// selection is unchanged.
    pub fn clone_selection(&mut self) -> Result<Vec<Guid>> {
        let ids = self.interaction.selection().to_vec();
        self.clone_nodes(&ids)
    }

    /// Delete the selected nodes (edges cascade). Returns how many nodes
    /// were removed.
    pub fn delete_selection(&mut self) -> usize {
        let ids = self.interaction.selection().to_vec();
        self.interaction.set_selection(Vec::new());
        self.delete_nodes(&ids)
    }

    pub fn delete_nodes(&mut self, ids: &[Guid]) -> usize {
        let mut removed = 0;
        for id in ids {
            match self.store.remove_node(*id, &mut self.surface) {
                Ok(_) => removed += 1,
                Err(err) => log::warn!("delete skipped: {err}"),
            }
        }
        let store = &self.store;
        self.interaction.retain_selection(|id| store.contains(id));
        removed
    }

    // ─── Node and edge edits ─────────────────────────────────────────────

    /// Topmost drawn edge within the click slop of a screen point.
    pub fn edge_at(&self, screen: Point) -> Option<Guid> {
        hit_test_edge(&self.store, screen, self.config.click_slop)
    }

    /// Remove one edge. Its endpoints and their other edges are untouched.
    pub fn delete_edge(&mut self, id: Guid) -> bool {
        match self.store.remove_edge(id, &mut self.surface) {
            Some(edge) => {
                log::debug!("deleted edge {edge}");
                true
            }
            None => {
                log::warn!("delete skipped: no edge {id}");
                false
            }
        }
    }

    /// Swap an edge's direction in place; it keeps its id and is redrawn.
    pub fn reverse_edge(&mut self, id: Guid) -> bool {
        self.store
            .reverse_edge(id, &mut self.surface, self.view.coords())
            .is_some()
    }

    pub fn set_node_label(&mut self, id: Guid, label: &str) -> bool {
        self.store.set_node_label(id, label)
    }

    pub fn set_edge_class(&mut self, id: Guid, class: &str) -> bool {
        self.store.set_edge_class(id, class, &mut self.surface)
    }

    pub fn snapshot_positions(&self) -> Vec<PositionRecord> {
        self.store.snapshot_positions()
    }

    /// Apply a layout-worker result wholesale and redraw every edge.
    /// Ignored while a drag is in progress.
    pub fn apply_worker_result(&mut self, positions: &[PositionRecord]) -> usize {
        if self.drag.is_dragging() {
            log::debug!("worker result dropped: drag in progress");
            return 0;
        }
        let applied = self.store.apply_positions(positions, &mut self.surface);
        self.store.redraw_all(&mut self.surface, self.view.coords());
        applied
    }

    pub fn toggle_layer(&mut self, layer: Layer) -> bool {
        self.layers.toggle(&mut self.surface, layer)
    }

    pub fn set_layer_opacity(&mut self, layer: Layer, opacity: f64) {
        self.layers.set_opacity(&mut self.surface, layer, opacity);
    }

    /// Tear down the diagram and hand the surface back.
    pub fn dispose(mut self) -> S {
        self.new_diagram();
        self.surface
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Route one input event and apply the resulting effects. Every effect
    /// is applied even if an earlier one fails; the first error is returned
    /// after visual states are resynced.
    pub fn handle_input(&mut self, event: &InputEvent) -> Result<()> {
        let hit = match event {
            InputEvent::PointerDown { x, y, .. } | InputEvent::PointerUp { x, y, .. } => hit_test(
                &self.store,
                &self.surface,
                self.view.coords(),
                Point::new(*x, *y),
            ),
            _ => None,
        };
        let effects = self.interaction.handle(event, hit);
        let mut failed = None;
        for effect in effects {
            if let Err(err) = self.apply(effect) {
                log::warn!("effect failed: {err}");
                failed.get_or_insert(err);
            }
        }
        self.sync_visual_states();
        failed.map_or(Ok(()), Err)
    }

    fn apply(&mut self, effect: Effect) -> Result<()> {
        log::trace!("apply {effect:?}");
        match effect {
            Effect::Select(ids) => self.interaction.set_selection(ids),
            Effect::SelectRect { rect, additive } => {
                let hits = hit_test_rect(&self.store, &self.surface, self.view.coords(), rect);
                let mut selection = if additive {
                    self.interaction.selection().to_vec()
                } else {
                    Vec::new()
                };
                for id in hits {
                    if !selection.contains(&id) {
                        selection.push(id);
                    }
                }
                self.interaction.set_selection(selection);
            }
            Effect::SelectAll => {
                let all = self.store.node_ids().to_vec();
                self.interaction.set_selection(all);
            }

            Effect::StartDrag { members, pointer } => {
                let at = self.to_logical(pointer);
                self.drag.start(&members, at, &self.store);
            }
            Effect::StartScale { node, pointer } => {
                let at = self.to_logical(pointer);
                self.drag
                    .start_scale(node, at, &self.store, &self.surface, self.view.coords());
            }
            Effect::DragTo(pointer) => {
                let at = self.to_logical(pointer);
                self.drag
                    .update(at, &mut self.store, &mut self.surface, self.view.coords());
            }
            Effect::EndDrag => {
                self.drag.finish();
            }
            Effect::CancelDrag => {
                self.drag.cancel();
            }

            Effect::StartEdge { from, pointer } => self.start_temp_edge(from, pointer),
            Effect::MoveEdge(pointer) => self.move_temp_edge(pointer),
            Effect::CommitEdge { from, to } => {
                self.clear_temp_edge();
                self.connect(from, to, "")?;
            }
            Effect::CancelEdge => {
                log::debug!("edge creation cancelled");
                self.clear_temp_edge();
            }

            Effect::StartPan(at) => self.view.start_panning(at),
            Effect::PanTo(at) => {
                let change = self.view.update_panning(at);
                self.after_view_change(change);
            }
            Effect::EndPan => self.view.stop_panning(),
            Effect::Zoom { factor, anchor } => {
                let change = self.view.zoom(factor, anchor);
                self.after_view_change(change);
            }
            Effect::ZoomCentered(factor) => {
                let change = self.view.zoom_centered(factor);
                self.after_view_change(change);
            }
            Effect::ResetView => {
                let change = self.view.reset_view();
                self.after_view_change(change);
            }
            Effect::ToggleLayer(layer) => {
                self.toggle_layer(layer);
            }

            Effect::Delete(ids) => {
                self.delete_nodes(&ids);
            }
            Effect::Clone(ids) => {
                self.clone_nodes(&ids)?;
            }
        }
        Ok(())
    }

    /// Zoom about a screen anchor (outside the input path).
    pub fn zoom(&mut self, factor: f64, anchor: Point) -> ViewChange {
        let change = self.view.zoom(factor, anchor);
        self.after_view_change(change);
        change
    }

    pub fn pan(&mut self, delta: kurbo::Vec2) -> ViewChange {
        let change = self.view.pan(delta);
        self.after_view_change(change);
        change
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn clone_nodes(&mut self, ids: &[Guid]) -> Result<Vec<Guid>> {
        let mapping = self.store.clone_subgraph(
            ids,
            &mut self.registry,
            &mut self.surface,
            &self.layers,
            self.view.coords(),
        )?;
        let copies: Vec<Guid> = mapping.into_iter().map(|(_, copy)| copy).collect();
        self.interaction.set_selection(copies.clone());
        self.sync_visual_states();
        Ok(copies)
    }

    fn start_temp_edge(&mut self, from: Guid, pointer: Point) {
        self.clear_temp_edge();
        match self.layers.attach(&mut self.surface, BindingKind::TempEdge) {
            Ok(binding) => {
                log::debug!("edge creation started from {from}");
                self.temp_edge = Some(TempEdge { from, binding });
                self.move_temp_edge(pointer);
            }
            Err(err) => log::warn!("no temporary edge: {err}"),
        }
    }

    fn move_temp_edge(&mut self, pointer: Point) {
        let Some(temp) = self.temp_edge else {
            return;
        };
        // Fresh clones have no measured geometry yet; the anchor falls back.
        let path = self.store.node(temp.from).map(|node| {
            let center = node
                .transformed_center(&self.surface, self.view.coords())
                .center();
            EdgePath::to_point(center, pointer)
        });
        self.surface.set_path(temp.binding, path);
    }

    fn clear_temp_edge(&mut self) {
        if let Some(temp) = self.temp_edge.take() {
            self.surface.detach(temp.binding);
        }
    }

    fn cancel_gestures(&mut self) {
        self.drag.cancel();
        self.view.stop_panning();
        self.clear_temp_edge();
        for effect in self.interaction.cancel() {
            log::trace!("dropped {effect:?} on reset");
        }
    }

    fn after_view_change(&mut self, change: ViewChange) {
        if change.is_noop() {
            return;
        }
        self.sync_view();
        if let Some(update) = self
            .drag
            .on_view_change(&change, &mut self.store, &mut self.surface)
        {
            log::trace!("drag re-anchored, {} nodes", update.moved.len());
        }
        // Edge paths are screen space, so every view change redraws them.
        self.store.redraw_all(&mut self.surface, self.view.coords());
    }

    fn sync_view(&mut self) {
        self.surface.set_view_transform(self.view.coords().transform());
    }

    fn sync_visual_states(&mut self) {
        let members = self.drag.members();
        let scaling = self.drag.is_scaling();
        let source = self.temp_edge.map(|t| t.from);
        let ids = self.store.node_ids().to_vec();
        for id in ids {
            let state = if source == Some(id) {
                VisualState::EdgeSource
            } else if members.contains(&id) {
                if scaling {
                    VisualState::Scaling
                } else {
                    VisualState::Dragging
                }
            } else if self.interaction.is_selected(id) {
                VisualState::Selected
            } else {
                VisualState::Idle
            };
            self.store.set_visual_state(id, state, &mut self.surface);
        }
    }
}

impl DiagramSession<SceneSurface> {
    /// Export the current scene as an SVG document.
    pub fn to_svg(&self) -> String {
        render_svg(&self.store, &self.surface, &self.layers, self.view.viewport())
    }
}

impl<S: RenderSurface + Default> Default for DiagramSession<S> {
    fn default() -> Self {
        Self::new(EditorConfig::default(), S::default())
    }
}

impl<S: RenderSurface> std::fmt::Debug for DiagramSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagramSession")
            .field("nodes", &self.store.node_count())
            .field("edges", &self.store.edges().len())
            .field("mode", &self.interaction.mode())
            .field("zoom", &self.view.zoom_level())
            .finish()
    }
}
