//! Drag gestures: moving a selection and scaling a single node.
//!
//! All positions are logical. A move captures `pointer − position` per
//! member at grab time and re-applies it on every update, so relative
//! offsets inside a multi-selection are preserved. Each update redraws
//! every edge touching a moved node before returning.

use dg_core::model::Anchor;
use dg_core::{CoordinateSystem, EditorConfig, Guid, NodeStateManager, RenderSurface, ViewChange};
use kurbo::{Point, Vec2};
use smallvec::SmallVec;

/// Why a gesture did not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    AlreadyDragging,
    NoLiveMembers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragStart {
    Started { members: usize },
    Rejected(Rejection),
}

impl DragStart {
    pub fn is_started(&self) -> bool {
        matches!(self, DragStart::Started { .. })
    }
}

/// Outcome of one pointer update.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DragUpdate {
    pub moved: SmallVec<[Guid; 4]>,
    pub edges_redrawn: usize,
}

#[derive(Debug, Clone)]
enum Gesture {
    Move {
        members: SmallVec<[(Guid, Vec2); 4]>,
    },
    Scale {
        node: Guid,
        /// Logical centre the scale is measured about.
        center: Point,
        start_distance: f64,
        start_scale: f64,
    },
}

#[derive(Debug, Clone)]
pub struct DragManager {
    gesture: Option<Gesture>,
    /// Last pointer position seen, logical.
    pointer: Point,
    min_scale: f64,
}

impl Default for DragManager {
    fn default() -> Self {
        Self::new(EditorConfig::default().min_node_scale)
    }
}

impl DragManager {
    pub fn new(min_scale: f64) -> Self {
        Self {
            gesture: None,
            pointer: Point::ZERO,
            min_scale,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn is_scaling(&self) -> bool {
        matches!(self.gesture, Some(Gesture::Scale { .. }))
    }

    /// Ids taking part in the current gesture.
    pub fn members(&self) -> SmallVec<[Guid; 4]> {
        match &self.gesture {
            Some(Gesture::Move { members }) => members.iter().map(|(id, _)| *id).collect(),
            Some(Gesture::Scale { node, .. }) => smallvec::smallvec![*node],
            None => SmallVec::new(),
        }
    }

    /// Grab offset of a member, `pointer − position` at grab time.
    pub fn offset_of(&self, id: Guid) -> Option<Vec2> {
        match &self.gesture {
            Some(Gesture::Move { members }) => {
                members.iter().find(|(m, _)| *m == id).map(|(_, o)| *o)
            }
            _ => None,
        }
    }

    /// Start moving `members` from a logical pointer position.
    pub fn start(&mut self, members: &[Guid], pointer: Point, store: &NodeStateManager) -> DragStart {
        if self.gesture.is_some() {
            log::warn!("drag start rejected: a gesture is already active");
            return DragStart::Rejected(Rejection::AlreadyDragging);
        }
        let members: SmallVec<[(Guid, Vec2); 4]> = members
            .iter()
            .filter_map(|id| store.node(*id).map(|n| (*id, pointer - n.position())))
            .collect();
        if members.is_empty() {
            log::warn!("drag start rejected: no live members");
            return DragStart::Rejected(Rejection::NoLiveMembers);
        }
        let count = members.len();
        log::debug!("drag started with {count} members at {pointer:?}");
        self.pointer = pointer;
        self.gesture = Some(Gesture::Move { members });
        DragStart::Started { members: count }
    }

    /// Start scaling one node. Distance is measured from the node's centre.
    pub fn start_scale(
        &mut self,
        id: Guid,
        pointer: Point,
        store: &NodeStateManager,
        surface: &dyn RenderSurface,
        view: &CoordinateSystem,
    ) -> DragStart {
        if self.gesture.is_some() {
            log::warn!("scale start rejected: a gesture is already active");
            return DragStart::Rejected(Rejection::AlreadyDragging);
        }
        let Some(node) = store.node(id) else {
            log::warn!("scale start rejected: {id} is not live");
            return DragStart::Rejected(Rejection::NoLiveMembers);
        };
        let screen_center = node.transformed_center(surface, view).center().point();
        let center = view.screen_to_logical(screen_center);
        let start_distance = center.distance(pointer).max(1.0);
        log::debug!("scale started on {id}");
        self.pointer = pointer;
        self.gesture = Some(Gesture::Scale {
            node: id,
            center,
            start_distance,
            start_scale: node.scale(),
        });
        DragStart::Started { members: 1 }
    }

    /// Apply a pointer move. `None` when idle.
    pub fn update(
        &mut self,
        pointer: Point,
        store: &mut NodeStateManager,
        surface: &mut dyn RenderSurface,
        view: &CoordinateSystem,
    ) -> Option<DragUpdate> {
        let gesture = self.gesture.as_ref()?;
        self.pointer = pointer;
        let mut moved = SmallVec::<[Guid; 4]>::new();
        match gesture {
            Gesture::Move { members } => {
                for (id, offset) in members {
                    if store.move_node(*id, pointer - *offset, surface) {
                        moved.push(*id);
                    }
                }
            }
            Gesture::Scale {
                node,
                center,
                start_distance,
                start_scale,
            } => {
                let scale = start_scale * center.distance(pointer) / start_distance;
                if store.scale_node(*node, scale.max(self.min_scale), surface) {
                    moved.push(*node);
                }
            }
        }
        let edges_redrawn = store.redraw_edges_for(&moved, surface, view);
        log::trace!("drag update: {} moved, {edges_redrawn} edges", moved.len());
        Some(DragUpdate {
            moved,
            edges_redrawn,
        })
    }

    /// Re-anchor the gesture after the view changed under a stationary
    /// pointer: the pointer now sits over a different logical point, and
    /// the dragged nodes follow it.
    pub fn on_view_change(
        &mut self,
        change: &ViewChange,
        store: &mut NodeStateManager,
        surface: &mut dyn RenderSurface,
    ) -> Option<DragUpdate> {
        if change.is_noop() || !self.is_dragging() {
            return None;
        }
        let pointer = change.remap(self.pointer);
        self.update(pointer, store, surface, &change.new)
    }

    /// Pointer released. Positions stay where the last update put them.
    pub fn finish(&mut self) -> SmallVec<[Guid; 4]> {
        let members = self.members();
        if self.gesture.take().is_some() {
            log::debug!("drag finished");
        }
        members
    }

    /// Abort (focus loss, Escape). Same as `finish`: nothing is rolled back.
    pub fn cancel(&mut self) -> SmallVec<[Guid; 4]> {
        let members = self.members();
        if self.gesture.take().is_some() {
            log::debug!("drag cancelled");
        }
        members
    }
}
