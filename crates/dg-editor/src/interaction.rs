//! Top-level input dispatch.
//!
//! `InteractionManager` turns input events (plus the node under the
//! pointer, if any) into [`Effect`]s. It owns the selection and the mode
//! but never touches model objects; the session applies the effects.
//!
//! ## Pointer bindings
//!
//! | Press | Target | Gesture |
//! |-------|--------|---------|
//! | Left | node | drag node (or the whole selection it belongs to) |
//! | Left | canvas | rubber-band select (Shift adds) |
//! | Shift + Left | node | create edge |
//! | Alt + Left | node | scale node |
//! | Middle, or Ctrl + Left | anywhere | pan |
//! | Wheel | anywhere | zoom about pointer |

use crate::input::{InputEvent, Modifiers, PointerButton};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use dg_core::{EditorConfig, Guid, Layer};
use kurbo::{Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Select,
    Drag,
    CreateEdge,
    Pan,
}

/// A state change for the session to apply. Points are screen space.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// The selection is now exactly these ids.
    Select(Vec<Guid>),
    /// Replace (or extend, when `additive`) the selection with every node
    /// inside a screen rectangle.
    SelectRect { rect: Rect, additive: bool },
    SelectAll,

    StartDrag { members: Vec<Guid>, pointer: Point },
    StartScale { node: Guid, pointer: Point },
    DragTo(Point),
    EndDrag,
    CancelDrag,

    StartEdge { from: Guid, pointer: Point },
    MoveEdge(Point),
    CommitEdge { from: Guid, to: Guid },
    CancelEdge,

    StartPan(Point),
    PanTo(Point),
    EndPan,
    Zoom { factor: f64, anchor: Point },
    ZoomCentered(f64),
    ResetView,
    ToggleLayer(Layer),

    Delete(Vec<Guid>),
    Clone(Vec<Guid>),
}

#[derive(Debug, Clone, Copy)]
struct Press {
    at: Point,
    node: Option<Guid>,
    /// Whether the pressed node was selected before this press.
    was_selected: bool,
}

#[derive(Debug, Clone)]
pub struct InteractionManager {
    mode: Mode,
    selection: Vec<Guid>,
    press: Option<Press>,
    edge_source: Option<Guid>,
    /// Rubber-band rectangle, screen space. Set while selecting.
    marquee: Option<(Point, Point)>,
    /// Shift was held when the rubber band started.
    marquee_additive: bool,
    click_slop: f64,
    wheel_zoom_in: f64,
    wheel_zoom_out: f64,
}

impl Default for InteractionManager {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl InteractionManager {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            mode: Mode::Select,
            selection: Vec::new(),
            press: None,
            edge_source: None,
            marquee: None,
            marquee_additive: false,
            click_slop: config.click_slop,
            wheel_zoom_in: config.wheel_zoom_in,
            wheel_zoom_out: config.wheel_zoom_out,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn selection(&self) -> &[Guid] {
        &self.selection
    }

    pub fn is_selected(&self, id: Guid) -> bool {
        self.selection.contains(&id)
    }

    /// Node an edge is being drawn from.
    pub fn edge_source(&self) -> Option<Guid> {
        self.edge_source
    }

    /// Current rubber-band rectangle, normalized.
    pub fn marquee_rect(&self) -> Option<Rect> {
        self.marquee.map(|(a, b)| Rect::from_points(a, b))
    }

    /// Replace the selection (after the session resolved a rectangle or
    /// select-all, or removed nodes).
    pub fn set_selection(&mut self, ids: Vec<Guid>) {
        self.selection = ids;
    }

    /// Forget ids that are no longer live.
    pub fn retain_selection(&mut self, mut live: impl FnMut(Guid) -> bool) {
        self.selection.retain(|id| live(*id));
    }

    /// Handle an input event. `hit` is the topmost node under the pointer.
    pub fn handle(&mut self, event: &InputEvent, hit: Option<Guid>) -> Vec<Effect> {
        match event {
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => self.pointer_down(Point::new(*x, *y), *button, *modifiers, hit),
            InputEvent::PointerMove { x, y, .. } => self.pointer_move(Point::new(*x, *y)),
            InputEvent::PointerUp { x, y, .. } => self.pointer_up(Point::new(*x, *y), hit),
            InputEvent::Wheel { x, y, delta_y, .. } => {
                if *delta_y == 0.0 || !delta_y.is_finite() {
                    return vec![];
                }
                let factor = if *delta_y < 0.0 {
                    self.wheel_zoom_in
                } else {
                    self.wheel_zoom_out
                };
                vec![Effect::Zoom {
                    factor,
                    anchor: Point::new(*x, *y),
                }]
            }
            InputEvent::Key { key, modifiers } => match ShortcutMap::resolve(key, *modifiers) {
                Some(action) => self.shortcut(action),
                None => vec![],
            },
            InputEvent::FocusLost => self.cancel(),
        }
    }

    fn pointer_down(
        &mut self,
        at: Point,
        button: PointerButton,
        modifiers: Modifiers,
        hit: Option<Guid>,
    ) -> Vec<Effect> {
        if self.mode != Mode::Select {
            log::warn!("pointer down ignored in {:?} mode", self.mode);
            return vec![];
        }

        if button == PointerButton::Middle || (button == PointerButton::Primary && modifiers.ctrl) {
            self.set_mode(Mode::Pan);
            return vec![Effect::StartPan(at)];
        }
        if button != PointerButton::Primary {
            return vec![];
        }

        let Some(node) = hit else {
            // Empty canvas: rubber band.
            self.marquee = Some((at, at));
            self.marquee_additive = modifiers.shift;
            self.press = Some(Press {
                at,
                node: None,
                was_selected: false,
            });
            if modifiers.shift || self.selection.is_empty() {
                return vec![];
            }
            self.selection.clear();
            return vec![Effect::Select(vec![])];
        };

        if modifiers.shift {
            self.edge_source = Some(node);
            self.set_mode(Mode::CreateEdge);
            return vec![Effect::StartEdge {
                from: node,
                pointer: at,
            }];
        }

        let was_selected = self.is_selected(node);
        self.press = Some(Press {
            at,
            node: Some(node),
            was_selected,
        });
        let mut effects = Vec::with_capacity(2);
        if !was_selected {
            self.selection = vec![node];
            effects.push(Effect::Select(self.selection.clone()));
        }
        self.set_mode(Mode::Drag);
        if modifiers.alt {
            effects.push(Effect::StartScale { node, pointer: at });
        } else {
            effects.push(Effect::StartDrag {
                members: self.selection.clone(),
                pointer: at,
            });
        }
        effects
    }

    fn pointer_move(&mut self, at: Point) -> Vec<Effect> {
        match self.mode {
            Mode::Select => {
                if let Some((start, _)) = self.marquee {
                    self.marquee = Some((start, at));
                }
                vec![]
            }
            Mode::Drag => vec![Effect::DragTo(at)],
            Mode::CreateEdge => vec![Effect::MoveEdge(at)],
            Mode::Pan => vec![Effect::PanTo(at)],
        }
    }

    fn pointer_up(&mut self, at: Point, hit: Option<Guid>) -> Vec<Effect> {
        let press = self.press.take();
        match self.mode {
            Mode::Select => {
                let Some((start, _)) = self.marquee.take() else {
                    return vec![];
                };
                if start.distance(at) < self.click_slop {
                    return vec![];
                }
                vec![Effect::SelectRect {
                    rect: Rect::from_points(start, at),
                    additive: self.marquee_additive,
                }]
            }
            Mode::Drag => {
                self.set_mode(Mode::Select);
                let mut effects = vec![Effect::EndDrag];
                if let Some(Press {
                    at: pressed_at,
                    node: Some(node),
                    was_selected: true,
                }) = press
                    && pressed_at.distance(at) < self.click_slop
                {
                    // Click on an already-selected node toggles it off.
                    self.selection.retain(|id| *id != node);
                    effects.push(Effect::Select(self.selection.clone()));
                }
                effects
            }
            Mode::CreateEdge => {
                self.set_mode(Mode::Select);
                let from = self.edge_source.take();
                match (from, hit) {
                    (Some(from), Some(to)) if from != to => vec![Effect::CommitEdge { from, to }],
                    _ => vec![Effect::CancelEdge],
                }
            }
            Mode::Pan => {
                self.set_mode(Mode::Select);
                vec![Effect::EndPan]
            }
        }
    }

    fn shortcut(&mut self, action: ShortcutAction) -> Vec<Effect> {
        match action {
            ShortcutAction::Cancel => {
                let mut effects = self.cancel();
                if !self.selection.is_empty() {
                    self.selection.clear();
                    effects.push(Effect::Select(vec![]));
                }
                effects
            }
            ShortcutAction::Delete => {
                if self.mode != Mode::Select || self.selection.is_empty() {
                    return vec![];
                }
                let ids = std::mem::take(&mut self.selection);
                vec![Effect::Delete(ids)]
            }
            ShortcutAction::Duplicate => {
                if self.mode != Mode::Select || self.selection.is_empty() {
                    return vec![];
                }
                vec![Effect::Clone(self.selection.clone())]
            }
            ShortcutAction::SelectAll => vec![Effect::SelectAll],
            ShortcutAction::ResetView => vec![Effect::ResetView],
            ShortcutAction::ZoomIn => vec![Effect::ZoomCentered(self.wheel_zoom_in)],
            ShortcutAction::ZoomOut => vec![Effect::ZoomCentered(self.wheel_zoom_out)],
            ShortcutAction::ToggleLayer(layer) => vec![Effect::ToggleLayer(layer)],
        }
    }

    /// Abort whatever gesture is active. The model stays as the last
    /// completed update left it; no half-created edge survives.
    pub fn cancel(&mut self) -> Vec<Effect> {
        self.press = None;
        self.marquee = None;
        let effects = match self.mode {
            Mode::Select => vec![],
            Mode::Drag => vec![Effect::CancelDrag],
            Mode::CreateEdge => {
                self.edge_source = None;
                vec![Effect::CancelEdge]
            }
            Mode::Pan => vec![Effect::EndPan],
        };
        self.set_mode(Mode::Select);
        effects
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            log::debug!("interaction mode {:?} → {:?}", self.mode, mode);
            self.mode = mode;
        }
    }
}
