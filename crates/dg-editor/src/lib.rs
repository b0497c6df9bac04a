//! Interaction layer for DG: input events, gestures, shortcuts, the
//! layout-jitter worker, and the session that ties them to the model.

pub mod drag;
pub mod input;
pub mod interaction;
pub mod session;
pub mod shortcuts;
pub mod worker;

pub use drag::{DragManager, DragStart, DragUpdate, Rejection};
pub use input::{InputEvent, Modifiers, PointerButton};
pub use interaction::{Effect, InteractionManager, Mode};
pub use session::DiagramSession;
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use worker::{LayoutWorker, SplitMix64, jitter};
