pub mod config;
pub mod coords;
pub mod error;
pub mod geometry;
pub mod id;
pub mod model;
pub mod render;
pub mod store;
pub mod viewbox;

pub use config::{EditorConfig, Viewport};
pub use coords::CoordinateSystem;
pub use error::{Error, Result};
pub use geometry::{Center, EdgePath, Geometry};
pub use id::{Guid, GuidRegistry, GuidStrategy, IdKind};
pub use model::*;
pub use render::{BindingId, BindingKind, Layer, LayerManager, RenderSurface};
pub use store::{LoadReport, NodeStateManager, Removed};
pub use viewbox::{ViewBoxManager, ViewChange};

// Re-export kurbo so downstream crates share one geometry vocabulary
pub use kurbo;
