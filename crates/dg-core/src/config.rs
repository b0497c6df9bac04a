//! Editor configuration.
//!
//! Every field has a default, so a partial document deserializes cleanly:
//!
//! ```
//! let cfg: dg_core::EditorConfig = serde_json::from_str(r#"{ "max_zoom": 8.0 }"#).unwrap();
//! assert_eq!(cfg.max_zoom, 8.0);
//! assert_eq!(cfg.min_zoom, 0.1);
//! ```

use crate::id::GuidStrategy;
use serde::{Deserialize, Serialize};

/// Size of the drawing viewport in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Lower zoom bound. Keeps the view transform invertible.
    pub min_zoom: f64,
    pub max_zoom: f64,

    /// Edge length of a node that has never been measured. The fallback
    /// anchor radius is half of this.
    pub default_node_size: f64,
    /// Smallest scale a node can be shrunk to.
    pub min_node_scale: f64,

    /// Logical offset applied to clones.
    pub clone_offset: (f64, f64),
    /// Appended to a clone's label. Empty keeps the label identical.
    pub clone_label_suffix: String,

    /// Pointer travel (screen px) below which press+release is a click.
    pub click_slop: f64,

    pub wheel_zoom_in: f64,
    pub wheel_zoom_out: f64,

    pub viewport: Viewport,

    /// Full width of the layout-jitter band; each axis moves by up to half.
    pub jitter_amplitude: f64,

    pub guid_strategy: GuidStrategy,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 5.0,
            default_node_size: 50.0,
            min_node_scale: 0.1,
            clone_offset: (50.0, 50.0),
            clone_label_suffix: String::new(),
            click_slop: 5.0,
            wheel_zoom_in: 1.1,
            wheel_zoom_out: 0.9,
            viewport: Viewport::default(),
            jitter_amplitude: 50.0,
            guid_strategy: GuidStrategy::Random,
        }
    }
}

impl EditorConfig {
    pub fn default_radius(&self) -> f64 {
        self.default_node_size / 2.0
    }

    /// The configured `(min, max)` zoom range, or the default range when
    /// the configured one is not finite with `0 < min <= max`.
    pub fn zoom_bounds(&self) -> (f64, f64) {
        let (min, max) = (self.min_zoom, self.max_zoom);
        if min.is_finite() && max.is_finite() && min > 0.0 && min <= max {
            return (min, max);
        }
        let fallback = Self::default();
        log::warn!(
            "invalid zoom range [{min}, {max}]; using [{}, {}]",
            fallback.min_zoom,
            fallback.max_zoom
        );
        (fallback.min_zoom, fallback.max_zoom)
    }

    /// Clamp a zoom level into the configured range.
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        let (min, max) = self.zoom_bounds();
        zoom.clamp(min, max)
    }
}
