pub mod hit;
pub mod surface;
pub mod svg;

pub use hit::{hit_test, hit_test_edge, hit_test_rect, node_screen_rect};
pub use surface::{Binding, SceneSurface};
pub use svg::render_svg;
