pub mod adapter;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod geometry;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod panzoom;
pub mod render;
pub mod surface;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::Config;
pub use error::{Error, Result};
pub use layout::{Layout, ViewKind, compute_layout};
pub use surface::{Surface, ViewStatus, fit_to_frame, publish_last_tree};

/// Parses family JSON and renders `view` to an SVG string in one call. Tree
/// renders become the target of `fit_to_frame(None)`.
pub fn render_family_svg(json: &str, view: ViewKind, width: f32, height: f32, config: &Config) -> Result<String> {
    let tree = adapter::parse_tree_json(json)?;
    let layout = compute_layout(&tree, view, width, height, config);
    if let Layout::Tree(tree_layout) = &layout {
        publish_last_tree(tree_layout, &config.view);
    }
    Ok(render::render_svg(&layout, config))
}
