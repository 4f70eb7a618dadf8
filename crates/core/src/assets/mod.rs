//! Front-end asset declarations and dependency resolution.
//!
//! Assets (scripts, stylesheets, bundles and pure dependency nodes) are
//! declared into an [`AssetRegistry`]. A page builds an [`AssetManager`],
//! requires the names it needs and resolves them into an ordered list that
//! renders as the `<head>` and end-of-`<body>` fragments of the document.

mod asset;
pub mod library;
mod manager;
mod registry;
mod utils;

pub use asset::{Asset, AssetKind, Placement, RenderContext, Source};
pub use manager::{
    require_assets, require_to_html, AssetManager, Capture, ManagerState, Requirement,
};
pub use registry::AssetRegistry;
pub use utils::{rel_from_href, require_deep, type_from_href};

/// Configuration for rendering assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetConfig {
    /// Prefix for [`Source::Static`] paths.
    pub static_url: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            static_url: "static/".to_string(),
        }
    }
}
