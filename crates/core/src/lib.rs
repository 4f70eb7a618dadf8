//! Component-tree HTML with declarative front-end assets.
//!
//! Components built with [`html`] declare the asset names they need. An
//! [`assets::AssetManager`] resolves those names against an
//! [`assets::AssetRegistry`] and renders the `<link>`/`<script>` tags for the
//! page. [`json`] and [`client`] carry values and programs between the page
//! and server functions.

pub mod assets;
pub mod client;
pub mod errors;
pub mod html;
pub mod json;

pub use assets::{
    require_assets, require_to_html, Asset, AssetConfig, AssetManager, AssetRegistry,
};
pub use errors::{AssetError, HtmlError, JsonError};
pub use html::{Element, Node};

/// Resolve `names` against `registry` and return the `(head, foot)` HTML
/// fragments for a page.
pub fn render_assets(
    registry: &AssetRegistry,
    names: &[&str],
    config: AssetConfig,
) -> Result<(String, String), AssetError> {
    require_to_html(registry, names, config)
}
