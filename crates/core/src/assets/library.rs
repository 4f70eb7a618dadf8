//! Common JavaScript and CSS libraries served from public CDNs.
//!
//! Sections: DOM manipulation, fonts and icons, frameworks, functional
//! utilities, templating and styling.

use super::{Asset, AssetRegistry};

const CLOUDFLARE: &str = "https://cdnjs.cloudflare.com/ajax/libs/";

/// Every jQuery UI theme on the CDN. "base" is the default.
pub const JQUERY_UI_THEMES: &[&str] = &[
    "base",
    "black-tie",
    "blitzer",
    "cupertino",
    "dark-hive",
    "dot-luv",
    "eggplant",
    "excite-bike",
    "flick",
    "hot-sneaks",
    "humanity",
    "le-frog",
    "mint-choc",
    "overcast",
    "pepper-grinder",
    "redmond",
    "smoothness",
    "south-street",
    "start",
    "sunny",
    "swanky-purse",
    "trontastic",
    "ui-darkness",
    "ui-lightness",
    "vader",
];

/// Google fonts with a registered stylesheet.
pub const GOOGLE_FONTS: &[&str] = &["Roboto", "Roboto+Mono", "Lato", "Amatic+SC"];

/// Declare the built-in library into `registry`.
pub fn register_library(registry: &mut AssetRegistry) {
    register_dom(registry);
    register_fonts(registry);
    register_frameworks(registry);
    register_functional(registry);
    register_templating(registry);
    register_styling(registry);
}

// DOM manipulation: jquery, jquery UI
fn register_dom(registry: &mut AssetRegistry) {
    let version = "3.2.1";
    registry.register(Asset::bottom_script(
        "jquery.js",
        &format!("https://code.jquery.com/jquery-{version}.min.js"),
    ));
    registry.register(Asset::alias("jquery", ["jquery.js"]));

    let prefix = "https://code.jquery.com/ui/1.12.1/";
    for theme in JQUERY_UI_THEMES {
        let name = format!("jquery-ui-{theme}.css");
        registry.register(
            Asset::css(&name, &format!("{prefix}themes/{theme}/jquery-ui.min.css"))
                .provides([name.as_str(), "jquery-ui.css"]),
        );
    }
    registry.register(
        Asset::new("jquery-ui.css")
            .provides(["jquery-ui.css"])
            .requires(["jquery-ui-base.css"]),
    );
    registry.register(
        Asset::bottom_script("jquery-ui.js", &format!("{prefix}jquery-ui.min.js"))
            .requires(["jquery"]),
    );
    registry.register(Asset::alias("jquery-ui", ["jquery-ui.css", "jquery-ui.js"]));
}

// Fonts and icons: font-awesome, google, material-icons
fn register_fonts(registry: &mut AssetRegistry) {
    let prefix = format!("{CLOUDFLARE}font-awesome/4.7.0/");
    registry.register(Asset::css(
        "font-awesome.css",
        &format!("{prefix}font-awesome.min.css"),
    ));
    registry.register(Asset::alias("font-awesome", ["font-awesome.css"]));

    let mut fonts = Vec::new();
    for family in GOOGLE_FONTS {
        let name = format!("{}-font", family.to_lowercase().replace('+', "-"));
        registry.register(Asset::css(
            &name,
            &format!("https://fonts.googleapis.com/css?family={family}"),
        ));
        fonts.push(name);
    }
    registry.register(Asset::alias("google-fonts", fonts));

    registry.register(Asset::css(
        "material-icons.css",
        "https://fonts.googleapis.com/icon?family=Material+Icons",
    ));
    registry.register(Asset::alias("material-icons", ["material-icons.css"]));
}

// Frameworks: vue
fn register_frameworks(registry: &mut AssetRegistry) {
    registry.register(Asset::bottom_script("vue.js", "https://unpkg.com/vue"));
    registry.register(Asset::alias("vue", ["vue.js"]));
}

// Functional and algorithms: underscore
fn register_functional(registry: &mut AssetRegistry) {
    let prefix = format!("{CLOUDFLARE}underscore.js/1.8.3/");
    registry.register(Asset::bottom_script(
        "underscore.js",
        &format!("{prefix}underscore-min.js"),
    ));
    registry.register(Asset::alias("underscore", ["underscore.js"]));
}

// Templating: handlebars
fn register_templating(registry: &mut AssetRegistry) {
    registry.register(Asset::script(
        "handlebars.js",
        &format!("{CLOUDFLARE}handlebars.js/4.0.6/handlebars.min.js"),
    ));
    registry.register(Asset::alias("handlebars", ["handlebars.js"]));
}

// Styling: bootstrap, mdl, materialize
fn register_styling(registry: &mut AssetRegistry) {
    let prefix = format!("{CLOUDFLARE}twitter-bootstrap/4.0.0-alpha.6/");
    registry.register(Asset::css(
        "bootstrap.css",
        &format!("{prefix}css/bootstrap.min.css"),
    ));
    registry.register(Asset::bottom_script(
        "bootstrap.js",
        &format!("{prefix}js/bootstrap.min.js"),
    ));
    registry.register(Asset::bundle("bootstrap", ["bootstrap.css", "bootstrap.js"]));

    // Only the default MDL theme for now
    let prefix = "https://code.getmdl.io/1.3.0/";
    registry.register(
        Asset::css("mdl.css", &format!("{prefix}material.indigo-pink.min.css"))
            .requires(["material-icons"]),
    );
    registry.register(Asset::bottom_script(
        "mdl.js",
        &format!("{prefix}material.min.js"),
    ));
    registry.register(Asset::bundle("mdl", ["mdl.css", "mdl.js"]));

    let prefix = format!("{CLOUDFLARE}materialize/0.98.2/");
    registry.register(Asset::css(
        "materialize.css",
        &format!("{prefix}css/materialize.min.css"),
    ));
    registry.register(Asset::bottom_script(
        "materialize.js",
        &format!("{prefix}js/materialize.min.js"),
    ));
    registry.register(Asset::bundle(
        "materialize",
        ["materialize.js", "materialize.css"],
    ));
}
