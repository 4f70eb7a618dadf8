use bricks_core::assets::{
    rel_from_href, require_assets, require_deep, require_to_html, type_from_href, Asset,
    AssetConfig, AssetKind, AssetManager, AssetRegistry, ManagerState, Placement, RenderContext,
    Source,
};
use bricks_core::errors::AssetError;
use bricks_core::html::{parse::parse_fragment, tags, Node};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::sync::Arc;

fn names(assets: &[Arc<Asset>]) -> Vec<&str> {
    assets.iter().map(|a| a.name()).collect()
}

fn set(labels: &[&str]) -> BTreeSet<String> {
    labels.iter().map(|s| s.to_string()).collect()
}

// --- Registry ---

#[test]
fn test_last_registration_wins() {
    let mut registry = AssetRegistry::new();
    registry.register(Asset::new("a1").provides(["foo"]));
    let a2 = registry.register(Asset::new("a2").provides(["foo"]));

    assert_eq!(registry.load("foo").unwrap(), a2);
    assert_eq!(names(registry.possible_assets("foo").unwrap()), vec!["a1", "a2"]);
}

#[test]
fn test_load_unknown_label() {
    let registry = AssetRegistry::new();
    assert_eq!(
        registry.load("missing"),
        Err(AssetError::NotRegistered("missing".into()))
    );
}

#[test]
fn test_clear_forgets_labels() {
    let mut registry = AssetRegistry::new();
    registry.register(Asset::css("site.css", "/site.css"));
    registry.register(Asset::alias("site", ["site.css"]));
    assert_eq!(registry.labels(), vec!["site", "site.css"]);

    registry.clear(["site"]);
    assert!(!registry.contains("site"));
    assert!(registry.contains("site.css"));
}

#[test]
fn test_concrete_assets_provide_their_name() {
    let css = Asset::css("site.css", "/site.css");
    assert_eq!(css.provides_set(), &set(&["site.css"]));

    let abstract_asset = Asset::new("theme");
    assert!(abstract_asset.provides_set().is_empty());

    let themed = Asset::css("dark.css", "/dark.css").provides(["dark.css", "theme.css"]);
    assert!(themed.provide("theme.css"));
    assert!(themed.provide("dark.css"));
}

#[test]
fn test_resolution_loads_last_registration_even_for_bundles() {
    let mut registry = AssetRegistry::new();
    registry.register(Asset::script("ui.js", "/ui.js"));
    registry.register(Asset::script("ui", "/ui-all.js"));
    let bundle = registry.register(Asset::bundle("ui", ["ui.js"]));
    assert_eq!(registry.load("ui").unwrap(), bundle);

    let mut manager = AssetManager::new();
    manager.require(&registry, "ui", true).unwrap();

    assert_eq!(manager.assets()[0], bundle);
    assert_eq!(names(manager.assets()), vec!["ui", "ui.js"]);
    assert_eq!(
        manager.render_js_head().unwrap(),
        "<script src=\"/ui.js\"></script>"
    );
}

// --- Manager ---

#[test]
fn test_require_picks_last_registered() {
    let mut registry = AssetRegistry::new();
    registry.register(Asset::new("a1").provides(["foo"]));
    registry.register(Asset::new("a2").provides(["foo"]));

    let mut manager = AssetManager::new();
    manager.require(&registry, "foo", false).unwrap();
    manager.resolve(&registry).unwrap();

    assert_eq!(names(manager.assets()), vec!["a2"]);
}

#[test]
fn test_load_is_idempotent() {
    let asset = Arc::new(Asset::new("a1").provides(["foo"]).requires(["bar"]));
    let mut manager = AssetManager::new();
    manager.load(asset.clone()).unwrap();
    manager.load(asset.clone()).unwrap();
    manager.load(Arc::new((*asset).clone())).unwrap();

    assert_eq!(names(manager.assets()), vec!["a1"]);
    assert_eq!(manager.requires(), &["bar".to_string()]);
}

#[test]
fn test_resolve_requirements() {
    let mut registry = AssetRegistry::new();
    let asset1 = registry.register(
        Asset::new("asset1")
            .provides(["foo", "bar"])
            .requires(["ham"]),
    );
    registry.register(Asset::new("asset2").provides(["ham", "eggs"]));

    let mut manager = AssetManager::new();
    manager.load(asset1).unwrap();
    assert_eq!(manager.state(), ManagerState::Loading);
    manager.resolve(&registry).unwrap();

    assert_eq!(names(manager.assets()), vec!["asset1", "asset2"]);
    assert!(manager.requires().is_empty());
    assert_eq!(manager.provides(), &set(&["foo", "bar", "ham", "eggs"]));
    assert_eq!(manager.state(), ManagerState::Resolved);
    assert_eq!(
        manager.to_string(),
        "AssetManager([asset1, asset2], provides={'bar', 'eggs', 'foo', 'ham'})"
    );
}

#[test]
fn test_suggestions_are_preferred() {
    let mut registry = AssetRegistry::new();
    let a1 = registry.register(Asset::new("a1").provides(["foo"]));
    registry.register(Asset::new("a2").provides(["foo"]));
    let a3 = Arc::new(Asset::new("a3").requires(["foo"]).suggests("foo", a1));

    let mut manager = AssetManager::new();
    manager.load(a3).unwrap();
    manager.resolve(&registry).unwrap();

    assert_eq!(names(manager.assets()), vec!["a3", "a1"]);
}

#[test]
fn test_incomplete_suggestions_leave_pending_names() {
    let a1 = Arc::new(Asset::new("a1").provides(["foo"]));
    let a3 = Arc::new(
        Asset::new("a3")
            .requires(["foo", "bar"])
            .suggests("foo", a1),
    );

    let mut manager = AssetManager::new();
    manager.load(a3).unwrap();
    manager.resolve_suggested().unwrap();

    assert_eq!(names(manager.assets()), vec!["a3", "a1"]);
    assert_eq!(manager.requires(), &["bar".to_string()]);
}

#[test]
fn test_suggestions_chain_before_registry() {
    let mut registry = AssetRegistry::new();
    registry.register(Asset::new("default-theme").provides(["theme"]));
    registry.register(Asset::new("cold").provides(["palette"]));
    registry.register(Asset::new("fonts-default").provides(["fonts"]));

    let warm = Arc::new(Asset::new("warm").provides(["palette"]));
    let dark = Arc::new(
        Asset::new("dark")
            .provides(["theme"])
            .requires(["palette", "fonts"])
            .suggests("palette", warm),
    );
    let page = Arc::new(Asset::new("page").requires(["theme"]).suggests("theme", dark));

    let mut manager = AssetManager::new();
    manager.load(page).unwrap();
    manager.resolve_suggested().unwrap();
    assert_eq!(names(manager.assets()), vec!["page", "dark", "warm"]);
    assert_eq!(manager.requires(), &["fonts".to_string()]);

    manager.resolve(&registry).unwrap();
    assert_eq!(
        names(manager.assets()),
        vec!["page", "dark", "warm", "fonts-default"]
    );
    assert!(manager.requires().is_empty());
}

#[test]
fn test_suggestion_that_does_not_provide_is_tried_once() {
    let odd = Arc::new(Asset::new("odd").provides(["bar"]));
    let page = Arc::new(Asset::new("page").requires(["foo"]).suggests("foo", odd));

    let mut manager = AssetManager::new();
    manager.load(page).unwrap();
    manager.resolve_suggested().unwrap();

    assert_eq!(names(manager.assets()), vec!["page", "odd"]);
    assert_eq!(manager.requires(), &["foo".to_string()]);
    assert_eq!(manager.state(), ManagerState::Loading);
}

#[test]
fn test_missing_requirement_fails() {
    let registry = AssetRegistry::new();
    let mut manager = AssetManager::new();
    let err = manager.require(&registry, "nope", true).unwrap_err();
    assert_eq!(err, AssetError::NotRegistered("nope".into()));
}

#[test]
fn test_failed_resolution_poisons_manager() {
    let mut registry = AssetRegistry::new();
    registry.register(Asset::css("site.css", "/site.css"));
    registry.register(Asset::bottom_script("app.js", "/app.js").requires(["site.css", "gone"]));

    let mut manager = AssetManager::new();
    assert_eq!(
        manager.require(&registry, "app.js", true),
        Err(AssetError::NotRegistered("gone".into()))
    );
    assert_eq!(manager.state(), ManagerState::Failed);

    registry.register(Asset::new("gone").provides(["gone"]));
    assert_eq!(manager.resolve(&registry), Err(AssetError::Aborted));
    assert_eq!(manager.render_head(), Err(AssetError::Aborted));
    assert_eq!(manager.render_foot(), Err(AssetError::Aborted));
    assert_eq!(
        manager.require(&registry, "site.css", false),
        Err(AssetError::Aborted)
    );
}

#[test]
fn test_resolved_manager_is_sealed() {
    let mut registry = AssetRegistry::new();
    let css = registry.register(Asset::css("site.css", "/site.css"));

    let mut manager = AssetManager::new();
    assert_eq!(manager.state(), ManagerState::Empty);
    manager.require(&registry, "site.css", true).unwrap();

    assert_eq!(manager.load(css), Err(AssetError::Sealed));
    assert_eq!(
        manager.require(&registry, "site.css", false),
        Err(AssetError::Sealed)
    );
    assert_eq!(manager.resolve(&registry), Err(AssetError::Sealed));
}

#[test]
fn test_capture_collects_component_requirements() {
    let mut registry = AssetRegistry::new();
    registry.register(Asset::css("widget.css", "/widget.css"));
    registry.register(Asset::bottom_script("widget.js", "/widget.js"));

    let widget = tags::div()
        .class("widget")
        .requires(["widget.css"])
        .child(tags::span().requires(["widget.js"]));

    let mut manager = AssetManager::new();
    let mut capture = manager.capture();
    capture.register(&widget).unwrap();
    capture.finish(&registry).unwrap();

    assert_eq!(names(manager.assets()), vec!["widget.css", "widget.js"]);
}

#[test]
fn test_require_from_element_tree() {
    let mut registry = AssetRegistry::new();
    registry.register(Asset::css("a.css", "/a.css"));
    registry.register(Asset::css("b.css", "/b.css"));

    let page = tags::div()
        .requires(["a.css"])
        .child(tags::p().requires(["b.css", "a.css"]));

    let mut manager = AssetManager::new();
    manager.require_from(&registry, &page, true).unwrap();
    assert_eq!(names(manager.assets()), vec!["a.css", "b.css"]);
}

// --- Bundles ---

#[test]
fn test_bundle_pulls_in_members() {
    let registry = AssetRegistry::with_library();
    let assets = require_assets(&registry, "bootstrap").unwrap();
    assert_eq!(
        names(&assets),
        vec!["bootstrap", "bootstrap.css", "bootstrap.js"]
    );
}

#[test]
fn test_ambiguous_bundle() {
    let mut registry = AssetRegistry::new();
    registry.register(Asset::script("x.js", "/x.js"));
    registry.register(Asset::bundle("kit", ["x.js"]));
    registry.register(Asset::bundle("kit", ["x.js"]));

    let err = require_assets(&registry, "kit").unwrap_err();
    assert_eq!(
        err,
        AssetError::AmbiguousBundle {
            label: "kit".into(),
            count: 2
        }
    );

    // Not ambiguous once a later non-bundle asset shadows both bundles
    registry.register(Asset::script("kit", "/kit.js"));
    let assets = require_assets(&registry, "kit").unwrap();
    assert_eq!(names(&assets), vec!["kit"]);
}

#[test]
fn test_bundle_member_must_be_concrete() {
    let mut registry = AssetRegistry::new();
    registry.register(Asset::script("x.js", "/x.js"));
    registry.register(Asset::alias("x", ["x.js"]));
    registry.register(Asset::bundle("kit", ["x"]));

    let err = require_assets(&registry, "kit").unwrap_err();
    assert_eq!(
        err,
        AssetError::BundleMember {
            bundle: "kit".into(),
            member: "x".into()
        }
    );
}

// --- Rendering ---

#[test]
fn test_render_follows_load_order() {
    let mut registry = AssetRegistry::new();
    let asset1 = registry.register(
        Asset::script("asset1", "/a1.js")
            .provides(["asset1", "foo", "bar"])
            .requires(["ham"]),
    );
    registry.register(Asset::script("asset2", "/a2.js").provides(["asset2", "ham", "eggs"]));

    let mut manager = AssetManager::new();
    manager.load(asset1).unwrap();
    manager.resolve(&registry).unwrap();

    assert_eq!(names(manager.assets()), vec!["asset1", "asset2"]);
    assert_eq!(
        manager.render_js_head().unwrap(),
        "<script src=\"/a1.js\"></script>\n<script src=\"/a2.js\"></script>"
    );
}

#[test]
fn test_mutual_requirements_resolve_and_render() {
    let mut registry = AssetRegistry::new();
    registry.register(Asset::script("x.js", "/x.js").requires(["y.js"]));
    registry.register(Asset::script("y.js", "/y.js").requires(["x.js"]));

    let mut manager = AssetManager::new();
    manager.require(&registry, "x.js", true).unwrap();

    assert_eq!(manager.state(), ManagerState::Resolved);
    assert_eq!(names(manager.assets()), vec!["x.js", "y.js"]);
    assert_eq!(
        manager.render_head().unwrap(),
        "<script src=\"/x.js\"></script>\n<script src=\"/y.js\"></script>"
    );
}

#[test]
fn test_render_contexts() {
    let mut registry = AssetRegistry::new();
    registry.register(Asset::css("site.css", "/site.css"));
    registry.register(Asset::inline_css("inline.css", "body { margin: 0; }"));
    registry.register(Asset::script("head.js", "/head.js"));
    registry.register(Asset::bottom_script("foot.js", "/foot.js").mime("module"));
    registry.register(Asset::on_load("ready", "init();"));

    let mut manager = AssetManager::new();
    manager
        .require(
            &registry,
            ["site.css", "inline.css", "head.js", "foot.js", "ready"],
            true,
        )
        .unwrap();

    assert_eq!(
        manager.render(RenderContext::Css).unwrap(),
        "<link href=\"/site.css\" rel=\"stylesheet\" type=\"text/css\">\n\
         <style>body { margin: 0; }</style>"
    );
    assert_eq!(
        manager.render_js_head().unwrap(),
        "<script src=\"/head.js\"></script>"
    );
    assert_eq!(
        manager.render_foot().unwrap(),
        "<script src=\"/foot.js\" type=\"module\"></script>\n\
         <script>window.addEventListener(\"load\", function () {\ninit();\n});</script>"
    );
}

#[test]
fn test_render_round_trip_recovers_urls() {
    let mut registry = AssetRegistry::new();
    registry.register(Asset::css(
        "site.css",
        "https://cdn.example.com/site.css?v=1&theme=dark",
    ));
    registry.register(Asset::stylesheet(
        "local.css",
        Source::Static("css/local.css".into()),
    ));
    registry.register(Asset::script("head.js", "https://cdn.example.com/head.js"));
    registry.register(Asset::js(
        "app.js",
        Source::Static("js/app.js".into()),
        Placement::Bottom,
    ));

    let config = AssetConfig {
        static_url: "/static/".into(),
    };
    let (head, foot) = require_to_html(
        &registry,
        ["site.css", "local.css", "head.js", "app.js"],
        config,
    )
    .unwrap();

    let mut urls = Vec::new();
    for node in parse_fragment(&format!("{head}\n{foot}")).unwrap() {
        if let Node::Element(el) = node {
            let url = el.get_attr("href").or_else(|| el.get_attr("src"));
            urls.extend(url);
        }
    }
    assert_eq!(
        urls,
        vec![
            "https://cdn.example.com/site.css?v=1&theme=dark",
            "/static/css/local.css",
            "https://cdn.example.com/head.js",
            "/static/js/app.js",
        ]
    );
}

// --- Helpers ---

#[test]
fn test_require_deep_collects_unique_names() {
    let shared: Arc<[String]> = Arc::from(vec!["foo".to_string()]);
    let tree = tags::div()
        .requires(["foo"])
        .child(tags::span().share_requires(shared.clone()))
        .child(tags::span().share_requires(shared))
        .child(tags::p().requires(["bar", "foo"]).child(tags::a().requires(["bar"])));

    assert_eq!(require_deep(&tree), vec!["foo", "bar"]);
}

#[test]
fn test_href_helpers() {
    assert_eq!(rel_from_href("https://x.org/site.css?v=2").unwrap(), "stylesheet");
    assert_eq!(
        rel_from_href("/favicon.ico"),
        Err(AssetError::UnknownRel(".ico".into()))
    );
    assert_eq!(type_from_href("/site.css"), "text/css");
    assert_eq!(type_from_href("/notes.txt"), "text");
    assert_eq!(type_from_href("/feed.xml"), "text/xml");
}

#[test]
fn test_link_infers_rel_and_type() {
    let link = Asset::link("print", "/print.css").unwrap();
    assert_eq!(
        link.kind(),
        &AssetKind::Link {
            href: "/print.css".into(),
            rel: "stylesheet".into(),
            mime: "text/css".into(),
        }
    );
    assert_eq!(link.context(), Some(RenderContext::Css));
    assert!(Asset::link("icon", "/favicon.ico").is_err());
}

#[test]
fn test_to_bottom_copies_script() {
    let head = Asset::script("lib.js", "/lib.js");
    let bottom = head.to_bottom();
    assert_eq!(bottom.name(), "lib.js-bottom");
    assert_eq!(bottom.context(), Some(RenderContext::JsFoot));
}

#[test]
fn test_asset_display() {
    let a1 = Arc::new(Asset::new("a1").provides(["foo"]));
    assert_eq!(a1.to_string(), "Asset('a1', ['foo'])");
    assert_eq!(
        Asset::new("a2").requires(["foo", "bar"]).to_string(),
        "Asset('a2', requires=['foo', 'bar'])"
    );
    assert_eq!(
        Asset::new("a3").suggests("foo", a1).to_string(),
        "Asset('a3', suggests={'foo': a1})"
    );
    assert_eq!(Asset::new("a4").to_string(), "Asset('a4')");
    assert_eq!(
        Asset::css("site.css", "/site.css").to_string(),
        "Css('site.css', ['site.css'])"
    );
}

#[test]
fn test_render_context_names() {
    for context in RenderContext::ALL {
        assert_eq!(context.as_str().parse::<RenderContext>(), Ok(context));
    }
    assert_eq!("js-foot".parse::<RenderContext>(), Ok(RenderContext::JsFoot));
}

// --- Library ---

#[test]
fn test_library_jquery_ui_uses_base_theme() {
    let registry = AssetRegistry::with_library();
    let (head, foot) = require_to_html(&registry, "jquery-ui", AssetConfig::default()).unwrap();

    assert_eq!(
        head,
        "<link href=\"https://code.jquery.com/ui/1.12.1/themes/base/jquery-ui.min.css\" \
         rel=\"stylesheet\" type=\"text/css\">"
    );
    assert_eq!(
        foot,
        "<script src=\"https://code.jquery.com/ui/1.12.1/jquery-ui.min.js\"></script>\n\
         <script src=\"https://code.jquery.com/jquery-3.2.1.min.js\"></script>"
    );
}

#[test]
fn test_library_mdl_pulls_in_icons() {
    let registry = AssetRegistry::with_library();
    let assets = require_assets(&registry, "mdl").unwrap();
    let loaded = names(&assets);
    assert!(loaded.contains(&"material-icons.css"));
    assert!(loaded.contains(&"mdl.js"));
}
