use super::utils::{rel_from_href, type_from_href};
use crate::errors::AssetError;
use crate::html::{tags, Element, Text};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

const DEFAULT_SCRIPT_TYPE: &str = "text/javascript";

/// Where a script or stylesheet body comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    /// Absolute or page-relative URL.
    Href(String),
    /// Path below the configured static URL.
    Static(String),
    /// Source code embedded in the page.
    Inline(String),
}

impl Source {
    /// URL of the resource, or `None` for inline sources.
    pub fn link(&self, static_url: &str) -> Option<String> {
        match self {
            Source::Href(href) => Some(href.clone()),
            Source::Static(path) => Some(join_static(static_url, path)),
            Source::Inline(_) => None,
        }
    }
}

fn join_static(static_url: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if static_url.is_empty() || static_url.ends_with('/') {
        format!("{static_url}{path}")
    } else {
        format!("{static_url}/{path}")
    }
}

/// Where a script tag goes on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    Head,
    /// Safe to load just before `</body>`.
    Bottom,
}

/// Page section an asset fragment is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderContext {
    Css,
    JsHead,
    JsFoot,
    JsOnLoad,
}

impl RenderContext {
    pub const ALL: [RenderContext; 4] = [
        RenderContext::Css,
        RenderContext::JsHead,
        RenderContext::JsFoot,
        RenderContext::JsOnLoad,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RenderContext::Css => "css",
            RenderContext::JsHead => "js_head",
            RenderContext::JsFoot => "js_foot",
            RenderContext::JsOnLoad => "js_on_load",
        }
    }
}

impl FromStr for RenderContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "css" => Ok(RenderContext::Css),
            "js_head" => Ok(RenderContext::JsHead),
            "js_foot" => Ok(RenderContext::JsFoot),
            "js_on_load" => Ok(RenderContext::JsOnLoad),
            other => Err(format!("unknown render context: {other}")),
        }
    }
}

impl fmt::Display for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an asset is and how it renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Pure dependency node, renders nothing.
    Abstract,
    /// Umbrella name over member assets.
    Bundle { members: Vec<String> },
    Script {
        source: Source,
        mime: String,
        placement: Placement,
    },
    Stylesheet { source: Source },
    Link {
        href: String,
        rel: String,
        mime: String,
    },
    /// Body of a window load callback.
    OnLoad { source: String },
}

/// A named front-end resource with its dependencies.
///
/// Assets are built with the constructors and chaining methods below, then
/// handed to an [`AssetRegistry`](super::AssetRegistry) which shares them as
/// `Arc<Asset>`. They are never mutated after registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Asset {
    name: String,
    provides: BTreeSet<String>,
    requires: Vec<String>,
    suggests: BTreeMap<String, Arc<Asset>>,
    kind: AssetKind,
}

impl Asset {
    fn with_kind(name: &str, kind: AssetKind) -> Self {
        let mut asset = Self {
            name: name.to_string(),
            provides: BTreeSet::new(),
            requires: Vec::new(),
            suggests: BTreeMap::new(),
            kind,
        };
        if asset.is_concrete() || asset.is_bundle() {
            asset.provides.insert(asset.name.clone());
        }
        asset
    }

    /// An abstract asset. Provides nothing unless told otherwise.
    pub fn new(name: &str) -> Self {
        Self::with_kind(name, AssetKind::Abstract)
    }

    /// Abstract asset that provides its own name and pulls in `requires`.
    pub fn alias<I, S>(name: &str, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name).provides([name]).requires(requires)
    }

    pub fn bundle<I, S>(name: &str, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members: Vec<String> = members.into_iter().map(Into::into).collect();
        let mut asset = Self::with_kind(
            name,
            AssetKind::Bundle {
                members: members.clone(),
            },
        );
        asset.requires = members;
        asset
    }

    pub fn js(name: &str, source: Source, placement: Placement) -> Self {
        Self::with_kind(
            name,
            AssetKind::Script {
                source,
                mime: DEFAULT_SCRIPT_TYPE.to_string(),
                placement,
            },
        )
    }

    /// External script loaded in `<head>`.
    pub fn script(name: &str, src: &str) -> Self {
        Self::js(name, Source::Href(src.to_string()), Placement::Head)
    }

    /// External script loaded at the bottom of the page.
    pub fn bottom_script(name: &str, src: &str) -> Self {
        Self::js(name, Source::Href(src.to_string()), Placement::Bottom)
    }

    pub fn inline_script(name: &str, source: &str) -> Self {
        Self::js(name, Source::Inline(source.to_string()), Placement::Head)
    }

    pub fn stylesheet(name: &str, source: Source) -> Self {
        Self::with_kind(name, AssetKind::Stylesheet { source })
    }

    pub fn css(name: &str, href: &str) -> Self {
        Self::stylesheet(name, Source::Href(href.to_string()))
    }

    pub fn inline_css(name: &str, source: &str) -> Self {
        Self::stylesheet(name, Source::Inline(source.to_string()))
    }

    /// Generic `<link>`; rel and type are inferred from the href.
    pub fn link(name: &str, href: &str) -> Result<Self, AssetError> {
        let rel = rel_from_href(href)?;
        Ok(Self::link_with(name, href, &rel, &type_from_href(href)))
    }

    pub fn link_with(name: &str, href: &str, rel: &str, mime: &str) -> Self {
        Self::with_kind(
            name,
            AssetKind::Link {
                href: href.to_string(),
                rel: rel.to_string(),
                mime: mime.to_string(),
            },
        )
    }

    pub fn on_load(name: &str, source: &str) -> Self {
        Self::with_kind(
            name,
            AssetKind::OnLoad {
                source: source.to_string(),
            },
        )
    }

    /// Replace the provided labels. Concrete assets fall back to their own
    /// name when given none.
    pub fn provides<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.provides = labels.into_iter().map(Into::into).collect();
        if self.provides.is_empty() && self.is_concrete() {
            self.provides.insert(self.name.clone());
        }
        self
    }

    pub fn requires<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for label in labels {
            let label = label.into();
            if !self.requires.contains(&label) {
                self.requires.push(label);
            }
        }
        self
    }

    /// Suggest `asset` as the default provider of `label`.
    pub fn suggests(mut self, label: &str, asset: Arc<Asset>) -> Self {
        self.suggests.insert(label.to_string(), asset);
        self
    }

    /// Script MIME type. Only meaningful for scripts.
    pub fn mime(mut self, mime: &str) -> Self {
        if let AssetKind::Script { mime: current, .. } = &mut self.kind {
            *current = mime.to_string();
        }
        self
    }

    /// Bottom-of-page copy of a script, named `<name>-bottom`. Other kinds are
    /// returned unchanged.
    pub fn to_bottom(&self) -> Self {
        match &self.kind {
            AssetKind::Script { source, mime, .. } => Self {
                name: format!("{}-bottom", self.name),
                kind: AssetKind::Script {
                    source: source.clone(),
                    mime: mime.clone(),
                    placement: Placement::Bottom,
                },
                ..self.clone()
            },
            _ => self.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provides_set(&self) -> &BTreeSet<String> {
        &self.provides
    }

    pub fn requires_list(&self) -> &[String] {
        &self.requires
    }

    pub fn suggests_map(&self) -> &BTreeMap<String, Arc<Asset>> {
        &self.suggests
    }

    pub fn kind(&self) -> &AssetKind {
        &self.kind
    }

    /// True for assets that render something.
    pub fn is_concrete(&self) -> bool {
        !matches!(self.kind, AssetKind::Abstract | AssetKind::Bundle { .. })
    }

    pub fn is_bundle(&self) -> bool {
        matches!(self.kind, AssetKind::Bundle { .. })
    }

    pub fn provide(&self, label: &str) -> bool {
        self.name == label || self.provides.contains(label)
    }

    /// The page section this asset renders into, if any.
    pub fn context(&self) -> Option<RenderContext> {
        match &self.kind {
            AssetKind::Abstract | AssetKind::Bundle { .. } => None,
            AssetKind::Script {
                placement: Placement::Head,
                ..
            } => Some(RenderContext::JsHead),
            AssetKind::Script {
                placement: Placement::Bottom,
                ..
            } => Some(RenderContext::JsFoot),
            AssetKind::Stylesheet { .. } | AssetKind::Link { .. } => Some(RenderContext::Css),
            AssetKind::OnLoad { .. } => Some(RenderContext::JsOnLoad),
        }
    }

    /// The element this asset renders as.
    pub fn tag(&self, static_url: &str) -> Option<Element> {
        let el = match &self.kind {
            AssetKind::Abstract | AssetKind::Bundle { .. } => return None,
            AssetKind::Script { source, mime, .. } => {
                let mut el = match source {
                    Source::Inline(code) => tags::script().child(Text::raw(code.as_str())),
                    other => tags::script().attr("src", other.link(static_url).unwrap_or_default()),
                };
                if mime != DEFAULT_SCRIPT_TYPE {
                    el = el.attr("type", mime.as_str());
                }
                el
            }
            AssetKind::Stylesheet { source } => match source {
                Source::Inline(code) => tags::style().child(Text::raw(code.as_str())),
                other => tags::link()
                    .attr("href", other.link(static_url).unwrap_or_default())
                    .attr("rel", "stylesheet")
                    .attr("type", "text/css"),
            },
            AssetKind::Link { href, rel, mime } => tags::link()
                .attr("href", href.as_str())
                .attr("rel", rel.as_str())
                .attr("type", mime.as_str()),
            AssetKind::OnLoad { source } => tags::script().child(Text::raw(format!(
                "window.addEventListener(\"load\", function () {{\n{source}\n}});"
            ))),
        };
        Some(el)
    }

    /// HTML fragment for `context`, if this asset renders there.
    pub fn render(&self, context: RenderContext, static_url: &str) -> Option<String> {
        if self.context() != Some(context) {
            return None;
        }
        self.tag(static_url).map(|el| el.render())
    }

    fn kind_name(&self) -> &'static str {
        match self.kind {
            AssetKind::Abstract => "Asset",
            AssetKind::Bundle { .. } => "Bundle",
            AssetKind::Script { .. } => "Script",
            AssetKind::Stylesheet { .. } => "Css",
            AssetKind::Link { .. } => "Link",
            AssetKind::OnLoad { .. } => "OnLoad",
        }
    }
}

pub(crate) fn quoted_list<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items
        .into_iter()
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Asset {
    /// `Asset('name', ['p1', 'p2'])`, `Asset('name', requires=[..])`,
    /// `Asset('name', suggests={'k': other})` or `Asset('name')`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cname = self.kind_name();
        let name = &self.name;
        if !self.provides.is_empty() {
            write!(f, "{cname}('{name}', [{}])", quoted_list(&self.provides))
        } else if !self.requires.is_empty() {
            write!(f, "{cname}('{name}', requires=[{}])", quoted_list(&self.requires))
        } else if !self.suggests.is_empty() {
            let data = self
                .suggests
                .iter()
                .map(|(k, v)| format!("'{}': {}", k, v.name))
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "{cname}('{name}', suggests={{{data}}})")
        } else {
            write!(f, "{cname}('{name}')")
        }
    }
}
