use super::asset::{quoted_list, Asset, RenderContext};
use super::registry::AssetRegistry;
use super::utils::require_deep;
use super::AssetConfig;
use crate::errors::AssetError;
use crate::html::Element;
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

/// Lifecycle of a manager. There is no way back from `Resolved` or
/// `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Empty,
    Loading,
    Resolving,
    Resolved,
    /// Resolution aborted. The partial state is never used.
    Failed,
}

/// Names handed to [`AssetManager::require`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    One(String),
    Many(Vec<String>),
}

impl Requirement {
    pub fn into_names(self) -> Vec<String> {
        match self {
            Requirement::One(name) => vec![name],
            Requirement::Many(names) => names,
        }
    }
}

impl From<&str> for Requirement {
    fn from(name: &str) -> Self {
        Requirement::One(name.to_string())
    }
}

impl From<String> for Requirement {
    fn from(name: String) -> Self {
        Requirement::One(name)
    }
}

impl From<Vec<String>> for Requirement {
    fn from(names: Vec<String>) -> Self {
        Requirement::Many(names)
    }
}

impl From<Vec<&str>> for Requirement {
    fn from(names: Vec<&str>) -> Self {
        Requirement::Many(names.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for Requirement {
    fn from(names: &[&str]) -> Self {
        Requirement::Many(names.iter().map(|s| s.to_string()).collect())
    }
}

impl From<&[String]> for Requirement {
    fn from(names: &[String]) -> Self {
        Requirement::Many(names.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for Requirement {
    fn from(names: [&str; N]) -> Self {
        Requirement::Many(names.iter().map(|s| s.to_string()).collect())
    }
}

/// Collects the assets needed to render one page.
///
/// Assets are loaded in order; every load records what the asset provides,
/// queues what it still requires and remembers its suggestions. `resolve`
/// then satisfies the queue, first from suggestions and then from the
/// registry. A manager is single use: once resolved it only renders.
#[derive(Debug, Clone)]
pub struct AssetManager {
    assets: Vec<Arc<Asset>>,
    requires: Vec<String>,
    provides: BTreeSet<String>,
    suggests: BTreeMap<String, Arc<Asset>>,
    state: ManagerState,
    config: AssetConfig,
}

impl Default for AssetManager {
    fn default() -> Self {
        Self::with_config(AssetConfig::default())
    }
}

impl AssetManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AssetConfig) -> Self {
        Self {
            assets: Vec::new(),
            requires: Vec::new(),
            provides: BTreeSet::new(),
            suggests: BTreeMap::new(),
            state: ManagerState::Empty,
            config,
        }
    }

    /// Loaded assets in load order.
    pub fn assets(&self) -> &[Arc<Asset>] {
        &self.assets
    }

    /// Names still waiting for a provider.
    pub fn requires(&self) -> &[String] {
        &self.requires
    }

    pub fn provides(&self) -> &BTreeSet<String> {
        &self.provides
    }

    pub fn suggests(&self) -> &BTreeMap<String, Arc<Asset>> {
        &self.suggests
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    fn ensure_open(&self) -> Result<(), AssetError> {
        match self.state {
            ManagerState::Resolved => Err(AssetError::Sealed),
            ManagerState::Failed => Err(AssetError::Aborted),
            _ => Ok(()),
        }
    }

    /// Poison the manager when a resolution step fails.
    fn abort_on_err<T>(&mut self, result: Result<T, AssetError>) -> Result<T, AssetError> {
        if result.is_err() {
            self.state = ManagerState::Failed;
        }
        result
    }

    fn mark_loading(&mut self) {
        if self.state == ManagerState::Empty {
            self.state = ManagerState::Loading;
        }
    }

    /// Load an asset and update the requires, provides and suggests.
    /// Loading an asset twice is a no-op.
    pub fn load(&mut self, asset: Arc<Asset>) -> Result<(), AssetError> {
        self.ensure_open()?;
        if self.assets.iter().any(|a| Arc::ptr_eq(a, &asset) || **a == *asset) {
            return Ok(());
        }
        self.mark_loading();
        debug!("loading {}", asset);

        for label in asset.provides_set() {
            self.provides.insert(label.clone());
            self.requires.retain(|pending| pending != label);
            self.suggests.remove(label);
        }

        for label in asset.requires_list() {
            if !self.provides.contains(label) && !self.requires.contains(label) {
                self.requires.push(label.clone());
            }
        }

        for (label, suggested) in asset.suggests_map() {
            self.suggests.insert(label.clone(), suggested.clone());
        }

        self.assets.push(asset);
        Ok(())
    }

    /// Satisfy every pending name, preferring suggested assets over the
    /// registry. The manager is frozen afterwards, or unusable if any name
    /// could not be satisfied.
    pub fn resolve(&mut self, registry: &AssetRegistry) -> Result<(), AssetError> {
        self.ensure_open()?;
        self.state = ManagerState::Resolving;
        self.resolve_suggested()?;
        self.resolve_global(registry)?;
        self.state = ManagerState::Resolved;
        debug!("resolved {} assets", self.assets.len());
        Ok(())
    }

    /// Load suggested assets for pending names until no unvisited pending
    /// name has a suggestion. Each name is visited once.
    pub fn resolve_suggested(&mut self) -> Result<(), AssetError> {
        self.ensure_open()?;
        let result = self.load_suggested();
        self.abort_on_err(result)
    }

    fn load_suggested(&mut self) -> Result<(), AssetError> {
        let mut visited: HashSet<String> = HashSet::new();
        loop {
            let next = self
                .requires
                .iter()
                .find(|label| !visited.contains(label.as_str()))
                .cloned();
            let Some(label) = next else { break };
            if let Some(asset) = self.suggests.get(&label).cloned() {
                debug!("{label:?} satisfied by suggestion {}", asset.name());
                self.load(asset)?;
            }
            visited.insert(label);
        }
        Ok(())
    }

    /// Drain pending names in FIFO order through the registry, the last
    /// registration of each name winning.
    pub fn resolve_global(&mut self, registry: &AssetRegistry) -> Result<(), AssetError> {
        self.ensure_open()?;
        let result = self.load_global(registry);
        self.abort_on_err(result)
    }

    fn load_global(&mut self, registry: &AssetRegistry) -> Result<(), AssetError> {
        while !self.requires.is_empty() {
            let label = self.requires.remove(0);
            if self.provides.contains(&label) {
                continue;
            }
            let asset = registry.load(&label)?;
            if asset.is_bundle() {
                check_bundle(registry, &label, &asset)?;
            }
            self.load(asset)?;
        }
        Ok(())
    }

    /// Queue names not already pending and optionally resolve right away.
    pub fn require(
        &mut self,
        registry: &AssetRegistry,
        requirement: impl Into<Requirement>,
        resolve: bool,
    ) -> Result<(), AssetError> {
        self.enqueue(requirement.into())?;
        if resolve {
            self.resolve(registry)?;
        }
        Ok(())
    }

    fn enqueue(&mut self, requirement: Requirement) -> Result<(), AssetError> {
        self.ensure_open()?;
        self.mark_loading();
        for name in requirement.into_names() {
            if !self.requires.contains(&name) {
                self.requires.push(name);
            }
        }
        Ok(())
    }

    /// Require everything the component tree under `element` needs.
    pub fn require_from(
        &mut self,
        registry: &AssetRegistry,
        element: &Element,
        resolve: bool,
    ) -> Result<(), AssetError> {
        self.require(registry, require_deep(element), resolve)
    }

    /// Open a capture scope that collects requirements from components as
    /// they are built.
    pub fn capture(&mut self) -> Capture<'_> {
        Capture { manager: self }
    }

    /// Newline-joined fragments of every asset rendering into `context`,
    /// in load order. A manager whose resolution failed renders nothing.
    pub fn render(&self, context: RenderContext) -> Result<String, AssetError> {
        if self.state == ManagerState::Failed {
            return Err(AssetError::Aborted);
        }
        let static_url = self.config.static_url.as_str();
        let lines: Vec<String> = self
            .assets
            .iter()
            .filter_map(|asset| asset.render(context, static_url))
            .collect();
        Ok(lines.join("\n"))
    }

    pub fn render_css(&self) -> Result<String, AssetError> {
        self.render(RenderContext::Css)
    }

    pub fn render_js_head(&self) -> Result<String, AssetError> {
        self.render(RenderContext::JsHead)
    }

    pub fn render_js_foot(&self) -> Result<String, AssetError> {
        self.render(RenderContext::JsFoot)
    }

    pub fn render_js_on_load(&self) -> Result<String, AssetError> {
        self.render(RenderContext::JsOnLoad)
    }

    /// Fragment for the document `<head>`: stylesheets, then head scripts.
    pub fn render_head(&self) -> Result<String, AssetError> {
        Ok(join_non_empty([self.render_css()?, self.render_js_head()?]))
    }

    /// Fragment for the end of `<body>`: bottom scripts, then load callbacks.
    pub fn render_foot(&self) -> Result<String, AssetError> {
        Ok(join_non_empty([self.render_js_foot()?, self.render_js_on_load()?]))
    }
}

fn join_non_empty<const N: usize>(parts: [String; N]) -> String {
    parts
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A bundle chosen for `label` must be the only bundle claiming it, and each
/// of its members must load a concrete asset.
fn check_bundle(
    registry: &AssetRegistry,
    label: &str,
    bundle: &Asset,
) -> Result<(), AssetError> {
    let count = registry
        .possible_assets(label)?
        .iter()
        .filter(|a| a.is_bundle())
        .count();
    if count > 1 {
        return Err(AssetError::AmbiguousBundle {
            label: label.to_string(),
            count,
        });
    }
    for member in bundle.requires_list() {
        let asset = registry.load(member)?;
        if !asset.is_concrete() {
            return Err(AssetError::BundleMember {
                bundle: bundle.name().to_string(),
                member: member.clone(),
            });
        }
    }
    Ok(())
}

impl fmt::Display for AssetManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut data = Vec::new();
        if !self.assets.is_empty() {
            let names: Vec<&str> = self.assets.iter().map(|a| a.name()).collect();
            data.push(format!("[{}]", names.join(", ")));
        }
        if !self.requires.is_empty() {
            data.push(format!("requires=[{}]", quoted_list(&self.requires)));
        }
        if !self.provides.is_empty() {
            data.push(format!("provides={{{}}}", quoted_list(&self.provides)));
        }
        if !self.suggests.is_empty() {
            let items: Vec<String> = self
                .suggests
                .iter()
                .map(|(k, v)| format!("'{}': {}", k, v.name()))
                .collect();
            data.push(format!("suggests={{{}}}", items.join(", ")));
        }
        write!(f, "AssetManager({})", data.join(", "))
    }
}

/// Scope collecting component requirements into a manager.
///
/// The scope borrows the manager mutably, so a manager can only have one
/// capture open at a time.
pub struct Capture<'m> {
    manager: &'m mut AssetManager,
}

impl Capture<'_> {
    /// Record the requirements of a component tree.
    pub fn register(&mut self, element: &Element) -> Result<(), AssetError> {
        let names = require_deep(element);
        self.require(names)
    }

    pub fn require(&mut self, requirement: impl Into<Requirement>) -> Result<(), AssetError> {
        self.manager.enqueue(requirement.into())
    }

    /// Close the scope and resolve everything captured.
    pub fn finish(self, registry: &AssetRegistry) -> Result<(), AssetError> {
        self.manager.resolve(registry)
    }
}

/// Assets fulfilling `requirement`, in load order.
pub fn require_assets(
    registry: &AssetRegistry,
    requirement: impl Into<Requirement>,
) -> Result<Vec<Arc<Asset>>, AssetError> {
    let mut manager = AssetManager::new();
    manager.require(registry, requirement, true)?;
    Ok(manager.assets)
}

/// `(head, foot)` HTML fragments for `requirement`: the head part goes in
/// `<head>`, the foot part at the end of `<body>`.
pub fn require_to_html(
    registry: &AssetRegistry,
    requirement: impl Into<Requirement>,
    config: AssetConfig,
) -> Result<(String, String), AssetError> {
    let mut manager = AssetManager::with_config(config);
    manager.require(registry, requirement, true)?;
    Ok((manager.render_head()?, manager.render_foot()?))
}
