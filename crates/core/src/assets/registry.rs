use super::asset::Asset;
use super::library;
use crate::errors::AssetError;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps every provided label to the assets that claimed it, in registration
/// order. Later registrations shadow earlier ones.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    entries: HashMap<String, Vec<Arc<Asset>>>,
}

impl AssetRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in CDN library.
    pub fn with_library() -> Self {
        let mut registry = Self::new();
        library::register_library(&mut registry);
        registry
    }

    /// Register `asset` under every label it provides.
    pub fn register(&mut self, asset: Asset) -> Arc<Asset> {
        let asset = Arc::new(asset);
        self.register_shared(asset.clone());
        asset
    }

    pub fn register_shared(&mut self, asset: Arc<Asset>) {
        for label in asset.provides_set() {
            self.entries
                .entry(label.clone())
                .or_default()
                .push(asset.clone());
        }
    }

    /// The most recently registered asset providing `label`.
    pub fn load(&self, label: &str) -> Result<Arc<Asset>, AssetError> {
        self.possible_assets(label)?
            .last()
            .cloned()
            .ok_or_else(|| AssetError::NotRegistered(label.to_string()))
    }

    /// Every asset registered under `label`, oldest first.
    pub fn possible_assets(&self, label: &str) -> Result<&[Arc<Asset>], AssetError> {
        match self.entries.get(label) {
            Some(list) if !list.is_empty() => Ok(list),
            _ => Err(AssetError::NotRegistered(label.to_string())),
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.get(label).is_some_and(|list| !list.is_empty())
    }

    /// Forget every asset registered under the given labels.
    pub fn clear<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for label in labels {
            self.entries.remove(label.as_ref());
        }
    }

    /// Registered labels, sorted.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self
            .entries
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(k, _)| k.as_str())
            .collect();
        labels.sort_unstable();
        labels
    }
}
