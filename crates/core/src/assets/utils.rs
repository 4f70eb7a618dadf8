use crate::errors::AssetError;
use crate::html::Element;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Gather the requirements of `root` and every element below it.
///
/// The tree is walked breadth-first. Requirement lists shared between
/// elements are scanned once and each name appears once, in discovery
/// order, starting with the root's own list.
pub fn require_deep(root: &Element) -> Vec<String> {
    let mut visited: HashSet<*const String> = HashSet::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut names = Vec::new();

    for label in root.requires.iter() {
        if seen.insert(label.as_str()) {
            names.push(label.clone());
        }
    }

    let mut queue: VecDeque<&Element> = root.roots().collect();
    while let Some(el) = queue.pop_front() {
        let list = &el.requires;
        if visited.insert(list.as_ptr()) {
            for label in list.iter() {
                if seen.insert(label.as_str()) {
                    names.push(label.clone());
                }
            }
        }
        queue.extend(el.roots());
    }

    names
}

/// Extension of the path part of `href`, including the dot (`".css"`).
fn extension(href: &str) -> String {
    let path = match Url::parse(href) {
        Ok(url) => url.path().to_string(),
        Err(_) => href
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    let file = path.rsplit('/').next().unwrap_or_default();
    match file.rfind('.') {
        // A leading dot is a hidden file, not an extension
        Some(idx) if idx > 0 => file[idx..].to_string(),
        _ => String::new(),
    }
}

/// Default `rel` for a linked resource.
pub fn rel_from_href(href: &str) -> Result<String, AssetError> {
    let ext = extension(href);
    match ext.as_str() {
        ".css" => Ok("stylesheet".to_string()),
        _ => Err(AssetError::UnknownRel(ext)),
    }
}

/// Default MIME type for a linked resource.
pub fn type_from_href(href: &str) -> String {
    let ext = extension(href);
    match ext.as_str() {
        ".css" => "text/css".to_string(),
        ".txt" => "text".to_string(),
        _ => format!("text/{}", ext.trim_start_matches('.')),
    }
}
