//! Component tree for building HTML.
//!
//! An [`Element`] owns its id, classes, attributes and children, plus the
//! list of asset names it needs on the page. Trees are built with the
//! constructors in [`tags`] and the chaining methods on `Element`, then
//! rendered to a string with [`Element::render`].

mod attrs;
pub mod parse;
pub mod tags;

pub use attrs::{check_html_safe_name, html_natural_attr, AttrValue, Attrs};

use crate::errors::HtmlError;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Ordered children of an element.
pub type Children = Vec<Node>;

/// A node in a component tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(Text),
}

impl Node {
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Element(el) => el.write_html(out),
            Node::Text(text) => out.push_str(&text.render()),
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Node::Element(el) => el.to_json(),
            Node::Text(text) => json!({ "tag": "text", "text": text.render() }),
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(Text::new(s))
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Text(Text::new(s))
    }
}

/// A text node. Escaped on render unless created with [`Text::raw`].
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    content: String,
    raw: bool,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            raw: false,
        }
    }

    /// Trusted markup, inserted verbatim.
    pub fn raw(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            raw: true,
        }
    }

    /// The text as given, before escaping.
    pub fn unescaped(&self) -> &str {
        &self.content
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    pub fn render(&self) -> String {
        if self.raw {
            self.content.clone()
        } else {
            escape(&self.content)
        }
    }
}

/// An HTML element with its asset requirements.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Attrs,
    pub children: Children,
    /// Asset names this element needs. Shared lists are only scanned once
    /// by [`crate::assets::require_deep`].
    pub requires: Arc<[String]>,
    void: bool,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            id: None,
            classes: Vec::new(),
            attrs: Attrs::new(),
            children: Vec::new(),
            requires: Arc::from(Vec::new()),
            void: tags::is_void(tag),
        }
    }

    /// Void elements (`<br>`, `<link>`, ...) have no closing tag.
    pub fn is_void(&self) -> bool {
        self.void
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Add whitespace separated classes.
    pub fn class(mut self, classes: &str) -> Self {
        self.classes
            .extend(classes.split_whitespace().map(String::from));
        self
    }

    pub fn classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes.extend(classes.into_iter().map(Into::into));
        self
    }

    pub fn add_class(&mut self, class: &str) {
        self.classes.push(class.to_string());
    }

    /// Set an attribute. `id` and `class` are routed to the element fields;
    /// unsafe names are logged and skipped, see [`Element::try_attr`].
    pub fn attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        if let Err(e) = self.set_attr(name, value) {
            log::warn!("<{}>: {}", self.tag, e);
        }
        self
    }

    pub fn try_attr(mut self, name: &str, value: impl Into<AttrValue>) -> Result<Self, HtmlError> {
        self.set_attr(name, value)?;
        Ok(self)
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<AttrValue>) -> Result<(), HtmlError> {
        let value = value.into();
        match html_natural_attr(name).as_str() {
            "id" => self.id = value.to_attr_string(),
            "class" => {
                let classes = value.to_attr_string().unwrap_or_default();
                self.classes
                    .extend(classes.split_whitespace().map(String::from));
            }
            _ => {
                self.attrs.insert(name, value)?;
            }
        }
        Ok(())
    }

    /// Look up an attribute, including the virtual `id` and `class` keys.
    pub fn get_attr(&self, name: &str) -> Option<String> {
        match name {
            "id" => self.id.clone(),
            "class" if !self.classes.is_empty() => Some(self.classes.join(" ")),
            "class" => None,
            _ => self.attrs.get(name).and_then(AttrValue::to_attr_string),
        }
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn text(self, text: &str) -> Self {
        self.child(Text::new(text))
    }

    pub fn requires<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires = names.into_iter().map(Into::into).collect::<Vec<_>>().into();
        self
    }

    /// Share an existing requirement list with this element.
    pub fn share_requires(mut self, requires: Arc<[String]>) -> Self {
        self.requires = requires;
        self
    }

    /// Child elements, skipping text nodes.
    pub fn roots(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Copy of the element tree. The id is dropped unless `keep_id` is set.
    pub fn copy(&self, keep_id: bool) -> Self {
        let mut new = self.clone();
        if !keep_id {
            new.id = None;
        }
        new
    }

    /// Visible text of this element and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out.trim().to_string()
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => {
                    let trimmed = text.unescaped().trim();
                    if !trimmed.is_empty() {
                        if !out.is_empty() && !out.ends_with(' ') {
                            out.push(' ');
                        }
                        out.push_str(trimmed);
                    }
                }
                Node::Element(el) => el.collect_text(out),
            }
        }
    }

    /// Rendered attribute list; `id` and `class` come first.
    pub fn render_attrs(&self) -> String {
        let mut parts = Vec::new();
        if let Some(id) = &self.id {
            parts.push(format!("id=\"{}\"", escape_attr(id)));
        }
        if !self.classes.is_empty() {
            parts.push(format!("class=\"{}\"", escape_attr(&self.classes.join(" "))));
        }
        let tail = self.attrs.render();
        if !tail.is_empty() {
            parts.push(tail);
        }
        parts.join(" ")
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        let attrs = self.render_attrs();
        out.push('<');
        out.push_str(&self.tag);
        if !attrs.is_empty() {
            out.push(' ');
            out.push_str(&attrs);
        }
        out.push('>');
        if self.void {
            return;
        }
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }

    /// JSON description: `{"tag", "classes"?, "id"?, "attrs"?, "children"?}`.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("tag".into(), Value::String(self.tag.clone()));
        if !self.classes.is_empty() {
            obj.insert("classes".into(), json!(self.classes));
        }
        if let Some(id) = &self.id {
            obj.insert("id".into(), Value::String(id.clone()));
        }
        if !self.attrs.is_empty() {
            let attrs: Map<String, Value> = self
                .attrs
                .iter()
                .map(|(k, v)| {
                    let value = match v {
                        AttrValue::Text(s) => Value::String(s.clone()),
                        AttrValue::Number(n) => json!(n),
                        AttrValue::Bool(b) => Value::Bool(*b),
                        AttrValue::Json(j) => j.clone(),
                    };
                    (k.to_string(), value)
                })
                .collect();
            obj.insert("attrs".into(), Value::Object(attrs));
        }
        if !self.children.is_empty() {
            let children = self.children.iter().map(Node::to_json).collect();
            obj.insert("children".into(), Value::Array(children));
        }
        Value::Object(obj)
    }
}

/// Escape text content.
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escape an attribute value for use inside double quotes.
pub fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;")
}
