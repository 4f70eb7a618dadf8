use crate::errors::HtmlError;
use serde_json::Value;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    /// `true` renders the bare name, `false` drops the attribute.
    Bool(bool),
    /// Rendered as escaped JSON text (read by client-side frameworks).
    Json(Value),
}

impl AttrValue {
    /// The value as it appears between the quotes, or `None` for boolean
    /// attributes.
    pub fn to_attr_string(&self) -> Option<String> {
        match self {
            AttrValue::Text(s) => Some(s.clone()),
            AttrValue::Number(n) => Some(format_number(*n)),
            AttrValue::Bool(_) => None,
            AttrValue::Json(v) => Some(v.to_string()),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<&String> for AttrValue {
    fn from(s: &String) -> Self {
        AttrValue::Text(s.clone())
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<i32> for AttrValue {
    fn from(n: i32) -> Self {
        AttrValue::Number(n as f64)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        AttrValue::Number(n as f64)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

impl From<Value> for AttrValue {
    fn from(v: Value) -> Self {
        AttrValue::Json(v)
    }
}

/// Ordered attribute mapping of an element.
///
/// `id` and `class` live on the element itself and cannot be stored here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attrs {
    entries: Vec<(String, AttrValue)>,
}

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Insert or replace an attribute. Keyword-style names are converted to
    /// their natural HTML spelling first (`data_value` -> `data-value`).
    pub fn insert(
        &mut self,
        key: &str,
        value: impl Into<AttrValue>,
    ) -> Result<Option<AttrValue>, HtmlError> {
        self.insert_verbatim(&html_natural_attr(key), value.into())
    }

    /// Insert without renaming, as read from parsed markup.
    pub(crate) fn insert_verbatim(
        &mut self,
        key: &str,
        value: AttrValue,
    ) -> Result<Option<AttrValue>, HtmlError> {
        let key = check_html_safe_name(key)?;
        check_not_reserved(&key)?;
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Ok(Some(std::mem::replace(&mut slot.1, value)));
        }
        self.entries.push((key, value));
        Ok(None)
    }

    pub fn remove(&mut self, key: &str) -> Result<Option<AttrValue>, HtmlError> {
        match self.entries.iter().position(|(k, _)| k == key) {
            Some(idx) => Ok(Some(self.entries.remove(idx).1)),
            None => {
                check_not_reserved(key)?;
                Ok(None)
            }
        }
    }

    /// Render as `k="v" k2` (no leading space).
    pub fn render(&self) -> String {
        let mut parts = Vec::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            match value {
                AttrValue::Bool(false) => {}
                AttrValue::Bool(true) => parts.push(key.clone()),
                other => {
                    let text = other.to_attr_string().unwrap_or_default();
                    parts.push(format!("{}=\"{}\"", key, super::escape_attr(&text)));
                }
            }
        }
        parts.join(" ")
    }
}

fn check_not_reserved(key: &str) -> Result<(), HtmlError> {
    if key == "id" || key == "class" {
        return Err(HtmlError::ReservedAttr(key.to_string()));
    }
    Ok(())
}

/// Convert a keyword-style name into a natural HTML attribute or tag name:
/// trailing underscores are dropped and the remaining ones become dashes.
pub fn html_natural_attr(name: &str) -> String {
    name.trim_end_matches('_').replace('_', "-")
}

/// Reject names containing whitespace, quotes, `=`, `<`, `>` or `&`.
pub fn check_html_safe_name(name: &str) -> Result<String, HtmlError> {
    let unsafe_char = |c: char| c.is_whitespace() || matches!(c, '=' | '<' | '>' | '&' | '"' | '\'');
    if name.is_empty() || name.chars().any(unsafe_char) {
        return Err(HtmlError::InvalidAttrName(name.to_string()));
    }
    Ok(name.to_string())
}
