//! Parse markup back into a component tree.

use super::{AttrValue, Element, Node, Text};
use crate::errors::HtmlError;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::ParseOpts;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Parse an HTML document and return its `<html>` element.
pub fn parse_html(html: &str) -> Result<Element, HtmlError> {
    let document = parse_dom(html)?;
    let root = document
        .children
        .borrow()
        .iter()
        .find_map(|child| match convert_node(child) {
            Some(Node::Element(el)) if el.tag == "html" => Some(el),
            _ => None,
        });
    root.ok_or_else(|| HtmlError::Parse("document has no <html> element".into()))
}

/// Parse a fragment such as the output of `AssetManager::render_head`.
/// Returns the nodes the parser placed in `<head>` followed by those in
/// `<body>`.
pub fn parse_fragment(html: &str) -> Result<Vec<Node>, HtmlError> {
    let root = parse_html(html)?;
    let mut nodes = Vec::new();
    for section in root.children {
        if let Node::Element(el) = section {
            nodes.extend(el.children);
        }
    }
    Ok(nodes)
}

fn parse_dom(html: &str) -> Result<Handle, HtmlError> {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: true,
            ..Default::default()
        },
        ..Default::default()
    };

    let dom = parse_document(RcDom::default(), opts)
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| HtmlError::Parse(e.to_string()))?;

    Ok(dom.document)
}

fn convert_node(handle: &Handle) -> Option<Node> {
    match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let tag = name.local.to_string();
            let mut el = Element::new(&tag);
            for attr in attrs.borrow().iter() {
                let key = attr.name.local.to_string();
                let value = attr.value.to_string();
                match key.as_str() {
                    "id" => el.id = Some(value),
                    "class" => el.classes.extend(value.split_whitespace().map(String::from)),
                    _ => {
                        if let Err(e) = el.attrs.insert_verbatim(&key, AttrValue::Text(value)) {
                            log::debug!("dropping attribute on <{}>: {}", tag, e);
                        }
                    }
                }
            }

            // Script and style bodies are not markup
            let raw_text = tag == "script" || tag == "style";
            for child in handle.children.borrow().iter() {
                match convert_node(child) {
                    Some(Node::Text(text)) if raw_text => {
                        el.children.push(Node::Text(Text::raw(text.unescaped())));
                    }
                    Some(Node::Text(text)) if text.unescaped().trim().is_empty() => {}
                    Some(node) => el.children.push(node),
                    None => {}
                }
            }
            Some(Node::Element(el))
        }
        NodeData::Text { contents } => Some(Node::Text(Text::new(contents.borrow().to_string()))),
        // Comments, PIs, doctypes → ignored
        _ => None,
    }
}
