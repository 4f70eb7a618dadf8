//! HTML5 tag constructors.

use super::{Element, Text};

/// https://www.w3.org/TR/html5/syntax.html#void-elements
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Element for an arbitrary tag name.
pub fn tag(name: &str) -> Element {
    Element::new(name)
}

/// Trusted markup inserted without escaping.
pub fn raw(source: &str) -> Text {
    Text::raw(source)
}

macro_rules! html_tags {
    ($($(#[$doc:meta])* $name:ident => $tag:literal),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name() -> Element {
                Element::new($tag)
            }
        )*
    };
}

html_tags! {
    /// The root of an HTML document
    html => "html",
    body => "body",
    head => "head",
    meta => "meta",
    /// Relationship with an external resource
    link => "link",
    title => "title",
    script => "script",
    style => "style",
    div => "div",
    span => "span",
    p => "p",
    a => "a",
    h1 => "h1",
    h2 => "h2",
    h3 => "h3",
    h4 => "h4",
    h5 => "h5",
    h6 => "h6",
    ul => "ul",
    ol => "ol",
    li => "li",
    button => "button",
    form => "form",
    input => "input",
    label => "label",
    img => "img",
    br => "br",
    hr => "hr",
    section => "section",
    article => "article",
    header => "header",
    footer => "footer",
    main => "main",
    nav => "nav",
    pre => "pre",
    code => "code",
    table => "table",
    tr => "tr",
    td => "td",
    th => "th",
}
