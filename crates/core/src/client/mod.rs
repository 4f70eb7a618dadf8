//! Builder for JavaScript programs sent back to the browser.
//!
//! Server functions receive a [`Client`] and record actions on it (calls,
//! raw source, errors, DOM updates). [`Client::compile`] turns the recorded
//! actions into a program the browser evaluates.

use crate::json::{dumps, Tagged};
use std::collections::BTreeMap;
use std::fmt;

/// Functions known not to return anything useful; calling them does not bind
/// a result variable.
const IMPURE_FUNCTIONS: &[&str] = &["alert", "console.log", "srvice.go"];

/// A JavaScript name or member path (`x`, `__v1.then`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsVar {
    name: String,
}

impl JsVar {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member access: `var.attr`.
    pub fn attr(&self, attr: &str) -> JsVar {
        JsVar::new(format!("{}.{}", self.name, attr))
    }
}

impl fmt::Display for JsVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl AsRef<str> for JsVar {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

/// A function literal, `function(x) {..}` or `function name(x) {..}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsFunction {
    name: Option<String>,
    args: Vec<String>,
    body: Vec<String>,
}

impl JsFunction {
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn source(&self) -> String {
        let args = self.args.join(",");
        let head = match &self.name {
            Some(name) => format!("function {name}({args})"),
            None => format!("function({args})"),
        };
        let body: String = self
            .body
            .iter()
            .map(|line| format!("    {};\n", line.trim().trim_end_matches(';')))
            .collect();
        format!("{head} {{\n{body}}}")
    }
}

/// An argument of a JavaScript call.
#[derive(Debug, Clone, PartialEq)]
pub enum JsArg {
    Literal(Tagged),
    Var(JsVar),
    Function(JsFunction),
}

impl JsArg {
    pub fn null() -> Self {
        JsArg::Literal(Tagged::Null)
    }

    pub fn source(&self) -> String {
        match self {
            JsArg::Literal(value) => js_source(value),
            JsArg::Var(var) => var.name.clone(),
            JsArg::Function(function) => function.source(),
        }
    }
}

macro_rules! literal_arg {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for JsArg {
                fn from(value: $ty) -> Self {
                    JsArg::Literal(value.into())
                }
            }
        )*
    };
}

literal_arg!(&str, String, bool, i32, i64, u64, f64, Tagged);

impl From<JsVar> for JsArg {
    fn from(var: JsVar) -> Self {
        JsArg::Var(var)
    }
}

impl From<&JsVar> for JsArg {
    fn from(var: &JsVar) -> Self {
        JsArg::Var(var.clone())
    }
}

impl From<JsFunction> for JsArg {
    fn from(function: JsFunction) -> Self {
        JsArg::Function(function)
    }
}

/// Built-in JavaScript error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsErrorKind {
    Error,
    EvalError,
    InternalError,
    RangeError,
    ReferenceError,
    SyntaxError,
    TypeError,
    URIError,
}

impl JsErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JsErrorKind::Error => "Error",
            JsErrorKind::EvalError => "EvalError",
            JsErrorKind::InternalError => "InternalError",
            JsErrorKind::RangeError => "RangeError",
            JsErrorKind::ReferenceError => "ReferenceError",
            JsErrorKind::SyntaxError => "SyntaxError",
            JsErrorKind::TypeError => "TypeError",
            JsErrorKind::URIError => "URIError",
        }
    }
}

impl fmt::Display for JsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What [`Client::dialog`] does with the dialog box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogAction {
    #[default]
    Open,
    Close,
    Toggle,
}

impl DialogAction {
    fn method(self) -> &'static str {
        match self {
            DialogAction::Open => "srvice.dialog",
            DialogAction::Close => "srvice.closeDialog",
            DialogAction::Toggle => "srvice.toggleDialog",
        }
    }
}

/// Options for [`Client::dialog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogOptions {
    pub action: DialogAction,
    /// Inner HTML for the container element.
    pub html: Option<String>,
    /// Id of the dialog element.
    pub dialog: String,
    /// Id of the child element receiving `html`; the dialog itself if unset.
    pub container: Option<String>,
    /// Id of an element whose HTML is copied into the dialog.
    pub source: Option<String>,
}

impl Default for DialogOptions {
    fn default() -> Self {
        Self {
            action: DialogAction::Open,
            html: None,
            dialog: "dialog".to_string(),
            container: None,
            source: None,
        }
    }
}

impl DialogOptions {
    pub fn with_html(html: &str) -> Self {
        Self {
            html: Some(html.to_string()),
            ..Self::default()
        }
    }
}

/// Records client-side actions for one RPC call.
#[derive(Debug, Clone, Default)]
pub struct Client {
    actions: Vec<String>,
    var_index: usize,
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Recorded statements, in order.
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    /// A fresh generic variable name, `__v1`, `__v2`, ...
    fn next_var_name(&mut self) -> String {
        self.var_index += 1;
        format!("__v{}", self.var_index)
    }

    /// Call `function` with positional arguments.
    ///
    /// Returns the variable holding the result, or `None` for functions
    /// known to return nothing.
    pub fn call<I>(&mut self, function: impl AsRef<str>, args: I) -> Option<JsVar>
    where
        I: IntoIterator,
        I::Item: Into<JsArg>,
    {
        self.call_with(function, args, BTreeMap::new())
    }

    /// Like [`Client::call`], with keyword arguments passed as a trailing
    /// object literal.
    pub fn call_with<I>(
        &mut self,
        function: impl AsRef<str>,
        args: I,
        kwargs: BTreeMap<String, Tagged>,
    ) -> Option<JsVar>
    where
        I: IntoIterator,
        I::Item: Into<JsArg>,
    {
        let function = function.as_ref();
        let mut args: Vec<String> = args.into_iter().map(|a| a.into().source()).collect();
        if !kwargs.is_empty() {
            args.push(js_source(&Tagged::Object(kwargs)));
        }
        let call = format!("{}({});", function, args.join(", "));

        if IMPURE_FUNCTIONS.contains(&function) {
            self.actions.push(call);
            return None;
        }
        let var = self.next_var_name();
        self.actions.push(format!("var {var} = {call}"));
        Some(JsVar::new(var))
    }

    /// Append raw JavaScript source.
    pub fn js(&mut self, source: &str) {
        self.actions.push(source.to_string());
    }

    /// Throw an error in the browser once the program reaches this point.
    pub fn error(&mut self, kind: JsErrorKind, message: &str) {
        self.actions
            .push(format!("throw {}({});", kind, js_string(message)));
    }

    /// Replace the inner HTML of the elements matching `selector`, or of the
    /// element that triggered the call.
    pub fn html(&mut self, source: &str, selector: Option<&str>) -> Option<JsVar> {
        let target = match selector {
            Some(selector) => JsArg::from(selector),
            None => JsArg::Var(JsVar::new("this")),
        };
        let selection = self.call("jQuery", [target])?;
        self.call(selection.attr("html"), [source])
    }

    /// Navigate to `url`. With `as_link` the navigation behaves like a click
    /// on a link; otherwise a new request is made.
    pub fn redirect(&mut self, url: &str, as_link: bool) {
        self.call("srvice.go", [JsArg::from(url), JsArg::from(as_link)]);
    }

    pub fn dialog(&mut self, options: DialogOptions) -> Option<JsVar> {
        let mut kwargs = BTreeMap::new();
        if let Some(html) = options.html {
            kwargs.insert("html".to_string(), Tagged::String(html));
        }
        if options.dialog != "dialog" {
            kwargs.insert("dialogId".to_string(), Tagged::String(options.dialog));
        }
        if let Some(container) = options.container {
            kwargs.insert("dialogContentId".to_string(), Tagged::String(container));
        }
        if let Some(source) = options.source {
            kwargs.insert("sourceId".to_string(), Tagged::String(source));
        }
        self.call_with(options.action.method(), Vec::<JsArg>::new(), kwargs)
    }

    /// Anonymous function literal with the given argument names and body
    /// statements. Name it with [`JsFunction::named`].
    pub fn function<A, B>(&self, args: A, body: B) -> JsFunction
    where
        A: IntoIterator,
        A::Item: Into<String>,
        B: IntoIterator,
        B::Item: Into<String>,
    {
        JsFunction {
            name: None,
            args: args.into_iter().map(Into::into).collect(),
            body: body.into_iter().map(Into::into).collect(),
        }
    }

    /// The recorded actions as one program.
    pub fn compile(&self) -> String {
        self.actions
            .iter()
            .filter(|line| !line.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// JavaScript literal for `value`.
///
/// Values plain JavaScript cannot express are passed through
/// `srvice.json.decode` in their tagged JSON form.
pub fn js_source(value: &Tagged) -> String {
    match value {
        Tagged::Null => "null".to_string(),
        Tagged::Bool(b) => b.to_string(),
        Tagged::Number(n) => n.to_string(),
        Tagged::String(s) => js_string(s),
        Tagged::List(items) | Tagged::Tuple(items) => {
            let items: Vec<String> = items.iter().map(js_source).collect();
            format!("[{}]", items.join(", "))
        }
        Tagged::Object(map) if value.type_name().is_none() => {
            let mut items: Vec<String> = map
                .iter()
                .map(|(k, v)| {
                    let key = if is_var_name(k) { k.clone() } else { js_string(k) };
                    format!("{}: {}", key, js_source(v))
                })
                .collect();
            items.sort();
            format!("{{{}}}", items.join(", "))
        }
        other => format!("srvice.json.decode({})", dumps(other)),
    }
}

/// Single quoted string literal.
fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// True for plain identifiers usable as bare object keys.
pub fn is_var_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
