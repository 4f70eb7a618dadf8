//! Server functions callable from the browser.
//!
//! A function is registered under a name with one of four calling
//! conventions. Calls are executed synchronously and produce the fields of
//! the JSON response object.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use bricks_core::client::Client;
use bricks_core::html::escape;
use bricks_core::json::{encode, Tagged};
use log::{debug, warn};
use serde_json::{json, Map, Value};

/// Who is calling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcRequest {
    pub user: Option<String>,
    pub perms: BTreeSet<String>,
}

impl RpcRequest {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn has_perm(&self, perm: &str) -> bool {
        self.perms.contains(perm)
    }
}

/// Arguments of one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Call {
    pub args: Vec<Tagged>,
    pub kwargs: BTreeMap<String, Tagged>,
}

impl Call {
    /// Decode a `{"args": [..], "kwargs": {..}}` payload. Both keys are
    /// optional.
    pub fn from_payload(payload: Tagged) -> Result<Self, RpcError> {
        let Tagged::Object(mut fields) = payload else {
            return Err(RpcError::BadRequest("payload must be an object".into()));
        };
        let args = match fields.remove("args") {
            None | Some(Tagged::Null) => Vec::new(),
            Some(Tagged::List(items)) | Some(Tagged::Tuple(items)) => items,
            Some(_) => return Err(RpcError::BadRequest("args must be a list".into())),
        };
        let kwargs = match fields.remove("kwargs") {
            None | Some(Tagged::Null) => BTreeMap::new(),
            Some(Tagged::Object(map)) => map,
            Some(_) => return Err(RpcError::BadRequest("kwargs must be an object".into())),
        };
        Ok(Self { args, kwargs })
    }

    pub fn arg(&self, idx: usize) -> Option<&Tagged> {
        self.args.get(idx)
    }

    pub fn kwarg(&self, name: &str) -> Option<&Tagged> {
        self.kwargs.get(name)
    }

    /// Positional argument `idx` or keyword `name`, as a number.
    pub fn number(&self, idx: usize, name: &str) -> Result<f64, RpcError> {
        self.arg(idx)
            .or_else(|| self.kwarg(name))
            .and_then(Tagged::as_f64)
            .ok_or_else(|| RpcError::type_error(format!("{name} must be a number")))
    }

    /// Positional argument `idx` or keyword `name`, as a string.
    pub fn string(&self, idx: usize, name: &str) -> Result<&str, RpcError> {
        self.arg(idx)
            .or_else(|| self.kwarg(name))
            .and_then(Tagged::as_str)
            .ok_or_else(|| RpcError::type_error(format!("{name} must be a string")))
    }
}

/// Failures of an RPC call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RpcError {
    /// Raised by a server function. Sent back to the page as an error
    /// object named `kind`.
    #[error("{kind}: {message}")]
    Function { kind: String, message: String },

    #[error("{0}")]
    Permission(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("no server function named {0:?}")]
    NotFound(String),
}

impl RpcError {
    pub fn new(kind: &str, message: impl Into<String>) -> Self {
        RpcError::Function {
            kind: kind.to_string(),
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new("TypeError", message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new("ValueError", message)
    }

    pub fn permission(message: impl Into<String>) -> Self {
        RpcError::Permission(message.into())
    }

    fn kind(&self) -> &str {
        match self {
            RpcError::Function { kind, .. } => kind,
            RpcError::Permission(_) => "PermissionError",
            RpcError::BadRequest(_) => "BadRequest",
            RpcError::NotFound(_) => "NotFound",
        }
    }

    fn message(&self) -> String {
        match self {
            RpcError::Function { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type ApiFn = dyn Fn(&RpcRequest, Call) -> Result<Tagged, RpcError> + Send + Sync;
pub type ProgramFn =
    dyn Fn(&mut Client, &RpcRequest, Call) -> Result<Tagged, RpcError> + Send + Sync;

/// Calling convention of a server function.
#[derive(Clone)]
pub enum FunctionKind {
    /// Returns a value, sent as `result`.
    Api(Arc<ApiFn>),
    /// Drives a [`Client`]; the compiled actions are sent as `program`.
    Program(Arc<ProgramFn>),
    /// Returns markup, sent as `html_data`.
    Html(Arc<ApiFn>),
    /// Returns script source, sent as `js_data`.
    Js(Arc<ApiFn>),
}

impl FunctionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionKind::Api(_) => "api",
            FunctionKind::Program(_) => "program",
            FunctionKind::Html(_) => "html",
            FunctionKind::Js(_) => "js",
        }
    }
}

impl fmt::Debug for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionKind::{}", self.as_str())
    }
}

/// A named server function with its access rules.
#[derive(Debug, Clone)]
pub struct ServerFunction {
    name: String,
    kind: FunctionKind,
    login_required: bool,
    perms_required: Vec<String>,
}

impl ServerFunction {
    pub fn new(name: &str, kind: FunctionKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            login_required: false,
            perms_required: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FunctionKind {
        &self.kind
    }

    pub fn login_required(&mut self, required: bool) -> &mut Self {
        self.login_required = required;
        self
    }

    /// Permissions the caller must hold. Implies a logged in user.
    pub fn perms_required<I, S>(&mut self, perms: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.perms_required = perms.into_iter().map(Into::into).collect();
        self
    }

    pub fn check_credentials(&self, request: &RpcRequest) -> Result<(), RpcError> {
        let needs_login = self.login_required || !self.perms_required.is_empty();
        if needs_login && request.user.is_none() {
            return Err(RpcError::permission("login required"));
        }
        for perm in &self.perms_required {
            if !request.has_perm(perm) {
                return Err(RpcError::permission(format!(
                    "user does not have permission: {perm}"
                )));
            }
        }
        Ok(())
    }

    /// Run the function and build the response fields.
    ///
    /// Errors raised by the function are wrapped into the `error` field.
    /// Permission errors are returned instead so they can become a 403.
    pub fn execute(
        &self,
        request: &RpcRequest,
        call: Call,
        debug: bool,
    ) -> Result<Map<String, Value>, RpcError> {
        self.check_credentials(request)?;
        debug!("calling {} function {:?}", self.kind.as_str(), self.name);

        let mut out = Map::new();
        match &self.kind {
            FunctionKind::Api(f) => {
                let result = f(request, call);
                self.store(&mut out, "result", result, debug)?;
            }
            FunctionKind::Program(f) => {
                let mut client = Client::new();
                let result = f(&mut client, request, call);
                self.store(&mut out, "result", result, debug)?;
                if !client.is_empty() {
                    out.insert("program".into(), Value::String(client.compile()));
                }
            }
            FunctionKind::Html(f) => {
                let result = f(request, call);
                self.store(&mut out, "html_data", result, debug)?;
            }
            FunctionKind::Js(f) => {
                let result = f(request, call);
                self.store(&mut out, "js_data", result, debug)?;
            }
        }
        Ok(out)
    }

    fn store(
        &self,
        out: &mut Map<String, Value>,
        key: &str,
        result: Result<Tagged, RpcError>,
        debug: bool,
    ) -> Result<(), RpcError> {
        match result {
            Ok(Tagged::Null) => {}
            Ok(value) => {
                out.insert(key.to_string(), encode(&value));
            }
            Err(err @ RpcError::Permission(_)) => return Err(err),
            Err(err) => {
                warn!("server function {:?} failed: {}", self.name, err);
                out.insert("error".into(), wrap_error(&err, debug));
            }
        }
        Ok(())
    }
}

/// Error object sent to the page: `{"error": kind, "message": ..}`, plus an
/// escaped `<pre>` block with the error details in debug mode.
pub fn wrap_error(err: &RpcError, debug: bool) -> Value {
    let mut error = json!({
        "error": err.kind(),
        "message": err.message(),
    });
    if debug {
        if let Value::Object(obj) = &mut error {
            let detail = format!("{err:#?}\n{err}");
            obj.insert(
                "traceback".into(),
                Value::String(format!("<pre>{}</pre>", escape(&detail))),
            );
        }
    }
    error
}

/// Named server functions.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, ServerFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `function`, replacing any function with the same name.
    pub fn register(&mut self, function: ServerFunction) -> &mut ServerFunction {
        match self.functions.entry(function.name.clone()) {
            Entry::Occupied(mut entry) => {
                entry.insert(function);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(function),
        }
    }

    pub fn api<F>(&mut self, name: &str, f: F) -> &mut ServerFunction
    where
        F: Fn(&RpcRequest, Call) -> Result<Tagged, RpcError> + Send + Sync + 'static,
    {
        self.register(ServerFunction::new(name, FunctionKind::Api(Arc::new(f))))
    }

    pub fn program<F>(&mut self, name: &str, f: F) -> &mut ServerFunction
    where
        F: Fn(&mut Client, &RpcRequest, Call) -> Result<Tagged, RpcError>
            + Send
            + Sync
            + 'static,
    {
        self.register(ServerFunction::new(name, FunctionKind::Program(Arc::new(f))))
    }

    pub fn html<F>(&mut self, name: &str, f: F) -> &mut ServerFunction
    where
        F: Fn(&RpcRequest, Call) -> Result<Tagged, RpcError> + Send + Sync + 'static,
    {
        self.register(ServerFunction::new(name, FunctionKind::Html(Arc::new(f))))
    }

    pub fn js<F>(&mut self, name: &str, f: F) -> &mut ServerFunction
    where
        F: Fn(&RpcRequest, Call) -> Result<Tagged, RpcError> + Send + Sync + 'static,
    {
        self.register(ServerFunction::new(name, FunctionKind::Js(Arc::new(f))))
    }

    pub fn get(&self, name: &str) -> Option<&ServerFunction> {
        self.functions.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
