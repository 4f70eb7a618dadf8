//! HTTP bridge between pages and server functions.
//!
//! `POST /rpc/{name}` runs a registered [`ServerFunction`] with tagged JSON
//! arguments and answers with its result, client program or error.
//! `GET /assets` renders asset fragments from the shared registry.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bricks_core::assets::{require_to_html, AssetConfig, AssetRegistry};
use bricks_core::json;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

mod functions;

pub use functions::{
    wrap_error, ApiFn, Call, FunctionKind, FunctionRegistry, ProgramFn, RpcError, RpcRequest,
    ServerFunction,
};

const USER_HEADER: &str = "X-Bricks-User";
const PERMS_HEADER: &str = "X-Bricks-Perms";
const REQUEST_ID_HEADER: &str = "X-Bricks-Request";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Attach error details to wrapped function errors.
    pub debug: bool,
    /// Prefix for static asset paths.
    pub static_url: String,
    /// Allow cross-origin requests.
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3847,
            debug: false,
            static_url: "static/".to_string(),
            cors: false,
        }
    }
}

/// Shared server state.
pub struct AppState {
    functions: FunctionRegistry,
    assets: AssetRegistry,
    config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_registries(config, FunctionRegistry::new(), AssetRegistry::with_library())
    }

    pub fn with_registries(
        config: ServerConfig,
        functions: FunctionRegistry,
        assets: AssetRegistry,
    ) -> Self {
        Self {
            functions,
            assets,
            config,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    fn asset_config(&self) -> AssetConfig {
        AssetConfig {
            static_url: self.config.static_url.clone(),
        }
    }
}

/// Caller identity from the `X-Bricks-User` and `X-Bricks-Perms` headers.
fn request_from_headers(headers: &HeaderMap) -> RpcRequest {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let user = header(USER_HEADER)
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(String::from);
    let perms: BTreeSet<String> = header(PERMS_HEADER)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect();
    RpcRequest { user, perms }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct AssetsResponse {
    head: String,
    foot: String,
}

#[derive(Debug, Deserialize)]
pub struct AssetsQuery {
    /// Comma separated asset names.
    pub require: String,
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = match &self {
            RpcError::Permission(_) => StatusCode::FORBIDDEN,
            RpcError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RpcError::NotFound(_) => StatusCode::NOT_FOUND,
            RpcError::Function { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Tag a response with the id used in the server log for this call.
fn with_request_id(request_id: &str, response: Response) -> Response {
    let mut headers = HeaderMap::new();
    if let Ok(val) = HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, val);
    }
    (headers, response).into_response()
}

// ---------------------------------------------------------------------------
// Blocking helper
// ---------------------------------------------------------------------------

/// Run a closure on a blocking thread and return its response.
///
/// Server functions are plain synchronous closures and may block, so they
/// never run on the async worker threads.
async fn run_blocking<F>(f: F) -> Response
where
    F: FnOnce() -> Response + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(response) => response,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = state.config.cors;
    let router = Router::new()
        .route("/health", get(health))
        .route("/rpc/{name}", get(rpc_get).post(rpc_call))
        .route("/assets", get(assets))
        .with_state(state);
    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> &'static str {
    "ok"
}

/// GET /rpc/{name}
async fn rpc_get(Path(name): Path<String>) -> impl IntoResponse {
    debug!("rejected GET for server function {name:?}");
    (
        StatusCode::FORBIDDEN,
        "this api-point does not allow GET AJAX requests.",
    )
}

/// POST /rpc/{name}  { args?, kwargs? }
async fn rpc_call(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let request = request_from_headers(&headers);

    let id = request_id.clone();
    let response = run_blocking(move || {
        let result = dispatch(&state, &name, &request, &body);
        match result {
            Ok(out) => {
                info!("[{id}] {name} ok");
                (StatusCode::OK, Json(out)).into_response()
            }
            Err(err) => {
                info!("[{id}] {name} rejected: {err}");
                err.into_response()
            }
        }
    })
    .await;
    with_request_id(&request_id, response)
}

fn dispatch(
    state: &AppState,
    name: &str,
    request: &RpcRequest,
    body: &[u8],
) -> Result<serde_json::Map<String, serde_json::Value>, RpcError> {
    let function = state
        .functions
        .get(name)
        .ok_or_else(|| RpcError::NotFound(name.to_string()))?;
    // Credentials are checked before the body is looked at
    function.check_credentials(request)?;

    let text = std::str::from_utf8(body).map_err(|e| RpcError::BadRequest(e.to_string()))?;
    let payload = if text.trim().is_empty() {
        json::Tagged::Object(Default::default())
    } else {
        json::loads(text).map_err(|e| RpcError::BadRequest(e.to_string()))?
    };
    let call = Call::from_payload(payload)?;
    function.execute(request, call, state.config.debug)
}

/// GET /assets?require=a,b
async fn assets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AssetsQuery>,
) -> Response {
    let names: Vec<String> = query
        .require
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    match require_to_html(&state.assets, names, state.asset_config()) {
        Ok((head, foot)) => Json(AssetsResponse { head, foot }).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}
