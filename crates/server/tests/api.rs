//! Integration tests for the bricks RPC bridge.

use std::sync::Arc;

use axum_test::TestServer;
use bricks_core::assets::{Asset, AssetRegistry};
use bricks_core::json::Tagged;
use bricks_server::{build_router, AppState, FunctionRegistry, RpcError, ServerConfig};
use http::{HeaderName, HeaderValue, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn functions() -> FunctionRegistry {
    let mut functions = FunctionRegistry::new();
    functions.api("add", |_, call| {
        Ok(Tagged::from(call.number(0, "a")? + call.number(1, "b")?))
    });
    functions.api("echo", |_, call| Ok(Tagged::List(call.args)));
    functions.api("fail", |_, _| Err(RpcError::value_error("bad value")));
    functions
        .api("secret", |request, _| {
            Ok(Tagged::from(request.user.clone().unwrap_or_default()))
        })
        .perms_required(["admin"]);
    functions
        .api("whoami", |request, _| Ok(Tagged::from(request.user.clone())))
        .login_required(true);
    functions.program("greet", |client, _, call| {
        let name = call.string(0, "name")?;
        client.call("alert", [format!("hello {name}")]);
        Ok(Tagged::Null)
    });
    functions.html("fragment", |_, _| Ok(Tagged::from("<p>fragment</p>")));
    functions.js("script", |_, _| Ok(Tagged::from("console.log(1);")));
    functions
}

fn test_server_with(config: ServerConfig) -> TestServer {
    let mut assets = AssetRegistry::new();
    assets.register(Asset::css("site.css", "/site.css"));
    assets.register(Asset::bottom_script("app.js", "/app.js").requires(["site.css"]));
    let state = Arc::new(AppState::with_registries(config, functions(), assets));
    TestServer::new(build_router(state)).unwrap()
}

fn test_server() -> TestServer {
    test_server_with(ServerConfig::default())
}

fn header(name: &'static str, value: &'static str) -> (HeaderName, HeaderValue) {
    (HeaderName::from_static(name), HeaderValue::from_static(value))
}

#[tokio::test]
async fn health_returns_ok() {
    let server = test_server();
    let res = server.get("/health").await;
    res.assert_status_ok();
    res.assert_text("ok");
}

#[tokio::test]
async fn api_call_returns_result() {
    let server = test_server();
    let res = server
        .post("/rpc/add")
        .json(&json!({ "args": [1, 2] }))
        .await;
    res.assert_status_ok();
    assert_eq!(res.json::<Value>(), json!({ "result": 3.0 }));
    assert!(res.headers().contains_key("x-bricks-request"));
}

#[tokio::test]
async fn kwargs_are_passed() {
    let server = test_server();
    let res = server
        .post("/rpc/add")
        .json(&json!({ "args": [1], "kwargs": { "b": 4 } }))
        .await;
    assert_eq!(res.json::<Value>(), json!({ "result": 5.0 }));
}

#[tokio::test]
async fn tagged_arguments_round_trip() {
    let server = test_server();
    let payload = json!({ "args": [{ "@": "set", "data": [1, 2] }] });
    let res = server.post("/rpc/echo").json(&payload).await;
    assert_eq!(
        res.json::<Value>(),
        json!({ "result": [{ "@": "set", "data": [1, 2] }] })
    );
}

#[tokio::test]
async fn function_errors_are_wrapped() {
    let server = test_server();
    let res = server.post("/rpc/fail").json(&json!({})).await;
    res.assert_status_ok();
    assert_eq!(
        res.json::<Value>(),
        json!({ "error": { "error": "ValueError", "message": "bad value" } })
    );
}

#[tokio::test]
async fn debug_mode_adds_details() {
    let server = test_server_with(ServerConfig {
        debug: true,
        ..Default::default()
    });
    let res = server.post("/rpc/fail").json(&json!({})).await;
    let body = res.json::<Value>();
    let traceback = body["error"]["traceback"].as_str().unwrap();
    assert!(traceback.starts_with("<pre>"));
    assert!(traceback.contains("bad value"));
}

#[tokio::test]
async fn bad_arguments_are_wrapped_type_errors() {
    let server = test_server();
    let res = server
        .post("/rpc/add")
        .json(&json!({ "args": ["x", 2] }))
        .await;
    assert_eq!(res.json::<Value>()["error"]["error"], json!("TypeError"));
}

#[tokio::test]
async fn program_returns_compiled_client() {
    let server = test_server();
    let res = server
        .post("/rpc/greet")
        .json(&json!({ "args": ["world"] }))
        .await;
    res.assert_status_ok();
    assert_eq!(
        res.json::<Value>(),
        json!({ "program": "alert('hello world');" })
    );
}

#[tokio::test]
async fn html_and_js_functions_use_data_keys() {
    let server = test_server();
    let res = server.post("/rpc/fragment").json(&json!({})).await;
    assert_eq!(res.json::<Value>(), json!({ "html_data": "<p>fragment</p>" }));

    let res = server.post("/rpc/script").json(&json!({})).await;
    assert_eq!(res.json::<Value>(), json!({ "js_data": "console.log(1);" }));
}

#[tokio::test]
async fn empty_body_means_no_arguments() {
    let server = test_server();
    let res = server.post("/rpc/fragment").await;
    res.assert_status_ok();
}

#[tokio::test]
async fn undecodable_body_returns_400() {
    let server = test_server();
    let res = server.post("/rpc/add").text("{not json").await;
    res.assert_status(StatusCode::BAD_REQUEST);

    let res = server
        .post("/rpc/add")
        .json(&json!({ "@": "mod.FooBar" }))
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);

    let res = server.post("/rpc/add").json(&json!([1, 2])).await;
    res.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_function_returns_404() {
    let server = test_server();
    let res = server.post("/rpc/missing").json(&json!({})).await;
    res.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_is_forbidden() {
    let server = test_server();
    let res = server.get("/rpc/add").await;
    res.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn login_required_returns_403() {
    let server = test_server();
    let res = server.post("/rpc/whoami").json(&json!({})).await;
    res.assert_status(StatusCode::FORBIDDEN);

    let (name, value) = header("x-bricks-user", "alice");
    let res = server
        .post("/rpc/whoami")
        .add_header(name, value)
        .json(&json!({}))
        .await;
    res.assert_status_ok();
    assert_eq!(res.json::<Value>(), json!({ "result": "alice" }));
}

#[tokio::test]
async fn missing_permission_returns_403() {
    let server = test_server();
    let (user, alice) = header("x-bricks-user", "alice");
    let res = server
        .post("/rpc/secret")
        .add_header(user, alice)
        .json(&json!({}))
        .await;
    res.assert_status(StatusCode::FORBIDDEN);

    let (user, alice) = header("x-bricks-user", "alice");
    let (perms, admin) = header("x-bricks-perms", "staff, admin");
    let res = server
        .post("/rpc/secret")
        .add_header(user, alice)
        .add_header(perms, admin)
        .json(&json!({}))
        .await;
    res.assert_status_ok();
}

#[tokio::test]
async fn assets_endpoint_renders_fragments() {
    let server = test_server();
    let res = server.get("/assets").add_query_param("require", "app.js").await;
    res.assert_status_ok();
    assert_eq!(
        res.json::<Value>(),
        json!({
            "head": "<link href=\"/site.css\" rel=\"stylesheet\" type=\"text/css\">",
            "foot": "<script src=\"/app.js\"></script>",
        })
    );
}

#[tokio::test]
async fn assets_endpoint_rejects_unknown_names() {
    let server = test_server();
    let res = server
        .get("/assets")
        .add_query_param("require", "nope.js")
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);
}
