use std::sync::Arc;

use bricks_server::{build_router, AppState, ServerConfig};
use env_logger::{Builder, Env};
use log::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut config = ServerConfig::default();
    if let Ok(port) = std::env::var("BRICKS_PORT") {
        config.port = port.parse()?;
    }
    config.debug = std::env::var("BRICKS_DEBUG").is_ok_and(|v| v == "1" || v == "true");
    if let Ok(static_url) = std::env::var("BRICKS_STATIC_URL") {
        config.static_url = static_url;
    }

    let port = config.port;
    let state = Arc::new(AppState::new(config));
    let app = build_router(state);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async move {
            let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
            info!("bricks server listening on http://localhost:{port}");
            axum::serve(listener, app).await?;
            Ok::<(), Box<dyn std::error::Error>>(())
        })?;

    Ok(())
}
