use std::env;
use std::net::SocketAddr;

use mock_server::{AppState, ServerConfig, build_router};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let config = ServerConfig::from_env(|name| env::var(name).ok());
    init_tracing(config.log_json);

    let app = build_router(AppState::from_config(&config));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("bind {addr} failed: {e}"))?;
    info!(
        %addr,
        root = %config.static_root.display(),
        ledger = %config.ledger_path.display(),
        sync_log = %config.sync_log_path.display(),
        "mock server listening on http://localhost:{}",
        config.port
    );
    axum::serve(listener, app)
        .await
        .map_err(|e| format!("server failed: {e}"))
}
