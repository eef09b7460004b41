#![forbid(unsafe_code)]

//! Development stand-in for the patrol backend: serves the ledger, accepts sync
//! payloads into a JSON log file, and serves static files from a root directory.

mod config;
mod error;
mod handlers;
mod static_files;
mod sync_log;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{Next, from_fn};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tracing::debug;

pub use config::{DEFAULT_PORT, ServerConfig};
pub use error::{FileError, ServerError};
pub use sync_log::SyncLog;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    ledger_path: Arc<PathBuf>,
    static_root: Arc<PathBuf>,
    sync_log: Arc<SyncLog>,
}

impl AppState {
    #[must_use]
    pub fn new(
        ledger_path: impl Into<PathBuf>,
        sync_log_path: impl Into<PathBuf>,
        static_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ledger_path: Arc::new(ledger_path.into()),
            static_root: Arc::new(static_root.into()),
            sync_log: Arc::new(SyncLog::new(sync_log_path)),
        }
    }

    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.ledger_path.clone(),
            config.sync_log_path.clone(),
            config.static_root.clone(),
        )
    }

    #[must_use]
    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }

    #[must_use]
    pub fn static_root(&self) -> &Path {
        &self.static_root
    }

    #[must_use]
    pub fn sync_log(&self) -> &SyncLog {
        &self.sync_log
    }
}

async fn cors_middleware(req: Request, next: Next) -> Response {
    let mut resp = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };
    let headers = resp.headers_mut();
    headers.insert(
        "access-control-allow-origin",
        HeaderValue::from_static("*"),
    );
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,HEAD,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type"),
    );
    resp
}

async fn trace_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let resp = next.run(req).await;
    debug!(%method, path = %path, status = resp.status().as_u16(), "request");
    resp
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz_handler))
        .route("/api/ledger", get(handlers::ledger_handler))
        .route("/api/sync-log", get(handlers::sync_log_handler))
        .route("/api/sync", post(handlers::sync_handler))
        .fallback(static_files::static_handler)
        .layer(from_fn(cors_middleware))
        .layer(from_fn(trace_middleware))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
