use std::path::{Path, PathBuf};

use axum::extract::State;
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::AppState;

/// Relative file path for a request path, or `None` if it tries to leave the root.
fn safe_relative_path(request_path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for segment in request_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s if s.contains('\\') || s.contains('\0') || s.contains(':') => return None,
            s => relative.push(s),
        }
    }
    Some(relative)
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("webmanifest") => "application/manifest+json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

/// Serves files under the static root for any unrouted GET/HEAD; directories
/// resolve to their `index.html`.
pub(crate) async fn static_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return not_found();
    }
    let Some(relative) = safe_relative_path(uri.path()) else {
        debug!(path = uri.path(), "rejected static path");
        return not_found();
    };

    let mut path = state.static_root().join(relative);
    if tokio::fs::metadata(&path)
        .await
        .is_ok_and(|meta| meta.is_dir())
    {
        path.push("index.html");
    }

    match tokio::fs::read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type_for(&path))], bytes).into_response(),
        Err(_) => not_found(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_is_rejected() {
        assert_eq!(safe_relative_path("/../secret"), None);
        assert_eq!(safe_relative_path("/data/../../etc/passwd"), None);
        assert_eq!(safe_relative_path("/..\\windows"), None);
    }

    #[test]
    fn plain_paths_resolve_under_root() {
        assert_eq!(
            safe_relative_path("/data/ledger.json"),
            Some(PathBuf::from("data/ledger.json"))
        );
        assert_eq!(safe_relative_path("/"), Some(PathBuf::new()));
        assert_eq!(
            safe_relative_path("//assets/./app.js"),
            Some(PathBuf::from("assets/app.js"))
        );
    }

    #[test]
    fn content_types_by_extension() {
        assert_eq!(
            content_type_for(Path::new("index.html")),
            "text/html; charset=utf-8"
        );
        assert_eq!(content_type_for(Path::new("data/ledger.json")), "application/json");
        assert_eq!(content_type_for(Path::new("blob")), "application/octet-stream");
    }
}
