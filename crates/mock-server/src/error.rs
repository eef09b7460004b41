use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Reading or writing one of the JSON files the server works from.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("sync log is not a JSON array")]
    NotAnArray,
}

impl FileError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, FileError::Io(err) if err.kind() == std::io::ErrorKind::NotFound)
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServerError {
    #[error("sessions array is required")]
    MissingSessions,
    #[error("Failed to load ledger")]
    LoadLedger(#[source] FileError),
    #[error("Failed to load sync log")]
    LoadSyncLog(#[source] FileError),
    #[error("Failed to persist sync payload")]
    PersistSync(#[source] FileError),
}

impl ServerError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::MissingSessions => StatusCode::BAD_REQUEST,
            ServerError::LoadLedger(_)
            | ServerError::LoadSyncLog(_)
            | ServerError::PersistSync(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            let source = std::error::Error::source(&self)
                .map(ToString::to_string)
                .unwrap_or_default();
            error!(error = %self, source = %source, "request failed");
        }
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
