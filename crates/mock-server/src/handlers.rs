use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use tracing::info;

use crate::AppState;
use crate::error::{FileError, ServerError};
use crate::sync_log::read_json_file;

pub(crate) async fn healthz_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn ledger_handler(
    State(state): State<AppState>,
) -> Result<Json<Value>, ServerError> {
    let ledger = read_json_file(state.ledger_path())
        .await
        .and_then(|found| {
            found.ok_or_else(|| {
                FileError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "ledger file missing",
                ))
            })
        })
        .map_err(ServerError::LoadLedger)?;
    Ok(Json(ledger))
}

pub(crate) async fn sync_log_handler(
    State(state): State<AppState>,
) -> Result<Json<Value>, ServerError> {
    let entries = state
        .sync_log()
        .entries()
        .await
        .map_err(ServerError::LoadSyncLog)?;
    Ok(Json(entries))
}

/// The non-empty `sessions` array of a sync payload.
fn sessions_from_body(body: &[u8]) -> Option<Vec<Value>> {
    let Ok(Value::Object(mut payload)) = serde_json::from_slice::<Value>(body) else {
        return None;
    };
    match payload.remove("sessions") {
        Some(Value::Array(sessions)) if !sessions.is_empty() => Some(sessions),
        _ => None,
    }
}

pub(crate) async fn sync_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ServerError> {
    let sessions = sessions_from_body(&body).ok_or(ServerError::MissingSessions)?;
    let received_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    let stored = state
        .sync_log()
        .append(sessions, &received_at)
        .await
        .map_err(ServerError::PersistSync)?;
    info!(stored, received_at = %received_at, "sync payload stored");
    Ok(Json(json!({ "stored": stored })))
}
